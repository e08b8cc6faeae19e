//! CLI subcommand implementations.

pub mod bdrate;
pub mod check;
pub mod report;
