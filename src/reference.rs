//! Raw YUV reference material and its cache.
//!
//! The reference side of every measurement is a fully decoded 4:2:0 clip:
//! a [`RawReference`] holding planar [`YuvFrame`]s. References are large
//! (a 300-frame 1080p clip is ~900 MB), so [`ReferenceCache`] keeps one
//! decoded copy per source path with an explicit lifecycle: populate while
//! a suite runs, `clear()` at teardown. Nothing is cached in ambient
//! static state.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};

/// One planar 4:2:0 frame, 8 bits per sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YuvFrame {
    /// Luma plane, `width * height` samples.
    pub y: Vec<u8>,
    /// Cb plane, `(width/2) * (height/2)` samples.
    pub u: Vec<u8>,
    /// Cr plane, `(width/2) * (height/2)` samples.
    pub v: Vec<u8>,
}

impl YuvFrame {
    /// Allocate a zeroed frame for the given dimensions.
    #[must_use]
    pub fn zeroed(width: usize, height: usize) -> Self {
        Self {
            y: vec![0; width * height],
            u: vec![0; (width / 2) * (height / 2)],
            v: vec![0; (width / 2) * (height / 2)],
        }
    }
}

/// A decoded raw reference clip: known dimensions, 8-bit 4:2:0 frames.
#[derive(Debug, Clone)]
pub struct RawReference {
    width: usize,
    height: usize,
    frames: Vec<YuvFrame>,
}

impl RawReference {
    /// Create a reference from already-decoded frames.
    ///
    /// Validates that every frame's planes match the stated dimensions.
    pub fn new(width: usize, height: usize, frames: Vec<YuvFrame>) -> Result<Self> {
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(Error::InvalidConfig(format!(
                "reference dimensions must be even and non-zero, got {width}x{height}"
            )));
        }
        let y_len = width * height;
        let c_len = (width / 2) * (height / 2);
        for frame in &frames {
            if frame.y.len() != y_len || frame.u.len() != c_len || frame.v.len() != c_len {
                return Err(Error::DimensionMismatch {
                    expected: (width, height),
                    actual: (frame.y.len(), frame.u.len()),
                });
            }
        }
        Ok(Self {
            width,
            height,
            frames,
        })
    }

    /// Load a raw I420 file (Y, then U, then V plane per frame).
    ///
    /// The file length must be an exact multiple of the frame size;
    /// a short trailing frame means a truncated or mis-sized source.
    pub fn load_i420(path: impl AsRef<Path>, width: usize, height: usize) -> Result<Self> {
        let path = path.as_ref();
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(Error::ReferenceLoad {
                path: path.to_path_buf(),
                reason: format!("dimensions must be even and non-zero, got {width}x{height}"),
            });
        }

        let y_len = width * height;
        let c_len = (width / 2) * (height / 2);
        let frame_len = y_len + 2 * c_len;

        let mut data = Vec::new();
        File::open(path)
            .and_then(|mut f| f.read_to_end(&mut data))
            .map_err(|e| Error::ReferenceLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if data.is_empty() || data.len() % frame_len != 0 {
            return Err(Error::ReferenceLoad {
                path: path.to_path_buf(),
                reason: format!(
                    "file size {} is not a multiple of the {}x{} I420 frame size {}",
                    data.len(),
                    width,
                    height,
                    frame_len
                ),
            });
        }

        let frames = data
            .chunks_exact(frame_len)
            .map(|chunk| YuvFrame {
                y: chunk[..y_len].to_vec(),
                u: chunk[y_len..y_len + c_len].to_vec(),
                v: chunk[y_len + c_len..].to_vec(),
            })
            .collect();

        Self::new(width, height, frames)
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of frames in the clip.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Access the decoded frames.
    #[must_use]
    pub fn frames(&self) -> &[YuvFrame] {
        &self.frames
    }
}

/// Cache of decoded references, keyed by source path.
///
/// Populated once per suite run and torn down explicitly; passed by
/// reference into test code instead of living in a static.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    entries: HashMap<PathBuf, Arc<RawReference>>,
}

impl ReferenceCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached reference for `path`, loading it on first use.
    pub fn load_i420(
        &mut self,
        path: impl AsRef<Path>,
        width: usize,
        height: usize,
    ) -> Result<Arc<RawReference>> {
        let path = path.as_ref();
        if let Some(cached) = self.entries.get(path) {
            return Ok(Arc::clone(cached));
        }
        let reference = Arc::new(RawReference::load_i420(path, width, height)?);
        self.entries.insert(path.to_path_buf(), Arc::clone(&reference));
        Ok(reference)
    }

    /// Insert an already-decoded reference under a key.
    pub fn insert(&mut self, path: impl Into<PathBuf>, reference: RawReference) -> Arc<RawReference> {
        let reference = Arc::new(reference);
        self.entries.insert(path.into(), Arc::clone(&reference));
        reference
    }

    /// Number of cached references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all cached references. Call at suite teardown.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
