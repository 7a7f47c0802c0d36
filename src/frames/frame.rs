use std::path::{Path, PathBuf};

use crate::error::FrameSequenceError;

/// Capture-order position of a frame. Frames written by the video decoder start at 1.
pub type FrameIndex = u32;

/// One still image of a frame sequence, tagged with its capture index.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<I> {
    pub index: FrameIndex,
    pub image: I,
}

impl<I> Frame<I> {
    pub fn new(index: FrameIndex, image: I) -> Self {
        Self { index, image }
    }
}

impl Frame<PathBuf> {
    /// Builds a frame from a file named by its zero-padded index, e.g. `0042.png`.
    pub fn from_path(path: &Path) -> Result<Self, FrameSequenceError> {
        let index = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|stem| stem.parse::<FrameIndex>().ok())
            .ok_or_else(|| FrameSequenceError::NonNumericName(path.to_path_buf()))?;
        Ok(Self::new(index, path.to_path_buf()))
    }

    pub fn label(&self) -> String {
        self.image
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.index.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_parsed_from_padded_name() {
        let frame = Frame::from_path(Path::new("/tmp/pngs/0042.png")).unwrap();
        assert_eq!(frame.index, 42);
        assert_eq!(frame.label(), "0042.png");
    }

    #[test]
    fn test_non_numeric_names_rejected() {
        for name in ["end.png", "12a.png", ".png", "-1.png"] {
            let result = Frame::from_path(Path::new(name));
            assert!(
                matches!(result, Err(FrameSequenceError::NonNumericName(_))),
                "{name} should be rejected"
            );
        }
    }
}
