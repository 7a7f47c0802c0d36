use std::path::{Path, PathBuf};

use tracing::debug;

use super::frame::{Frame, FrameIndex};
use crate::error::FrameSequenceError;

/// Ordered frames with contiguous, strictly increasing indices.
///
/// The first frame doubles as the reference start image.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence<I> {
    frames: Vec<Frame<I>>,
}

impl<I> FrameSequence<I> {
    pub fn from_frames(mut frames: Vec<Frame<I>>) -> Result<Self, FrameSequenceError> {
        if frames.len() < 2 {
            return Err(FrameSequenceError::TooShort(frames.len()));
        }

        frames.sort_by_key(|frame| frame.index);
        for pair in frames.windows(2) {
            let (prev, next) = (pair[0].index, pair[1].index);
            if prev == next {
                return Err(FrameSequenceError::Duplicate(next));
            }
            if next != prev + 1 {
                return Err(FrameSequenceError::Gap {
                    expected: prev + 1,
                    found: next,
                });
            }
        }

        Ok(Self { frames })
    }

    /// Convenience for in-memory sequences indexed from 0.
    pub fn from_images(images: impl IntoIterator<Item = I>) -> Result<Self, FrameSequenceError> {
        let frames = images
            .into_iter()
            .enumerate()
            .map(|(index, image)| Frame::new(index as FrameIndex, image))
            .collect();
        Self::from_frames(frames)
    }

    pub fn reference_start(&self) -> &Frame<I> {
        &self.frames[0]
    }

    pub fn frames(&self) -> &[Frame<I>] {
        &self.frames
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame<I>> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSequence<PathBuf> {
    /// Loads every `*.<extension>` file of `dir` as a frame, ordered by the index in its name.
    pub fn from_dir(dir: &Path, extension: &str) -> Result<Self, FrameSequenceError> {
        let entries =
            std::fs::read_dir(dir).map_err(|e| FrameSequenceError::ReadDir(e, dir.to_path_buf()))?;

        let mut frames = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| FrameSequenceError::ReadDir(e, dir.to_path_buf()))?
                .path();
            let matches_extension = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            if path.is_file() && matches_extension {
                frames.push(Frame::from_path(&path)?);
            }
        }

        debug!("Loaded {} frames from {}", frames.len(), dir.display());
        Self::from_frames(frames)
    }
}

impl<'a, I> IntoIterator for &'a FrameSequence<I> {
    type Item = &'a Frame<I>;
    type IntoIter = std::slice::Iter<'a, Frame<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
