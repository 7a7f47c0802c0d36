use std::path::PathBuf;

use thiserror::Error;

use crate::frames::FrameIndex;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum BootTimeError {
    #[error("Detection failed: {0}")]
    Detection(#[from] DetectionFailure),
    #[error("Boot time computed as 0 ms, treating as a failed measurement")]
    NonPositiveBootTime,
    #[error("Similarity Error: {0}")]
    Similarity(#[from] SimilarityError),
    #[error("Frame Sequence Error: {0}")]
    Frames(#[from] FrameSequenceError),
    #[error("Failed to decode video: {0}")]
    Decode(String),
    #[error("Detection task failed: {0}")]
    Task(String),
    #[error("Device Error: {0}")]
    Device(String),
    #[error("Failed to publish result: {0}")]
    Sink(String),
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ::config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a detection pass produced no measurement.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionFailure {
    #[error("no frame diverged from the first frame")]
    NoStartFound,
    #[error("no falling edge after a stable match with the end reference")]
    NoEndFound,
    #[error("end position {end_index} sits on the sequence boundary")]
    EndAtSequenceBoundary { end_index: FrameIndex },
}

#[derive(Error, Debug)]
pub enum SimilarityError {
    #[error("Failed to load image {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Image {0} has zero width or height")]
    EmptyImage(PathBuf),
}

#[derive(Error, Debug)]
pub enum FrameSequenceError {
    #[error("Need at least 2 frames for analysis, found {0}")]
    TooShort(usize),
    #[error("Frame file name is not a frame index: {0}")]
    NonNumericName(PathBuf),
    #[error("Frame indices are not contiguous: expected {expected}, found {found}")]
    Gap {
        expected: FrameIndex,
        found: FrameIndex,
    },
    #[error("Frame index {0} appears more than once")]
    Duplicate(FrameIndex),
    #[error("Failed to read frame directory {1}: {0}")]
    ReadDir(std::io::Error, PathBuf),
}
