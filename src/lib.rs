pub mod capture;
pub mod config;
pub mod detection;
pub mod error;
pub mod frames;
pub mod harness;
pub mod report;
pub mod similarity;

pub use crate::config::Configuration;
pub use crate::detection::{BootTimeMeasurement, BootTimeOutcome, BoundaryDetector};
pub use crate::error::{BootTimeError, DetectionFailure, FrameSequenceError, SimilarityError};
pub use crate::frames::{Frame, FrameIndex, FrameSequence};
pub use crate::harness::{BootTimeHarness, HarnessBuilder};
pub use crate::similarity::{SimilarityOracle, SsimOracle};
