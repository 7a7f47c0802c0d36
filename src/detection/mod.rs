pub mod detector;
pub mod window;

pub use detector::{BootTimeMeasurement, BootTimeOutcome, BoundaryDetector};
pub use window::ScoreWindow;
