use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::error::BootTimeError;

/// UI automation and screen recording on the device under test.
#[async_trait]
pub trait DeviceDriver: Send + Sync {
    /// Brings the launcher surface holding the app entry on screen.
    async fn prepare(&mut self) -> Result<(), BootTimeError>;

    async fn start_recording(&mut self) -> Result<(), BootTimeError>;

    /// Locates the app entry and taps it.
    async fn launch(&mut self, app_name: &str) -> Result<(), BootTimeError>;

    /// Stops recording and hands back the encoded video.
    async fn stop_recording(&mut self) -> Result<Vec<u8>, BootTimeError>;
}

/// Stands in for a device by replaying a recording that already exists on disk.
pub struct PrerecordedDriver {
    video: PathBuf,
    recording: bool,
}

impl PrerecordedDriver {
    pub fn new(video: impl Into<PathBuf>) -> Self {
        Self {
            video: video.into(),
            recording: false,
        }
    }
}

#[async_trait]
impl DeviceDriver for PrerecordedDriver {
    async fn prepare(&mut self) -> Result<(), BootTimeError> {
        info!(video = %self.video.display(), "Using pre-recorded launch");
        Ok(())
    }

    async fn start_recording(&mut self) -> Result<(), BootTimeError> {
        if self.recording {
            return Err(BootTimeError::Device("Recording already started".to_string()));
        }
        self.recording = true;
        Ok(())
    }

    async fn launch(&mut self, app_name: &str) -> Result<(), BootTimeError> {
        info!(app = app_name, "Launch already captured in recording");
        Ok(())
    }

    async fn stop_recording(&mut self) -> Result<Vec<u8>, BootTimeError> {
        if !self.recording {
            return Err(BootTimeError::Device("Recording was never started".to_string()));
        }
        self.recording = false;
        Ok(tokio::fs::read(&self.video).await?)
    }
}
