use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::detection::BootTimeMeasurement;
use crate::frames::FrameIndex;

/// One published boot-time measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootTimeRecord {
    pub run_id: Uuid,
    pub app: String,
    pub recorded_at: DateTime<Utc>,
    pub start_index: FrameIndex,
    pub end_index: FrameIndex,
    pub frame_count: usize,
    pub fps: u32,
    pub boot_time_ms: u64,
    pub frames_dir: PathBuf,
}

impl BootTimeRecord {
    pub fn new(app: impl Into<String>, measurement: &BootTimeMeasurement, frames_dir: PathBuf) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            app: app.into(),
            recorded_at: Utc::now(),
            start_index: measurement.start_index,
            end_index: measurement.end_index,
            frame_count: measurement.frame_count,
            fps: measurement.fps,
            boot_time_ms: measurement.boot_time_ms,
            frames_dir,
        }
    }
}
