use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::info;

use super::record::BootTimeRecord;
use crate::error::BootTimeError;

/// Destination for computed boot times.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn publish(&self, record: &BootTimeRecord) -> Result<(), BootTimeError>;
    fn name(&self) -> &'static str;
}

/// Emits each record as a structured log line.
pub struct LogSink;

#[async_trait]
impl ResultSink for LogSink {
    async fn publish(&self, record: &BootTimeRecord) -> Result<(), BootTimeError> {
        info!(
            run_id = %record.run_id,
            app = %record.app,
            start_index = record.start_index,
            end_index = record.end_index,
            fps = record.fps,
            boot_time_ms = record.boot_time_ms,
            "Boot time measured"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Appends one JSON object per line to a results file.
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ResultSink for JsonLinesSink {
    async fn publish(&self, record: &BootTimeRecord) -> Result<(), BootTimeError> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| BootTimeError::Sink(format!("Failed to serialize record: {e}")))?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BootTimeMeasurement;

    fn record(boot_time_ms: u64) -> BootTimeRecord {
        let measurement = BootTimeMeasurement {
            start_index: 10,
            end_index: 60,
            frame_count: 500,
            fps: 50,
            boot_time_ms,
        };
        BootTimeRecord::new("mall", &measurement, PathBuf::from("data/pngs"))
    }

    #[tokio::test]
    async fn test_json_lines_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("boot_times.jsonl");
        let sink = JsonLinesSink::new(&path);

        let first = record(1000);
        let second = record(1200);
        sink.publish(&first).await.unwrap();
        sink.publish(&second).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<BootTimeRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(parsed, vec![first, second]);
    }

    #[tokio::test]
    async fn test_log_sink_accepts_record() {
        assert!(LogSink.publish(&record(1000)).await.is_ok());
        assert_eq!(LogSink.name(), "log");
    }
}
