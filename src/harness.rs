use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::{debug, info};

use crate::capture::{DecodeRequest, DeviceDriver, FfmpegDecoder, SessionLayout, VideoDecoder};
use crate::config::Configuration;
use crate::detection::BoundaryDetector;
use crate::error::BootTimeError;
use crate::report::{BootTimeRecord, LogSink, ResultSink};
use crate::similarity::SsimOracle;

/// Drives one launch measurement end to end: record, decode, detect, publish.
pub struct BootTimeHarness {
    configuration: Configuration,
    driver: Box<dyn DeviceDriver>,
    decoder: Box<dyn VideoDecoder>,
    detector: Arc<BoundaryDetector<SsimOracle>>,
    sinks: Vec<Box<dyn ResultSink>>,
    reference_end: PathBuf,
}

impl BootTimeHarness {
    pub fn builder(configuration: Configuration) -> HarnessBuilder {
        HarnessBuilder::new(configuration)
    }

    pub async fn run(&mut self) -> Result<BootTimeRecord, BootTimeError> {
        if !self.reference_end.is_file() {
            return Err(BootTimeError::InvalidConfig(format!(
                "Reference end image not found: {}",
                self.reference_end.display()
            )));
        }
        let app = self.configuration.app.name.clone();

        debug!("Preparing device");
        self.driver.prepare().await?;
        tokio::time::sleep(Duration::from_millis(
            self.configuration.capture.pre_launch_delay_ms,
        ))
        .await;

        let layout = SessionLayout::new(&self.configuration.data_dir, &app, Local::now());
        layout.create()?;
        debug!("Session directory: {}", layout.session_dir().display());

        self.driver.start_recording().await?;
        self.driver.launch(&app).await?;
        tokio::time::sleep(Duration::from_millis(
            self.configuration.capture.settle_time_ms,
        ))
        .await;
        let video = self.driver.stop_recording().await?;

        let video_path = layout.video_path();
        tokio::fs::write(&video_path, &video).await?;
        debug!("Wrote {} bytes of video to {}", video.len(), video_path.display());

        let request = DecodeRequest::from(&self.configuration.decoder);
        let frames = self
            .decoder
            .decode(&video_path, &request, &layout.frames_dir())
            .await?;

        // every comparison decodes a full-resolution frame, keep it off the runtime workers
        let detector = self.detector.clone();
        let reference_end = self.reference_end.clone();
        let fps = request.fps;
        let measurement = tokio::task::spawn_blocking(move || {
            detector.compute_boot_time(&frames, fps, &reference_end)
        })
        .await
        .map_err(|e| BootTimeError::Task(e.to_string()))??
        .into_result()?;
        if measurement.boot_time_ms == 0 {
            return Err(BootTimeError::NonPositiveBootTime);
        }

        let record = BootTimeRecord::new(app, &measurement, layout.frames_dir());
        for sink in &self.sinks {
            sink.publish(&record)
                .await
                .map_err(|e| BootTimeError::Sink(format!("{}: {e}", sink.name())))?;
        }
        info!(
            run_id = %record.run_id,
            boot_time_ms = record.boot_time_ms,
            "Measurement complete"
        );
        Ok(record)
    }
}

pub struct HarnessBuilder {
    configuration: Configuration,
    driver: Option<Box<dyn DeviceDriver>>,
    decoder: Option<Box<dyn VideoDecoder>>,
    sinks: Vec<Box<dyn ResultSink>>,
    reference_end: Option<PathBuf>,
}

impl HarnessBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            driver: None,
            decoder: None,
            sinks: Vec::new(),
            reference_end: None,
        }
    }

    pub fn driver(mut self, driver: Box<dyn DeviceDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    // Replaces the ffmpeg decoder built from the configuration.
    pub fn decoder(mut self, decoder: Box<dyn VideoDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn sink(mut self, sink: Box<dyn ResultSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    // Overrides `<reference_dir>/<app>/end.png`.
    pub fn reference_end(mut self, path: PathBuf) -> Self {
        self.reference_end = Some(path);
        self
    }

    pub fn build(self) -> Result<BootTimeHarness, BootTimeError> {
        self.configuration
            .validate()
            .map_err(BootTimeError::InvalidConfig)?;
        let driver = self
            .driver
            .ok_or(BootTimeError::InvalidConfig("Device driver not set".to_string()))?;

        let configuration = self.configuration;
        let decoder: Box<dyn VideoDecoder> = match self.decoder {
            Some(decoder) => decoder,
            None => Box::new(FfmpegDecoder::new(configuration.decoder.ffmpeg_path.clone())),
        };
        let oracle = SsimOracle::new().with_max_width(configuration.similarity.max_width);
        let detector = Arc::new(BoundaryDetector::new(oracle, &configuration.detection));
        let reference_end = self
            .reference_end
            .unwrap_or_else(|| configuration.reference_end_image());
        let mut sinks = self.sinks;
        if sinks.is_empty() {
            sinks.push(Box::new(LogSink));
        }

        Ok(BootTimeHarness {
            configuration,
            driver,
            decoder,
            detector,
            sinks,
            reference_end,
        })
    }
}
