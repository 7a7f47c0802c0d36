use serde::Serialize;
use tracing::{info, warn};

use super::window::ScoreWindow;
use crate::config::DetectionConfig;
use crate::error::{BootTimeError, DetectionFailure};
use crate::frames::{FrameIndex, FrameSequence};
use crate::similarity::SimilarityOracle;

/// A successful start/end detection and the elapsed time between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BootTimeMeasurement {
    pub start_index: FrameIndex,
    pub end_index: FrameIndex,
    pub frame_count: usize,
    pub fps: u32,
    pub boot_time_ms: u64,
}

/// Result of one detection pass. Detection is all-or-nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootTimeOutcome {
    Measured(BootTimeMeasurement),
    Failed(DetectionFailure),
}

impl BootTimeOutcome {
    /// Milliseconds, with `0` standing in for any detection failure.
    pub fn millis_or_zero(&self) -> u64 {
        match self {
            Self::Measured(measurement) => measurement.boot_time_ms,
            Self::Failed(_) => 0,
        }
    }

    pub fn into_result(self) -> Result<BootTimeMeasurement, DetectionFailure> {
        match self {
            Self::Measured(measurement) => Ok(measurement),
            Self::Failed(failure) => Err(failure),
        }
    }
}

/// Locates the launch start and render end in a frame sequence.
pub struct BoundaryDetector<O> {
    oracle: O,
    start_threshold: f64,
    end_threshold: f64,
}

impl<O: SimilarityOracle> BoundaryDetector<O> {
    pub fn new(oracle: O, config: &DetectionConfig) -> Self {
        Self {
            oracle,
            start_threshold: config.start_threshold,
            end_threshold: config.end_threshold,
        }
    }

    /// First frame scoring strictly below the start threshold against frame 0.
    pub fn find_start_index(
        &self,
        frames: &FrameSequence<O::Image>,
    ) -> Result<Option<FrameIndex>, BootTimeError> {
        let reference = &frames.reference_start().image;
        for frame in frames.iter().skip(1) {
            let score = self.oracle.compute_similarity(reference, &frame.image)?;
            info!(frame = frame.index, score, "similarity to start reference");
            if score < self.start_threshold {
                return Ok(Some(frame.index));
            }
        }
        Ok(None)
    }

    /// First frame, at or after `start_index`, that ends a two-sample plateau
    /// above the end threshold with a score below it.
    pub fn find_end_index(
        &self,
        frames: &FrameSequence<O::Image>,
        start_index: FrameIndex,
        reference_end: &O::Image,
    ) -> Result<Option<FrameIndex>, BootTimeError> {
        if start_index == 0 {
            return Ok(None);
        }

        let mut window = ScoreWindow::new();
        for frame in frames.iter().skip_while(|frame| frame.index < start_index) {
            let score = self.oracle.compute_similarity(reference_end, &frame.image)?;
            info!(frame = frame.index, score, "similarity to end reference");
            window.push(score);
            if window.is_falling_edge(self.end_threshold) {
                return Ok(Some(frame.index));
            }
        }
        Ok(None)
    }

    /// Runs both scans and converts the index delta to milliseconds at `fps`.
    pub fn compute_boot_time(
        &self,
        frames: &FrameSequence<O::Image>,
        fps: u32,
        reference_end: &O::Image,
    ) -> Result<BootTimeOutcome, BootTimeError> {
        if fps == 0 {
            return Err(BootTimeError::InvalidConfig(
                "Frame rate must be greater than 0".to_string(),
            ));
        }

        let Some(start_index) = self.find_start_index(frames)? else {
            warn!("No start or end frame found: nothing diverged from the first frame");
            return Ok(BootTimeOutcome::Failed(DetectionFailure::NoStartFound));
        };

        let Some(end_index) = self.find_end_index(frames, start_index, reference_end)? else {
            warn!(start_index, "No start or end frame found: no end frame after start");
            return Ok(BootTimeOutcome::Failed(DetectionFailure::NoEndFound));
        };

        let frame_count = frames.len();
        if end_index as usize == frame_count {
            warn!(end_index, frame_count, "End frame position is invalid");
            return Ok(BootTimeOutcome::Failed(
                DetectionFailure::EndAtSequenceBoundary { end_index },
            ));
        }

        let elapsed_frames = u64::from(end_index.saturating_sub(start_index));
        let boot_time_ms = elapsed_frames * 1000 / u64::from(fps);
        info!(start_index, end_index, boot_time_ms, "Boot time computed");

        Ok(BootTimeOutcome::Measured(BootTimeMeasurement {
            start_index,
            end_index,
            frame_count,
            fps,
            boot_time_ms,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimilarityError;
    use crate::frames::Frame;
    use std::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Shot {
        StartReference,
        EndReference,
        Frame { id: FrameIndex, to_start: f64, to_end: f64 },
    }

    /// Returns pre-scripted scores and remembers which frames were compared to each reference.
    #[derive(Default)]
    struct ScriptedOracle {
        start_comparisons: RefCell<Vec<FrameIndex>>,
        end_comparisons: RefCell<Vec<FrameIndex>>,
    }

    impl SimilarityOracle for ScriptedOracle {
        type Image = Shot;

        fn compute_similarity(&self, a: &Shot, b: &Shot) -> Result<f64, SimilarityError> {
            Ok(match (a, b) {
                (Shot::StartReference, Shot::Frame { id, to_start, .. }) => {
                    self.start_comparisons.borrow_mut().push(*id);
                    *to_start
                }
                (Shot::EndReference, Shot::Frame { id, to_end, .. }) => {
                    self.end_comparisons.borrow_mut().push(*id);
                    *to_end
                }
                (x, y) if x == y => 1.0,
                _ => 0.0,
            })
        }
    }

    fn config() -> DetectionConfig {
        DetectionConfig::default()
    }

    /// Frame 0 is the start reference; frame `i` (i >= 1) gets `scores[i - 1]`.
    fn sequence(scores: &[(f64, f64)]) -> FrameSequence<Shot> {
        let mut frames = vec![Frame::new(0, Shot::StartReference)];
        frames.extend(scores.iter().enumerate().map(|(i, &(to_start, to_end))| {
            let id = i as FrameIndex + 1;
            Frame::new(id, Shot::Frame { id, to_start, to_end })
        }));
        FrameSequence::from_frames(frames).unwrap()
    }

    fn start_scores(scores: &[f64]) -> FrameSequence<Shot> {
        sequence(&scores.iter().map(|&s| (s, 0.0)).collect::<Vec<_>>())
    }

    #[test]
    fn test_start_not_found_when_all_similar() {
        let detector = BoundaryDetector::new(ScriptedOracle::default(), &config());
        let frames = start_scores(&[0.99, 0.95, 0.90, 0.93, 0.90]);
        assert_eq!(detector.find_start_index(&frames).unwrap(), None);
    }

    #[test]
    fn test_start_is_first_frame_below_threshold() {
        let detector = BoundaryDetector::new(ScriptedOracle::default(), &config());
        for k in 1..8u32 {
            let scores: Vec<f64> = (1..10u32)
                .map(|i| if i < k { 0.99 } else { 0.89 - 0.05 * f64::from(i - k) })
                .collect();
            let frames = start_scores(&scores);
            assert_eq!(detector.find_start_index(&frames).unwrap(), Some(k));
        }
    }

    #[test]
    fn test_end_detected_on_falling_edge() {
        let oracle = ScriptedOracle::default();
        let detector = BoundaryDetector::new(&oracle, &config());
        let mut scores = vec![(0.5, 0.1); 4];
        scores.extend([(0.5, 0.98), (0.5, 0.98), (0.5, 0.50)]);
        let frames = sequence(&scores);

        assert_eq!(
            detector.find_end_index(&frames, 5, &Shot::EndReference).unwrap(),
            Some(7)
        );
        assert_eq!(*oracle.end_comparisons.borrow(), vec![5, 6, 7]);
    }

    #[test]
    fn test_scans_stop_at_first_match() {
        let oracle = ScriptedOracle::default();
        let detector = BoundaryDetector::new(&oracle, &config());
        // start at 3, edge at 8, and frames 9..=19 would form a second edge at 12
        let scores: Vec<(f64, f64)> = (1..20u32)
            .map(|i| {
                let to_start = if i < 3 { 0.99 } else { 0.10 };
                let to_end = match i {
                    6 | 7 | 10 | 11 => 0.99,
                    _ => 0.20,
                };
                (to_start, to_end)
            })
            .collect();
        let frames = sequence(&scores);

        let outcome = detector
            .compute_boot_time(&frames, 50, &Shot::EndReference)
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!((outcome.start_index, outcome.end_index), (3, 8));
        assert_eq!(*oracle.start_comparisons.borrow(), vec![1, 2, 3]);
        assert_eq!(*oracle.end_comparisons.borrow(), vec![3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_end_scan_never_inspects_frames_before_start() {
        let oracle = ScriptedOracle::default();
        let detector = BoundaryDetector::new(&oracle, &config());
        // frames 1..=3 would form an edge on their own
        let frames = sequence(&[
            (0.5, 0.99),
            (0.5, 0.99),
            (0.5, 0.10),
            (0.5, 0.20),
            (0.5, 0.30),
        ]);

        assert_eq!(
            detector.find_end_index(&frames, 4, &Shot::EndReference).unwrap(),
            None
        );
        assert!(oracle.end_comparisons.borrow().iter().all(|&id| id >= 4));
    }

    #[test]
    fn test_end_not_found_without_drop() {
        let detector = BoundaryDetector::new(ScriptedOracle::default(), &config());
        let frames = sequence(&[(0.5, 0.2), (0.5, 0.99), (0.5, 0.99), (0.5, 0.99)]);
        assert_eq!(
            detector.find_end_index(&frames, 1, &Shot::EndReference).unwrap(),
            None
        );
    }

    #[test]
    fn test_end_needs_three_samples_past_start() {
        let detector = BoundaryDetector::new(ScriptedOracle::default(), &config());
        let frames = sequence(&[(0.99, 0.1), (0.99, 0.1), (0.5, 0.99), (0.5, 0.5)]);
        assert_eq!(
            detector.find_end_index(&frames, 3, &Shot::EndReference).unwrap(),
            None
        );
    }

    #[test]
    fn test_end_search_skipped_without_start() {
        let oracle = ScriptedOracle::default();
        let detector = BoundaryDetector::new(&oracle, &config());
        let frames = sequence(&[(0.5, 0.99), (0.5, 0.99), (0.5, 0.1)]);
        assert_eq!(
            detector.find_end_index(&frames, 0, &Shot::EndReference).unwrap(),
            None
        );
        assert!(oracle.end_comparisons.borrow().is_empty());
    }

    fn launch_sequence() -> FrameSequence<Shot> {
        // start at 10, plateau at 58..=59, drop at 60, 100 frames total
        let scores: Vec<(f64, f64)> = (1..100u32)
            .map(|i| {
                let to_start = if i < 10 { 0.95 } else { 0.40 };
                let to_end = match i {
                    58 | 59 => 0.99,
                    60 => 0.50,
                    _ => 0.30,
                };
                (to_start, to_end)
            })
            .collect();
        sequence(&scores)
    }

    #[test]
    fn test_compute_boot_time() {
        let detector = BoundaryDetector::new(ScriptedOracle::default(), &config());
        let outcome = detector
            .compute_boot_time(&launch_sequence(), 50, &Shot::EndReference)
            .unwrap();

        let measurement = outcome.into_result().unwrap();
        assert_eq!(measurement.start_index, 10);
        assert_eq!(measurement.end_index, 60);
        assert_eq!(measurement.frame_count, 100);
        assert_eq!(measurement.boot_time_ms, 1000);
        assert_eq!(outcome.millis_or_zero(), 1000);
    }

    #[test]
    fn test_compute_boot_time_floors() {
        let detector = BoundaryDetector::new(ScriptedOracle::default(), &config());
        let outcome = detector
            .compute_boot_time(&launch_sequence(), 30, &Shot::EndReference)
            .unwrap();
        // 50 frames at 30 fps = 1666.67 ms
        assert_eq!(outcome.millis_or_zero(), 1666);
    }

    #[test]
    fn test_compute_boot_time_is_deterministic() {
        let detector = BoundaryDetector::new(ScriptedOracle::default(), &config());
        let frames = launch_sequence();
        let first = detector
            .compute_boot_time(&frames, 50, &Shot::EndReference)
            .unwrap();
        let second = detector
            .compute_boot_time(&frames, 50, &Shot::EndReference)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_compute_boot_time_failures() {
        let detector = BoundaryDetector::new(ScriptedOracle::default(), &config());

        let no_start = start_scores(&[0.99, 0.98, 0.97]);
        let outcome = detector
            .compute_boot_time(&no_start, 50, &Shot::EndReference)
            .unwrap();
        assert_eq!(outcome, BootTimeOutcome::Failed(DetectionFailure::NoStartFound));
        assert_eq!(outcome.millis_or_zero(), 0);

        let no_end = sequence(&[(0.99, 0.1), (0.5, 0.1), (0.5, 0.99), (0.5, 0.99)]);
        let outcome = detector
            .compute_boot_time(&no_end, 50, &Shot::EndReference)
            .unwrap();
        assert_eq!(outcome, BootTimeOutcome::Failed(DetectionFailure::NoEndFound));
        assert_eq!(outcome.millis_or_zero(), 0);
    }

    #[test]
    fn test_end_on_last_decoded_frame_is_rejected() {
        // decoder numbering: 1..=20, so index 20 equals the frame count
        let mut frames = vec![Frame::new(1, Shot::StartReference)];
        frames.extend((2..=20u32).map(|id| {
            let to_start = if id < 3 { 0.99 } else { 0.2 };
            let to_end = if id == 18 || id == 19 { 0.99 } else { 0.1 };
            Frame::new(id, Shot::Frame { id, to_start, to_end })
        }));
        let frames = FrameSequence::from_frames(frames).unwrap();

        let detector = BoundaryDetector::new(ScriptedOracle::default(), &config());
        let outcome = detector
            .compute_boot_time(&frames, 50, &Shot::EndReference)
            .unwrap();
        assert_eq!(
            outcome,
            BootTimeOutcome::Failed(DetectionFailure::EndAtSequenceBoundary { end_index: 20 })
        );
        assert_eq!(outcome.millis_or_zero(), 0);
    }

    #[test]
    fn test_zero_fps_rejected() {
        let detector = BoundaryDetector::new(ScriptedOracle::default(), &config());
        let result = detector.compute_boot_time(&launch_sequence(), 0, &Shot::EndReference);
        assert!(matches!(result, Err(BootTimeError::InvalidConfig(_))));
    }
}
