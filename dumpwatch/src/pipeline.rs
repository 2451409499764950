// THEORY:
// The `pipeline` module is the top-level API for the event engine. It wraps the
// stateful dumping detector and the stateless violence check behind a single
// per-frame call and folds their output into one report.
//
// One `EventPipeline` is one video stream. It must see that stream's frames in
// order, and it must not be shared with another stream.

use crate::core_modules::dumping::{DumpingConfig, DumpingDetector};
use crate::core_modules::error::ConfigError;
use crate::core_modules::tracking_box::{FrameItem, TrackingBox};
use crate::core_modules::violence::{MIN_PERSONS_IN_VIOLENCE, check_violence_with};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::dumping::{DUMPING_THRESHOLD, IOU_THRESHOLD};
pub use crate::core_modules::history::RELEASE_THRESHOLD;

/// Configuration for the EventPipeline, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub dumping: DumpingConfig,
    pub dumping_enabled: bool,
    pub violence_enabled: bool,
    /// Person centers a violence box must contain to be reported.
    pub min_persons_in_violence: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dumping: DumpingConfig::default(),
            dumping_enabled: true,
            violence_enabled: true,
            min_persons_in_violence: MIN_PERSONS_IN_VIOLENCE,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `DUMPWATCH_*` environment variables. Values that are
    /// missing or do not parse keep their default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            dumping: DumpingConfig {
                distance_threshold: env_or("DUMPWATCH_DISTANCE_THRESHOLD", defaults.dumping.distance_threshold),
                release_threshold: env_or("DUMPWATCH_RELEASE_THRESHOLD", defaults.dumping.release_threshold),
                iou_threshold: env_or("DUMPWATCH_IOU_THRESHOLD", defaults.dumping.iou_threshold),
            },
            dumping_enabled: env_or("DUMPWATCH_DUMPING", defaults.dumping_enabled),
            violence_enabled: env_or("DUMPWATCH_VIOLENCE", defaults.violence_enabled),
            min_persons_in_violence: env_or("DUMPWATCH_MIN_PERSONS", defaults.min_persons_in_violence),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring unparsable environment override");
            default
        }),
        Err(_) => default,
    }
}

/// The detailed data package for a frame with at least one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEvents {
    /// 1-based count of frames this pipeline has processed.
    pub frame_index: u64,
    pub dumping: Vec<TrackingBox>,
    pub violence: Vec<TrackingBox>,
}

/// The primary output of the event pipeline for a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Report {
    NoEvent,
    Events(FrameEvents),
}

impl Report {
    pub fn is_event(&self) -> bool {
        matches!(self, Report::Events(_))
    }

    pub fn dumping(&self) -> &[TrackingBox] {
        match self {
            Report::Events(events) => &events.dumping,
            Report::NoEvent => &[],
        }
    }

    pub fn violence(&self) -> &[TrackingBox] {
        match self {
            Report::Events(events) => &events.violence,
            Report::NoEvent => &[],
        }
    }
}

/// The main, top-level struct for the event engine.
pub struct EventPipeline {
    config: PipelineConfig,
    dumping: DumpingDetector,
    frame_count: u64,
}

impl EventPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        let dumping = DumpingDetector::new(config.dumping)?;
        Ok(Self {
            config,
            dumping,
            frame_count: 0,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn event_detected(&mut self, frame: &[FrameItem]) -> bool {
        self.process_frame(frame).is_event()
    }

    pub fn process_frame(&mut self, frame: &[FrameItem]) -> Report {
        self.frame_count += 1;

        // The dumping detector is not skipped even when disabled for reporting:
        // its histories must keep aging with the stream.
        let dumping = self.dumping.process(frame);
        let dumping = if self.config.dumping_enabled { dumping } else { Vec::new() };

        let violence = if self.config.violence_enabled {
            check_violence_with(frame, self.config.min_persons_in_violence)
        } else {
            Vec::new()
        };

        if dumping.is_empty() && violence.is_empty() {
            return Report::NoEvent;
        }

        debug!(
            frame = self.frame_count,
            dumping = dumping.len(),
            violence = violence.len(),
            "frame produced events"
        );
        Report::Events(FrameEvents {
            frame_index: self.frame_count,
            dumping,
            violence,
        })
    }
}
