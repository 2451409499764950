//! Error types for the dumpwatch engine.
//!
//! `process` on the detectors never fails; everything here belongs to the
//! edges around it: history lookups, log parsing, configuration and the
//! multi-stream front end.

use std::path::PathBuf;
use thiserror::Error;

/// A history store was asked for a key it does not hold (never tracked, or expired).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("key not found in history: {0}")]
    KeyNotFound(String),
}

/// A detection-log line could not be turned into a `TrackingBox`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected 6 fields (class_id track_id x y w h), found {found}")]
    FieldCount { found: usize },

    #[error("field {index} is not a valid number: {value:?}")]
    InvalidField { index: usize, value: String },
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("release threshold must be at least 1 cycle")]
    ZeroReleaseThreshold,

    #[error("distance threshold must be a positive finite number, got {0}")]
    InvalidDistance(f64),

    #[error("IOU threshold must lie in [0, 1], got {0}")]
    InvalidIou(f64),
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("stream {0} worker is no longer running")]
    StreamClosed(String),

    #[error("stream {0} worker dropped the reply")]
    ReplyDropped(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
