// THEORY:
// This file is the main entry point for the `dumpwatch` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (like the `log_replayer` binary).
//
// The primary goal is to export the `EventPipeline` and its associated data
// structures (`PipelineConfig`, `Report`, etc.) as the high-level interface for
// the event engine, plus the `StreamPool` for running many video streams at once.
// The building blocks (`core_modules`) stay public for callers that want the
// dumping detector or the violence check on their own.

pub mod core_modules;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::error::{ConfigError, HistoryError, LogError, ParseError, PoolError};
pub use core_modules::tracking_box::{ClassId, FrameItem, TrackId, TrackingBox};
