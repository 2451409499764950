pub mod detection_log;
pub mod dumping;
pub mod error;
pub mod geometry;
pub mod history;
pub mod tracking_box;
pub mod violence;
