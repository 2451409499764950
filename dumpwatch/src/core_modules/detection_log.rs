//! Reading recorded detector output.
//!
//! A detection log is plain text with one box per line:
//! `class_id track_id x y w h`, whitespace separated. A directory of such files
//! is a recording, one file per frame, replayed in file-name order.

use crate::core_modules::error::{LogError, ParseError};
use crate::core_modules::tracking_box::{ClassId, FrameItem, TrackingBox};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const FIELD_COUNT: usize = 6;

impl FromStr for TrackingBox {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != FIELD_COUNT {
            return Err(ParseError::FieldCount { found: fields.len() });
        }

        fn field<T: FromStr>(fields: &[&str], index: usize) -> Result<T, ParseError> {
            fields[index].parse().map_err(|_| ParseError::InvalidField {
                index,
                value: fields[index].to_string(),
            })
        }

        // Geometry must be finite, and extents must not be negative.
        fn coordinate(fields: &[&str], index: usize, min: f64) -> Result<f64, ParseError> {
            let value: f64 = field(fields, index)?;
            if !value.is_finite() || value < min {
                return Err(ParseError::InvalidField { index, value: fields[index].to_string() });
            }
            Ok(value)
        }

        Ok(TrackingBox {
            class_id: ClassId::from_raw(field(&fields, 0)?),
            track_id: field(&fields, 1)?,
            x: coordinate(&fields, 2, f64::NEG_INFINITY)?,
            y: coordinate(&fields, 3, f64::NEG_INFINITY)?,
            w: coordinate(&fields, 4, 0.0)?,
            h: coordinate(&fields, 5, 0.0)?,
        })
    }
}

/// Parses one line, logging and discarding it on failure.
pub fn parse_line(line: &str) -> Option<TrackingBox> {
    match line.parse() {
        Ok(tracking_box) => Some(tracking_box),
        Err(err) => {
            debug!(%err, line, "skipping malformed detection line");
            None
        }
    }
}

/// Turns the text of one frame file into a frame batch. Unparsable lines are
/// kept as `FrameItem::Foreign` so the detectors drop them; blank lines vanish.
pub fn parse_frame(text: &str) -> Vec<FrameItem> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match parse_line(line) {
            Some(tracking_box) => FrameItem::Tracking(tracking_box),
            None => FrameItem::Foreign(line.to_string()),
        })
        .collect()
}

pub fn read_frame(path: &Path) -> Result<Vec<FrameItem>, LogError> {
    let text = fs::read_to_string(path).map_err(|source| LogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_frame(&text))
}

/// Reads every regular file in `dir` as one frame, sorted by file name.
pub fn read_frames_dir(dir: &Path) -> Result<Vec<(PathBuf, Vec<FrameItem>)>, LogError> {
    if !dir.is_dir() {
        return Err(LogError::NotADirectory(dir.to_path_buf()));
    }
    let io_err = |source| LogError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| read_frame(&path).map(|frame| (path, frame)))
        .collect()
}
