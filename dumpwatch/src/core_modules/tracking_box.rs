// THEORY:
// The `tracking_box` module defines the unit of input for the whole engine. An
// upstream detector/tracker looks at a frame and reports a list of boxes, each
// with a semantic class and an identity it tries to keep stable across frames.
//
// Key architectural principles:
// 1.  **Dumb Data Container**: A `TrackingBox` is a plain `Copy` value. The engine
//     never mutates a box it was given; it only reads fields or builds new boxes
//     (a dumping event is a copy of a person box with a different class).
// 2.  **Open Class Set**: The detector may emit class ids this engine knows nothing
//     about. They survive as `ClassId::Other` instead of being rejected, so a frame
//     can be passed through untouched.
// 3.  **Typed Boundary**: A frame batch is a list of `FrameItem`s. Anything that is
//     not a well-formed box is carried as `FrameItem::Foreign` and silently dropped
//     by the detectors, which is how mixed payloads are tolerated.

use serde::{Deserialize, Serialize};

/// Identity assigned by the upstream tracker.
pub type TrackId = i64;

/// Semantic class of a detection, using the detector's numeric ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ClassId {
    #[default]
    None,
    Person,
    Violence,
    Trash,
    Dumping,
    Other(i32),
}

impl ClassId {
    pub const NONE: i32 = 999;
    pub const PERSON: i32 = 0;
    pub const VIOLENCE: i32 = 6;
    pub const TRASH: i32 = 8;
    pub const DUMPING: i32 = 22;

    pub fn from_raw(raw: i32) -> Self {
        match raw {
            Self::NONE => ClassId::None,
            Self::PERSON => ClassId::Person,
            Self::VIOLENCE => ClassId::Violence,
            Self::TRASH => ClassId::Trash,
            Self::DUMPING => ClassId::Dumping,
            other => ClassId::Other(other),
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            ClassId::None => Self::NONE,
            ClassId::Person => Self::PERSON,
            ClassId::Violence => Self::VIOLENCE,
            ClassId::Trash => Self::TRASH,
            ClassId::Dumping => Self::DUMPING,
            ClassId::Other(raw) => raw,
        }
    }
}

impl From<i32> for ClassId {
    fn from(raw: i32) -> Self {
        ClassId::from_raw(raw)
    }
}

impl From<ClassId> for i32 {
    fn from(class: ClassId) -> Self {
        class.raw()
    }
}

/// A single tracked object's bounding rectangle for one frame.
/// `(x, y)` is the top-left corner; `w` and `h` are expected to be non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackingBox {
    pub class_id: ClassId,
    pub track_id: TrackId,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl TrackingBox {
    pub fn new(class_id: ClassId, track_id: TrackId, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            class_id,
            track_id,
            x,
            y,
            w,
            h,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// True if `point` lies strictly inside the box. Points on an edge do not count.
    pub fn contains_point(&self, point: (f64, f64)) -> bool {
        self.x < point.0 && point.0 < self.x + self.w && self.y < point.1 && point.1 < self.y + self.h
    }

    /// The dumping event for this (person) box: same identity and geometry.
    pub fn as_dumping(&self) -> TrackingBox {
        TrackingBox {
            class_id: ClassId::Dumping,
            ..*self
        }
    }

    pub fn is(&self, class: ClassId) -> bool {
        self.class_id == class
    }
}

/// One element of a frame batch as handed to the detectors.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameItem {
    Tracking(TrackingBox),
    /// Anything else that ended up in the batch, kept only for diagnostics.
    Foreign(String),
}

impl FrameItem {
    pub fn as_tracking(&self) -> Option<&TrackingBox> {
        match self {
            FrameItem::Tracking(tracking_box) => Some(tracking_box),
            FrameItem::Foreign(_) => None,
        }
    }
}

impl From<TrackingBox> for FrameItem {
    fn from(tracking_box: TrackingBox) -> Self {
        FrameItem::Tracking(tracking_box)
    }
}

/// Wraps plain boxes into a frame batch.
pub fn frame_of(boxes: impl IntoIterator<Item = TrackingBox>) -> Vec<FrameItem> {
    boxes.into_iter().map(FrameItem::from).collect()
}
