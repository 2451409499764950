// THEORY:
// The violence check is a stateless, single-frame post-processor for the
// detector's VIOLENCE class. The raw class fires on plenty of things that are not
// a fight, so a violence box is only confirmed when at least two people are
// actually inside it, judged by their box centers.
//
// It has no memory of previous frames and can be run side by side with the
// dumping detector on the same frame batch.

use crate::core_modules::tracking_box::{ClassId, FrameItem, TrackingBox};
use tracing::debug;

/// Person centers a violence box must contain to be confirmed.
pub const MIN_PERSONS_IN_VIOLENCE: usize = 2;

/// Returns the violence boxes of `frame` that contain the centers of at least
/// two person boxes.
pub fn check_violence(frame: &[FrameItem]) -> Vec<TrackingBox> {
    check_violence_with(frame, MIN_PERSONS_IN_VIOLENCE)
}

pub fn check_violence_with(frame: &[FrameItem], min_persons: usize) -> Vec<TrackingBox> {
    let mut violence_boxes = Vec::new();
    let mut person_centers = Vec::new();

    for tracking_box in frame.iter().filter_map(FrameItem::as_tracking) {
        match tracking_box.class_id {
            ClassId::Violence => violence_boxes.push(*tracking_box),
            ClassId::Person => person_centers.push(tracking_box.center()),
            _ => {}
        }
    }

    if violence_boxes.is_empty() || person_centers.len() < min_persons {
        return Vec::new();
    }

    violence_boxes
        .into_iter()
        .filter(|violence_box| {
            let inside = person_centers
                .iter()
                .filter(|center| violence_box.contains_point(**center))
                .count();
            debug!(track_id = violence_box.track_id, inside, "violence candidate");
            inside >= min_persons
        })
        .collect()
}
