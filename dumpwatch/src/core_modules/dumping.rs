// THEORY:
// The `dumping` module is the behavioral layer of the engine. It turns a stream of
// per-frame person and trash boxes into one kind of discrete event: a tracked
// person who was linked to a piece of trash and then separated from it while still
// being tracked ("dumped it and walked away").
//
// Key architectural principles:
// 1.  **Three Parallel Memories**: The detector owns three `History` stores: trash
//     boxes, person boxes, and the person -> trash relation sets. All three are
//     advanced exactly once per frame, so they age in lockstep.
// 2.  **Identity Reconciliation**: Trackers churn ids on stationary objects. A trash
//     box that overlaps a remembered trash box above the IOU cutoff is folded back
//     onto the remembered id before anything else looks at it.
// 3.  **Relations Only Persist, Never Grow on Known Trash**: A newly seen trash id is
//     linked to every person in range. A remembered trash id only keeps the links
//     it already had; a person wandering close later does not become its owner.
// 4.  **Event on Shrink**: A person whose relation count dropped since the last
//     frame, while the person is still tracked, has left something behind.
// 5.  **Ordered Commit**: Relations, persons and trash are committed in that order
//     at the very end, so every comparison in a frame reads the previous frame.

use crate::core_modules::error::ConfigError;
use crate::core_modules::geometry::{distance, iou};
use crate::core_modules::history::{History, RELEASE_THRESHOLD};
use crate::core_modules::tracking_box::{ClassId, FrameItem, TrackId, TrackingBox};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

/// Max center-to-center distance (exclusive) for a person to be related to trash.
pub const DUMPING_THRESHOLD: f64 = 200.0;
/// IOU above which a current trash box is treated as a remembered one.
pub const IOU_THRESHOLD: f64 = 0.9;

type BoxMap = IndexMap<TrackId, TrackingBox>;
type RelationMap = IndexMap<TrackId, Vec<TrackId>>;

/// Tunables for the dumping detector. Defaults are the contract values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DumpingConfig {
    pub distance_threshold: f64,
    pub release_threshold: u32,
    pub iou_threshold: f64,
}

impl Default for DumpingConfig {
    fn default() -> Self {
        Self {
            distance_threshold: DUMPING_THRESHOLD,
            release_threshold: RELEASE_THRESHOLD,
            iou_threshold: IOU_THRESHOLD,
        }
    }
}

impl DumpingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.release_threshold == 0 {
            return Err(ConfigError::ZeroReleaseThreshold);
        }
        if !self.distance_threshold.is_finite() || self.distance_threshold <= 0.0 {
            return Err(ConfigError::InvalidDistance(self.distance_threshold));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(ConfigError::InvalidIou(self.iou_threshold));
        }
        Ok(())
    }
}

/// Stateful person <-> trash relation tracker. One instance per video stream.
pub struct DumpingDetector {
    config: DumpingConfig,
    trash_history: History<TrackId, TrackingBox>,
    person_history: History<TrackId, TrackingBox>,
    relation_history: History<TrackId, Vec<TrackId>>,
}

impl Default for DumpingDetector {
    fn default() -> Self {
        Self::with_config(DumpingConfig::default())
    }
}

impl DumpingDetector {
    pub fn new(config: DumpingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: DumpingConfig) -> Self {
        Self {
            config,
            trash_history: History::with_release_threshold(config.release_threshold),
            person_history: History::with_release_threshold(config.release_threshold),
            relation_history: History::with_release_threshold(config.release_threshold),
        }
    }

    pub fn config(&self) -> &DumpingConfig {
        &self.config
    }

    /// Convenience for callers that only have well-formed boxes.
    pub fn process_boxes(&mut self, boxes: &[TrackingBox]) -> Vec<TrackingBox> {
        self.run(boxes.iter())
    }

    /// Runs one frame and returns the dumping events it produced.
    /// Frames must be fed in chronological order.
    pub fn process(&mut self, frame: &[FrameItem]) -> Vec<TrackingBox> {
        let boxes: Vec<&TrackingBox> = frame.iter().filter_map(FrameItem::as_tracking).collect();
        if boxes.len() < frame.len() {
            warn!(dropped = frame.len() - boxes.len(), "ignoring foreign frame items");
        }
        self.run(boxes.into_iter())
    }

    fn run<'a>(&mut self, boxes: impl Iterator<Item = &'a TrackingBox>) -> Vec<TrackingBox> {
        // --- 1. Filter & Partition ---
        let mut persons = BoxMap::new();
        let mut trash = BoxMap::new();
        let mut seen_any = false;
        for tracking_box in boxes {
            seen_any = true;
            match tracking_box.class_id {
                ClassId::Person => {
                    persons.insert(tracking_box.track_id, *tracking_box);
                }
                ClassId::Trash => {
                    trash.insert(tracking_box.track_id, *tracking_box);
                }
                _ => {}
            }
        }

        if !seen_any {
            // Nothing to relate, but absence still has to be aged.
            trace!("empty frame");
            self.commit(RelationMap::new(), persons, trash);
            return Vec::new();
        }

        // --- 2. Trash Identity Reconciliation ---
        let trash = self.reconcile_trash(trash);

        // --- 3. Relation Derivation ---
        let mut relations = self.derive_relations(&persons, &trash);

        // --- 4. Event Inference ---
        let events = self.infer_events(&persons, &mut relations);

        // --- 5. Commit ---
        self.commit(relations, persons, trash);

        events
    }

    /// Re-keys current trash boxes that overlap a remembered trash box onto the
    /// remembered id. Works on a snapshot and builds a new map. Remembered ids are
    /// visited in history order and fold every still-unclaimed overlapping box onto
    /// themselves; a claimed box is not matched again. When one remembered id folds
    /// several boxes, the last one in frame order is kept.
    fn reconcile_trash(&self, current: BoxMap) -> BoxMap {
        let snapshot: Vec<(TrackId, TrackingBox)> = current.into_iter().collect();
        let mut claimed = vec![false; snapshot.len()];
        let mut claims: Vec<(TrackId, usize)> = Vec::new();

        for (prev_id, prev_box) in self.trash_history.items() {
            for (i, (_, curr_box)) in snapshot.iter().enumerate() {
                if !claimed[i] && iou(prev_box, curr_box) > self.config.iou_threshold {
                    claimed[i] = true;
                    claims.push((*prev_id, i));
                }
            }
        }

        let mut reconciled = BoxMap::with_capacity(snapshot.len());
        for (i, (curr_id, curr_box)) in snapshot.iter().enumerate() {
            if !claimed[i] {
                reconciled.insert(*curr_id, *curr_box);
            }
        }
        // Reconciled boxes go in last and win any id collision with an
        // unreconciled box that happens to carry the remembered id.
        for (prev_id, i) in claims {
            let (curr_id, curr_box) = snapshot[i];
            if curr_id != prev_id {
                debug!(from = curr_id, to = prev_id, "reconciled trash identity");
            }
            reconciled.insert(prev_id, curr_box);
        }
        reconciled
    }

    fn derive_relations(&self, persons: &BoxMap, trash: &BoxMap) -> RelationMap {
        let mut relations = RelationMap::new();

        for (&trash_id, trash_box) in trash {
            let known = self.trash_history.contains_key(&trash_id);
            let in_range = persons
                .iter()
                .filter(|(_, person_box)| distance(person_box, trash_box) < self.config.distance_threshold)
                .map(|(&person_id, _)| person_id);

            for person_id in in_range {
                if known {
                    let had_relation = self
                        .relation_history
                        .get(&person_id)
                        .is_ok_and(|previous| previous.contains(&trash_id));
                    if !had_relation {
                        continue;
                    }
                }
                relations.entry(person_id).or_default().push(trash_id);
            }

            if !known {
                trace!(trash_id, "new trash object");
            }
        }

        relations
    }

    /// Emits a dumping event for every still-tracked person whose relation count
    /// shrank. Still-tracked persons with a previous relation entry also get an
    /// (possibly empty) current entry, so a broken relation is reported once
    /// rather than on every frame until the old entry expires.
    fn infer_events(&self, persons: &BoxMap, relations: &mut RelationMap) -> Vec<TrackingBox> {
        let mut events = Vec::new();

        for (person_id, previous) in self.relation_history.items() {
            let Some(person_box) = persons.get(person_id) else {
                continue;
            };
            let current = relations.entry(*person_id).or_default();
            if !previous.is_empty() && current.len() < previous.len() {
                info!(
                    person_id = *person_id,
                    previous = previous.len(),
                    current = current.len(),
                    "dumping event"
                );
                events.push(person_box.as_dumping());
            }
        }

        events
    }

    fn commit(&mut self, relations: RelationMap, persons: BoxMap, trash: BoxMap) {
        let evicted = self.relation_history.update(relations)
            + self.person_history.update(persons)
            + self.trash_history.update(trash);
        if evicted > 0 {
            debug!(evicted, "released expired history entries");
        }
    }
}
