use dumpwatch::core_modules::detection_log::{parse_frame, parse_line};
use dumpwatch::core_modules::dumping::DumpingDetector;
use dumpwatch::core_modules::tracking_box::frame_of;
use dumpwatch::{ClassId, FrameItem, TrackingBox};

fn person(id: i64, x: f64, y: f64) -> TrackingBox {
    TrackingBox::new(ClassId::Person, id, x, y, 10.0, 10.0)
}

fn trash(id: i64, x: f64, y: f64) -> TrackingBox {
    TrackingBox::new(ClassId::Trash, id, x, y, 10.0, 10.0)
}

#[test]
fn person_leaving_trash_behind_is_reported_once() {
    let mut detector = DumpingDetector::default();

    let events = detector.process_boxes(&[person(1, 0.0, 0.0), trash(1, 5.0, 5.0)]);
    assert!(events.is_empty());

    let moved = person(1, 1000.0, 1000.0);
    let events = detector.process_boxes(&[moved, trash(1, 5.0, 5.0)]);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].class_id, ClassId::Dumping);
    assert_eq!(events[0].track_id, 1);
    assert_eq!((events[0].x, events[0].y, events[0].w, events[0].h), (1000.0, 1000.0, 10.0, 10.0));

    for _ in 0..12 {
        assert!(detector.process_boxes(&[moved, trash(1, 5.0, 5.0)]).is_empty());
    }
}

#[test]
fn latecomer_near_known_trash_is_not_blamed() {
    let mut detector = DumpingDetector::default();
    detector.process_boxes(&[person(1, 0.0, 0.0), person(2, 40.0, 0.0), trash(9, 5.0, 5.0)]);

    // Person 3 walks up to the known trash, then leaves again.
    detector.process_boxes(&[person(1, 0.0, 0.0), person(2, 40.0, 0.0), person(3, 10.0, 10.0), trash(9, 5.0, 5.0)]);
    let events = detector.process_boxes(&[
        person(1, 0.0, 0.0),
        person(2, 40.0, 0.0),
        person(3, 900.0, 900.0),
        trash(9, 5.0, 5.0),
    ]);
    assert!(events.is_empty());

    // Person 2 leaves: only they are reported.
    let events = detector.process_boxes(&[person(1, 0.0, 0.0), person(2, 900.0, 0.0), trash(9, 5.0, 5.0)]);
    assert_eq!(events.iter().map(|e| e.track_id).collect::<Vec<_>>(), vec![2]);
}

#[test]
fn stationary_trash_keeps_its_identity_under_tracker_churn() {
    let mut detector = DumpingDetector::default();
    detector.process_boxes(&[person(1, 0.0, 0.0), trash(5, 5.0, 5.0)]);

    // Every frame the tracker hands out a fresh id for the same object.
    for churned in 100..110 {
        let events = detector.process_boxes(&[person(1, 0.0, 0.0), trash(churned, 5.0, 5.0)]);
        assert!(events.is_empty(), "relation lost at churned id {churned}");
    }

    // Walking away still breaks the relation with the original object.
    let events = detector.process_boxes(&[person(1, 700.0, 0.0), trash(200, 5.0, 5.0)]);
    assert_eq!(events.len(), 1);
}

#[test]
fn trash_disappearing_together_with_relation_reports_dumping() {
    // Losing the trash box while the person is still tracked also shrinks the relation.
    let mut detector = DumpingDetector::default();
    detector.process_boxes(&[person(1, 0.0, 0.0), trash(5, 5.0, 5.0)]);
    let events = detector.process_boxes(&[person(1, 0.0, 0.0)]);
    assert_eq!(events.len(), 1);
}

#[test]
fn foreign_items_are_silently_ignored() {
    let mut plain = DumpingDetector::default();
    let mut mixed = DumpingDetector::default();

    let only_person = frame_of([person(1, 0.0, 0.0)]);
    let mut with_noise = only_person.clone();
    with_noise.push(FrameItem::Foreign("not a box".into()));

    assert_eq!(plain.process(&only_person), mixed.process(&with_noise));
}

#[test]
fn malformed_record_never_reaches_a_frame() {
    assert_eq!(parse_line("0 1 2 3"), None);

    let frame = parse_frame("0 1 2 3\n");
    assert!(frame.iter().all(|item| item.as_tracking().is_none()));

    let mut detector = DumpingDetector::default();
    assert!(detector.process(&frame).is_empty());
}

#[test]
fn returning_person_without_the_trash_is_reported() {
    let mut detector = DumpingDetector::default();
    detector.process_boxes(&[person(1, 0.0, 0.0), trash(5, 5.0, 5.0)]);

    // Out of view for a few frames: no event while absent.
    for _ in 0..3 {
        assert!(detector.process_boxes(&[trash(5, 5.0, 5.0)]).is_empty());
    }
    // Back in view, far from the trash.
    let events = detector.process_boxes(&[person(1, 600.0, 0.0), trash(5, 5.0, 5.0)]);
    assert_eq!(events.len(), 1);
}

#[test]
fn relation_expires_after_ten_absent_frames() {
    let mut detector = DumpingDetector::default();
    detector.process_boxes(&[person(1, 0.0, 0.0), trash(5, 5.0, 5.0)]);

    for _ in 0..10 {
        detector.process_boxes(&[]);
    }
    // Everything was forgotten; reappearing far apart is not an event.
    let events = detector.process_boxes(&[person(1, 600.0, 0.0), trash(5, 5.0, 5.0)]);
    assert!(events.is_empty());
}
