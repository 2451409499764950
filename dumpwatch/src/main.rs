// This file is an example of how to use the `dumpwatch` library.
// The main library entry point is `src/lib.rs`; recorded logs are replayed by the
// `log_replayer` binary.

use dumpwatch::pipeline::{EventPipeline, PipelineConfig, Report};
use dumpwatch::{ClassId, FrameItem, TrackingBox};

fn main() {
    println!("dumpwatch - example runner");

    let Ok(mut pipeline) = EventPipeline::new(PipelineConfig::default()) else {
        eprintln!("default configuration rejected");
        return;
    };

    // A person drops a bag next to them, then walks off while still in view.
    let bag = TrackingBox::new(ClassId::Trash, 100, 300.0, 400.0, 40.0, 30.0);
    for step in 0..6 {
        let walker = TrackingBox::new(ClassId::Person, 1, 280.0 + step as f64 * 60.0, 350.0, 60.0, 160.0);
        let frame = [FrameItem::Tracking(walker), FrameItem::Tracking(bag)];

        match pipeline.process_frame(&frame) {
            Report::NoEvent => println!("frame {}: -", pipeline.frame_count()),
            Report::Events(events) => println!("frame {}: {:?}", events.frame_index, events.dumping),
        }
    }
}
