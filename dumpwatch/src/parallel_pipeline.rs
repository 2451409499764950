// THEORY:
// The parallel front end runs many independent video streams at once. Each stream
// gets its own `EventPipeline`, owned by a dedicated tokio task and fed through an
// unbounded channel. A stream's frames are therefore handled strictly in the order
// they were submitted, while different streams proceed concurrently. No detector
// state is ever shared between streams, so the only synchronization is the pool's
// own registry of workers.

use crate::core_modules::error::PoolError;
use crate::core_modules::tracking_box::FrameItem;
use crate::pipeline::{EventPipeline, PipelineConfig, Report};
use futures::future::join_all;
use std::collections::HashMap;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub type StreamId = String;

pub struct FrameTask {
    pub frame: Vec<FrameItem>,
    pub result_sender: oneshot::Sender<Report>,
}

struct StreamWorker {
    task_sender: mpsc::UnboundedSender<FrameTask>,
    handle: JoinHandle<u64>,
}

impl StreamWorker {
    fn spawn(stream: StreamId, pipeline: EventPipeline) -> Self {
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<FrameTask>();

        let handle = tokio::spawn(async move {
            let mut pipeline = pipeline;
            while let Some(task) = task_receiver.recv().await {
                let report = pipeline.process_frame(&task.frame);
                if task.result_sender.send(report).is_err() {
                    debug!(stream = %stream, "caller stopped waiting for a report");
                }
            }
            debug!(stream = %stream, frames = pipeline.frame_count(), "stream worker finished");
            pipeline.frame_count()
        });

        Self { task_sender, handle }
    }
}

/// A registry of per-stream pipelines, created lazily on first use.
pub struct StreamPool {
    config: PipelineConfig,
    workers: Mutex<HashMap<StreamId, StreamWorker>>,
}

impl StreamPool {
    pub fn new(config: PipelineConfig) -> Result<Self, PoolError> {
        config.dumping.validate()?;
        info!(cpus = num_cpus::get(), "stream pool ready");
        Ok(Self {
            config,
            workers: Mutex::new(HashMap::new()),
        })
    }

    pub async fn stream_count(&self) -> usize {
        self.workers.lock().await.len()
    }

    /// Processes one frame of `stream` and waits for its report.
    pub async fn submit(&self, stream: &str, frame: Vec<FrameItem>) -> Result<Report, PoolError> {
        let (result_sender, result_receiver) = oneshot::channel();
        self.enqueue(stream, FrameTask { frame, result_sender }).await?;

        result_receiver
            .await
            .map_err(|_| PoolError::ReplyDropped(stream.to_string()))
    }

    /// Submits a mixed batch of frames concurrently. Frames of the same stream are
    /// enqueued in batch order; results come back in batch order.
    pub async fn process_batch(&self, batch: Vec<(StreamId, Vec<FrameItem>)>) -> Vec<Result<Report, PoolError>> {
        let mut pending = Vec::with_capacity(batch.len());
        for (stream, frame) in batch {
            let (result_sender, result_receiver) = oneshot::channel();
            let queued = self.enqueue(&stream, FrameTask { frame, result_sender }).await;
            pending.push(async move {
                queued?;
                result_receiver.await.map_err(|_| PoolError::ReplyDropped(stream))
            });
        }
        join_all(pending).await
    }

    async fn enqueue(&self, stream: &str, task: FrameTask) -> Result<(), PoolError> {
        let mut workers = self.workers.lock().await;
        if !workers.contains_key(stream) {
            let pipeline = EventPipeline::new(self.config.clone())?;
            debug!(stream, "starting stream worker");
            workers.insert(stream.to_string(), StreamWorker::spawn(stream.to_string(), pipeline));
        }
        workers[stream]
            .task_sender
            .send(task)
            .map_err(|_| PoolError::StreamClosed(stream.to_string()))
    }

    /// Drops a stream and its history. Returns the number of frames it processed.
    pub async fn close_stream(&self, stream: &str) -> Option<u64> {
        let worker = self.workers.lock().await.remove(stream)?;
        drop(worker.task_sender);
        match worker.handle.await {
            Ok(frames) => Some(frames),
            Err(err) => {
                warn!(stream, %err, "stream worker failed");
                None
            }
        }
    }

    /// Closes every stream and waits for the workers to drain.
    pub async fn shutdown(self) -> HashMap<StreamId, u64> {
        let workers = self.workers.into_inner();
        let mut totals = HashMap::with_capacity(workers.len());
        for (stream, worker) in workers {
            drop(worker.task_sender);
            match worker.handle.await {
                Ok(frames) => {
                    totals.insert(stream, frames);
                }
                Err(err) => warn!(stream = %stream, %err, "stream worker failed"),
            }
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::tracking_box::{ClassId, TrackingBox, frame_of};

    fn person(id: i64, x: f64) -> TrackingBox {
        TrackingBox::new(ClassId::Person, id, x, 0.0, 10.0, 10.0)
    }

    fn trash(id: i64) -> TrackingBox {
        TrackingBox::new(ClassId::Trash, id, 5.0, 5.0, 10.0, 10.0)
    }

    #[tokio::test]
    async fn streams_keep_separate_histories() {
        let pool = StreamPool::new(PipelineConfig::default()).expect("config");

        let first = pool.submit("cam-a", frame_of([person(1, 0.0), trash(10)])).await.expect("report");
        assert_eq!(first, Report::NoEvent);

        // Same ids on another camera start from scratch: no previous relation there.
        let other = pool.submit("cam-b", frame_of([person(1, 800.0), trash(10)])).await.expect("report");
        assert_eq!(other, Report::NoEvent);

        let second = pool.submit("cam-a", frame_of([person(1, 800.0), trash(10)])).await.expect("report");
        assert_eq!(second.dumping(), &[person(1, 800.0).as_dumping()]);

        assert_eq!(pool.stream_count().await, 2);
        let totals = pool.shutdown().await;
        assert_eq!(totals.get("cam-a"), Some(&2));
        assert_eq!(totals.get("cam-b"), Some(&1));
    }

    #[tokio::test]
    async fn batch_preserves_per_stream_order() {
        let pool = StreamPool::new(PipelineConfig::default()).expect("config");
        let batch = vec![
            ("cam-a".to_string(), frame_of([person(1, 0.0), trash(10)])),
            ("cam-b".to_string(), frame_of([person(2, 0.0), trash(20)])),
            ("cam-a".to_string(), frame_of([person(1, 800.0), trash(10)])),
            ("cam-b".to_string(), frame_of([person(2, 0.0), trash(20)])),
        ];

        let reports: Vec<Report> = pool
            .process_batch(batch)
            .await
            .into_iter()
            .collect::<Result<_, _>>()
            .expect("all frames processed");

        assert_eq!(reports[0], Report::NoEvent);
        assert_eq!(reports[1], Report::NoEvent);
        assert_eq!(reports[2].dumping().len(), 1);
        assert_eq!(reports[3], Report::NoEvent);
    }

    #[tokio::test]
    async fn closing_a_stream_forgets_it() {
        let pool = StreamPool::new(PipelineConfig::default()).expect("config");
        pool.submit("cam-a", frame_of([person(1, 0.0), trash(10)])).await.expect("report");

        assert_eq!(pool.close_stream("cam-a").await, Some(1));
        assert_eq!(pool.close_stream("cam-a").await, None);

        // A reopened stream has no memory of the old relation.
        let report = pool.submit("cam-a", frame_of([person(1, 800.0), trash(10)])).await.expect("report");
        assert_eq!(report, Report::NoEvent);
    }
}
