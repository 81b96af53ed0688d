// THEORY:
// `PipelineWorker` lets async code feed a stream into a `MotionPipeline` without
// sharing it. A single blocking task owns the pipeline and drains a bounded channel
// of messages, so each frame runs through the whole detection cycle before the
// next one starts: the frame window and the motion history are only ever touched
// by one frame at a time, in submission order. Results travel back on a oneshot
// channel per frame.

use crate::core_modules::frame::Frame;
use crate::error::{MotionError, WorkerError};
use crate::pipeline::{FrameAnalysis, MotionPipeline, PipelineConfig};
use log::debug;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const QUEUE_DEPTH: usize = 8;

/// Message type for the pipeline task.
enum WorkerMessage {
    Ingest(Frame, oneshot::Sender<Result<FrameAnalysis, MotionError>>),
    Reset(oneshot::Sender<()>),
    Shutdown,
}

pub struct PipelineWorker {
    sender: mpsc::Sender<WorkerMessage>,
    task: JoinHandle<u64>,
}

impl PipelineWorker {
    /// Spawns the pipeline task. Must be called from within a tokio runtime.
    pub fn spawn(config: PipelineConfig) -> Result<Self, MotionError> {
        let mut pipeline = MotionPipeline::new(config)?;
        let (sender, mut receiver) = mpsc::channel::<WorkerMessage>(QUEUE_DEPTH);

        let task = tokio::task::spawn_blocking(move || {
            while let Some(message) = receiver.blocking_recv() {
                match message {
                    WorkerMessage::Ingest(frame, reply) => {
                        let _ = reply.send(pipeline.ingest_frame(frame));
                    }
                    WorkerMessage::Reset(reply) => {
                        pipeline.reset();
                        let _ = reply.send(());
                    }
                    WorkerMessage::Shutdown => break,
                }
            }
            debug!(
                "pipeline worker stopping after {} frames",
                pipeline.frames_ingested()
            );
            pipeline.frames_ingested()
        });

        Ok(Self { sender, task })
    }

    /// Queues `frame` and waits for its analysis.
    pub async fn process_frame(&self, frame: Frame) -> Result<FrameAnalysis, WorkerError> {
        let (reply, result) = oneshot::channel();
        self.sender
            .send(WorkerMessage::Ingest(frame, reply))
            .await
            .map_err(|_| WorkerError::Closed)?;

        Ok(result.await.map_err(|_| WorkerError::Closed)??)
    }

    /// Clears the stream state once every frame queued before it has been processed.
    pub async fn reset(&self) -> Result<(), WorkerError> {
        let (reply, done) = oneshot::channel();
        self.sender
            .send(WorkerMessage::Reset(reply))
            .await
            .map_err(|_| WorkerError::Closed)?;
        done.await.map_err(|_| WorkerError::Closed)
    }

    /// Stops the task after the queued frames and returns how many frames it ingested.
    pub async fn shutdown(self) -> Result<u64, WorkerError> {
        // A closed channel means the task is already gone; its join result tells why.
        let _ = self.sender.send(WorkerMessage::Shutdown).await;
        self.task
            .await
            .map_err(|err| WorkerError::Panicked(err.to_string()))
    }
}
