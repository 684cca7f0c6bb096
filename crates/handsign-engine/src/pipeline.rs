//! Streaming gesture pipeline.
//!
//! One spawned task owns the orchestrator and is its only writer. The task
//! pulls frames from a [`HandFrameSource`] in arrival order, classifies each
//! one synchronously, and forwards a [`GestureUpdate`] per frame. Between
//! frames a timer tick applies gesture expiry so subscribers see a clear even
//! when the tracker goes quiet.

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use handsign_core::{Error, HandFrame, Result, Timestamp};

use crate::acquisition::HandFrameSource;
use crate::config::EngineConfig;
use crate::orchestrator::{ClassificationOrchestrator, FrameReport};
use crate::state_machine::GestureUpdate;

/// Frame-clock estimate used by expiry ticks: last frame time plus the wall
/// time elapsed since it arrived.
#[derive(Debug, Clone, Copy)]
struct FrameClock {
    frame_time: Timestamp,
    arrived: Instant,
}

impl FrameClock {
    fn now(&self) -> Timestamp {
        self.frame_time.offset(self.arrived.elapsed().as_secs_f64())
    }
}

/// Queue one update for the subscriber, giving up if shutdown is requested
/// while the output queue is full. Returns `false` when the task should exit.
async fn forward(
    tx: &mpsc::Sender<GestureUpdate>,
    shutdown_rx: &mut watch::Receiver<bool>,
    update: GestureUpdate,
) -> bool {
    tokio::select! {
        biased;

        _ = shutdown_rx.changed() => {
            debug!("shutdown requested, pending update dropped");
            false
        }

        permit = tx.reserve() => match permit {
            Ok(permit) => {
                permit.send(update);
                true
            }
            Err(_) => false, // Receiver dropped
        },
    }
}

/// The streaming pipeline
pub struct GesturePipeline {
    config: EngineConfig,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl GesturePipeline {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shutdown: None,
            task: None,
        })
    }

    /// Start the pipeline with a frame source
    pub async fn start_streaming<S: HandFrameSource + 'static>(
        &mut self,
        mut source: S,
    ) -> Result<mpsc::Receiver<GestureUpdate>> {
        if self.is_running() {
            return Err(Error::InvalidInput("pipeline already streaming".into()));
        }

        let (tx, rx) = mpsc::channel(self.config.output_queue_size);
        source.start().await?;

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        self.shutdown = Some(shutdown_tx);

        let mut orchestrator = ClassificationOrchestrator::new(&self.config);
        let poll_every = Duration::from_millis(self.config.expiry_poll_ms.max(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut clock: Option<FrameClock> = None;

            loop {
                tokio::select! {
                    biased;

                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            debug!("gesture pipeline shutting down");
                            break;
                        }
                    }

                    frame = source.recv() => {
                        let frame = match frame {
                            Ok(frame) => frame,
                            Err(Error::SourceClosed) => {
                                info!("frame source closed");
                                break;
                            }
                            Err(e) => {
                                error!("Acquisition error: {}", e);
                                break;
                            }
                        };

                        clock = Some(FrameClock {
                            frame_time: frame.timestamp,
                            arrived: Instant::now(),
                        });

                        if let Some(report) = orchestrator.on_frame(&frame) {
                            if !forward(&tx, &mut shutdown_rx, report.update).await {
                                break;
                            }
                        }
                    }

                    _ = ticker.tick() => {
                        let Some(clock) = clock else { continue };
                        if let Some(update) = orchestrator.poll(clock.now()) {
                            if !forward(&tx, &mut shutdown_rx, update).await {
                                break;
                            }
                        }
                    }
                }
            }

            if let Err(e) = source.stop().await {
                warn!("failed to stop frame source: {}", e);
            }
        });

        self.task = Some(task);
        Ok(rx)
    }

    /// Stop the pipeline and wait for the streaming task to finish.
    ///
    /// A frame already being classified completes; nothing is emitted after.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("gesture pipeline task failed: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Get current configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Synchronous frame processor with callback support
pub struct GestureStreamProcessor {
    orchestrator: ClassificationOrchestrator,
    callbacks: Vec<Box<dyn Fn(&GestureUpdate) + Send + Sync>>,
}

impl GestureStreamProcessor {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            orchestrator: ClassificationOrchestrator::new(config),
            callbacks: Vec::new(),
        }
    }

    /// Add a callback for gesture updates
    pub fn on_update<F>(&mut self, callback: F)
    where
        F: Fn(&GestureUpdate) + Send + Sync + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Process a frame and invoke callbacks
    pub fn process(&mut self, frame: &HandFrame) -> Option<FrameReport> {
        let report = self.orchestrator.on_frame(frame)?;
        self.notify(&report.update);
        Some(report)
    }

    /// Apply expiry at `now` and invoke callbacks if the gesture cleared
    pub fn poll(&mut self, now: Timestamp) -> Option<GestureUpdate> {
        let update = self.orchestrator.poll(now)?;
        self.notify(&update);
        Some(update)
    }

    pub fn orchestrator(&self) -> &ClassificationOrchestrator {
        &self.orchestrator
    }

    pub fn reset(&mut self) {
        self.orchestrator.reset();
    }

    fn notify(&self, update: &GestureUpdate) {
        for callback in &self.callbacks {
            callback(update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{ChannelFrameSource, ReplayFrameSource};
    use handsign_core::{Chirality, GestureKind, HandJoint, Position3D, SkeletonSnapshot};
    use std::sync::{Arc, Mutex};

    fn thumbs_up_frame(t: f64) -> HandFrame {
        let snapshot = HandJoint::fingertips()
            .into_iter()
            .zip([0.12, 0.04, 0.04, 0.04, 0.04])
            .fold(
                SkeletonSnapshot::new(Chirality::Right)
                    .with_joint(HandJoint::Wrist, Position3D::origin()),
                |s, (tip, d)| s.with_joint(tip, Position3D::new(0.0, d, 0.0)),
            );
        HandFrame::new(Timestamp::from_secs(t), snapshot)
    }

    fn empty_frame(t: f64) -> HandFrame {
        HandFrame::new(Timestamp::from_secs(t), SkeletonSnapshot::new(Chirality::Left))
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = EngineConfig {
            output_queue_size: 0,
            ..Default::default()
        };
        assert!(GesturePipeline::new(config).is_err());
    }

    #[tokio::test]
    async fn test_replay_emits_one_update_per_frame() {
        let frames = vec![empty_frame(0.0), thumbs_up_frame(0.1), empty_frame(0.2)];
        let mut pipeline = GesturePipeline::new(EngineConfig::default()).unwrap();
        let mut rx = pipeline
            .start_streaming(ReplayFrameSource::new(frames))
            .await
            .unwrap();

        let mut gestures = Vec::new();
        while let Some(update) = rx.recv().await {
            gestures.push(update.gesture);
        }
        assert_eq!(
            gestures,
            vec![GestureKind::None, GestureKind::ThumbsUp, GestureKind::ThumbsUp]
        );
    }

    #[tokio::test]
    async fn test_stop_ends_stream() {
        let (source, sender) = ChannelFrameSource::new(8);
        let mut pipeline = GesturePipeline::new(EngineConfig::default()).unwrap();
        let mut rx = pipeline.start_streaming(source).await.unwrap();

        sender.send(empty_frame(0.0)).await.unwrap();
        assert!(rx.recv().await.is_some());
        assert!(pipeline.is_running());

        pipeline.stop().await;
        assert!(!pipeline.is_running());
        assert!(sender.send(empty_frame(0.1)).await.is_err());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stop_with_full_output_queue() {
        let config = EngineConfig {
            output_queue_size: 1,
            ..Default::default()
        };
        let (source, sender) = ChannelFrameSource::new(8);
        let mut pipeline = GesturePipeline::new(config).unwrap();
        let mut rx = pipeline.start_streaming(source).await.unwrap();

        for i in 0..3 {
            sender.send(thumbs_up_frame(i as f64 * 0.1)).await.unwrap();
        }
        // Let the task fill the queue and block on the next update.
        tokio::time::sleep(Duration::from_millis(50)).await;

        tokio::time::timeout(Duration::from_secs(3), pipeline.stop())
            .await
            .expect("stop should not wait on a full output queue");
        assert!(!pipeline.is_running());

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let (source, _sender) = ChannelFrameSource::new(8);
        let (other, _other_sender) = ChannelFrameSource::new(8);
        let mut pipeline = GesturePipeline::new(EngineConfig::default()).unwrap();
        let _rx = pipeline.start_streaming(source).await.unwrap();

        assert!(pipeline.start_streaming(other).await.is_err());
        pipeline.stop().await;
    }

    #[test]
    fn test_stream_processor_callbacks() {
        let mut processor = GestureStreamProcessor::new(&EngineConfig::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        processor.on_update(move |update| sink.lock().unwrap().push(update.gesture));

        processor.process(&thumbs_up_frame(0.0));
        // The right hand's thumbs-up reading still holds, refreshing the deadline to 3.0.
        processor.process(&empty_frame(1.0));
        assert!(processor.poll(Timestamp::from_secs(2.5)).is_none());
        assert!(processor.poll(Timestamp::from_secs(3.0)).is_some());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![GestureKind::ThumbsUp, GestureKind::ThumbsUp, GestureKind::None]
        );
    }
}
