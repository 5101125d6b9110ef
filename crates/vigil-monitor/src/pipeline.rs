//! Pipelined monitor.
//!
//! ```text
//! FrameSource -> capture -> FrameQueue -> inference (rayon, blocking) -> FrameQueue -> evaluation
//!                  |                                                                    |
//!            status watch                                             results watch, commands
//! ```
//!
//! Capture, inference and evaluation run as separate tasks so a slow
//! detector never stalls reading and a slow engine never stalls detection.
//! For live sources both queues drop their oldest frame when full, so a
//! backlog never builds up in front of the detectors.
//! The evaluation task is the single owner of the `TriggerEngine`; ledger
//! snapshots and session resets reach it as commands, which keeps every
//! engine mutation in frame order.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};

use vigil_engine::{EngineConfig, TriggerEngine};
use vigil_models::{
    Detection, FrameInfo, FrameResult, LedgerEntry, SessionId, SessionStats, TransitionKind,
    ViolationClass,
};

use crate::config::MonitorConfig;
use crate::detector::DetectorEnsemble;
use crate::error::{MonitorError, MonitorResult};
use crate::logging::SessionLogger;
use crate::metrics as monitor_metrics;
use crate::queue::{FrameQueue, OverflowPolicy, PushOutcome};
use crate::source::{Frame, FrameSource};
use crate::status::MonitorStatus;

/// Final totals of a monitoring run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub stats: SessionStats,
    pub ledger: BTreeMap<ViolationClass, LedgerEntry>,
    pub frames_dropped: u64,
}

enum EngineCommand {
    Snapshot(oneshot::Sender<BTreeMap<ViolationClass, LedgerEntry>>),
    Stats(oneshot::Sender<SessionStats>),
    Reset(oneshot::Sender<SessionId>),
}

struct Inferred {
    info: FrameInfo,
    detections: Vec<Detection>,
}

/// Monitor ready to be started on a frame source.
pub struct Monitor {
    config: MonitorConfig,
    engine: TriggerEngine,
    ensemble: Arc<DetectorEnsemble>,
}

impl Monitor {
    /// Validates `engine_config` by building the engine up front.
    pub fn new(
        config: MonitorConfig,
        engine_config: EngineConfig,
        ensemble: DetectorEnsemble,
    ) -> MonitorResult<Self> {
        Ok(Self {
            config,
            engine: TriggerEngine::new(engine_config)?,
            ensemble: Arc::new(ensemble),
        })
    }

    /// Spawn the pipeline tasks. Must be called inside a tokio runtime.
    pub fn start<S: FrameSource + 'static>(self, source: S) -> MonitorHandle {
        let Monitor {
            config,
            engine,
            ensemble,
        } = self;

        let source_name = source.name();
        let policy = OverflowPolicy::for_source(source.is_live());
        let logger = SessionLogger::new(&engine.session_stats().session_id, source_name);
        logger.log_start(engine.config().classes.len(), ensemble.len());
        let span = logger.create_span();

        let (status_tx, status_rx) = watch::channel(MonitorStatus::Starting);
        let (results_tx, results_rx) = watch::channel(None);
        let (paused_tx, paused_rx) = watch::channel(false);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (logger_tx, logger_rx) = watch::channel(logger);
        let (commands_tx, commands_rx) = mpsc::channel(8);

        let status_tx = Arc::new(status_tx);
        let captured = Arc::new(FrameQueue::new(config.queue_capacity, policy));
        let queue = Arc::new(FrameQueue::new(config.queue_capacity, policy));

        let capture = CaptureStage {
            frames: captured.clone(),
            status: status_tx.clone(),
            paused: paused_rx,
            shutdown: shutdown_rx,
            logger: logger_rx,
            retry_delay: config.source_retry_delay,
            max_retries: config.max_source_retries,
        };

        let evaluation = EvaluationStage {
            engine,
            captured: captured.clone(),
            queue: queue.clone(),
            commands: commands_rx,
            results: results_tx,
            logger: logger_tx,
            source_name,
        };

        let task = tokio::spawn(
            async move {
                let capture = tokio::spawn(capture.run(source).in_current_span());
                let inference =
                    tokio::spawn(run_inference(captured, ensemble, queue).in_current_span());
                let evaluation = tokio::spawn(evaluation.run().in_current_span());

                let (capture, inference, evaluation) = tokio::join!(capture, inference, evaluation);
                status_tx.send_replace(MonitorStatus::Finished);

                // Inference first: its failure closes capture's queue.
                let summary = evaluation?;
                inference??;
                capture??;
                Ok::<_, MonitorError>(summary)
            }
            .instrument(span),
        );

        MonitorHandle {
            commands: commands_tx,
            status: status_rx,
            results: results_rx,
            paused: paused_tx,
            shutdown: ShutdownTrigger(Arc::new(shutdown_tx)),
            task,
        }
    }
}

/// Requests a graceful stop: capture ends, queued frames are still evaluated.
#[derive(Clone)]
pub struct ShutdownTrigger(Arc<watch::Sender<bool>>);

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

/// Control and observation handle for a running monitor.
pub struct MonitorHandle {
    commands: mpsc::Sender<EngineCommand>,
    status: watch::Receiver<MonitorStatus>,
    results: watch::Receiver<Option<FrameResult>>,
    paused: watch::Sender<bool>,
    shutdown: ShutdownTrigger,
    task: JoinHandle<MonitorResult<SessionSummary>>,
}

impl MonitorHandle {
    pub fn status(&self) -> MonitorStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<MonitorStatus> {
        self.status.clone()
    }

    /// Most recent frame result, if any frame was evaluated yet.
    pub fn latest_result(&self) -> Option<FrameResult> {
        self.results.borrow().clone()
    }

    pub fn subscribe_results(&self) -> watch::Receiver<Option<FrameResult>> {
        self.results.clone()
    }

    pub async fn ledger_snapshot(&self) -> MonitorResult<BTreeMap<ViolationClass, LedgerEntry>> {
        self.request(EngineCommand::Snapshot).await
    }

    pub async fn session_stats(&self) -> MonitorResult<SessionStats> {
        self.request(EngineCommand::Stats).await
    }

    /// Start a new session; returns its ID.
    pub async fn reset_session(&self) -> MonitorResult<SessionId> {
        self.request(EngineCommand::Reset).await
    }

    /// Stop reading frames. Engine state is kept.
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Wait for the pipeline to finish and return the final totals.
    pub async fn wait(self) -> MonitorResult<SessionSummary> {
        let MonitorHandle {
            task,
            paused,
            shutdown,
            ..
        } = self;

        // Dropping the control senders early would read as a shutdown.
        let result = task.await?;
        drop((paused, shutdown));
        result
    }

    async fn request<R>(
        &self,
        command: impl FnOnce(oneshot::Sender<R>) -> EngineCommand,
    ) -> MonitorResult<R> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| MonitorError::ChannelClosed("engine commands"))?;
        rx.await
            .map_err(|_| MonitorError::ChannelClosed("engine reply"))
    }
}

// ============================================================================
// Capture
// ============================================================================

struct CaptureStage {
    frames: Arc<FrameQueue<Frame>>,
    status: Arc<watch::Sender<MonitorStatus>>,
    paused: watch::Receiver<bool>,
    shutdown: watch::Receiver<bool>,
    logger: watch::Receiver<SessionLogger>,
    retry_delay: Duration,
    max_retries: u32,
}

impl CaptureStage {
    async fn run<S: FrameSource>(mut self, source: S) -> MonitorResult<()> {
        let result = self.capture(source).await;
        self.frames.close().await;
        result
    }

    async fn capture<S: FrameSource>(&mut self, mut source: S) -> MonitorResult<()> {
        self.status.send_replace(MonitorStatus::Running);
        let mut failures: u32 = 0;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            if *self.paused.borrow_and_update() {
                if !self.wait_while_paused().await {
                    break;
                }
                continue;
            }

            let next = tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                changed = self.paused.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                next = source.next_frame() => next,
            };

            match next {
                Ok(Some(frame)) => {
                    if failures > 0 {
                        failures = 0;
                        self.status.send_replace(MonitorStatus::Running);
                    }
                    let index = frame.info.index;
                    match self.frames.push(frame).await {
                        PushOutcome::Queued => {}
                        PushOutcome::DroppedOldest => {
                            warn!(
                                source = source.name(),
                                frame = index,
                                "Inference behind, dropped oldest captured frame"
                            );
                            monitor_metrics::record_frame_dropped();
                        }
                        PushOutcome::Closed => {
                            return Err(MonitorError::ChannelClosed("captured frames"));
                        }
                    }
                }
                Ok(None) => {
                    info!(source = source.name(), "Frame source exhausted");
                    break;
                }
                Err(e) if e.is_retryable() => {
                    failures += 1;
                    if failures > self.max_retries {
                        warn!(
                            source = source.name(),
                            attempts = failures - 1,
                            "Giving up on frame source"
                        );
                        return Err(e);
                    }

                    self.status
                        .send_replace(MonitorStatus::Disconnected { attempt: failures });
                    self.logger
                        .borrow()
                        .log_disconnected(failures, self.retry_delay, &e.to_string());
                    monitor_metrics::record_reconnect(source.name());

                    tokio::select! {
                        _ = self.shutdown.changed() => break,
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }

                    if let Err(e) = source.reconnect().await {
                        if !e.is_retryable() {
                            return Err(e);
                        }
                        warn!(source = source.name(), "Reconnect failed: {}", e);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Returns false if shutdown was requested while paused.
    async fn wait_while_paused(&mut self) -> bool {
        self.status.send_replace(MonitorStatus::Paused);
        self.logger.borrow().log_paused();

        while *self.paused.borrow_and_update() {
            tokio::select! {
                _ = self.shutdown.changed() => return false,
                changed = self.paused.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }

        self.status.send_replace(MonitorStatus::Running);
        self.logger.borrow().log_resumed();
        true
    }
}

// ============================================================================
// Inference
// ============================================================================

async fn run_inference(
    frames: Arc<FrameQueue<Frame>>,
    ensemble: Arc<DetectorEnsemble>,
    queue: Arc<FrameQueue<Inferred>>,
) -> MonitorResult<()> {
    let result = infer_frames(&frames, ensemble, &queue).await;
    frames.close().await;
    queue.close().await;
    result
}

async fn infer_frames(
    frames: &FrameQueue<Frame>,
    ensemble: Arc<DetectorEnsemble>,
    queue: &FrameQueue<Inferred>,
) -> MonitorResult<()> {
    while let Some(frame) = frames.pop().await {
        let ensemble = ensemble.clone();
        let inferred = tokio::task::spawn_blocking(move || Inferred {
            info: frame.info,
            detections: ensemble.detect(&frame),
        })
        .await?;

        let index = inferred.info.index;
        match queue.push(inferred).await {
            PushOutcome::Queued => {}
            PushOutcome::DroppedOldest => {
                warn!(frame = index, "Evaluation behind, dropped oldest queued frame");
                monitor_metrics::record_frame_dropped();
            }
            PushOutcome::Closed => break,
        }
    }
    Ok(())
}

// ============================================================================
// Evaluation
// ============================================================================

struct EvaluationStage {
    engine: TriggerEngine,
    captured: Arc<FrameQueue<Frame>>,
    queue: Arc<FrameQueue<Inferred>>,
    commands: mpsc::Receiver<EngineCommand>,
    results: watch::Sender<Option<FrameResult>>,
    logger: watch::Sender<SessionLogger>,
    source_name: &'static str,
}

impl EvaluationStage {
    async fn run(mut self) -> SessionSummary {
        loop {
            tokio::select! {
                biased;
                Some(command) = self.commands.recv() => self.handle_command(command),
                inferred = self.queue.pop() => match inferred {
                    Some(inferred) => self.evaluate(inferred),
                    None => break,
                },
            }
        }

        let summary = SessionSummary {
            stats: self.engine.session_stats(),
            ledger: self.engine.ledger_snapshot(),
            frames_dropped: self.captured.dropped().await + self.queue.dropped().await,
        };
        self.logger.borrow().log_summary(&summary);
        summary
    }

    fn evaluate(&mut self, inferred: Inferred) {
        let result = self.engine.evaluate(inferred.info, &inferred.detections);

        if !result.transitions.is_empty() {
            let logger = self.logger.borrow();
            for transition in &result.transitions {
                match transition.kind {
                    TransitionKind::Raised => {
                        logger.log_alert_raised(transition.class, result.frame_index)
                    }
                    TransitionKind::Cleared => {
                        logger.log_alert_cleared(transition.class, result.frame_index)
                    }
                }
            }
        }

        self.results.send_replace(Some(result));
    }

    fn handle_command(&mut self, command: EngineCommand) {
        // Replies are dropped silently if the requester went away.
        match command {
            EngineCommand::Snapshot(reply) => {
                let _ = reply.send(self.engine.ledger_snapshot());
            }
            EngineCommand::Stats(reply) => {
                let _ = reply.send(self.engine.session_stats());
            }
            EngineCommand::Reset(reply) => {
                self.engine.reset_session();
                let session_id = self.engine.session_stats().session_id;
                self.logger
                    .send_replace(SessionLogger::new(&session_id, self.source_name));
                self.results.send_replace(None);
                let _ = reply.send(session_id);
            }
        }
    }
}
