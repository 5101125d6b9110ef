//! Trigger engine orchestrator.
//!
//! Owns one smoothing window and one debouncer per configured class plus
//! the session ledger, and runs the per-frame pipeline:
//!
//! ```text
//! detections -> normalize -> (per class) smooth -> debounce -> ledger -> FrameResult
//! ```
//!
//! The engine is synchronous and holds no global state. Callers that run it
//! inside a concurrent pipeline must serialize `evaluate` and
//! `reset_session` through a single owner.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, info, warn};

use vigil_models::{
    AlertTransition, DebounceState, Detection, FrameInfo, FrameResult, LedgerEntry,
    SessionStats, TransitionKind, ViolationClass,
};

use crate::config::{ClassConfig, EngineConfig};
use crate::debounce::{DebounceThresholds, Debouncer};
use crate::error::ConfigResult;
use crate::ledger::SessionLedger;
use crate::metrics as engine_metrics;
use crate::normalizer::SignalNormalizer;
use crate::smoothing::SmoothingWindow;

/// Per-class evaluation state.
#[derive(Debug, Clone)]
struct ClassChannel {
    window: SmoothingWindow,
    debouncer: Debouncer,
}

impl ClassChannel {
    fn new(config: &ClassConfig) -> Self {
        Self {
            window: SmoothingWindow::new(config.buffer_size),
            debouncer: Debouncer::new(DebounceThresholds::from(config)),
        }
    }

    fn reset(&mut self) {
        self.window.clear();
        self.debouncer.reset();
    }
}

/// Debounced safety trigger engine.
#[derive(Debug, Clone)]
pub struct TriggerEngine {
    config: EngineConfig,
    normalizer: SignalNormalizer,
    channels: BTreeMap<ViolationClass, ClassChannel>,
    ledger: SessionLedger,
    stats: SessionStats,
    last_frame: Option<u64>,
}

impl TriggerEngine {
    /// Build an engine from validated configuration.
    ///
    /// Fails with the first configuration problem found; an engine never
    /// runs on invalid thresholds.
    pub fn new(config: EngineConfig) -> ConfigResult<Self> {
        config.validate().inspect_err(|e| {
            warn!(class = ?e.class(), "Rejected engine configuration: {}", e);
        })?;

        let channels = config
            .classes
            .iter()
            .map(|c| (c.class, ClassChannel::new(c)))
            .collect();
        let ledger = SessionLedger::new(config.monitored_classes(), config.frame_interval());
        let stats = SessionStats::new();

        info!(
            session_id = %stats.session_id,
            classes = ?config.monitored_classes().collect::<Vec<_>>(),
            frame_interval_ms = config.frame_interval_ms,
            "Trigger engine initialized"
        );

        Ok(Self {
            normalizer: SignalNormalizer::new(&config),
            config,
            channels,
            ledger,
            stats,
            last_frame: None,
        })
    }

    /// Evaluate one frame's merged detector output.
    pub fn evaluate(&mut self, frame: FrameInfo, detections: &[Detection]) -> FrameResult {
        let started = Instant::now();

        if let Some(last) = self.last_frame {
            if frame.index > last + 1 {
                debug!(
                    frame = frame.index,
                    missing = frame.index - last - 1,
                    "Gap in frame sequence"
                );
            }
        }
        self.last_frame = Some(frame.index);

        let normalized = self.normalizer.normalize(detections);
        for issue in &normalized.malformed {
            warn!(
                frame = frame.index,
                kind = issue.kind(),
                "Malformed observation: {}",
                issue
            );
            engine_metrics::record_malformed(issue.kind());
        }

        let mut active_alerts = BTreeSet::new();
        let mut per_class_state = BTreeMap::new();
        let mut transitions = Vec::new();

        for observation in &normalized.observations {
            let class = observation.class;
            let Some(channel) = self.channels.get_mut(&class) else {
                continue;
            };

            let smoothed = channel.window.push(observation.present);

            if let Some(kind) = channel.debouncer.step(smoothed) {
                match kind {
                    TransitionKind::Raised => {
                        self.ledger.record_episode_start(class);
                        engine_metrics::record_alert_raised(class);
                        debug!(
                            frame = frame.index,
                            class = %class,
                            score = observation.score,
                            "Alert raised"
                        );
                    }
                    TransitionKind::Cleared => {
                        engine_metrics::record_alert_cleared(class);
                        debug!(frame = frame.index, class = %class, "Alert cleared");
                    }
                }
                transitions.push(AlertTransition { class, kind });
            }

            let state = channel.debouncer.state();
            if state.is_alert() {
                self.ledger.record_alert_frame(class);
                active_alerts.insert(class);
            }
            per_class_state.insert(class, state);
        }

        self.stats.frames_evaluated += 1;
        self.stats.evaluated_duration = self
            .stats
            .evaluated_duration
            .saturating_add(self.ledger.frame_interval());
        if !active_alerts.is_empty() {
            self.stats.frames_with_alerts += 1;
        }

        engine_metrics::record_frame(active_alerts.len(), started.elapsed().as_secs_f64());

        FrameResult {
            frame_index: frame.index,
            timestamp: frame.timestamp,
            active_alerts,
            per_class_state,
            transitions,
        }
    }

    /// Per-class alert totals for the current session.
    pub fn ledger_snapshot(&self) -> BTreeMap<ViolationClass, LedgerEntry> {
        self.ledger.snapshot()
    }

    /// Start a new session: clears the ledger, every window and every
    /// debouncer, and issues a new session ID.
    pub fn reset_session(&mut self) {
        let previous = std::mem::take(&mut self.stats);
        for channel in self.channels.values_mut() {
            channel.reset();
        }
        self.ledger.reset();
        self.last_frame = None;

        info!(
            previous_session = %previous.session_id,
            session_id = %self.stats.session_id,
            frames_evaluated = previous.frames_evaluated,
            "Session reset"
        );
    }

    pub fn session_stats(&self) -> SessionStats {
        self.stats.clone()
    }

    /// Current debounce state of a class, if configured.
    pub fn class_state(&self, class: ViolationClass) -> Option<DebounceState> {
        self.channels.get(&class).map(|c| c.debouncer.state())
    }

    /// Classes currently in alert.
    pub fn active_alerts(&self) -> BTreeSet<ViolationClass> {
        self.channels
            .iter()
            .filter(|(_, c)| c.debouncer.is_alert())
            .map(|(class, _)| *class)
            .collect()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
