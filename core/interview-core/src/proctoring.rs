//! Proctoring session: detectors + violation log + escalation.
//!
//! Owns the only violation counter. Every signal raised by a detector,
//! including several raised by one event, is applied to that counter in
//! order, so nothing is lost when two detectors fire in the same turn.
//!
//! Persistence is best effort: a failed write is logged and the in-memory
//! count stays authoritative.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::ProctoringConfig;
use crate::monitors::{DetectorKind, DetectorSignal, MonitorSet, PageEvent, PageState};
use crate::store::{InterviewStore, SessionStore, StoredInterview};
use crate::violations::{ViolationKind, ViolationLog, ViolationOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProctorEffect {
    ShowFullscreenPrompt,
    ExitFullscreen,
    BlockUnload,
    ViolationWarning {
        kind: ViolationKind,
        count: u32,
        limit: u32,
    },
    LimitExceeded {
        kind: ViolationKind,
        count: u32,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProctorReport {
    pub effects: Vec<ProctorEffect>,
    /// Set once, by the violation that pushed the count past the limit.
    pub limit_exceeded: bool,
}

pub struct ProctoringSession {
    monitors: MonitorSet,
    log: ViolationLog,
    page: PageState,
    active: bool,
}

impl ProctoringSession {
    pub fn new(config: &ProctoringConfig) -> Self {
        Self::with_monitors(config, MonitorSet::standard(config))
    }

    pub fn with_monitors(config: &ProctoringConfig, monitors: MonitorSet) -> Self {
        Self {
            monitors,
            log: ViolationLog::new(config.violation_limit),
            page: PageState::default(),
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn violation_count(&self) -> u32 {
        self.log.count()
    }

    pub fn violation_log(&self) -> &ViolationLog {
        &self.log
    }

    pub fn page(&self) -> &PageState {
        &self.page
    }

    pub fn monitors(&self) -> &MonitorSet {
        &self.monitors
    }

    /// Resets the count, starts every detector, and persists the fresh state.
    pub fn activate<S: SessionStore>(
        &mut self,
        store: &mut InterviewStore<S>,
        now: DateTime<Utc>,
    ) -> ProctorReport {
        self.log.reset();
        self.begin(store, now)
    }

    /// Restarts detectors for a session recovered after a reload. The count
    /// carries over because it is still the same session.
    pub fn resume<S: SessionStore>(
        &mut self,
        violation_count: u32,
        store: &mut InterviewStore<S>,
        now: DateTime<Utc>,
    ) -> ProctorReport {
        self.log.restore(violation_count);
        self.begin(store, now)
    }

    fn begin<S: SessionStore>(
        &mut self,
        store: &mut InterviewStore<S>,
        now: DateTime<Utc>,
    ) -> ProctorReport {
        let signals = self.monitors.start_all(&self.page, now);
        self.active = true;
        persist(
            store,
            StoredInterview {
                is_proctoring_active: Some(true),
                violation_count: Some(self.log.count()),
                ..Default::default()
            },
            now,
        );
        info!(
            violation_count = self.log.count(),
            limit = self.log.limit(),
            "Proctoring activated"
        );

        self.apply_signals(signals, store, now)
    }

    /// Stops every detector and persists the inactive flag. A second call is a no-op.
    pub fn deactivate<S: SessionStore>(
        &mut self,
        store: &mut InterviewStore<S>,
        now: DateTime<Utc>,
    ) -> Vec<ProctorEffect> {
        if !self.active {
            return Vec::new();
        }

        self.monitors.stop_all();
        self.active = false;
        persist(
            store,
            StoredInterview {
                is_proctoring_active: Some(false),
                ..Default::default()
            },
            now,
        );
        info!(violation_count = self.log.count(), "Proctoring deactivated");

        if self.page.fullscreen {
            vec![ProctorEffect::ExitFullscreen]
        } else {
            Vec::new()
        }
    }

    /// Updates page state and routes the event through the detectors.
    ///
    /// Page state is tracked even while inactive so `deactivate` knows
    /// whether fullscreen is still engaged.
    pub fn handle_event<S: SessionStore>(
        &mut self,
        event: &PageEvent,
        store: &mut InterviewStore<S>,
        now: DateTime<Utc>,
    ) -> ProctorReport {
        self.page.apply(event);
        if !self.active {
            return ProctorReport::default();
        }

        let signals = self.monitors.dispatch(event, &self.page, now);
        self.apply_signals(signals, store, now)
    }

    pub fn record_violation<S: SessionStore>(
        &mut self,
        kind: ViolationKind,
        store: &mut InterviewStore<S>,
        now: DateTime<Utc>,
    ) -> ViolationOutcome {
        if !self.active {
            debug!(kind = ?kind, "Violation ignored, proctoring inactive");
            return ViolationOutcome::Ignored;
        }

        let outcome = self.log.record(kind, now);
        match outcome {
            ViolationOutcome::Warning { count, limit } => {
                persist_count(store, count, now);
                info!(
                    kind = ?kind,
                    count,
                    limit,
                    remaining = self.log.remaining(),
                    "Proctoring violation: {}",
                    kind.label()
                );
            }
            ViolationOutcome::LimitExceeded { count } => {
                persist_count(store, count, now);
                warn!(
                    kind = ?kind,
                    count,
                    limit = self.log.limit(),
                    "Final proctoring violation: {}. The interview will now end",
                    kind.label()
                );
            }
            ViolationOutcome::Ignored => {
                debug!(kind = ?kind, "Violation ignored, limit already exceeded");
            }
        }
        outcome
    }

    fn apply_signals<S: SessionStore>(
        &mut self,
        signals: Vec<(DetectorKind, DetectorSignal)>,
        store: &mut InterviewStore<S>,
        now: DateTime<Utc>,
    ) -> ProctorReport {
        let mut report = ProctorReport::default();

        for (detector, signal) in signals {
            if report.limit_exceeded {
                debug!(detector = ?detector, signal = ?signal, "Signal dropped after escalation");
                continue;
            }

            match signal {
                DetectorSignal::Violation(kind) => match self.record_violation(kind, store, now) {
                    ViolationOutcome::Warning { count, limit } => {
                        report
                            .effects
                            .push(ProctorEffect::ViolationWarning { kind, count, limit });
                    }
                    ViolationOutcome::LimitExceeded { count } => {
                        report
                            .effects
                            .push(ProctorEffect::LimitExceeded { kind, count });
                        report.limit_exceeded = true;
                    }
                    ViolationOutcome::Ignored => {}
                },
                DetectorSignal::PromptFullscreen => {
                    push_unique(&mut report.effects, ProctorEffect::ShowFullscreenPrompt)
                }
                DetectorSignal::BlockUnload => {
                    push_unique(&mut report.effects, ProctorEffect::BlockUnload)
                }
            }
        }

        report
    }
}

fn push_unique(effects: &mut Vec<ProctorEffect>, effect: ProctorEffect) {
    if !effects.contains(&effect) {
        effects.push(effect);
    }
}

fn persist_count<S: SessionStore>(store: &mut InterviewStore<S>, count: u32, now: DateTime<Utc>) {
    persist(
        store,
        StoredInterview {
            violation_count: Some(count),
            is_proctoring_active: Some(true),
            ..Default::default()
        },
        now,
    );
}

fn persist<S: SessionStore>(
    store: &mut InterviewStore<S>,
    patch: StoredInterview,
    now: DateTime<Utc>,
) {
    if let Err(err) = store.merge(&patch, now) {
        warn!(error = %err, "Failed to persist proctoring snapshot");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitors::WindowGeometry;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn setup() -> (ProctoringSession, InterviewStore<MemoryStore>) {
        let config = ProctoringConfig::default();
        let mut session = ProctoringSession::new(&config);
        let mut store = InterviewStore::new(MemoryStore::new(), "interview_data");
        let now = Utc::now();
        session.handle_event(
            &PageEvent::Resize {
                geometry: WindowGeometry::maximized(1920, 1080),
            },
            &mut store,
            now,
        );
        session.handle_event(
            &PageEvent::FullscreenChange { fullscreen: true },
            &mut store,
            now,
        );
        (session, store)
    }

    fn stored(store: &InterviewStore<MemoryStore>) -> serde_json::Value {
        store.backend().get("interview_data").cloned().unwrap()
    }

    #[test]
    fn test_activate_resets_and_persists() {
        let (mut session, mut store) = setup();
        let report = session.activate(&mut store, Utc::now());
        assert!(report.effects.is_empty());
        assert!(session.is_active());
        assert_eq!(session.violation_count(), 0);
        assert_eq!(stored(&store)["isProctoringActive"], json!(true));
        assert_eq!(stored(&store)["violationCount"], json!(0));
    }

    #[test]
    fn test_activate_outside_fullscreen_prompts() {
        let config = ProctoringConfig::default();
        let mut session = ProctoringSession::new(&config);
        let mut store = InterviewStore::new(MemoryStore::new(), "k");
        let report = session.activate(&mut store, Utc::now());
        assert_eq!(report.effects, vec![ProctorEffect::ShowFullscreenPrompt]);
    }

    #[test]
    fn test_each_event_counts_once() {
        let (mut session, mut store) = setup();
        let now = Utc::now();
        session.activate(&mut store, now);

        let report = session.handle_event(&PageEvent::Copy, &mut store, now);
        assert_eq!(
            report.effects,
            vec![ProctorEffect::ViolationWarning {
                kind: ViolationKind::ClipboardCopy,
                count: 1,
                limit: 3
            }]
        );
        session.handle_event(&PageEvent::Paste, &mut store, now);
        assert_eq!(session.violation_count(), 2);
        assert_eq!(stored(&store)["violationCount"], json!(2));
    }

    #[test]
    fn test_same_turn_signals_share_one_counter() {
        let (mut session, mut store) = setup();
        let now = Utc::now();
        session.activate(&mut store, now);
        session.handle_event(
            &PageEvent::FullscreenChange { fullscreen: false },
            &mut store,
            now,
        );
        assert_eq!(session.violation_count(), 1);

        // One resize trips both the shrink check and the screen heuristic.
        let report = session.handle_event(
            &PageEvent::Resize {
                geometry: WindowGeometry {
                    avail_width: 3840,
                    inner_width: 1000,
                    outer_width: 1000,
                    outer_height: 500,
                    inner_height: 450,
                    ..WindowGeometry::maximized(1920, 1080)
                },
            },
            &mut store,
            now,
        );
        assert_eq!(session.violation_count(), 3);
        let counts: Vec<u32> = report
            .effects
            .iter()
            .filter_map(|effect| match effect {
                ProctorEffect::ViolationWarning { count, .. } => Some(*count),
                _ => None,
            })
            .collect();
        assert_eq!(counts, vec![2, 3]);
    }

    #[test]
    fn test_escalation_drops_trailing_signals() {
        let (mut session, mut store) = setup();
        let now = Utc::now();
        session.activate(&mut store, now);
        for _ in 0..3 {
            session.handle_event(&PageEvent::Copy, &mut store, now);
        }
        session.handle_event(
            &PageEvent::FullscreenChange { fullscreen: false },
            &mut store,
            now,
        );
        // Fullscreen exit was the 4th violation; its prompt signal is dropped.
        assert_eq!(session.violation_count(), 4);
        assert_eq!(stored(&store)["violationCount"], json!(4));
    }

    #[test]
    fn test_limit_exceeded_reported_once() {
        let (mut session, mut store) = setup();
        let now = Utc::now();
        session.activate(&mut store, now);
        let mut exceeded = 0;
        for _ in 0..6 {
            if session
                .handle_event(&PageEvent::Paste, &mut store, now)
                .limit_exceeded
            {
                exceeded += 1;
            }
        }
        assert_eq!(exceeded, 1);
        assert_eq!(session.violation_count(), 4);
    }

    #[test]
    fn test_deactivate_stops_counting_and_is_idempotent() {
        let (mut session, mut store) = setup();
        let now = Utc::now();
        session.activate(&mut store, now);

        assert_eq!(
            session.deactivate(&mut store, now),
            vec![ProctorEffect::ExitFullscreen]
        );
        assert_eq!(stored(&store)["isProctoringActive"], json!(false));
        assert!(session.deactivate(&mut store, now).is_empty());
        assert_eq!(session.monitors().hub().listener_count(), 0);

        for event in [
            PageEvent::Copy,
            PageEvent::Paste,
            PageEvent::VisibilityChange { hidden: true },
            PageEvent::FullscreenChange { fullscreen: false },
            PageEvent::BeforeUnload,
        ] {
            let report = session.handle_event(&event, &mut store, now);
            assert!(report.effects.is_empty());
        }
        assert_eq!(session.violation_count(), 0);
    }

    #[test]
    fn test_deactivate_outside_fullscreen_has_no_effect() {
        let (mut session, mut store) = setup();
        let now = Utc::now();
        session.activate(&mut store, now);
        session.handle_event(
            &PageEvent::FullscreenChange { fullscreen: false },
            &mut store,
            now,
        );
        assert!(session.deactivate(&mut store, now).is_empty());
    }

    #[test]
    fn test_unload_blocks_without_counting() {
        let (mut session, mut store) = setup();
        let now = Utc::now();
        session.activate(&mut store, now);
        let report = session.handle_event(&PageEvent::BeforeUnload, &mut store, now);
        assert_eq!(report.effects, vec![ProctorEffect::BlockUnload]);
        assert_eq!(session.violation_count(), 0);
    }

    #[test]
    fn test_resume_keeps_count() {
        let (mut session, mut store) = setup();
        let now = Utc::now();
        session.resume(3, &mut store, now);
        assert_eq!(session.violation_count(), 3);
        assert_eq!(stored(&store)["violationCount"], json!(3));

        let report = session.handle_event(&PageEvent::Copy, &mut store, now);
        assert!(report.limit_exceeded);
    }

    #[test]
    fn test_persistence_failure_keeps_memory_count() {
        let (mut session, mut store) = setup();
        let now = Utc::now();
        session.activate(&mut store, now);
        store.backend_mut().set_reject_writes(true);

        session.handle_event(&PageEvent::Copy, &mut store, now);
        session.handle_event(&PageEvent::Copy, &mut store, now);
        assert_eq!(session.violation_count(), 2);
        assert_eq!(stored(&store)["violationCount"], json!(0));
    }
}
