//! Quorum engine
//!
//! Owns every [`SourceMonitor`] and the [`MergeCoordinator`] and drives them
//! from a single event loop. Input arrives through an [`EngineHandle`];
//! timers requested by the state machines become `tokio::time::sleep` tasks
//! that post back into the loop and are aborted when cancelled.
//!
//! Because all state lives on one task, no locking is needed and events for
//! a cycle are always processed in arrival order.

use crate::config::{EngineConfig, SelectorCatalog};
use crate::ports::dispatch::SinkDispatch;
use crate::ports::journal::{CycleEvent, CycleJournal, NoCycleJournal};
use crate::ports::observation::ObservationPort;
use crate::ports::status::{NoStatus, StatusObserver};
use crate::use_cases::dispatcher::BroadcastDispatcher;
use crate::use_cases::source_monitor::SourceMonitor;
use polyquorum_domain::{
    BroadcastScope, CoordinatorEvent, DetectorEvent, DomainError, MergeCoordinator, MergeTimeout,
    Provider, Question, SlotId, SlotLayout, SynthesisRequest, TimerCommand, TimerToken,
};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Capacity of the input channel
const INBOX_CAPACITY: usize = 256;

/// Errors surfaced to engine clients
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Engine is not running")]
    Closed,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Input to the engine loop
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The surface of a slot changed; sample it
    SurfaceChanged(SlotId),
    /// Live input typed by the user
    TypeText(String),
    /// The user submitted a question
    Submit(Question),
    /// Start a new conversation everywhere
    NewTopic,
    /// Manual merge trigger
    Merge,
    SetSink(SlotId),
    SetAggregation(bool),
    SetAutoMerge(bool),
    SetTimeout(MergeTimeout),
    ToggleSupersize(SlotId),
    ChangeProvider { slot: SlotId, provider: Provider },
    ResetCycle,
    Shutdown,
}

/// State machine a timer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerOwner {
    Source(SlotId),
    Coordinator,
}

#[derive(Debug)]
struct FiredTimer {
    owner: TimerOwner,
    token: TimerToken,
}

/// A synthesis request handed to the sink
#[derive(Debug, Clone)]
pub struct MergeRecord {
    pub sink: SlotId,
    pub request: SynthesisRequest,
    /// Whether the sink's submit was triggered afterwards
    pub submitted: bool,
}

/// Summary returned when the engine stops
#[derive(Debug, Clone, Default)]
pub struct EngineReport {
    pub cycles: usize,
    pub merges: Vec<MergeRecord>,
}

/// Cloneable sender side of the engine
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineEvent>,
}

impl EngineHandle {
    pub async fn send(&self, event: EngineEvent) -> Result<(), EngineError> {
        self.tx.send(event).await.map_err(|_| EngineError::Closed)
    }

    pub async fn surface_changed(&self, slot: SlotId) -> Result<(), EngineError> {
        self.send(EngineEvent::SurfaceChanged(slot)).await
    }

    pub async fn type_text(&self, text: impl Into<String>) -> Result<(), EngineError> {
        self.send(EngineEvent::TypeText(text.into())).await
    }

    /// Submit a question; blank questions are rejected before reaching the loop
    pub async fn submit(&self, question: impl Into<String>) -> Result<(), EngineError> {
        let question = Question::try_new(question)?;
        self.send(EngineEvent::Submit(question)).await
    }

    pub async fn new_topic(&self) -> Result<(), EngineError> {
        self.send(EngineEvent::NewTopic).await
    }

    pub async fn merge(&self) -> Result<(), EngineError> {
        self.send(EngineEvent::Merge).await
    }

    pub async fn set_sink(&self, slot: SlotId) -> Result<(), EngineError> {
        self.send(EngineEvent::SetSink(slot)).await
    }

    pub async fn set_aggregation(&self, enabled: bool) -> Result<(), EngineError> {
        self.send(EngineEvent::SetAggregation(enabled)).await
    }

    pub async fn set_auto_merge(&self, enabled: bool) -> Result<(), EngineError> {
        self.send(EngineEvent::SetAutoMerge(enabled)).await
    }

    pub async fn set_timeout(&self, timeout: MergeTimeout) -> Result<(), EngineError> {
        self.send(EngineEvent::SetTimeout(timeout)).await
    }

    pub async fn toggle_supersize(&self, slot: SlotId) -> Result<(), EngineError> {
        self.send(EngineEvent::ToggleSupersize(slot)).await
    }

    pub async fn change_provider(&self, slot: SlotId, provider: Provider) -> Result<(), EngineError> {
        self.send(EngineEvent::ChangeProvider { slot, provider })
            .await
    }

    pub async fn reset_cycle(&self) -> Result<(), EngineError> {
        self.send(EngineEvent::ResetCycle).await
    }

    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.send(EngineEvent::Shutdown).await
    }
}

/// The event loop tying detectors, coordinator, and dispatch together
pub struct QuorumEngine {
    observation: Arc<dyn ObservationPort>,
    dispatcher: BroadcastDispatcher,
    status: Arc<dyn StatusObserver>,
    journal: Arc<dyn CycleJournal>,

    layout: SlotLayout,
    selectors: SelectorCatalog,
    scope: BroadcastScope,
    monitors: BTreeMap<SlotId, SourceMonitor>,
    coordinator: MergeCoordinator,

    inbox: mpsc::Receiver<EngineEvent>,
    timer_tx: mpsc::UnboundedSender<FiredTimer>,
    timer_rx: mpsc::UnboundedReceiver<FiredTimer>,
    armed: HashMap<(TimerOwner, TimerToken), AbortHandle>,

    report: EngineReport,
}

impl QuorumEngine {
    /// Build an engine and the handle that feeds it
    pub fn new(
        config: EngineConfig,
        observation: Arc<dyn ObservationPort>,
        dispatch: Arc<dyn SinkDispatch>,
    ) -> (Self, EngineHandle) {
        let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();

        let monitors = config
            .layout
            .iter()
            .map(|(slot, provider)| {
                let monitor = SourceMonitor::new(
                    slot,
                    provider.clone(),
                    config.selectors.selectors_for(provider),
                    config.timings,
                );
                (slot, monitor)
            })
            .collect();

        let scope = BroadcastScope {
            supersized: None,
            aggregation_enabled: config.merge.aggregation_enabled,
            sink: config.merge.sink,
        };

        let engine = Self {
            observation,
            dispatcher: BroadcastDispatcher::new(dispatch),
            status: Arc::new(NoStatus),
            journal: Arc::new(NoCycleJournal),
            layout: config.layout,
            selectors: config.selectors,
            scope,
            monitors,
            coordinator: MergeCoordinator::new(config.merge),
            inbox,
            timer_tx,
            timer_rx,
            armed: HashMap::new(),
            report: EngineReport::default(),
        };
        (engine, EngineHandle { tx })
    }

    pub fn with_status(mut self, status: Arc<dyn StatusObserver>) -> Self {
        self.status = status;
        self
    }

    pub fn with_journal(mut self, journal: Arc<dyn CycleJournal>) -> Self {
        self.journal = journal;
        self
    }

    /// Run until shutdown, cancellation, or every handle is dropped
    pub async fn run(mut self, cancellation: CancellationToken) -> EngineReport {
        info!(
            "Quorum engine started (aggregation: {}, sink: {}, timeout: {})",
            self.coordinator.settings().aggregation_enabled,
            self.coordinator.settings().sink,
            self.coordinator.settings().timeout
        );

        loop {
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => {
                    debug!("Quorum engine cancelled");
                    break;
                }
                Some(fired) = self.timer_rx.recv() => {
                    self.on_timer_fired(fired).await;
                }
                event = self.inbox.recv() => {
                    match event {
                        Some(EngineEvent::Shutdown) | None => break,
                        Some(event) => self.handle_event(event).await,
                    }
                }
            }
        }

        for (_, timer) in self.armed.drain() {
            timer.abort();
        }
        info!(
            "Quorum engine stopped after {} cycle(s), {} merge(s)",
            self.report.cycles,
            self.report.merges.len()
        );
        self.report
    }

    // ==================== Input ====================

    async fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::SurfaceChanged(slot) => {
                let observation = Arc::clone(&self.observation);
                let Some(monitor) = self.monitors.get_mut(&slot) else {
                    return;
                };
                let events = monitor.observe(observation.as_ref());
                self.sync_source_timers(slot);
                self.handle_source_events(slot, events).await;
            }
            EngineEvent::TypeText(text) => {
                self.dispatcher.broadcast_text(&self.scope, &text).await;
            }
            EngineEvent::Submit(question) => self.submit(question).await,
            EngineEvent::NewTopic => {
                info!("Starting a new topic");
                self.reset_cycle().await;
                let targets = self.dispatcher.broadcast_new_topic(&self.scope).await;
                self.journal.record(CycleEvent::new(
                    "new_topic",
                    json!({ "targets": slot_names(&targets) }),
                ));
            }
            EngineEvent::Merge => {
                let events = self.coordinator.merge();
                if events.is_empty() {
                    info!("Manual merge requested but nothing to merge");
                }
                self.sync_coordinator_timers();
                self.handle_coordinator_events(events).await;
            }
            EngineEvent::SetSink(sink) => {
                info!("Sink moved to {}", sink);
                self.scope.sink = sink;
                let events = self.coordinator.set_sink(sink);
                self.journal.record(CycleEvent::new(
                    "sink_changed",
                    json!({ "sink": sink.as_str() }),
                ));
                self.handle_coordinator_events(events).await;
            }
            EngineEvent::SetAggregation(enabled) => {
                info!("Aggregation {}", if enabled { "enabled" } else { "disabled" });
                self.scope.aggregation_enabled = enabled;
                self.coordinator.set_aggregation(enabled);
            }
            EngineEvent::SetAutoMerge(enabled) => {
                debug!("Auto-merge set to {}", enabled);
                self.coordinator.set_auto_merge(enabled);
            }
            EngineEvent::SetTimeout(timeout) => {
                debug!("Merge timeout set to {}", timeout);
                self.coordinator.set_timeout(timeout);
            }
            EngineEvent::ToggleSupersize(slot) => match self.scope.toggle_supersize(slot) {
                Some(slot) => info!("Supersized {}", slot),
                None => info!("Restored grid layout"),
            },
            EngineEvent::ChangeProvider { slot, provider } => {
                let selectors = self.selectors.selectors_for(&provider);
                let previous = self.layout.swap(slot, provider.clone());
                info!("{}: {} -> {}", slot, previous, provider);
                let observation = Arc::clone(&self.observation);
                if let Some(monitor) = self.monitors.get_mut(&slot) {
                    monitor.swap_provider(provider, selectors, observation.as_ref());
                }
                self.sync_source_timers(slot);
            }
            EngineEvent::ResetCycle => self.reset_cycle().await,
            EngineEvent::Shutdown => {}
        }
    }

    async fn submit(&mut self, question: Question) {
        self.report.cycles += 1;
        info!(
            "Cycle {}: question submitted ({} chars)",
            self.report.cycles,
            question.content().chars().count()
        );

        // Detectors must be reset before any observation of the new cycle
        self.reset_sources();
        let events = self.coordinator.on_submit(question.content());
        self.sync_coordinator_timers();
        self.handle_coordinator_events(events).await;

        let targets = self.dispatcher.broadcast_submit(&self.scope).await;
        self.journal.record(CycleEvent::new(
            "submit",
            json!({
                "cycle": self.report.cycles,
                "question": question.content(),
                "targets": slot_names(&targets),
                "aggregation": self.coordinator.settings().aggregation_enabled,
            }),
        ));
    }

    /// Cancel every timer and clear all per-cycle state
    async fn reset_cycle(&mut self) {
        debug!("Resetting cycle");
        self.reset_sources();
        let events = self.coordinator.reset();
        self.sync_coordinator_timers();
        self.handle_coordinator_events(events).await;
    }

    fn reset_sources(&mut self) {
        let observation = Arc::clone(&self.observation);
        let slots: Vec<SlotId> = self.monitors.keys().copied().collect();
        for slot in slots {
            if let Some(monitor) = self.monitors.get_mut(&slot) {
                monitor.reset(observation.as_ref());
            }
            self.sync_source_timers(slot);
        }
    }

    // ==================== Timers ====================

    async fn on_timer_fired(&mut self, fired: FiredTimer) {
        let FiredTimer { owner, token } = fired;
        if self.armed.remove(&(owner, token)).is_none() {
            trace!("Discarding stale {} timer for {:?}", token.purpose, owner);
            return;
        }
        trace!("{} timer fired for {:?}", token.purpose, owner);

        match owner {
            TimerOwner::Source(slot) => {
                let observation = Arc::clone(&self.observation);
                let Some(monitor) = self.monitors.get_mut(&slot) else {
                    return;
                };
                let events = monitor.on_timer(token, observation.as_ref());
                self.sync_source_timers(slot);
                self.handle_source_events(slot, events).await;
            }
            TimerOwner::Coordinator => {
                let events = self.coordinator.on_timer(token);
                self.sync_coordinator_timers();
                self.handle_coordinator_events(events).await;
            }
        }
    }

    fn sync_source_timers(&mut self, slot: SlotId) {
        let commands = match self.monitors.get_mut(&slot) {
            Some(monitor) => monitor.take_timer_commands(),
            None => return,
        };
        self.apply_timer_commands(TimerOwner::Source(slot), commands);
    }

    fn sync_coordinator_timers(&mut self) {
        let commands = self.coordinator.take_timer_commands();
        self.apply_timer_commands(TimerOwner::Coordinator, commands);
    }

    fn apply_timer_commands(&mut self, owner: TimerOwner, commands: Vec<TimerCommand>) {
        for command in commands {
            match command {
                TimerCommand::Arm { token, after } => {
                    let tx = self.timer_tx.clone();
                    let task = tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = tx.send(FiredTimer { owner, token });
                    });
                    self.armed.insert((owner, token), task.abort_handle());
                }
                TimerCommand::Cancel(token) => {
                    if let Some(timer) = self.armed.remove(&(owner, token)) {
                        timer.abort();
                    }
                }
            }
        }
    }

    // ==================== State machine output ====================

    async fn handle_source_events(&mut self, slot: SlotId, events: Vec<DetectorEvent>) {
        for event in events {
            match event {
                DetectorEvent::Update { text, busy } => {
                    self.status.on_source_update(slot, &text, busy);
                }
                DetectorEvent::StreamStarted => debug!("{}: streaming", slot),
                DetectorEvent::StreamEnded => debug!("{}: stream ended, settling", slot),
                DetectorEvent::Complete(response) => {
                    let provider = self.layout.provider(slot).clone();
                    info!(
                        "{} ({}) completed: {} chars",
                        slot,
                        provider,
                        response.char_count()
                    );
                    self.status.on_source_complete(slot, &provider, &response);
                    self.journal.record(CycleEvent::new(
                        "source_complete",
                        json!({
                            "slot": slot.as_str(),
                            "provider": provider.as_str(),
                            "chars": response.char_count(),
                            "text": response.text,
                        }),
                    ));

                    let events = self.coordinator.on_complete(slot, provider, response);
                    self.sync_coordinator_timers();
                    self.handle_coordinator_events(events).await;
                }
                DetectorEvent::RescanDue => {}
            }
        }
    }

    async fn handle_coordinator_events(&mut self, events: Vec<CoordinatorEvent>) {
        for event in events {
            match event {
                CoordinatorEvent::Status { completed, total } => {
                    debug!("Status: {}/{}", completed, total);
                    self.status.on_status(completed, total);
                }
                CoordinatorEvent::ReadyForManualMerge => {
                    info!("All sources completed; waiting for manual merge");
                    self.status.on_ready_for_manual_merge();
                    self.journal.record(CycleEvent::new(
                        "ready_for_manual_merge",
                        json!({ "completed": self.coordinator.completed_count() }),
                    ));
                }
                CoordinatorEvent::DeliverSynthesis { sink, request } => {
                    info!(
                        "Merging {} response(s) into {}",
                        request.window_count(),
                        sink
                    );
                    self.status.on_merge(sink, &request);
                    let prompt = request.render();
                    self.journal.record(CycleEvent::new(
                        "merge",
                        json!({
                            "sink": sink.as_str(),
                            "windows": request.contributions,
                            "prompt": prompt,
                        }),
                    ));
                    self.dispatcher.deliver_text_to(sink, &prompt).await;
                    self.report.merges.push(MergeRecord {
                        sink,
                        request,
                        submitted: false,
                    });
                }
                CoordinatorEvent::SubmitSink { sink } => {
                    let submitted = self.dispatcher.deliver_submit_to(sink).await;
                    if let Some(record) = self.report.merges.last_mut() {
                        record.submitted = submitted;
                    }
                    self.journal.record(CycleEvent::new(
                        "sink_submit",
                        json!({ "sink": sink.as_str(), "submitted": submitted }),
                    ));
                }
            }
        }
    }
}

fn slot_names(slots: &[SlotId]) -> Vec<&'static str> {
    slots.iter().map(|slot| slot.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::dispatch::DispatchError;
    use crate::ports::observation::{Extraction, TargetHandle};
    use async_trait::async_trait;
    use polyquorum_domain::{MergeSettings, Response, SelectorConfig};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::task::JoinHandle;

    /// In-memory grid of panes that both renders and accepts input
    #[derive(Default)]
    struct FakeGrid {
        panes: Mutex<HashMap<SlotId, (String, bool)>>,
        deliveries: Mutex<Vec<(SlotId, String)>>,
    }

    impl FakeGrid {
        fn show(&self, slot: SlotId, text: &str, busy: bool) {
            self.panes
                .lock()
                .unwrap()
                .insert(slot, (text.to_string(), busy));
        }

        fn delivered_to(&self, slot: SlotId) -> Vec<String> {
            self.deliveries
                .lock()
                .unwrap()
                .iter()
                .filter(|(s, _)| *s == slot)
                .map(|(_, what)| what.clone())
                .collect()
        }

        fn record(&self, slot: SlotId, what: String) -> Result<(), DispatchError> {
            self.deliveries.lock().unwrap().push((slot, what));
            Ok(())
        }
    }

    impl ObservationPort for FakeGrid {
        fn locate_target(&self, slot: SlotId, _selectors: &SelectorConfig) -> Option<TargetHandle> {
            self.panes
                .lock()
                .unwrap()
                .contains_key(&slot)
                .then(|| TargetHandle::new(slot, "last"))
        }

        fn extract_text(&self, target: &TargetHandle) -> Option<Extraction> {
            self.panes
                .lock()
                .unwrap()
                .get(&target.slot)
                .map(|(text, _)| Extraction::text(text.clone()))
        }

        fn is_busy_marker_present(&self, target: &TargetHandle, _selectors: &SelectorConfig) -> bool {
            self.panes
                .lock()
                .unwrap()
                .get(&target.slot)
                .is_some_and(|(_, busy)| *busy)
        }
    }

    #[async_trait]
    impl SinkDispatch for FakeGrid {
        async fn deliver_text(&self, slot: SlotId, text: &str) -> Result<(), DispatchError> {
            self.record(slot, format!("text:{}", text))
        }

        async fn deliver_submit(&self, slot: SlotId) -> Result<(), DispatchError> {
            self.record(slot, "submit".to_string())
        }

        async fn deliver_new_topic(&self, slot: SlotId) -> Result<(), DispatchError> {
            self.record(slot, "new_topic".to_string())
        }
    }

    #[derive(Default)]
    struct RecordingStatus {
        statuses: Mutex<Vec<(usize, usize)>>,
        ready: Mutex<usize>,
        completed: Mutex<Vec<SlotId>>,
    }

    impl StatusObserver for RecordingStatus {
        fn on_status(&self, completed: usize, total: usize) {
            self.statuses.lock().unwrap().push((completed, total));
        }

        fn on_ready_for_manual_merge(&self) {
            *self.ready.lock().unwrap() += 1;
        }

        fn on_source_complete(&self, slot: SlotId, _provider: &Provider, _response: &Response) {
            self.completed.lock().unwrap().push(slot);
        }
    }

    struct Harness {
        grid: Arc<FakeGrid>,
        status: Arc<RecordingStatus>,
        handle: EngineHandle,
        task: JoinHandle<EngineReport>,
    }

    impl Harness {
        fn start(settings: MergeSettings) -> Self {
            let grid = Arc::new(FakeGrid::default());
            let status = Arc::new(RecordingStatus::default());
            let (engine, handle) =
                QuorumEngine::new(EngineConfig::new(settings), grid.clone(), grid.clone());
            let engine = engine.with_status(status.clone());
            let task = tokio::spawn(engine.run(CancellationToken::new()));
            Self {
                grid,
                status,
                handle,
                task,
            }
        }

        /// Render a pane state, notify the engine, and let it settle briefly
        async fn show(&self, slot: SlotId, text: &str, busy: bool) {
            self.grid.show(slot, text, busy);
            self.handle.surface_changed(slot).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        /// Stream an answer with the busy marker, then clear it
        async fn answer(&self, slot: SlotId, text: &str) {
            self.show(slot, "", true).await;
            self.show(slot, text, true).await;
            self.show(slot, text, false).await;
        }

        async fn finish(self) -> (EngineReport, Arc<FakeGrid>, Arc<RecordingStatus>) {
            self.handle.shutdown().await.unwrap();
            let report = self.task.await.unwrap();
            (report, self.grid, self.status)
        }
    }

    fn aggregating() -> MergeSettings {
        MergeSettings::default().with_aggregation(true)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_quorum_merges_into_sink() {
        let h = Harness::start(
            aggregating().with_timeout(MergeTimeout::After(Duration::from_secs(300))),
        );
        h.handle.submit("Capital of France?").await.unwrap();
        h.answer(SlotId::TopLeft, "Paris").await;
        h.answer(SlotId::TopRight, "The capital is Paris").await;
        // No busy marker at all: completes through the grace window
        h.show(SlotId::BottomLeft, "Paris, France", false).await;
        tokio::time::sleep(Duration::from_secs(3)).await;

        let (report, grid, status) = h.finish().await;
        assert_eq!(report.merges.len(), 1);
        let merge = &report.merges[0];
        assert_eq!(merge.sink, SlotId::BottomRight);
        assert!(merge.submitted);

        let texts: Vec<&str> = merge
            .request
            .contributions
            .iter()
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Paris", "The capital is Paris", "Paris, France"]);

        let sink = grid.delivered_to(SlotId::BottomRight);
        assert_eq!(sink.len(), 2);
        assert!(sink[0].starts_with("text:Below are responses from 3 AI assistant windows"));
        assert!(sink[0].contains("Original question:\nCapital of France?\n"));
        assert_eq!(sink[1], "submit");

        let statuses = status.statuses.lock().unwrap().clone();
        assert_eq!(statuses.first(), Some(&(0, 3)));
        assert!(statuses.contains(&(3, 3)));
        assert_eq!(statuses.last(), Some(&(0, 3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_merges_partial_quorum() {
        let h = Harness::start(aggregating().with_timeout(MergeTimeout::After(Duration::from_secs(5))));
        h.handle.submit("q").await.unwrap();
        h.answer(SlotId::TopRight, "only me").await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        h.show(SlotId::TopLeft, "still thinking", true).await;

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(h.grid.delivered_to(SlotId::BottomRight).is_empty());

        tokio::time::sleep(Duration::from_secs(3)).await;
        let (report, _, _) = h.finish().await;
        assert_eq!(report.merges.len(), 1);
        let request = &report.merges[0].request;
        assert_eq!(request.window_count(), 1);
        assert_eq!(request.contributions[0].slot, SlotId::TopRight);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_mode_waits_for_trigger() {
        let h = Harness::start(aggregating().with_auto_merge(false));
        h.handle.submit("q").await.unwrap();
        for slot in [SlotId::TopLeft, SlotId::TopRight, SlotId::BottomLeft] {
            h.answer(slot, "answer").await;
        }
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(*h.status.ready.lock().unwrap(), 1);
        assert!(h.grid.delivered_to(SlotId::BottomRight).is_empty());

        h.handle.merge().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        let (report, grid, status) = h.finish().await;
        assert_eq!(report.merges.len(), 1);
        assert_eq!(report.merges[0].request.window_count(), 3);
        assert_eq!(grid.delivered_to(SlotId::BottomRight).len(), 2);
        assert_eq!(*status.ready.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubmit_discards_previous_cycle() {
        let h = Harness::start(aggregating());
        h.handle.submit("first").await.unwrap();
        h.answer(SlotId::TopLeft, "old answer").await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Top right stops streaming; its settle timer is still pending
        h.show(SlotId::TopRight, "stale", true).await;
        h.grid.show(SlotId::TopRight, "stale", false);
        h.handle.surface_changed(SlotId::TopRight).await.unwrap();
        h.handle.submit("second").await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(h.status.completed.lock().unwrap().clone(), vec![SlotId::TopLeft]);

        h.answer(SlotId::TopLeft, "new left").await;
        h.answer(SlotId::TopRight, "new right").await;
        h.answer(SlotId::BottomLeft, "new bottom").await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let (report, _, status) = h.finish().await;
        assert_eq!(report.cycles, 2);
        assert_eq!(report.merges.len(), 1);
        let request = &report.merges[0].request;
        assert_eq!(request.question, "second");
        let texts: Vec<&str> = request.contributions.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["new left", "new right", "new bottom"]);
        assert!(status.statuses.lock().unwrap().contains(&(0, 3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_skips_sink_when_aggregating() {
        let h = Harness::start(aggregating());
        h.handle.set_sink(SlotId::TopLeft).await.unwrap();
        h.handle.type_text("hello").await.unwrap();
        h.handle.submit("hello").await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let (_, grid, _) = h.finish().await;
        assert!(grid.delivered_to(SlotId::TopLeft).is_empty());
        for slot in [SlotId::TopRight, SlotId::BottomLeft, SlotId::BottomRight] {
            assert_eq!(grid.delivered_to(slot), vec!["text:hello", "submit"]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_aggregation_disabled_broadcasts_everywhere() {
        let h = Harness::start(MergeSettings::default());
        h.handle.submit("q").await.unwrap();
        for slot in [SlotId::TopLeft, SlotId::TopRight, SlotId::BottomLeft] {
            h.answer(slot, "a").await;
        }
        tokio::time::sleep(Duration::from_secs(5)).await;

        let (report, grid, status) = h.finish().await;
        assert!(report.merges.is_empty());
        assert_eq!(grid.delivered_to(SlotId::BottomRight), vec!["submit"]);
        assert_eq!(status.completed.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_supersized_slot_gets_input_alone() {
        let h = Harness::start(aggregating());
        h.handle.toggle_supersize(SlotId::TopRight).await.unwrap();
        h.handle.type_text("solo").await.unwrap();
        h.handle.toggle_supersize(SlotId::TopRight).await.unwrap();
        h.handle.type_text("grid").await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let (_, grid, _) = h.finish().await;
        assert_eq!(grid.delivered_to(SlotId::TopRight), vec!["text:solo", "text:grid"]);
        assert_eq!(grid.delivered_to(SlotId::TopLeft), vec!["text:grid"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_topic_resets_and_broadcasts() {
        let h = Harness::start(aggregating());
        h.handle.submit("q").await.unwrap();
        h.answer(SlotId::TopLeft, "a").await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        h.handle.new_topic().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let (report, grid, status) = h.finish().await;
        assert!(report.merges.is_empty());
        assert_eq!(
            grid.delivered_to(SlotId::TopLeft).last().map(String::as_str),
            Some("new_topic")
        );
        assert_eq!(status.statuses.lock().unwrap().last(), Some(&(0, 3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_provider_updates_merge_mapping() {
        let h = Harness::start(aggregating().with_timeout(MergeTimeout::After(Duration::from_secs(2))));
        h.handle
            .change_provider(SlotId::TopLeft, Provider::ChatGpt)
            .await
            .unwrap();
        h.handle.submit("q").await.unwrap();
        h.answer(SlotId::TopLeft, "from chatgpt").await;
        tokio::time::sleep(Duration::from_secs(3)).await;

        let (report, _, _) = h.finish().await;
        assert_eq!(report.merges[0].request.contributions[0].provider_name, "ChatGPT");
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let h = Harness::start(aggregating());
        assert!(matches!(
            h.handle.submit("   ").await,
            Err(EngineError::Domain(DomainError::InvalidQuestion(_)))
        ));
        let (report, _, _) = h.finish().await;
        assert_eq!(report.cycles, 0);
    }

    #[tokio::test]
    async fn test_cancellation_stops_loop() {
        let grid = Arc::new(FakeGrid::default());
        let (engine, handle) = QuorumEngine::new(EngineConfig::default(), grid.clone(), grid);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(engine.run(cancel.clone()));

        cancel.cancel();
        task.await.unwrap();
        assert!(matches!(handle.new_topic().await, Err(EngineError::Closed)));
    }

    #[tokio::test]
    async fn test_dropping_handles_stops_loop() {
        let grid = Arc::new(FakeGrid::default());
        let (engine, handle) = QuorumEngine::new(EngineConfig::default(), grid.clone(), grid);
        let task = tokio::spawn(engine.run(CancellationToken::new()));
        drop(handle);
        let report = task.await.unwrap();
        assert_eq!(report.cycles, 0);
    }
}
