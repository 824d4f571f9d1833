//! In-memory surface adapter
//!
//! [`ScriptedSurface`] stands in for the four rendered agent panes. Tests and
//! the scenario player mutate pane state directly; the engine reads it through
//! [`ObservationPort`] and writes to it through [`SinkDispatch`].
//!
//! Selectors are honoured the way a real surface would: a provider with no
//! response selector can never be located, and a provider with no busy-marker
//! selector never reports itself busy.

use async_trait::async_trait;
use polyquorum_application::{DispatchError, Extraction, ObservationPort, SinkDispatch, TargetHandle};
use polyquorum_domain::{SelectorConfig, SlotId};
use std::collections::HashMap;
use std::sync::Mutex;

/// Rendered state of one pane
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaneState {
    pub text: String,
    pub busy: bool,
}

/// Something the engine did to a pane's input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceAction {
    Typed { slot: SlotId, text: String },
    Submitted { slot: SlotId, text: String },
    NewTopic { slot: SlotId },
}

impl SurfaceAction {
    pub fn slot(&self) -> SlotId {
        match self {
            SurfaceAction::Typed { slot, .. }
            | SurfaceAction::Submitted { slot, .. }
            | SurfaceAction::NewTopic { slot } => *slot,
        }
    }
}

#[derive(Debug, Default)]
struct SurfaceState {
    panes: HashMap<SlotId, PaneState>,
    inputs: HashMap<SlotId, String>,
    actions: Vec<SurfaceAction>,
}

/// Four in-memory panes with input boxes
#[derive(Debug, Default)]
pub struct ScriptedSurface {
    state: Mutex<SurfaceState>,
}

impl ScriptedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `text` as the latest response of `slot`
    pub fn render(&self, slot: SlotId, text: impl Into<String>, busy: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.panes.insert(
                slot,
                PaneState {
                    text: text.into(),
                    busy,
                },
            );
        }
    }

    /// Remove the response element of `slot`
    pub fn hide(&self, slot: SlotId) {
        if let Ok(mut state) = self.state.lock() {
            state.panes.remove(&slot);
        }
    }

    pub fn pane(&self, slot: SlotId) -> Option<PaneState> {
        self.state.lock().ok()?.panes.get(&slot).cloned()
    }

    /// Current contents of the input box of `slot`
    pub fn input(&self, slot: SlotId) -> String {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.inputs.get(&slot).cloned())
            .unwrap_or_default()
    }

    /// Everything delivered so far, in order
    pub fn actions(&self) -> Vec<SurfaceAction> {
        self.state
            .lock()
            .map(|state| state.actions.clone())
            .unwrap_or_default()
    }

    /// Texts submitted in `slot`, in order
    pub fn submissions(&self, slot: SlotId) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                SurfaceAction::Submitted { slot: s, text } if s == slot => Some(text),
                _ => None,
            })
            .collect()
    }

    fn with_state<T>(
        &self,
        slot: SlotId,
        f: impl FnOnce(&mut SurfaceState) -> T,
    ) -> Result<T, DispatchError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DispatchError::Unavailable(slot))?;
        Ok(f(&mut state))
    }
}

impl ObservationPort for ScriptedSurface {
    fn locate_target(&self, slot: SlotId, selectors: &SelectorConfig) -> Option<TargetHandle> {
        let selector = selectors.response.first()?;
        let state = self.state.lock().ok()?;
        state
            .panes
            .contains_key(&slot)
            .then(|| TargetHandle::new(slot, selector.clone()))
    }

    fn extract_text(&self, target: &TargetHandle) -> Option<Extraction> {
        let state = self.state.lock().ok()?;
        let pane = state.panes.get(&target.slot)?;
        Some(Extraction {
            text: pane.text.clone(),
            raw_markup: format!("<div class=\"response\">{}</div>", pane.text),
            selector_id: Some(target.id.clone()),
        })
    }

    fn is_busy_marker_present(&self, target: &TargetHandle, selectors: &SelectorConfig) -> bool {
        if selectors.busy_marker.is_empty() {
            return false;
        }
        self.state
            .lock()
            .ok()
            .and_then(|state| state.panes.get(&target.slot).map(|pane| pane.busy))
            .unwrap_or(false)
    }
}

#[async_trait]
impl SinkDispatch for ScriptedSurface {
    async fn deliver_text(&self, slot: SlotId, text: &str) -> Result<(), DispatchError> {
        self.with_state(slot, |state| {
            state.inputs.insert(slot, text.to_string());
            state.actions.push(SurfaceAction::Typed {
                slot,
                text: text.to_string(),
            });
        })
    }

    async fn deliver_submit(&self, slot: SlotId) -> Result<(), DispatchError> {
        self.with_state(slot, |state| {
            let text = state.inputs.remove(&slot).unwrap_or_default();
            state.actions.push(SurfaceAction::Submitted { slot, text });
        })
    }

    async fn deliver_new_topic(&self, slot: SlotId) -> Result<(), DispatchError> {
        self.with_state(slot, |state| {
            state.panes.remove(&slot);
            state.inputs.remove(&slot);
            state.actions.push(SurfaceAction::NewTopic { slot });
        })
    }
}
