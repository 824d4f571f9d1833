//! Broadcast dispatcher
//!
//! Fans user input out to the slots selected by a [`BroadcastScope`].
//! A failing slot is logged and skipped; the others still receive the input.

use crate::ports::dispatch::{DispatchError, SinkDispatch};
use futures::future::join_all;
use polyquorum_domain::{BroadcastScope, SlotId};
use std::sync::Arc;
use tracing::{debug, warn};

/// Which input action to deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery<'a> {
    Text(&'a str),
    Submit,
    NewTopic,
}

impl Delivery<'_> {
    fn as_str(&self) -> &'static str {
        match self {
            Delivery::Text(_) => "text",
            Delivery::Submit => "submit",
            Delivery::NewTopic => "new topic",
        }
    }
}

/// Delivers input to the slots picked by the broadcast scope
#[derive(Clone)]
pub struct BroadcastDispatcher {
    sink: Arc<dyn SinkDispatch>,
}

impl BroadcastDispatcher {
    pub fn new(sink: Arc<dyn SinkDispatch>) -> Self {
        Self { sink }
    }

    /// Type `text` into every targeted input. Returns the slots that accepted it.
    pub async fn broadcast_text(&self, scope: &BroadcastScope, text: &str) -> Vec<SlotId> {
        self.broadcast(scope, Delivery::Text(text)).await
    }

    /// Press submit in every targeted slot
    pub async fn broadcast_submit(&self, scope: &BroadcastScope) -> Vec<SlotId> {
        self.broadcast(scope, Delivery::Submit).await
    }

    /// Start a new conversation in every targeted slot
    pub async fn broadcast_new_topic(&self, scope: &BroadcastScope) -> Vec<SlotId> {
        self.broadcast(scope, Delivery::NewTopic).await
    }

    /// Type `text` into one slot, ignoring the broadcast scope
    pub async fn deliver_text_to(&self, slot: SlotId, text: &str) -> bool {
        self.deliver_logged(slot, Delivery::Text(text)).await
    }

    /// Press submit in one slot, ignoring the broadcast scope
    pub async fn deliver_submit_to(&self, slot: SlotId) -> bool {
        self.deliver_logged(slot, Delivery::Submit).await
    }

    async fn broadcast(&self, scope: &BroadcastScope, delivery: Delivery<'_>) -> Vec<SlotId> {
        let targets = scope.targets();
        debug!("Broadcasting {} to {:?}", delivery.as_str(), targets);

        let results = join_all(
            targets
                .iter()
                .map(|slot| self.deliver_logged(*slot, delivery)),
        )
        .await;

        targets
            .into_iter()
            .zip(results)
            .filter_map(|(slot, delivered)| delivered.then_some(slot))
            .collect()
    }

    async fn deliver_logged(&self, slot: SlotId, delivery: Delivery<'_>) -> bool {
        match self.deliver(slot, delivery).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Skipping {} for {}: {}", delivery.as_str(), slot, e);
                false
            }
        }
    }

    async fn deliver(&self, slot: SlotId, delivery: Delivery<'_>) -> Result<(), DispatchError> {
        match delivery {
            Delivery::Text(text) => self.sink.deliver_text(slot, text).await,
            Delivery::Submit => self.sink.deliver_submit(slot).await,
            Delivery::NewTopic => self.sink.deliver_new_topic(slot).await,
        }
    }
}
