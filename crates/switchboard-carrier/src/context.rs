// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-turn context handed to every handler.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use uuid::Uuid;

use switchboard_core::{
    apply_conversation_reference, get_conversation_reference, Activity, ActivityType,
    ConversationReference, Provider, ResourceResponse, SwitchboardError,
};

use crate::carrier::Carrier;
use crate::events::{Emission, Topic};

/// Where a turn came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnSource {
    /// An authenticated carrier webhook.
    Webhook,
    /// Synthesized by the carrier for a proactive conversation.
    Internal,
}

/// Cheap handle to the state of one turn.
///
/// The activity is fixed once the context is built. Handlers share data
/// through [`TurnContext::set_state`]; nothing outlives the turn.
#[derive(Clone)]
pub struct TurnContext {
    inner: Arc<Inner>,
}

struct Inner {
    id: Uuid,
    activity: Activity,
    provider: Provider,
    source: TurnSource,
    query: HashMap<String, String>,
    responded: AtomicBool,
    turn_state: Mutex<HashMap<String, Value>>,
    carrier: Carrier,
}

impl TurnContext {
    pub(crate) fn new(
        carrier: Carrier,
        activity: Activity,
        provider: Provider,
        source: TurnSource,
        query: HashMap<String, String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                activity,
                provider,
                source,
                query,
                responded: AtomicBool::new(false),
                turn_state: Mutex::new(HashMap::new()),
                carrier,
            }),
        }
    }

    /// Context with no configured carriers, for exercising handlers directly.
    #[cfg(test)]
    pub(crate) fn detached(activity: Activity) -> Self {
        let carrier = Carrier::new(
            Arc::new(crate::provider::ProviderTable::new()),
            crate::carrier::CarrierOptions::default(),
        )
        .expect("carrier");
        Self::new(
            carrier,
            activity,
            Provider::Twilio,
            TurnSource::Internal,
            HashMap::new(),
        )
    }

    /// Unique id for log correlation.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn activity(&self) -> &Activity {
        &self.inner.activity
    }

    pub fn provider(&self) -> Provider {
        self.inner.provider
    }

    pub fn source(&self) -> TurnSource {
        self.inner.source
    }

    pub fn carrier(&self) -> &Carrier {
        &self.inner.carrier
    }

    /// Raw webhook query parameter. Empty for internal turns.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.inner.query.get(name).map(String::as_str)
    }

    /// Carrier-internal routing hint, e.g. `callback_dial`.
    pub fn subtype(&self) -> Option<&str> {
        self.query_param("subtype")
    }

    /// True once a batch containing a non-trace activity was delivered.
    pub fn responded(&self) -> bool {
        self.inner.responded.load(Ordering::SeqCst)
    }

    pub fn conversation_reference(&self) -> ConversationReference {
        get_conversation_reference(&self.inner.activity)
    }

    /// Stores `value` under `key` for later handlers in this turn.
    pub fn set_state(&self, key: impl Into<String>, value: Value) {
        self.state().insert(key.into(), value);
    }

    pub fn state_value(&self, key: &str) -> Option<Value> {
        self.state().get(key).cloned()
    }

    pub fn remove_state(&self, key: &str) -> Option<Value> {
        self.state().remove(key)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.inner.turn_state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replies with a plain text message.
    pub async fn send_text(
        &self,
        text: impl Into<String>,
    ) -> Result<Option<ResourceResponse>, SwitchboardError> {
        self.send_activity(Activity::message(text)).await
    }

    pub async fn send_activity(
        &self,
        activity: Activity,
    ) -> Result<Option<ResourceResponse>, SwitchboardError> {
        let mut responses = self.send_activities(vec![activity]).await?;
        Ok(if responses.is_empty() {
            None
        } else {
            Some(responses.swap_remove(0))
        })
    }

    /// Addresses `activities` as replies to this turn and sends them.
    ///
    /// The batch passes through `ContextSendActivities` handlers, which may
    /// rewrite or withhold it, before reaching the carrier. `responded` is
    /// set once the carrier accepts a batch with a non-trace activity.
    pub async fn send_activities(
        &self,
        activities: Vec<Activity>,
    ) -> Result<Vec<ResourceResponse>, SwitchboardError> {
        let reference = self.conversation_reference();
        let outgoing: Vec<Activity> = activities
            .into_iter()
            .map(|activity| apply_conversation_reference(activity, &reference, false))
            .collect();
        let has_non_trace = outgoing
            .iter()
            .any(|a| a.activity_type != ActivityType::Trace);

        let ctx = self.clone();
        let emission = Emission::new(Topic::ContextSendActivities, self.clone(), outgoing).then(
            move |batch: Vec<Activity>| async move {
                let responses = ctx
                    .carrier()
                    .send_activities(ctx.provider(), batch)
                    .await?;
                if has_non_trace {
                    ctx.inner.responded.store(true, Ordering::SeqCst);
                }
                Ok(Some(responses))
            },
        );

        let responses = self.carrier().send_events().emit(emission).await?;
        Ok(responses.unwrap_or_default())
    }
}

impl fmt::Debug for TurnContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnContext")
            .field("id", &self.inner.id)
            .field("provider", &self.inner.provider)
            .field("source", &self.inner.source)
            .field("activity_type", &self.inner.activity.activity_type)
            .field("activity_id", &self.inner.activity.id)
            .field("responded", &self.responded())
            .finish()
    }
}
