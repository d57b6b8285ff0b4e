// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn orchestration for inbound carrier webhooks.
//!
//! [`Carrier::invoke_activity`] drives one webhook from raw request to
//! written response: decode, authenticate, normalize, dispatch, respond.
//! The empty XML envelope is written exactly once on every path; failures
//! are reported to the caller only after that write.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, error, info};

use switchboard_auth::{authenticate, parse_provider, CallbackRequest};
use switchboard_config::SwitchboardConfig;
use switchboard_core::{
    Activity, ActivityType, MessageStatus, Provider, ResourceResponse, SwitchboardError,
};

use crate::client::{CarrierApiClient, DEFAULT_TIMEOUT};
use crate::context::{TurnContext, TurnSource};
use crate::events::{DispatchResult, Emission, EventDispatcher, Next, Topic};
use crate::normalize::{decode_body, default_account_sid, normalize, parse_webhook_kind};
use crate::provider::{ProviderConfig, ProviderTable};

/// Body written for every webhook, whatever the outcome.
pub const EMPTY_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#;

pub const RESPONSE_CONTENT_TYPE: &str = "text/xml";

/// Where the orchestrator writes the webhook response.
pub trait ResponseSink: Send {
    fn end(&mut self, status: u16, content_type: &'static str, body: &'static str);
}

/// A [`ResponseSink`] that keeps what was written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferedResponse {
    status: Option<u16>,
    content_type: Option<&'static str>,
    body: String,
    writes: usize,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn content_type(&self) -> Option<&'static str> {
        self.content_type
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Number of times `end` was called.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ResponseSink for BufferedResponse {
    fn end(&mut self, status: u16, content_type: &'static str, body: &'static str) {
        self.status = Some(status);
        self.content_type = Some(content_type);
        self.body = body.to_string();
        self.writes += 1;
    }
}

/// The parts of an inbound HTTP request the orchestrator reads.
#[derive(Clone, Default)]
pub struct WebhookRequest {
    pub query: HashMap<String, String>,
    pub content_type: Option<String>,
    /// `X-Twilio-Signature`, when present.
    pub signature: Option<String>,
    pub body: Vec<u8>,
}

impl WebhookRequest {
    pub fn new(
        query: HashMap<String, String>,
        content_type: Option<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            query,
            content_type,
            signature: None,
            body: body.into(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

impl fmt::Debug for WebhookRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query: Vec<(&str, &str)> = self
            .query
            .iter()
            .map(|(k, v)| {
                let shown = if k == "callback_token" { "[redacted]" } else { v.as_str() };
                (k.as_str(), shown)
            })
            .collect();
        f.debug_struct("WebhookRequest")
            .field("query", &query)
            .field("content_type", &self.content_type)
            .field("signature", &self.signature.as_ref().map(|_| "[present]"))
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Runs when dispatch fails; its success turns the failure into a 200.
pub type TurnErrorHandler =
    Arc<dyn Fn(TurnContext, SwitchboardError) -> BoxFuture<'static, Result<(), SwitchboardError>> + Send + Sync>;

/// Turn-topic dispatcher: no arguments, JSON values.
pub type TurnEvents = EventDispatcher<(), Value>;

/// Outbound interception dispatcher: the batch is the argument.
pub type SendEvents = EventDispatcher<Vec<Activity>, Vec<ResourceResponse>>;

#[derive(Debug, Clone)]
pub struct CarrierOptions {
    /// Guard around each outbound HTTP attempt.
    pub timeout: Duration,
}

impl Default for CarrierOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CarrierOptions {
    pub fn from_config(config: &SwitchboardConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.outbound.timeout_secs),
        }
    }
}

/// The carrier adapter. Cheap to clone; clones share handlers and providers.
#[derive(Clone)]
pub struct Carrier {
    inner: Arc<CarrierInner>,
}

struct CarrierInner {
    providers: Arc<ProviderTable>,
    client: CarrierApiClient,
    turn_events: TurnEvents,
    send_events: SendEvents,
    on_turn_error: RwLock<Option<TurnErrorHandler>>,
}

impl Carrier {
    pub fn new(providers: Arc<ProviderTable>, options: CarrierOptions) -> Result<Self, SwitchboardError> {
        Ok(Self {
            inner: Arc::new(CarrierInner {
                providers,
                client: CarrierApiClient::new(options.timeout)?,
                turn_events: TurnEvents::new(),
                send_events: SendEvents::new(),
                on_turn_error: RwLock::new(None),
            }),
        })
    }

    /// Builds the provider table and client from loaded configuration.
    pub fn from_config(config: &SwitchboardConfig) -> Result<Self, SwitchboardError> {
        let providers = ProviderTable::from_config(config)?;
        Self::new(Arc::new(providers), CarrierOptions::from_config(config))
    }

    pub fn providers(&self) -> &ProviderTable {
        &self.inner.providers
    }

    pub fn provider(&self, provider: Provider) -> Result<Arc<ProviderConfig>, SwitchboardError> {
        self.inner.providers.get(provider)
    }

    pub fn client(&self) -> &CarrierApiClient {
        &self.inner.client
    }

    pub(crate) fn send_events(&self) -> &SendEvents {
        &self.inner.send_events
    }

    // --- registration ---

    /// Appends a handler to any turn topic, including custom ones.
    pub fn on<F, Fut>(&self, topic: Topic, handler: F)
    where
        F: Fn(TurnContext, Next<(), Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<Value>> + Send + 'static,
    {
        self.inner
            .turn_events
            .on(topic, move |ctx, (), next| handler(ctx, next));
    }

    /// Fired first for every turn.
    pub fn on_turn<F, Fut>(&self, handler: F)
    where
        F: Fn(TurnContext, Next<(), Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<Value>> + Send + 'static,
    {
        self.on(Topic::Turn, handler);
    }

    pub fn on_message<F, Fut>(&self, handler: F)
    where
        F: Fn(TurnContext, Next<(), Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<Value>> + Send + 'static,
    {
        self.on(Topic::Message, handler);
    }

    pub fn on_call<F, Fut>(&self, handler: F)
    where
        F: Fn(TurnContext, Next<(), Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<Value>> + Send + 'static,
    {
        self.on(Topic::Call, handler);
    }

    /// Handlers receive the delivery status read from the callback payload.
    pub fn on_message_status<F, Fut>(&self, handler: F)
    where
        F: Fn(TurnContext, Option<MessageStatus>, Next<(), Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<Value>> + Send + 'static,
    {
        self.on(Topic::MessageStatus, move |ctx, next| {
            let status = ctx.activity().message_status();
            handler(ctx, status, next)
        });
    }

    pub fn on_call_status<F, Fut>(&self, handler: F)
    where
        F: Fn(TurnContext, Next<(), Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<Value>> + Send + 'static,
    {
        self.on(Topic::CallStatus, handler);
    }

    pub fn on_unrecognized_activity_type<F, Fut>(&self, handler: F)
    where
        F: Fn(TurnContext, Next<(), Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<Value>> + Send + 'static,
    {
        self.on(Topic::UnrecognizedActivityType, handler);
    }

    /// Fired after the type topic when the turn has not responded yet.
    pub fn on_dialog<F, Fut>(&self, handler: F)
    where
        F: Fn(TurnContext, Next<(), Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<Value>> + Send + 'static,
    {
        self.on(Topic::Dialog, handler);
    }

    /// Intercepts every batch sent through a turn context. Handlers may
    /// rewrite the batch before `next.run`, or veto it by not calling it.
    pub fn on_context_send_activities<F, Fut>(&self, handler: F)
    where
        F: Fn(TurnContext, Vec<Activity>, Next<Vec<Activity>, Vec<ResourceResponse>>) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = DispatchResult<Vec<ResourceResponse>>> + Send + 'static,
    {
        self.inner
            .send_events
            .on(Topic::ContextSendActivities, handler);
    }

    /// Emits an application-defined topic on `ctx`.
    pub async fn emit(&self, topic: Topic, ctx: TurnContext) -> DispatchResult<Value> {
        self.inner.turn_events.emit(Emission::bare(topic, ctx)).await
    }

    pub fn handler_count(&self, topic: &Topic) -> usize {
        match topic {
            Topic::ContextSendActivities => self.inner.send_events.handler_count(topic),
            _ => self.inner.turn_events.handler_count(topic),
        }
    }

    /// Installs the hook that receives errors raised during dispatch.
    pub fn set_on_turn_error<F, Fut>(&self, handler: F)
    where
        F: Fn(TurnContext, SwitchboardError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), SwitchboardError>> + Send + 'static,
    {
        let hook: TurnErrorHandler = Arc::new(move |ctx, err| -> BoxFuture<'static, _> {
            Box::pin(handler(ctx, err))
        });
        *self
            .inner
            .on_turn_error
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(hook);
    }

    pub fn clear_on_turn_error(&self) {
        *self
            .inner
            .on_turn_error
            .write()
            .unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn turn_error_handler(&self) -> Option<TurnErrorHandler> {
        self.inner
            .on_turn_error
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    // --- inbound turn ---

    /// Processes one carrier webhook and writes the response to `sink`.
    ///
    /// The sink always receives the empty XML envelope with the turn's
    /// status. Outcomes of 400 and above are then returned as
    /// [`SwitchboardError::TurnFailed`].
    pub async fn invoke_activity(
        &self,
        request: WebhookRequest,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), SwitchboardError> {
        let outcome = self.process_webhook(&request).await;
        let status = match &outcome {
            Ok(()) => 200,
            Err(err) => err.status_code(),
        };

        sink.end(status, RESPONSE_CONTENT_TYPE, EMPTY_RESPONSE);

        match outcome {
            Ok(()) => Ok(()),
            Err(err) => {
                error!(status, error = %err, "carrier turn failed");
                Err(SwitchboardError::turn_failed(status, err))
            }
        }
    }

    async fn process_webhook(&self, request: &WebhookRequest) -> Result<(), SwitchboardError> {
        let mut body = decode_body(request.content_type.as_deref(), &request.body)?;

        let provider_param = request.param("provider");
        let config = parse_provider(provider_param)
            .ok()
            .and_then(|provider| self.inner.providers.get(provider).ok());
        if let Some(config) = &config {
            default_account_sid(&mut body, config.provider, &config.account_sid);
        }

        let account_sid = body
            .get("AccountSid")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let provider = parse_provider(provider_param)?;
        let config = match config {
            Some(config) => config,
            None => self.inner.providers.get(provider)?,
        };
        authenticate(
            &CallbackRequest {
                provider: provider_param,
                callback_token: request.param("callback_token"),
                account_sid: &account_sid,
                signature: request.signature.as_deref(),
            },
            config.inbound_credentials.as_ref(),
        )
        .await?;

        let kind = parse_webhook_kind(request.param("type"))?;
        let activity = normalize(provider, kind, body, &config.service_url);

        info!(
            provider = %provider,
            activity_type = %activity.activity_type,
            activity_id = activity.id.as_deref().unwrap_or_default(),
            "carrier webhook authenticated"
        );

        let ctx = TurnContext::new(
            self.clone(),
            activity,
            provider,
            TurnSource::Webhook,
            request.query.clone(),
        );
        self.run_turn(&ctx).await
    }

    /// Dispatches `ctx` and routes any failure through the turn-error hook.
    pub(crate) async fn run_turn(&self, ctx: &TurnContext) -> Result<(), SwitchboardError> {
        match self.run_pipeline(ctx).await {
            Ok(_) => Ok(()),
            Err(err) => self.contain_turn_error(ctx, err).await,
        }
    }

    /// Hands `err` to the turn-error hook, or wraps it as an unhandled turn error.
    pub(crate) async fn contain_turn_error(
        &self,
        ctx: &TurnContext,
        err: SwitchboardError,
    ) -> Result<(), SwitchboardError> {
        match self.turn_error_handler() {
            Some(hook) => {
                debug!(turn = %ctx.id(), error = %err, "routing error to turn error handler");
                hook(ctx.clone(), err).await.map_err(SwitchboardError::turn)
            }
            None => Err(SwitchboardError::turn(err)),
        }
    }

    /// `Turn`, then the activity's type topic, then `Dialog` if nothing
    /// non-trace was sent. Each stage is the final continuation of the one
    /// before, so a handler that does not call through stops the pipeline.
    pub(crate) async fn run_pipeline(&self, ctx: &TurnContext) -> DispatchResult<Value> {
        let carrier = self.clone();
        let turn_ctx = ctx.clone();
        let emission = Emission::bare(Topic::Turn, ctx.clone())
            .then(move |()| async move { carrier.dispatch_activity(turn_ctx).await });
        self.inner.turn_events.emit(emission).await
    }

    async fn dispatch_activity(&self, ctx: TurnContext) -> DispatchResult<Value> {
        let topic = topic_for(&ctx.activity().activity_type);
        let carrier = self.clone();
        let dialog_ctx = ctx.clone();
        let emission = Emission::bare(topic, ctx)
            .then(move |()| async move { carrier.run_dialog(dialog_ctx).await });
        self.inner.turn_events.emit(emission).await
    }

    async fn run_dialog(&self, ctx: TurnContext) -> DispatchResult<Value> {
        if ctx.responded() {
            return Ok(None);
        }
        debug!(turn = %ctx.id(), "no reply sent, running dialog handlers");
        self.inner
            .turn_events
            .emit(Emission::bare(Topic::Dialog, ctx))
            .await
    }
}

impl fmt::Debug for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Carrier")
            .field("providers", &self.inner.providers.configured())
            .field("turn_events", &self.inner.turn_events)
            .field("send_events", &self.inner.send_events)
            .field("has_turn_error_handler", &self.turn_error_handler().is_some())
            .finish()
    }
}

/// Type topic fired after `Turn`.
pub fn topic_for(activity_type: &ActivityType) -> Topic {
    match activity_type {
        ActivityType::Message => Topic::Message,
        ActivityType::Call => Topic::Call,
        ActivityType::MessageStatus => Topic::MessageStatus,
        ActivityType::CallStatus => Topic::CallStatus,
        ActivityType::Trace
        | ActivityType::Event
        | ActivityType::Delay
        | ActivityType::Unrecognized(_) => Topic::UnrecognizedActivityType,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_types_select_topics() {
        assert_eq!(topic_for(&ActivityType::Message), Topic::Message);
        assert_eq!(topic_for(&ActivityType::Call), Topic::Call);
        assert_eq!(topic_for(&ActivityType::MessageStatus), Topic::MessageStatus);
        assert_eq!(topic_for(&ActivityType::CallStatus), Topic::CallStatus);
        assert_eq!(topic_for(&ActivityType::Event), Topic::UnrecognizedActivityType);
        assert_eq!(
            topic_for(&ActivityType::Unrecognized("fax".into())),
            Topic::UnrecognizedActivityType
        );
    }

    #[test]
    fn buffered_response_counts_writes() {
        let mut sink = BufferedResponse::new();
        assert_eq!(sink.status(), None);
        sink.end(401, RESPONSE_CONTENT_TYPE, EMPTY_RESPONSE);
        assert_eq!(sink.status(), Some(401));
        assert_eq!(sink.body(), EMPTY_RESPONSE);
        assert_eq!(sink.content_type(), Some("text/xml"));
        assert_eq!(sink.writes(), 1);
    }

    #[test]
    fn webhook_request_debug_hides_callback_token() {
        let query = HashMap::from([
            ("provider".to_string(), "twilio".to_string()),
            ("callback_token".to_string(), "s3cret".to_string()),
        ]);
        let request = WebhookRequest::new(query, None, b"{}".to_vec()).with_signature("sig");
        let debug = format!("{request:?}");
        assert!(debug.contains("twilio"));
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("\"sig\""));
    }

    #[tokio::test]
    async fn unconfigured_carrier_rejects_every_webhook() {
        let carrier = Carrier::new(Arc::new(ProviderTable::new()), CarrierOptions::default()).unwrap();
        let query = HashMap::from([
            ("provider".to_string(), "twilio".to_string()),
            ("type".to_string(), "message".to_string()),
            ("callback_token".to_string(), "anything".to_string()),
        ]);
        let mut sink = BufferedResponse::new();
        let err = carrier
            .invoke_activity(WebhookRequest::new(query, None, br#"{"AccountSid":"AC1"}"#.to_vec()), &mut sink)
            .await
            .unwrap_err();

        assert_eq!(sink.status(), Some(401));
        assert_eq!(sink.writes(), 1);
        assert!(matches!(err, SwitchboardError::TurnFailed { status: 401, .. }));
    }

    #[tokio::test]
    async fn undecodable_body_is_bad_request() {
        let carrier = Carrier::new(Arc::new(ProviderTable::new()), CarrierOptions::default()).unwrap();
        let mut sink = BufferedResponse::new();
        let err = carrier
            .invoke_activity(
                WebhookRequest::new(HashMap::new(), Some("application/json".into()), b"not json".to_vec()),
                &mut sink,
            )
            .await
            .unwrap_err();
        assert_eq!(sink.status(), Some(400));
        assert_eq!(err.status_code(), 400);
    }
}
