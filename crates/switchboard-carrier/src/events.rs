// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered, chainable event dispatch ("onion" middleware).
//!
//! Handlers registered on a [`Topic`] run in registration order. Each one
//! receives a [`Next`] that runs the rest of the chain and then the
//! emission's final continuation. A handler that drops its `Next` without
//! running it halts the chain.
//!
//! Return values follow chain position: a handler's own `Some` value wins
//! over anything further down the chain, otherwise the value produced
//! downstream (even if the handler ignored it) becomes the handler's result.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};

use futures::future::BoxFuture;

use switchboard_core::SwitchboardError;

use crate::context::TurnContext;

/// A named dispatch point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Fired first for every turn.
    Turn,
    Message,
    Call,
    MessageStatus,
    CallStatus,
    UnrecognizedActivityType,
    /// Fired after the type topic when nothing non-trace was sent.
    Dialog,
    /// Fired for every outbound batch sent through a turn context.
    ContextSendActivities,
    /// Application-defined topic.
    Custom(String),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Turn => f.write_str("Turn"),
            Topic::Message => f.write_str("Message"),
            Topic::Call => f.write_str("Call"),
            Topic::MessageStatus => f.write_str("MessageStatus"),
            Topic::CallStatus => f.write_str("CallStatus"),
            Topic::UnrecognizedActivityType => f.write_str("UnrecognizedActivityType"),
            Topic::Dialog => f.write_str("Dialog"),
            Topic::ContextSendActivities => f.write_str("ContextSendActivities"),
            Topic::Custom(name) => f.write_str(name),
        }
    }
}

/// Outcome of a handler, a chain, or a whole emission.
pub type DispatchResult<V> = Result<Option<V>, SwitchboardError>;

pub type DispatchFuture<V> = BoxFuture<'static, DispatchResult<V>>;

/// A registered handler.
pub type Handler<A, V> = Arc<dyn Fn(TurnContext, A, Next<A, V>) -> DispatchFuture<V> + Send + Sync>;

/// Runs after the last handler calls through.
pub type FinalContinuation<A, V> = Box<dyn FnOnce(A) -> DispatchFuture<V> + Send>;

/// Handle to the remainder of the chain, passed to every handler.
///
/// Consumed by [`Next::run`], so the rest of the chain runs at most once.
pub struct Next<A, V> {
    handlers: Arc<[Handler<A, V>]>,
    index: usize,
    context: TurnContext,
    last: Option<FinalContinuation<A, V>>,
    downstream: Arc<Mutex<Option<V>>>,
}

impl<A, V> Next<A, V>
where
    A: Send + 'static,
    V: Clone + Send + 'static,
{
    /// Runs the remaining handlers and the final continuation with `args`.
    pub async fn run(self, args: A) -> DispatchResult<V> {
        let Next {
            handlers,
            index,
            context,
            last,
            downstream,
        } = self;

        let value = run_chain(handlers, index, context, args, last).await?;
        if let Some(v) = &value {
            *downstream.lock().unwrap_or_else(|e| e.into_inner()) = Some(v.clone());
        }
        Ok(value)
    }
}

impl<V> Next<(), V>
where
    V: Clone + Send + 'static,
{
    /// [`Next::run`] for topics without arguments.
    pub async fn call(self) -> DispatchResult<V> {
        self.run(()).await
    }
}

impl<A, V> fmt::Debug for Next<A, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("remaining", &self.handlers.len().saturating_sub(self.index))
            .field("has_final", &self.last.is_some())
            .finish()
    }
}

fn run_chain<A, V>(
    handlers: Arc<[Handler<A, V>]>,
    index: usize,
    context: TurnContext,
    args: A,
    last: Option<FinalContinuation<A, V>>,
) -> DispatchFuture<V>
where
    A: Send + 'static,
    V: Clone + Send + 'static,
{
    Box::pin(async move {
        let Some(handler) = handlers.get(index).cloned() else {
            return match last {
                Some(finish) => finish(args).await,
                None => Ok(None),
            };
        };

        let downstream = Arc::new(Mutex::new(None));
        let next = Next {
            handlers,
            index: index + 1,
            context: context.clone(),
            last,
            downstream: Arc::clone(&downstream),
        };

        let own = handler(context, args, next).await?;
        Ok(own.or_else(|| downstream.lock().unwrap_or_else(|e| e.into_inner()).take()))
    })
}

/// One emission: the topic, its context, arguments, and optional final continuation.
pub struct Emission<A, V> {
    pub topic: Topic,
    pub context: TurnContext,
    pub args: A,
    pub final_continuation: Option<FinalContinuation<A, V>>,
}

impl<A, V> Emission<A, V> {
    pub fn new(topic: Topic, context: TurnContext, args: A) -> Self {
        Self {
            topic,
            context,
            args,
            final_continuation: None,
        }
    }

    /// Sets the continuation invoked after the last handler calls through.
    pub fn then<F, Fut>(mut self, finish: F) -> Self
    where
        A: 'static,
        V: 'static,
        F: FnOnce(A) -> Fut + Send + 'static,
        Fut: Future<Output = DispatchResult<V>> + Send + 'static,
    {
        self.final_continuation = Some(Box::new(move |args| -> DispatchFuture<V> {
            Box::pin(finish(args))
        }));
        self
    }
}

impl<V> Emission<(), V> {
    /// Emission without arguments.
    pub fn bare(topic: Topic, context: TurnContext) -> Self {
        Self::new(topic, context, ())
    }
}

/// Topic-keyed handler registry.
///
/// Registration may happen at any time; an emission works on a snapshot of
/// the handler list taken when it starts.
pub struct EventDispatcher<A, V> {
    handlers: RwLock<HashMap<Topic, Arc<[Handler<A, V>]>>>,
}

impl<A, V> Default for EventDispatcher<A, V> {
    fn default() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }
}

impl<A, V> EventDispatcher<A, V>
where
    A: Send + 'static,
    V: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to `topic`. Registration order is execution order.
    pub fn on<F, Fut>(&self, topic: Topic, handler: F)
    where
        F: Fn(TurnContext, A, Next<A, V>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<V>> + Send + 'static,
    {
        let wrapped: Handler<A, V> = Arc::new(move |ctx, args, next| -> DispatchFuture<V> {
            Box::pin(handler(ctx, args, next))
        });
        let mut table = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        let mut chain: Vec<Handler<A, V>> = table
            .get(&topic)
            .map(|existing| existing.to_vec())
            .unwrap_or_default();
        chain.push(wrapped);
        table.insert(topic, chain.into());
    }

    pub fn handler_count(&self, topic: &Topic) -> usize {
        let table = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        table.get(topic).map_or(0, |chain| chain.len())
    }

    /// Runs the handlers for `emission.topic` and returns the resolved value.
    ///
    /// With no handlers registered, the final continuation runs directly.
    pub async fn emit(&self, emission: Emission<A, V>) -> DispatchResult<V> {
        let Emission {
            topic,
            context,
            args,
            final_continuation,
        } = emission;

        let handlers = {
            let table = self.handlers.read().unwrap_or_else(|e| e.into_inner());
            table.get(&topic).cloned()
        }
        .unwrap_or_else(|| Arc::from(Vec::new()));

        tracing::trace!(topic = %topic, handlers = handlers.len(), "emit");
        run_chain(handlers, 0, context, args, final_continuation).await
    }
}

impl<A, V> fmt::Debug for EventDispatcher<A, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        let mut counts: Vec<(String, usize)> = table
            .iter()
            .map(|(topic, chain)| (topic.to_string(), chain.len()))
            .collect();
        counts.sort();
        f.debug_struct("EventDispatcher").field("topics", &counts).finish()
    }
}
