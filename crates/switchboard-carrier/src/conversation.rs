// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Proactive conversations started outside a webhook.

use std::collections::HashMap;
use std::future::Future;

use tracing::debug;

use switchboard_core::{
    apply_conversation_reference, Activity, ChannelAccount, ConversationAccount,
    ConversationReference, Provider, SwitchboardError,
};

use crate::carrier::Carrier;
use crate::context::{TurnContext, TurnSource};

pub const CONTINUE_CONVERSATION_EVENT: &str = "continueConversation";
pub const CREATE_CONVERSATION_EVENT: &str = "createConversation";

impl Carrier {
    /// Resumes the conversation described by `reference`.
    ///
    /// A synthetic `continueConversation` event runs through the registered
    /// turn handlers first, then `logic` gets the same context. Errors go to
    /// the turn-error hook when one is installed.
    pub async fn continue_conversation<F, Fut>(
        &self,
        reference: &ConversationReference,
        logic: F,
    ) -> Result<(), SwitchboardError>
    where
        F: FnOnce(TurnContext) -> Fut,
        Fut: Future<Output = Result<(), SwitchboardError>>,
    {
        let ctx = self.internal_context(CONTINUE_CONVERSATION_EVENT, reference)?;
        debug!(turn = %ctx.id(), provider = %ctx.provider(), "continuing conversation");

        let outcome = match self.run_pipeline(&ctx).await {
            Ok(_) => logic(ctx.clone()).await,
            Err(err) => Err(err),
        };
        match outcome {
            Ok(()) => Ok(()),
            Err(err) => self.contain_turn_error(&ctx, err).await,
        }
    }

    /// Starts a new conversation and runs `logic` against it.
    ///
    /// `reference.service_url` must be set; no turn handlers run.
    pub async fn create_conversation<F, Fut>(
        &self,
        reference: &ConversationReference,
        logic: F,
    ) -> Result<(), SwitchboardError>
    where
        F: FnOnce(TurnContext) -> Fut,
        Fut: Future<Output = Result<(), SwitchboardError>>,
    {
        if reference.service_url.as_deref().is_none_or(str::is_empty) {
            return Err(SwitchboardError::Validation(
                "create_conversation requires a serviceUrl".to_string(),
            ));
        }

        let ctx = self.internal_context(CREATE_CONVERSATION_EVENT, reference)?;
        debug!(turn = %ctx.id(), provider = %ctx.provider(), "creating conversation");

        match logic(ctx.clone()).await {
            Ok(()) => Ok(()),
            Err(err) => self.contain_turn_error(&ctx, err).await,
        }
    }

    /// Opens an SMS conversation from `from` (one of our numbers) to `to`.
    pub async fn create_sms_conversation<F, Fut>(
        &self,
        provider: Provider,
        from: &str,
        to: &str,
        logic: F,
    ) -> Result<(), SwitchboardError>
    where
        F: FnOnce(TurnContext) -> Fut,
        Fut: Future<Output = Result<(), SwitchboardError>>,
    {
        let config = self.provider(provider)?;
        let reference = ConversationReference {
            activity_id: None,
            user: Some(ChannelAccount::new(to)),
            bot: Some(ChannelAccount::new(from)),
            conversation: Some(ConversationAccount::new(config.account_sid.clone())),
            channel_id: Some(provider.to_string()),
            service_url: Some(config.service_url.clone()),
        };
        self.create_conversation(&reference, logic).await
    }

    fn internal_context(
        &self,
        event: &str,
        reference: &ConversationReference,
    ) -> Result<TurnContext, SwitchboardError> {
        let provider: Provider = reference
            .channel_id
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|_| {
                SwitchboardError::UnsupportedProvider(
                    reference.channel_id.clone().unwrap_or_default(),
                )
            })?;
        let activity = apply_conversation_reference(Activity::event(event), reference, true);
        Ok(TurnContext::new(
            self.clone(),
            activity,
            provider,
            TurnSource::Internal,
            HashMap::new(),
        ))
    }
}
