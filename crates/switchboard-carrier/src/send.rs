// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery of activity batches.

use tracing::debug;

use switchboard_core::types::EMULATOR_CHANNEL;
use switchboard_core::{Activity, ActivityType, Provider, ResourceResponse, SwitchboardError};

use crate::carrier::Carrier;
use crate::client::OutboundMessage;

impl Carrier {
    /// Delivers `activities` in order through `provider`'s messaging API.
    ///
    /// Returns one response per input activity. `delay` entries pause the
    /// batch and trace entries outside the emulator channel are dropped;
    /// both yield an empty response. The first invalid activity or carrier
    /// error aborts the rest of the batch.
    pub async fn send_activities(
        &self,
        provider: Provider,
        activities: Vec<Activity>,
    ) -> Result<Vec<ResourceResponse>, SwitchboardError> {
        let mut responses = Vec::with_capacity(activities.len());

        for activity in &activities {
            if activity.activity_type == ActivityType::Delay {
                let pause = activity.delay_duration();
                debug!(delay_ms = pause.as_millis() as u64, "pausing outbound batch");
                tokio::time::sleep(pause).await;
                responses.push(ResourceResponse::empty());
                continue;
            }

            if activity.service_url.as_deref().is_none_or(str::is_empty) {
                return Err(SwitchboardError::Validation(
                    "outbound activity is missing serviceUrl".to_string(),
                ));
            }
            let Some(recipient) = activity.recipient_id() else {
                return Err(SwitchboardError::Validation(
                    "outbound activity is missing recipient id".to_string(),
                ));
            };

            if activity.activity_type == ActivityType::Trace
                && activity.channel_id.as_deref() != Some(EMULATOR_CHANNEL)
            {
                debug!(provider = %provider, "trace activity not transmitted");
                responses.push(ResourceResponse::empty());
                continue;
            }

            let config = self.provider(provider)?;
            let account_sid = activity
                .tenant_id()
                .filter(|sid| !sid.is_empty())
                .unwrap_or(&config.account_sid);

            let sent = self
                .client()
                .send_message(
                    &config,
                    account_sid,
                    OutboundMessage {
                        to: recipient,
                        from: activity.from_id().unwrap_or_default(),
                        body: activity.text.as_deref(),
                        application_sid: config.callback_app_id.as_deref(),
                    },
                )
                .await?;

            debug!(
                provider = %provider,
                message_sid = sent.sid.as_deref().unwrap_or_default(),
                "message queued"
            );
            responses.push(match sent.sid {
                Some(sid) => ResourceResponse::with_id(sid),
                None => ResourceResponse::empty(),
            });
        }

        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use switchboard_core::ChannelAccount;

    use super::*;
    use crate::carrier::CarrierOptions;
    use crate::provider::ProviderTable;

    fn carrier() -> Carrier {
        Carrier::new(Arc::new(ProviderTable::new()), CarrierOptions::default()).unwrap()
    }

    fn addressed(mut activity: Activity) -> Activity {
        activity.service_url = Some("https://api.twilio.com/2010-04-01".into());
        activity.recipient = Some(ChannelAccount::new("+15551234567"));
        activity.channel_id = Some("twilio".into());
        activity
    }

    #[tokio::test(start_paused = true)]
    async fn delays_pause_the_batch_without_network() {
        let started = tokio::time::Instant::now();
        let mut untyped_delay = Activity::delay(0);
        untyped_delay.value = None;

        let responses = carrier()
            .send_activities(Provider::Twilio, vec![Activity::delay(250), untyped_delay])
            .await
            .unwrap();

        assert_eq!(responses, vec![ResourceResponse::empty(), ResourceResponse::empty()]);
        assert!(started.elapsed() >= Duration::from_millis(1250));
    }

    #[tokio::test]
    async fn missing_service_url_fails_before_sending() {
        let mut activity = addressed(Activity::message("hi"));
        activity.service_url = None;
        let err = carrier()
            .send_activities(Provider::Twilio, vec![activity])
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchboardError::Validation(ref m) if m.contains("serviceUrl")));
    }

    #[tokio::test]
    async fn missing_recipient_fails_before_sending() {
        let mut activity = addressed(Activity::message("hi"));
        activity.recipient = Some(ChannelAccount::new(""));
        let err = carrier()
            .send_activities(Provider::Twilio, vec![activity])
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchboardError::Validation(ref m) if m.contains("recipient")));
    }

    #[tokio::test]
    async fn trace_is_swallowed_outside_emulator() {
        let responses = carrier()
            .send_activities(Provider::Twilio, vec![addressed(Activity::trace("debug"))])
            .await
            .unwrap();
        assert_eq!(responses, vec![ResourceResponse::empty()]);
    }

    #[tokio::test]
    async fn emulator_trace_needs_a_configured_provider() {
        let mut trace = addressed(Activity::trace("debug"));
        trace.channel_id = Some(EMULATOR_CHANNEL.into());
        let err = carrier()
            .send_activities(Provider::Twilio, vec![trace])
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchboardError::UnsupportedProvider(_)));
    }
}
