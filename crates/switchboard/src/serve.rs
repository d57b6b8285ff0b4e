// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `switchboard serve` command implementation.
//!
//! Builds the carrier from configuration, registers the bundled handlers,
//! and serves webhooks until SIGINT or SIGTERM.

use std::time::Instant;

use tracing::{info, warn};

use switchboard_carrier::Carrier;
use switchboard_config::model::BotConfig;
use switchboard_config::SwitchboardConfig;
use switchboard_core::SwitchboardError;
use switchboard_gateway::{start_server, GatewayState, HealthState};

use crate::shutdown;

/// Runs the gateway until a shutdown signal arrives.
pub async fn run_serve(config: SwitchboardConfig) -> Result<(), SwitchboardError> {
    init_tracing(&config.app.log_level);

    let carrier = Carrier::from_config(&config)?;
    let providers = carrier.providers().configured();
    if providers.is_empty() {
        warn!("no carrier account configured, every webhook will be rejected");
    }
    info!(
        providers = ?providers,
        mode = %config.app.mode,
        "carrier adapter ready"
    );

    register_handlers(&carrier, &config.bot);

    let state = GatewayState {
        carrier,
        health: HealthState::new(config.app.name.clone()),
    };

    let cancel = shutdown::install_signal_handler();
    start_server(&config.server, state, cancel.cancelled_owned()).await?;

    info!("switchboard serve shutdown complete");
    Ok(())
}

/// A turn logger and, with `[bot].auto_reply` set, a fixed reply to every SMS.
fn register_handlers(carrier: &Carrier, bot: &BotConfig) {
    carrier.on_turn(|ctx, next| async move {
        let started = Instant::now();
        let result = next.call().await;
        info!(
            turn = %ctx.id(),
            provider = %ctx.provider(),
            activity_type = %ctx.activity().activity_type,
            from = ctx.activity().from_id().unwrap_or_default(),
            responded = ctx.responded(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "turn handled"
        );
        result
    });

    if let Some(reply) = bot.auto_reply.clone().filter(|r| !r.is_empty()) {
        carrier.on_message(move |ctx, next| {
            let reply = reply.clone();
            async move {
                ctx.send_text(reply).await?;
                next.call().await
            }
        });
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("switchboard={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use switchboard_carrier::Topic;
    use switchboard_test_utils::fixtures::{
        sms_body, BOT_NUMBER, TEST_ACCOUNT_SID, TEST_CALLBACK_TOKEN, USER_NUMBER,
    };
    use switchboard_test_utils::CarrierHarness;

    #[tokio::test]
    async fn auto_reply_answers_every_message() {
        let harness = CarrierHarness::start().await.unwrap();
        harness.accept_messages().await;
        register_handlers(
            &harness.carrier,
            &BotConfig {
                auto_reply: Some("Thanks, we got it.".into()),
            },
        );

        let outcome = harness
            .deliver(harness.webhook(
                "twilio",
                "message",
                Some(TEST_CALLBACK_TOKEN),
                &sms_body(TEST_ACCOUNT_SID, "hi"),
            ))
            .await;
        assert_eq!(outcome.status(), Some(200));

        let sent = harness.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["To"], USER_NUMBER);
        assert_eq!(sent[0]["From"], BOT_NUMBER);
        assert_eq!(sent[0]["Body"], "Thanks, we got it.");
    }

    #[tokio::test]
    async fn without_auto_reply_only_the_logger_is_registered() {
        let harness = CarrierHarness::start().await.unwrap();
        register_handlers(&harness.carrier, &BotConfig::default());

        assert_eq!(harness.carrier.handler_count(&Topic::Turn), 1);
        assert_eq!(harness.carrier.handler_count(&Topic::Message), 0);

        let outcome = harness
            .deliver(harness.webhook(
                "twilio",
                "message_status",
                Some(TEST_CALLBACK_TOKEN),
                &json!({"AccountSid": TEST_ACCOUNT_SID, "MessageStatus": "delivered"}),
            ))
            .await;
        assert_eq!(outcome.status(), Some(200));
        assert!(harness.sent_messages().await.is_empty());
    }
}
