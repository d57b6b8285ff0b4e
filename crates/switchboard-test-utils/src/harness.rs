// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A [`Carrier`] wired to a wiremock stand-in for the carrier REST API.
//!
//! Both Twilio and SignalWire are configured against the same mock server,
//! so webhook turns and outbound sends run end to end without a network.

use std::collections::HashMap;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use switchboard_carrier::{BufferedResponse, Carrier, WebhookRequest};
use switchboard_config::SwitchboardConfig;
use switchboard_core::SwitchboardError;

use crate::fixtures::{
    TEST_ACCOUNT_SID, TEST_ADDRESS_SID, TEST_CALLBACK_APP_ID, TEST_CALLBACK_TOKEN,
    TEST_MIGRATE_ACCOUNT_SID, TEST_MIGRATE_ADDRESS_SID, TEST_PRIMARY_TOKEN,
    TEST_SIGNALWIRE_CALLBACK_TOKEN, TEST_SIGNALWIRE_PROJECT, webhook_query,
};

/// Configuration with both carriers pointed at `mock_uri`.
pub fn mock_config(mock_uri: &str) -> SwitchboardConfig {
    let mut config = SwitchboardConfig::default();
    config.outbound.timeout_secs = 2;

    config.twilio.account_sid = Some(TEST_ACCOUNT_SID.into());
    config.twilio.primary_token = Some(TEST_PRIMARY_TOKEN.into());
    config.twilio.callback_token = Some(TEST_CALLBACK_TOKEN.into());
    config.twilio.callback_app_id = Some(TEST_CALLBACK_APP_ID.into());
    config.twilio.address_sid = Some(TEST_ADDRESS_SID.into());
    config.twilio.migrate_account_sid = Some(TEST_MIGRATE_ACCOUNT_SID.into());
    config.twilio.migrate_address_sid = Some(TEST_MIGRATE_ADDRESS_SID.into());
    config.twilio.base_url = mock_uri.to_string();

    config.signalwire.space = Some("example.signalwire.com".into());
    config.signalwire.account_sid = Some(TEST_SIGNALWIRE_PROJECT.into());
    config.signalwire.account_token = Some("sw-primary-token".into());
    config.signalwire.callback_token = Some(TEST_SIGNALWIRE_CALLBACK_TOKEN.into());
    config.signalwire.callback_app_id = Some(TEST_CALLBACK_APP_ID.into());
    config.signalwire.address_sid = Some(TEST_ADDRESS_SID.into());
    config.signalwire.base_url = Some(mock_uri.to_string());

    config
}

/// Outcome of one webhook pushed through the harness.
#[derive(Debug)]
pub struct TurnOutcome {
    pub response: BufferedResponse,
    pub result: Result<(), SwitchboardError>,
}

impl TurnOutcome {
    pub fn status(&self) -> Option<u16> {
        self.response.status()
    }
}

pub struct CarrierHarness {
    pub server: MockServer,
    pub config: SwitchboardConfig,
    pub carrier: Carrier,
}

impl CarrierHarness {
    pub async fn start() -> Result<Self, SwitchboardError> {
        let server = MockServer::start().await;
        let config = mock_config(&server.uri());
        let carrier = Carrier::from_config(&config)?;
        Ok(Self {
            server,
            config,
            carrier,
        })
    }

    /// Path prefix of the Twilio messaging API on the mock.
    pub fn twilio_api_path(&self) -> String {
        format!("/2010-04-01/Accounts/{TEST_ACCOUNT_SID}")
    }

    /// Accepts every outbound SMS with a fixed message sid.
    pub async fn accept_messages(&self) {
        Mock::given(method("POST"))
            .and(path_regex(r"/Accounts/[^/]+/Messages\.json$"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "sid": "SM00000000000000000000000000000099",
                "status": "queued"
            })))
            .mount(&self.server)
            .await;
    }

    /// Fails every outbound SMS with a carrier error document.
    pub async fn reject_messages(&self, status: u16, code: i64, message: &str) {
        Mock::given(method("POST"))
            .and(path(format!("{}/Messages.json", self.twilio_api_path())))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "code": code,
                "message": message,
                "status": status
            })))
            .mount(&self.server)
            .await;
    }

    /// Form bodies of every SMS the carrier tried to send, in order.
    pub async fn sent_messages(&self) -> Vec<HashMap<String, String>> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path().ends_with("/Messages.json"))
            .map(|request| serde_urlencoded::from_bytes(&request.body).unwrap_or_default())
            .collect()
    }

    /// A JSON webhook for `provider`/`kind` carrying `callback_token`.
    pub fn webhook(
        &self,
        provider: &str,
        kind: &str,
        callback_token: Option<&str>,
        body: &Value,
    ) -> WebhookRequest {
        WebhookRequest::new(
            webhook_query(provider, kind, callback_token),
            Some("application/json; charset=utf-8".to_string()),
            body.to_string().into_bytes(),
        )
    }

    /// Runs `request` through the carrier and captures the written response.
    pub async fn deliver(&self, request: WebhookRequest) -> TurnOutcome {
        let mut response = BufferedResponse::new();
        let result = self.carrier.invoke_activity(request, &mut response).await;
        TurnOutcome { response, result }
    }
}
