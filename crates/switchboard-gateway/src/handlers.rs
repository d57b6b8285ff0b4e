// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.
//!
//! Handles `POST {webhook_path}` and `GET /health`.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use switchboard_auth::TWILIO_SIGNATURE_HEADER;
use switchboard_carrier::{BufferedResponse, WebhookRequest};

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub name: String,
    /// Binary version.
    pub version: String,
    pub uptime_secs: u64,
    /// Carriers with an account configured.
    pub providers: Vec<String>,
}

/// POST {webhook_path}
///
/// Hands the webhook to the orchestrator and replays what it wrote. A failed
/// turn has already been logged and answered by the time it returns here.
pub async fn post_webhook(
    State(state): State<GatewayState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = WebhookRequest {
        query: parse_query(query.as_deref()),
        content_type: header_value(&headers, CONTENT_TYPE.as_str()),
        signature: header_value(&headers, TWILIO_SIGNATURE_HEADER),
        body: body.to_vec(),
    };

    let mut sink = BufferedResponse::new();
    if let Err(err) = state.carrier.invoke_activity(request, &mut sink).await {
        tracing::debug!(error = %err, "webhook answered with failure status");
    }

    into_response(&sink)
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        name: state.health.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        providers: state
            .carrier
            .providers()
            .configured()
            .into_iter()
            .map(|provider| provider.to_string())
            .collect(),
    })
}

/// Query pairs; a repeated key keeps its last value.
fn parse_query(raw: Option<&str>) -> HashMap<String, String> {
    raw.map(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).unwrap_or_default())
        .unwrap_or_default()
        .into_iter()
        .collect()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn into_response(sink: &BufferedResponse) -> Response {
    let status = sink
        .status()
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match sink.content_type() {
        Some(content_type) => {
            (status, [(CONTENT_TYPE, content_type)], sink.body().to_string()).into_response()
        }
        None => status.into_response(),
    }
}
