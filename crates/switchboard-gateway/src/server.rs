// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::time::Instant;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use switchboard_carrier::Carrier;
use switchboard_config::model::ServerConfig;
use switchboard_core::SwitchboardError;

use crate::handlers;

/// Health state for the unauthenticated health endpoint.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: Instant,
    /// Name reported to health probes.
    pub name: String,
}

impl HealthState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start_time: Instant::now(),
            name: name.into(),
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Debug, Clone)]
pub struct GatewayState {
    /// Orchestrator every webhook is handed to.
    pub carrier: Carrier,
    pub health: HealthState,
}

/// Routes:
/// - `POST {webhook_path}`: carrier webhooks
/// - `GET /health`: liveness and configured carriers
pub fn router(webhook_path: &str, state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route(webhook_path, post(handlers::post_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `config.host:config.port` and serves until `shutdown` resolves.
pub async fn start_server<S>(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: S,
) -> Result<(), SwitchboardError>
where
    S: Future<Output = ()> + Send + 'static,
{
    let app = router(&config.webhook_path, state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SwitchboardError::Http {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!(
        addr = %addr,
        webhook_path = %config.webhook_path,
        "gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| SwitchboardError::Http {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use switchboard_carrier::{CarrierOptions, ProviderTable};

    #[test]
    fn gateway_state_is_clone() {
        let carrier =
            Carrier::new(Arc::new(ProviderTable::new()), CarrierOptions::default()).unwrap();
        let state = GatewayState {
            carrier,
            health: HealthState::new("switchboard"),
        };
        let cloned = state.clone();
        assert_eq!(cloned.health.name, "switchboard");
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let carrier =
            Carrier::new(Arc::new(ProviderTable::new()), CarrierOptions::default()).unwrap();
        let state = GatewayState {
            carrier,
            health: HealthState::new("switchboard"),
        };
        let config = ServerConfig {
            host: "not a host".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        let err = start_server(&config, state, async {}).await.unwrap_err();
        assert!(err.to_string().contains("failed to bind gateway"));
    }
}
