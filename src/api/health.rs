// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::auth::KeySource;
use crate::state::AppState;

/// Liveness response, `{"success": true, "message": "Healthy"}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
}

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Whether signing keys can be obtained from the identity provider.
    pub jwks: String,
}

/// Check that signing keys are available. Served from cache when one is
/// configured, so this does not hit the provider on every readiness check.
async fn check_jwks(state: &AppState) -> String {
    match state.auth.keys().fetch().await {
        Ok(jwks) if !jwks.is_empty() => "ok".to_string(),
        Ok(_) => "empty".to_string(),
        Err(err) => {
            warn!(error = %err, "signing keys unavailable");
            "unavailable".to_string()
        }
    }
}

/// Liveness handler. Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "Healthy".to_string(),
    })
}

/// Readiness handler.
///
/// Returns 200 if signing keys are available, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let jwks = check_jwks(&state).await;
    let ready = jwks == "ok";

    let response = ReadyResponse {
        status: if ready { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            jwks,
        },
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::test_state;
    use crate::auth::test_support::{self as ts, UnreachableKeySource};
    use crate::auth::AuthGate;
    use std::sync::Arc;

    #[tokio::test]
    async fn liveness_reports_healthy() {
        let Json(response) = liveness().await;
        assert!(response.success);
        assert_eq!(response.message, "Healthy");
    }

    #[tokio::test]
    async fn readiness_ok_with_keys() {
        let (status, Json(response)) = readiness(State(test_state())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.status, "ok");
        assert_eq!(response.checks.jwks, "ok");
    }

    #[tokio::test]
    async fn readiness_degraded_without_keys() {
        let state = AppState::new(AuthGate::new(Arc::new(UnreachableKeySource), ts::verifier()));
        let (status, Json(response)) = readiness(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.status, "degraded");
        assert_eq!(response.checks.jwks, "unavailable");
    }
}
