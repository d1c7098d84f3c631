// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use casting_api::{
    api::router,
    auth::{AuthGate, KeySource},
    config::AppConfig,
    state::AppState,
    telemetry,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = telemetry::init(config.log_format) {
        eprintln!("failed to install tracing subscriber: {err}");
        return ExitCode::FAILURE;
    }

    let gate = match AuthGate::from_settings(&config.auth) {
        Ok(gate) => gate,
        Err(err) => {
            error!(error = %err, "failed to build JWKS client");
            return ExitCode::FAILURE;
        }
    };

    info!(
        domain = %config.auth.domain,
        audience = %config.auth.audience,
        jwks_url = %config.auth.jwks_url,
        cache_ttl_secs = config.auth.jwks_cache_ttl.as_secs(),
        "auth configured"
    );

    // Warm the key cache so the first request does not pay for the fetch.
    if let Err(err) = gate.keys().fetch().await {
        warn!(error = %err, "initial JWKS fetch failed, will retry on first request");
    }

    let app = router(AppState::new(gate));

    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(addr = %config.bind_addr, error = %err, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(addr = %config.bind_addr, "Casting API listening (docs at /docs)");

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %err, "server failed");
        return ExitCode::FAILURE;
    }

    info!("server stopped");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
