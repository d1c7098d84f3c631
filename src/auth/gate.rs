// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The auth gate: extraction, key fetch, verification and permission check
//! composed in front of a protected operation.
//!
//! ## Flow
//!
//! ```text
//! Authorization header → bearer_token
//!                      → KeySource::fetch
//!                      → TokenVerifier::verify   (unknown kid? refresh once)
//!                      → check_permissions
//!                      → protected operation(claims, ..)
//! ```
//!
//! An [`AuthError`] from any step is returned untouched. A key set that
//! cannot be fetched is a [`GateError::KeySet`], reported as a server error
//! rather than a bad token.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, instrument};

use super::extractor::bearer_token;
use super::jwks::{CachedKeySource, HttpKeySource, JwksError, KeySource};
use super::permissions::check_permissions;
use super::{AuthError, Claims, TokenVerifier};
use crate::config::AuthSettings;
use crate::error::ApiError;

/// Failure to get a request past the gate.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The request's credentials were rejected
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Signing keys could not be fetched, so nothing could be verified
    #[error("signing keys unavailable: {0}")]
    KeySet(#[from] JwksError),
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match self {
            GateError::Auth(err) => {
                debug!(code = %err.code(), status = err.status_code().as_u16(), "request rejected");
                err.into_response()
            }
            GateError::KeySet(err) => {
                error!(error = %err, "cannot verify bearer token without signing keys");
                ApiError::internal().into_response()
            }
        }
    }
}

/// Gate guarding protected routes. Built once at startup and shared.
#[derive(Clone)]
pub struct AuthGate {
    keys: Arc<dyn KeySource>,
    verifier: TokenVerifier,
}

impl AuthGate {
    pub fn new(keys: Arc<dyn KeySource>, verifier: TokenVerifier) -> Self {
        Self { keys, verifier }
    }

    /// Gate for the configured identity provider: HTTPS key source, cached
    /// unless the TTL is zero.
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, JwksError> {
        let http = HttpKeySource::new(settings.jwks_url.as_str(), settings.jwks_timeout)?;
        let keys: Arc<dyn KeySource> = if settings.jwks_cache_ttl.is_zero() {
            Arc::new(http)
        } else {
            Arc::new(
                CachedKeySource::new(http)
                    .with_cache_ttl(settings.jwks_cache_ttl)
                    .with_max_wait(settings.jwks_timeout.saturating_add(Duration::from_secs(1))),
            )
        };

        let verifier = TokenVerifier::new(&settings.audience, &settings.issuer)
            .with_algorithms(settings.algorithms.clone())
            .with_leeway(settings.leeway_secs);

        Ok(Self::new(keys, verifier))
    }

    pub fn keys(&self) -> &Arc<dyn KeySource> {
        &self.keys
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Authorize a request for `required` (empty: any valid token).
    #[instrument(skip_all, fields(permission = required))]
    pub async fn authorize(&self, headers: &HeaderMap, required: &str) -> Result<Claims, GateError> {
        let token = bearer_token(headers.get(AUTHORIZATION))?;
        let claims = self.verify(token).await?;
        check_permissions(required, &claims)?;
        debug!(sub = claims.subject().unwrap_or_default(), "request authorized");
        Ok(claims)
    }

    /// Fetch signing keys and verify `token` with them.
    pub async fn verify(&self, token: &str) -> Result<Claims, GateError> {
        let jwks = self.keys.fetch().await?;
        match self.verifier.verify(token, &jwks) {
            Err(err) if err == AuthError::key_not_found() => {
                let Some(fresh) = self.keys.refresh().await? else {
                    return Err(err.into());
                };
                debug!("retrying verification against refreshed signing keys");
                Ok(self.verifier.verify(token, &fresh)?)
            }
            result => Ok(result?),
        }
    }

    /// Run `op` with the verified claims if the request is authorized for
    /// `required`. `op` is never called otherwise.
    pub async fn guard<F, Fut, T>(
        &self,
        required: &str,
        headers: &HeaderMap,
        op: F,
    ) -> Result<T, GateError>
    where
        F: FnOnce(Claims) -> Fut,
        Fut: Future<Output = T>,
    {
        let claims = self.authorize(headers, required).await?;
        Ok(op(claims).await)
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}
