// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT verification against a fetched signing key set.
//!
//! ## Steps
//!
//! 1. Decode the header without verifying it and read `kid`
//! 2. Pick the matching key from the key set
//! 3. Verify the signature and the header algorithm (jsonwebtoken)
//! 4. Check `nbf`, `exp`, `aud` and `iss` against the configured values
//!
//! Each step short-circuits with its own [`AuthError`]. The unverified
//! header is only used to choose a key.

use std::sync::Arc;

use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde_json::{Map, Value};
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::jwks::{SigningKey, SigningKeySet};
use super::{AuthError, Claims};

/// Verifies bearer tokens issued by one identity provider for one API.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    algorithms: Vec<Algorithm>,
    audience: String,
    issuer: String,
    leeway: u64,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    /// Verifier accepting RS256 only, with no clock skew allowance.
    pub fn new(audience: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            algorithms: vec![Algorithm::RS256],
            audience: audience.into(),
            issuer: issuer.into(),
            leeway: 0,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the accepted signature algorithms. Must be non-empty and
    /// RSA-family, which [`AuthSettings`](crate::config::AuthSettings)
    /// guarantees.
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// Seconds of clock skew tolerated on `exp` and `nbf`.
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Verify `token` with a key from `jwks` and return its claims.
    pub fn verify(&self, token: &str, jwks: &SigningKeySet) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "token header is not decodable");
            AuthError::unparseable()
        })?;
        let kid = header.kid.ok_or_else(AuthError::malformed)?;

        let key = jwks.find(&kid).ok_or_else(|| {
            debug!(kid = %kid, "no signing key matches token kid");
            AuthError::key_not_found()
        })?;

        let claims = self.decode_verified(token, key)?;
        self.validate_claims(&claims)?;
        Ok(claims)
    }

    fn decode_verified(&self, token: &str, key: &SigningKey) -> Result<Claims, AuthError> {
        let decoding_key = key.decoding_key().ok_or_else(|| {
            debug!(kid = ?key.kid, kty = %key.kty, "signing key is not a usable RSA key");
            AuthError::unparseable()
        })?;

        // Signature and algorithm only; claims are checked against our own clock.
        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = self.algorithms.clone();
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let token_data =
            decode::<Map<String, Value>>(token, &decoding_key, &validation).map_err(|e| {
                debug!(error = %e, "token signature rejected");
                AuthError::unparseable()
            })?;

        Ok(Claims::from_map(token_data.claims))
    }

    fn validate_claims(&self, claims: &Claims) -> Result<(), AuthError> {
        let now = self.clock.now();
        let leeway = i64::try_from(self.leeway).unwrap_or(i64::MAX);

        if let Some(nbf) = claims.get("nbf") {
            let nbf = claims.not_before().ok_or_else(|| {
                debug!(%nbf, "nbf is not a numeric date");
                AuthError::incorrect_claims()
            })?;
            if nbf > now.saturating_add(leeway) {
                return Err(AuthError::incorrect_claims());
            }
        }

        let exp = claims.expires_at().ok_or_else(|| {
            debug!("token has no numeric exp claim");
            AuthError::incorrect_claims()
        })?;
        if exp < now.saturating_sub(leeway) {
            return Err(AuthError::expired());
        }

        if !claims.has_audience(&self.audience) {
            debug!(aud = ?claims.get("aud"), "audience mismatch");
            return Err(AuthError::incorrect_claims());
        }

        if claims.issuer() != Some(self.issuer.as_str()) {
            debug!(iss = ?claims.get("iss"), "issuer mismatch");
            return Err(AuthError::incorrect_claims());
        }

        Ok(())
    }
}
