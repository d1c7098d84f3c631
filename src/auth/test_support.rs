// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RSA fixtures and fake key sources shared by the auth tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use super::clock::FixedClock;
use super::jwks::{JwksError, KeySource, SigningKey, SigningKeySet};
use super::{Claims, TokenVerifier};

pub const SIGNING_KEY_PEM: &str = include_str!("fixtures/signing_key.pem");
pub const ROGUE_KEY_PEM: &str = include_str!("fixtures/rogue_key.pem");

/// Modulus of `fixtures/signing_key.pem`.
pub const SIGNING_KEY_N: &str = "zRd9vR_FLGJngSvV6dUcgfpdTxP9kDa84xb35a--WyTLgAb3maqb2-V2Pv6K5PaiJ5Q-9-9mYyEQdLl9tH8Yar1IZRwzI_VMZSQAkmibSjRkE777S2p6bWWT9B-ACmGJKiGOqcfuLsUOMFaSbuFG61R5CT03eV7f95GhSwjbVUpm5EGa67-QnF957CUBSeIHTSoha3NMUK6qvSP6gmVYasxLXVxKr6CLvw9wqhH9MmF5P5bPwr4VA9NY5zCvD9AF1w7MTrQYCBUVi5DTV6wj5Y9BrT3o0ATGVkouobusaUBlMhYPSIIPsibD378514PfoCL34TAYFJSg7ABG2aWyvQ";

/// Modulus of `fixtures/rogue_key.pem`.
pub const ROGUE_KEY_N: &str = "km8hNDiV788vOFNqfJDF4ehFSdx8oPgJ-3E6fpATS2vf7NpshvvL1o400uBfaSDMk8wWmZij3GB8v5qccn0BGyIGocrQcCenWCh8TJdTGz0JLwzAY7vQRtMBHwNVNVbJfCMN7PuFi5cMrtscOP6bHgG6OMcRugJePp9AkafRfDpG3WCSlD3UptyITvKgDh0-rxUp_YOMRTzGEzaXqAuLYtHeB3mV2zK1wJT0tH65ZqWA0n64OWJs8_ZcQvD0XrXrkWpteYsCKRNX9Yzx564ja9O5yf9z4q70JhcWpSiyGWXCwC2_51uENtsGKkwK8xEnjpBGJVHemXUOrTAwnZG13w";

pub const KID: &str = "test-key-1";
pub const DOMAIN: &str = "casting-test.us.auth0.com";
pub const ISSUER: &str = "https://casting-test.us.auth0.com/";
pub const AUDIENCE: &str = "https://casting-api";

/// Verification time used by every fixed-clock test.
pub const NOW: i64 = 1_752_519_031;

pub fn signing_key() -> SigningKey {
    SigningKey {
        kty: "RSA".to_string(),
        kid: Some(KID.to_string()),
        usage: Some("sig".to_string()),
        n: Some(SIGNING_KEY_N.to_string()),
        e: Some("AQAB".to_string()),
    }
}

pub fn rogue_key(kid: &str) -> SigningKey {
    SigningKey {
        kid: Some(kid.to_string()),
        n: Some(ROGUE_KEY_N.to_string()),
        ..signing_key()
    }
}

pub fn key_set() -> SigningKeySet {
    SigningKeySet {
        keys: vec![rogue_key("unrelated-key"), signing_key()],
    }
}

/// Claims valid at [`NOW`] for [`AUDIENCE`] and [`ISSUER`].
pub fn claims(scope: Option<&str>) -> Value {
    let mut claims = json!({
        "iss": ISSUER,
        "sub": "auth0|68754c30675f01d25d999d21",
        "aud": AUDIENCE,
        "iat": NOW - 60,
        "exp": NOW + 3600,
        "azp": "WRYdq1PcTn0YOxGx5bu9eF0GMHmXYvnd",
    });
    if let Some(scope) = scope {
        claims["scope"] = json!(scope);
    }
    claims
}

/// Wrap a JSON object as claims without verifying anything, for tests of
/// code downstream of the verifier.
pub fn unverified_claims(value: Value) -> Claims {
    match value {
        Value::Object(map) => Claims::from_map(map),
        other => panic!("claims must be a JSON object, got {other}"),
    }
}

/// RS256 token signed by the published test key.
pub fn sign(claims: &Value) -> String {
    sign_with(SIGNING_KEY_PEM, Some(KID), claims)
}

pub fn sign_with(pem: &str, kid: Option<&str>, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

/// Verifier for the test tenant with the clock stopped at [`NOW`].
pub fn verifier() -> TokenVerifier {
    TokenVerifier::new(AUDIENCE, ISSUER).with_clock(Arc::new(FixedClock(NOW)))
}

/// Serves a fixed key set and counts fetches.
pub struct CountingKeySource {
    jwks: Arc<SigningKeySet>,
    calls: Arc<AtomicUsize>,
}

impl CountingKeySource {
    pub fn new(jwks: SigningKeySet) -> Self {
        Self {
            jwks: Arc::new(jwks),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl KeySource for CountingKeySource {
    async fn fetch(&self) -> Result<Arc<SigningKeySet>, JwksError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.jwks.clone())
    }
}

/// Serves an outdated key set from `fetch` and the current one from
/// `refresh`, like a cache that has not seen a key rotation yet.
pub struct RotatingKeySource {
    stale: Arc<SigningKeySet>,
    fresh: Arc<SigningKeySet>,
    pub refreshes: AtomicUsize,
}

impl RotatingKeySource {
    pub fn new(stale: SigningKeySet, fresh: SigningKeySet) -> Self {
        Self {
            stale: Arc::new(stale),
            fresh: Arc::new(fresh),
            refreshes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl KeySource for RotatingKeySource {
    async fn fetch(&self) -> Result<Arc<SigningKeySet>, JwksError> {
        Ok(self.stale.clone())
    }

    async fn refresh(&self) -> Result<Option<Arc<SigningKeySet>>, JwksError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(Some(self.fresh.clone()))
    }
}

/// Identity provider that is down.
pub struct UnreachableKeySource;

#[async_trait]
impl KeySource for UnreachableKeySource {
    async fn fetch(&self) -> Result<Arc<SigningKeySet>, JwksError> {
        Err(JwksError::Status {
            url: format!("https://{DOMAIN}/.well-known/jwks.json"),
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        })
    }
}

/// Identity provider that answers with an error after `delay`.
pub struct SlowFailingKeySource {
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl SlowFailingKeySource {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl KeySource for SlowFailingKeySource {
    async fn fetch(&self) -> Result<Arc<SigningKeySet>, JwksError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        UnreachableKeySource.fetch().await
    }
}
