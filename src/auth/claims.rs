// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verified JWT claims.

use serde::Serialize;
use serde_json::{Map, Value};

/// The decoded payload of a token whose signature and claims have been
/// verified.
///
/// Serializes back to exactly the payload that was signed; no field is
/// added, removed or rewritten. This is the only value trusted for
/// authorization decisions, so it cannot be deserialized from arbitrary
/// JSON:
///
/// ```compile_fail
/// let forged: casting_api::auth::Claims =
///     serde_json::from_value(serde_json::json!({"scope": "delete:actors"})).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Wrap a claims map. Outside of tests only the verifier calls this,
    /// after the signature has checked out.
    pub(crate) fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Subject (`sub`), the identity provider's user id.
    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get("iss").and_then(Value::as_str)
    }

    /// Expiry (`exp`) in Unix seconds. Fractional values are truncated.
    pub fn expires_at(&self) -> Option<i64> {
        numeric_date(self.get("exp")?)
    }

    /// Not-before (`nbf`) in Unix seconds.
    pub fn not_before(&self) -> Option<i64> {
        numeric_date(self.get("nbf")?)
    }

    /// True if `aud` equals `audience` or, when it is an array, contains it.
    pub fn has_audience(&self, audience: &str) -> bool {
        match self.get("aud") {
            Some(Value::String(aud)) => aud == audience,
            Some(Value::Array(auds)) => auds.iter().any(|a| a.as_str() == Some(audience)),
            _ => false,
        }
    }

    /// Raw space-delimited `scope` claim.
    pub fn scope(&self) -> Option<&str> {
        self.get("scope").and_then(Value::as_str)
    }

    /// Granted permissions, split on whitespace.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope().unwrap_or_default().split_whitespace()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

fn numeric_date(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|secs| secs as i64))
}
