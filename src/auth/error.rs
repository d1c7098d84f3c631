// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every failure of the auth pipeline (header parsing, key lookup, token
//! verification, permission check) is an [`AuthError`]. It carries a
//! machine-readable code, a human-readable description and one of the
//! status codes 400, 401 or 403, and crosses every layer unchanged until
//! [`IntoResponse`] renders it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ErrorBody;

/// Machine-readable auth failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    /// No `Authorization` header on the request
    AuthorizationHeaderMissing,
    /// Malformed bearer header, missing or unknown key id, or unparseable token
    InvalidHeader,
    /// Missing scope claim, or audience/issuer mismatch
    InvalidClaims,
    /// Expiry claim is in the past
    TokenExpired,
    /// Valid token without the required permission
    Unauthorized,
}

impl AuthErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorCode::AuthorizationHeaderMissing => "authorization_header_missing",
            AuthErrorCode::InvalidHeader => "invalid_header",
            AuthErrorCode::InvalidClaims => "invalid_claims",
            AuthErrorCode::TokenExpired => "token_expired",
            AuthErrorCode::Unauthorized => "unauthorized",
        }
    }
}

impl std::fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication error type.
///
/// Construct through the named constructors below; each one pins the
/// code/status pairing for a single failure case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    code: AuthErrorCode,
    description: &'static str,
    status: StatusCode,
}

impl AuthError {
    const fn new(code: AuthErrorCode, description: &'static str, status: StatusCode) -> Self {
        Self {
            code,
            description,
            status,
        }
    }

    pub const fn header_missing() -> Self {
        Self::new(
            AuthErrorCode::AuthorizationHeaderMissing,
            "Authorization header is expected.",
            StatusCode::UNAUTHORIZED,
        )
    }

    pub const fn not_bearer() -> Self {
        Self::new(
            AuthErrorCode::InvalidHeader,
            "Authorization header must start with \"Bearer\".",
            StatusCode::UNAUTHORIZED,
        )
    }

    pub const fn token_not_found() -> Self {
        Self::new(
            AuthErrorCode::InvalidHeader,
            "Token not found.",
            StatusCode::UNAUTHORIZED,
        )
    }

    pub const fn not_a_bearer_token() -> Self {
        Self::new(
            AuthErrorCode::InvalidHeader,
            "Authorization header must be a bearer token.",
            StatusCode::UNAUTHORIZED,
        )
    }

    /// Token header carries no `kid`.
    pub const fn malformed() -> Self {
        Self::new(
            AuthErrorCode::InvalidHeader,
            "Authorization malformed.",
            StatusCode::UNAUTHORIZED,
        )
    }

    /// No key in the fetched set matches the token's `kid`.
    pub const fn key_not_found() -> Self {
        Self::new(
            AuthErrorCode::InvalidHeader,
            "Unable to find the appropriate key.",
            StatusCode::BAD_REQUEST,
        )
    }

    /// Malformed token, bad signature, unusable key or disallowed algorithm.
    pub const fn unparseable() -> Self {
        Self::new(
            AuthErrorCode::InvalidHeader,
            "Unable to parse authentication token.",
            StatusCode::BAD_REQUEST,
        )
    }

    pub const fn expired() -> Self {
        Self::new(
            AuthErrorCode::TokenExpired,
            "Token expired.",
            StatusCode::UNAUTHORIZED,
        )
    }

    /// Audience, issuer or time-window claims failed validation.
    pub const fn incorrect_claims() -> Self {
        Self::new(
            AuthErrorCode::InvalidClaims,
            "Incorrect claims. Please, check the audience and issuer.",
            StatusCode::UNAUTHORIZED,
        )
    }

    pub const fn scope_missing() -> Self {
        Self::new(
            AuthErrorCode::InvalidClaims,
            "Permissions not included in JWT.",
            StatusCode::BAD_REQUEST,
        )
    }

    pub const fn permission_denied() -> Self {
        Self::new(
            AuthErrorCode::Unauthorized,
            "Permission not found.",
            StatusCode::FORBIDDEN,
        )
    }

    pub fn code(&self) -> AuthErrorCode {
        self.code
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody::new(self.status, self.description));
        (self.status, body).into_response()
    }
}
