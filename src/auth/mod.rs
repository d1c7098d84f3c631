// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Auth0 JWT authentication and permission checks for the Casting API.
//!
//! ## Auth Flow
//!
//! 1. The client obtains an access token from Auth0 for the API audience
//! 2. The client sends `Authorization: Bearer <token>`
//! 3. The server:
//!    - Extracts the bearer token from the header
//!    - Fetches the Auth0 JWKS via HTTPS (cached with a TTL)
//!    - Verifies signature, expiry, issuer and audience
//!    - Checks the route's permission against the `scope` claim
//! 4. The handler receives the verified claims as its first argument
//!
//! ## Security
//!
//! - All actor and movie endpoints require a permission
//! - The unverified token header only selects the verification key
//! - A JWKS fetch failure is a server error, never a token error
//! - No clock skew tolerance unless `AUTH_LEEWAY_SECS` is set

pub mod claims;
pub mod clock;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod jwks;
pub mod permissions;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use claims::Claims;
pub use error::{AuthError, AuthErrorCode};
pub use extractor::{bearer_token, Authorized};
pub use gate::{AuthGate, GateError};
pub use jwks::{CachedKeySource, HttpKeySource, JwksError, KeySource, SigningKey, SigningKeySet};
pub use permissions::{check_permissions, Permission};
pub use verifier::TokenVerifier;
