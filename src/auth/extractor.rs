// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token extraction and the Axum extractor for authorized requests.
//!
//! Use the `Authorized` extractor as the first handler argument to require
//! a permission:
//!
//! ```rust,ignore
//! async fn create_actor(
//!     Authorized(claims, _): Authorized<PostActors>,
//!     State(state): State<AppState>,
//! ) -> impl IntoResponse {
//!     // claims are verified and carry `post:actors`
//! }
//! ```

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderValue},
};

use super::gate::GateError;
use super::permissions::Permission;
use super::{AuthError, Claims};
use crate::state::AppState;

/// Pull the raw token out of an `Authorization` header value.
///
/// The value must be exactly two whitespace-separated parts, the first of
/// which is `bearer` in any case.
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let header = header.ok_or_else(AuthError::header_missing)?;
    if header.is_empty() {
        return Err(AuthError::header_missing());
    }
    let value = header.to_str().map_err(|_| AuthError::not_bearer())?;

    let mut parts = value.split_whitespace();
    match parts.next() {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer") => {}
        _ => return Err(AuthError::not_bearer()),
    }

    let token = parts.next().ok_or_else(AuthError::token_not_found)?;
    if parts.next().is_some() {
        return Err(AuthError::not_a_bearer_token());
    }

    Ok(token)
}

/// Extractor for requests authorized for permission `P`.
///
/// Runs the [`AuthGate`](super::AuthGate) held in [`AppState`]; the handler
/// only runs if the token verified and its scope grants `P`.
pub struct Authorized<P: Permission>(pub Claims, pub PhantomData<P>);

impl<P: Permission> Authorized<P> {
    pub fn claims(&self) -> &Claims {
        &self.0
    }

    pub fn into_claims(self) -> Claims {
        self.0
    }
}

impl<P: Permission> std::fmt::Debug for Authorized<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorized")
            .field("permission", &P::NAME)
            .field("claims", &self.0)
            .finish()
    }
}

impl<P: Permission> FromRequestParts<AppState> for Authorized<P> {
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = state.auth.authorize(&parts.headers, P::NAME).await?;
        Ok(Authorized(claims, PhantomData))
    }
}
