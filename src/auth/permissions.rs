// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission checks for authorization.
//!
//! ## Roles
//!
//! Roles live in the identity provider; this service only sees the
//! permissions a role grants, as the space-delimited `scope` claim:
//!
//! - Casting Assistant - `get:actors get:movies`
//! - Casting Director - assistant + `post:actors delete:actors patch:actors patch:movies`
//! - Executive Producer - director + `post:movies delete:movies`

use super::{AuthError, Claims};

/// Check that `required` appears in the token's `scope` claim.
///
/// An empty `required` means any authenticated caller is allowed, but the
/// `scope` claim must still be present.
pub fn check_permissions(required: &str, claims: &Claims) -> Result<(), AuthError> {
    let scope = claims.scope().ok_or_else(AuthError::scope_missing)?;

    if required.is_empty() || scope.split_whitespace().any(|granted| granted == required) {
        Ok(())
    } else {
        Err(AuthError::permission_denied())
    }
}

/// A permission a route requires, as a type.
///
/// Used as the parameter of [`Authorized`](super::Authorized) so the
/// requirement is part of the handler signature.
pub trait Permission: Send + Sync + 'static {
    /// Scope token as issued by the identity provider; empty for none.
    const NAME: &'static str;
}

macro_rules! permissions {
    ($($(#[$meta:meta])* $ty:ident => $name:literal;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $ty;

            impl Permission for $ty {
                const NAME: &'static str = $name;
            }
        )+

        /// Every scope token this API checks for.
        pub const ALL_PERMISSIONS: &[&str] = &[$($name),+];
    };
}

permissions! {
    /// Any verified token, no specific permission.
    Authenticated => "";
    GetActors => "get:actors";
    PostActors => "post:actors";
    PatchActors => "patch:actors";
    DeleteActors => "delete:actors";
    GetMovies => "get:movies";
    PostMovies => "post:movies";
    PatchMovies => "patch:movies";
    DeleteMovies => "delete:movies";
}
