// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Casting API - actor and movie management behind Auth0 permissions
//!
//! Every actor and movie route requires an RS256 access token whose `scope`
//! claim grants the route's permission.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Authentication and authorization (Auth0 JWT)
//! - `config` - Environment configuration
//! - `store` - In-memory actor and movie records

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
pub mod telemetry;
