// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize` and/or `Deserialize` and
//! `ToSchema` for JSON handling and OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Actors**: performers that can be cast
//! - **Movies**: productions actors are cast in
//! - **Envelopes**: the `{"success": true, ...}` wrappers every response uses
//!
//! Request fields are all optional at the serde level; handlers decide which
//! are required so that a missing field is a `400 Bad Request` in the
//! standard error envelope rather than a framework rejection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Actor Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Actor {
    pub id: u64,
    pub name: String,
    pub age: u32,
    pub gender: String,
}

/// Body of `POST /actors`. `name`, `age` and `gender` are required.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateActorRequest {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

/// Body of `PATCH /actors/{actor_id}`. At least one field must be present.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateActorRequest {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

impl UpdateActorRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.gender.is_none()
    }
}

// =============================================================================
// Movie Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    /// Release date, ISO 8601 (`YYYY-MM-DD`)
    pub release_date: NaiveDate,
}

/// Body of `POST /movies`. `title` and `release_date` are required.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateMovieRequest {
    pub title: Option<String>,
    pub release_date: Option<NaiveDate>,
}

/// Body of `PATCH /movies/{movie_id}`. At least one field must be present.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub release_date: Option<NaiveDate>,
}

impl UpdateMovieRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.release_date.is_none()
    }
}

// =============================================================================
// Response Envelopes
// =============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct ActorListResponse {
    pub success: bool,
    pub actors: Vec<Actor>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActorResponse {
    pub success: bool,
    pub actor: Actor,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovieListResponse {
    pub success: bool,
    pub movies: Vec<Movie>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovieResponse {
    pub success: bool,
    pub movie: Movie,
}

/// Id of a newly created record.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct CreatedResponse {
    pub success: bool,
    pub created: u64,
}

/// Id of a deleted record.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct DeletedResponse {
    pub success: bool,
    pub deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn movie_release_date_is_iso() {
        let movie = Movie {
            id: 1,
            title: "Casting Call".into(),
            release_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        };
        assert_eq!(
            serde_json::to_value(&movie).unwrap(),
            json!({"id": 1, "title": "Casting Call", "release_date": "2026-03-14"})
        );
    }

    #[test]
    fn update_requests_detect_empty_body() {
        let empty: UpdateActorRequest = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());

        let named: UpdateActorRequest = serde_json::from_value(json!({"name": "A"})).unwrap();
        assert!(!named.is_empty());

        let movie: UpdateMovieRequest =
            serde_json::from_value(json!({"release_date": "2025-01-01"})).unwrap();
        assert!(!movie.is_empty());
    }

    #[test]
    fn create_request_tolerates_missing_fields() {
        let partial: CreateActorRequest = serde_json::from_value(json!({"name": "A"})).unwrap();
        assert_eq!(partial.name.as_deref(), Some("A"));
        assert!(partial.age.is_none());
    }
}
