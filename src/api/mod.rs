// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    http::{Request, StatusCode},
    routing::{get, patch},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::debug;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::{ApiError, ErrorBody},
    models::{
        Actor, ActorListResponse, ActorResponse, CreateActorRequest, CreateMovieRequest,
        CreatedResponse, DeletedResponse, Movie, MovieListResponse, MovieResponse,
        UpdateActorRequest, UpdateMovieRequest,
    },
    state::AppState,
};

pub mod actors;
pub mod health;
pub mod movies;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(health::liveness))
        .route("/health", get(health::readiness))
        .route("/actors", get(actors::list_actors).post(actors::create_actor))
        .route(
            "/actors/{actor_id}",
            patch(actors::update_actor).delete(actors::delete_actor),
        )
        .route("/movies", get(movies::list_movies).post(movies::create_movie))
        .route(
            "/movies/{movie_id}",
            patch(movies::update_movie).delete(movies::delete_movie),
        )
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state);

    let http_layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default();
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id());

    routes
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(http_layers)
        .layer(CorsLayer::permissive())
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// Unwrap a JSON body, mapping rejections onto the error envelope:
/// well-formed JSON of the wrong shape is 422, anything else is 400.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::JsonDataError(err)) => {
            debug!(error = %err.body_text(), "request body has the wrong shape");
            Err(ApiError::unprocessable())
        }
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "request body rejected");
            Err(ApiError::bad_request())
        }
    }
}

/// Record ids that do not parse name no record.
pub(crate) fn record_id(id: Result<Path<u64>, PathRejection>) -> Result<u64, ApiError> {
    id.map(|Path(id)| id).map_err(|_| ApiError::not_found())
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        health::readiness,
        actors::list_actors,
        actors::create_actor,
        actors::update_actor,
        actors::delete_actor,
        movies::list_movies,
        movies::create_movie,
        movies::update_movie,
        movies::delete_movie
    ),
    components(
        schemas(
            Actor,
            Movie,
            CreateActorRequest,
            UpdateActorRequest,
            CreateMovieRequest,
            UpdateMovieRequest,
            ActorListResponse,
            ActorResponse,
            MovieListResponse,
            MovieResponse,
            CreatedResponse,
            DeletedResponse,
            ErrorBody
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Actors", description = "Actor management"),
        (name = "Movies", description = "Movie management")
    )
)]
struct ApiDoc;
