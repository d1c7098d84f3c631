// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    Json,
};
use tracing::info;

use super::{json_body, record_id};
use crate::{
    auth::permissions::{DeleteMovies, GetMovies, PatchMovies, PostMovies},
    auth::Authorized,
    error::{ApiError, ErrorBody},
    models::{
        CreateMovieRequest, CreatedResponse, DeletedResponse, MovieListResponse, MovieResponse,
        UpdateMovieRequest,
    },
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/movies",
    tag = "Movies",
    security(("bearer" = ["get:movies"])),
    responses(
        (status = 200, body = MovieListResponse),
        (status = 401, body = ErrorBody),
        (status = 403, body = ErrorBody)
    )
)]
pub async fn list_movies(
    _auth: Authorized<GetMovies>,
    State(state): State<AppState>,
) -> Json<MovieListResponse> {
    let store = state.store.read().await;
    Json(MovieListResponse {
        success: true,
        movies: store.list_movies(),
    })
}

#[utoipa::path(
    post,
    path = "/movies",
    request_body = CreateMovieRequest,
    tag = "Movies",
    security(("bearer" = ["post:movies"])),
    responses(
        (status = 200, body = CreatedResponse),
        (status = 400, description = "Missing title or release date", body = ErrorBody),
        (status = 403, body = ErrorBody)
    )
)]
pub async fn create_movie(
    Authorized(claims, _): Authorized<PostMovies>,
    State(state): State<AppState>,
    body: Result<Json<CreateMovieRequest>, JsonRejection>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let CreateMovieRequest { title, release_date } = json_body(body)?;
    let (Some(title), Some(release_date)) = (title, release_date) else {
        return Err(ApiError::bad_request());
    };

    let movie = state.store.write().await.create_movie(title, release_date);
    info!(movie_id = movie.id, sub = claims.subject().unwrap_or_default(), "movie created");
    Ok(Json(CreatedResponse {
        success: true,
        created: movie.id,
    }))
}

#[utoipa::path(
    patch,
    path = "/movies/{movie_id}",
    params(("movie_id" = u64, Path, description = "Identifier of the movie to update")),
    request_body = UpdateMovieRequest,
    tag = "Movies",
    security(("bearer" = ["patch:movies"])),
    responses(
        (status = 200, body = MovieResponse),
        (status = 400, description = "Empty update", body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn update_movie(
    _auth: Authorized<PatchMovies>,
    State(state): State<AppState>,
    movie_id: Result<Path<u64>, PathRejection>,
    body: Result<Json<UpdateMovieRequest>, JsonRejection>,
) -> Result<Json<MovieResponse>, ApiError> {
    let movie_id = record_id(movie_id)?;
    let mut store = state.store.write().await;
    if !store.has_movie(movie_id) {
        return Err(ApiError::not_found());
    }

    let patch = json_body(body)?;
    if patch.is_empty() {
        return Err(ApiError::bad_request());
    }

    let movie = store.update_movie(movie_id, patch)?;
    Ok(Json(MovieResponse {
        success: true,
        movie,
    }))
}

#[utoipa::path(
    delete,
    path = "/movies/{movie_id}",
    params(("movie_id" = u64, Path, description = "Identifier of the movie to delete")),
    tag = "Movies",
    security(("bearer" = ["delete:movies"])),
    responses(
        (status = 200, body = DeletedResponse),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn delete_movie(
    Authorized(claims, _): Authorized<DeleteMovies>,
    State(state): State<AppState>,
    movie_id: Result<Path<u64>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let movie_id = record_id(movie_id)?;
    state.store.write().await.delete_movie(movie_id)?;
    info!(movie_id, sub = claims.subject().unwrap_or_default(), "movie deleted");
    Ok(Json(DeletedResponse {
        success: true,
        deleted: movie_id,
    }))
}
