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
    auth::permissions::{DeleteActors, GetActors, PatchActors, PostActors},
    auth::Authorized,
    error::{ApiError, ErrorBody},
    models::{
        ActorListResponse, ActorResponse, CreateActorRequest, CreatedResponse, DeletedResponse,
        UpdateActorRequest,
    },
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/actors",
    tag = "Actors",
    security(("bearer" = ["get:actors"])),
    responses(
        (status = 200, body = ActorListResponse),
        (status = 401, body = ErrorBody),
        (status = 403, body = ErrorBody)
    )
)]
pub async fn list_actors(
    _auth: Authorized<GetActors>,
    State(state): State<AppState>,
) -> Json<ActorListResponse> {
    let store = state.store.read().await;
    Json(ActorListResponse {
        success: true,
        actors: store.list_actors(),
    })
}

#[utoipa::path(
    post,
    path = "/actors",
    request_body = CreateActorRequest,
    tag = "Actors",
    security(("bearer" = ["post:actors"])),
    responses(
        (status = 200, body = CreatedResponse),
        (status = 400, description = "Missing name, age or gender", body = ErrorBody),
        (status = 403, body = ErrorBody)
    )
)]
pub async fn create_actor(
    Authorized(claims, _): Authorized<PostActors>,
    State(state): State<AppState>,
    body: Result<Json<CreateActorRequest>, JsonRejection>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let CreateActorRequest { name, age, gender } = json_body(body)?;
    let (Some(name), Some(age), Some(gender)) = (name, age, gender) else {
        return Err(ApiError::bad_request());
    };

    let actor = state.store.write().await.create_actor(name, age, gender);
    info!(actor_id = actor.id, sub = claims.subject().unwrap_or_default(), "actor created");
    Ok(Json(CreatedResponse {
        success: true,
        created: actor.id,
    }))
}

#[utoipa::path(
    patch,
    path = "/actors/{actor_id}",
    params(("actor_id" = u64, Path, description = "Identifier of the actor to update")),
    request_body = UpdateActorRequest,
    tag = "Actors",
    security(("bearer" = ["patch:actors"])),
    responses(
        (status = 200, body = ActorResponse),
        (status = 400, description = "Empty update", body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn update_actor(
    _auth: Authorized<PatchActors>,
    State(state): State<AppState>,
    actor_id: Result<Path<u64>, PathRejection>,
    body: Result<Json<UpdateActorRequest>, JsonRejection>,
) -> Result<Json<ActorResponse>, ApiError> {
    let actor_id = record_id(actor_id)?;
    let mut store = state.store.write().await;
    // Unknown ids are reported before body problems.
    if !store.has_actor(actor_id) {
        return Err(ApiError::not_found());
    }

    let patch = json_body(body)?;
    if patch.is_empty() {
        return Err(ApiError::bad_request());
    }

    let actor = store.update_actor(actor_id, patch)?;
    Ok(Json(ActorResponse {
        success: true,
        actor,
    }))
}

#[utoipa::path(
    delete,
    path = "/actors/{actor_id}",
    params(("actor_id" = u64, Path, description = "Identifier of the actor to delete")),
    tag = "Actors",
    security(("bearer" = ["delete:actors"])),
    responses(
        (status = 200, body = DeletedResponse),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn delete_actor(
    Authorized(claims, _): Authorized<DeleteActors>,
    State(state): State<AppState>,
    actor_id: Result<Path<u64>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let actor_id = record_id(actor_id)?;
    state.store.write().await.delete_actor(actor_id)?;
    info!(actor_id, sub = claims.subject().unwrap_or_default(), "actor deleted");
    Ok(Json(DeletedResponse {
        success: true,
        deleted: actor_id,
    }))
}
