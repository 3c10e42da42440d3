use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use tracing::instrument;
use uuid::Uuid;

use super::types::{ChirpResponse, CreateChirpRequest, ListChirpsQuery, SortOrder};
use crate::{
    auth::AuthContext,
    shared::{AppError, AppState},
};

/// POST /api/chirps (behind `jwt_auth`)
#[instrument(name = "create_chirp", skip(state, context, payload))]
pub async fn create_chirp(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    payload: Result<Json<CreateChirpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ChirpResponse>), AppError> {
    let Json(request) = payload?;
    let chirp = state.chirp_service.create(&context, &request.body).await?;
    Ok((StatusCode::CREATED, Json(chirp.into())))
}

/// GET /api/chirps?author_id=<uuid>&sort=asc|desc
#[instrument(name = "list_chirps", skip(state))]
pub async fn list_chirps(
    State(state): State<AppState>,
    Query(query): Query<ListChirpsQuery>,
) -> Result<Json<Vec<ChirpResponse>>, AppError> {
    let author = query
        .author_id
        .as_deref()
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|_| AppError::BadRequest("Invalid author_id".to_string()))?;

    let chirps = state
        .chirp_service
        .list(author, SortOrder::parse(query.sort.as_deref()))
        .await?;
    Ok(Json(chirps.into_iter().map(ChirpResponse::from).collect()))
}

/// GET /api/chirps/:chirp_id
#[instrument(name = "get_chirp", skip(state, chirp_id))]
pub async fn get_chirp(
    State(state): State<AppState>,
    chirp_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ChirpResponse>, AppError> {
    let Path(chirp_id) = chirp_id?;
    let chirp = state.chirp_service.get(chirp_id).await?;
    Ok(Json(chirp.into()))
}

/// DELETE /api/chirps/:chirp_id (behind `jwt_auth`)
#[instrument(name = "delete_chirp", skip(state, context, chirp_id))]
pub async fn delete_chirp(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    chirp_id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(chirp_id) = chirp_id?;
    state.chirp_service.delete(&context, chirp_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
