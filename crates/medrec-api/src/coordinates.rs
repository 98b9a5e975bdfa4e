//! Handlers for postal addresses.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/users/{user_id}/coordinates` | Optional `?as_of=<RFC 3339>` |
//! | `POST`   | `/users/{user_id}/coordinates` | 201 with the new coordinate |
//! | `PUT`    | `/coordinates/{coordinate_id}` | Partial; appends a version |
//! | `DELETE` | `/coordinates/{coordinate_id}` | Hide |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use medrec_core::{
  patch::CoordinatePatch,
  record::{Coordinate, NewCoordinate},
  store::RecordStore,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{AsOfParams, error::ApiError, hidden_response};

/// `GET /users/{user_id}/coordinates[?as_of=<instant>]`
pub async fn list<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(user_id): Path<Uuid>,
  Query(params): Query<AsOfParams>,
) -> Result<Json<Vec<Coordinate>>, ApiError> {
  let coordinates = store
    .get_coordinates(user_id, params.as_of)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(coordinates))
}

/// `POST /users/{user_id}/coordinates`
pub async fn create<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(user_id): Path<Uuid>,
  Json(body): Json<NewCoordinate>,
) -> Result<impl IntoResponse, ApiError> {
  let coordinate = store
    .add_coordinate(user_id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(coordinate)))
}

/// `PUT /coordinates/{coordinate_id}`
pub async fn update<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(coordinate_id): Path<Uuid>,
  Json(patch): Json<CoordinatePatch>,
) -> Result<impl IntoResponse, ApiError> {
  if patch.is_empty() {
    return Err(ApiError::BadRequest("no fields to update".into()));
  }
  let coordinate = store
    .update_coordinate(coordinate_id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(coordinate)))
}

/// `DELETE /coordinates/{coordinate_id}`
pub async fn hide<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(coordinate_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  let hidden = store
    .hide_coordinate(coordinate_id)
    .await
    .map_err(ApiError::from_store)?;
  hidden_response(hidden, "coordinate", coordinate_id)
}
