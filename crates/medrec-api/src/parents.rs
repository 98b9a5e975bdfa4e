//! Handlers for parent links.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/users/{user_id}/parents` | Optional `?as_of=<RFC 3339>` |
//! | `POST`   | `/users/{user_id}/parents` | Creates a `PARENT` user and links it |
//! | `POST`   | `/users/{user_id}/parents/{parent_id}` | Link an existing user |
//! | `DELETE` | `/users/{user_id}/parents/{parent_id}` | Unlink |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use medrec_core::{store::RecordStore, user::NewParent, view::ParentView};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AsOfParams, error::ApiError};

/// `GET /users/{user_id}/parents[?as_of=<instant>]`
pub async fn list<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(child_id): Path<Uuid>,
  Query(params): Query<AsOfParams>,
) -> Result<Json<Vec<ParentView>>, ApiError> {
  let parents = store
    .get_parents(child_id, params.as_of)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(parents))
}

/// `POST /users/{user_id}/parents`
pub async fn create<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(child_id): Path<Uuid>,
  Json(body): Json<NewParent>,
) -> Result<impl IntoResponse, ApiError> {
  let parent = store
    .add_new_parent(child_id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(json!({ "user_id": parent.user_id }))))
}

/// `POST /users/{user_id}/parents/{parent_id}`
pub async fn link<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path((child_id, parent_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
  let link = store
    .link_parent(child_id, parent_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(link)))
}

/// `DELETE /users/{user_id}/parents/{parent_id}`
pub async fn unlink<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path((child_id, parent_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
  let unlinked = store
    .unlink_parent(child_id, parent_id)
    .await
    .map_err(ApiError::from_store)?;
  if unlinked {
    Ok(Json(json!({ "status": "success" })))
  } else {
    Err(ApiError::NotFound(format!("{parent_id} is not a parent of {child_id}")))
  }
}
