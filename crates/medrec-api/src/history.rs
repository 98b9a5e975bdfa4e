//! Handlers for medical history entries.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/patients/{insurance_id}/history` | Optional `?as_of=<RFC 3339>` |
//! | `POST`   | `/patients/{insurance_id}/history` | Doctor by `doctor_id` or by name |
//! | `PUT`    | `/history/{history_id}` | Partial; appends a version |
//! | `DELETE` | `/history/{history_id}` | Hide |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use medrec_core::{
  patch::HistoryPatch,
  record::NewHistory,
  store::RecordStore,
  view::HistoryView,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{AsOfParams, directory::DoctorRef, error::ApiError, hidden_response};

/// `GET /patients/{insurance_id}/history[?as_of=<instant>]`
pub async fn list<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(insurance_id): Path<String>,
  Query(params): Query<AsOfParams>,
) -> Result<Json<Vec<HistoryView>>, ApiError> {
  let entries = store
    .get_history(insurance_id, params.as_of)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub diagnostic: String,
  pub treatment:  String,
  #[serde(flatten)]
  pub doctor:     DoctorRef,
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
}

/// `POST /patients/{insurance_id}/history`
pub async fn create<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(insurance_id): Path<String>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let doctor_id = body.doctor.resolve(store.as_ref()).await?;
  let input = NewHistory {
    diagnostic: body.diagnostic,
    treatment: body.treatment,
    doctor_id,
    start_date: body.start_date,
    end_date: body.end_date,
  };
  let entry = store
    .add_history(insurance_id, input)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(entry)))
}

/// `PUT /history/{history_id}`
pub async fn update<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(history_id): Path<Uuid>,
  Json(patch): Json<HistoryPatch>,
) -> Result<impl IntoResponse, ApiError> {
  if patch.is_empty() {
    return Err(ApiError::BadRequest("no fields to update".into()));
  }
  let entry = store
    .update_history(history_id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(entry)))
}

/// `DELETE /history/{history_id}`
pub async fn hide<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(history_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  let hidden = store
    .hide_history(history_id)
    .await
    .map_err(ApiError::from_store)?;
  hidden_response(hidden, "medical history entry", history_id)
}
