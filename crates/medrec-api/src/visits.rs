//! Handlers for medical visits.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/patients/{insurance_id}/visits` | Optional `?as_of=<RFC 3339>` |
//! | `POST`   | `/patients/{insurance_id}/visits` | Doctor and establishment by id or by name |
//! | `PUT`    | `/visits/{visit_id}` | Partial; appends a version |
//! | `DELETE` | `/visits/{visit_id}` | Hide |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use medrec_core::{
  patch::VisitPatch,
  record::NewVisit,
  store::RecordStore,
  view::VisitView,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
  AsOfParams,
  directory::{DoctorRef, EstablishmentRef},
  error::ApiError,
  hidden_response,
};

/// `GET /patients/{insurance_id}/visits[?as_of=<instant>]`
pub async fn list<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(insurance_id): Path<String>,
  Query(params): Query<AsOfParams>,
) -> Result<Json<Vec<VisitView>>, ApiError> {
  let visits = store
    .get_visits(insurance_id, params.as_of)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(visits))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(flatten)]
  pub establishment: EstablishmentRef,
  #[serde(flatten)]
  pub doctor:        DoctorRef,
  pub visit_date:    Option<DateTime<Utc>>,
  pub diagnostic:    Option<String>,
  pub treatment:     Option<String>,
  pub summary:       String,
  pub notes:         Option<String>,
}

/// `POST /patients/{insurance_id}/visits`
pub async fn create<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(insurance_id): Path<String>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let establishment_id = body.establishment.resolve(store.as_ref()).await?;
  let doctor_id = body.doctor.resolve(store.as_ref()).await?;
  let input = NewVisit {
    establishment_id,
    doctor_id,
    visit_date: body.visit_date,
    diagnostic: body.diagnostic,
    treatment: body.treatment,
    summary: body.summary,
    notes: body.notes,
  };
  let visit = store
    .add_visit(insurance_id, input)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(visit)))
}

/// `PUT /visits/{visit_id}`
pub async fn update<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(visit_id): Path<Uuid>,
  Json(patch): Json<VisitPatch>,
) -> Result<impl IntoResponse, ApiError> {
  if patch.is_empty() {
    return Err(ApiError::BadRequest("no fields to update".into()));
  }
  let visit = store
    .update_visit(visit_id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(visit)))
}

/// `DELETE /visits/{visit_id}`
pub async fn hide<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(visit_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  let hidden = store
    .hide_visit(visit_id)
    .await
    .map_err(ApiError::from_store)?;
  hidden_response(hidden, "medical visit", visit_id)
}
