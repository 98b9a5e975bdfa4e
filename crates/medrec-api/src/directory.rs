//! Doctors and establishments, plus the by-id-or-by-name resolution used
//! when recording history entries and visits.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/doctors` | Current `DOCTOR` users |
//! | `GET`    | `/establishments` | Non-hidden, by name |
//! | `POST`   | `/establishments` | Body: `{"establishment_name": "..."}` |
//! | `DELETE` | `/establishments/{establishment_id}` | Hide |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use medrec_core::{record::Establishment, store::RecordStore, view::DoctorIdentity};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{error::ApiError, hidden_response};

// ─── Doctors ─────────────────────────────────────────────────────────────────

/// `GET /doctors`
pub async fn list_doctors<S: RecordStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<DoctorIdentity>>, ApiError> {
  let doctors = store.list_doctors().await.map_err(ApiError::from_store)?;
  Ok(Json(doctors))
}

/// A doctor given either by id or by full name.
#[derive(Debug, Default, Deserialize)]
pub struct DoctorRef {
  pub doctor_id:         Option<Uuid>,
  pub doctor_first_name: Option<String>,
  pub doctor_last_name:  Option<String>,
}

impl DoctorRef {
  /// The referenced doctor's id. An explicit id is passed through; the
  /// store rejects it later if it does not exist.
  pub async fn resolve<S: RecordStore>(self, store: &S) -> Result<Uuid, ApiError> {
    if let Some(id) = self.doctor_id {
      return Ok(id);
    }
    let (Some(first), Some(last)) = (self.doctor_first_name, self.doctor_last_name) else {
      return Err(ApiError::BadRequest(
        "either doctor_id or doctor_first_name and doctor_last_name are required".into(),
      ));
    };
    store
      .find_doctor_by_name(first.clone(), last.clone())
      .await
      .map_err(ApiError::from_store)?
      .ok_or_else(|| ApiError::BadRequest(format!("no doctor named {first} {last}")))
  }
}

// ─── Establishments ──────────────────────────────────────────────────────────

/// An establishment given either by id or by name.
#[derive(Debug, Default, Deserialize)]
pub struct EstablishmentRef {
  pub establishment_id:   Option<Uuid>,
  pub establishment_name: Option<String>,
}

impl EstablishmentRef {
  pub async fn resolve<S: RecordStore>(self, store: &S) -> Result<Uuid, ApiError> {
    if let Some(id) = self.establishment_id {
      return Ok(id);
    }
    let Some(name) = self.establishment_name else {
      return Err(ApiError::BadRequest(
        "either establishment_id or establishment_name is required".into(),
      ));
    };
    store
      .find_establishment_by_name(name.clone())
      .await
      .map_err(ApiError::from_store)?
      .ok_or_else(|| ApiError::BadRequest(format!("no establishment named {name}")))
  }
}

/// `GET /establishments`
pub async fn list_establishments<S: RecordStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Establishment>>, ApiError> {
  let establishments = store.list_establishments().await.map_err(ApiError::from_store)?;
  Ok(Json(establishments))
}

#[derive(Debug, Deserialize)]
pub struct CreateEstablishmentBody {
  pub establishment_name: String,
}

/// `POST /establishments`
pub async fn create_establishment<S: RecordStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateEstablishmentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let establishment = store
    .create_establishment(body.establishment_name)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(establishment)))
}

/// `DELETE /establishments/{establishment_id}`
pub async fn hide_establishment<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(establishment_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  let hidden = store
    .hide_establishment(establishment_id)
    .await
    .map_err(ApiError::from_store)?;
  hidden_response(hidden, "establishment", establishment_id)
}
