//! Handlers for `/patients` endpoints.
//!
//! Patients are addressed by their `medical_insurance_id`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/patients` | Profile + `coordinates` + `parent_ids`; one transaction |
//! | `GET`    | `/patients/{insurance_id}` | Full record; optional `?as_of=<RFC 3339>` |
//! | `PUT`    | `/patients/{insurance_id}` | Partial profile; appends a version |
//! | `DELETE` | `/patients/{insurance_id}` | Hide |
//! | `GET`    | `/patients/{insurance_id}/version_history` | Timestamp → snapshot |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use medrec_core::{
  patch::UserPatch,
  record::NewCoordinate,
  store::RecordStore,
  user::{NewPatient, NewUser, UserType},
  view::{PatientRecord, VersionHistory},
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AsOfParams, error::ApiError, hidden_response, password::hash_password};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub medical_insurance_id: String,
  pub first_name:           String,
  pub last_name:            String,
  /// Patients may be registered without portal credentials.
  #[serde(default)]
  pub login:                String,
  pub password:             Option<String>,
  #[serde(default)]
  pub phone_number:         String,
  #[serde(default)]
  pub email:                String,
  pub gender:               Option<String>,
  pub city_of_birth:        Option<String>,
  pub date_of_birth:        Option<NaiveDate>,
  #[serde(default)]
  pub coordinates:          Vec<NewCoordinate>,
  #[serde(default)]
  pub parent_ids:           Vec<Uuid>,
}

/// `POST /patients`
pub async fn create<S: RecordStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let password_hash = match body.password.as_deref() {
    Some(p) => hash_password(p)?,
    None => String::new(),
  };
  let input = NewPatient {
    user:        NewUser {
      login: body.login,
      password_hash,
      user_type: UserType::Patient,
      first_name: body.first_name,
      last_name: body.last_name,
      phone_number: body.phone_number,
      email: body.email,
      medical_insurance_id: Some(body.medical_insurance_id),
      gender: body.gender,
      city_of_birth: body.city_of_birth,
      date_of_birth: body.date_of_birth,
    },
    coordinates: body.coordinates,
    parent_ids:  body.parent_ids,
  };
  let patient = store.create_patient(input).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(json!({ "user_id": patient.user_id }))))
}

/// `GET /patients/{insurance_id}[?as_of=<instant>]`
pub async fn get_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(insurance_id): Path<String>,
  Query(params): Query<AsOfParams>,
) -> Result<Json<PatientRecord>, ApiError> {
  let record = store
    .get_patient(insurance_id, params.as_of)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(record))
}

/// `PUT /patients/{insurance_id}`
pub async fn update<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(insurance_id): Path<String>,
  Json(patch): Json<UserPatch>,
) -> Result<impl IntoResponse, ApiError> {
  if patch.is_empty() {
    return Err(ApiError::BadRequest("no fields to update".into()));
  }
  let user = store
    .update_patient(insurance_id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `DELETE /patients/{insurance_id}`
pub async fn hide<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(insurance_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
  let hidden = store
    .hide_patient(insurance_id.clone())
    .await
    .map_err(ApiError::from_store)?;
  hidden_response(hidden, "patient", insurance_id)
}

/// `GET /patients/{insurance_id}/version_history`
pub async fn version_history<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(insurance_id): Path<String>,
) -> Result<Json<VersionHistory>, ApiError> {
  let history = store
    .patient_version_history(insurance_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(history))
}
