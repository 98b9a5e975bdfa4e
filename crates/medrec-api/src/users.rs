//! Handlers for `/users` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/users` | Body: profile + `password`; 201 `{"user_id"}` |
//! | `GET`    | `/users/{user_id}` | Optional `?as_of=<RFC 3339>` |
//! | `PUT`    | `/users/{user_id}` | Partial profile; appends a version |
//! | `DELETE` | `/users/{user_id}` | Hide |
//! | `PUT`    | `/users/{user_id}/credentials` | `{"login"?, "password"?}` |
//! | `PUT`    | `/users/{user_id}/coordinates/email-phone` | `{"email"?, "phone_number"?}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use medrec_core::{
  Patch,
  patch::UserPatch,
  store::RecordStore,
  user::{NewUser, User, UserType},
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AsOfParams, error::ApiError, hidden_response, password::hash_password};

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub login:                String,
  pub password:             String,
  pub user_type:            UserType,
  pub first_name:           String,
  pub last_name:            String,
  #[serde(default)]
  pub phone_number:         String,
  #[serde(default)]
  pub email:                String,
  pub medical_insurance_id: Option<String>,
  pub gender:               Option<String>,
  pub city_of_birth:        Option<String>,
  pub date_of_birth:        Option<NaiveDate>,
}

/// `POST /users`
pub async fn create<S: RecordStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewUser {
    login:                body.login,
    password_hash:        hash_password(&body.password)?,
    user_type:            body.user_type,
    first_name:           body.first_name,
    last_name:            body.last_name,
    phone_number:         body.phone_number,
    email:                body.email,
    medical_insurance_id: body.medical_insurance_id,
    gender:               body.gender,
    city_of_birth:        body.city_of_birth,
    date_of_birth:        body.date_of_birth,
  };
  let user = store.create_user(input).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(json!({ "user_id": user.user_id }))))
}

// ─── Read ────────────────────────────────────────────────────────────────────

/// `GET /users/{user_id}[?as_of=<instant>]`
pub async fn get_one<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(user_id): Path<Uuid>,
  Query(params): Query<AsOfParams>,
) -> Result<Json<User>, ApiError> {
  let user = store
    .get_user(user_id, params.as_of)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(user))
}

// ─── Update ──────────────────────────────────────────────────────────────────

async fn append<S: RecordStore>(
  store: &S,
  user_id: Uuid,
  patch: UserPatch,
) -> Result<(StatusCode, Json<User>), ApiError> {
  if patch.is_empty() {
    return Err(ApiError::BadRequest("no fields to update".into()));
  }
  let user = store
    .update_user(user_id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `PUT /users/{user_id}`
pub async fn update<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(user_id): Path<Uuid>,
  Json(patch): Json<UserPatch>,
) -> Result<impl IntoResponse, ApiError> {
  append(store.as_ref(), user_id, patch).await
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsBody {
  pub login:    Option<String>,
  pub password: Option<String>,
}

/// `PUT /users/{user_id}/credentials`
pub async fn update_credentials<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(user_id): Path<Uuid>,
  Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse, ApiError> {
  let mut patch = UserPatch::default();
  if let Some(login) = body.login {
    patch.login = Patch::Set(login);
  }
  if let Some(password) = body.password {
    patch.password_hash = Patch::Set(hash_password(&password)?);
  }
  append(store.as_ref(), user_id, patch).await
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailPhoneBody {
  pub email:        Option<String>,
  pub phone_number: Option<String>,
}

/// `PUT /users/{user_id}/coordinates/email-phone`
pub async fn update_email_phone<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(user_id): Path<Uuid>,
  Json(body): Json<EmailPhoneBody>,
) -> Result<impl IntoResponse, ApiError> {
  let patch = UserPatch {
    email: body.email.map_or(Patch::Unchanged, Patch::Set),
    phone_number: body.phone_number.map_or(Patch::Unchanged, Patch::Set),
    ..Default::default()
  };
  append(store.as_ref(), user_id, patch).await
}

// ─── Hide ────────────────────────────────────────────────────────────────────

/// `DELETE /users/{user_id}`
pub async fn hide<S: RecordStore>(
  State(store): State<Arc<S>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  let hidden = store.hide_user(user_id).await.map_err(ApiError::from_store)?;
  hidden_response(hidden, "user", user_id)
}
