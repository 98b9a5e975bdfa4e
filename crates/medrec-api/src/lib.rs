//! JSON REST API for medrec.
//!
//! Exposes an axum [`Router`] backed by any [`medrec_core::store::RecordStore`].
//! Authentication and TLS are the caller's responsibility: wrap the router
//! in whatever layers the deployment needs.
//!
//! Every read endpoint accepts `?as_of=<RFC 3339 instant>` and returns the
//! state as it was at that instant. A query string decodes `+` to a space,
//! so send a `Z` offset or percent-encode the sign as `%2B`.
//!
//! Updates append a version and answer `201 Created`; hides answer
//! `{"status": "success"}` or 404.

pub mod coordinates;
pub mod directory;
pub mod error;
pub mod history;
pub mod parents;
pub mod password;
pub mod patients;
pub mod users;
pub mod visits;

use std::{fmt::Display, path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  routing::{delete, get, post, put},
};
use chrono::{DateTime, Utc};
use medrec_core::store::RecordStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Server settings read from `config.toml` and `MEDREC_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub database_path: PathBuf,
}

// ─── Shared extractors ───────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AsOfParams {
  pub as_of: Option<DateTime<Utc>>,
}

/// The body of a successful hide, or a 404 when nothing was hidden.
pub(crate) fn hidden_response(
  hidden: bool,
  what: &str,
  id: impl Display,
) -> Result<Json<Value>, ApiError> {
  if hidden {
    Ok(Json(json!({ "status": "success" })))
  } else {
    Err(ApiError::NotFound(format!("{what} not found: {id}")))
  }
}

async fn health() -> Json<Value> {
  Json(json!({ "status": "ok" }))
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `store`.
pub fn router<S>(store: Arc<S>) -> Router<()>
where
  S: RecordStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Patients
    .route("/patients", post(patients::create::<S>))
    .route(
      "/patients/{insurance_id}",
      get(patients::get_one::<S>)
        .put(patients::update::<S>)
        .delete(patients::hide::<S>),
    )
    .route(
      "/patients/{insurance_id}/version_history",
      get(patients::version_history::<S>),
    )
    .route(
      "/patients/{insurance_id}/history",
      get(history::list::<S>).post(history::create::<S>),
    )
    .route(
      "/patients/{insurance_id}/visits",
      get(visits::list::<S>).post(visits::create::<S>),
    )
    // Users
    .route("/users", post(users::create::<S>))
    .route(
      "/users/{user_id}",
      get(users::get_one::<S>)
        .put(users::update::<S>)
        .delete(users::hide::<S>),
    )
    .route("/users/{user_id}/credentials", put(users::update_credentials::<S>))
    .route(
      "/users/{user_id}/coordinates/email-phone",
      put(users::update_email_phone::<S>),
    )
    .route(
      "/users/{user_id}/coordinates",
      get(coordinates::list::<S>).post(coordinates::create::<S>),
    )
    .route(
      "/users/{user_id}/parents",
      get(parents::list::<S>).post(parents::create::<S>),
    )
    .route(
      "/users/{user_id}/parents/{parent_id}",
      post(parents::link::<S>).delete(parents::unlink::<S>),
    )
    // Versioned children
    .route(
      "/coordinates/{coordinate_id}",
      put(coordinates::update::<S>).delete(coordinates::hide::<S>),
    )
    .route(
      "/history/{history_id}",
      put(history::update::<S>).delete(history::hide::<S>),
    )
    .route(
      "/visits/{visit_id}",
      put(visits::update::<S>).delete(visits::hide::<S>),
    )
    // Directory
    .route("/doctors", get(directory::list_doctors::<S>))
    .route(
      "/establishments",
      get(directory::list_establishments::<S>).post(directory::create_establishment::<S>),
    )
    .route(
      "/establishments/{establishment_id}",
      delete(directory::hide_establishment::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(store)
}
