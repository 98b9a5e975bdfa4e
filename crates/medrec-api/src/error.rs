//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use medrec_core::{ErrorKind, StoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store failure by its [`ErrorKind`].
  pub fn from_store<E: StoreError>(e: E) -> Self {
    match e.kind() {
      ErrorKind::NotFound => Self::NotFound(e.to_string()),
      ErrorKind::ForeignKeyViolation | ErrorKind::Validation => {
        Self::BadRequest(e.to_string())
      }
      ErrorKind::Storage => Self::Store(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use medrec_core::EntityKind;
  use medrec_store_sqlite::Error;

  #[test]
  fn store_kinds_map_to_statuses() {
    let cases = [
      (
        Error::NotFound { kind: EntityKind::Patient, id: "INS1".into() },
        StatusCode::NOT_FOUND,
      ),
      (
        Error::ForeignKeyViolation { kind: EntityKind::User, id: "x".into() },
        StatusCode::BAD_REQUEST,
      ),
      (Error::Validation("bad".into()), StatusCode::BAD_REQUEST),
      (
        Error::Core(medrec_core::Error::UnknownUserType("NURSE".into())),
        StatusCode::BAD_REQUEST,
      ),
      (Error::DateParse("not a date".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from_store(err).into_response().status(), status);
    }
  }

  #[test]
  fn error_body_is_json() {
    let resp = ApiError::NotFound("patient not found: INS1".into()).into_response();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
      resp.headers()[axum::http::header::CONTENT_TYPE],
      "application/json"
    );
  }
}
