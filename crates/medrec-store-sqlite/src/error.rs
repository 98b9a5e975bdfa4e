//! Error type for `medrec-store-sqlite`.

use medrec_core::{EntityKind, ErrorKind, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] medrec_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The logical id has no visible version.
  #[error("{kind} not found: {id}")]
  NotFound { kind: EntityKind, id: String },

  /// A write referenced an entity that does not currently exist.
  #[error("invalid reference: {kind} {id} does not exist")]
  ForeignKeyViolation { kind: EntityKind, id: String },

  #[error("validation error: {0}")]
  Validation(String),
}

impl Error {
  pub(crate) fn not_found(kind: EntityKind, id: impl ToString) -> Self {
    Self::NotFound { kind, id: id.to_string() }
  }

  pub(crate) fn missing_reference(kind: EntityKind, id: impl ToString) -> Self {
    Self::ForeignKeyViolation { kind, id: id.to_string() }
  }
}

fn is_foreign_key_failure(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
  )
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Core(e) => e.kind(),
      Self::NotFound { .. } => ErrorKind::NotFound,
      Self::ForeignKeyViolation { .. } => ErrorKind::ForeignKeyViolation,
      Self::Validation(_) => ErrorKind::Validation,
      Self::Sqlite(e) | Self::Database(tokio_rusqlite::Error::Rusqlite(e))
        if is_foreign_key_failure(e) =>
      {
        ErrorKind::ForeignKeyViolation
      }
      _ => ErrorKind::Storage,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
