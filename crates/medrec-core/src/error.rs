//! Error types for `medrec-core`.

use std::fmt;

use thiserror::Error;

/// The kind of entity an operation addressed; used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
  User,
  Patient,
  Coordinate,
  MedicalHistory,
  MedicalVisit,
  Establishment,
  ParentLink,
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::User => "user",
      Self::Patient => "patient",
      Self::Coordinate => "coordinate",
      Self::MedicalHistory => "medical history entry",
      Self::MedicalVisit => "medical visit",
      Self::Establishment => "establishment",
      Self::ParentLink => "parent link",
    })
  }
}

/// Caller-inspectable classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The logical id is absent, or every version is hidden or filtered out.
  NotFound,
  /// A referenced entity did not exist at write time.
  ForeignKeyViolation,
  /// Caller-supplied input was malformed.
  Validation,
  /// Anything else the storage engine reported.
  Storage,
}

/// Implemented by every [`crate::store::RecordStore`] error type so that
/// higher layers can map failures without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

/// Failures raised by the core types themselves.
#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown user type: {0:?}")]
  UnknownUserType(String),
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::UnknownUserType(_) => ErrorKind::Validation,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
