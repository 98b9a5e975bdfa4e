//! Assembled read models.
//!
//! Rows selected by the store are joined in memory with the identity of the
//! entities they reference. References always resolve against the *current*
//! row of the referenced entity, not its row at the snapshot time, so a
//! doctor's displayed name follows their latest profile.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  record::{Coordinate, Establishment, MedicalHistory, MedicalVisit},
  user::{User, UserType},
};

/// The subset of a doctor's profile shown next to their records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorIdentity {
  pub user_id:    Uuid,
  pub login:      String,
  pub user_type:  UserType,
  pub first_name: String,
  pub last_name:  String,
}

impl From<&User> for DoctorIdentity {
  fn from(u: &User) -> Self {
    Self {
      user_id:    u.user_id,
      login:      u.login.clone(),
      user_type:  u.user_type,
      first_name: u.first_name.clone(),
      last_name:  u.last_name.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
  #[serde(flatten)]
  pub entry:  MedicalHistory,
  /// `None` when the referenced doctor no longer resolves.
  pub doctor: Option<DoctorIdentity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitView {
  #[serde(flatten)]
  pub visit:         MedicalVisit,
  pub doctor:        Option<DoctorIdentity>,
  pub establishment: Option<Establishment>,
}

/// A parent link with the parent's current profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParentView {
  pub parent_id: Uuid,
  pub linked_at: DateTime<Utc>,
  pub parent:    Option<User>,
}

/// A patient and everything attached to them, either current or as of a
/// point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRecord {
  #[serde(flatten)]
  pub patient:         User,
  pub coordinates:     Vec<Coordinate>,
  pub medical_history: Vec<HistoryView>,
  pub medical_visits:  Vec<VisitView>,
  pub parents:         Vec<ParentView>,
  /// The instant this record was reconstructed at; `None` for current state.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub as_of:           Option<DateTime<Utc>>,
}

/// Snapshots keyed by the RFC 3339 timestamp they were reconstructed at.
/// Keys share one fixed-width format, so map order is chronological.
pub type VersionHistory = BTreeMap<String, PatientRecord>;
