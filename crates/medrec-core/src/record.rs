//! Records attached to a user or patient: addresses, medical history,
//! visits, establishments and parent links.
//!
//! Coordinates, history entries and visits are versioned exactly like
//! users: an update never touches a stored row, it appends a new row with the
//! same logical id. History and visits are attached to a patient through
//! the patient's `medical_insurance_id`, which outlives user-row churn.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Coordinate ──────────────────────────────────────────────────────────────

/// A postal address owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
  pub coordinate_id:  Uuid,
  pub user_id:        Uuid,
  pub street_address: String,
  pub apartment:      Option<String>,
  pub postal_code:    String,
  pub city:           String,
  pub country:        String,
  pub created_at:     DateTime<Utc>,
  pub modified_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCoordinate {
  pub street_address: String,
  pub apartment:      Option<String>,
  pub postal_code:    String,
  pub city:           String,
  pub country:        String,
}

// ─── Medical history ─────────────────────────────────────────────────────────

/// A diagnosis/treatment record for a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalHistory {
  pub history_id:  Uuid,
  /// The patient's `medical_insurance_id`.
  pub patient_id:  String,
  pub diagnostic:  String,
  pub treatment:   String,
  pub doctor_id:   Uuid,
  pub start_date:  Option<NaiveDate>,
  pub end_date:    Option<NaiveDate>,
  pub created_at:  DateTime<Utc>,
  pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHistory {
  pub diagnostic: String,
  pub treatment:  String,
  pub doctor_id:  Uuid,
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
}

// ─── Medical visit ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalVisit {
  pub visit_id:         Uuid,
  /// The patient's `medical_insurance_id`.
  pub patient_id:       String,
  pub establishment_id: Uuid,
  pub doctor_id:        Uuid,
  pub visit_date:       Option<DateTime<Utc>>,
  pub diagnostic:       Option<String>,
  pub treatment:        Option<String>,
  pub summary:          String,
  pub notes:            Option<String>,
  pub created_at:       DateTime<Utc>,
  pub modified_at:      DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVisit {
  pub establishment_id: Uuid,
  pub doctor_id:        Uuid,
  pub visit_date:       Option<DateTime<Utc>>,
  pub diagnostic:       Option<String>,
  pub treatment:        Option<String>,
  pub summary:          String,
  pub notes:            Option<String>,
}

// ─── Establishment ───────────────────────────────────────────────────────────

/// A care establishment. Never versioned by append; only hidden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Establishment {
  pub establishment_id:   Uuid,
  pub establishment_name: String,
  pub created_at:         DateTime<Utc>,
}

// ─── Parent link ─────────────────────────────────────────────────────────────

/// A (parent, child) association between two users. Links have no fields
/// to edit: they are created and hidden, nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentLink {
  pub parent_id: Uuid,
  pub child_id:  Uuid,
  pub linked_at: DateTime<Utc>,
}
