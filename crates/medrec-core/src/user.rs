//! Users, the root entity. Patients are users that carry a
//! `medical_insurance_id`; doctors and parents are users of the matching
//! [`UserType`].

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, record::NewCoordinate};

// ─── Role ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserType {
  #[serde(rename = "ADMIN")]
  Admin,
  #[serde(rename = "PATIENT")]
  Patient,
  #[serde(rename = "DOCTOR")]
  Doctor,
  #[serde(rename = "HEALTHCARE PROFESSIONAL")]
  HealthcareProfessional,
  #[serde(rename = "PARENT")]
  Parent,
}

impl UserType {
  /// The spelling stored in the `user_type` column; matches the serde names.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admin => "ADMIN",
      Self::Patient => "PATIENT",
      Self::Doctor => "DOCTOR",
      Self::HealthcareProfessional => "HEALTHCARE PROFESSIONAL",
      Self::Parent => "PARENT",
    }
  }
}

impl FromStr for UserType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "ADMIN" => Ok(Self::Admin),
      "PATIENT" => Ok(Self::Patient),
      "DOCTOR" => Ok(Self::Doctor),
      "HEALTHCARE PROFESSIONAL" => Ok(Self::HealthcareProfessional),
      "PARENT" => Ok(Self::Parent),
      other => Err(Error::UnknownUserType(other.to_owned())),
    }
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// One version of a user as stored. Every version of the same user shares
/// `user_id` and `created_at`; `modified_at` identifies the version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub user_id:              Uuid,
  pub medical_insurance_id: Option<String>,
  pub login:                String,
  /// PHC string; never leaves the process.
  #[serde(skip)]
  pub password_hash:        String,
  pub user_type:            UserType,
  pub first_name:           String,
  pub last_name:            String,
  pub phone_number:         String,
  pub email:                String,
  pub gender:               Option<String>,
  pub city_of_birth:        Option<String>,
  pub date_of_birth:        Option<NaiveDate>,
  pub created_at:           DateTime<Utc>,
  pub modified_at:          DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::RecordStore::create_user`]. The password must
/// already be hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub login:                String,
  pub password_hash:        String,
  pub user_type:            UserType,
  pub first_name:           String,
  pub last_name:            String,
  pub phone_number:         String,
  pub email:                String,
  pub medical_insurance_id: Option<String>,
  pub gender:               Option<String>,
  pub city_of_birth:        Option<String>,
  pub date_of_birth:        Option<NaiveDate>,
}

impl NewUser {
  /// A user with only the mandatory identity fields set.
  pub fn new(
    login: impl Into<String>,
    user_type: UserType,
    first_name: impl Into<String>,
    last_name: impl Into<String>,
  ) -> Self {
    Self {
      login: login.into(),
      password_hash: String::new(),
      user_type,
      first_name: first_name.into(),
      last_name: last_name.into(),
      phone_number: String::new(),
      email: String::new(),
      medical_insurance_id: None,
      gender: None,
      city_of_birth: None,
      date_of_birth: None,
    }
  }
}

/// Input to [`crate::store::RecordStore::create_patient`]: the patient's
/// user row, their addresses and links to existing parent users, all
/// written in one transaction.
#[derive(Debug, Clone)]
pub struct NewPatient {
  pub user:        NewUser,
  pub coordinates: Vec<NewCoordinate>,
  pub parent_ids:  Vec<Uuid>,
}

/// A parent created on the fly for a child (no login credentials).
#[derive(Debug, Clone, Deserialize)]
pub struct NewParent {
  pub first_name:   String,
  pub last_name:    String,
  pub phone_number: String,
  pub email:        String,
  pub gender:       Option<String>,
}

impl From<NewParent> for NewUser {
  fn from(p: NewParent) -> Self {
    NewUser {
      phone_number: p.phone_number,
      email: p.email,
      gender: p.gender,
      ..NewUser::new("", UserType::Parent, p.first_name, p.last_name)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn user_type_round_trips_through_column_spelling() {
    for ty in [
      UserType::Admin,
      UserType::Patient,
      UserType::Doctor,
      UserType::HealthcareProfessional,
      UserType::Parent,
    ] {
      assert_eq!(ty.as_str().parse::<UserType>().unwrap(), ty);
      let json = serde_json::to_string(&ty).unwrap();
      assert_eq!(json, format!("\"{}\"", ty.as_str()));
    }
  }

  #[test]
  fn unknown_user_type_is_rejected() {
    let err = "NURSE".parse::<UserType>().unwrap_err();
    assert!(matches!(err, Error::UnknownUserType(ref s) if s == "NURSE"));
  }

  #[test]
  fn new_parent_becomes_parent_user_without_login() {
    let user = NewUser::from(NewParent {
      first_name:   "Alice".into(),
      last_name:    "Johnson".into(),
      phone_number: "123-456-7890".into(),
      email:        "alice@email.com".into(),
      gender:       None,
    });
    assert_eq!(user.user_type, UserType::Parent);
    assert!(user.login.is_empty());
    assert_eq!(user.email, "alice@email.com");
  }
}
