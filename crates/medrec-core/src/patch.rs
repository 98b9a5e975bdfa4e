//! Partial updates.
//!
//! Each field of a `*Patch` is a [`Patch`]: either left [`Patch::Unchanged`]
//! or [`Patch::Set`] to a new value. For nullable fields the new value is an
//! `Option`, so "clear this field" (`Set(None)`) is distinct from "don't
//! touch it". An empty string is an ordinary value.
//!
//! In JSON an absent field is `Unchanged`; a present field is `Set`, and an
//! explicit `null` on a nullable field is `Set(None)`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::{
  record::{Coordinate, MedicalHistory, MedicalVisit},
  user::User,
};

// ─── Patch<T> ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
  Unchanged,
  Set(T),
}

impl<T> Default for Patch<T> {
  fn default() -> Self { Self::Unchanged }
}

impl<T> From<T> for Patch<T> {
  fn from(value: T) -> Self { Self::Set(value) }
}

impl<T> Patch<T> {
  pub fn is_set(&self) -> bool { matches!(self, Self::Set(_)) }

  pub fn as_set(&self) -> Option<&T> {
    match self {
      Self::Set(v) => Some(v),
      Self::Unchanged => None,
    }
  }

  /// Overwrite `target` if this patch carries a value.
  pub fn apply_to(self, target: &mut T) {
    if let Self::Set(v) = self {
      *target = v;
    }
  }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    T::deserialize(d).map(Self::Set)
  }
}

// ─── Entity patches ──────────────────────────────────────────────────────────

/// Changes to a user (or patient) profile. `user_type` and
/// `medical_insurance_id` are fixed at creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserPatch {
  pub login:         Patch<String>,
  pub first_name:    Patch<String>,
  pub last_name:     Patch<String>,
  pub phone_number:  Patch<String>,
  pub email:         Patch<String>,
  pub gender:        Patch<Option<String>>,
  pub city_of_birth: Patch<Option<String>>,
  pub date_of_birth: Patch<Option<NaiveDate>>,
  /// Set only by the credentials endpoint, after hashing.
  #[serde(skip)]
  pub password_hash: Patch<String>,
}

impl UserPatch {
  pub fn is_empty(&self) -> bool {
    !(self.login.is_set()
      || self.first_name.is_set()
      || self.last_name.is_set()
      || self.phone_number.is_set()
      || self.email.is_set()
      || self.gender.is_set()
      || self.city_of_birth.is_set()
      || self.date_of_birth.is_set()
      || self.password_hash.is_set())
  }

  pub fn apply(self, user: &mut User) {
    self.login.apply_to(&mut user.login);
    self.first_name.apply_to(&mut user.first_name);
    self.last_name.apply_to(&mut user.last_name);
    self.phone_number.apply_to(&mut user.phone_number);
    self.email.apply_to(&mut user.email);
    self.gender.apply_to(&mut user.gender);
    self.city_of_birth.apply_to(&mut user.city_of_birth);
    self.date_of_birth.apply_to(&mut user.date_of_birth);
    self.password_hash.apply_to(&mut user.password_hash);
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatePatch {
  pub street_address: Patch<String>,
  pub apartment:      Patch<Option<String>>,
  pub postal_code:    Patch<String>,
  pub city:           Patch<String>,
  pub country:        Patch<String>,
}

impl CoordinatePatch {
  pub fn is_empty(&self) -> bool {
    !(self.street_address.is_set()
      || self.apartment.is_set()
      || self.postal_code.is_set()
      || self.city.is_set()
      || self.country.is_set())
  }

  pub fn apply(self, coordinate: &mut Coordinate) {
    self.street_address.apply_to(&mut coordinate.street_address);
    self.apartment.apply_to(&mut coordinate.apartment);
    self.postal_code.apply_to(&mut coordinate.postal_code);
    self.city.apply_to(&mut coordinate.city);
    self.country.apply_to(&mut coordinate.country);
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryPatch {
  pub diagnostic: Patch<String>,
  pub treatment:  Patch<String>,
  pub doctor_id:  Patch<Uuid>,
  pub start_date: Patch<Option<NaiveDate>>,
  pub end_date:   Patch<Option<NaiveDate>>,
}

impl HistoryPatch {
  pub fn is_empty(&self) -> bool {
    !(self.diagnostic.is_set()
      || self.treatment.is_set()
      || self.doctor_id.is_set()
      || self.start_date.is_set()
      || self.end_date.is_set())
  }

  pub fn apply(self, entry: &mut MedicalHistory) {
    self.diagnostic.apply_to(&mut entry.diagnostic);
    self.treatment.apply_to(&mut entry.treatment);
    self.doctor_id.apply_to(&mut entry.doctor_id);
    self.start_date.apply_to(&mut entry.start_date);
    self.end_date.apply_to(&mut entry.end_date);
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisitPatch {
  pub establishment_id: Patch<Uuid>,
  pub doctor_id:        Patch<Uuid>,
  pub visit_date:       Patch<Option<DateTime<Utc>>>,
  pub diagnostic:       Patch<Option<String>>,
  pub treatment:        Patch<Option<String>>,
  pub summary:          Patch<String>,
  pub notes:            Patch<Option<String>>,
}

impl VisitPatch {
  pub fn is_empty(&self) -> bool {
    !(self.establishment_id.is_set()
      || self.doctor_id.is_set()
      || self.visit_date.is_set()
      || self.diagnostic.is_set()
      || self.treatment.is_set()
      || self.summary.is_set()
      || self.notes.is_set())
  }

  pub fn apply(self, visit: &mut MedicalVisit) {
    self.establishment_id.apply_to(&mut visit.establishment_id);
    self.doctor_id.apply_to(&mut visit.doctor_id);
    self.visit_date.apply_to(&mut visit.visit_date);
    self.diagnostic.apply_to(&mut visit.diagnostic);
    self.treatment.apply_to(&mut visit.treatment);
    self.summary.apply_to(&mut visit.summary);
    self.notes.apply_to(&mut visit.notes);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn coordinate() -> Coordinate {
    let now = Utc::now();
    Coordinate {
      coordinate_id:  Uuid::new_v4(),
      user_id:        Uuid::new_v4(),
      street_address: "1 Main St".into(),
      apartment:      Some("4B".into()),
      postal_code:    "H2X 1Y4".into(),
      city:           "Montreal".into(),
      country:        "Canada".into(),
      created_at:     now,
      modified_at:    now,
    }
  }

  #[test]
  fn absent_fields_are_unchanged() {
    let patch: CoordinatePatch =
      serde_json::from_str(r#"{"city":"Laval"}"#).unwrap();
    assert_eq!(patch.city, Patch::Set("Laval".to_string()));
    assert_eq!(patch.street_address, Patch::Unchanged);
    assert_eq!(patch.apartment, Patch::Unchanged);

    let mut c = coordinate();
    patch.apply(&mut c);
    assert_eq!(c.city, "Laval");
    assert_eq!(c.street_address, "1 Main St");
    assert_eq!(c.apartment.as_deref(), Some("4B"));
  }

  #[test]
  fn explicit_null_clears_nullable_field() {
    let patch: CoordinatePatch =
      serde_json::from_str(r#"{"apartment":null}"#).unwrap();
    assert_eq!(patch.apartment, Patch::Set(None));

    let mut c = coordinate();
    patch.apply(&mut c);
    assert_eq!(c.apartment, None);
  }

  #[test]
  fn empty_string_is_a_value() {
    let patch: CoordinatePatch =
      serde_json::from_str(r#"{"apartment":""}"#).unwrap();
    let mut c = coordinate();
    patch.apply(&mut c);
    assert_eq!(c.apartment.as_deref(), Some(""));
  }

  #[test]
  fn null_on_required_field_is_rejected() {
    let result = serde_json::from_str::<CoordinatePatch>(r#"{"city":null}"#);
    assert!(result.is_err());
  }

  #[test]
  fn empty_object_is_an_empty_patch() {
    let patch: UserPatch = serde_json::from_str("{}").unwrap();
    assert!(patch.is_empty());
    let patch: UserPatch =
      serde_json::from_str(r#"{"gender":null}"#).unwrap();
    assert!(!patch.is_empty());
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let result =
      serde_json::from_str::<UserPatch>(r#"{"password_hash":"x"}"#);
    assert!(result.is_err());
  }
}
