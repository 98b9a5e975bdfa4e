//! The `RecordStore` trait.
//!
//! Implemented by storage backends (e.g. `medrec-store-sqlite`). The HTTP
//! layer depends on this abstraction, not on any concrete backend.
//!
//! Every `get_*` method takes an `as_of` instant: `None` reconstructs the
//! current state (newest non-hidden version per logical id), `Some(t)`
//! reconstructs the state as it was at `t`.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  error::StoreError,
  patch::{CoordinatePatch, HistoryPatch, UserPatch, VisitPatch},
  record::{
    Coordinate, Establishment, MedicalHistory, MedicalVisit, NewCoordinate,
    NewHistory, NewVisit, ParentLink,
  },
  user::{NewParent, NewPatient, NewUser, User},
  view::{DoctorIdentity, HistoryView, ParentView, PatientRecord, VersionHistory, VisitView},
};

/// Abstraction over a versioned medical-record store.
///
/// Writes never modify a stored version. An update appends a new version
/// under the same logical id; a hide flags the latest version. Hiding an
/// unknown id yields `false`; hiding an already hidden entity yields `true`
/// and changes nothing.
///
/// Updates to an entity whose latest version is hidden fail with
/// [`ErrorKind::NotFound`](crate::ErrorKind::NotFound).
pub trait RecordStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. `password_hash` must already be hashed.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: Uuid,
    as_of: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Append a new version of the user with `patch` merged over the latest.
  fn update_user(
    &self,
    user_id: Uuid,
    patch: UserPatch,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn hide_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Current, non-hidden users of type `DOCTOR`.
  fn list_doctors(
    &self,
  ) -> impl Future<Output = Result<Vec<DoctorIdentity>, Self::Error>> + Send + '_;

  fn find_doctor_by_name(
    &self,
    first_name: String,
    last_name: String,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + '_;

  // ── Patients ──────────────────────────────────────────────────────────

  /// Create the patient user, their coordinates and parent links in one
  /// transaction. Nothing is written if any referenced parent is missing.
  fn create_patient(
    &self,
    input: NewPatient,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// The patient with their coordinates, history, visits and parents.
  fn get_patient(
    &self,
    insurance_id: String,
    as_of: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<PatientRecord, Self::Error>> + Send + '_;

  fn update_patient(
    &self,
    insurance_id: String,
    patch: UserPatch,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn hide_patient(
    &self,
    insurance_id: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// One snapshot of the full patient record per instant at which any of
  /// the patient's streams changed, in chronological order.
  fn patient_version_history(
    &self,
    insurance_id: String,
  ) -> impl Future<Output = Result<VersionHistory, Self::Error>> + Send + '_;

  // ── Coordinates ───────────────────────────────────────────────────────

  fn add_coordinate(
    &self,
    user_id: Uuid,
    input: NewCoordinate,
  ) -> impl Future<Output = Result<Coordinate, Self::Error>> + Send + '_;

  fn get_coordinates(
    &self,
    user_id: Uuid,
    as_of: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<Coordinate>, Self::Error>> + Send + '_;

  fn update_coordinate(
    &self,
    coordinate_id: Uuid,
    patch: CoordinatePatch,
  ) -> impl Future<Output = Result<Coordinate, Self::Error>> + Send + '_;

  fn hide_coordinate(
    &self,
    coordinate_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Medical history ───────────────────────────────────────────────────

  fn add_history(
    &self,
    insurance_id: String,
    input: NewHistory,
  ) -> impl Future<Output = Result<MedicalHistory, Self::Error>> + Send + '_;

  fn get_history(
    &self,
    insurance_id: String,
    as_of: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<HistoryView>, Self::Error>> + Send + '_;

  fn update_history(
    &self,
    history_id: Uuid,
    patch: HistoryPatch,
  ) -> impl Future<Output = Result<MedicalHistory, Self::Error>> + Send + '_;

  fn hide_history(
    &self,
    history_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Medical visits ────────────────────────────────────────────────────

  fn add_visit(
    &self,
    insurance_id: String,
    input: NewVisit,
  ) -> impl Future<Output = Result<MedicalVisit, Self::Error>> + Send + '_;

  fn get_visits(
    &self,
    insurance_id: String,
    as_of: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<VisitView>, Self::Error>> + Send + '_;

  fn update_visit(
    &self,
    visit_id: Uuid,
    patch: VisitPatch,
  ) -> impl Future<Output = Result<MedicalVisit, Self::Error>> + Send + '_;

  fn hide_visit(
    &self,
    visit_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Establishments ────────────────────────────────────────────────────

  fn create_establishment(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Establishment, Self::Error>> + Send + '_;

  /// Non-hidden establishments, by name.
  fn list_establishments(
    &self,
  ) -> impl Future<Output = Result<Vec<Establishment>, Self::Error>> + Send + '_;

  fn find_establishment_by_name(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + '_;

  fn hide_establishment(
    &self,
    establishment_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Parents ───────────────────────────────────────────────────────────

  /// Link an existing user as a parent of `child_id`. Linking an already
  /// linked pair returns the existing link.
  fn link_parent(
    &self,
    child_id: Uuid,
    parent_id: Uuid,
  ) -> impl Future<Output = Result<ParentLink, Self::Error>> + Send + '_;

  /// Create a `PARENT` user and link it to `child_id` in one transaction.
  fn add_new_parent(
    &self,
    child_id: Uuid,
    input: NewParent,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_parents(
    &self,
    child_id: Uuid,
    as_of: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<Vec<ParentView>, Self::Error>> + Send + '_;

  fn unlink_parent(
    &self,
    child_id: Uuid,
    parent_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
