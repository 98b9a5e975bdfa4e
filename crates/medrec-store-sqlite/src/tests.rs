//! Integration tests for `SqliteStore` against an in-memory database.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use medrec_core::{
  ErrorKind, Patch, StoreError,
  patch::{CoordinatePatch, HistoryPatch, UserPatch, VisitPatch},
  record::{NewCoordinate, NewHistory, NewVisit},
  store::RecordStore,
  user::{NewParent, NewPatient, NewUser, User, UserType},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// Let the clock move past the last write, then return the current instant.
async fn instant() -> DateTime<Utc> {
  tokio::time::sleep(Duration::from_millis(2)).await;
  let t = Utc::now();
  tokio::time::sleep(Duration::from_millis(2)).await;
  t
}

fn address(city: &str) -> NewCoordinate {
  NewCoordinate {
    street_address: "1 Main St".into(),
    apartment:      None,
    postal_code:    "H2X 1Y4".into(),
    city:           city.into(),
    country:        "Canada".into(),
  }
}

fn new_patient(insurance_id: &str, first_name: &str) -> NewPatient {
  NewPatient {
    user:        NewUser {
      medical_insurance_id: Some(insurance_id.into()),
      ..NewUser::new(format!("p-{insurance_id}"), UserType::Patient, first_name, "Smith")
    },
    coordinates: Vec::new(),
    parent_ids:  Vec::new(),
  }
}

async fn doctor(s: &SqliteStore, first: &str, last: &str) -> User {
  s.create_user(NewUser::new(
    format!("dr-{last}").to_lowercase(),
    UserType::Doctor,
    first,
    last,
  ))
  .await
  .unwrap()
}

fn history_for(doctor_id: Uuid, diagnostic: &str) -> NewHistory {
  NewHistory {
    diagnostic: diagnostic.into(),
    treatment: "rest".into(),
    doctor_id,
    start_date: NaiveDate::from_ymd_opt(2024, 1, 10),
    end_date: None,
  }
}

fn name_patch(first_name: &str) -> UserPatch {
  UserPatch { first_name: Patch::Set(first_name.into()), ..Default::default() }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_user() {
  let s = store().await;
  let created = s
    .create_user(NewUser::new("alice", UserType::Admin, "Alice", "Liddell"))
    .await
    .unwrap();
  assert_eq!(created.created_at, created.modified_at);

  let fetched = s.get_user(created.user_id, None).await.unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn get_unknown_user_is_not_found() {
  let s = store().await;
  let err = s.get_user(Uuid::new_v4(), None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn latest_version_wins() {
  let s = store().await;
  let user = s
    .create_user(NewUser::new("bob", UserType::Admin, "V0", "Builder"))
    .await
    .unwrap();

  for i in 1..=3 {
    s.update_user(user.user_id, name_patch(&format!("V{i}"))).await.unwrap();
  }

  let current = s.get_user(user.user_id, None).await.unwrap();
  assert_eq!(current.first_name, "V3");
  assert_eq!(current.last_name, "Builder");
}

#[tokio::test]
async fn point_in_time_returns_version_in_effect() {
  let s = store().await;
  let before = instant().await;
  let user = s
    .create_user(NewUser::new("carol", UserType::Admin, "One", "C"))
    .await
    .unwrap();
  let t1 = instant().await;
  s.update_user(user.user_id, name_patch("Two")).await.unwrap();
  let t2 = instant().await;
  s.update_user(user.user_id, name_patch("Three")).await.unwrap();
  let t3 = instant().await;

  let err = s.get_user(user.user_id, Some(before)).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert_eq!(s.get_user(user.user_id, Some(t1)).await.unwrap().first_name, "One");
  assert_eq!(s.get_user(user.user_id, Some(t2)).await.unwrap().first_name, "Two");
  assert_eq!(s.get_user(user.user_id, Some(t3)).await.unwrap().first_name, "Three");
}

#[tokio::test]
async fn created_at_is_stable_and_modified_at_increases() {
  let s = store().await;
  let v0 = s
    .create_user(NewUser::new("dave", UserType::Admin, "Dave", "D"))
    .await
    .unwrap();
  // No sleep: consecutive versions may land in the same microsecond.
  let v1 = s.update_user(v0.user_id, name_patch("Dave1")).await.unwrap();
  let v2 = s.update_user(v0.user_id, name_patch("Dave2")).await.unwrap();

  assert_eq!(v1.created_at, v0.created_at);
  assert_eq!(v2.created_at, v0.created_at);
  assert!(v1.modified_at > v0.modified_at);
  assert!(v2.modified_at > v1.modified_at);
}

#[tokio::test]
async fn partial_update_touches_only_set_fields() {
  let s = store().await;
  let user = s
    .create_user(NewUser {
      gender: Some("F".into()),
      email: "erin@example.com".into(),
      ..NewUser::new("erin", UserType::Admin, "Erin", "E")
    })
    .await
    .unwrap();

  let patch = UserPatch {
    phone_number: Patch::Set(String::new()),
    gender: Patch::Set(None),
    ..Default::default()
  };
  let updated = s.update_user(user.user_id, patch).await.unwrap();

  assert_eq!(updated.phone_number, "");
  assert_eq!(updated.gender, None);
  assert_eq!(updated.email, "erin@example.com");
  assert_eq!(updated.first_name, "Erin");
}

#[tokio::test]
async fn hide_removes_from_current_but_not_from_past() {
  let s = store().await;
  let user = s
    .create_user(NewUser::new("fay", UserType::Admin, "Fay", "F"))
    .await
    .unwrap();
  let before_hide = instant().await;

  assert!(s.hide_user(user.user_id).await.unwrap());

  let err = s.get_user(user.user_id, None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  let past = s.get_user(user.user_id, Some(before_hide)).await.unwrap();
  assert_eq!(past.first_name, "Fay");

  let later = instant().await;
  let err = s.get_user(user.user_id, Some(later)).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn hide_is_idempotent_and_reports_unknown_ids() {
  let s = store().await;
  let user = s
    .create_user(NewUser::new("gus", UserType::Admin, "Gus", "G"))
    .await
    .unwrap();
  assert!(s.hide_user(user.user_id).await.unwrap());
  assert!(s.hide_user(user.user_id).await.unwrap());
  assert!(!s.hide_user(Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn updating_hidden_entity_is_not_found() {
  let s = store().await;
  let user = s
    .create_user(NewUser::new("hal", UserType::Admin, "Hal", "H"))
    .await
    .unwrap();
  s.hide_user(user.user_id).await.unwrap();

  let err = s.update_user(user.user_id, name_patch("Back")).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert_eq!(
    s.get_user(user.user_id, None).await.unwrap_err().kind(),
    ErrorKind::NotFound
  );
}

#[tokio::test]
async fn concurrent_updates_to_different_fields_both_land() {
  let s = store().await;
  let user = s
    .create_user(NewUser::new("ivy", UserType::Admin, "Ivy", "I"))
    .await
    .unwrap();

  let email = UserPatch { email: Patch::Set("ivy@example.com".into()), ..Default::default() };
  let phone = UserPatch { phone_number: Patch::Set("555-0100".into()), ..Default::default() };
  let (a, b) = tokio::join!(
    s.update_user(user.user_id, email),
    s.update_user(user.user_id, phone),
  );
  a.unwrap();
  b.unwrap();

  let current = s.get_user(user.user_id, None).await.unwrap();
  assert_eq!(current.email, "ivy@example.com");
  assert_eq!(current.phone_number, "555-0100");
}

// ─── Patients ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn patient_first_name_changes_over_time() {
  let s = store().await;
  s.create_patient(new_patient("INS999", "A")).await.unwrap();
  let t1 = instant().await;
  s.update_patient("INS999".into(), name_patch("B")).await.unwrap();

  let past = s.get_patient("INS999".into(), Some(t1)).await.unwrap();
  assert_eq!(past.patient.first_name, "A");
  assert_eq!(past.as_of, Some(t1));

  let current = s.get_patient("INS999".into(), None).await.unwrap();
  assert_eq!(current.patient.first_name, "B");
  assert_eq!(current.as_of, None);
}

#[tokio::test]
async fn create_patient_writes_coordinates_and_parents() {
  let s = store().await;
  let mum = s
    .create_user(NewUser::new("", UserType::Parent, "Mum", "Smith"))
    .await
    .unwrap();

  let mut input = new_patient("INS100", "Kid");
  input.coordinates = vec![address("Montreal"), address("Laval")];
  input.parent_ids = vec![mum.user_id];
  let patient = s.create_patient(input).await.unwrap();
  assert_eq!(patient.user_type, UserType::Patient);

  let record = s.get_patient("INS100".into(), None).await.unwrap();
  assert_eq!(record.coordinates.len(), 2);
  assert_eq!(record.parents.len(), 1);
  assert_eq!(record.parents[0].parent_id, mum.user_id);
  assert_eq!(record.parents[0].parent.as_ref().unwrap().first_name, "Mum");
}

#[tokio::test]
async fn create_patient_with_missing_parent_writes_nothing() {
  let s = store().await;
  let mut input = new_patient("INS101", "Kid");
  input.coordinates = vec![address("Montreal")];
  input.parent_ids = vec![Uuid::new_v4()];

  let err = s.create_patient(input).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::ForeignKeyViolation);

  let err = s.get_patient("INS101".into(), None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn insurance_id_is_unique() {
  let s = store().await;
  s.create_patient(new_patient("INS102", "First")).await.unwrap();
  let err = s.create_patient(new_patient("INS102", "Second")).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn insurance_id_is_reserved_for_patients() {
  let s = store().await;
  let input = NewUser {
    medical_insurance_id: Some("INS104".into()),
    ..NewUser::new("dr-who", UserType::Doctor, "John", "Smith")
  };
  let err = s.create_user(input).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let err = s.get_patient("INS104".into(), None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn patient_without_insurance_id_is_rejected() {
  let s = store().await;
  let mut input = new_patient("x", "Nobody");
  input.user.medical_insurance_id = None;
  let err = s.create_patient(input).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn hidden_patient_is_gone() {
  let s = store().await;
  s.create_patient(new_patient("INS103", "Gone")).await.unwrap();
  assert!(s.hide_patient("INS103".into()).await.unwrap());
  assert!(!s.hide_patient("NOPE".into()).await.unwrap());

  let err = s.get_patient("INS103".into(), None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  let err = s.patient_version_history("INS103".into()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn hidden_patient_takes_attached_records_with_it() {
  let s = store().await;
  let dr = doctor(&s, "Remy", "Hadley").await;
  let mut input = new_patient("INS105", "Gone");
  input.coordinates.push(address("Montreal"));
  let patient = s.create_patient(input).await.unwrap();
  s.add_history("INS105".into(), history_for(dr.user_id, "chorea")).await.unwrap();
  let before = instant().await;
  s.hide_patient("INS105".into()).await.unwrap();

  let err = s.get_history("INS105".into(), None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  let err = s.get_visits("INS105".into(), None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  let err = s.get_coordinates(patient.user_id, None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  let err = s.get_parents(patient.user_id, None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  assert_eq!(s.get_history("INS105".into(), Some(before)).await.unwrap().len(), 1);
  assert_eq!(s.get_coordinates(patient.user_id, Some(before)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn records_before_the_patient_existed_are_not_found() {
  let s = store().await;
  let earlier = instant().await;
  let patient = s.create_patient(new_patient("INS106", "Late")).await.unwrap();

  let err = s.get_history("INS106".into(), Some(earlier)).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  let err = s.get_coordinates(patient.user_id, Some(earlier)).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert!(s.get_history("INS106".into(), None).await.unwrap().is_empty());
}

// ─── Coordinates ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn coordinate_updated_twice_yields_three_snapshots() {
  let s = store().await;
  let mut input = new_patient("INS200", "Cora");
  input.coordinates = vec![address("Montreal")];
  let patient = s.create_patient(input).await.unwrap();
  let coordinate = s.get_coordinates(patient.user_id, None).await.unwrap().remove(0);

  for city in ["Laval", "Quebec"] {
    let patch = CoordinatePatch { city: Patch::Set(city.into()), ..Default::default() };
    s.update_coordinate(coordinate.coordinate_id, patch).await.unwrap();
  }

  let history = s.patient_version_history("INS200".into()).await.unwrap();
  assert_eq!(history.len(), 3);

  let cities: Vec<_> = history
    .values()
    .map(|snap| snap.coordinates[0].city.clone())
    .collect();
  assert_eq!(cities, ["Montreal", "Laval", "Quebec"]);

  for snap in history.values() {
    assert_eq!(snap.patient.first_name, "Cora");
    assert_eq!(snap.coordinates.len(), 1);
    assert_eq!(snap.coordinates[0].coordinate_id, coordinate.coordinate_id);
  }
}

#[tokio::test]
async fn coordinate_for_missing_user_is_rejected() {
  let s = store().await;
  let err = s.add_coordinate(Uuid::new_v4(), address("Nowhere")).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::ForeignKeyViolation);
}

#[tokio::test]
async fn hidden_coordinate_leaves_current_list() {
  let s = store().await;
  let user = s
    .create_user(NewUser::new("jo", UserType::Admin, "Jo", "J"))
    .await
    .unwrap();
  let home = s.add_coordinate(user.user_id, address("Montreal")).await.unwrap();
  let work = s.add_coordinate(user.user_id, address("Laval")).await.unwrap();
  let before = instant().await;
  s.hide_coordinate(home.coordinate_id).await.unwrap();

  let current = s.get_coordinates(user.user_id, None).await.unwrap();
  assert_eq!(current.len(), 1);
  assert_eq!(current[0].coordinate_id, work.coordinate_id);

  let past = s.get_coordinates(user.user_id, Some(before)).await.unwrap();
  assert_eq!(past.len(), 2);
}

// ─── Medical history ─────────────────────────────────────────────────────────

#[tokio::test]
async fn hidden_history_entry_is_absent_now_and_present_before() {
  let s = store().await;
  let dr = doctor(&s, "Gregory", "House").await;
  s.create_patient(new_patient("INS300", "Hank")).await.unwrap();
  let entry = s.add_history("INS300".into(), history_for(dr.user_id, "flu")).await.unwrap();
  let before_hide = instant().await;

  assert!(s.hide_history(entry.history_id).await.unwrap());

  let current = s.get_patient("INS300".into(), None).await.unwrap();
  assert!(current.medical_history.is_empty());

  let past = s.get_patient("INS300".into(), Some(before_hide)).await.unwrap();
  assert_eq!(past.medical_history.len(), 1);
  assert_eq!(past.medical_history[0].entry.history_id, entry.history_id);
}

#[tokio::test]
async fn history_requires_existing_doctor_and_patient() {
  let s = store().await;
  s.create_patient(new_patient("INS301", "Ida")).await.unwrap();
  let err = s
    .add_history("INS301".into(), history_for(Uuid::new_v4(), "flu"))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::ForeignKeyViolation);

  let dr = doctor(&s, "James", "Wilson").await;
  let err = s
    .add_history("NOPE".into(), history_for(dr.user_id, "flu"))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::ForeignKeyViolation);
}

#[tokio::test]
async fn history_shows_doctor_current_profile() {
  let s = store().await;
  let dr = doctor(&s, "Lisa", "Cuddy").await;
  s.create_patient(new_patient("INS302", "Jack")).await.unwrap();
  s.add_history("INS302".into(), history_for(dr.user_id, "sprain")).await.unwrap();
  let t1 = instant().await;

  s.update_user(dr.user_id, name_patch("Elisabeth")).await.unwrap();

  let past = s.get_history("INS302".into(), Some(t1)).await.unwrap();
  let shown = past[0].doctor.as_ref().unwrap();
  assert_eq!(shown.first_name, "Elisabeth");
  assert_eq!(shown.user_type, UserType::Doctor);
}

#[tokio::test]
async fn history_update_with_unknown_doctor_is_rejected() {
  let s = store().await;
  let dr = doctor(&s, "Eric", "Foreman").await;
  s.create_patient(new_patient("INS303", "Kim")).await.unwrap();
  let entry = s.add_history("INS303".into(), history_for(dr.user_id, "cold")).await.unwrap();

  let patch = HistoryPatch { doctor_id: Patch::Set(Uuid::new_v4()), ..Default::default() };
  let err = s.update_history(entry.history_id, patch).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::ForeignKeyViolation);

  let patch = HistoryPatch { end_date: Patch::Set(NaiveDate::from_ymd_opt(2024, 2, 1)), ..Default::default() };
  let updated = s.update_history(entry.history_id, patch).await.unwrap();
  assert_eq!(updated.diagnostic, "cold");
  assert_eq!(updated.end_date, NaiveDate::from_ymd_opt(2024, 2, 1));
}

// ─── Visits & establishments ─────────────────────────────────────────────────

#[tokio::test]
async fn visit_is_assembled_with_doctor_and_establishment() {
  let s = store().await;
  let dr = doctor(&s, "Robert", "Chase").await;
  let clinic = s.create_establishment("General Hospital".into()).await.unwrap();
  s.create_patient(new_patient("INS400", "Lou")).await.unwrap();

  let visit = s
    .add_visit("INS400".into(), NewVisit {
      establishment_id: clinic.establishment_id,
      doctor_id:        dr.user_id,
      visit_date:       Some(Utc::now()),
      diagnostic:       None,
      treatment:        None,
      summary:          "checkup".into(),
      notes:            Some("all good".into()),
    })
    .await
    .unwrap();

  let patch = VisitPatch { notes: Patch::Set(None), ..Default::default() };
  s.update_visit(visit.visit_id, patch).await.unwrap();

  let visits = s.get_visits("INS400".into(), None).await.unwrap();
  assert_eq!(visits.len(), 1);
  assert_eq!(visits[0].visit.notes, None);
  assert_eq!(visits[0].visit.summary, "checkup");
  assert_eq!(visits[0].doctor.as_ref().unwrap().last_name, "Chase");
  assert_eq!(
    visits[0].establishment.as_ref().unwrap().establishment_name,
    "General Hospital"
  );
}

#[tokio::test]
async fn visit_requires_live_establishment() {
  let s = store().await;
  let dr = doctor(&s, "Allison", "Cameron").await;
  let clinic = s.create_establishment("Closed Clinic".into()).await.unwrap();
  s.create_patient(new_patient("INS401", "Max")).await.unwrap();
  assert!(s.hide_establishment(clinic.establishment_id).await.unwrap());

  let err = s
    .add_visit("INS401".into(), NewVisit {
      establishment_id: clinic.establishment_id,
      doctor_id:        dr.user_id,
      visit_date:       None,
      diagnostic:       None,
      treatment:        None,
      summary:          "walk-in".into(),
      notes:            None,
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::ForeignKeyViolation);
}

#[tokio::test]
async fn establishments_list_find_and_hide() {
  let s = store().await;
  let b = s.create_establishment("Beta Clinic".into()).await.unwrap();
  let a = s.create_establishment("Alpha Clinic".into()).await.unwrap();

  let names: Vec<_> = s
    .list_establishments()
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.establishment_name)
    .collect();
  assert_eq!(names, ["Alpha Clinic", "Beta Clinic"]);

  assert_eq!(
    s.find_establishment_by_name("Beta Clinic".into()).await.unwrap(),
    Some(b.establishment_id)
  );

  assert!(s.hide_establishment(b.establishment_id).await.unwrap());
  assert!(!s.hide_establishment(Uuid::new_v4()).await.unwrap());
  let remaining = s.list_establishments().await.unwrap();
  assert_eq!(remaining.len(), 1);
  assert_eq!(remaining[0].establishment_id, a.establishment_id);
  assert_eq!(s.find_establishment_by_name("Beta Clinic".into()).await.unwrap(), None);
}

#[tokio::test]
async fn doctors_are_listed_and_found_by_name() {
  let s = store().await;
  let house = doctor(&s, "Gregory", "House").await;
  let gone = doctor(&s, "Amber", "Volakis").await;
  s.create_user(NewUser::new("nurse", UserType::HealthcareProfessional, "Nina", "N"))
    .await
    .unwrap();
  s.hide_user(gone.user_id).await.unwrap();

  let doctors = s.list_doctors().await.unwrap();
  assert_eq!(doctors.len(), 1);
  assert_eq!(doctors[0].user_id, house.user_id);

  let found = s
    .find_doctor_by_name("Gregory".into(), "House".into())
    .await
    .unwrap();
  assert_eq!(found, Some(house.user_id));
  let missing = s
    .find_doctor_by_name("Amber".into(), "Volakis".into())
    .await
    .unwrap();
  assert_eq!(missing, None);
}

// ─── Parents ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn link_is_idempotent_and_unlink_is_point_in_time() {
  let s = store().await;
  let kid = s.create_patient(new_patient("INS500", "Kid")).await.unwrap();
  let dad = s
    .create_user(NewUser::new("", UserType::Parent, "Dad", "Smith"))
    .await
    .unwrap();

  let first = s.link_parent(kid.user_id, dad.user_id).await.unwrap();
  let again = s.link_parent(kid.user_id, dad.user_id).await.unwrap();
  assert_eq!(first, again);

  let linked = instant().await;
  assert!(s.unlink_parent(kid.user_id, dad.user_id).await.unwrap());
  assert!(!s.unlink_parent(kid.user_id, Uuid::new_v4()).await.unwrap());

  assert!(s.get_parents(kid.user_id, None).await.unwrap().is_empty());
  let past = s.get_parents(kid.user_id, Some(linked)).await.unwrap();
  assert_eq!(past.len(), 1);
  assert_eq!(past[0].parent_id, dad.user_id);

  let relinked = s.link_parent(kid.user_id, dad.user_id).await.unwrap();
  assert!(relinked.linked_at > first.linked_at);
  assert_eq!(s.get_parents(kid.user_id, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn link_requires_both_users() {
  let s = store().await;
  let kid = s.create_patient(new_patient("INS501", "Kid")).await.unwrap();
  let err = s.link_parent(kid.user_id, Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::ForeignKeyViolation);
  let err = s.link_parent(kid.user_id, kid.user_id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn new_parent_is_created_and_linked() {
  let s = store().await;
  let kid = s.create_patient(new_patient("INS502", "Kid")).await.unwrap();
  let parent = s
    .add_new_parent(kid.user_id, NewParent {
      first_name:   "Alice".into(),
      last_name:    "Johnson".into(),
      phone_number: "123-456-7890".into(),
      email:        "alice@email.com".into(),
      gender:       Some("F".into()),
    })
    .await
    .unwrap();
  assert_eq!(parent.user_type, UserType::Parent);

  let parents = s.get_parents(kid.user_id, None).await.unwrap();
  assert_eq!(parents.len(), 1);
  assert_eq!(parents[0].parent.as_ref().unwrap().email, "alice@email.com");
}

// ─── Version history ─────────────────────────────────────────────────────────

#[tokio::test]
async fn version_history_has_one_snapshot_per_change() {
  let s = store().await;
  let dr = doctor(&s, "Chris", "Taub").await;
  let clinic = s.create_establishment("Princeton".into()).await.unwrap();
  s.create_patient(new_patient("INS600", "Vera")).await.unwrap();
  s.update_patient("INS600".into(), name_patch("Veronica")).await.unwrap();
  let entry = s.add_history("INS600".into(), history_for(dr.user_id, "asthma")).await.unwrap();
  let patch = HistoryPatch { treatment: Patch::Set("inhaler".into()), ..Default::default() };
  s.update_history(entry.history_id, patch).await.unwrap();
  s.add_visit("INS600".into(), NewVisit {
    establishment_id: clinic.establishment_id,
    doctor_id:        dr.user_id,
    visit_date:       None,
    diagnostic:       Some("asthma".into()),
    treatment:        None,
    summary:          "follow-up".into(),
    notes:            None,
  })
  .await
  .unwrap();

  let history = s.patient_version_history("INS600".into()).await.unwrap();
  assert_eq!(history.len(), 5);

  let keys: Vec<_> = history.keys().cloned().collect();
  let mut sorted = keys.clone();
  sorted.sort();
  assert_eq!(keys, sorted);

  let snaps: Vec<_> = history.values().collect();
  assert_eq!(snaps[0].patient.first_name, "Vera");
  assert!(snaps[0].medical_history.is_empty());
  assert_eq!(snaps[1].patient.first_name, "Veronica");
  assert_eq!(snaps[2].medical_history[0].entry.treatment, "rest");
  assert_eq!(snaps[3].medical_history[0].entry.treatment, "inhaler");
  assert!(snaps[3].medical_visits.is_empty());
  assert_eq!(snaps[4].medical_visits.len(), 1);

  for (key, snap) in &history {
    assert_eq!(snap.as_of.map(crate::encode::encode_dt).as_deref(), Some(key.as_str()));
  }
}

#[tokio::test]
async fn version_history_tracks_hides_and_parent_links() {
  let s = store().await;
  let kid = s.create_patient(new_patient("INS601", "Kid")).await.unwrap();
  let mum = s
    .create_user(NewUser::new("", UserType::Parent, "Mum", "Smith"))
    .await
    .unwrap();
  let home = s.add_coordinate(kid.user_id, address("Montreal")).await.unwrap();
  s.link_parent(kid.user_id, mum.user_id).await.unwrap();
  s.hide_coordinate(home.coordinate_id).await.unwrap();

  let history = s.patient_version_history("INS601".into()).await.unwrap();
  let snaps: Vec<_> = history.values().collect();
  assert_eq!(snaps.len(), 4);
  assert!(snaps[0].coordinates.is_empty() && snaps[0].parents.is_empty());
  assert_eq!(snaps[1].coordinates.len(), 1);
  assert!(snaps[1].parents.is_empty());
  assert_eq!(snaps[2].parents.len(), 1);
  assert!(snaps[3].coordinates.is_empty());
  assert_eq!(snaps[3].parents.len(), 1);
}

#[tokio::test]
async fn patient_created_with_parents_is_one_snapshot() {
  let s = store().await;
  let mum = s
    .create_user(NewUser::new("", UserType::Parent, "Mum", "Smith"))
    .await
    .unwrap();
  let mut input = new_patient("INS602", "Kid");
  input.coordinates.push(address("Montreal"));
  input.parent_ids.push(mum.user_id);
  let kid = s.create_patient(input).await.unwrap();

  let history = s.patient_version_history("INS602".into()).await.unwrap();
  assert_eq!(history.len(), 1);
  let snap = history.values().next().unwrap();
  assert_eq!(snap.coordinates.len(), 1);
  assert_eq!(snap.parents.len(), 1);
  assert_eq!(snap.parents[0].parent_id, mum.user_id);
  assert_eq!(snap.parents[0].linked_at, kid.created_at);
}

#[tokio::test]
async fn new_parent_is_linked_when_created() {
  let s = store().await;
  let kid = s.create_patient(new_patient("INS603", "Kid")).await.unwrap();
  let dad = s
    .add_new_parent(kid.user_id, NewParent {
      first_name:   "Dad".into(),
      last_name:    "Smith".into(),
      phone_number: String::new(),
      email:        String::new(),
      gender:       None,
    })
    .await
    .unwrap();

  let parents = s.get_parents(kid.user_id, Some(dad.created_at)).await.unwrap();
  assert_eq!(parents.len(), 1);
  assert_eq!(parents[0].linked_at, dad.created_at);
  assert_eq!(s.patient_version_history("INS603".into()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn version_history_of_unknown_patient_is_not_found() {
  let s = store().await;
  let err = s.patient_version_history("NOPE".into()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}
