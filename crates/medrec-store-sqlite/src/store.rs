//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior, params};
use tracing::{debug, info};
use uuid::Uuid;

use medrec_core::{
  EntityKind,
  patch::{CoordinatePatch, HistoryPatch, UserPatch, VisitPatch},
  record::{
    Coordinate, Establishment, MedicalHistory, MedicalVisit, NewCoordinate,
    NewHistory, NewVisit, ParentLink,
  },
  store::RecordStore,
  user::{NewParent, NewPatient, NewUser, User, UserType},
  view::{DoctorIdentity, HistoryView, ParentView, PatientRecord, VersionHistory, VisitView},
};

use crate::{
  Error, Result,
  assemble::{Assembler, establishment_from_row, load_establishment},
  encode::{decode_dt, decode_uuid, encode_dt, encode_uuid, now, text, uuid_value},
  parents,
  schema::SCHEMA,
  versioned::{
    append_version, hide, insert_version, is_live, owner_known, select_versions,
  },
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A versioned medical-record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` inside a `BEGIN IMMEDIATE` transaction.
  ///
  /// The write lock is held from the first read, so a read-merge-append
  /// sequence cannot interleave with another writer. Nothing is committed
  /// unless `f` succeeds.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = match f(&tx) {
          Ok(out) => out,
          Err(e) => return Ok(Err(e)),
        };
        tx.commit()?;
        Ok(Ok(out))
      })
      .await?
  }

  /// Run `f` inside a read transaction, so multi-query reads see one
  /// consistent snapshot.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        Ok(f(&tx))
      })
      .await?
  }
}

// ─── Shared steps ────────────────────────────────────────────────────────────

/// The current, non-hidden user holding `insurance_id`.
fn live_patient(conn: &Connection, insurance_id: &str) -> Result<Option<User>> {
  Ok(
    select_versions::<User>(conn, "medical_insurance_id", text(insurance_id), None)?
      .into_iter()
      .next(),
  )
}

/// Whether the user had a visible version at `as_of`, or has one now.
fn user_visible(conn: &Connection, user_id: Uuid, as_of: Option<DateTime<Utc>>) -> Result<bool> {
  Ok(!select_versions::<User>(conn, "user_id", uuid_value(user_id), as_of)?.is_empty())
}

/// Whether a patient held `insurance_id` visibly at `as_of`, or holds it now.
fn patient_visible(
  conn: &Connection,
  insurance_id: &str,
  as_of: Option<DateTime<Utc>>,
) -> Result<bool> {
  Ok(
    !select_versions::<User>(conn, "medical_insurance_id", text(insurance_id), as_of)?
      .is_empty(),
  )
}

fn require_user(conn: &Connection, id: Uuid) -> Result<()> {
  if is_live::<User>(conn, id)? {
    Ok(())
  } else {
    Err(Error::missing_reference(EntityKind::User, id))
  }
}

fn require_patient(conn: &Connection, insurance_id: &str) -> Result<()> {
  match live_patient(conn, insurance_id)? {
    Some(_) => Ok(()),
    None => Err(Error::missing_reference(EntityKind::Patient, insurance_id)),
  }
}

fn require_establishment(conn: &Connection, id: Uuid) -> Result<()> {
  let live = conn
    .query_row(
      "SELECT hidden FROM establishments WHERE establishment_id = ?1",
      params![encode_uuid(id)],
      |r| r.get::<_, i64>(0),
    )
    .map(|hidden| hidden == 0);
  match live {
    Ok(true) => Ok(()),
    Ok(false) | Err(rusqlite::Error::QueryReturnedNoRows) => {
      Err(Error::missing_reference(EntityKind::Establishment, id))
    }
    Err(e) => Err(e.into()),
  }
}

fn insert_user(conn: &Connection, input: NewUser, at: DateTime<Utc>) -> Result<User> {
  if let Some(ins) = input.medical_insurance_id.as_deref() {
    if input.user_type != UserType::Patient {
      return Err(Error::Validation(format!(
        "only patients carry a medical insurance id, not {}",
        input.user_type.as_str()
      )));
    }
    if owner_known(conn, "users", "medical_insurance_id", text(ins))? {
      return Err(Error::Validation(format!(
        "medical insurance id {ins:?} is already registered"
      )));
    }
  }
  let user = User {
    user_id:              Uuid::new_v4(),
    medical_insurance_id: input.medical_insurance_id,
    login:                input.login,
    password_hash:        input.password_hash,
    user_type:            input.user_type,
    first_name:           input.first_name,
    last_name:            input.last_name,
    phone_number:         input.phone_number,
    email:                input.email,
    gender:               input.gender,
    city_of_birth:        input.city_of_birth,
    date_of_birth:        input.date_of_birth,
    created_at:           at,
    modified_at:          at,
  };
  insert_version(conn, &user)?;
  Ok(user)
}

fn insert_coordinate(
  conn: &Connection,
  user_id: Uuid,
  input: NewCoordinate,
  at: DateTime<Utc>,
) -> Result<Coordinate> {
  let coordinate = Coordinate {
    coordinate_id:  Uuid::new_v4(),
    user_id,
    street_address: input.street_address,
    apartment:      input.apartment,
    postal_code:    input.postal_code,
    city:           input.city,
    country:        input.country,
    created_at:     at,
    modified_at:    at,
  };
  insert_version(conn, &coordinate)?;
  Ok(coordinate)
}

/// The full patient record at `as_of` (or now), if the patient exists then.
fn patient_record(
  conn: &Connection,
  asm: &mut Assembler<'_>,
  insurance_id: &str,
  as_of: Option<DateTime<Utc>>,
) -> Result<Option<PatientRecord>> {
  let Some(patient) =
    select_versions::<User>(conn, "medical_insurance_id", text(insurance_id), as_of)?
      .into_iter()
      .next()
  else {
    return Ok(None);
  };

  let coordinates =
    select_versions::<Coordinate>(conn, "user_id", uuid_value(patient.user_id), as_of)?;
  let history =
    select_versions::<MedicalHistory>(conn, "patient_id", text(insurance_id), as_of)?;
  let visits = select_versions::<MedicalVisit>(conn, "patient_id", text(insurance_id), as_of)?;
  let links = parents::select_links(conn, patient.user_id, as_of)?;

  Ok(Some(PatientRecord {
    coordinates,
    medical_history: asm.history(history)?,
    medical_visits: asm.visits(visits)?,
    parents: asm.parents(links)?,
    patient,
    as_of,
  }))
}

/// Every instant at which any stream of the patient changed: versions of
/// the patient, their coordinates, history and visits, parent links, and
/// hides within those streams.
fn change_instants(
  conn: &Connection,
  user_id: Uuid,
  insurance_id: &str,
) -> Result<BTreeSet<String>> {
  let mut stmt = conn.prepare(
    "SELECT modified_at FROM users WHERE user_id = ?1
     UNION SELECT modified_at FROM coordinates WHERE user_id = ?1
     UNION SELECT modified_at FROM medical_history WHERE patient_id = ?2
     UNION SELECT modified_at FROM medical_visits WHERE patient_id = ?2
     UNION SELECT created_at FROM parents WHERE child_id = ?1
     UNION SELECT h.hidden_at FROM hide_events h
       JOIN coordinates t ON h.table_name = 'coordinates' AND h.unique_id = t.unique_id
       WHERE t.user_id = ?1
     UNION SELECT h.hidden_at FROM hide_events h
       JOIN medical_history t ON h.table_name = 'medical_history' AND h.unique_id = t.unique_id
       WHERE t.patient_id = ?2
     UNION SELECT h.hidden_at FROM hide_events h
       JOIN medical_visits t ON h.table_name = 'medical_visits' AND h.unique_id = t.unique_id
       WHERE t.patient_id = ?2
     UNION SELECT h.hidden_at FROM hide_events h
       JOIN parents t ON h.table_name = 'parents' AND h.unique_id = t.unique_id
       WHERE t.child_id = ?1",
  )?;
  let instants = stmt
    .query_map(params![encode_uuid(user_id), insurance_id], |r| r.get::<_, String>(0))?
    .collect::<rusqlite::Result<BTreeSet<_>>>()?;
  Ok(instants)
}

fn version_history(conn: &Connection, insurance_id: &str) -> Result<VersionHistory> {
  let patient = live_patient(conn, insurance_id)?
    .ok_or_else(|| Error::not_found(EntityKind::Patient, insurance_id))?;

  let mut asm = Assembler::new(conn);
  let mut history = VersionHistory::new();
  for instant in change_instants(conn, patient.user_id, insurance_id)? {
    let at = decode_dt(&instant)?;
    if let Some(record) = patient_record(conn, &mut asm, insurance_id, Some(at))? {
      history.insert(encode_dt(at), record);
    }
  }
  Ok(history)
}

fn current_doctors(conn: &Connection) -> Result<Vec<User>> {
  select_versions::<User>(conn, "user_type", text(UserType::Doctor.as_str()), None)
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = self.write(move |conn| insert_user(conn, input, now())).await?;
    info!(user_id = %user.user_id, user_type = user.user_type.as_str(), "created user");
    Ok(user)
  }

  async fn get_user(&self, user_id: Uuid, as_of: Option<DateTime<Utc>>) -> Result<User> {
    self
      .read(move |conn| {
        select_versions::<User>(conn, "user_id", uuid_value(user_id), as_of)?
          .into_iter()
          .next()
          .ok_or_else(|| Error::not_found(EntityKind::User, user_id))
      })
      .await
  }

  async fn update_user(&self, user_id: Uuid, patch: UserPatch) -> Result<User> {
    let user = self
      .write(move |conn| append_version::<User>(conn, user_id, |u| patch.apply(u)))
      .await?;
    info!(%user_id, modified_at = %user.modified_at, "appended user version");
    Ok(user)
  }

  async fn hide_user(&self, user_id: Uuid) -> Result<bool> {
    let hidden = self.write(move |conn| hide::<User>(conn, user_id)).await?;
    info!(%user_id, hidden, "hide user");
    Ok(hidden)
  }

  async fn list_doctors(&self) -> Result<Vec<DoctorIdentity>> {
    let doctors = self.read(current_doctors).await?;
    Ok(doctors.iter().map(DoctorIdentity::from).collect())
  }

  async fn find_doctor_by_name(
    &self,
    first_name: String,
    last_name: String,
  ) -> Result<Option<Uuid>> {
    let doctors = self.read(current_doctors).await?;
    Ok(
      doctors
        .into_iter()
        .find(|d| d.first_name == first_name && d.last_name == last_name)
        .map(|d| d.user_id),
    )
  }

  // ── Patients ──────────────────────────────────────────────────────────────

  async fn create_patient(&self, input: NewPatient) -> Result<User> {
    let NewPatient { mut user, coordinates, parent_ids } = input;
    if user.medical_insurance_id.as_deref().is_none_or(str::is_empty) {
      return Err(Error::Validation("a patient needs a medical insurance id".into()));
    }
    user.user_type = UserType::Patient;

    let (patient, n_coordinates, n_parents) = self
      .write(move |conn| {
        let at = now();
        for &parent_id in &parent_ids {
          require_user(conn, parent_id)?;
        }
        let patient = insert_user(conn, user, at)?;
        for c in coordinates.iter().cloned() {
          insert_coordinate(conn, patient.user_id, c, at)?;
        }
        for &parent_id in &parent_ids {
          parents::link(conn, patient.user_id, parent_id, at)?;
        }
        Ok((patient, coordinates.len(), parent_ids.len()))
      })
      .await?;

    info!(
      user_id = %patient.user_id,
      coordinates = n_coordinates,
      parents = n_parents,
      "created patient"
    );
    Ok(patient)
  }

  async fn get_patient(
    &self,
    insurance_id: String,
    as_of: Option<DateTime<Utc>>,
  ) -> Result<PatientRecord> {
    self
      .read(move |conn| {
        let mut asm = Assembler::new(conn);
        patient_record(conn, &mut asm, &insurance_id, as_of)?
          .ok_or_else(|| Error::not_found(EntityKind::Patient, &insurance_id))
      })
      .await
  }

  async fn update_patient(&self, insurance_id: String, patch: UserPatch) -> Result<User> {
    let user = self
      .write(move |conn| {
        let patient = live_patient(conn, &insurance_id)?
          .ok_or_else(|| Error::not_found(EntityKind::Patient, &insurance_id))?;
        append_version::<User>(conn, patient.user_id, |u| patch.apply(u))
      })
      .await?;
    info!(user_id = %user.user_id, modified_at = %user.modified_at, "appended patient version");
    Ok(user)
  }

  async fn hide_patient(&self, insurance_id: String) -> Result<bool> {
    self
      .write(move |conn| {
        let latest: Option<String> = conn
          .query_row(
            "SELECT user_id FROM users WHERE medical_insurance_id = ?1
             ORDER BY unique_id DESC LIMIT 1",
            params![insurance_id],
            |r| r.get(0),
          )
          .optional()?;
        let Some(user_id) = latest.as_deref().map(decode_uuid).transpose()? else {
          return Ok(false);
        };
        let hidden = hide::<User>(conn, user_id)?;
        info!(%user_id, hidden, "hide patient");
        Ok(hidden)
      })
      .await
  }

  async fn patient_version_history(&self, insurance_id: String) -> Result<VersionHistory> {
    let history = self.read(move |conn| version_history(conn, &insurance_id)).await?;
    debug!(snapshots = history.len(), "reconstructed version history");
    Ok(history)
  }

  // ── Coordinates ───────────────────────────────────────────────────────────

  async fn add_coordinate(&self, user_id: Uuid, input: NewCoordinate) -> Result<Coordinate> {
    let coordinate = self
      .write(move |conn| {
        require_user(conn, user_id)?;
        insert_coordinate(conn, user_id, input, now())
      })
      .await?;
    info!(coordinate_id = %coordinate.coordinate_id, %user_id, "added coordinate");
    Ok(coordinate)
  }

  async fn get_coordinates(
    &self,
    user_id: Uuid,
    as_of: Option<DateTime<Utc>>,
  ) -> Result<Vec<Coordinate>> {
    self
      .read(move |conn| {
        if !user_visible(conn, user_id, as_of)? {
          return Err(Error::not_found(EntityKind::User, user_id));
        }
        select_versions::<Coordinate>(conn, "user_id", uuid_value(user_id), as_of)
      })
      .await
  }

  async fn update_coordinate(
    &self,
    coordinate_id: Uuid,
    patch: CoordinatePatch,
  ) -> Result<Coordinate> {
    let coordinate = self
      .write(move |conn| append_version::<Coordinate>(conn, coordinate_id, |c| patch.apply(c)))
      .await?;
    info!(%coordinate_id, modified_at = %coordinate.modified_at, "appended coordinate version");
    Ok(coordinate)
  }

  async fn hide_coordinate(&self, coordinate_id: Uuid) -> Result<bool> {
    let hidden = self.write(move |conn| hide::<Coordinate>(conn, coordinate_id)).await?;
    info!(%coordinate_id, hidden, "hide coordinate");
    Ok(hidden)
  }

  // ── Medical history ───────────────────────────────────────────────────────

  async fn add_history(&self, insurance_id: String, input: NewHistory) -> Result<MedicalHistory> {
    let entry = self
      .write(move |conn| {
        require_patient(conn, &insurance_id)?;
        require_user(conn, input.doctor_id)?;
        let at = now();
        let entry = MedicalHistory {
          history_id: Uuid::new_v4(),
          patient_id: insurance_id,
          diagnostic: input.diagnostic,
          treatment: input.treatment,
          doctor_id: input.doctor_id,
          start_date: input.start_date,
          end_date: input.end_date,
          created_at: at,
          modified_at: at,
        };
        insert_version(conn, &entry)?;
        Ok(entry)
      })
      .await?;
    info!(history_id = %entry.history_id, "added medical history entry");
    Ok(entry)
  }

  async fn get_history(
    &self,
    insurance_id: String,
    as_of: Option<DateTime<Utc>>,
  ) -> Result<Vec<HistoryView>> {
    self
      .read(move |conn| {
        if !patient_visible(conn, &insurance_id, as_of)? {
          return Err(Error::not_found(EntityKind::Patient, &insurance_id));
        }
        let rows =
          select_versions::<MedicalHistory>(conn, "patient_id", text(&insurance_id), as_of)?;
        Assembler::new(conn).history(rows)
      })
      .await
  }

  async fn update_history(&self, history_id: Uuid, patch: HistoryPatch) -> Result<MedicalHistory> {
    let entry = self
      .write(move |conn| {
        if let Some(&doctor_id) = patch.doctor_id.as_set() {
          require_user(conn, doctor_id)?;
        }
        append_version::<MedicalHistory>(conn, history_id, |h| patch.apply(h))
      })
      .await?;
    info!(%history_id, modified_at = %entry.modified_at, "appended medical history version");
    Ok(entry)
  }

  async fn hide_history(&self, history_id: Uuid) -> Result<bool> {
    let hidden = self.write(move |conn| hide::<MedicalHistory>(conn, history_id)).await?;
    info!(%history_id, hidden, "hide medical history entry");
    Ok(hidden)
  }

  // ── Medical visits ────────────────────────────────────────────────────────

  async fn add_visit(&self, insurance_id: String, input: NewVisit) -> Result<MedicalVisit> {
    let visit = self
      .write(move |conn| {
        require_patient(conn, &insurance_id)?;
        require_user(conn, input.doctor_id)?;
        require_establishment(conn, input.establishment_id)?;
        let at = now();
        let visit = MedicalVisit {
          visit_id: Uuid::new_v4(),
          patient_id: insurance_id,
          establishment_id: input.establishment_id,
          doctor_id: input.doctor_id,
          visit_date: input.visit_date,
          diagnostic: input.diagnostic,
          treatment: input.treatment,
          summary: input.summary,
          notes: input.notes,
          created_at: at,
          modified_at: at,
        };
        insert_version(conn, &visit)?;
        Ok(visit)
      })
      .await?;
    info!(visit_id = %visit.visit_id, "added medical visit");
    Ok(visit)
  }

  async fn get_visits(
    &self,
    insurance_id: String,
    as_of: Option<DateTime<Utc>>,
  ) -> Result<Vec<VisitView>> {
    self
      .read(move |conn| {
        if !patient_visible(conn, &insurance_id, as_of)? {
          return Err(Error::not_found(EntityKind::Patient, &insurance_id));
        }
        let rows =
          select_versions::<MedicalVisit>(conn, "patient_id", text(&insurance_id), as_of)?;
        Assembler::new(conn).visits(rows)
      })
      .await
  }

  async fn update_visit(&self, visit_id: Uuid, patch: VisitPatch) -> Result<MedicalVisit> {
    let visit = self
      .write(move |conn| {
        if let Some(&doctor_id) = patch.doctor_id.as_set() {
          require_user(conn, doctor_id)?;
        }
        if let Some(&establishment_id) = patch.establishment_id.as_set() {
          require_establishment(conn, establishment_id)?;
        }
        append_version::<MedicalVisit>(conn, visit_id, |v| patch.apply(v))
      })
      .await?;
    info!(%visit_id, modified_at = %visit.modified_at, "appended medical visit version");
    Ok(visit)
  }

  async fn hide_visit(&self, visit_id: Uuid) -> Result<bool> {
    let hidden = self.write(move |conn| hide::<MedicalVisit>(conn, visit_id)).await?;
    info!(%visit_id, hidden, "hide medical visit");
    Ok(hidden)
  }

  // ── Establishments ────────────────────────────────────────────────────────

  async fn create_establishment(&self, name: String) -> Result<Establishment> {
    if name.trim().is_empty() {
      return Err(Error::Validation("establishment name must not be empty".into()));
    }
    let establishment = Establishment {
      establishment_id:   Uuid::new_v4(),
      establishment_name: name,
      created_at:         now(),
    };

    let id_str = encode_uuid(establishment.establishment_id);
    let name = establishment.establishment_name.clone();
    let at_str = encode_dt(establishment.created_at);
    self
      .write(move |conn| {
        conn.execute(
          "INSERT INTO establishments (establishment_id, establishment_name, created_at, hidden)
           VALUES (?1, ?2, ?3, 0)",
          params![id_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    info!(establishment_id = %establishment.establishment_id, "created establishment");
    Ok(establishment)
  }

  async fn list_establishments(&self) -> Result<Vec<Establishment>> {
    self
      .read(|conn| {
        let mut stmt = conn.prepare(
          "SELECT * FROM establishments WHERE hidden = 0
           ORDER BY establishment_name, created_at",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
          out.push(establishment_from_row(row)?);
        }
        Ok(out)
      })
      .await
  }

  async fn find_establishment_by_name(&self, name: String) -> Result<Option<Uuid>> {
    self
      .read(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT * FROM establishments WHERE hidden = 0 AND establishment_name = ?1
           ORDER BY created_at LIMIT 1",
        )?;
        let mut rows = stmt.query(params![name])?;
        Ok(rows.next()?.map(establishment_from_row).transpose()?.map(|e| e.establishment_id))
      })
      .await
  }

  async fn hide_establishment(&self, establishment_id: Uuid) -> Result<bool> {
    let hidden = self
      .write(move |conn| {
        if load_establishment(conn, establishment_id)?.is_none() {
          return Ok(false);
        }
        conn.execute(
          "UPDATE establishments SET hidden = 1 WHERE establishment_id = ?1",
          params![encode_uuid(establishment_id)],
        )?;
        Ok(true)
      })
      .await?;
    info!(%establishment_id, hidden, "hide establishment");
    Ok(hidden)
  }

  // ── Parents ───────────────────────────────────────────────────────────────

  async fn link_parent(&self, child_id: Uuid, parent_id: Uuid) -> Result<ParentLink> {
    let link = self.write(move |conn| parents::link(conn, child_id, parent_id, now())).await?;
    info!(%child_id, %parent_id, linked_at = %link.linked_at, "linked parent");
    Ok(link)
  }

  async fn add_new_parent(&self, child_id: Uuid, input: NewParent) -> Result<User> {
    let parent = self
      .write(move |conn| {
        require_user(conn, child_id)?;
        let at = now();
        let parent = insert_user(conn, NewUser::from(input), at)?;
        parents::link(conn, child_id, parent.user_id, at)?;
        Ok(parent)
      })
      .await?;
    info!(%child_id, parent_id = %parent.user_id, "created and linked parent");
    Ok(parent)
  }

  async fn get_parents(
    &self,
    child_id: Uuid,
    as_of: Option<DateTime<Utc>>,
  ) -> Result<Vec<ParentView>> {
    self
      .read(move |conn| {
        if !user_visible(conn, child_id, as_of)? {
          return Err(Error::not_found(EntityKind::User, child_id));
        }
        let links = parents::select_links(conn, child_id, as_of)?;
        Assembler::new(conn).parents(links)
      })
      .await
  }

  async fn unlink_parent(&self, child_id: Uuid, parent_id: Uuid) -> Result<bool> {
    let unlinked = self.write(move |conn| parents::unlink(conn, child_id, parent_id)).await?;
    info!(%child_id, %parent_id, unlinked, "unlink parent");
    Ok(unlinked)
  }
}
