//! The versioning engine, written once for every versioned table.
//!
//! A logical entity is the set of rows sharing its logical id. Its latest
//! version is the row with the highest `unique_id`. Writes append rows;
//! a hide sets `hidden` on the latest row and records a `hide_events` row.
//!
//! All functions here take a plain [`Connection`] and are meant to run inside
//! the transaction opened by the store.

use chrono::{DateTime, Utc};
use medrec_core::{
  EntityKind,
  record::{Coordinate, MedicalHistory, MedicalVisit},
  user::User,
};
use rusqlite::{Connection, OptionalExtension as _, Row, params, params_from_iter, types::Value};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    col_bool, col_dt, col_opt_date, col_opt_dt, col_opt_text, col_text, col_uuid, decode_dt,
    dt_value, encode_dt, encode_uuid, next_stamp, opt_date_value, opt_dt_value, opt_text, text,
    uuid_value,
  },
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A domain type stored as an append-only sequence of versions.
pub trait Versioned: Sized + Send + 'static {
  const KIND: EntityKind;
  const TABLE: &'static str;
  const ID_COLUMN: &'static str;
  /// Domain columns, in the order produced by [`Versioned::values`].
  const COLUMNS: &'static [&'static str];

  fn logical_id(&self) -> Uuid;
  fn created_at(&self) -> DateTime<Utc>;
  fn modified_at(&self) -> DateTime<Utc>;
  fn set_modified_at(&mut self, at: DateTime<Utc>);
  fn values(&self) -> Vec<Value>;
  fn from_row(row: &Row<'_>) -> Result<Self>;
}

/// The newest physical row of a logical entity.
pub struct Latest<T> {
  pub unique_id: i64,
  pub row:       T,
  pub hidden:    bool,
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Insert `row` as a new physical version. Returns its `unique_id`.
pub fn insert_version<T: Versioned>(conn: &Connection, row: &T) -> Result<i64> {
  let columns = T::COLUMNS.join(", ");
  let n = T::COLUMNS.len();
  let placeholders = (1..=n + 3)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  let sql = format!(
    "INSERT INTO {table} ({id}, {columns}, created_at, modified_at, hidden)
     VALUES ({placeholders}, 0)",
    table = T::TABLE,
    id = T::ID_COLUMN,
  );

  let mut values = Vec::with_capacity(n + 3);
  values.push(uuid_value(row.logical_id()));
  values.extend(row.values());
  values.push(dt_value(row.created_at()));
  values.push(dt_value(row.modified_at()));

  conn.execute(&sql, params_from_iter(values))?;
  Ok(conn.last_insert_rowid())
}

/// Append a version of `id` built by applying `edit` to the latest one.
///
/// Fails with `NotFound` if the entity has no rows or its latest row is
/// hidden; hidden entities are never brought back by an update.
pub fn append_version<T: Versioned>(
  conn: &Connection,
  id: Uuid,
  edit: impl FnOnce(&mut T),
) -> Result<T> {
  let latest = select_latest::<T>(conn, id)?
    .filter(|l| !l.hidden)
    .ok_or_else(|| Error::not_found(T::KIND, id))?;

  let previous = latest.row.modified_at();
  let mut next = latest.row;
  edit(&mut next);
  next.set_modified_at(next_stamp(previous));

  insert_version(conn, &next)?;
  Ok(next)
}

/// Hide the latest version of `id`.
///
/// Returns `false` if `id` has no rows. Hiding an already hidden entity
/// returns `true` and writes nothing.
pub fn hide<T: Versioned>(conn: &Connection, id: Uuid) -> Result<bool> {
  let Some(latest) = select_latest::<T>(conn, id)? else {
    return Ok(false);
  };
  if latest.hidden {
    return Ok(true);
  }
  mark_hidden(conn, T::TABLE, latest.unique_id, next_stamp(latest.row.modified_at()))?;
  Ok(true)
}

/// Set `hidden` on one physical row and record when it happened.
pub fn mark_hidden(
  conn: &Connection,
  table: &str,
  unique_id: i64,
  at: DateTime<Utc>,
) -> Result<()> {
  conn.execute(
    &format!("UPDATE {table} SET hidden = 1 WHERE unique_id = ?1"),
    params![unique_id],
  )?;
  conn.execute(
    "INSERT INTO hide_events (table_name, unique_id, hidden_at) VALUES (?1, ?2, ?3)",
    params![table, unique_id, encode_dt(at)],
  )?;
  Ok(())
}

/// When a physical row was hidden, if it was.
pub fn hidden_at(conn: &Connection, table: &str, unique_id: i64) -> Result<Option<DateTime<Utc>>> {
  let at: Option<String> = conn
    .query_row(
      "SELECT hidden_at FROM hide_events WHERE table_name = ?1 AND unique_id = ?2",
      params![table, unique_id],
      |r| r.get(0),
    )
    .optional()?;
  at.as_deref().map(decode_dt).transpose()
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// The newest physical row of `id`, hidden or not.
pub fn select_latest<T: Versioned>(conn: &Connection, id: Uuid) -> Result<Option<Latest<T>>> {
  let sql = format!(
    "SELECT * FROM {table} WHERE {id_col} = ?1 ORDER BY unique_id DESC LIMIT 1",
    table = T::TABLE,
    id_col = T::ID_COLUMN,
  );
  let mut stmt = conn.prepare(&sql)?;
  let mut rows = stmt.query(params![encode_uuid(id)])?;
  let Some(row) = rows.next()? else {
    return Ok(None);
  };
  Ok(Some(Latest {
    unique_id: row.get("unique_id")?,
    hidden:    col_bool(row, "hidden")?,
    row:       T::from_row(row)?,
  }))
}

/// Whether `id` is a live entity: it has rows and its latest is not hidden.
pub fn is_live<T: Versioned>(conn: &Connection, id: Uuid) -> Result<bool> {
  Ok(select_latest::<T>(conn, id)?.is_some_and(|l| !l.hidden))
}

/// Whether any row of the table has `owner_col = owner`.
pub fn owner_known(conn: &Connection, table: &str, owner_col: &str, owner: Value) -> Result<bool> {
  let sql = format!("SELECT 1 FROM {table} WHERE {owner_col} = ?1 LIMIT 1");
  Ok(conn.query_row(&sql, [owner], |_| Ok(())).optional()?.is_some())
}

/// One version per logical id among rows with `owner_col = owner`.
///
/// With `as_of = None` this is current state: the latest row of each id,
/// dropped if it is hidden. With `Some(t)` this is the state at `t`: the
/// newest row with `modified_at <= t`, dropped only if it had been hidden
/// by `t`.
pub fn select_versions<T: Versioned>(
  conn: &Connection,
  owner_col: &str,
  owner: Value,
  as_of: Option<DateTime<Utc>>,
) -> Result<Vec<T>> {
  let table = T::TABLE;
  let id_col = T::ID_COLUMN;

  let (sql, params) = match as_of {
    None => (
      format!(
        "SELECT * FROM (
           SELECT t.*, ROW_NUMBER() OVER (
             PARTITION BY t.{id_col} ORDER BY t.unique_id DESC
           ) AS rn
           FROM {table} t
           WHERE t.{owner_col} = ?1
         ) r
         WHERE r.rn = 1 AND r.hidden = 0
         ORDER BY r.created_at, r.{id_col}"
      ),
      vec![owner],
    ),
    Some(at) => (
      format!(
        "SELECT * FROM (
           SELECT t.*, ROW_NUMBER() OVER (
             PARTITION BY t.{id_col} ORDER BY t.modified_at DESC, t.unique_id DESC
           ) AS rn
           FROM {table} t
           WHERE t.{owner_col} = ?1 AND t.modified_at <= ?2
         ) r
         WHERE r.rn = 1
           AND NOT EXISTS (
             SELECT 1 FROM hide_events h
             WHERE h.table_name = '{table}'
               AND h.unique_id = r.unique_id
               AND h.hidden_at <= ?2
           )
         ORDER BY r.created_at, r.{id_col}"
      ),
      vec![owner, dt_value(at)],
    ),
  };

  let mut stmt = conn.prepare(&sql)?;
  let mut rows = stmt.query(params_from_iter(params))?;
  let mut out = Vec::new();
  while let Some(row) = rows.next()? {
    out.push(T::from_row(row)?);
  }
  Ok(out)
}

// ─── Impls ───────────────────────────────────────────────────────────────────

impl Versioned for User {
  const KIND: EntityKind = EntityKind::User;
  const TABLE: &'static str = "users";
  const ID_COLUMN: &'static str = "user_id";
  const COLUMNS: &'static [&'static str] = &[
    "medical_insurance_id",
    "login",
    "password_hash",
    "user_type",
    "first_name",
    "last_name",
    "phone_number",
    "email",
    "gender",
    "city_of_birth",
    "date_of_birth",
  ];

  fn logical_id(&self) -> Uuid { self.user_id }
  fn created_at(&self) -> DateTime<Utc> { self.created_at }
  fn modified_at(&self) -> DateTime<Utc> { self.modified_at }
  fn set_modified_at(&mut self, at: DateTime<Utc>) { self.modified_at = at; }

  fn values(&self) -> Vec<Value> {
    vec![
      opt_text(self.medical_insurance_id.as_deref()),
      text(&self.login),
      text(&self.password_hash),
      text(self.user_type.as_str()),
      text(&self.first_name),
      text(&self.last_name),
      text(&self.phone_number),
      text(&self.email),
      opt_text(self.gender.as_deref()),
      opt_text(self.city_of_birth.as_deref()),
      opt_date_value(self.date_of_birth),
    ]
  }

  fn from_row(row: &Row<'_>) -> Result<Self> {
    Ok(User {
      user_id:              col_uuid(row, "user_id")?,
      medical_insurance_id: col_opt_text(row, "medical_insurance_id")?,
      login:                col_text(row, "login")?,
      password_hash:        col_text(row, "password_hash")?,
      user_type:            col_text(row, "user_type")?.parse()?,
      first_name:           col_text(row, "first_name")?,
      last_name:            col_text(row, "last_name")?,
      phone_number:         col_text(row, "phone_number")?,
      email:                col_text(row, "email")?,
      gender:               col_opt_text(row, "gender")?,
      city_of_birth:        col_opt_text(row, "city_of_birth")?,
      date_of_birth:        col_opt_date(row, "date_of_birth")?,
      created_at:           col_dt(row, "created_at")?,
      modified_at:          col_dt(row, "modified_at")?,
    })
  }
}

impl Versioned for Coordinate {
  const KIND: EntityKind = EntityKind::Coordinate;
  const TABLE: &'static str = "coordinates";
  const ID_COLUMN: &'static str = "coordinate_id";
  const COLUMNS: &'static [&'static str] =
    &["user_id", "street_address", "apartment", "postal_code", "city", "country"];

  fn logical_id(&self) -> Uuid { self.coordinate_id }
  fn created_at(&self) -> DateTime<Utc> { self.created_at }
  fn modified_at(&self) -> DateTime<Utc> { self.modified_at }
  fn set_modified_at(&mut self, at: DateTime<Utc>) { self.modified_at = at; }

  fn values(&self) -> Vec<Value> {
    vec![
      uuid_value(self.user_id),
      text(&self.street_address),
      opt_text(self.apartment.as_deref()),
      text(&self.postal_code),
      text(&self.city),
      text(&self.country),
    ]
  }

  fn from_row(row: &Row<'_>) -> Result<Self> {
    Ok(Coordinate {
      coordinate_id:  col_uuid(row, "coordinate_id")?,
      user_id:        col_uuid(row, "user_id")?,
      street_address: col_text(row, "street_address")?,
      apartment:      col_opt_text(row, "apartment")?,
      postal_code:    col_text(row, "postal_code")?,
      city:           col_text(row, "city")?,
      country:        col_text(row, "country")?,
      created_at:     col_dt(row, "created_at")?,
      modified_at:    col_dt(row, "modified_at")?,
    })
  }
}

impl Versioned for MedicalHistory {
  const KIND: EntityKind = EntityKind::MedicalHistory;
  const TABLE: &'static str = "medical_history";
  const ID_COLUMN: &'static str = "history_id";
  const COLUMNS: &'static [&'static str] =
    &["patient_id", "diagnostic", "treatment", "doctor_id", "start_date", "end_date"];

  fn logical_id(&self) -> Uuid { self.history_id }
  fn created_at(&self) -> DateTime<Utc> { self.created_at }
  fn modified_at(&self) -> DateTime<Utc> { self.modified_at }
  fn set_modified_at(&mut self, at: DateTime<Utc>) { self.modified_at = at; }

  fn values(&self) -> Vec<Value> {
    vec![
      text(&self.patient_id),
      text(&self.diagnostic),
      text(&self.treatment),
      uuid_value(self.doctor_id),
      opt_date_value(self.start_date),
      opt_date_value(self.end_date),
    ]
  }

  fn from_row(row: &Row<'_>) -> Result<Self> {
    Ok(MedicalHistory {
      history_id:  col_uuid(row, "history_id")?,
      patient_id:  col_text(row, "patient_id")?,
      diagnostic:  col_text(row, "diagnostic")?,
      treatment:   col_text(row, "treatment")?,
      doctor_id:   col_uuid(row, "doctor_id")?,
      start_date:  col_opt_date(row, "start_date")?,
      end_date:    col_opt_date(row, "end_date")?,
      created_at:  col_dt(row, "created_at")?,
      modified_at: col_dt(row, "modified_at")?,
    })
  }
}

impl Versioned for MedicalVisit {
  const KIND: EntityKind = EntityKind::MedicalVisit;
  const TABLE: &'static str = "medical_visits";
  const ID_COLUMN: &'static str = "visit_id";
  const COLUMNS: &'static [&'static str] = &[
    "patient_id",
    "establishment_id",
    "doctor_id",
    "visit_date",
    "diagnostic",
    "treatment",
    "summary",
    "notes",
  ];

  fn logical_id(&self) -> Uuid { self.visit_id }
  fn created_at(&self) -> DateTime<Utc> { self.created_at }
  fn modified_at(&self) -> DateTime<Utc> { self.modified_at }
  fn set_modified_at(&mut self, at: DateTime<Utc>) { self.modified_at = at; }

  fn values(&self) -> Vec<Value> {
    vec![
      text(&self.patient_id),
      uuid_value(self.establishment_id),
      uuid_value(self.doctor_id),
      opt_dt_value(self.visit_date),
      opt_text(self.diagnostic.as_deref()),
      opt_text(self.treatment.as_deref()),
      text(&self.summary),
      opt_text(self.notes.as_deref()),
    ]
  }

  fn from_row(row: &Row<'_>) -> Result<Self> {
    Ok(MedicalVisit {
      visit_id:         col_uuid(row, "visit_id")?,
      patient_id:       col_text(row, "patient_id")?,
      establishment_id: col_uuid(row, "establishment_id")?,
      doctor_id:        col_uuid(row, "doctor_id")?,
      visit_date:       col_opt_dt(row, "visit_date")?,
      diagnostic:       col_opt_text(row, "diagnostic")?,
      treatment:        col_opt_text(row, "treatment")?,
      summary:          col_text(row, "summary")?,
      notes:            col_opt_text(row, "notes")?,
      created_at:       col_dt(row, "created_at")?,
      modified_at:      col_dt(row, "modified_at")?,
    })
  }
}
