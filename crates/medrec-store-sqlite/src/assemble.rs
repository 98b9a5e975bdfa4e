//! Read-side assembly of selected rows into display models.
//!
//! Doctor, establishment and parent identities are taken from the referenced
//! entity's current row, whatever instant the rows themselves were selected
//! at. Lookups are cached for the lifetime of one [`Assembler`], which spans
//! a single request.

use std::collections::HashMap;

use medrec_core::{
  record::{Establishment, MedicalHistory, MedicalVisit, ParentLink},
  user::User,
  view::{DoctorIdentity, HistoryView, ParentView, VisitView},
};
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{col_dt, col_text, col_uuid, encode_uuid},
  versioned::select_latest,
};

pub struct Assembler<'c> {
  conn:           &'c Connection,
  users:          HashMap<Uuid, Option<User>>,
  establishments: HashMap<Uuid, Option<Establishment>>,
}

impl<'c> Assembler<'c> {
  pub fn new(conn: &'c Connection) -> Self {
    Self { conn, users: HashMap::new(), establishments: HashMap::new() }
  }

  /// The latest row of a user, hidden or not.
  pub fn user(&mut self, id: Uuid) -> Result<Option<User>> {
    if let Some(cached) = self.users.get(&id) {
      return Ok(cached.clone());
    }
    let user = select_latest::<User>(self.conn, id)?.map(|l| l.row);
    self.users.insert(id, user.clone());
    Ok(user)
  }

  pub fn doctor(&mut self, id: Uuid) -> Result<Option<DoctorIdentity>> {
    Ok(self.user(id)?.as_ref().map(DoctorIdentity::from))
  }

  pub fn establishment(&mut self, id: Uuid) -> Result<Option<Establishment>> {
    if let Some(cached) = self.establishments.get(&id) {
      return Ok(cached.clone());
    }
    let found = load_establishment(self.conn, id)?;
    self.establishments.insert(id, found.clone());
    Ok(found)
  }

  pub fn history(&mut self, rows: Vec<MedicalHistory>) -> Result<Vec<HistoryView>> {
    rows
      .into_iter()
      .map(|entry| {
        let doctor = self.doctor(entry.doctor_id)?;
        Ok(HistoryView { entry, doctor })
      })
      .collect()
  }

  pub fn visits(&mut self, rows: Vec<MedicalVisit>) -> Result<Vec<VisitView>> {
    rows
      .into_iter()
      .map(|visit| {
        let doctor = self.doctor(visit.doctor_id)?;
        let establishment = self.establishment(visit.establishment_id)?;
        Ok(VisitView { visit, doctor, establishment })
      })
      .collect()
  }

  pub fn parents(&mut self, links: Vec<ParentLink>) -> Result<Vec<ParentView>> {
    links
      .into_iter()
      .map(|link| {
        let parent = self.user(link.parent_id)?;
        Ok(ParentView { parent_id: link.parent_id, linked_at: link.linked_at, parent })
      })
      .collect()
  }
}

/// An establishment row regardless of its hidden flag.
pub fn load_establishment(conn: &Connection, id: Uuid) -> Result<Option<Establishment>> {
  let mut stmt = conn.prepare("SELECT * FROM establishments WHERE establishment_id = ?1")?;
  let mut rows = stmt.query(params![encode_uuid(id)])?;
  rows.next()?.map(establishment_from_row).transpose()
}

/// Decode an `establishments` row selected with `SELECT *`.
pub fn establishment_from_row(row: &Row<'_>) -> Result<Establishment> {
  Ok(Establishment {
    establishment_id:   col_uuid(row, "establishment_id")?,
    establishment_name: col_text(row, "establishment_name")?,
    created_at:         col_dt(row, "created_at")?,
  })
}
