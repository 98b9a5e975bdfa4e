//! The `parents` table: an append/hide log of (parent, child) pairs.
//!
//! A pair is linked while its newest row is not hidden. Relinking after an
//! unlink appends a fresh row, so the full link history stays readable.

use chrono::{DateTime, Utc};
use medrec_core::{EntityKind, record::ParentLink, user::User};
use rusqlite::{Connection, Row, params, params_from_iter};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{col_bool, col_dt, col_uuid, dt_value, encode_dt, encode_uuid, next_stamp, uuid_value},
  versioned::{hidden_at, is_live, mark_hidden},
};

const TABLE: &str = "parents";

struct LinkRow {
  unique_id: i64,
  link:      ParentLink,
  hidden:    bool,
}

fn link_from_row(row: &Row<'_>) -> Result<ParentLink> {
  Ok(ParentLink {
    parent_id: col_uuid(row, "parent_id")?,
    child_id:  col_uuid(row, "child_id")?,
    linked_at: col_dt(row, "created_at")?,
  })
}

fn latest_link(conn: &Connection, child_id: Uuid, parent_id: Uuid) -> Result<Option<LinkRow>> {
  let mut stmt = conn.prepare(
    "SELECT * FROM parents WHERE child_id = ?1 AND parent_id = ?2
     ORDER BY unique_id DESC LIMIT 1",
  )?;
  let mut rows = stmt.query(params![encode_uuid(child_id), encode_uuid(parent_id)])?;
  let Some(row) = rows.next()? else {
    return Ok(None);
  };
  Ok(Some(LinkRow {
    unique_id: row.get("unique_id")?,
    hidden:    col_bool(row, "hidden")?,
    link:      link_from_row(row)?,
  }))
}

/// Link `parent_id` to `child_id` at `at`, the instant of the enclosing
/// write. Both must be live users. An existing link is returned as is; a
/// relink never stamps at or before the previous unlink.
pub fn link(
  conn: &Connection,
  child_id: Uuid,
  parent_id: Uuid,
  at: DateTime<Utc>,
) -> Result<ParentLink> {
  if child_id == parent_id {
    return Err(Error::Validation("a user cannot be their own parent".into()));
  }
  for id in [child_id, parent_id] {
    if !is_live::<User>(conn, id)? {
      return Err(Error::missing_reference(EntityKind::User, id));
    }
  }

  let linked_at = match latest_link(conn, child_id, parent_id)? {
    Some(l) if !l.hidden => return Ok(l.link),
    Some(l) => {
      let unlinked = hidden_at(conn, TABLE, l.unique_id)?.unwrap_or(l.link.linked_at);
      at.max(next_stamp(unlinked))
    }
    None => at,
  };

  conn.execute(
    "INSERT INTO parents (parent_id, child_id, created_at, hidden) VALUES (?1, ?2, ?3, 0)",
    params![encode_uuid(parent_id), encode_uuid(child_id), encode_dt(linked_at)],
  )?;
  Ok(ParentLink { parent_id, child_id, linked_at })
}

/// Hide the current link between the pair. `false` if they were never
/// linked.
pub fn unlink(conn: &Connection, child_id: Uuid, parent_id: Uuid) -> Result<bool> {
  let Some(latest) = latest_link(conn, child_id, parent_id)? else {
    return Ok(false);
  };
  if latest.hidden {
    return Ok(true);
  }
  mark_hidden(conn, TABLE, latest.unique_id, next_stamp(latest.link.linked_at))?;
  Ok(true)
}

/// The parents of `child_id`, currently or as of an instant.
pub fn select_links(
  conn: &Connection,
  child_id: Uuid,
  as_of: Option<DateTime<Utc>>,
) -> Result<Vec<ParentLink>> {
  let (sql, params) = match as_of {
    None => (
      "SELECT * FROM (
         SELECT p.*, ROW_NUMBER() OVER (
           PARTITION BY p.parent_id ORDER BY p.unique_id DESC
         ) AS rn
         FROM parents p
         WHERE p.child_id = ?1
       ) r
       WHERE r.rn = 1 AND r.hidden = 0
       ORDER BY r.created_at",
      vec![uuid_value(child_id)],
    ),
    Some(at) => (
      "SELECT * FROM (
         SELECT p.*, ROW_NUMBER() OVER (
           PARTITION BY p.parent_id ORDER BY p.unique_id DESC
         ) AS rn
         FROM parents p
         WHERE p.child_id = ?1 AND p.created_at <= ?2
       ) r
       WHERE r.rn = 1
         AND NOT EXISTS (
           SELECT 1 FROM hide_events h
           WHERE h.table_name = 'parents'
             AND h.unique_id = r.unique_id
             AND h.hidden_at <= ?2
         )
       ORDER BY r.created_at",
      vec![uuid_value(child_id), dt_value(at)],
    ),
  };

  let mut stmt = conn.prepare(sql)?;
  let mut rows = stmt.query(params_from_iter(params))?;
  let mut out = Vec::new();
  while let Some(row) = rows.next()? {
    out.push(link_from_row(row)?);
  }
  Ok(out)
}
