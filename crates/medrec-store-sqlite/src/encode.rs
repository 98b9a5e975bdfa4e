//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with exactly six fractional
//! digits, so lexicographic order of the column equals chronological order.
//! Calendar dates are `YYYY-MM-DD`. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, TimeDelta, Utc};
use rusqlite::{Row, types::Value};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The current instant at storage precision.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// A timestamp for an event that must sort strictly after `prev`: the
/// current instant, or one microsecond past `prev` if the clock has not
/// moved beyond it.
pub fn next_stamp(prev: DateTime<Utc>) -> DateTime<Utc> {
  now().max(prev + TimeDelta::microseconds(1))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Column values ───────────────────────────────────────────────────────────

pub fn text(s: impl Into<String>) -> Value { Value::Text(s.into()) }

pub fn opt_text(s: Option<&str>) -> Value {
  s.map_or(Value::Null, |s| Value::Text(s.to_owned()))
}

pub fn uuid_value(id: Uuid) -> Value { Value::Text(encode_uuid(id)) }

pub fn dt_value(dt: DateTime<Utc>) -> Value { Value::Text(encode_dt(dt)) }

pub fn opt_dt_value(dt: Option<DateTime<Utc>>) -> Value {
  dt.map_or(Value::Null, dt_value)
}

pub fn opt_date_value(d: Option<NaiveDate>) -> Value {
  d.map_or(Value::Null, |d| Value::Text(encode_date(d)))
}

// ─── Named-column reads ──────────────────────────────────────────────────────

pub fn col_text(row: &Row<'_>, col: &str) -> Result<String> {
  Ok(row.get(col)?)
}

pub fn col_opt_text(row: &Row<'_>, col: &str) -> Result<Option<String>> {
  Ok(row.get(col)?)
}

pub fn col_uuid(row: &Row<'_>, col: &str) -> Result<Uuid> {
  decode_uuid(&col_text(row, col)?)
}

pub fn col_dt(row: &Row<'_>, col: &str) -> Result<DateTime<Utc>> {
  decode_dt(&col_text(row, col)?)
}

pub fn col_opt_dt(row: &Row<'_>, col: &str) -> Result<Option<DateTime<Utc>>> {
  col_opt_text(row, col)?.as_deref().map(decode_dt).transpose()
}

pub fn col_opt_date(row: &Row<'_>, col: &str) -> Result<Option<NaiveDate>> {
  col_opt_text(row, col)?.as_deref().map(decode_date).transpose()
}

pub fn col_bool(row: &Row<'_>, col: &str) -> Result<bool> {
  Ok(row.get::<_, i64>(col)? != 0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_sort_as_text() {
    let a = decode_dt("2024-03-01T10:00:00Z").unwrap();
    let b = a + TimeDelta::microseconds(1);
    let c = a + TimeDelta::seconds(1);
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert_eq!(ea, "2024-03-01T10:00:00.000000Z");
    assert!(ea < eb && eb < ec);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn next_stamp_is_strictly_later() {
    let far_future = now() + TimeDelta::days(1);
    assert_eq!(next_stamp(far_future), far_future + TimeDelta::microseconds(1));
    let past = now() - TimeDelta::days(1);
    assert!(next_stamp(past) > past + TimeDelta::microseconds(1));
  }
}
