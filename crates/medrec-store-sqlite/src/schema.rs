//! SQL schema for the medical-record SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// The four versioned tables share five control columns: `unique_id`
/// (physical key), the logical id, `created_at`, `modified_at` and `hidden`.
/// Rows are never updated except to set `hidden`, and never deleted.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    unique_id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id              TEXT NOT NULL,
    medical_insurance_id TEXT,            -- non-null for patients only
    login                TEXT NOT NULL,
    password_hash        TEXT NOT NULL,
    user_type            TEXT NOT NULL,
    first_name           TEXT NOT NULL,
    last_name            TEXT NOT NULL,
    phone_number         TEXT NOT NULL,
    email                TEXT NOT NULL,
    gender               TEXT,
    city_of_birth        TEXT,
    date_of_birth        TEXT,            -- YYYY-MM-DD
    created_at           TEXT NOT NULL,   -- RFC 3339 UTC, microseconds
    modified_at          TEXT NOT NULL,
    hidden               INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS coordinates (
    unique_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    coordinate_id  TEXT NOT NULL,
    user_id        TEXT NOT NULL,
    street_address TEXT NOT NULL,
    apartment      TEXT,
    postal_code    TEXT NOT NULL,
    city           TEXT NOT NULL,
    country        TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    modified_at    TEXT NOT NULL,
    hidden         INTEGER NOT NULL DEFAULT 0
);

-- Establishments are hidden but never re-versioned.
CREATE TABLE IF NOT EXISTS establishments (
    establishment_id   TEXT PRIMARY KEY,
    establishment_name TEXT NOT NULL,
    created_at         TEXT NOT NULL,
    hidden             INTEGER NOT NULL DEFAULT 0
);

-- patient_id holds the patient's medical_insurance_id, not a user_id.
CREATE TABLE IF NOT EXISTS medical_history (
    unique_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    history_id  TEXT NOT NULL,
    patient_id  TEXT NOT NULL,
    diagnostic  TEXT NOT NULL,
    treatment   TEXT NOT NULL,
    doctor_id   TEXT NOT NULL,
    start_date  TEXT,
    end_date    TEXT,
    created_at  TEXT NOT NULL,
    modified_at TEXT NOT NULL,
    hidden      INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS medical_visits (
    unique_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    visit_id         TEXT NOT NULL,
    patient_id       TEXT NOT NULL,
    establishment_id TEXT NOT NULL REFERENCES establishments(establishment_id),
    doctor_id        TEXT NOT NULL,
    visit_date       TEXT,
    diagnostic       TEXT,
    treatment        TEXT,
    summary          TEXT NOT NULL,
    notes            TEXT,
    created_at       TEXT NOT NULL,
    modified_at      TEXT NOT NULL,
    hidden           INTEGER NOT NULL DEFAULT 0
);

-- Append/hide log of (parent, child) pairs.
CREATE TABLE IF NOT EXISTS parents (
    unique_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id  TEXT NOT NULL,
    child_id   TEXT NOT NULL,
    created_at TEXT NOT NULL,
    hidden     INTEGER NOT NULL DEFAULT 0
);

-- When each physical row had its hidden flag set. Point-in-time reads use
-- this to tell whether a row was already hidden at the requested instant.
CREATE TABLE IF NOT EXISTS hide_events (
    table_name TEXT NOT NULL,
    unique_id  INTEGER NOT NULL,
    hidden_at  TEXT NOT NULL,
    UNIQUE (table_name, unique_id)
);

CREATE INDEX IF NOT EXISTS users_id_idx          ON users(user_id);
CREATE INDEX IF NOT EXISTS users_insurance_idx   ON users(medical_insurance_id);
CREATE INDEX IF NOT EXISTS coordinates_id_idx    ON coordinates(coordinate_id);
CREATE INDEX IF NOT EXISTS coordinates_user_idx  ON coordinates(user_id);
CREATE INDEX IF NOT EXISTS history_id_idx        ON medical_history(history_id);
CREATE INDEX IF NOT EXISTS history_patient_idx   ON medical_history(patient_id);
CREATE INDEX IF NOT EXISTS visits_id_idx         ON medical_visits(visit_id);
CREATE INDEX IF NOT EXISTS visits_patient_idx    ON medical_visits(patient_id);
CREATE INDEX IF NOT EXISTS parents_child_idx     ON parents(child_id);

PRAGMA user_version = 1;
";
