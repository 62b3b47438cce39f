//! SQL schema for the Papers SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `foreign_keys` is a per-connection setting, so every connection must run
/// this batch before its first statement.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- AUTOINCREMENT: identifiers are never reused, even after deletion.
CREATE TABLE IF NOT EXISTS credential (
    credential_id INTEGER PRIMARY KEY AUTOINCREMENT,
    code          TEXT NOT NULL,
    expires_at    TEXT NOT NULL   -- RFC 3339 UTC
);

-- At most one person per credential: UNIQUE ignores NULLs, so any number of
-- people may hold no credential.
CREATE TABLE IF NOT EXISTS person (
    person_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    credential_id INTEGER UNIQUE
                  REFERENCES credential(credential_id) ON DELETE RESTRICT
);

PRAGMA user_version = 1;
";
