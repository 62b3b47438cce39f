//! Recognising SQLite constraint rejections.
//!
//! Only the two constraints that encode registry rules are recognised; any
//! other failure stays a plain database error.

use rusqlite::{ffi, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
  /// `person.credential_id` is already taken.
  Unique,
  /// A reference to a missing credential, or deletion of a referenced one.
  ForeignKey,
}

pub fn violated(err: &rusqlite::Error) -> Option<Constraint> {
  match err {
    rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
      match e.extended_code {
        ffi::SQLITE_CONSTRAINT_UNIQUE => Some(Constraint::Unique),
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Constraint::ForeignKey),
        _ => None,
      }
    }
    _ => None,
  }
}
