//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with full sub-second precision,
//! so a value reads back exactly as written. Identifiers are plain integers.

use chrono::{DateTime, SecondsFormat, Utc};
use papers_core::entity::{Credential, CredentialId, Person, PersonId, PersonName};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const CREDENTIAL_COLUMNS: &str = "credential_id, code, expires_at";

/// Raw values read directly from a `credential` row.
pub struct RawCredential {
  pub credential_id: i64,
  pub code:          String,
  pub expires_at:    String,
}

impl RawCredential {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      credential_id: row.get(0)?,
      code:          row.get(1)?,
      expires_at:    row.get(2)?,
    })
  }

  pub fn into_credential(self) -> Result<Credential> {
    Ok(Credential {
      id:         CredentialId(self.credential_id),
      code:       self.code,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}

pub const PERSON_COLUMNS: &str = "person_id, first_name, last_name, credential_id";

/// Raw values read directly from a `person` row.
pub struct RawPerson {
  pub person_id:     i64,
  pub first_name:    String,
  pub last_name:     String,
  pub credential_id: Option<i64>,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:     row.get(0)?,
      first_name:    row.get(1)?,
      last_name:     row.get(2)?,
      credential_id: row.get(3)?,
    })
  }

  pub fn into_person(self) -> Person {
    Person {
      id:            PersonId(self.person_id),
      name:          PersonName {
        first_name: self.first_name,
        last_name:  self.last_name,
      },
      credential_id: self.credential_id.map(CredentialId),
    }
  }
}
