//! People, credentials and the identifiers that link them.
//!
//! A person holds an optional reference to exactly one credential. The
//! credential carries no back-pointer; the reverse direction is discovered by
//! query ([`crate::store::PersonStore::find_person_by_credential`]).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Store-assigned surrogate key of a [`Credential`]. Never reused.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CredentialId(pub i64);

/// Store-assigned surrogate key of a [`Person`]. Never reused.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PersonId(pub i64);

impl fmt::Display for CredentialId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl fmt::Display for PersonId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Credential ──────────────────────────────────────────────────────────────

/// A renewable identity document. Exists independently of any person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
  pub id:         CredentialId,
  /// Opaque document number, e.g. a passport number.
  pub code:       String,
  pub expires_at: DateTime<Utc>,
}

/// Input to [`crate::store::CredentialStore::create_credential`].
/// The identifier is always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewCredential {
  pub code:       String,
  pub expires_at: DateTime<Utc>,
}

impl NewCredential {
  pub fn new(code: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
    Self { code: code.into(), expires_at }
  }
}

// ─── Person ──────────────────────────────────────────────────────────────────

/// A person's name, split into given and family parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
  pub first_name: String,
  pub last_name:  String,
}

impl PersonName {
  pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
    Self { first_name: first_name.into(), last_name: last_name.into() }
  }

  /// Display form: the non-empty parts joined by a single space.
  pub fn full(&self) -> String {
    [self.first_name.trim(), self.last_name.trim()]
      .into_iter()
      .filter(|part| !part.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// A person, optionally holding one credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:            PersonId,
  pub name:          PersonName,
  /// The credential this person currently owns, if any. No other person may
  /// hold the same value at the same time.
  pub credential_id: Option<CredentialId>,
}

/// Input to [`crate::store::PersonStore::create_person`].
#[derive(Debug, Clone)]
pub struct NewPerson {
  pub name:          PersonName,
  pub credential_id: Option<CredentialId>,
}

impl NewPerson {
  /// A person without a credential.
  pub fn new(name: PersonName) -> Self { Self { name, credential_id: None } }

  pub fn with_credential(mut self, credential_id: CredentialId) -> Self {
    self.credential_id = Some(credential_id);
    self
  }
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A person with its credential reference resolved. Never stored; always
/// derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonView {
  pub person:     Person,
  pub credential: Option<Credential>,
}
