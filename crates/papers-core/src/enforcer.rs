//! Relationship rules between people and credentials.
//!
//! These are not a separately addressable API. Each backend evaluates them
//! inside the same transaction (or critical section) as the mutation they
//! guard, after reading the credential's current holder.
//!
//! From a single credential's point of view the edge moves between two
//! states:
//!
//! ```text
//! Unassigned ──(person sets reference)──▶ Assigned(p)
//! Assigned(p) ──(p clears reference or is deleted)──▶ Unassigned
//! ```
//!
//! `Assigned` is the only state in which deleting the credential is refused.

use serde::{Deserialize, Serialize};

use crate::{
  entity::{CredentialId, PersonId},
  Error, Result,
};

/// Who, if anyone, currently holds a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "holder", rename_all = "snake_case")]
pub enum EdgeState {
  Unassigned,
  Assigned(PersonId),
}

impl EdgeState {
  pub fn from_holder(holder: Option<PersonId>) -> Self {
    holder.map_or(Self::Unassigned, Self::Assigned)
  }

  pub fn holder(self) -> Option<PersonId> {
    match self {
      Self::Unassigned => None,
      Self::Assigned(p) => Some(p),
    }
  }

  /// Uniqueness rule: `claimant` may take the credential only if nobody else
  /// holds it. A person re-claiming its own credential is a no-op, not a
  /// conflict.
  pub fn guard_assign(
    self,
    credential_id: CredentialId,
    claimant: Option<PersonId>,
  ) -> Result<()> {
    match self {
      Self::Assigned(holder) if Some(holder) != claimant => {
        Err(Error::UniquenessViolation { credential_id, holder })
      }
      _ => Ok(()),
    }
  }

  /// Deletion guard: a held credential cannot be deleted.
  pub fn guard_delete(self, credential_id: CredentialId) -> Result<()> {
    match self {
      Self::Assigned(holder) => Err(Error::Referenced { credential_id, holder }),
      Self::Unassigned => Ok(()),
    }
  }
}

/// Existence rule: a non-empty reference must resolve to a live credential.
pub fn guard_exists(credential_id: CredentialId, exists: bool) -> Result<()> {
  if exists {
    Ok(())
  } else {
    Err(Error::DanglingReference(credential_id))
  }
}
