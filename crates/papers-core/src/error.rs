//! Error types for `papers-core`.

use thiserror::Error;

use crate::{
  entity::{CredentialId, PersonId},
  validate::ValidationError,
};

/// Every rejection a registry operation can report. Backends translate their
/// own constraint failures into these variants rather than leaking
/// engine-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("credential not found: {0}")]
  CredentialNotFound(CredentialId),

  #[error("person not found: {0}")]
  PersonNotFound(PersonId),

  #[error("credential {0} does not exist")]
  DanglingReference(CredentialId),

  #[error("credential {credential_id} is already held by person {holder}")]
  UniquenessViolation {
    credential_id: CredentialId,
    holder:        PersonId,
  },

  #[error("credential {credential_id} is still referenced by person {holder}")]
  Referenced {
    credential_id: CredentialId,
    holder:        PersonId,
  },

  #[error("invalid input: {0}")]
  Validation(#[from] ValidationError),
}

/// The coarse category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  DanglingReference,
  UniquenessViolation,
  Referenced,
  Validation,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::CredentialNotFound(_) | Self::PersonNotFound(_) => ErrorKind::NotFound,
      Self::DanglingReference(_) => ErrorKind::DanglingReference,
      Self::UniquenessViolation { .. } => ErrorKind::UniquenessViolation,
      Self::Referenced { .. } => ErrorKind::Referenced,
      Self::Validation(_) => ErrorKind::Validation,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
