//! Input validation, applied before any store access.

use chrono::{DateTime, Datelike as _, Utc};
use thiserror::Error;

use crate::entity::{NewCredential, PersonName};

/// The last year a timestamp can be written and read back as RFC 3339.
pub const LATEST_EXPIRY_YEAR: i32 = 9999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("credential code must not be empty")]
  EmptyCode,

  #[error("expiry {expires_at} is before the current time {now}")]
  ExpiryInPast {
    expires_at: DateTime<Utc>,
    now:        DateTime<Utc>,
  },

  /// Expiries must fit a four-digit RFC 3339 year.
  #[error("expiry {expires_at} is beyond year {LATEST_EXPIRY_YEAR}")]
  ExpiryOutOfRange { expires_at: DateTime<Utc> },

  #[error("a person needs at least a first or a last name")]
  EmptyName,
}

pub fn validate_credential(
  input: &NewCredential,
  now: DateTime<Utc>,
) -> Result<(), ValidationError> {
  if input.code.trim().is_empty() {
    return Err(ValidationError::EmptyCode);
  }
  validate_expiry(input.expires_at, now)
}

/// An expiry equal to `now` is accepted; only strictly earlier instants are
/// rejected.
pub fn validate_expiry(
  expires_at: DateTime<Utc>,
  now: DateTime<Utc>,
) -> Result<(), ValidationError> {
  if expires_at < now {
    return Err(ValidationError::ExpiryInPast { expires_at, now });
  }
  if expires_at.year() > LATEST_EXPIRY_YEAR {
    return Err(ValidationError::ExpiryOutOfRange { expires_at });
  }
  Ok(())
}

pub fn validate_name(name: &PersonName) -> Result<(), ValidationError> {
  if name.full().is_empty() {
    return Err(ValidationError::EmptyName);
  }
  Ok(())
}
