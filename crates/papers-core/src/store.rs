//! The `CredentialStore` and `PersonStore` traits.
//!
//! The traits are implemented by storage backends (e.g. `papers-store-sqlite`,
//! or the in-memory [`crate::MemoryStore`]). Callers depend on this
//! abstraction, not on any concrete backend.
//!
//! Every method is one atomic operation: either all of its effects commit or
//! none do. Rule violations are reported as typed errors and never retried.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::entity::{
  Credential, CredentialId, NewCredential, NewPerson, Person, PersonId,
  PersonName, PersonView,
};

// ─── Credentials ─────────────────────────────────────────────────────────────

/// Persistence for credentials. Has no awareness of people except for the
/// deletion guard.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait CredentialStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new credential and return it with its assigned identifier.
  fn create_credential(
    &self,
    input: NewCredential,
  ) -> impl Future<Output = Result<Credential, Self::Error>> + Send + '_;

  /// Retrieve a credential. Fails with `CredentialNotFound` if absent.
  fn get_credential(
    &self,
    id: CredentialId,
  ) -> impl Future<Output = Result<Credential, Self::Error>> + Send + '_;

  /// Replace the expiry in place; identifier and code are unchanged.
  fn renew_credential(
    &self,
    id: CredentialId,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Credential, Self::Error>> + Send + '_;

  /// Remove a credential irrevocably.
  ///
  /// Fails with `Referenced` while any person holds it; the holder must clear
  /// its reference first.
  fn delete_credential(
    &self,
    id: CredentialId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All credentials, ordered by identifier.
  fn list_credentials(
    &self,
  ) -> impl Future<Output = Result<Vec<Credential>, Self::Error>> + Send + '_;
}

// ─── People ──────────────────────────────────────────────────────────────────

/// Persistence for people and their credential references.
pub trait PersonStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new person. If `input.credential_id` is set it must name an
  /// existing credential that no other person holds; otherwise nothing is
  /// written.
  fn create_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Retrieve a person. Fails with `PersonNotFound` if absent.
  fn get_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Update the name only; the credential reference is untouched.
  fn rename_person(
    &self,
    id: PersonId,
    name: PersonName,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Change or clear (`None`) the person's credential reference. Setting a
  /// reference applies the same checks as [`PersonStore::create_person`];
  /// clearing always succeeds for an existing person.
  fn set_credential(
    &self,
    id: PersonId,
    credential_id: Option<CredentialId>,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Remove the person only. A referenced credential survives unmodified.
  fn delete_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All people, ordered by identifier.
  fn list_people(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  /// The person currently holding `credential_id`, if any.
  fn find_person_by_credential(
    &self,
    credential_id: CredentialId,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Read a person together with its resolved credential.
  fn resolve_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<PersonView, Self::Error>> + Send + '_;
}
