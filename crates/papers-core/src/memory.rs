//! [`MemoryStore`]: an in-process implementation of both store traits.
//!
//! Intended as a test double for code written against the traits. It has no
//! storage engine to lean on, so the uniqueness and existence constraints are
//! replicated explicitly: an owner map from credential to holding person is
//! consulted before every assignment and every credential deletion, all under
//! one lock so each operation is atomic.

use std::{
  collections::{BTreeMap, HashMap},
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};

use crate::{
  enforcer::{guard_exists, EdgeState},
  entity::{
    Credential, CredentialId, NewCredential, NewPerson, Person, PersonId,
    PersonName, PersonView,
  },
  store::{CredentialStore, PersonStore},
  validate::{validate_credential, validate_expiry, validate_name},
  Error, Result,
};

#[derive(Default)]
struct State {
  credentials:     BTreeMap<CredentialId, Credential>,
  people:          BTreeMap<PersonId, Person>,
  /// Unique index over `Person::credential_id`.
  owners:          HashMap<CredentialId, PersonId>,
  last_credential: i64,
  last_person:     i64,
}

impl State {
  fn edge(&self, credential_id: CredentialId) -> EdgeState {
    EdgeState::from_holder(self.owners.get(&credential_id).copied())
  }

  /// Existence then uniqueness, for a reference about to be written.
  fn check_claim(
    &self,
    credential_id: CredentialId,
    claimant: Option<PersonId>,
  ) -> Result<()> {
    guard_exists(credential_id, self.credentials.contains_key(&credential_id))?;
    self.edge(credential_id).guard_assign(credential_id, claimant)
  }
}

/// A registry held entirely in memory. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
  state: Arc<Mutex<State>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

// ─── CredentialStore impl ────────────────────────────────────────────────────

impl CredentialStore for MemoryStore {
  type Error = Error;

  async fn create_credential(&self, input: NewCredential) -> Result<Credential> {
    validate_credential(&input, Utc::now())?;

    let mut state = self.lock();
    state.last_credential += 1;
    let credential = Credential {
      id:         CredentialId(state.last_credential),
      code:       input.code,
      expires_at: input.expires_at,
    };
    state.credentials.insert(credential.id, credential.clone());
    Ok(credential)
  }

  async fn get_credential(&self, id: CredentialId) -> Result<Credential> {
    self
      .lock()
      .credentials
      .get(&id)
      .cloned()
      .ok_or(Error::CredentialNotFound(id))
  }

  async fn renew_credential(
    &self,
    id: CredentialId,
    expires_at: DateTime<Utc>,
  ) -> Result<Credential> {
    validate_expiry(expires_at, Utc::now())?;

    let mut state = self.lock();
    let credential = state
      .credentials
      .get_mut(&id)
      .ok_or(Error::CredentialNotFound(id))?;
    credential.expires_at = expires_at;
    Ok(credential.clone())
  }

  async fn delete_credential(&self, id: CredentialId) -> Result<()> {
    let mut state = self.lock();
    if !state.credentials.contains_key(&id) {
      return Err(Error::CredentialNotFound(id));
    }
    state.edge(id).guard_delete(id)?;
    state.credentials.remove(&id);
    Ok(())
  }

  async fn list_credentials(&self) -> Result<Vec<Credential>> {
    Ok(self.lock().credentials.values().cloned().collect())
  }
}

// ─── PersonStore impl ────────────────────────────────────────────────────────

impl PersonStore for MemoryStore {
  type Error = Error;

  async fn create_person(&self, input: NewPerson) -> Result<Person> {
    validate_name(&input.name)?;

    let mut state = self.lock();
    if let Some(credential_id) = input.credential_id {
      state.check_claim(credential_id, None)?;
    }

    state.last_person += 1;
    let person = Person {
      id:            PersonId(state.last_person),
      name:          input.name,
      credential_id: input.credential_id,
    };
    if let Some(credential_id) = person.credential_id {
      state.owners.insert(credential_id, person.id);
    }
    state.people.insert(person.id, person.clone());
    Ok(person)
  }

  async fn get_person(&self, id: PersonId) -> Result<Person> {
    self
      .lock()
      .people
      .get(&id)
      .cloned()
      .ok_or(Error::PersonNotFound(id))
  }

  async fn rename_person(&self, id: PersonId, name: PersonName) -> Result<Person> {
    validate_name(&name)?;

    let mut state = self.lock();
    let person = state.people.get_mut(&id).ok_or(Error::PersonNotFound(id))?;
    person.name = name;
    Ok(person.clone())
  }

  async fn set_credential(
    &self,
    id: PersonId,
    credential_id: Option<CredentialId>,
  ) -> Result<Person> {
    let mut state = self.lock();
    let previous = state
      .people
      .get(&id)
      .ok_or(Error::PersonNotFound(id))?
      .credential_id;

    if let Some(credential_id) = credential_id {
      state.check_claim(credential_id, Some(id))?;
    }

    if let Some(old) = previous {
      state.owners.remove(&old);
    }
    if let Some(new) = credential_id {
      state.owners.insert(new, id);
    }
    let person = state.people.get_mut(&id).ok_or(Error::PersonNotFound(id))?;
    person.credential_id = credential_id;
    Ok(person.clone())
  }

  async fn delete_person(&self, id: PersonId) -> Result<()> {
    let mut state = self.lock();
    let person = state.people.remove(&id).ok_or(Error::PersonNotFound(id))?;
    if let Some(credential_id) = person.credential_id {
      state.owners.remove(&credential_id);
    }
    Ok(())
  }

  async fn list_people(&self) -> Result<Vec<Person>> {
    Ok(self.lock().people.values().cloned().collect())
  }

  async fn find_person_by_credential(
    &self,
    credential_id: CredentialId,
  ) -> Result<Option<Person>> {
    let state = self.lock();
    Ok(
      state
        .owners
        .get(&credential_id)
        .and_then(|holder| state.people.get(holder))
        .cloned(),
    )
  }

  async fn resolve_person(&self, id: PersonId) -> Result<PersonView> {
    let state = self.lock();
    let person = state.people.get(&id).cloned().ok_or(Error::PersonNotFound(id))?;
    let credential = person
      .credential_id
      .and_then(|credential_id| state.credentials.get(&credential_id))
      .cloned();
    Ok(PersonView { person, credential })
  }
}
