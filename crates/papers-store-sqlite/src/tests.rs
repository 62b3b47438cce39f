//! Integration tests for `SqliteStore` against in-memory and file databases.

use chrono::{DateTime, Duration, TimeZone as _, Utc};
use papers_core::{
  entity::{CredentialId, NewCredential, NewPerson, PersonId, PersonName},
  store::{CredentialStore, PersonStore},
  ErrorKind,
};

use crate::{Error, SqliteStore, StoreConfig};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn ten_years() -> DateTime<Utc> { Utc::now() + Duration::days(365 * 10) }

fn registry_err(err: Error) -> papers_core::Error {
  match err {
    Error::Registry(e) => e,
    other => panic!("expected a registry error, got {other:?}"),
  }
}

// ─── Credentials ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_credential() {
  let s = store().await;
  let expires_at = ten_years();

  let created = s
    .create_credential(NewCredential::new("AB125634", expires_at))
    .await
    .unwrap();
  assert_eq!(created.id, CredentialId(1));
  assert_eq!(created.code, "AB125634");

  let fetched = s.get_credential(created.id).await.unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.expires_at, expires_at);
}

#[tokio::test]
async fn renew_changes_only_expiry_and_is_idempotent() {
  let s = store().await;
  let created = s
    .create_credential(NewCredential::new("AB125634", ten_years()))
    .await
    .unwrap();

  let later = created.expires_at + Duration::days(3 * 30);
  let renewed = s.renew_credential(created.id, later).await.unwrap();
  assert_eq!(renewed.id, created.id);
  assert_eq!(renewed.code, created.code);
  assert_ne!(renewed.expires_at, created.expires_at);
  assert_eq!(renewed.expires_at, later);

  let again = s.renew_credential(created.id, later).await.unwrap();
  assert_eq!(again, renewed);
  assert_eq!(s.get_credential(created.id).await.unwrap(), renewed);
}

#[tokio::test]
async fn unreferenced_credential_can_be_deleted() {
  let s = store().await;
  let created = s
    .create_credential(NewCredential::new("AB125634", ten_years()))
    .await
    .unwrap();

  s.delete_credential(created.id).await.unwrap();

  let err = registry_err(s.get_credential(created.id).await.unwrap_err());
  assert_eq!(err, papers_core::Error::CredentialNotFound(created.id));
}

#[tokio::test]
async fn missing_credential_operations_are_not_found() {
  let s = store().await;
  let id = CredentialId(5);

  assert_eq!(
    s.get_credential(id).await.unwrap_err().kind(),
    Some(ErrorKind::NotFound)
  );
  assert_eq!(
    s.renew_credential(id, ten_years()).await.unwrap_err().kind(),
    Some(ErrorKind::NotFound)
  );
  assert_eq!(
    s.delete_credential(id).await.unwrap_err().kind(),
    Some(ErrorKind::NotFound)
  );
}

#[tokio::test]
async fn invalid_input_is_rejected_before_storage() {
  let s = store().await;

  let err = s
    .create_credential(NewCredential::new(" ", ten_years()))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), Some(ErrorKind::Validation));

  let created = s
    .create_credential(NewCredential::new("AB125634", ten_years()))
    .await
    .unwrap();
  let err = s
    .renew_credential(created.id, Utc::now() - Duration::days(1))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), Some(ErrorKind::Validation));
  assert_eq!(s.get_credential(created.id).await.unwrap(), created);

  let err = s
    .create_person(NewPerson::new(PersonName::new("", "")))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), Some(ErrorKind::Validation));
  assert!(s.list_people().await.unwrap().is_empty());
}

#[tokio::test]
async fn five_digit_expiry_years_never_reach_storage() {
  let s = store().await;
  let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();

  let err = s
    .create_credential(NewCredential::new("AB125634", far))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), Some(ErrorKind::Validation));
  assert!(s.list_credentials().await.unwrap().is_empty());

  let created = s
    .create_credential(NewCredential::new("AB125634", ten_years()))
    .await
    .unwrap();
  let err = s.renew_credential(created.id, far).await.unwrap_err();
  assert_eq!(err.kind(), Some(ErrorKind::Validation));

  let holder = s
    .create_person(NewPerson::new(PersonName::new("John", "Smith")).with_credential(created.id))
    .await
    .unwrap();
  let view = s.resolve_person(holder.id).await.unwrap();
  assert_eq!(view.credential, Some(created));
}

#[tokio::test]
async fn identifiers_are_never_reused() {
  let s = store().await;
  let first = s
    .create_credential(NewCredential::new("AB1", ten_years()))
    .await
    .unwrap();
  s.delete_credential(first.id).await.unwrap();

  let second = s
    .create_credential(NewCredential::new("AB2", ten_years()))
    .await
    .unwrap();
  assert_eq!(second.id, CredentialId(2));
}

// ─── People ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_rename_and_delete_person() {
  let s = store().await;

  let person = s
    .create_person(NewPerson::new(PersonName::new("John", "Smith")))
    .await
    .unwrap();
  assert_eq!(person.id, PersonId(1));
  assert_eq!(person.credential_id, None);

  let renamed = s
    .rename_person(person.id, PersonName::new("John", "Rogers"))
    .await
    .unwrap();
  assert_eq!(renamed.id, person.id);
  assert_eq!(renamed.name.first_name, "John");
  assert_eq!(renamed.name.last_name, "Rogers");
  assert_eq!(s.get_person(person.id).await.unwrap(), renamed);

  s.delete_person(person.id).await.unwrap();
  let err = registry_err(s.get_person(person.id).await.unwrap_err());
  assert_eq!(err, papers_core::Error::PersonNotFound(person.id));
}

#[tokio::test]
async fn missing_person_operations_are_not_found() {
  let s = store().await;
  let id = PersonId(8);

  for err in [
    s.get_person(id).await.unwrap_err(),
    s.rename_person(id, PersonName::new("A", "B")).await.unwrap_err(),
    s.set_credential(id, None).await.unwrap_err(),
    s.delete_person(id).await.unwrap_err(),
    s.resolve_person(id).await.unwrap_err(),
  ] {
    assert_eq!(registry_err(err), papers_core::Error::PersonNotFound(id));
  }
}

#[tokio::test]
async fn list_is_ordered_by_id() {
  let s = store().await;
  for code in ["C1", "C2", "C3"] {
    s.create_credential(NewCredential::new(code, ten_years()))
      .await
      .unwrap();
  }
  for first in ["Ann", "Bob"] {
    s.create_person(NewPerson::new(PersonName::new(first, "Lee")))
      .await
      .unwrap();
  }

  let codes: Vec<_> = s
    .list_credentials()
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.code)
    .collect();
  assert_eq!(codes, ["C1", "C2", "C3"]);

  let ids: Vec<_> = s.list_people().await.unwrap().into_iter().map(|p| p.id).collect();
  assert_eq!(ids, [PersonId(1), PersonId(2)]);
}

// ─── Relationship rules ──────────────────────────────────────────────────────

#[tokio::test]
async fn dangling_reference_is_rejected() {
  let s = store().await;

  let err = registry_err(
    s.create_person(
      NewPerson::new(PersonName::new("Mary", "Jane")).with_credential(CredentialId(42)),
    )
    .await
    .unwrap_err(),
  );
  assert_eq!(err, papers_core::Error::DanglingReference(CredentialId(42)));
  assert!(s.list_people().await.unwrap().is_empty());
}

#[tokio::test]
async fn dangling_update_leaves_prior_reference() {
  let s = store().await;
  let credential = s
    .create_credential(NewCredential::new("AB125634", ten_years()))
    .await
    .unwrap();
  let person = s
    .create_person(
      NewPerson::new(PersonName::new("John", "Smith")).with_credential(credential.id),
    )
    .await
    .unwrap();

  let err = registry_err(
    s.set_credential(person.id, Some(CredentialId(99)))
      .await
      .unwrap_err(),
  );
  assert_eq!(err, papers_core::Error::DanglingReference(CredentialId(99)));
  assert_eq!(
    s.get_person(person.id).await.unwrap().credential_id,
    Some(credential.id)
  );
}

#[tokio::test]
async fn holder_may_reassert_own_credential() {
  let s = store().await;
  let credential = s
    .create_credential(NewCredential::new("AB125634", ten_years()))
    .await
    .unwrap();
  let person = s
    .create_person(
      NewPerson::new(PersonName::new("John", "Smith")).with_credential(credential.id),
    )
    .await
    .unwrap();

  let same = s.set_credential(person.id, Some(credential.id)).await.unwrap();
  assert_eq!(same, person);
}

#[tokio::test]
async fn credential_can_move_between_people() {
  let s = store().await;
  let credential = s
    .create_credential(NewCredential::new("AB125634", ten_years()))
    .await
    .unwrap();
  let a = s
    .create_person(
      NewPerson::new(PersonName::new("John", "Smith")).with_credential(credential.id),
    )
    .await
    .unwrap();
  let b = s
    .create_person(NewPerson::new(PersonName::new("Mary", "Jane")))
    .await
    .unwrap();

  let err = registry_err(s.set_credential(b.id, Some(credential.id)).await.unwrap_err());
  assert_eq!(
    err,
    papers_core::Error::UniquenessViolation { credential_id: credential.id, holder: a.id }
  );

  s.set_credential(a.id, None).await.unwrap();
  let b = s.set_credential(b.id, Some(credential.id)).await.unwrap();
  assert_eq!(
    s.find_person_by_credential(credential.id).await.unwrap(),
    Some(b)
  );
}

#[tokio::test]
async fn resolve_person_without_credential() {
  let s = store().await;
  let person = s
    .create_person(NewPerson::new(PersonName::new("Cher", "")))
    .await
    .unwrap();

  let view = s.resolve_person(person.id).await.unwrap();
  assert_eq!(view.person, person);
  assert!(view.credential.is_none());
}

/// The full lifecycle, in the order the original application exercised it.
#[tokio::test]
async fn end_to_end_lifecycle() {
  let s = store().await;

  // Assign a credential to a person.
  let document = s
    .create_credential(NewCredential::new("US89234", ten_years()))
    .await
    .unwrap();
  let mary = s
    .create_person(
      NewPerson::new(PersonName::new("Mary", "Jane")).with_credential(document.id),
    )
    .await
    .unwrap();
  assert_eq!(document.id, CredentialId(1));
  assert_eq!(mary.id, PersonId(1));
  assert_eq!(mary.credential_id, Some(document.id));

  // Renewal is visible through the person's reference.
  let renewed_until = document.expires_at + Duration::days(365 * 10);
  let renewed = s.renew_credential(document.id, renewed_until).await.unwrap();
  assert_eq!(renewed.code, document.code);
  let view = s.resolve_person(mary.id).await.unwrap();
  assert_eq!(view.credential, Some(renewed.clone()));

  // A referenced credential cannot be deleted.
  let err = registry_err(s.delete_credential(document.id).await.unwrap_err());
  assert_eq!(
    err,
    papers_core::Error::Referenced { credential_id: document.id, holder: mary.id }
  );
  assert_eq!(s.get_credential(document.id).await.unwrap(), renewed);
  assert_eq!(
    s.get_person(mary.id).await.unwrap().credential_id,
    Some(document.id)
  );

  // Revoke, then delete.
  let revoked = s.set_credential(mary.id, None).await.unwrap();
  assert_eq!(revoked.credential_id, None);
  s.delete_credential(document.id).await.unwrap();
  assert_eq!(
    s.get_credential(document.id).await.unwrap_err().kind(),
    Some(ErrorKind::NotFound)
  );

  // Deleting a person does not delete its credential.
  let second = s
    .create_credential(NewCredential::new("XD892342", ten_years()))
    .await
    .unwrap();
  s.set_credential(mary.id, Some(second.id)).await.unwrap();
  s.delete_person(mary.id).await.unwrap();
  assert!(s.get_person(mary.id).await.is_err());
  assert_eq!(s.get_credential(second.id).await.unwrap(), second);
  assert_eq!(s.find_person_by_credential(second.id).await.unwrap(), None);

  // Two people cannot hold the same credential.
  let shared = s
    .create_credential(NewCredential::new("XYZ123456", ten_years()))
    .await
    .unwrap();
  assert_eq!(shared.id, CredentialId(3));
  let john = s
    .create_person(
      NewPerson::new(PersonName::new("John", "Smith")).with_credential(shared.id),
    )
    .await
    .unwrap();
  let err = registry_err(
    s.create_person(
      NewPerson::new(PersonName::new("Mary", "Jane")).with_credential(shared.id),
    )
    .await
    .unwrap_err(),
  );
  assert_eq!(
    err,
    papers_core::Error::UniquenessViolation { credential_id: CredentialId(3), holder: john.id }
  );
  assert_eq!(s.list_people().await.unwrap(), vec![john]);
}

// ─── File-backed stores ──────────────────────────────────────────────────────

async fn file_store(dir: &tempfile::TempDir) -> SqliteStore {
  let config = StoreConfig {
    path:            dir.path().join("papers.db"),
    busy_timeout_ms: 5_000,
  };
  SqliteStore::open_with(&config).await.expect("file store")
}

#[tokio::test]
async fn data_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();

  let (credential, person) = {
    let s = file_store(&dir).await;
    let credential = s
      .create_credential(NewCredential::new("AB125634", ten_years()))
      .await
      .unwrap();
    let person = s
      .create_person(
        NewPerson::new(PersonName::new("John", "Smith")).with_credential(credential.id),
      )
      .await
      .unwrap();
    (credential, person)
  };

  let s = file_store(&dir).await;
  assert_eq!(s.get_credential(credential.id).await.unwrap(), credential);
  assert_eq!(s.get_person(person.id).await.unwrap(), person);

  // The foreign key is enforced on the fresh connection too.
  assert_eq!(
    s.delete_credential(credential.id).await.unwrap_err().kind(),
    Some(ErrorKind::Referenced)
  );
}

#[tokio::test]
async fn racing_claims_yield_one_winner() {
  let dir = tempfile::tempdir().unwrap();
  let a = file_store(&dir).await;
  let b = file_store(&dir).await;

  let credential = a
    .create_credential(NewCredential::new("XYZ123456", ten_years()))
    .await
    .unwrap();
  let john = a
    .create_person(NewPerson::new(PersonName::new("John", "Smith")))
    .await
    .unwrap();
  let mary = b
    .create_person(NewPerson::new(PersonName::new("Mary", "Jane")))
    .await
    .unwrap();

  let (first, second) = tokio::join!(
    a.set_credential(john.id, Some(credential.id)),
    b.set_credential(mary.id, Some(credential.id)),
  );

  let (winner, loser_err) = match (first, second) {
    (Ok(w), Err(e)) | (Err(e), Ok(w)) => (w, e),
    other => panic!("expected exactly one success, got {other:?}"),
  };
  assert_eq!(
    registry_err(loser_err),
    papers_core::Error::UniquenessViolation { credential_id: credential.id, holder: winner.id }
  );
  assert_eq!(
    a.find_person_by_credential(credential.id).await.unwrap(),
    Some(winner)
  );
}
