//! [`SqliteStore`]: the SQLite implementation of [`CredentialStore`] and
//! [`PersonStore`].

use std::{path::Path, time::Duration};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension as _, TransactionBehavior};

use papers_core::{
  enforcer::{guard_exists, EdgeState},
  entity::{
    Credential, CredentialId, NewCredential, NewPerson, Person, PersonId,
    PersonName, PersonView,
  },
  store::{CredentialStore, PersonStore},
  validate::{validate_credential, validate_expiry, validate_name},
};

use crate::{
  constraint::{self, Constraint},
  encode::{
    encode_dt, RawCredential, RawPerson, CREDENTIAL_COLUMNS, PERSON_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result, StoreConfig,
};

// ─── Transaction plumbing ────────────────────────────────────────────────────

/// Why a transaction body stopped before committing. Either way the
/// transaction is dropped and rolled back.
#[derive(Debug)]
pub(crate) enum Abort {
  Rule(papers_core::Error),
  Sql(rusqlite::Error),
}

impl From<papers_core::Error> for Abort {
  fn from(e: papers_core::Error) -> Self { Self::Rule(e) }
}

impl From<rusqlite::Error> for Abort {
  fn from(e: rusqlite::Error) -> Self { Self::Sql(e) }
}

impl From<Abort> for Error {
  fn from(abort: Abort) -> Self {
    match abort {
      Abort::Rule(e) => Error::Registry(e),
      Abort::Sql(e) => Error::Database(e.into()),
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A registry backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Several
/// stores (or processes) may open the same file; every mutation runs in a
/// `BEGIN IMMEDIATE` transaction, so competing writers are serialized by
/// SQLite's write lock.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` with the default busy timeout.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, StoreConfig::default().busy_timeout()).await
  }

  /// Open the store described by `config`.
  pub async fn open_with(config: &StoreConfig) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(&config.path).await?;
    Self::init(conn, config.busy_timeout()).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, StoreConfig::default().busy_timeout()).await
  }

  async fn init(conn: tokio_rusqlite::Connection, busy_timeout: Duration) -> Result<Self> {
    conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn })
  }

  /// Run `body` on the connection thread. Rule rejections are logged here
  /// and surface as [`Error::Registry`].
  async fn run<T, F>(&self, op: &'static str, body: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T, Abort> + Send + 'static,
  {
    match self.conn.call(move |conn| Ok(body(conn))).await? {
      Ok(value) => Ok(value),
      Err(Abort::Rule(e)) => Err(rejected(op, e)),
      Err(abort) => Err(abort.into()),
    }
  }
}

/// Log a rule rejection of `op` and wrap it. Used both for input that fails
/// validation before reaching the connection and for rejections raised inside
/// a transaction.
fn rejected(op: &'static str, e: papers_core::Error) -> Error {
  tracing::debug!(op, kind = ?e.kind(), error = %e, "rejected");
  Error::Registry(e)
}

// ─── Queries shared by both traits ───────────────────────────────────────────

fn select_credential(conn: &Connection, id: CredentialId) -> rusqlite::Result<Option<RawCredential>> {
  conn
    .query_row(
      &format!("SELECT {CREDENTIAL_COLUMNS} FROM credential WHERE credential_id = ?1"),
      params![id.0],
      RawCredential::from_row,
    )
    .optional()
}

fn select_person(conn: &Connection, id: PersonId) -> rusqlite::Result<Option<RawPerson>> {
  conn
    .query_row(
      &format!("SELECT {PERSON_COLUMNS} FROM person WHERE person_id = ?1"),
      params![id.0],
      RawPerson::from_row,
    )
    .optional()
}

fn credential_exists(conn: &Connection, id: CredentialId) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM credential WHERE credential_id = ?1",
        params![id.0],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn holder_of(conn: &Connection, credential_id: CredentialId) -> rusqlite::Result<Option<PersonId>> {
  conn
    .query_row(
      "SELECT person_id FROM person WHERE credential_id = ?1",
      params![credential_id.0],
      |row| row.get(0).map(PersonId),
    )
    .optional()
}

fn edge_state(conn: &Connection, credential_id: CredentialId) -> rusqlite::Result<EdgeState> {
  holder_of(conn, credential_id).map(EdgeState::from_holder)
}

/// Existence rule, then uniqueness rule, for a reference about to be written
/// on `claimant` (`None` while the person is being created).
fn check_claim(
  conn: &Connection,
  credential_id: CredentialId,
  claimant: Option<PersonId>,
) -> Result<(), Abort> {
  guard_exists(credential_id, credential_exists(conn, credential_id)?)?;
  edge_state(conn, credential_id)?.guard_assign(credential_id, claimant)?;
  Ok(())
}

/// Translate an engine rejection of a person write carrying `credential_id`.
pub(crate) fn claim_rejected(
  conn: &Connection,
  err: rusqlite::Error,
  credential_id: Option<CredentialId>,
) -> Abort {
  let Some(credential_id) = credential_id else {
    return Abort::Sql(err);
  };
  let rule = match constraint::violated(&err) {
    Some(Constraint::Unique) => match holder_of(conn, credential_id) {
      Ok(Some(holder)) => papers_core::Error::UniquenessViolation { credential_id, holder },
      _ => return Abort::Sql(err),
    },
    Some(Constraint::ForeignKey) => papers_core::Error::DanglingReference(credential_id),
    None => return Abort::Sql(err),
  };
  tracing::warn!(%credential_id, kind = ?rule.kind(), "storage constraint rejected assignment");
  Abort::Rule(rule)
}

/// Translate an engine rejection of a credential delete.
pub(crate) fn delete_rejected(
  conn: &Connection,
  err: rusqlite::Error,
  credential_id: CredentialId,
) -> Abort {
  if constraint::violated(&err) != Some(Constraint::ForeignKey) {
    return Abort::Sql(err);
  }
  match holder_of(conn, credential_id) {
    Ok(Some(holder)) => {
      tracing::warn!(%credential_id, %holder, "storage constraint rejected delete");
      Abort::Rule(papers_core::Error::Referenced { credential_id, holder })
    }
    _ => Abort::Sql(err),
  }
}

// ─── CredentialStore impl ────────────────────────────────────────────────────

impl CredentialStore for SqliteStore {
  type Error = Error;

  async fn create_credential(&self, input: NewCredential) -> Result<Credential> {
    validate_credential(&input, Utc::now())
      .map_err(|e| rejected("create_credential", e.into()))?;

    let code           = input.code.clone();
    let expires_at_str = encode_dt(input.expires_at);

    let id = self
      .run("create_credential", move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "INSERT INTO credential (code, expires_at) VALUES (?1, ?2)",
          params![code, expires_at_str],
        )?;
        let id = CredentialId(tx.last_insert_rowid());
        tx.commit()?;
        Ok(id)
      })
      .await?;

    tracing::debug!(credential_id = %id, "credential created");
    Ok(Credential { id, code: input.code, expires_at: input.expires_at })
  }

  async fn get_credential(&self, id: CredentialId) -> Result<Credential> {
    let raw = self
      .run("get_credential", move |conn| {
        Ok(select_credential(conn, id)?.ok_or(papers_core::Error::CredentialNotFound(id))?)
      })
      .await?;
    raw.into_credential()
  }

  async fn renew_credential(
    &self,
    id: CredentialId,
    expires_at: DateTime<Utc>,
  ) -> Result<Credential> {
    validate_expiry(expires_at, Utc::now())
      .map_err(|e| rejected("renew_credential", e.into()))?;
    let expires_at_str = encode_dt(expires_at);

    let raw = self
      .run("renew_credential", move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE credential SET expires_at = ?2 WHERE credential_id = ?1",
          params![id.0, expires_at_str],
        )?;
        if changed == 0 {
          return Err(papers_core::Error::CredentialNotFound(id).into());
        }
        let raw = select_credential(&tx, id)?.ok_or(papers_core::Error::CredentialNotFound(id))?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    tracing::debug!(credential_id = %id, %expires_at, "credential renewed");
    raw.into_credential()
  }

  async fn delete_credential(&self, id: CredentialId) -> Result<()> {
    self
      .run("delete_credential", move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !credential_exists(&tx, id)? {
          return Err(papers_core::Error::CredentialNotFound(id).into());
        }
        edge_state(&tx, id)?.guard_delete(id)?;
        tx.execute("DELETE FROM credential WHERE credential_id = ?1", params![id.0])
          .map_err(|e| delete_rejected(&tx, e, id))?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(credential_id = %id, "credential deleted");
    Ok(())
  }

  async fn list_credentials(&self) -> Result<Vec<Credential>> {
    let raws: Vec<RawCredential> = self
      .run("list_credentials", |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CREDENTIAL_COLUMNS} FROM credential ORDER BY credential_id"
        ))?;
        let rows = stmt
          .query_map([], RawCredential::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCredential::into_credential).collect()
  }
}

// ─── PersonStore impl ────────────────────────────────────────────────────────

impl PersonStore for SqliteStore {
  type Error = Error;

  async fn create_person(&self, input: NewPerson) -> Result<Person> {
    validate_name(&input.name).map_err(|e| rejected("create_person", e.into()))?;

    let NewPerson { name, credential_id } = input;
    let first_name = name.first_name.clone();
    let last_name  = name.last_name.clone();

    let id = self
      .run("create_person", move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if let Some(credential_id) = credential_id {
          check_claim(&tx, credential_id, None)?;
        }
        tx.execute(
          "INSERT INTO person (first_name, last_name, credential_id) VALUES (?1, ?2, ?3)",
          params![first_name, last_name, credential_id.map(|c| c.0)],
        )
        .map_err(|e| claim_rejected(&tx, e, credential_id))?;
        let id = PersonId(tx.last_insert_rowid());
        tx.commit()?;
        Ok(id)
      })
      .await?;

    tracing::debug!(person_id = %id, credential_id = ?credential_id, "person created");
    Ok(Person { id, name, credential_id })
  }

  async fn get_person(&self, id: PersonId) -> Result<Person> {
    let raw = self
      .run("get_person", move |conn| {
        Ok(select_person(conn, id)?.ok_or(papers_core::Error::PersonNotFound(id))?)
      })
      .await?;
    Ok(raw.into_person())
  }

  async fn rename_person(&self, id: PersonId, name: PersonName) -> Result<Person> {
    validate_name(&name).map_err(|e| rejected("rename_person", e.into()))?;

    let raw = self
      .run("rename_person", move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE person SET first_name = ?2, last_name = ?3 WHERE person_id = ?1",
          params![id.0, name.first_name, name.last_name],
        )?;
        if changed == 0 {
          return Err(papers_core::Error::PersonNotFound(id).into());
        }
        let raw = select_person(&tx, id)?.ok_or(papers_core::Error::PersonNotFound(id))?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    tracing::debug!(person_id = %id, "person renamed");
    Ok(raw.into_person())
  }

  async fn set_credential(
    &self,
    id: PersonId,
    credential_id: Option<CredentialId>,
  ) -> Result<Person> {
    let raw = self
      .run("set_credential", move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut raw = select_person(&tx, id)?.ok_or(papers_core::Error::PersonNotFound(id))?;
        if let Some(credential_id) = credential_id {
          check_claim(&tx, credential_id, Some(id))?;
        }
        tx.execute(
          "UPDATE person SET credential_id = ?2 WHERE person_id = ?1",
          params![id.0, credential_id.map(|c| c.0)],
        )
        .map_err(|e| claim_rejected(&tx, e, credential_id))?;
        tx.commit()?;
        raw.credential_id = credential_id.map(|c| c.0);
        Ok(raw)
      })
      .await?;

    tracing::debug!(person_id = %id, credential_id = ?credential_id, "credential reference set");
    Ok(raw.into_person())
  }

  async fn delete_person(&self, id: PersonId) -> Result<()> {
    self
      .run("delete_person", move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute("DELETE FROM person WHERE person_id = ?1", params![id.0])?;
        if changed == 0 {
          return Err(papers_core::Error::PersonNotFound(id).into());
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(person_id = %id, "person deleted");
    Ok(())
  }

  async fn list_people(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .run("list_people", |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSON_COLUMNS} FROM person ORDER BY person_id"
        ))?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawPerson::into_person).collect())
  }

  async fn find_person_by_credential(
    &self,
    credential_id: CredentialId,
  ) -> Result<Option<Person>> {
    let raw = self
      .run("find_person_by_credential", move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PERSON_COLUMNS} FROM person WHERE credential_id = ?1"),
              params![credential_id.0],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawPerson::into_person))
  }

  async fn resolve_person(&self, id: PersonId) -> Result<PersonView> {
    let (person, credential) = self
      .run("resolve_person", move |conn| {
        // One read transaction so the person and its credential are a
        // consistent snapshot.
        let tx = conn.transaction()?;
        let person = select_person(&tx, id)?.ok_or(papers_core::Error::PersonNotFound(id))?;
        let credential = match person.credential_id {
          Some(credential_id) => select_credential(&tx, CredentialId(credential_id))?,
          None => None,
        };
        tx.commit()?;
        Ok((person, credential))
      })
      .await?;

    Ok(PersonView {
      person:     person.into_person(),
      credential: credential.map(RawCredential::into_credential).transpose()?,
    })
  }
}
