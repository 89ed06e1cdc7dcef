//! [`SqliteStore`] — the SQLite implementation of [`IdentityStore`].

use std::{collections::BTreeSet, path::Path, time::Duration};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use ident_core::{
  consolidated::ConsolidatedContact,
  contact::{Contact, ContactId, NewContact},
  resolver::{Observation, resolve},
  store::{ContactStore, IdentityStore},
};

use crate::{
  Error, Result,
  encode::{CONTACT_COLUMNS, RawContact, encode_dt, encode_precedence},
  schema::SCHEMA,
};

/// How long a resolution waits for another writer's lock on the same file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// An identity store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let version: i64 = self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?)
      })
      .await?;
    tracing::debug!(version, "contact schema ready");
    Ok(())
  }

  /// Retrieve a contact by id. Returns `None` if not found.
  pub async fn get_contact(&self, id: ContactId) -> Result<Option<Contact>> {
    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1"),
              rusqlite::params![id],
              RawContact::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  /// Every contact, ordered by id.
  pub async fn list_contacts(&self) -> Result<Vec<Contact>> {
    let raws: Vec<RawContact> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY id"))?;
        let rows = stmt
          .query_map([], RawContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }
}

// ─── IdentityStore impl ──────────────────────────────────────────────────────

impl IdentityStore for SqliteStore {
  type Error = Error;

  /// Runs the whole resolution inside one `BEGIN IMMEDIATE` transaction, so
  /// concurrent resolutions against the same file serialise and a failure
  /// rolls back every write made so far.
  async fn identify(&self, observation: Observation) -> Result<ConsolidatedContact> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = resolve(&mut TxContacts { conn: &*tx }, &observation);
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?
  }
}

// ─── Row access inside a transaction ─────────────────────────────────────────

/// [`ContactStore`] over a connection that already holds an open transaction.
struct TxContacts<'a> {
  conn: &'a rusqlite::Connection,
}

impl TxContacts<'_> {
  fn query(
    &self,
    sql: &str,
    params: impl rusqlite::Params,
  ) -> Result<Vec<Contact>> {
    let mut stmt = self.conn.prepare_cached(sql)?;
    let raws = stmt
      .query_map(params, RawContact::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawContact::into_contact).collect()
  }
}

impl ContactStore for TxContacts<'_> {
  type Error = Error;

  fn find_by_email_or_phone(
    &self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Vec<Contact>> {
    // `col = NULL` is never true in SQL; the explicit guards keep that
    // guarantee visible.
    self.query(
      &format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE (?1 IS NOT NULL AND email = ?1)
            OR (?2 IS NOT NULL AND phone_number = ?2)
         ORDER BY id"
      ),
      rusqlite::params![email, phone_number],
    )
  }

  fn find_by_ids_or_linked_id(
    &self,
    ids: &BTreeSet<ContactId>,
  ) -> Result<Vec<Contact>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }

    // Numbered parameters can be referenced twice, once per IN list.
    let placeholders = (1..=ids.len())
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");

    self.query(
      &format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE id IN ({placeholders}) OR linked_id IN ({placeholders})
         ORDER BY id"
      ),
      rusqlite::params_from_iter(ids.iter()),
    )
  }

  fn create(&mut self, input: NewContact) -> Result<Contact> {
    let now = Utc::now();
    let at_str = encode_dt(now);

    self.conn.execute(
      "INSERT INTO contacts (
         email, phone_number, linked_id, link_precedence, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
      rusqlite::params![
        input.email,
        input.phone_number,
        input.linked_id,
        encode_precedence(input.link_precedence),
        at_str,
      ],
    )?;

    let id = self.conn.last_insert_rowid();
    Ok(input.into_contact(id, now))
  }

  fn update(&mut self, contact: &Contact) -> Result<()> {
    let changed = self.conn.execute(
      "UPDATE contacts
       SET link_precedence = ?1, linked_id = ?2, updated_at = ?3
       WHERE id = ?4",
      rusqlite::params![
        encode_precedence(contact.link_precedence),
        contact.linked_id,
        encode_dt(contact.updated_at),
        contact.id,
      ],
    )?;

    if changed == 0 {
      return Err(Error::ContactNotFound(contact.id));
    }
    Ok(())
  }
}
