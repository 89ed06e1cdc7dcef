//! The `ContactStore` and `IdentityStore` traits.
//!
//! [`ContactStore`] is the row-level collaborator the resolver drives. It is
//! synchronous on purpose: backends hand the resolver a store that lives inside
//! their own transaction or lock, so one resolution is one unit of work.
//!
//! [`IdentityStore`] is what higher layers (`ident-api`, `ident-server`) depend
//! on: an async façade that runs a whole resolution under the backend's
//! concurrency guard.

use std::{collections::BTreeSet, future::Future};

use chrono::{DateTime, Utc};

use crate::{
  Error,
  consolidated::ConsolidatedContact,
  contact::{Contact, ContactId, NewContact},
  resolver::Observation,
};

// ─── Row-level access ────────────────────────────────────────────────────────

/// Query and mutation primitives over contact rows.
pub trait ContactStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every contact whose email equals `email` or whose phone number equals
  /// `phone_number`. An absent argument never matches a null column.
  fn find_by_email_or_phone(
    &self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Vec<Contact>, Self::Error>;

  /// Every contact whose id is in `ids` or whose `linked_id` is in `ids`.
  fn find_by_ids_or_linked_id(
    &self,
    ids: &BTreeSet<ContactId>,
  ) -> Result<Vec<Contact>, Self::Error>;

  /// Persist a new contact. The store assigns `id` and both timestamps.
  fn create(&mut self, input: NewContact) -> Result<Contact, Self::Error>;

  /// Persist `link_precedence`, `linked_id` and `updated_at` of an existing
  /// contact, addressed by id.
  fn update(&mut self, contact: &Contact) -> Result<(), Self::Error>;

  /// The clock used for `updated_at` bumps.
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

// ─── Resolution façade ───────────────────────────────────────────────────────

/// A backend able to run a complete identity resolution atomically.
///
/// Implementations must guarantee at most one writer per identity group while
/// [`crate::resolver::resolve`] runs, and must not expose a partial merge if
/// it fails.
pub trait IdentityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Resolve an already-validated observation.
  fn identify(
    &self,
    observation: Observation,
  ) -> impl Future<Output = Result<ConsolidatedContact, Self::Error>> + Send + '_;

  /// Validate raw request fields and resolve them.
  ///
  /// Fails with [`Error::InvalidRequest`] before touching the store if both
  /// fields are absent or empty; backend failures surface as
  /// [`Error::Storage`].
  fn resolve(
    &self,
    email: Option<String>,
    phone_number: Option<String>,
  ) -> impl Future<Output = Result<ConsolidatedContact, Error>> + Send + '_ {
    async move {
      let observation = Observation::new(email, phone_number)?;
      self.identify(observation).await.map_err(Error::storage)
    }
  }
}
