//! [`MemoryStore`] — an in-process backend.
//!
//! Every resolution runs under one mutex, which trivially gives a single writer
//! per group. Write counters make it convenient for asserting that a request
//! was (or was not) a no-op.

use std::{
  collections::BTreeSet,
  convert::Infallible,
  future::Future,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};

use crate::{
  consolidated::ConsolidatedContact,
  contact::{Contact, ContactId, NewContact},
  resolver::{Observation, resolve},
  store::{ContactStore, IdentityStore},
};

/// Source of timestamps for created and updated contacts.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Number of row writes issued since the store was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
  pub creates: usize,
  pub updates: usize,
}

/// An identity store held entirely in memory.
pub struct MemoryStore {
  inner: Mutex<MemoryContacts>,
}

struct MemoryContacts {
  rows:    Vec<Contact>,
  next_id: ContactId,
  clock:   Clock,
  stats:   WriteStats,
}

impl Default for MemoryStore {
  fn default() -> Self { Self::new() }
}

impl MemoryStore {
  /// An empty store stamping rows with the wall clock.
  pub fn new() -> Self { Self::with_clock(Arc::new(Utc::now)) }

  /// An empty store stamping rows with `clock`.
  pub fn with_clock(clock: Clock) -> Self {
    Self {
      inner: Mutex::new(MemoryContacts {
        rows: Vec::new(),
        next_id: 1,
        clock,
        stats: WriteStats::default(),
      }),
    }
  }

  /// Insert a pre-built row verbatim, bypassing the resolver.
  ///
  /// Later ids are allocated above the highest seeded id. Seeding does not
  /// count as a write.
  pub fn seed(&self, contact: Contact) {
    let mut inner = self.lock();
    inner.next_id = inner.next_id.max(contact.id + 1);
    inner.rows.push(contact);
  }

  /// A snapshot of every row, ordered by id.
  pub fn contacts(&self) -> Vec<Contact> {
    let mut rows = self.lock().rows.clone();
    rows.sort_by_key(|c| c.id);
    rows
  }

  pub fn get(&self, id: ContactId) -> Option<Contact> {
    self.lock().rows.iter().find(|c| c.id == id).cloned()
  }

  pub fn stats(&self) -> WriteStats { self.lock().stats }

  fn lock(&self) -> MutexGuard<'_, MemoryContacts> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl IdentityStore for MemoryStore {
  type Error = Infallible;

  fn identify(
    &self,
    observation: Observation,
  ) -> impl Future<Output = Result<ConsolidatedContact, Infallible>> + Send + '_ {
    let result = resolve(&mut *self.lock(), &observation);
    std::future::ready(result)
  }
}

impl ContactStore for MemoryContacts {
  type Error = Infallible;

  fn find_by_email_or_phone(
    &self,
    email: Option<&str>,
    phone_number: Option<&str>,
  ) -> Result<Vec<Contact>, Infallible> {
    Ok(
      self
        .rows
        .iter()
        .filter(|c| {
          (email.is_some() && c.email.as_deref() == email)
            || (phone_number.is_some() && c.phone_number.as_deref() == phone_number)
        })
        .cloned()
        .collect(),
    )
  }

  fn find_by_ids_or_linked_id(
    &self,
    ids: &BTreeSet<ContactId>,
  ) -> Result<Vec<Contact>, Infallible> {
    Ok(
      self
        .rows
        .iter()
        .filter(|c| {
          ids.contains(&c.id) || c.linked_id.is_some_and(|l| ids.contains(&l))
        })
        .cloned()
        .collect(),
    )
  }

  fn create(&mut self, input: NewContact) -> Result<Contact, Infallible> {
    let contact = input.into_contact(self.next_id, (self.clock)());
    self.next_id += 1;
    self.stats.creates += 1;
    self.rows.push(contact.clone());
    Ok(contact)
  }

  fn update(&mut self, contact: &Contact) -> Result<(), Infallible> {
    if let Some(row) = self.rows.iter_mut().find(|c| c.id == contact.id) {
      row.link_precedence = contact.link_precedence;
      row.linked_id = contact.linked_id;
      row.updated_at = contact.updated_at;
      self.stats.updates += 1;
    }
    Ok(())
  }

  fn now(&self) -> DateTime<Utc> { (self.clock)() }
}
