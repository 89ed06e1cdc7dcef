//! Contact records — the single entity of the identity graph.
//!
//! A contact is one observation of an email and/or phone number. Contacts that
//! share a value are grouped under a single primary; every other member of the
//! group is a secondary pointing straight at that primary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned contact identifier. Never reused.
pub type ContactId = i64;

// ─── Precedence ──────────────────────────────────────────────────────────────

/// Whether a contact is the canonical representative of its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPrecedence {
  Primary,
  Secondary,
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A persisted contact row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  pub id:              ContactId,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  /// Set exactly when `link_precedence` is [`LinkPrecedence::Secondary`];
  /// always the id of the group's primary.
  pub linked_id:       Option<ContactId>,
  pub link_precedence: LinkPrecedence,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  /// Reserved for soft deletion; never set by the resolver.
  pub deleted_at:      Option<DateTime<Utc>>,
}

impl Contact {
  pub fn is_primary(&self) -> bool {
    self.link_precedence == LinkPrecedence::Primary
  }

  /// `true` if this contact is already a secondary of `primary_id`.
  pub fn is_linked_to(&self, primary_id: ContactId) -> bool {
    self.link_precedence == LinkPrecedence::Secondary
      && self.linked_id == Some(primary_id)
  }

  /// Demote to a secondary of `primary_id`.
  ///
  /// Returns `false` without touching `updated_at` if the contact was already
  /// linked that way.
  pub fn link_to(&mut self, primary_id: ContactId, now: DateTime<Utc>) -> bool {
    if self.is_linked_to(primary_id) {
      return false;
    }
    self.link_precedence = LinkPrecedence::Secondary;
    self.linked_id = Some(primary_id);
    self.updated_at = now;
    true
  }
}

// ─── NewContact ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::ContactStore::create`].
/// `id` and the timestamps are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub link_precedence: LinkPrecedence,
  pub linked_id:       Option<ContactId>,
}

impl NewContact {
  /// A fresh primary carrying the given values.
  pub fn primary(email: Option<String>, phone_number: Option<String>) -> Self {
    Self {
      email,
      phone_number,
      link_precedence: LinkPrecedence::Primary,
      linked_id: None,
    }
  }

  /// A fresh secondary of `primary_id` carrying the given values.
  pub fn secondary(
    email: Option<String>,
    phone_number: Option<String>,
    primary_id: ContactId,
  ) -> Self {
    Self {
      email,
      phone_number,
      link_precedence: LinkPrecedence::Secondary,
      linked_id: Some(primary_id),
    }
  }

  /// Materialise the row a store would persist for this input.
  pub fn into_contact(self, id: ContactId, now: DateTime<Utc>) -> Contact {
    Contact {
      id,
      email: self.email,
      phone_number: self.phone_number,
      linked_id: self.linked_id,
      link_precedence: self.link_precedence,
      created_at: now,
      updated_at: now,
      deleted_at: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn link_to_is_a_no_op_when_already_linked() {
    let created = Utc::now();
    let mut c = NewContact::secondary(Some("a@x.io".into()), None, 1)
      .into_contact(2, created);

    let later = created + chrono::Duration::seconds(5);
    assert!(!c.link_to(1, later));
    assert_eq!(c.updated_at, created);

    assert!(c.link_to(7, later));
    assert_eq!(c.linked_id, Some(7));
    assert_eq!(c.updated_at, later);
  }

  #[test]
  fn precedence_serialises_lowercase() {
    let json = serde_json::to_string(&LinkPrecedence::Secondary).unwrap();
    assert_eq!(json, "\"secondary\"");
  }
}
