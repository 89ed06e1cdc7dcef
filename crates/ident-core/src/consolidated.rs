//! The consolidated read model returned for an identity group.

use serde::{Deserialize, Serialize};

use crate::contact::{Contact, ContactId};

/// The aggregated view of one identity group — never stored, always derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedContact {
  pub primary_contact_id:    ContactId,
  /// The primary's email first, then the rest in group order; no duplicates.
  pub emails:                Vec<String>,
  /// The primary's phone first, then the rest in group order; no duplicates.
  pub phone_numbers:         Vec<String>,
  pub secondary_contact_ids: Vec<ContactId>,
}

impl ConsolidatedContact {
  /// Build the view for `primary` followed by its `members`, in order.
  ///
  /// `members` must not contain the primary itself.
  pub fn from_group(primary: &Contact, members: &[Contact]) -> Self {
    let mut view = Self {
      primary_contact_id:    primary.id,
      emails:                Vec::new(),
      phone_numbers:         Vec::new(),
      secondary_contact_ids: Vec::new(),
    };
    view.absorb(primary);
    for member in members {
      view.secondary_contact_ids.push(member.id);
      view.absorb(member);
    }
    view
  }

  /// `true` if `email` already appears in the group.
  pub fn has_email(&self, email: &str) -> bool {
    self.emails.iter().any(|e| e == email)
  }

  /// `true` if `phone_number` already appears in the group.
  pub fn has_phone_number(&self, phone_number: &str) -> bool {
    self.phone_numbers.iter().any(|p| p == phone_number)
  }

  /// Append a newly created secondary.
  pub fn push_secondary(&mut self, contact: &Contact) {
    self.secondary_contact_ids.push(contact.id);
    self.absorb(contact);
  }

  fn absorb(&mut self, contact: &Contact) {
    if let Some(email) = &contact.email {
      push_unique(&mut self.emails, email);
    }
    if let Some(phone) = &contact.phone_number {
      push_unique(&mut self.phone_numbers, phone);
    }
  }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
  if !values.iter().any(|v| v == value) {
    values.push(value.to_owned());
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::contact::NewContact;

  #[test]
  fn primary_values_lead_and_duplicates_drop() {
    let now = Utc::now();
    let primary = NewContact::primary(Some("p@x.io".into()), Some("111".into()))
      .into_contact(1, now);
    let a = NewContact::secondary(Some("a@x.io".into()), Some("111".into()), 1)
      .into_contact(2, now);
    let b = NewContact::secondary(Some("p@x.io".into()), None, 1)
      .into_contact(3, now);

    let view = ConsolidatedContact::from_group(&primary, &[a, b]);
    assert_eq!(view.primary_contact_id, 1);
    assert_eq!(view.emails, ["p@x.io", "a@x.io"]);
    assert_eq!(view.phone_numbers, ["111"]);
    assert_eq!(view.secondary_contact_ids, [2, 3]);
  }

  #[test]
  fn serialises_with_camel_case_keys() {
    let view = ConsolidatedContact {
      primary_contact_id:    4,
      emails:                vec!["e@x.io".into()],
      phone_numbers:         vec![],
      secondary_contact_ids: vec![9],
    };
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["primaryContactId"], 4);
    assert_eq!(json["phoneNumbers"], serde_json::json!([]));
    assert_eq!(json["secondaryContactIds"], serde_json::json!([9]));
  }
}
