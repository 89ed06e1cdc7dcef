//! The identity resolver.
//!
//! Given an [`Observation`] and a [`ContactStore`], find the identity group the
//! observation belongs to, collapse it under its oldest contact, and record any
//! value the group has not seen before.

use std::collections::BTreeSet;

use crate::{
  Error, Result,
  consolidated::ConsolidatedContact,
  contact::{Contact, NewContact},
  store::ContactStore,
};

// ─── Observation ─────────────────────────────────────────────────────────────

/// A validated request: at least one of the two values is present.
///
/// Empty strings count as absent. Values are otherwise kept verbatim, since
/// matching is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
  email:        Option<String>,
  phone_number: Option<String>,
}

impl Observation {
  pub fn new(email: Option<String>, phone_number: Option<String>) -> Result<Self> {
    let email = email.filter(|e| !e.is_empty());
    let phone_number = phone_number.filter(|p| !p.is_empty());
    if email.is_none() && phone_number.is_none() {
      return Err(Error::InvalidRequest);
    }
    Ok(Self { email, phone_number })
  }

  pub fn email(&self) -> Option<&str> { self.email.as_deref() }

  pub fn phone_number(&self) -> Option<&str> { self.phone_number.as_deref() }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Run one resolution against `store`.
///
/// The caller is responsible for running this inside whatever guard gives the
/// store a single writer for the duration (a transaction or a lock).
pub fn resolve<S: ContactStore>(
  store: &mut S,
  observation: &Observation,
) -> Result<ConsolidatedContact, S::Error> {
  let email = observation.email();
  let phone_number = observation.phone_number();

  let matches = store.find_by_email_or_phone(email, phone_number)?;

  if matches.is_empty() {
    let contact = store.create(NewContact::primary(
      observation.email.clone(),
      observation.phone_number.clone(),
    ))?;
    tracing::debug!(primary = contact.id, "created new identity");
    return Ok(ConsolidatedContact::from_group(&contact, &[]));
  }

  // A direct match may be a secondary whose siblings hang off its primary, so
  // seed with both the matched ids and the ids they link to.
  let mut seeds = BTreeSet::new();
  for contact in &matches {
    seeds.insert(contact.id);
    seeds.extend(contact.linked_id);
  }

  // The expansion already covers the seeds; folding the direct matches back in
  // keeps the group non-empty whatever the backend returns.
  let mut members = store.find_by_ids_or_linked_id(&seeds)?;
  members.extend(matches);
  members.sort_by_key(|c| (c.created_at, c.id));
  members.dedup_by_key(|c| c.id);

  // Earliest creation wins; equal timestamps fall back to the lowest id.
  let primary: Contact = members.remove(0);

  let now = store.now();
  let mut relinked = 0usize;
  for member in &mut members {
    if member.link_to(primary.id, now) {
      store.update(member)?;
      relinked += 1;
    }
  }
  if relinked > 0 {
    tracing::debug!(primary = primary.id, relinked, "merged identity group");
  }

  let mut view = ConsolidatedContact::from_group(&primary, &members);

  let new_email = email.is_some_and(|e| !view.has_email(e));
  let new_phone = phone_number.is_some_and(|p| !view.has_phone_number(p));
  if new_email || new_phone {
    let secondary = store.create(NewContact::secondary(
      observation.email.clone(),
      observation.phone_number.clone(),
      primary.id,
    ))?;
    tracing::debug!(
      primary = primary.id,
      secondary = secondary.id,
      "recorded new information as secondary"
    );
    view.push_secondary(&secondary);
  }

  Ok(view)
}
