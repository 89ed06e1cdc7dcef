//! Resolver behaviour against the in-memory store.

use std::sync::{
  Arc,
  atomic::{AtomicI64, Ordering},
};

use chrono::{DateTime, Duration, TimeZone as _, Utc};

use crate::{
  Error,
  consolidated::ConsolidatedContact,
  contact::{Contact, LinkPrecedence, NewContact},
  memory::{Clock, MemoryStore, WriteStats},
  store::IdentityStore,
};

fn epoch() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// A clock that advances one second per reading.
fn ticking_clock() -> Clock {
  let tick = Arc::new(AtomicI64::new(0));
  Arc::new(move || epoch() + Duration::seconds(tick.fetch_add(1, Ordering::SeqCst)))
}

fn store() -> MemoryStore { MemoryStore::with_clock(ticking_clock()) }

async fn identify(
  s: &MemoryStore,
  email: Option<&str>,
  phone: Option<&str>,
) -> ConsolidatedContact {
  s.resolve(email.map(str::to_owned), phone.map(str::to_owned))
    .await
    .unwrap()
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn both_fields_missing_is_invalid_and_writes_nothing() {
  let s = store();

  let err = s.resolve(None, None).await.unwrap_err();
  assert!(matches!(err, Error::InvalidRequest));

  let err = s.resolve(Some(String::new()), Some(String::new())).await.unwrap_err();
  assert!(matches!(err, Error::InvalidRequest));

  assert!(s.contacts().is_empty());
  assert_eq!(s.stats(), WriteStats::default());
}

// ─── Creation and linking ────────────────────────────────────────────────────

#[tokio::test]
async fn new_identity_on_empty_store() {
  let s = store();

  let view = identify(&s, Some("doc@hill.valley"), Some("123456")).await;
  assert_eq!(view.emails, ["doc@hill.valley"]);
  assert_eq!(view.phone_numbers, ["123456"]);
  assert!(view.secondary_contact_ids.is_empty());

  let stored = s.get(view.primary_contact_id).unwrap();
  assert!(stored.is_primary());
  assert_eq!(stored.linked_id, None);
}

#[tokio::test]
async fn email_match_links_new_phone_as_secondary() {
  let s = store();
  let first = identify(&s, Some("lorraine@hill.valley"), Some("111")).await;

  let view = identify(&s, Some("lorraine@hill.valley"), Some("222")).await;
  assert_eq!(view.primary_contact_id, first.primary_contact_id);
  assert_eq!(view.emails, ["lorraine@hill.valley"]);
  assert_eq!(view.phone_numbers, ["111", "222"]);
  assert_eq!(view.secondary_contact_ids.len(), 1);

  let secondary = s.get(view.secondary_contact_ids[0]).unwrap();
  assert!(secondary.is_linked_to(first.primary_contact_id));
  assert_eq!(secondary.phone_number.as_deref(), Some("222"));
}

#[tokio::test]
async fn phone_match_links_new_email_as_secondary() {
  let s = store();
  let first = identify(&s, Some("george@hill.valley"), Some("333")).await;

  let view = identify(&s, Some("mcfly@hill.valley"), Some("333")).await;
  assert_eq!(view.primary_contact_id, first.primary_contact_id);
  assert_eq!(view.emails, ["george@hill.valley", "mcfly@hill.valley"]);
  assert_eq!(view.phone_numbers, ["333"]);
  assert_eq!(view.secondary_contact_ids.len(), 1);
}

#[tokio::test]
async fn multiple_secondaries_accumulate_in_creation_order() {
  let s = store();
  identify(&s, Some("biff@hill.valley"), Some("444")).await;
  identify(&s, Some("biff@hill.valley"), Some("555")).await;

  let view = identify(&s, Some("tannen@hill.valley"), Some("444")).await;
  assert_eq!(view.emails, ["biff@hill.valley", "tannen@hill.valley"]);
  assert_eq!(view.phone_numbers, ["444", "555"]);
  assert_eq!(view.secondary_contact_ids, [2, 3]);
}

#[tokio::test]
async fn absent_field_never_matches_null_column() {
  let s = store();
  let email_only = identify(&s, Some("solo@hill.valley"), None).await;

  let phone_only = identify(&s, None, Some("999")).await;
  assert_ne!(phone_only.primary_contact_id, email_only.primary_contact_id);
  assert!(phone_only.emails.is_empty());
  assert!(phone_only.secondary_contact_ids.is_empty());
  assert_eq!(s.contacts().len(), 2);
}

#[tokio::test]
async fn match_on_secondary_reaches_its_siblings() {
  let s = store();
  identify(&s, Some("marty@hill.valley"), Some("1")).await;
  identify(&s, Some("marty@hill.valley"), Some("2")).await;
  identify(&s, Some("marty@hill.valley"), Some("3")).await;

  // "3" lives only on the last secondary.
  let view = identify(&s, None, Some("3")).await;
  assert_eq!(view.primary_contact_id, 1);
  assert_eq!(view.emails, ["marty@hill.valley"]);
  assert_eq!(view.phone_numbers, ["1", "2", "3"]);
  assert_eq!(view.secondary_contact_ids, [2, 3]);
  assert_eq!(s.contacts().len(), 3);
}

// ─── Idempotence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn identical_requests_are_idempotent() {
  let s = store();
  let first = identify(&s, Some("jennifer@hill.valley"), Some("777")).await;
  let after_first = s.stats();

  let second = identify(&s, Some("jennifer@hill.valley"), Some("777")).await;
  assert_eq!(first, second);
  assert_eq!(s.stats(), after_first);
}

#[tokio::test]
async fn known_pair_in_group_causes_no_writes() {
  let s = store();
  identify(&s, Some("a@hill.valley"), Some("10")).await;
  identify(&s, Some("b@hill.valley"), Some("10")).await;
  let before = s.stats();

  // Both values already present, though never together on one row.
  let view = identify(&s, Some("b@hill.valley"), Some("10")).await;
  let again = identify(&s, Some("a@hill.valley"), None).await;

  assert_eq!(s.stats(), before);
  assert_eq!(view, again);
  assert_eq!(view.secondary_contact_ids, [2]);
}

// ─── Merging groups ──────────────────────────────────────────────────────────

#[tokio::test]
async fn bridging_request_merges_two_groups_under_older_primary() {
  let s = store();
  let a = identify(&s, Some("e1@hill.valley"), Some("p1")).await;
  let b = identify(&s, Some("e2@hill.valley"), Some("p2")).await;
  // Give group B a secondary of its own.
  let b_grown = identify(&s, Some("e3@hill.valley"), Some("p2")).await;
  let b_secondary = b_grown.secondary_contact_ids[0];
  let creates_before = s.stats().creates;

  let view = identify(&s, Some("e1@hill.valley"), Some("p2")).await;

  assert_eq!(view.primary_contact_id, a.primary_contact_id);
  assert_eq!(view.emails, ["e1@hill.valley", "e2@hill.valley", "e3@hill.valley"]);
  assert_eq!(view.phone_numbers, ["p1", "p2"]);
  assert_eq!(
    view.secondary_contact_ids,
    [b.primary_contact_id, b_secondary]
  );
  // Both values were already known somewhere in the merged group.
  assert_eq!(s.stats().creates, creates_before);

  // No chains: everything in B now points straight at A's primary.
  let old_b = s.get(b.primary_contact_id).unwrap();
  assert_eq!(old_b.link_precedence, LinkPrecedence::Secondary);
  assert_eq!(old_b.linked_id, Some(a.primary_contact_id));
  assert!(s.get(b_secondary).unwrap().is_linked_to(a.primary_contact_id));
}

#[tokio::test]
async fn bridging_from_the_newer_side_still_picks_older_primary() {
  let s = store();
  let a = identify(&s, Some("old@hill.valley"), Some("100")).await;
  let b = identify(&s, Some("new@hill.valley"), Some("200")).await;

  let view = identify(&s, Some("new@hill.valley"), Some("100")).await;
  assert_eq!(view.primary_contact_id, a.primary_contact_id);
  assert_eq!(view.secondary_contact_ids, [b.primary_contact_id]);
  assert_eq!(view.emails, ["old@hill.valley", "new@hill.valley"]);
  assert_eq!(view.phone_numbers, ["100", "200"]);
}

#[tokio::test]
async fn merge_is_stable_on_repeat() {
  let s = store();
  identify(&s, Some("x@hill.valley"), Some("1")).await;
  identify(&s, Some("y@hill.valley"), Some("2")).await;
  let merged = identify(&s, Some("x@hill.valley"), Some("2")).await;
  let before = s.stats();

  let again = identify(&s, Some("x@hill.valley"), Some("2")).await;
  assert_eq!(merged, again);
  assert_eq!(s.stats(), before);
}

// ─── Canonical primary selection ─────────────────────────────────────────────

fn seeded(id: i64, email: &str, phone: &str, created_at: DateTime<Utc>) -> Contact {
  NewContact::primary(Some(email.into()), Some(phone.into())).into_contact(id, created_at)
}

#[tokio::test]
async fn earliest_created_wins_regardless_of_id() {
  let s = store();
  let early = epoch() - Duration::days(1);
  s.seed(seeded(2, "late@hill.valley", "20", epoch()));
  s.seed(seeded(10, "early@hill.valley", "30", early));

  let view = identify(&s, Some("late@hill.valley"), Some("30")).await;
  assert_eq!(view.primary_contact_id, 10);
  assert_eq!(view.emails, ["early@hill.valley", "late@hill.valley"]);
  assert!(s.get(2).unwrap().is_linked_to(10));
}

#[tokio::test]
async fn equal_timestamps_fall_back_to_lowest_id() {
  let fixed = epoch();
  let s = MemoryStore::with_clock(Arc::new(move || fixed));
  s.seed(seeded(5, "five@hill.valley", "5", fixed));
  s.seed(seeded(3, "three@hill.valley", "3", fixed));

  let view = identify(&s, Some("five@hill.valley"), Some("3")).await;
  assert_eq!(view.primary_contact_id, 3);
  assert_eq!(view.secondary_contact_ids, [5]);

  // New rows keep allocating above the seeded ids.
  let fresh = identify(&s, Some("new@hill.valley"), None).await;
  assert_eq!(fresh.primary_contact_id, 6);
}

#[tokio::test]
async fn secondary_is_never_promoted_back() {
  let s = store();
  identify(&s, Some("p@hill.valley"), Some("1")).await;
  identify(&s, Some("s@hill.valley"), Some("2")).await;
  identify(&s, Some("p@hill.valley"), Some("2")).await;

  // Request touching only the demoted contact's values.
  let view = identify(&s, Some("s@hill.valley"), Some("2")).await;
  assert_eq!(view.primary_contact_id, 1);
  assert!(!s.get(2).unwrap().is_primary());
  assert_eq!(
    s.contacts().iter().filter(|c| c.is_primary()).count(),
    1
  );
}
