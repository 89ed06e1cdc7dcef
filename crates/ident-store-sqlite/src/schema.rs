//! SQL schema for the identity SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- AUTOINCREMENT guarantees ids are never handed out twice, even after the
-- highest row is removed by hand.
CREATE TABLE IF NOT EXISTS contacts (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    email            TEXT,
    phone_number     TEXT,
    linked_id        INTEGER REFERENCES contacts(id),
    link_precedence  TEXT NOT NULL DEFAULT 'primary'
                     CHECK (link_precedence IN ('primary', 'secondary')),
    created_at       TEXT NOT NULL,   -- RFC 3339 UTC; store-assigned
    updated_at       TEXT NOT NULL,   -- RFC 3339 UTC; bumped on relink
    deleted_at       TEXT,            -- reserved for soft deletion
    CHECK ((link_precedence = 'secondary') = (linked_id IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS contacts_email_idx  ON contacts(email);
CREATE INDEX IF NOT EXISTS contacts_phone_idx  ON contacts(phone_number);
CREATE INDEX IF NOT EXISTS contacts_linked_idx ON contacts(linked_id);

PRAGMA user_version = 1;
";
