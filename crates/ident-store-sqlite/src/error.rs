//! Error type for `ident-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown link precedence: {0:?}")]
  UnknownPrecedence(String),

  /// An update addressed a contact id with no row.
  #[error("contact not found: {0}")]
  ContactNotFound(ident_core::contact::ContactId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
