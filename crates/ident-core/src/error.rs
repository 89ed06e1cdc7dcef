//! Error types for `ident-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Neither an email nor a phone number was supplied.
  #[error("at least one of email or phoneNumber is required")]
  InvalidRequest,

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error as an opaque [`Error::Storage`].
  pub fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
