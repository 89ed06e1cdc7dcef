//! JSON REST API for identity reconciliation.
//!
//! Exposes an axum [`Router`] backed by any [`ident_core::store::IdentityStore`].
//! Transport concerns and process setup are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(ident_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod identify;

use std::sync::Arc;

use axum::{Router, routing::post};
use ident_core::store::IdentityStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: IdentityStore + 'static,
{
  Router::new()
    .route("/identify", post(identify::handler::<S>))
    .with_state(store)
}
