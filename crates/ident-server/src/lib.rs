//! HTTP server for identity reconciliation.
//!
//! Wires the JSON API onto an axum [`Router`] with a health route and request
//! tracing, and owns the server configuration.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, routing::get};
use ident_core::store::IdentityStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration.
///
/// Layered, lowest precedence first: built-in defaults, the TOML file,
/// `IDENT_*` environment variables, then the command-line port.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl ServerConfig {
  pub fn load(path: &Path, port_override: Option<u16>) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 3000_i64)?
      .set_default("store_path", "ident.sqlite3")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("IDENT"))
      .set_override_option("port", port_override.map(i64::from))?
      .build()?
      .try_deserialize()
  }

  /// `store_path` with a leading `~/` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router for `store`.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: IdentityStore + 'static,
{
  Router::new()
    .route("/", get(health))
    .merge(ident_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

/// `GET /` — liveness check.
async fn health() -> &'static str { "API is running" }

// ─── Integration tests ────────────────────────────────────────────────────────
