//! Handler for `POST /identify`.
//!
//! Body: `{"email": string|null, "phoneNumber": string|null}`. Either field may
//! be omitted; at least one must be a non-empty value.

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use ident_core::{consolidated::ConsolidatedContact, store::IdentityStore};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;

/// JSON body accepted by `POST /identify`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyBody {
  #[serde(default)]
  pub email:        Option<String>,
  /// Accepts a bare JSON number as well, e.g. `123456`.
  #[serde(default, deserialize_with = "string_or_number")]
  pub phone_number: Option<String>,
}

/// JSON body returned by `POST /identify`.
#[derive(Debug, Serialize)]
pub struct IdentifyResponse {
  pub contact: ConsolidatedContact,
}

/// `POST /identify` — returns the consolidated contact for the caller's group.
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  body: Result<Json<IdentifyBody>, JsonRejection>,
) -> Result<Json<IdentifyResponse>, ApiError>
where
  S: IdentityStore,
{
  let Json(body) = body?;
  let contact = store.resolve(body.email, body.phone_number).await?;
  Ok(Json(IdentifyResponse { contact }))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Text(String),
    Number(serde_json::Number),
  }

  Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
    Raw::Text(s) => s,
    Raw::Number(n) => n.to_string(),
  }))
}
