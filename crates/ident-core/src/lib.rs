//! Core types, traits and the resolver for identity reconciliation.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod consolidated;
pub mod contact;
pub mod error;
pub mod memory;
pub mod resolver;
pub mod store;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
