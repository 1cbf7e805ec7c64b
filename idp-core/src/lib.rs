//! IdP Core
//!
//! Core library for managing identity-provider integrations declaratively:
//! the resource model, attribute schemas and the provider traits.

pub mod provider;
pub mod resource;
pub mod schema;
