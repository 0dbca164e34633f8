//! # Pathwise Core
//!
//! Domain types, traits, and error definitions for the Pathwise
//! career-guidance assistant. This crate has **zero framework dependencies**;
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here:
//! - [`CatalogReader`] / [`CatalogWriter`] for the college and branch catalog
//! - [`SessionLog`] for per-session conversation turns
//! - [`Provider`] for the generative-language model
//!
//! Implementations live in their respective crates, and handles are passed
//! in explicitly so tests can swap in stubs.

pub mod catalog;
pub mod error;
pub mod message;
pub mod provider;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use catalog::{Branch, CatalogReader, CatalogSnapshot, CatalogWriter, College};
pub use error::{CatalogError, CompletionError, ProviderError, StorageError, ValidationError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use session::{ConversationTurn, SessionId, SessionLog};
