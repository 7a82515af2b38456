//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - KvStore: read-only access to the prompt key-value table
//! - KvAdmin: the admin write path (seeding, editing)
//! - ChatCompletion: the hosted language model
//!
//! These traits keep the template engine and resolver independent of
//! SQLite and of any particular model provider.

pub mod chat_completion;
pub mod kv_store;

pub use chat_completion::ChatCompletion;
pub use kv_store::{KvAdmin, KvStore};
