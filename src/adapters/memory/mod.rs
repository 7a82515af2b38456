//! In-memory adapters.

pub mod kv_store;

pub use kv_store::{parse_seed_yaml, InMemoryKvStore};
