//! Adapters for external systems.

pub mod chat;
pub mod memory;
pub mod sqlite;
