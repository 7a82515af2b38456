//! Chat-completion adapters.
//!
//! Only a scripted mock lives here: the hosted model client is an external
//! collaborator supplied by the embedding application.

pub mod mock;

pub use mock::{EchoChatClient, MockChatClient, MockReply};
