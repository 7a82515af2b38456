//! Mock chat-completion client for testing and dry runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChatRequest, ChatResponse};
use crate::domain::ports::ChatCompletion;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Failure(String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }
}

impl Default for MockReply {
    fn default() -> Self {
        Self::Text("[]".to_string())
    }
}

/// Replays queued replies in order, then the default reply forever.
/// Every request is recorded for inspection.
#[derive(Default)]
pub struct MockChatClient {
    default_reply: MockReply,
    queued: Arc<RwLock<VecDeque<MockReply>>>,
    requests: Arc<RwLock<Vec<ChatRequest>>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_reply(reply: MockReply) -> Self {
        Self {
            default_reply: reply,
            ..Self::default()
        }
    }

    /// Echoes the user prompt back, handy for `--dry-run`.
    pub fn echo() -> EchoChatClient {
        EchoChatClient
    }

    pub async fn enqueue(&self, reply: MockReply) {
        self.queued.write().await.push_back(reply);
    }

    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl ChatCompletion for MockChatClient {
    async fn complete(&self, request: ChatRequest) -> DomainResult<ChatResponse> {
        self.requests.write().await.push(request);

        let reply = self
            .queued
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| self.default_reply.clone());

        match reply {
            MockReply::Text(text) => Ok(ChatResponse { text }),
            MockReply::Failure(message) => Err(DomainError::ChatCompletionFailed(message)),
        }
    }
}

/// Returns the user prompt as the completion text.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoChatClient;

#[async_trait]
impl ChatCompletion for EchoChatClient {
    async fn complete(&self, request: ChatRequest) -> DomainResult<ChatResponse> {
        Ok(ChatResponse {
            text: request.user_prompt,
        })
    }
}
