//! Chat-completion port - interface to the hosted language model.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ChatRequest, ChatResponse};

/// An opaque, potentially failing chat-completion call.
///
/// No retry is built in; failures propagate as
/// `DomainError::ChatCompletionFailed` and the caller decides whether to
/// re-issue the request.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> DomainResult<ChatResponse>;
}
