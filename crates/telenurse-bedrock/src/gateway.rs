//! The narrow request/response seam between the interview and a language
//! model.
//!
//! Implementations must be `Send + Sync` so a single gateway can be shared
//! by the session manager and the HTTP handlers. Trait methods return boxed
//! futures to keep the trait dyn-compatible.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chat::ChatMessage;
use crate::error::BedrockError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a completion is for. Extraction calls are run deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMode {
    Conversation,
    Extraction,
}

/// One call to the model: instruction blocks, the conversation, and a mode.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Vec<String>,
    pub messages: Vec<ChatMessage>,
    pub mode: CompletionMode,
}

pub trait LanguageModel: Send + Sync {
    /// Produce the assistant's reply text for `request`.
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, BedrockError>>;
}

impl<M: LanguageModel + ?Sized> LanguageModel for Arc<M> {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, BedrockError>> {
        (**self).complete(request)
    }
}

impl<M: LanguageModel + ?Sized> LanguageModel for Box<M> {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, BedrockError>> {
        (**self).complete(request)
    }
}

/// Wraps a model with an optional per-attempt timeout and a bounded number
/// of attempts.
///
/// Defaults are no timeout and a single attempt. Only transient failures
/// (invocation errors and timeouts) are attempted again.
#[derive(Debug, Clone)]
pub struct Guarded<M> {
    inner: M,
    timeout: Option<Duration>,
    max_attempts: u32,
}

impl<M> Guarded<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            timeout: None,
            max_attempts: 1,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Values below one are treated as one.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: LanguageModel> Guarded<M> {
    async fn attempt(&self, request: &CompletionRequest) -> Result<String, BedrockError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.inner.complete(request))
                .await
                .map_err(|_| BedrockError::Timeout(limit))?,
            None => self.inner.complete(request).await,
        }
    }
}

impl<M: LanguageModel> LanguageModel for Guarded<M> {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, BedrockError>> {
        Box::pin(async move {
            let mut attempt = 1;
            loop {
                match self.attempt(request).await {
                    Ok(text) => return Ok(text),
                    Err(e) if e.is_transient() && attempt < self.max_attempts => {
                        warn!(attempt, max_attempts = self.max_attempts, error = %e, "model call failed, trying again");
                        attempt += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        })
    }
}
