#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use telenurse_bedrock::error::BedrockError;
use telenurse_bedrock::gateway::{BoxFuture, CompletionRequest, LanguageModel};
use telenurse_session::SessionManager;
use telenurse_storage::local::FileRepository;

pub const POLICY: &str = "You are a friendly nurse. Rate fatigue, appetite, nausea, cough and pain from 1 to 5.";

/// Answers from a fixed script and records every request.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, BedrockError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let model = Self::default();
        for reply in replies {
            model.push(Ok(reply.into()));
        }
        Arc::new(model)
    }

    pub fn push(&self, reply: Result<String, BedrockError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LanguageModel for ScriptedModel {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, BedrockError>> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BedrockError::Invocation("script exhausted".to_string())));
        Box::pin(async move { reply })
    }
}

/// Blocks each call until released, then answers with `reply`.
pub struct GatedModel {
    pub entered: Notify,
    pub release: Notify,
    reply: String,
}

impl GatedModel {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            entered: Notify::new(),
            release: Notify::new(),
            reply: reply.to_string(),
        })
    }
}

impl LanguageModel for GatedModel {
    fn complete<'a>(
        &'a self,
        _request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, BedrockError>> {
        Box::pin(async move {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(self.reply.clone())
        })
    }
}

pub fn manager(model: Arc<dyn LanguageModel>, dir: &tempfile::TempDir) -> SessionManager {
    SessionManager::new(model, Arc::new(FileRepository::new(dir.path())), POLICY)
}

pub fn extraction_json(body: &str) -> String {
    format!("Here is the assessment.\n```json\n{body}\n```")
}
