//! Bedrock Converse implementation of [`LanguageModel`].
//!
//! Each system block of a [`CompletionRequest`] becomes its own
//! `SystemContentBlock`, so the interview policy is passed through exactly
//! as configured. Extraction calls run at temperature 0.
//!
//! # Required IAM permissions
//!
//! ```text
//! bedrock:InvokeModel
//! ```

use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message, SystemContentBlock,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::BedrockError;
use crate::gateway::{BoxFuture, CompletionMode, CompletionRequest, LanguageModel};

/// A single message in a conversation sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Language model backed by the Bedrock Converse API.
#[derive(Debug, Clone)]
pub struct BedrockGateway {
    client: aws_sdk_bedrockruntime::Client,
    model_id: String,
}

impl BedrockGateway {
    pub fn new(config: &aws_config::SdkConfig, model_id: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_bedrockruntime::Client::new(config),
            model_id: model_id.into(),
        }
    }

    async fn converse(&self, request: &CompletionRequest) -> Result<String, BedrockError> {
        let call_id = Uuid::new_v4();

        let mut converse_messages: Vec<Message> = Vec::with_capacity(request.messages.len());
        for msg in &request.messages {
            let role = match msg.role {
                ChatRole::User => ConversationRole::User,
                ChatRole::Assistant => ConversationRole::Assistant,
            };
            let message = Message::builder()
                .role(role)
                .content(ContentBlock::Text(msg.content.clone()))
                .build()
                .map_err(|e| BedrockError::Invocation(e.to_string()))?;
            converse_messages.push(message);
        }

        let system = request
            .system
            .iter()
            .map(|block| SystemContentBlock::Text(block.clone()))
            .collect::<Vec<_>>();

        let mut call = self
            .client
            .converse()
            .model_id(&self.model_id)
            .set_system(Some(system))
            .set_messages(Some(converse_messages));

        if request.mode == CompletionMode::Extraction {
            call = call.inference_config(InferenceConfiguration::builder().temperature(0.0).build());
        }

        debug!(call_id = %call_id, model = %self.model_id, mode = ?request.mode, messages = request.messages.len(), "invoking model");

        let response = call
            .send()
            .await
            .map_err(|e| BedrockError::Invocation(e.into_service_error().to_string()))?;

        let output_message = response
            .output()
            .and_then(|o| o.as_message().ok())
            .ok_or_else(|| BedrockError::ResponseParse("no message in response".to_string()))?;

        let response_text = output_message
            .content()
            .iter()
            .filter_map(|block| {
                if let ContentBlock::Text(text) = block {
                    Some(text.as_str())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        if let Some(usage) = response.usage() {
            info!(
                call_id = %call_id,
                model = %self.model_id,
                mode = ?request.mode,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "model call complete"
            );
        }

        Ok(response_text)
    }
}

impl LanguageModel for BedrockGateway {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, BedrockError>> {
        Box::pin(self.converse(request))
    }
}
