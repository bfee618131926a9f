mod openai;

use crate::config::{ApiKey, ModelName};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use openai::OpenAiCompletionClient;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: ModelName,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// A conversation made of exactly one user turn.
    pub fn single_user(model: ModelName, content: String) -> Self {
        Self {
            model,
            messages: vec![ChatMessage {
                role: Role::User,
                content,
            }],
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CompletionError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("http error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("completion response contained no text")]
    EmptyResponse,
}

pub trait CompletionClient: Send + Sync {
    fn complete(
        &self,
        credential: ApiKey,
        request: ChatRequest,
    ) -> BoxFuture<'_, Result<String, CompletionError>>;
}
