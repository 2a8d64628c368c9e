use crate::model::GeneratedDraft;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
pub struct Choice {
    pub message: ChatMessage,
}

#[derive(Deserialize, Debug)]
pub struct ChatMessage {
    pub content: String,
}

/// Shape the model is instructed to answer with.
#[derive(Deserialize, Debug)]
pub struct DraftsPayload {
    #[serde(default)]
    pub drafts: Vec<GeneratedDraft>,
}
