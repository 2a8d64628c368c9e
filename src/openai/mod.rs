use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::{json, Value};
use std::fmt;
use tracing::warn;

use crate::model::{Customer, GeneratedDraft};
use crate::openai::model::{ChatCompletionResponse, DraftsPayload};

pub mod model;

const OPENAI_API_BASE: &str = "https://api.openai.com/";

/// Generation collaborator: produces candidate drafts for one customer.
/// Implemented by the real OpenAI client and by scripted fakes in tests.
#[async_trait]
pub trait DraftSource: Send + Sync {
    async fn generate_drafts(
        &self,
        customer: &Customer,
        used_titles: &[String],
        count: usize,
    ) -> Result<Vec<GeneratedDraft>>;
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String) -> Self {
        let base_url = Url::parse(OPENAI_API_BASE).expect("valid default OpenAI URL");
        Self::with_base_url(api_key, model, base_url)
    }

    pub fn with_base_url(api_key: String, model: String, base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("draftbot/0.1")
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }

    async fn execute_completion(&self, body: Value) -> Result<String> {
        let endpoint = self
            .base_url
            .join("v1/chat/completions")
            .context("invalid OpenAI base URL")?;
        let res = self
            .http
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("failed to reach OpenAI")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!("OpenAI API error - Status: {}, Body: {}", status, body);
            return Err(anyhow!("openai error {}: {}", status, body));
        }

        let payload: ChatCompletionResponse =
            res.json().await.context("invalid OpenAI response JSON")?;
        payload
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("openai response contained no choices"))
    }
}

#[async_trait]
impl DraftSource for OpenAiClient {
    async fn generate_drafts(
        &self,
        customer: &Customer,
        used_titles: &[String],
        count: usize,
    ) -> Result<Vec<GeneratedDraft>> {
        let prompt = build_prompt(customer, used_titles, count);
        let body = build_completion_request(&self.model, &prompt);
        let content = self.execute_completion(body).await?;
        parse_drafts(&content)
    }
}

/// Assemble the generation prompt from the customer profile and the recent
/// topics to steer away from. The model must answer with a bare JSON object.
pub fn build_prompt(customer: &Customer, used_titles: &[String], count: usize) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "You are a veteran brand-blog writer. Write {count} blog drafts for \"{}\".\n\n",
        customer.name
    ));

    prompt.push_str("[Business profile]\n");
    let mut field = |label: &str, value: &Option<String>| {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            prompt.push_str(&format!("- {label}: {v}\n"));
        }
    };
    field("Business type", &customer.business_type);
    field("Specialty", &customer.specialty);
    field("Target audience", &customer.target_audience);
    field("Brand concept", &customer.brand_concept);
    field("Price range", &customer.price_range);
    field("Location", &customer.location_info);
    field("Tone", &customer.tone);
    if !customer.main_services.is_empty() {
        prompt.push_str(&format!(
            "- Main services: {}\n",
            customer.main_services.join(", ")
        ));
    }
    if !customer.keywords.is_empty() {
        prompt.push_str(&format!(
            "- Target keywords: {}\n",
            customer.keywords.join(", ")
        ));
        prompt.push_str(
            "Each title must lead naturally with one of the target keywords.\n",
        );
    }
    if !customer.preferred_expressions.is_empty() {
        prompt.push_str(&format!(
            "- Preferred expressions: {}\n",
            customer.preferred_expressions.join(", ")
        ));
    }
    if !customer.avoided_expressions.is_empty() {
        prompt.push_str(&format!(
            "- Expressions to avoid: {}\n",
            customer.avoided_expressions.join(", ")
        ));
    }

    if !used_titles.is_empty() {
        prompt.push_str("\n[Topics already covered - avoid similar content]\n");
        for title in used_titles {
            prompt.push_str(&format!("- {title}\n"));
        }
    }

    prompt.push_str(
        "\nEach draft is an informational article, not an advertisement: mention the \
business at most once or twice, keep one topic per draft developed in depth, \
use short sentences, and write at least 1500 characters of body text.\n\n\
Answer with JSON only, in this exact shape:\n\
{\"drafts\": [{\"title\": \"...\", \"content\": \"...\", \"main_keyword\": \"...\"}]}\n",
    );
    prompt
}

pub fn build_completion_request(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "temperature": 0.75,
        "max_tokens": 6000,
        "response_format": { "type": "json_object" },
    })
}

/// Parse the model's JSON answer into drafts. An answer that parses but holds
/// no drafts is returned as an empty vec; the generator treats that as a soft
/// failure for the customer.
pub fn parse_drafts(content: &str) -> Result<Vec<GeneratedDraft>> {
    let payload: DraftsPayload =
        serde_json::from_str(content).context("generation answer was not the expected JSON")?;
    Ok(payload.drafts)
}
