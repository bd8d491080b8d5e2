use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prefix the model uses in `translated_text` to report a failure
pub const MODEL_ERROR_PREFIX: &str = "ERROR";

/// Input handed to the translation capability.
///
/// Language codes are the first two characters of whatever the caller sent;
/// they are not checked against any list of real language codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedInputs {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

/// First two characters of a language field (or the whole value if shorter)
pub fn language_prefix(value: &str) -> String {
    value.chars().take(2).collect()
}

impl NormalizedInputs {
    pub fn new(text: impl Into<String>, source_language: &str, target_language: &str) -> Self {
        Self {
            text: text.into(),
            source_lang: language_prefix(source_language),
            target_lang: language_prefix(target_language),
        }
    }
}

/// What the model produced for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated(String),
    /// The model reported an error; holds its raw text
    Failed(String),
}

impl TranslationOutcome {
    pub fn from_model_text(text: String) -> Self {
        if text.starts_with(MODEL_ERROR_PREFIX) {
            TranslationOutcome::Failed(text)
        } else {
            TranslationOutcome::Translated(text)
        }
    }
}

/// The machine-translation capability behind the gateway
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, inputs: &NormalizedInputs) -> Result<TranslationOutcome>;
}

#[derive(Debug, Deserialize)]
struct WorkersAiResponse {
    #[serde(default = "default_success")]
    success: bool,
    result: Option<WorkersAiResult>,
    #[serde(default)]
    errors: Vec<WorkersAiMessage>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct WorkersAiResult {
    translated_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkersAiMessage {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

/// Translator backed by the Cloudflare Workers AI REST API
pub struct WorkersAiTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
}

impl WorkersAiTranslator {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        let endpoint = format!(
            "{}/accounts/{}/ai/run/{}",
            config.workers_ai_base_url.trim_end_matches('/'),
            config.workers_ai_account_id,
            config.workers_ai_model
        );

        Self {
            client,
            endpoint,
            api_token: config.workers_ai_api_token.clone(),
        }
    }
}

#[async_trait]
impl Translator for WorkersAiTranslator {
    async fn translate(&self, inputs: &NormalizedInputs) -> Result<TranslationOutcome> {
        debug!(
            "Requesting translation {} -> {} ({} chars)",
            inputs.source_lang,
            inputs.target_lang,
            inputs.text.chars().count()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(inputs)
            .send()
            .await
            .context("Failed to send translation request to Workers AI")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("Workers AI error ({}): {}", status, body);
        }

        let parsed: WorkersAiResponse = response
            .json()
            .await
            .context("Failed to parse Workers AI response")?;

        if !parsed.success {
            let reason = parsed
                .errors
                .first()
                .map(|e| match e.code {
                    Some(code) => format!("{} (code {})", e.message, code),
                    None => e.message.clone(),
                })
                .unwrap_or_else(|| "no error details".to_string());
            anyhow::bail!("Workers AI reported failure: {}", reason);
        }

        let translated = parsed
            .result
            .and_then(|r| r.translated_text)
            .context("Workers AI response contained no translated_text")?;

        Ok(TranslationOutcome::from_model_text(translated))
    }
}
