//! HTTP client for a running translation gateway.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, warn};

use crate::envelope::EnvelopeReply;
use crate::retry::{with_retry_if, RetryConfig};
use crate::translation::language_prefix;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub url: String,
    pub secret: String,
    pub timeout: Duration,
    pub retry: RetryConfig,
    /// Skip TLS certificate verification (self-signed gateways)
    pub accept_invalid_certs: bool,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            secret: secret.into(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::gateway_call(),
            accept_invalid_certs: false,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

#[derive(Debug, Serialize)]
struct GatewayRequest<'a> {
    text: &'a str,
    source_language: String,
    target_language: String,
    secret: &'a str,
}

pub struct GatewayClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl GatewayClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http, config })
    }

    /// Send one request and return the gateway's envelope.
    ///
    /// Transport failures and non-200 responses are retried per the client's
    /// retry policy; any envelope, whatever its code, is returned as is.
    pub async fn request(&self, text: &str, source: &str, target: &str) -> Result<EnvelopeReply> {
        let body = GatewayRequest {
            text,
            source_language: language_prefix(source),
            target_language: language_prefix(target),
            secret: &self.config.secret,
        };

        with_retry_if(
            &self.config.retry,
            "Gateway translation",
            || async {
                let response = self
                    .http
                    .post(&self.config.url)
                    .json(&body)
                    .send()
                    .await
                    .context("Failed to send request to translation gateway")?;

                let status = response.status();
                if status != reqwest::StatusCode::OK {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
                    anyhow::bail!("Gateway returned HTTP {}: {}", status, body);
                }

                response
                    .json::<EnvelopeReply>()
                    .await
                    .context("Failed to parse gateway response")
            },
            |_: &anyhow::Error| true,
        )
        .await
    }

    /// Translate one segment.
    ///
    /// Returns `Some("")` for blank input without calling the gateway, the
    /// translation on success, and `None` when the gateway refused, the model
    /// failed, or every retry was exhausted.
    pub async fn translate_segment(&self, text: &str, source: &str, target: &str) -> Option<String> {
        if text.trim().is_empty() {
            debug!("Skipping blank segment");
            return Some(String::new());
        }

        match self.request(text, source, target).await {
            Ok(reply) if reply.is_ok() => {
                let translated = reply.text.unwrap_or_default();
                debug!("Translated segment ({} bytes)", translated.len());
                Some(translated)
            }
            Ok(reply) => {
                warn!(
                    "Translation failed with code {}: {}",
                    reply.code, reply.msg
                );
                None
            }
            Err(e) => {
                warn!("Giving up on segment after retries: {:#}", e);
                None
            }
        }
    }
}
