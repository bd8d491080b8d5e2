use anyhow::{bail, Context, Result};

pub const DEFAULT_WORKERS_AI_MODEL: &str = "@cf/meta/m2m100-1.2b";
pub const DEFAULT_WORKERS_AI_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

#[derive(Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Shared secret callers must present in the request body
    pub access_key: String,

    // Workers AI
    pub workers_ai_base_url: String,
    pub workers_ai_account_id: String,
    pub workers_ai_api_token: String,
    pub workers_ai_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let access_key = std::env::var("GATEWAY_SECRET").context("GATEWAY_SECRET not set")?;
        if access_key.is_empty() {
            bail!("GATEWAY_SECRET must not be empty");
        }

        let port = match std::env::var("PORT") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got '{}'", v))?,
            Err(_) => 8787,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,

            access_key,

            workers_ai_base_url: std::env::var("WORKERS_AI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_WORKERS_AI_BASE_URL.to_string()),
            workers_ai_account_id: std::env::var("WORKERS_AI_ACCOUNT_ID")
                .context("WORKERS_AI_ACCOUNT_ID not set")?,
            workers_ai_api_token: std::env::var("WORKERS_AI_API_TOKEN")
                .context("WORKERS_AI_API_TOKEN not set")?,
            workers_ai_model: std::env::var("WORKERS_AI_MODEL")
                .unwrap_or_else(|_| DEFAULT_WORKERS_AI_MODEL.to_string()),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Secrets stay out of logs even when the config is printed with {:?}
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("access_key", &"<redacted>")
            .field("workers_ai_base_url", &self.workers_ai_base_url)
            .field("workers_ai_account_id", &self.workers_ai_account_id)
            .field("workers_ai_api_token", &"<redacted>")
            .field("workers_ai_model", &self.workers_ai_model)
            .finish()
    }
}
