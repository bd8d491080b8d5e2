//! The translation gateway handler.
//!
//! One request runs straight through: method check, body read and parse,
//! secret check, field validation, one call to the translator, result mapping.
//! Every POST outcome is an envelope with status 200; only a non-POST method
//! gets the plain-text 405, and it is decided before the body is read.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::envelope::TranslationResult;
use crate::error::GatewayError;
use crate::security::secret_matches;
use crate::translation::{NormalizedInputs, TranslationOutcome, Translator};

/// Largest request body read before the request fails with an envelope
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared, read-only context for every request
#[derive(Clone)]
pub struct GatewayState {
    access_key: Arc<str>,
    translator: Arc<dyn Translator>,
}

impl GatewayState {
    pub fn new(access_key: impl Into<String>, translator: Arc<dyn Translator>) -> Self {
        Self {
            access_key: Arc::from(access_key.into()),
            translator,
        }
    }
}

/// Translation fields of a request body, read only once the secret matched.
///
/// Every field is optional at parse time so that a missing language is a
/// validation failure rather than a parse error.
#[derive(Debug, Default, Deserialize)]
pub struct TranslationRequest {
    pub text: Option<String>,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
}

impl TranslationRequest {
    /// Check required fields and derive the translator input
    pub fn normalize(self) -> Result<NormalizedInputs, GatewayError> {
        let text = self.text.ok_or(GatewayError::MissingField("text"))?;
        let source = require_language("source_language", self.source_language)?;
        let target = require_language("target_language", self.target_language)?;

        Ok(NormalizedInputs::new(text, &source, &target))
    }
}

fn require_language(field: &'static str, value: Option<String>) -> Result<String, GatewayError> {
    let value = value.ok_or(GatewayError::MissingField(field))?;
    if value.chars().count() < 2 {
        return Err(GatewayError::LanguageTooShort { field, value });
    }
    Ok(value)
}

/// Run one request through the gateway
pub async fn handle(
    state: &GatewayState,
    method: &Method,
    body: Body,
) -> Result<TranslationResult, GatewayError> {
    if *method != Method::POST {
        return Err(GatewayError::MethodNotAllowed);
    }

    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(GatewayError::BodyRead)?;
    let value: Value = serde_json::from_slice(&bytes)?;

    // A secret that is absent or not a string never matches
    let secret = value.get("secret").and_then(Value::as_str);
    if !secret_matches(secret, &state.access_key) {
        return Err(GatewayError::Unauthorized);
    }

    let request: TranslationRequest = serde_json::from_value(value)?;
    let inputs = request.normalize()?;

    match state.translator.translate(&inputs).await? {
        TranslationOutcome::Translated(text) => Ok(TranslationResult::ok(text)),
        TranslationOutcome::Failed(raw) => Err(GatewayError::Translation(raw)),
    }
}

/// axum entry point; mounted as the router fallback so every path lands here
pub async fn handle_request(
    State(state): State<GatewayState>,
    method: Method,
    body: Body,
) -> Response {
    match handle(&state, &method, body).await {
        Ok(result) => {
            info!("Translation succeeded");
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(err) => {
            match &err {
                GatewayError::MethodNotAllowed => info!("Rejected {} request", method),
                GatewayError::Unauthorized => warn!("Rejected request with invalid secret"),
                GatewayError::Translation(_) => warn!("Model reported a translation error"),
                other => warn!("Request failed: {}", other),
            }
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ResultCode;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Translator that records its inputs and answers from a fixed script
    struct ScriptedTranslator {
        reply: Result<String, String>,
        calls: Mutex<Vec<NormalizedInputs>>,
    }

    impl ScriptedTranslator {
        fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<NormalizedInputs> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Translator for ScriptedTranslator {
        async fn translate(&self, inputs: &NormalizedInputs) -> anyhow::Result<TranslationOutcome> {
            self.calls.lock().unwrap().push(inputs.clone());
            match &self.reply {
                Ok(text) => Ok(TranslationOutcome::from_model_text(text.clone())),
                Err(message) => Err(anyhow::anyhow!("{}", message)),
            }
        }
    }

    fn state_with(translator: Arc<ScriptedTranslator>) -> GatewayState {
        GatewayState::new("123456", translator)
    }

    fn body(value: serde_json::Value) -> Body {
        Body::from(serde_json::to_vec(&value).unwrap())
    }

    fn hello_request(secret: &str) -> Body {
        body(serde_json::json!({
            "text": "Hello",
            "source_language": "english",
            "target_language": "chinese",
            "secret": secret
        }))
    }

    // ==================== Method Tests ====================

    #[tokio::test]
    async fn test_non_post_methods_rejected_before_body() {
        let translator = ScriptedTranslator::answering("你好");
        let state = state_with(translator.clone());

        for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH, Method::OPTIONS] {
            let result = handle(&state, &method, Body::from("not even json")).await;
            assert!(matches!(result, Err(GatewayError::MethodNotAllowed)));
        }
        assert!(translator.calls().is_empty());
    }

    // ==================== Authorization Tests ====================

    #[tokio::test]
    async fn test_wrong_secret_is_unauthorized() {
        let translator = ScriptedTranslator::answering("你好");
        let state = state_with(translator.clone());

        let result = handle(&state, &Method::POST, hello_request("wrong")).await;

        let envelope = result.unwrap_err().envelope().unwrap();
        assert_eq!(envelope, TranslationResult::unauthorized());
        assert!(translator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_secret_is_unauthorized() {
        let state = state_with(ScriptedTranslator::answering("你好"));
        let request = body(serde_json::json!({
            "text": "Hello",
            "source_language": "en",
            "target_language": "zh"
        }));

        let result = handle(&state, &Method::POST, request).await;
        assert!(matches!(result, Err(GatewayError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_secret_checked_before_field_validation() {
        let state = state_with(ScriptedTranslator::answering("你好"));
        let request = body(serde_json::json!({"secret": "wrong"}));

        let result = handle(&state, &Method::POST, request).await;
        assert!(matches!(result, Err(GatewayError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_mistyped_fields_with_wrong_secret_are_unauthorized() {
        let translator = ScriptedTranslator::answering("你好");
        let state = state_with(translator.clone());

        for request in [
            serde_json::json!({
                "text": 42,
                "source_language": "en",
                "target_language": "zh",
                "secret": "wrong"
            }),
            serde_json::json!({
                "text": ["a"],
                "source_language": "en",
                "target_language": "zh",
                "secret": "wrong"
            }),
            serde_json::json!({
                "text": "Hello",
                "source_language": "en",
                "target_language": "zh",
                "secret": 123456
            }),
        ] {
            let result = handle(&state, &Method::POST, body(request)).await;
            assert!(matches!(result, Err(GatewayError::Unauthorized)));
        }
        assert!(translator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_object_body_is_unauthorized() {
        let state = state_with(ScriptedTranslator::answering("你好"));

        let result = handle(&state, &Method::POST, Body::from("[\"123456\"]")).await;
        assert!(matches!(result, Err(GatewayError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_mistyped_field_with_valid_secret_is_internal_error() {
        let translator = ScriptedTranslator::answering("你好");
        let state = state_with(translator.clone());
        let request = body(serde_json::json!({
            "text": 42,
            "source_language": "en",
            "target_language": "zh",
            "secret": "123456"
        }));

        let result = handle(&state, &Method::POST, request).await;

        assert!(matches!(result, Err(GatewayError::InvalidBody(_))));
        assert!(translator.calls().is_empty());
    }

    // ==================== Body Size Tests ====================

    fn oversized_body() -> Body {
        Body::from(vec![b' '; MAX_BODY_BYTES + 1])
    }

    #[tokio::test]
    async fn test_oversized_get_is_still_method_not_allowed() {
        let state = state_with(ScriptedTranslator::answering("你好"));

        let response = handle_request(State(state), Method::GET, oversized_body()).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Only POST requests are allowed");
    }

    #[tokio::test]
    async fn test_oversized_post_is_internal_error_envelope() {
        let translator = ScriptedTranslator::answering("你好");
        let state = state_with(translator.clone());

        let response = handle_request(State(state), Method::POST, oversized_body()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope["code"], 3);
        assert!(envelope["text"]
            .as_str()
            .unwrap()
            .starts_with("failed to read request body"));
        assert!(translator.calls().is_empty());
    }

    // ==================== Success Path Tests ====================

    #[tokio::test]
    async fn test_hello_scenario() {
        let translator = ScriptedTranslator::answering("你好");
        let state = state_with(translator.clone());

        let result = handle(&state, &Method::POST, hello_request("123456"))
            .await
            .expect("Should succeed");

        assert_eq!(result, TranslationResult::ok("你好"));
        assert_eq!(
            translator.calls(),
            vec![NormalizedInputs {
                text: "Hello".to_string(),
                source_lang: "en".to_string(),
                target_lang: "ch".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_region_tagged_languages_truncated() {
        let translator = ScriptedTranslator::answering("Bonjour");
        let state = state_with(translator.clone());
        let request = body(serde_json::json!({
            "text": "Hello",
            "source_language": "en-US",
            "target_language": "fr-CA",
            "secret": "123456"
        }));

        handle(&state, &Method::POST, request).await.expect("Should succeed");

        let calls = translator.calls();
        assert_eq!(calls[0].source_lang, "en");
        assert_eq!(calls[0].target_lang, "fr");
    }

    #[tokio::test]
    async fn test_empty_text_is_forwarded() {
        let translator = ScriptedTranslator::answering("");
        let state = state_with(translator.clone());
        let request = body(serde_json::json!({
            "text": "",
            "source_language": "en",
            "target_language": "zh",
            "secret": "123456"
        }));

        let result = handle(&state, &Method::POST, request).await.expect("Should succeed");
        assert_eq!(result.code, ResultCode::Ok);
        assert_eq!(translator.calls().len(), 1);
    }

    // ==================== Failure Path Tests ====================

    #[tokio::test]
    async fn test_model_error_text_is_translation_error() {
        let state = state_with(ScriptedTranslator::answering("ERROR: unsupported language"));

        let result = handle(&state, &Method::POST, hello_request("123456")).await;

        let envelope = result.unwrap_err().envelope().unwrap();
        assert_eq!(
            envelope,
            TranslationResult::translation_error("ERROR: unsupported language")
        );
    }

    #[tokio::test]
    async fn test_translator_failure_is_internal_error() {
        let state = state_with(ScriptedTranslator::failing("network unreachable"));

        let result = handle(&state, &Method::POST, hello_request("123456")).await;

        let envelope = result.unwrap_err().envelope().unwrap();
        assert_eq!(envelope, TranslationResult::internal_error("network unreachable"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_internal_error() {
        let translator = ScriptedTranslator::answering("你好");
        let state = state_with(translator.clone());

        let result = handle(&state, &Method::POST, Body::from("{\"text\": ")).await;

        let envelope = result.unwrap_err().envelope().unwrap();
        assert_eq!(envelope.code, ResultCode::InternalError);
        assert!(translator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_text_is_internal_error() {
        let state = state_with(ScriptedTranslator::answering("你好"));
        let request = body(serde_json::json!({
            "source_language": "en",
            "target_language": "zh",
            "secret": "123456"
        }));

        let result = handle(&state, &Method::POST, request).await;
        assert!(matches!(result, Err(GatewayError::MissingField("text"))));
    }

    #[tokio::test]
    async fn test_short_language_is_internal_error() {
        let translator = ScriptedTranslator::answering("你好");
        let state = state_with(translator.clone());
        let request = body(serde_json::json!({
            "text": "Hello",
            "source_language": "e",
            "target_language": "zh",
            "secret": "123456"
        }));

        let result = handle(&state, &Method::POST, request).await;

        match result {
            Err(GatewayError::LanguageTooShort { field, value }) => {
                assert_eq!(field, "source_language");
                assert_eq!(value, "e");
            }
            other => panic!("Expected LanguageTooShort, got {:?}", other),
        }
        assert!(translator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_target_language_is_internal_error() {
        let state = state_with(ScriptedTranslator::answering("你好"));
        let request = body(serde_json::json!({
            "text": "Hello",
            "source_language": "en",
            "secret": "123456"
        }));

        let result = handle(&state, &Method::POST, request).await;
        assert!(matches!(
            result,
            Err(GatewayError::MissingField("target_language"))
        ));
    }

    // ==================== Normalization Tests ====================

    #[test]
    fn test_normalize_exactly_two_characters_pass_through() {
        let request = TranslationRequest {
            text: Some("Hi".to_string()),
            source_language: Some("en".to_string()),
            target_language: Some("日本".to_string()),
        };

        let inputs = request.normalize().expect("Should normalize");
        assert_eq!(inputs.source_lang, "en");
        assert_eq!(inputs.target_lang, "日本");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn forwarded_codes_are_two_character_prefixes(
                source in "\\PC{2,12}",
                target in "\\PC{2,12}",
            ) {
                let request = TranslationRequest {
                    text: Some("text".to_string()),
                    source_language: Some(source.clone()),
                    target_language: Some(target.clone()),
                };

                let inputs = request.normalize().unwrap();

                prop_assert_eq!(inputs.source_lang.chars().count(), 2);
                prop_assert_eq!(inputs.target_lang.chars().count(), 2);
                prop_assert!(source.starts_with(&inputs.source_lang));
                prop_assert!(target.starts_with(&inputs.target_lang));
            }

            #[test]
            fn shorter_than_two_characters_always_rejected(source in "\\PC{0,1}") {
                let request = TranslationRequest {
                    text: Some("text".to_string()),
                    source_language: Some(source),
                    target_language: Some("en".to_string()),
                };

                prop_assert!(request.normalize().is_err());
            }
        }
    }
}
