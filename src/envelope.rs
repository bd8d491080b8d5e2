//! The JSON result envelope returned for every POST outcome.
//!
//! Every envelope carries `code`, `msg` and `text`. The unauthorized envelope
//! additionally carries `source_language`, `target_language` and `secret`, all
//! null, so callers can tell the request fields were discarded.

use serde::{Deserialize, Serialize, Serializer};

/// Result codes understood by gateway clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Ok = 0,
    Unauthorized = 1,
    TranslationError = 2,
    InternalError = 3,
}

impl ResultCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Status string sent alongside the code
    pub fn message(self) -> &'static str {
        match self {
            ResultCode::Ok => "ok",
            ResultCode::Unauthorized => "unauthorized",
            ResultCode::TranslationError => "translation error",
            ResultCode::InternalError => "internal error",
        }
    }
}

impl Serialize for ResultCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

/// Request fields echoed back as null on the unauthorized path
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RedactedFields {
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationResult {
    pub code: ResultCode,
    pub msg: &'static str,
    pub text: Option<String>,
    #[serde(flatten)]
    pub redacted: Option<RedactedFields>,
}

impl TranslationResult {
    fn new(code: ResultCode, text: Option<String>) -> Self {
        Self {
            code,
            msg: code.message(),
            text,
            redacted: None,
        }
    }

    pub fn ok(text: impl Into<String>) -> Self {
        Self::new(ResultCode::Ok, Some(text.into()))
    }

    pub fn unauthorized() -> Self {
        Self {
            redacted: Some(RedactedFields::default()),
            ..Self::new(ResultCode::Unauthorized, None)
        }
    }

    pub fn translation_error(raw: impl Into<String>) -> Self {
        Self::new(ResultCode::TranslationError, Some(raw.into()))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ResultCode::InternalError, Some(message.into()))
    }
}

/// Client-side view of an envelope.
///
/// Only the fields every envelope carries are read; the null echo fields of
/// the unauthorized envelope are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnvelopeReply {
    pub code: u8,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl EnvelopeReply {
    pub fn is_ok(&self) -> bool {
        self.code == ResultCode::Ok.as_u8()
    }
}
