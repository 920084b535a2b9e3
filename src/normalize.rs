//! Provider response normalization.
//!
//! The provider answers business errors inside HTTP 200 bodies of the form
//! `{"code": "...", "message"|"msg": "...", "data": ...}`. Everything is
//! parsed here once; callers only ever see [`Lookup`] or a [`ProviderError`].

use crate::error::ProviderError;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Status code of a successful lookup.
pub const SUCCESS_CODE: &str = "Success";

/// Codes for which the provider still answers and the body is forwarded.
pub const SOFT_CODES: &[&str] = &["KeyExpired"];

/// A successful (possibly degraded) lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    /// `data` for a clean success, the whole body for a soft code.
    pub payload: Value,
    /// Set when the provider answered with a soft code.
    pub caveat: Option<String>,
}

impl Lookup {
    pub fn is_degraded(&self) -> bool {
        self.caveat.is_some()
    }

    /// Payload as pretty-printed JSON.
    pub fn to_text(&self) -> String {
        serde_json::to_string_pretty(&self.payload).unwrap_or_else(|_| self.payload.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl Envelope {
    fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.msg.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// Classify a raw provider body.
pub fn normalize(raw: &str) -> Result<Lookup, ProviderError> {
    let body: Value = serde_json::from_str(raw)
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

    if !body.is_object() {
        return Err(ProviderError::MissingCode(
            "response is not a JSON object".to_string(),
        ));
    }

    let envelope = Envelope::deserialize(&body)
        .map_err(|e| ProviderError::MissingCode(e.to_string()))?;

    let code = match &envelope.code {
        Some(Value::String(code)) => code.clone(),
        Some(Value::Number(code)) => code.to_string(),
        _ => {
            return Err(ProviderError::MissingCode(
                envelope
                    .message()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "response has no code field".to_string()),
            ))
        }
    };

    if code == SUCCESS_CODE {
        return Ok(Lookup {
            payload: envelope.data.unwrap_or(Value::Null),
            caveat: None,
        });
    }

    if SOFT_CODES.contains(&code.as_str()) {
        let caveat = match envelope.message() {
            Some(message) => format!("provider reported {}: {}", code, message),
            None => format!("provider reported {}", code),
        };
        warn!(code = %code, "Provider answered with a soft error code, forwarding body");
        return Ok(Lookup {
            payload: body,
            caveat: Some(caveat),
        });
    }

    let message = envelope
        .message()
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("unknown error (code {})", code));

    Err(ProviderError::Rejected { code, message })
}

/// Extract the caller's own address from the self-IP service body.
pub fn self_ip(raw: &str) -> Result<String, ProviderError> {
    let body: Value = serde_json::from_str(raw)
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

    body.get("data")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .ok_or(ProviderError::MissingAddress)
}
