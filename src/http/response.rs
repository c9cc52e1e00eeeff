use std::time::Duration;

use indexmap::IndexMap;
use serde_json::Value;

static NULL: Value = Value::Null;
static EMPTY: Body = Body::Empty;

/// Parsed response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
    Empty,
}

impl Body {
    /// JSON content types are parsed, falling back to raw text when the payload is not valid JSON.
    pub fn negotiate(content_type: Option<&str>, bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Body::Empty;
        }
        let is_json = content_type
            .map(|ct| ct.contains("application/json") || ct.contains("+json"))
            .unwrap_or(false);
        if is_json {
            if let Ok(v) = serde_json::from_slice::<Value>(bytes) {
                return Body::Json(v);
            }
        }
        Body::Text(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Compact rendering used in failure messages.
    pub fn render(&self) -> String {
        match self {
            Body::Json(v) => v.to_string(),
            Body::Text(s) => s.clone(),
            Body::Empty => "null".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Network,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success {
        status: u16,
        body: Body,
        headers: IndexMap<String, String>,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

/// Normalized result of exactly one HTTP call. Transport failures are data, not errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseResult {
    outcome: Outcome,
    duration_ms: u64,
}

impl ResponseResult {
    pub fn success(
        status: u16,
        body: Body,
        headers: IndexMap<String, String>,
        duration: Duration,
    ) -> Self {
        Self {
            outcome: Outcome::Success {
                status,
                body,
                headers,
            },
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            outcome: Outcome::Failure {
                kind,
                message: message.into(),
            },
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// True only for a received 2xx response.
    pub fn ok(&self) -> bool {
        matches!(self.outcome, Outcome::Success { status, .. } if (200..300).contains(&status))
    }

    /// HTTP status, or 0 when no response was received.
    pub fn status(&self) -> u16 {
        match &self.outcome {
            Outcome::Success { status, .. } => *status,
            Outcome::Failure { .. } => 0,
        }
    }

    pub fn body(&self) -> &Body {
        match &self.outcome {
            Outcome::Success { body, .. } => body,
            Outcome::Failure { .. } => &EMPTY,
        }
    }

    /// The JSON body, or `null` for text, empty, and failed responses.
    pub fn json(&self) -> &Value {
        self.body().as_json().unwrap_or(&NULL)
    }

    pub fn headers(&self) -> Option<&IndexMap<String, String>> {
        match &self.outcome {
            Outcome::Success { headers, .. } => Some(headers),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failure { message, .. } => Some(message),
            Outcome::Success { .. } => None,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(
            self.outcome,
            Outcome::Failure {
                kind: FailureKind::Timeout,
                ..
            }
        )
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Best human-readable explanation of a non-2xx result.
    pub fn detail(&self) -> String {
        match &self.outcome {
            Outcome::Failure { message, .. } => message.clone(),
            Outcome::Success { body, .. } => {
                let v = body.as_json();
                let field = v
                    .and_then(|v| v.get("detail").or_else(|| v.get("message")))
                    .filter(|d| !d.is_null());
                match field {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => body.render(),
                }
            }
        }
    }
}
