//! HTTP-oriented assertion vocabulary.
//!
//! Every check returns `Err(AssertionError)` on failure so a test body can use `?`.
//! A caller-supplied message replaces the default text.

use serde_json::Value;
use thiserror::Error;

use crate::http::ResponseResult;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AssertionError {
    pub message: String,
}

impl AssertionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type Check = std::result::Result<(), AssertionError>;

fn fail(custom: Option<&str>, default: impl FnOnce() -> String) -> Check {
    Err(AssertionError::new(match custom {
        Some(m) => m.to_string(),
        None => default(),
    }))
}

fn fail_with_status(custom: Option<&str>, default: &str, status: u16) -> Check {
    Err(AssertionError::new(format!(
        "{} (got {status})",
        custom.unwrap_or(default)
    )))
}

// ---------------------------------------------------------------- basic

pub fn ok(value: bool, message: Option<&str>) -> Check {
    if value {
        Ok(())
    } else {
        fail(message, || "Expected value to be truthy".into())
    }
}

pub fn equal<T>(actual: T, expected: T, message: Option<&str>) -> Check
where
    T: PartialEq + std::fmt::Debug,
{
    if actual == expected {
        Ok(())
    } else {
        fail(message, || format!("Expected {expected:?}, got {actual:?}"))
    }
}

pub fn not_equal<T>(actual: T, expected: T, message: Option<&str>) -> Check
where
    T: PartialEq + std::fmt::Debug,
{
    if actual != expected {
        Ok(())
    } else {
        fail(message, || "Expected values to be different".into())
    }
}

/// Structural equality by serialized form; key order matters.
pub fn deep_equal<A, B>(actual: &A, expected: &B, message: Option<&str>) -> Check
where
    A: serde::Serialize + ?Sized,
    B: serde::Serialize + ?Sized,
{
    let a = serde_json::to_string(actual).ok();
    let b = serde_json::to_string(expected).ok();
    if a.is_some() && a == b {
        Ok(())
    } else {
        fail(message, || "Deep equality failed".into())
    }
}

// ---------------------------------------------------------------- http

pub fn http_ok(response: &ResponseResult, message: Option<&str>) -> Check {
    if response.ok() {
        return Ok(());
    }
    Err(AssertionError::new(format!(
        "{} (got {}: {})",
        message.unwrap_or("Expected HTTP 2xx response"),
        response.status(),
        response.detail()
    )))
}

pub fn http_status(response: &ResponseResult, expected: u16, message: Option<&str>) -> Check {
    if response.status() == expected {
        Ok(())
    } else {
        fail(message, || {
            format!("Expected HTTP {expected}, got {}", response.status())
        })
    }
}

/// Any non-2xx outcome, transport failures included.
pub fn http_error(response: &ResponseResult, message: Option<&str>) -> Check {
    if response.ok() {
        fail(message, || "Expected HTTP error response".into())
    } else {
        Ok(())
    }
}

/// Status must be one of `allowed`.
pub fn status_in(response: &ResponseResult, allowed: &[u16], message: Option<&str>) -> Check {
    if allowed.contains(&response.status()) {
        Ok(())
    } else {
        fail_with_status(
            message,
            &format!("Expected HTTP status in {allowed:?}"),
            response.status(),
        )
    }
}

pub fn http_4xx(response: &ResponseResult, message: Option<&str>) -> Check {
    if (400..500).contains(&response.status()) {
        Ok(())
    } else {
        fail_with_status(message, "Expected HTTP 4xx error", response.status())
    }
}

fn exact(response: &ResponseResult, code: u16, default: &str, message: Option<&str>) -> Check {
    if response.status() == code {
        Ok(())
    } else {
        fail_with_status(message, default, response.status())
    }
}

pub fn http_400(response: &ResponseResult, message: Option<&str>) -> Check {
    exact(response, 400, "Expected HTTP 400 Bad Request", message)
}

pub fn http_401(response: &ResponseResult, message: Option<&str>) -> Check {
    exact(response, 401, "Expected HTTP 401 Unauthorized", message)
}

pub fn http_403(response: &ResponseResult, message: Option<&str>) -> Check {
    exact(response, 403, "Expected HTTP 403 Forbidden", message)
}

pub fn http_404(response: &ResponseResult, message: Option<&str>) -> Check {
    exact(response, 404, "Expected HTTP 404 Not Found", message)
}

pub fn http_422(response: &ResponseResult, message: Option<&str>) -> Check {
    exact(response, 422, "Expected HTTP 422 Unprocessable Entity", message)
}

pub fn response_time(response: &ResponseResult, max_ms: u64, message: Option<&str>) -> Check {
    if response.duration_ms() <= max_ms {
        Ok(())
    } else {
        fail(message, || {
            format!(
                "Response time {}ms exceeded {max_ms}ms",
                response.duration_ms()
            )
        })
    }
}

// ---------------------------------------------------------------- data

pub fn has_property(value: &Value, prop: &str, message: Option<&str>) -> Check {
    let present = value.as_object().is_some_and(|o| o.contains_key(prop));
    if present {
        Ok(())
    } else {
        fail(message, || {
            format!("Expected object to have property '{prop}'")
        })
    }
}

pub fn has_properties(value: &Value, props: &[&str], message: Option<&str>) -> Check {
    props
        .iter()
        .try_for_each(|p| has_property(value, p, message))
}

pub fn is_array(value: &Value, message: Option<&str>) -> Check {
    ok(value.is_array(), Some(message.unwrap_or("Expected value to be an array")))
}

pub fn is_object(value: &Value, message: Option<&str>) -> Check {
    ok(value.is_object(), Some(message.unwrap_or("Expected value to be an object")))
}

pub fn is_string(value: &Value, message: Option<&str>) -> Check {
    ok(value.is_string(), Some(message.unwrap_or("Expected value to be a string")))
}

pub fn is_number(value: &Value, message: Option<&str>) -> Check {
    ok(value.is_number(), Some(message.unwrap_or("Expected value to be a number")))
}

/// `body.detail` must be an array holding an entry whose `field` or `loc` names `field`.
pub fn has_validation_error(response: &ResponseResult, field: &str, message: Option<&str>) -> Check {
    let Some(detail) = response.json().get("detail").and_then(Value::as_array) else {
        return fail(message, || {
            format!(
                "Expected validation error array, got: {}",
                response.body().render()
            )
        });
    };

    let mentions = |v: Option<&Value>| match v {
        Some(Value::String(s)) => s.contains(field),
        Some(Value::Array(items)) => items.iter().any(|i| i.as_str() == Some(field)),
        _ => false,
    };

    if detail
        .iter()
        .any(|e| mentions(e.get("field")) || mentions(e.get("loc")))
    {
        Ok(())
    } else {
        fail(message, || {
            format!("Expected validation error for field '{field}'")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Body, FailureKind};
    use indexmap::IndexMap;
    use serde_json::json;
    use std::time::Duration;

    fn resp(status: u16, body: Value) -> ResponseResult {
        ResponseResult::success(status, Body::Json(body), IndexMap::new(), Duration::from_millis(10))
    }

    fn transport_failure() -> ResponseResult {
        ResponseResult::failure(FailureKind::Network, "connection refused", Duration::ZERO)
    }

    #[test]
    fn test_http_ok_iff_ok_flag() {
        assert!(http_ok(&resp(200, json!({})), None).is_ok());
        let err = http_ok(&resp(422, json!({"detail": "bad input"})), Some("Should succeed")).unwrap_err();
        assert_eq!(err.message, "Should succeed (got 422: bad input)");
        let err = http_ok(&transport_failure(), None).unwrap_err();
        assert_eq!(err.message, "Expected HTTP 2xx response (got 0: connection refused)");
    }

    #[test]
    fn test_http_error_iff_not_ok() {
        assert!(http_error(&resp(422, json!({})), None).is_ok());
        assert!(http_error(&transport_failure(), None).is_ok());
        let err = http_error(&resp(200, json!({})), Some("Empty input should be rejected")).unwrap_err();
        assert_eq!(err.message, "Empty input should be rejected");
    }

    #[test]
    fn test_http_404_is_exact() {
        assert!(http_404(&resp(404, json!({})), None).is_ok());
        for s in [400, 403, 410, 500] {
            let err = http_404(&resp(s, json!({})), None).unwrap_err();
            assert_eq!(err.message, format!("Expected HTTP 404 Not Found (got {s})"));
        }
    }

    #[test]
    fn test_http_4xx_range() {
        assert!(http_4xx(&resp(400, json!({})), None).is_ok());
        assert!(http_4xx(&resp(499, json!({})), None).is_ok());
        assert!(http_4xx(&resp(500, json!({})), None).is_err());
        assert!(http_4xx(&transport_failure(), None).is_err());
    }

    #[test]
    fn test_specific_codes_and_status() {
        assert!(http_400(&resp(400, json!({})), None).is_ok());
        assert!(http_401(&resp(401, json!({})), None).is_ok());
        assert!(http_403(&resp(403, json!({})), None).is_ok());
        assert!(http_422(&resp(422, json!({})), None).is_ok());
        assert!(http_401(&resp(403, json!({})), None).is_err());
        assert_eq!(
            http_status(&resp(201, json!({})), 200, None).unwrap_err().message,
            "Expected HTTP 200, got 201"
        );
        assert!(status_in(&resp(404, json!({})), &[200, 404], None).is_ok());
        assert!(status_in(&resp(500, json!({})), &[200, 404], None).is_err());
    }

    #[test]
    fn test_basic_checks() {
        assert!(ok(true, None).is_ok());
        assert_eq!(ok(false, None).unwrap_err().message, "Expected value to be truthy");
        assert_eq!(equal(1, 2, None).unwrap_err().message, "Expected 2, got 1");
        assert!(not_equal("a", "b", None).is_ok());
        assert!(deep_equal(&json!({"a": [1, 2]}), &json!({"a": [1, 2]}), None).is_ok());
        assert!(deep_equal(&json!([1, 2]), &json!([2, 1]), None).is_err());
    }

    #[test]
    fn test_property_and_type_checks() {
        let v = json!({"status": "ok", "items": [], "n": 1});
        assert!(has_property(&v, "status", None).is_ok());
        assert!(has_properties(&v, &["status", "items"], None).is_ok());
        assert_eq!(
            has_properties(&v, &["status", "missing"], None).unwrap_err().message,
            "Expected object to have property 'missing'"
        );
        assert!(has_property(&Value::Null, "status", None).is_err());
        assert!(is_array(&v["items"], None).is_ok());
        assert!(is_object(&v, None).is_ok());
        assert!(is_object(&v["items"], None).is_err());
        assert!(is_string(&v["status"], None).is_ok());
        assert!(is_number(&v["n"], None).is_ok());
        assert_eq!(is_number(&v["status"], Some("n please")).unwrap_err().message, "n please");
    }

    #[test]
    fn test_response_time_ceiling() {
        let r = resp(200, json!({}));
        assert!(response_time(&r, 10, None).is_ok());
        assert_eq!(
            response_time(&r, 5, None).unwrap_err().message,
            "Response time 10ms exceeded 5ms"
        );
    }

    #[test]
    fn test_validation_error_by_field_or_loc() {
        let r = resp(422, json!({"detail": [{"loc": ["body", "segment_count"], "msg": "must be > 0"}]}));
        assert!(has_validation_error(&r, "segment_count", None).is_ok());
        assert!(has_validation_error(&r, "user_input", None).is_err());

        let r = resp(400, json!({"detail": [{"field": "body.user_input"}]}));
        assert!(has_validation_error(&r, "user_input", None).is_ok());

        let r = resp(400, json!({"detail": "plain string"}));
        let err = has_validation_error(&r, "x", None).unwrap_err();
        assert!(err.message.starts_with("Expected validation error array"));
    }
}
