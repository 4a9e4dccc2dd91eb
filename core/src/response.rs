//! Response classification.
//!
//! `classify` turns any `HttpResponse` into either a `ResponseBody` (2xx)
//! or a classified `ApiError`. `ResponseBody::decode` then maps the body
//! onto the caller's type.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ErrorBody};
use crate::http::HttpResponse;

/// The body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Decode into `T`. Text is offered to `T` as a JSON string, so
    /// `String` and `Value` receive it verbatim; an empty text body also
    /// decodes into `()` or `Option<_>`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            ResponseBody::Json(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::unknown(format!("failed to decode response body: {e}"))),
            ResponseBody::Text(text) => {
                let empty = text.is_empty();
                match serde_json::from_value(Value::String(text)) {
                    Ok(decoded) => Ok(decoded),
                    Err(_) if empty => serde_json::from_value(Value::Null)
                        .map_err(|e| ApiError::unknown(format!("failed to decode empty response: {e}"))),
                    Err(e) => Err(ApiError::unknown(format!("failed to decode text response: {e}"))),
                }
            }
        }
    }
}

pub fn classify(response: HttpResponse) -> Result<ResponseBody, ApiError> {
    let is_json = response.is_json();
    let status = response.status;

    if response.is_success() {
        if !is_json {
            return Ok(ResponseBody::Text(response.body));
        }
        return serde_json::from_str(&response.body)
            .map(ResponseBody::Json)
            .map_err(|e| ApiError::unknown(format!("invalid JSON in response body: {e}")).with_status(status));
    }

    Err(classify_failure(status, is_json, response.body))
}

fn classify_failure(status: u16, is_json: bool, body: String) -> ApiError {
    if is_json {
        if let Ok(value) = serde_json::from_str::<Value>(&body) {
            // A derived struct also accepts a sequence, so only objects qualify.
            let parsed = match value {
                Value::Object(_) => serde_json::from_value::<ErrorBody>(value).ok(),
                _ => None,
            };
            return match parsed {
                Some(parsed) => ApiError::http(
                    status,
                    parsed.code.unwrap_or_else(|| ApiError::http_code(status)),
                    parsed.message.unwrap_or_else(|| ApiError::fallback_message(status)),
                    parsed.details,
                ),
                // Parsed, but not an error body we understand.
                None => ApiError::unknown(ApiError::fallback_message(status)).with_status(status),
            };
        }
    }

    let message = if body.is_empty() {
        ApiError::fallback_message(status)
    } else {
        body
    };
    ApiError::http(status, ApiError::http_code(status), message, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UNKNOWN_ERROR;
    use serde_json::json;

    #[test]
    fn json_success_is_parsed() {
        let body = classify(HttpResponse::json(200, r#"{"a":[1,2]}"#)).unwrap();
        assert_eq!(body, ResponseBody::Json(json!({"a": [1, 2]})));
    }

    #[test]
    fn text_success_is_verbatim() {
        let body = classify(HttpResponse::new(200, "  plain\n")).unwrap();
        assert_eq!(body.decode::<String>().unwrap(), "  plain\n");
    }

    #[test]
    fn empty_success_decodes_into_unit() {
        let body = classify(HttpResponse::new(204, "")).unwrap();
        body.decode::<()>().unwrap();
        let body = classify(HttpResponse::new(204, "")).unwrap();
        assert_eq!(body.decode::<Option<u32>>().unwrap(), None);
    }

    #[test]
    fn empty_json_success_is_unknown() {
        for body in ["", "  \n"] {
            let err = classify(HttpResponse::json(201, body)).unwrap_err();
            assert_eq!(err.code(), UNKNOWN_ERROR);
            assert_eq!(err.status(), Some(201));
        }
    }

    #[test]
    fn malformed_json_success_is_unknown() {
        let err = classify(HttpResponse::json(200, "{oops")).unwrap_err();
        assert_eq!(err.code(), UNKNOWN_ERROR);
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn json_error_fields_pass_through() {
        let resp = HttpResponse::json(
            409,
            r#"{"code":"DUPLICATE","message":"already applied","details":{"form":7}}"#,
        );
        let err = classify(resp).unwrap_err();
        assert_eq!(err.code(), "DUPLICATE");
        assert_eq!(err.message(), "already applied");
        assert_eq!(err.details(), Some(&json!({"form": 7})));
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn json_error_defaults() {
        let err = classify(HttpResponse::json(400, "{}")).unwrap_err();
        assert_eq!(err.code(), "HTTP_400");
        assert_eq!(err.message(), "Request failed with status 400");
        assert!(err.details().is_none());
    }

    #[test]
    fn schema_mismatch_is_unknown() {
        let err = classify(HttpResponse::json(400, r#"{"code":400}"#)).unwrap_err();
        assert_eq!(err.code(), UNKNOWN_ERROR);
        assert_eq!(err.message(), "Request failed with status 400");
        assert_eq!(err.status(), Some(400));
        let err = classify(HttpResponse::json(502, r#"["a"]"#)).unwrap_err();
        assert_eq!(err.code(), UNKNOWN_ERROR);
        assert_eq!(err.message(), "Request failed with status 502");
        assert!(err.details().is_none());
    }

    #[test]
    fn explicit_null_details_are_kept() {
        let err = classify(HttpResponse::json(400, r#"{"code":"BAD","details":null}"#)).unwrap_err();
        assert_eq!(err.details(), Some(&Value::Null));
        let err = classify(HttpResponse::json(400, r#"{"code":"BAD"}"#)).unwrap_err();
        assert_eq!(err.details(), None);
    }

    #[test]
    fn text_error_uses_body_or_fallback() {
        let err = classify(HttpResponse::new(500, "internal error")).unwrap_err();
        assert_eq!((err.code(), err.message()), ("HTTP_500", "internal error"));
        let err = classify(HttpResponse::new(503, "")).unwrap_err();
        assert_eq!(err.message(), "Request failed with status 503");
        let err = classify(HttpResponse::new(500, "   ")).unwrap_err();
        assert_eq!(err.message(), "   ");
        // Claims JSON but isn't.
        let err = classify(HttpResponse::json(502, "<html>bad gateway</html>")).unwrap_err();
        assert_eq!((err.code(), err.message()), ("HTTP_502", "<html>bad gateway</html>"));
    }
}
