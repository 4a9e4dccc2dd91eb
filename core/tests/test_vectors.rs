//! Verify response classification against the JSON test vectors stored in
//! `test-vectors/`.
//!
//! Each case describes a simulated response and either the decoded result or
//! the expected error. Comparing parsed JSON (not raw strings) avoids false
//! negatives from field-ordering differences.

use portal_gateway::response::classify;
use portal_gateway::{ApiError, HttpResponse};
use serde_json::Value;

fn simulated_response(case: &Value) -> HttpResponse {
    let mut response = HttpResponse::new(
        case["status"].as_u64().unwrap() as u16,
        case["body"].as_str().unwrap(),
    );
    if let Some(content_type) = case["content_type"].as_str() {
        response = response.with_header("Content-Type", content_type);
    }
    response
}

#[test]
fn classify_test_vectors() {
    let raw = include_str!("../../test-vectors/classify.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let result = classify(simulated_response(case)).and_then(|body| body.decode::<Value>());

        if let Some(expected) = case.get("expected_error") {
            let err = result.expect_err(name);
            assert_eq!(err.code(), expected["code"].as_str().unwrap(), "{name}: code");
            if let Some(message) = expected.get("message") {
                assert_eq!(err.message(), message.as_str().unwrap(), "{name}: message");
            }
            assert_eq!(err.details(), expected.get("details"), "{name}: details");
            assert_eq!(
                err.status(),
                expected["status"].as_u64().map(|s| s as u16),
                "{name}: status"
            );
        } else {
            let value = result.unwrap_or_else(|e: ApiError| panic!("{name}: unexpected error {e}"));
            assert_eq!(value, case["expected_result"], "{name}: decoded result");
        }
    }
}
