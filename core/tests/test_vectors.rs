//! Check request building and response classification against JSON vectors
//! stored in `tests/vectors/`.
//!
//! Bodies are compared as parsed JSON, not raw strings, so key order in the
//! vector files does not matter.

use formwire_core::{ApiClient, ApiError, HttpResponse, Outcome, RequestData, RuleRegistry};
use serde_json::{json, Value};

fn client(vectors: &Value) -> ApiClient {
    let rules = RuleRegistry::site_defaults()
        .with_json(&json!({ "rules": vectors["rules"] }).to_string())
        .unwrap();
    ApiClient::new(vectors["base_url"].as_str().unwrap(), rules)
}

fn error_name(err: &ApiError) -> &'static str {
    match err {
        ApiError::UnknownRule(_) => "UnknownRule",
        ApiError::UnknownMethod(_) => "UnknownMethod",
        ApiError::MissingPathParam(_) => "MissingPathParam",
        ApiError::TemplateArity { .. } => "TemplateArity",
        ApiError::Serialization(_) => "Serialization",
        ApiError::Deserialization(_) => "Deserialization",
        ApiError::Transport(_) => "Transport",
        ApiError::Selector(_) => "Selector",
        ApiError::Config(_) => "Config",
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_vectors() {
    let raw = include_str!("vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let c = client(&vectors);

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let rule = case["rule"].as_str().unwrap();
        let data = RequestData::from(case["data"].clone());
        let expected = &case["expected_request"];

        let req = c.build_request(rule, &data).unwrap();
        assert_eq!(req.method.as_str(), expected["method"], "{name}: method");
        assert_eq!(req.path, expected["path"], "{name}: path");
        assert_eq!(req.header("content-type"), Some("application/json"), "{name}: content-type");

        let body: Value = match &req.body {
            Some(body) => serde_json::from_str(body).unwrap(),
            None => Value::Null,
        };
        assert_eq!(body, expected["body"], "{name}: body");
    }
}

#[test]
fn request_error_vectors() {
    let raw = include_str!("vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let c = client(&vectors);

    for case in vectors["errors"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let rule = case["rule"].as_str().unwrap();
        let data = RequestData::from(case["data"].clone());

        let err = c.build_request(rule, &data).unwrap_err();
        assert_eq!(error_name(&err), case["expected_error"], "{name}");
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_vectors() {
    let raw = include_str!("vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let c = ApiClient::new("", RuleRegistry::site_defaults());

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let status = case["response"]["status"].as_u64().unwrap() as u16;
        let body = case["response"]["body"].as_str().unwrap();
        let expected = &case["expected"];

        let result = c.parse_response("pulse.get", HttpResponse::new(status, body));
        match expected["kind"].as_str().unwrap() {
            "success" => {
                let outcome = result.unwrap();
                assert_eq!(outcome.is_failure(), expected["is_failure"], "{name}: is_failure");
                let Outcome::Success(value) = outcome else {
                    panic!("{name}: expected success, got {outcome:?}");
                };
                assert_eq!(value, expected["value"], "{name}: value");
            }
            "failure" => {
                let outcome = result.unwrap();
                assert_eq!(outcome.is_failure(), expected["is_failure"], "{name}: is_failure");
                let Outcome::Failure(raw) = outcome else {
                    panic!("{name}: expected failure, got {outcome:?}");
                };
                assert_eq!(raw.status as u64, expected["status"].as_u64().unwrap(), "{name}: status");
                assert_eq!(raw.body, expected["body"], "{name}: body");
            }
            "unauthenticated" => {
                assert!(matches!(result, Ok(Outcome::Unauthenticated)), "{name}");
            }
            "error" => {
                let err = result.unwrap_err();
                assert_eq!(error_name(&err), expected["error"], "{name}");
            }
            other => panic!("{name}: unknown kind {other}"),
        }
    }
}
