//! Request building, response classification and rule dispatch.
//!
//! # Design
//! `Endpoint` binds a method to a URL template and is reused for every call
//! to that endpoint. Each call is split into `build` (produces an
//! `HttpRequest`) and `parse` (classifies an `HttpResponse`), so the I/O
//! boundary stays explicit. `ApiClient` adds the rule registry and a
//! `request` helper that runs the round-trip through an injected
//! `Transport` and reports 401s to an injected `Navigator`.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::case::{convert_map, to_camel_keys, KeyCase};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{Credentials, HttpMethod, HttpRequest, HttpResponse, Navigator, Transport};
use crate::rules::RuleRegistry;
use crate::types::{Outcome, RequestData, QUERY_KEY};
use crate::url::format_url;

const JSON: &str = "application/json";

/// A method and URL template pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    method: HttpMethod,
    template: String,
}

impl Endpoint {
    pub fn new(method: HttpMethod, template: impl Into<String>) -> Self {
        Self {
            method,
            template: template.into(),
        }
    }

    /// Parse the method name case-insensitively.
    pub fn parse_method(method: &str, template: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self::new(method.parse()?, template))
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Build the request for one call. `base_url` has no trailing slash; an
    /// empty base yields a root-relative path.
    pub fn build(&self, base_url: &str, data: &RequestData) -> Result<HttpRequest, ApiError> {
        let url = format_url(self.method, &self.template, data)?;

        let body = match data {
            RequestData::Fields(fields) if !self.method.is_read() => {
                let fields: Map<String, Value> = fields
                    .iter()
                    .filter(|(key, _)| key.as_str() != QUERY_KEY)
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                let payload = Value::Object(convert_map(&fields, KeyCase::Snake));
                Some(serde_json::to_string(&payload).map_err(|e| ApiError::Serialization(e.to_string()))?)
            }
            _ => None,
        };

        let request = HttpRequest {
            method: self.method,
            path: format!("{base_url}/{url}"),
            headers: vec![
                ("accept".to_string(), JSON.to_string()),
                ("content-type".to_string(), JSON.to_string()),
            ],
            body,
            credentials: Credentials::Include,
        };
        debug!(method = %request.method, path = %request.path, "built api request");
        Ok(request)
    }

    /// Classify a response by its raw status.
    ///
    /// 401 is checked first and never parsed; 404 and 500 are returned
    /// untouched; everything else must be JSON and comes back camelCased.
    pub fn parse(&self, response: HttpResponse) -> Result<Outcome, ApiError> {
        match response.status {
            401 => {
                debug!(template = %self.template, "unauthenticated response");
                Ok(Outcome::Unauthenticated)
            }
            404 | 500 => {
                warn!(template = %self.template, status = response.status, "api call failed");
                Ok(Outcome::Failure(response))
            }
            status => {
                let json = parse_body(&response.body)?;
                debug!(template = %self.template, status, "api call succeeded");
                Ok(Outcome::Success(to_camel_keys(&json)))
            }
        }
    }
}

fn parse_body(body: &str) -> Result<Value, ApiError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Dispatches named rules.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    redirect_to: String,
    rules: RuleRegistry,
}

impl ApiClient {
    pub fn new(base_url: &str, rules: RuleRegistry) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            redirect_to: "/".to_string(),
            rules,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut rules = RuleRegistry::site_defaults();
        if let Some(path) = &config.rules_file {
            rules = rules.with_file(path)?;
        }
        Ok(Self::new(&config.base_url, rules).redirect_to(&config.unauthenticated_redirect))
    }

    /// Where a 401 sends the user.
    pub fn redirect_to(mut self, path: &str) -> Self {
        self.redirect_to = path.to_string();
        self
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    pub fn endpoint(&self, rule_id: &str) -> Result<Endpoint, ApiError> {
        Ok(self.rules.get(rule_id)?.endpoint())
    }

    pub fn build_request(&self, rule_id: &str, data: &RequestData) -> Result<HttpRequest, ApiError> {
        self.endpoint(rule_id)?.build(&self.base_url, data)
    }

    pub fn parse_response(&self, rule_id: &str, response: HttpResponse) -> Result<Outcome, ApiError> {
        self.endpoint(rule_id)?.parse(response)
    }

    /// Run one call for `rule_id`: build, execute, classify.
    ///
    /// A 401 triggers exactly one redirect before `Outcome::Unauthenticated`
    /// is returned.
    pub fn request<T, N>(&self, rule_id: &str, data: &RequestData, transport: &T, navigator: &N) -> Result<Outcome, ApiError>
    where
        T: Transport + ?Sized,
        N: Navigator + ?Sized,
    {
        let endpoint = self.endpoint(rule_id)?;
        let request = endpoint.build(&self.base_url, data)?;
        let response = transport.execute(request).inspect_err(|e| {
            warn!(rule = rule_id, error = %e, "transport failure");
        })?;
        let outcome = endpoint.parse(response)?;

        if let Outcome::Unauthenticated = outcome {
            info!(rule = rule_id, to = %self.redirect_to, "not signed in, redirecting");
            navigator.redirect(&self.redirect_to);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use serde_json::json;

    use super::*;

    struct Canned {
        response: Result<HttpResponse, String>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Canned {
        fn new(status: u16, body: &str) -> Self {
            Self {
                response: Ok(HttpResponse::new(status, body)),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request);
            self.response.clone().map_err(ApiError::Transport)
        }
    }

    #[derive(Default)]
    struct Redirects(Cell<usize>, RefCell<Option<String>>);

    impl Navigator for Redirects {
        fn redirect(&self, path: &str) {
            self.0.set(self.0.get() + 1);
            *self.1.borrow_mut() = Some(path.to_string());
        }
    }

    fn client() -> ApiClient {
        ApiClient::new("", RuleRegistry::site_defaults().with_rule("users.update", HttpMethod::Put, "users/:id"))
    }

    fn data(value: Value) -> RequestData {
        RequestData::from(value)
    }

    #[test]
    fn get_request_has_query_and_no_body() {
        let req = client()
            .build_request("comments.search", &data(json!({"topicId": 4, "tags": ["a", "b"]})))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "/api/search-comments/?topic_id=4&tags=a,b");
        assert!(req.body.is_none());
        assert_eq!(req.credentials, Credentials::Include);
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("content-type"), Some("application/json"));
    }

    #[test]
    fn post_body_is_snake_cased_without_query_object() {
        let req = client()
            .build_request(
                "newsletter.subscribe",
                &data(json!({"emailAddress": "a@b.c", "__query": {"refSource": "footer"}})),
            )
            .unwrap();
        assert_eq!(req.path, "/newsletter/?ref_source=footer");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"email_address": "a@b.c"}));
    }

    #[test]
    fn put_with_placeholder_keeps_field_in_body() {
        let req = client()
            .build_request("users.update", &data(json!({"id": 9, "displayName": "Z"})))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "/users/9");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"id": 9, "display_name": "Z"}));
    }

    #[test]
    fn post_without_data_has_no_body() {
        let req = client().build_request("newsletter.subscribe", &RequestData::Empty).unwrap();
        assert!(req.body.is_none());
        assert_eq!(req.path, "/newsletter/");
    }

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = ApiClient::new("http://localhost:3000/", RuleRegistry::site_defaults());
        let req = client.build_request("pulse.get", &RequestData::Empty).unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/get-pulse/");
    }

    #[test]
    fn unknown_rule_fails_fast() {
        let err = client().build_request("missing.rule", &RequestData::Empty).unwrap_err();
        assert!(matches!(err, ApiError::UnknownRule(_)));
    }

    #[test]
    fn success_body_is_camel_cased() {
        let outcome = client()
            .parse_response("pulse.get", HttpResponse::new(200, r#"{"video_list":[{"video_id":1}]}"#))
            .unwrap();
        assert_eq!(outcome, Outcome::Success(json!({"videoList": [{"videoId": 1}]})));
    }

    #[test]
    fn empty_success_body_is_null() {
        let outcome = client().parse_response("pulse.get", HttpResponse::new(204, "")).unwrap();
        assert_eq!(outcome, Outcome::Success(Value::Null));
    }

    #[test]
    fn not_found_is_returned_raw() {
        let raw = HttpResponse::new(404, "<html>not here</html>");
        let outcome = client().parse_response("pulse.get", raw.clone()).unwrap();
        assert_eq!(outcome, Outcome::Failure(raw));
    }

    #[test]
    fn server_error_is_returned_raw() {
        let raw = HttpResponse::new(500, r#"{"error_code":1}"#);
        let outcome = client().parse_response("pulse.get", raw.clone()).unwrap();
        assert_eq!(outcome, Outcome::Failure(raw));
    }

    #[test]
    fn bad_json_is_a_deserialization_error() {
        let err = client()
            .parse_response("pulse.get", HttpResponse::new(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn unauthorized_redirects_once_without_parsing() {
        let transport = Canned::new(401, "not json at all");
        let navigator = Redirects::default();
        let outcome = client()
            .redirect_to("/login/")
            .request("pulse.get", &RequestData::Empty, &transport, &navigator)
            .unwrap();
        assert_eq!(outcome, Outcome::Unauthenticated);
        assert_eq!(navigator.0.get(), 1);
        assert_eq!(navigator.1.borrow().as_deref(), Some("/login/"));
    }

    #[test]
    fn request_executes_exactly_once() {
        let transport = Canned::new(200, r#"{"link_url":"x"}"#);
        let navigator = Redirects::default();
        let outcome = client()
            .request("roulette.random-link.get", &RequestData::Empty, &transport, &navigator)
            .unwrap();
        assert_eq!(outcome, Outcome::Success(json!({"linkUrl": "x"})));
        assert_eq!(transport.seen.borrow().len(), 1);
        assert_eq!(navigator.0.get(), 0);
    }

    #[test]
    fn transport_failure_is_rejected() {
        let transport = Canned {
            response: Err("connection refused".to_string()),
            seen: RefCell::new(Vec::new()),
        };
        let err = client()
            .request("pulse.get", &RequestData::Empty, &transport, &Redirects::default())
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(msg) if msg == "connection refused"));
    }

    #[test]
    fn endpoint_method_is_case_insensitive() {
        let endpoint = Endpoint::parse_method("POST", "newsletter/").unwrap();
        assert_eq!(endpoint.method(), HttpMethod::Post);
        assert!(Endpoint::parse_method("BREW", "coffee/").is_err());
    }
}
