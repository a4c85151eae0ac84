//! Named API endpoints.
//!
//! A registry is assembled once at start-up, by value, and then only read.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::client::Endpoint;
use crate::error::ApiError;
use crate::http::HttpMethod;

/// One endpoint: a method and a URL template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rule {
    pub method: HttpMethod,
    #[serde(rename = "url")]
    pub template: String,
}

impl Rule {
    pub fn new(method: HttpMethod, template: impl Into<String>) -> Self {
        Self {
            method,
            template: template.into(),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.method, self.template.clone())
    }
}

#[derive(Deserialize)]
struct RulesFile {
    rules: HashMap<String, Rule>,
}

/// Rule ids mapped to endpoints.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<String, Rule>,
}

impl RuleRegistry {
    /// A registry with no rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The endpoints the site front end ships with.
    pub fn site_defaults() -> Self {
        Self::empty()
            .with_rule("newsletter.subscribe", HttpMethod::Post, "newsletter/")
            .with_rule("topic.search", HttpMethod::Get, "search-topic/")
            .with_rule("comments.search", HttpMethod::Get, "api/search-comments/")
            .with_rule("comments.filter", HttpMethod::Get, "api/filter-comments/")
            .with_rule("pulse.get", HttpMethod::Get, "api/get-pulse/")
            .with_rule("pulse.videos.get", HttpMethod::Get, "api/get-pulse-videos/")
            .with_rule("roulette.random-link.get", HttpMethod::Get, "api/get-roulette-link/")
    }

    /// Add or replace a rule.
    pub fn with_rule(mut self, id: impl Into<String>, method: HttpMethod, template: impl Into<String>) -> Self {
        self.rules.insert(id.into(), Rule::new(method, template));
        self
    }

    /// Merge the rules of a JSON document shaped like
    /// `{"rules": {"<id>": {"method": "post", "url": "newsletter/"}}}`.
    /// Rules from the document replace rules with the same id.
    pub fn with_json(mut self, json: &str) -> Result<Self, ApiError> {
        let file: RulesFile = serde_json::from_str(json).map_err(|e| ApiError::Config(e.to_string()))?;
        debug!(count = file.rules.len(), "loaded api rules");
        self.rules.extend(file.rules);
        Ok(self)
    }

    pub fn with_file(self, path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Config(format!("{}: {e}", path.display())))?;
        self.with_json(&json)
    }

    /// Look up a rule. Unknown ids are a programming error and fail without
    /// any fallback.
    pub fn get(&self, id: &str) -> Result<&Rule, ApiError> {
        self.rules.get(id).ok_or_else(|| ApiError::UnknownRule(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rules.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
