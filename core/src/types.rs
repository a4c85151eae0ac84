//! Payload and outcome types that flow through a dispatch.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::http::HttpResponse;

/// Key holding the query-string object of a body-carrying request.
pub const QUERY_KEY: &str = "__query";

/// Data supplied for one dispatch.
///
/// A URL template is filled either from named fields or, for templates with
/// a single placeholder, from one bare value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestData {
    #[default]
    Empty,
    /// One value for the template's only placeholder. Never produces a query
    /// string or a body.
    Value(Value),
    /// Named fields, in insertion order.
    Fields(Map<String, Value>),
}

impl RequestData {
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestData::Empty)
    }

    pub fn as_fields(&self) -> Option<&Map<String, Value>> {
        match self {
            RequestData::Fields(map) => Some(map),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for RequestData {
    fn from(map: Map<String, Value>) -> Self {
        RequestData::Fields(map)
    }
}

impl From<Value> for RequestData {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RequestData::Empty,
            Value::Object(map) => RequestData::Fields(map),
            other => RequestData::Value(other),
        }
    }
}

/// Classified result of one HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Parsed body with camelCase keys.
    Success(Value),
    /// A 404 or 500 response, left unparsed.
    Failure(HttpResponse),
    /// 401; the page is being navigated away.
    Unauthenticated,
}

impl Outcome {
    pub fn status(&self) -> Option<u16> {
        match self {
            Outcome::Failure(response) => Some(response.status),
            Outcome::Unauthenticated => Some(401),
            Outcome::Success(_) => None,
        }
    }

    /// The application error carried by a success body, if any.
    pub fn error(&self) -> Option<ErrorBody> {
        match self {
            Outcome::Success(body) => ErrorBody::from_body(body),
            _ => None,
        }
    }

    /// True when the form should show an error alert for this outcome.
    pub fn is_failure(&self) -> bool {
        match self {
            Outcome::Success(_) => self.error().is_some(),
            Outcome::Failure(response) => response.status == 500,
            Outcome::Unauthenticated => false,
        }
    }
}

/// The `error` object of an application-level failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Extract the `error` field of a parsed body. A bare string is taken as
    /// the message; any other non-null shape still counts as an error, just
    /// without details.
    pub fn from_body(body: &Value) -> Option<Self> {
        match body.get("error")? {
            Value::Null => None,
            Value::String(message) => Some(ErrorBody {
                code: None,
                message: Some(message.clone()),
            }),
            other => Some(serde_json::from_value(other.clone()).unwrap_or_default()),
        }
    }
}
