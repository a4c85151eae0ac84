//! Client core for a rule-based JSON API and the forms that submit to it.
//!
//! # Overview
//! Named rules map to an HTTP method and a URL template. A dispatch fills
//! the template, converts payload keys to snake_case, lets the host execute
//! the request, then classifies the response: 401 redirects, 404/500 come
//! back raw, anything else is parsed and camelCased.
//!
//! # Design
//! - Host-does-IO: `Transport` and `Navigator` are injected, so the core
//!   stays deterministic and testable.
//! - `Endpoint::build` / `Endpoint::parse` keep the I/O boundary explicit;
//!   `ApiClient::request` chains them for callers that do not need the split.
//! - `FormBinder` wires submit events on the in-memory `dom::Document` to
//!   rule dispatches and owns all of its collaborators, there is no global
//!   state.

pub mod alert;
pub mod case;
pub mod client;
pub mod config;
pub mod dom;
pub mod error;
pub mod form;
pub mod http;
pub mod rules;
pub mod types;
pub mod url;

pub use alert::ErrorCatalog;
pub use client::{ApiClient, Endpoint};
pub use config::ClientConfig;
pub use dom::{Document, Field, Form, FormId, SubmitControl, SubmitEvent};
pub use error::ApiError;
pub use form::{FormBinder, Settled};
pub use http::{Credentials, HttpMethod, HttpRequest, HttpResponse, Navigator, Transport};
pub use rules::{Rule, RuleRegistry};
pub use types::{ErrorBody, Outcome, RequestData};
