//! Error types for the formwire client core.
//!
//! # Design
//! HTTP statuses that the dispatcher classifies (401, 404, 500) are not
//! errors: they come back as an `Outcome`. `ApiError` covers everything that
//! prevents an outcome from being produced at all, including transport
//! failures reported by the host.

use thiserror::Error;

/// Errors returned while building requests, parsing responses or running a
/// full dispatch.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No rule is registered under this id.
    #[error("unknown api rule: {0}")]
    UnknownRule(String),

    /// The method string is not one of get/post/put/patch/delete.
    #[error("unknown http method: {0}")]
    UnknownMethod(String),

    /// A `:name` placeholder had no (non-null) value in the request data.
    #[error("missing value for url placeholder `:{0}`")]
    MissingPathParam(String),

    /// A scalar value was supplied for a template without exactly one
    /// placeholder.
    #[error("template `{template}` has {placeholders} placeholders, a single value needs exactly one")]
    TemplateArity {
        template: String,
        placeholders: usize,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be parsed as JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The host could not complete the HTTP round-trip.
    #[error("transport failed: {0}")]
    Transport(String),

    /// A form selector could not be parsed.
    #[error("unsupported selector: {0:?}")]
    Selector(String),

    /// Configuration (rules file, environment) is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}
