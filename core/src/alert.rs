//! User-facing error text and the inline error alert.

use std::collections::HashMap;

use tracing::debug;

use crate::dom::{Alert, Form, Node};
use crate::types::ErrorBody;

pub const GENERIC_ERROR: &str = "Something happened on our side. Please try again in ten minutes.";

/// Known error codes mapped to the text shown to users.
#[derive(Debug, Clone)]
pub struct ErrorCatalog {
    messages: HashMap<String, String>,
}

impl Default for ErrorCatalog {
    fn default() -> Self {
        Self {
            messages: HashMap::new(),
        }
        .with_code("auth.signin.wrong-credentials", "Sorry, wrong password or email.")
        .with_code("auth.signup.user-exists", "Looks like we already have a user with this email.")
    }
}

impl ErrorCatalog {
    pub fn with_code(mut self, code: &str, message: &str) -> Self {
        self.messages.insert(code.to_string(), message.to_string());
        self
    }

    /// Known code text, then the error's own message, then the generic text.
    pub fn error_text(&self, error: Option<&ErrorBody>) -> String {
        let Some(error) = error else {
            return GENERIC_ERROR.to_string();
        };
        error
            .code
            .as_deref()
            .and_then(|code| self.messages.get(code))
            .or(error.message.as_ref().filter(|m| !m.is_empty()))
            .cloned()
            .unwrap_or_else(|| GENERIC_ERROR.to_string())
    }

    /// Replace any alert in `form` with a fresh one as its first child.
    pub fn render_error_alert(&self, form: &mut Form, error: Option<&ErrorBody>) -> Alert {
        let text = self.error_text(error);
        let removed = form.remove_alerts();
        debug!(removed, text = %text, "rendering error alert");

        let alert = Alert::error(&text).with_style("margin-bottom", "10px");
        form.prepend(Node::Alert(alert.clone()));
        alert
    }
}
