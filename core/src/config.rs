//! Client settings read from the environment.
//!
//! Every key is optional. A missing key falls back to its default and the
//! fallback is logged, so a bare environment still yields a working client
//! that talks to the current origin.

use std::{env, path::PathBuf};

use tracing::{debug, info};

/// Loading label shown on a submit control without `data-loading-text`.
pub const DEFAULT_LOADING_LABEL: &str = "Working...";

/// Client settings, normally read once at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prefix for every request path. Empty means root-relative.
    pub base_url: String,
    /// Where a 401 sends the user.
    pub unauthenticated_redirect: String,
    pub loading_label: String,
    /// Extra rules merged over the site defaults.
    pub rules_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            unauthenticated_redirect: "/".to_string(),
            loading_label: DEFAULT_LOADING_LABEL.to_string(),
            rules_file: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            base_url: load(&lookup, "FORMWIRE_BASE_URL", defaults.base_url),
            unauthenticated_redirect: load(&lookup, "FORMWIRE_REDIRECT", defaults.unauthenticated_redirect),
            loading_label: load(&lookup, "FORMWIRE_LOADING_LABEL", defaults.loading_label),
            rules_file: lookup("FORMWIRE_RULES").map(PathBuf::from),
        }
    }
}

fn load(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: String) -> String {
    match lookup(key) {
        Some(value) => {
            debug!("{key} = {value}");
            value
        }
        None => {
            info!("{key} not set, using default: {default:?}");
            default
        }
    }
}
