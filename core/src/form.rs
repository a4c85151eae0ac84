//! Binding form submissions to API rules.
//!
//! # Design
//! `FormBinder` owns the client and the injected `Transport` / `Navigator`.
//! Submit events are handed to `dispatch`, which routes them to every binding
//! whose selector matches the target form. One submission walks
//! Collecting → Submitting → Success | Failed and always ends with the submit
//! control re-enabled. Overlapping submissions are not deduplicated.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::alert::ErrorCatalog;
use crate::client::ApiClient;
use crate::config::{ClientConfig, DEFAULT_LOADING_LABEL};
use crate::dom::{Document, Form, FormId, Selector, SubmitEvent};
use crate::error::ApiError;
use crate::http::{Navigator, Transport};
use crate::types::{Outcome, RequestData};

/// Rewrites collected field values before they are sent.
pub type Transform = Box<dyn Fn(Map<String, Value>, &Form, &SubmitEvent) -> Map<String, Value>>;

/// Called once per submission with the dispatch result.
pub type OnComplete = Box<dyn FnMut(&Result<Outcome, ApiError>, &Form, &SubmitEvent)>;

/// How a submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Success,
    /// An error alert was rendered.
    Failed,
    /// The page was redirected; the form was left as is.
    Unauthenticated,
}

struct Binding {
    selector: Selector,
    rule_id: String,
    on_complete: OnComplete,
    transform: Option<Transform>,
}

pub struct FormBinder<T, N> {
    client: ApiClient,
    transport: T,
    navigator: N,
    catalog: ErrorCatalog,
    loading_label: String,
    bindings: Vec<Binding>,
}

impl<T: Transport, N: Navigator> FormBinder<T, N> {
    pub fn new(client: ApiClient, transport: T, navigator: N) -> Self {
        Self {
            client,
            transport,
            navigator,
            catalog: ErrorCatalog::default(),
            loading_label: DEFAULT_LOADING_LABEL.to_string(),
            bindings: Vec::new(),
        }
    }

    pub fn from_config(config: &ClientConfig, transport: T, navigator: N) -> Result<Self, ApiError> {
        let client = ApiClient::from_config(config)?;
        Ok(Self::new(client, transport, navigator).with_loading_label(&config.loading_label))
    }

    pub fn with_catalog(mut self, catalog: ErrorCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Label for submit controls without `data-loading-text`.
    pub fn with_loading_label(mut self, label: &str) -> Self {
        self.loading_label = label.to_string();
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Submit forms matching `selector` to `rule_id`.
    ///
    /// The selector and the rule are checked here, so a bad binding fails at
    /// start-up rather than on the first submit.
    pub fn bind_form<C>(&mut self, selector: &str, rule_id: &str, on_complete: C) -> Result<(), ApiError>
    where
        C: FnMut(&Result<Outcome, ApiError>, &Form, &SubmitEvent) + 'static,
    {
        self.bind(selector, rule_id, Box::new(on_complete), None)
    }

    /// Like `bind_form`, with a transform applied to the collected values.
    pub fn bind_form_with<C, F>(&mut self, selector: &str, rule_id: &str, on_complete: C, transform: F) -> Result<(), ApiError>
    where
        C: FnMut(&Result<Outcome, ApiError>, &Form, &SubmitEvent) + 'static,
        F: Fn(Map<String, Value>, &Form, &SubmitEvent) -> Map<String, Value> + 'static,
    {
        self.bind(selector, rule_id, Box::new(on_complete), Some(Box::new(transform)))
    }

    fn bind(&mut self, selector: &str, rule_id: &str, on_complete: OnComplete, transform: Option<Transform>) -> Result<(), ApiError> {
        let selector: Selector = selector.parse()?;
        self.client.rules().get(rule_id)?;
        self.bindings.push(Binding {
            selector,
            rule_id: rule_id.to_string(),
            on_complete,
            transform,
        });
        Ok(())
    }

    /// Deliver a submit event. Every binding whose selector matches the
    /// target form handles it, in binding order.
    pub fn dispatch(&mut self, document: &mut Document, event: &mut SubmitEvent) -> Vec<Settled> {
        let Self {
            client,
            transport,
            navigator,
            catalog,
            loading_label,
            bindings,
        } = self;

        let mut settled = Vec::new();
        for binding in bindings.iter_mut() {
            let Some(form) = document.form_mut(event.target) else {
                warn!(target = ?event.target, "submit event for a form that is not in the document");
                break;
            };
            if !binding.selector.matches(form) {
                continue;
            }
            event.prevent_default();

            let mut data = form.serialize();
            if let Some(transform) = &binding.transform {
                data = transform(data, &*form, &*event);
            }
            debug!(rule = %binding.rule_id, fields = data.len(), "collected form data");

            let original_label = mark_busy(form, loading_label.as_str());
            let result = client.request(&binding.rule_id, &RequestData::Fields(data), &*transport, &*navigator);
            restore(form, original_label);

            let state = match &result {
                Ok(Outcome::Unauthenticated) => Settled::Unauthenticated,
                Ok(outcome) if outcome.is_failure() => {
                    catalog.render_error_alert(form, outcome.error().as_ref());
                    Settled::Failed
                }
                Ok(_) => {
                    form.remove_alerts();
                    Settled::Success
                }
                Err(e) => {
                    warn!(rule = %binding.rule_id, error = %e, "form submission failed");
                    catalog.render_error_alert(form, None);
                    Settled::Failed
                }
            };
            debug!(rule = %binding.rule_id, ?state, "submission settled");

            (binding.on_complete)(&result, &*form, &*event);
            settled.push(state);
        }
        settled
    }

    /// Convenience for hosts: build the event for `form` and dispatch it.
    pub fn submit(&mut self, document: &mut Document, form: FormId) -> (SubmitEvent, Vec<Settled>) {
        let mut event = SubmitEvent::new(form);
        let settled = self.dispatch(document, &mut event);
        (event, settled)
    }
}

/// Disable the submit control and show its loading label. An empty
/// `data-loading-text` counts as unset. Returns the label to restore, or
/// `None` when the form has no submit control.
fn mark_busy(form: &mut Form, fallback: &str) -> Option<String> {
    let submit = form.submit_control_mut()?;
    let loading = submit
        .data("loading-text")
        .filter(|text| !text.is_empty())
        .unwrap_or(fallback)
        .to_string();
    submit.disabled = true;
    Some(std::mem::replace(&mut submit.label, loading))
}

fn restore(form: &mut Form, label: Option<String>) {
    if let (Some(submit), Some(label)) = (form.submit_control_mut(), label) {
        submit.disabled = false;
        submit.label = label;
    }
}
