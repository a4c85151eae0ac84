//! In-memory document model the form binder works on.
//!
//! # Design
//! A `Document` owns forms, each an ordered list of child nodes: named
//! fields, a submit control and inline alerts. Hosts that render real
//! widgets mirror them into this model; the binder only ever mutates the
//! subtree of the form whose submit it is handling.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::url::query_param;

/// Handle to a form inside a `Document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputType {
    #[default]
    Text,
    Email,
    Password,
    Search,
    Number,
    Hidden,
    Checkbox,
    Radio,
}

impl InputType {
    /// Checkable inputs only submit their value when checked.
    pub fn is_checkable(&self) -> bool {
        matches!(self, InputType::Checkbox | InputType::Radio)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Input(InputType),
    Select,
    Textarea,
}

/// A named input, select or textarea.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub kind: FieldKind,
    pub id: Option<String>,
    pub name: Option<String>,
    pub value: String,
    pub checked: bool,
    pub disabled: bool,
}

impl Field {
    fn new(kind: FieldKind, name: &str, value: &str) -> Self {
        Self {
            kind,
            id: None,
            name: (!name.is_empty()).then(|| name.to_string()),
            value: value.to_string(),
            checked: false,
            disabled: false,
        }
    }

    pub fn input(kind: InputType, name: &str, value: &str) -> Self {
        Self::new(FieldKind::Input(kind), name, value)
    }

    pub fn text(name: &str, value: &str) -> Self {
        Self::input(InputType::Text, name, value)
    }

    pub fn select(name: &str, value: &str) -> Self {
        Self::new(FieldKind::Select, name, value)
    }

    pub fn textarea(name: &str, value: &str) -> Self {
        Self::new(FieldKind::Textarea, name, value)
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    fn submits(&self) -> bool {
        if self.disabled || self.name.is_none() {
            return false;
        }
        match self.kind {
            FieldKind::Input(kind) if kind.is_checkable() => self.checked,
            _ => true,
        }
    }

    /// Fields a reset empties: everything typed in, not choices.
    fn is_text_like(&self) -> bool {
        match self.kind {
            FieldKind::Input(kind) => !kind.is_checkable() && kind != InputType::Hidden,
            FieldKind::Textarea => true,
            FieldKind::Select => false,
        }
    }
}

/// The submit button of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    pub label: String,
    pub disabled: bool,
    attributes: Vec<(String, String)>,
}

impl SubmitControl {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            disabled: false,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_loading_text(self, text: &str) -> Self {
        self.with_attribute("data-loading-text", text)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// `data-<name>` attribute.
    pub fn data(&self, name: &str) -> Option<&str> {
        self.attribute(&format!("data-{name}"))
    }
}

/// An inline `div.alert.error` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub text: String,
    pub style: Vec<(String, String)>,
}

impl Alert {
    pub const CLASS: &'static str = "alert error";

    pub fn error(text: &str) -> Self {
        Self {
            text: text.to_string(),
            style: Vec::new(),
        }
    }

    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.style.push((property.to_string(), value.to_string()));
        self
    }

    pub fn inner_html(&self) -> String {
        format!("<p>{}</p>", escape_html(&self.text))
    }

    pub fn outer_html(&self) -> String {
        let style = self
            .style
            .iter()
            .map(|(property, value)| format!("{property}: {value};"))
            .collect::<Vec<_>>()
            .join(" ");
        if style.is_empty() {
            format!(r#"<div class="{}">{}</div>"#, Self::CLASS, self.inner_html())
        } else {
            format!(
                r#"<div class="{}" style="{}">{}</div>"#,
                Self::CLASS,
                escape_html(&style),
                self.inner_html()
            )
        }
    }
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Field(Field),
    Submit(SubmitControl),
    Alert(Alert),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub children: Vec<Node>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_field(self, field: Field) -> Self {
        self.with_child(Node::Field(field))
    }

    pub fn with_submit(self, submit: SubmitControl) -> Self {
        self.with_child(Node::Submit(submit))
    }

    pub fn with_child(mut self, node: Node) -> Self {
        self.children.push(node);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Named values of every submittable field, in document order. A later
    /// field with the same name replaces an earlier one.
    pub fn serialize(&self) -> Map<String, Value> {
        let mut data = Map::new();
        for field in self.fields().filter(|f| f.submits()) {
            if let Some(name) = &field.name {
                data.insert(name.clone(), Value::String(field.value.clone()));
            }
        }
        data
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.children.iter().filter_map(|node| match node {
            Node::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn fields_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().find(|f| f.name.as_deref() == Some(name))
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields_mut().find(|f| f.name.as_deref() == Some(name))
    }

    pub fn submit_control(&self) -> Option<&SubmitControl> {
        self.children.iter().find_map(|node| match node {
            Node::Submit(submit) => Some(submit),
            _ => None,
        })
    }

    pub fn submit_control_mut(&mut self) -> Option<&mut SubmitControl> {
        self.children.iter_mut().find_map(|node| match node {
            Node::Submit(submit) => Some(submit),
            _ => None,
        })
    }

    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.children.iter().filter_map(|node| match node {
            Node::Alert(alert) => Some(alert),
            _ => None,
        })
    }

    /// Remove every alert; returns how many were removed.
    pub fn remove_alerts(&mut self) -> usize {
        let before = self.children.len();
        self.children.retain(|node| !matches!(node, Node::Alert(_)));
        before - self.children.len()
    }

    pub fn prepend(&mut self, node: Node) {
        self.children.insert(0, node);
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children.first()
    }

    /// Clear every text input and textarea.
    pub fn reset(&mut self) {
        for field in self.fields_mut().filter(|f| f.is_text_like()) {
            field.value.clear();
        }
    }

    /// Copy query parameters of `url` into inputs whose id matches the
    /// parameter name. Empty parameters leave the input alone.
    pub fn fill_from_url(&mut self, url: &str) -> usize {
        let mut filled = 0;
        for field in self.fields_mut() {
            if !matches!(field.kind, FieldKind::Input(_)) {
                continue;
            }
            let Some(id) = field.id.as_deref() else {
                continue;
            };
            if let Some(value) = query_param(url, id).filter(|v| !v.is_empty()) {
                field.value = value;
                filled += 1;
            }
        }
        filled
    }
}

/// A simple selector: `form`, `#id`, `.class`, or `form` followed by any
/// number of `#id` / `.class` parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    pub fn matches(&self, form: &Form) -> bool {
        let id_ok = match &self.id {
            Some(id) => form.id.as_deref() == Some(id.as_str()),
            None => true,
        };
        id_ok && self.classes.iter().all(|class| form.has_class(class))
    }
}

impl FromStr for Selector {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ApiError::Selector(s.to_string());
        let s_trim = s.trim();
        if s_trim.is_empty() || s_trim.contains(char::is_whitespace) {
            return Err(invalid());
        }

        let rest = s_trim.strip_prefix("form").unwrap_or(s_trim);
        if !rest.is_empty() && !rest.starts_with(['#', '.']) {
            return Err(invalid());
        }

        let mut selector = Selector {
            id: None,
            classes: Vec::new(),
        };
        let mut parts = rest.char_indices().filter(|(_, c)| matches!(c, '#' | '.')).peekable();
        while let Some((start, marker)) = parts.next() {
            let end = parts.peek().map(|(i, _)| *i).unwrap_or(rest.len());
            let name = &rest[start + 1..end];
            if name.is_empty() {
                return Err(invalid());
            }
            match marker {
                '#' if selector.id.is_none() => selector.id = Some(name.to_string()),
                '#' => return Err(invalid()),
                _ => selector.classes.push(name.to_string()),
            }
        }
        Ok(selector)
    }
}

/// The forms of one page.
#[derive(Debug, Clone, Default)]
pub struct Document {
    forms: Vec<Form>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_form(&mut self, form: Form) -> FormId {
        self.forms.push(form);
        FormId(self.forms.len() - 1)
    }

    pub fn form(&self, id: FormId) -> Option<&Form> {
        self.forms.get(id.0)
    }

    pub fn form_mut(&mut self, id: FormId) -> Option<&mut Form> {
        self.forms.get_mut(id.0)
    }

    /// Forms matching `selector`, in document order.
    pub fn query(&self, selector: &Selector) -> Vec<FormId> {
        self.forms
            .iter()
            .enumerate()
            .filter(|(_, form)| selector.matches(form))
            .map(|(i, _)| FormId(i))
            .collect()
    }
}

/// A submit event targeting one form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitEvent {
    pub target: FormId,
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new(target: FormId) -> Self {
        Self {
            target,
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
