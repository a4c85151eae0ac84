//! URL template formatting and query-string handling.
//!
//! Templates name their path parameters as `:ident`. Fields not consumed by a
//! placeholder become query parameters for `get`; body-carrying methods only
//! take query parameters from the nested `__query` object.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::case::{convert_map, KeyCase};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::types::{RequestData, QUERY_KEY};

/// Characters `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn segments(template: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut literal_start = 0;
    let mut chars = template.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != ':' {
            continue;
        }
        let name_start = i + 1;
        let mut name_end = name_start;
        while let Some(&(j, next)) = chars.peek() {
            if !is_ident(next) {
                break;
            }
            name_end = j + next.len_utf8();
            chars.next();
        }
        if name_end > name_start {
            if literal_start < i {
                out.push(Segment::Literal(&template[literal_start..i]));
            }
            out.push(Segment::Placeholder(&template[name_start..name_end]));
            literal_start = name_end;
        }
    }
    if literal_start < template.len() {
        out.push(Segment::Literal(&template[literal_start..]));
    }
    out
}

/// Names of the `:ident` placeholders in `template`, in order.
pub fn placeholders(template: &str) -> Vec<&str> {
    segments(template)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name),
            Segment::Literal(_) => None,
        })
        .collect()
}

pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// String form of a value as it appears in a URL, before encoding.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(plain).collect::<Vec<_>>().join(","),
        // `2.0` prints as `2`, the way a JS number does.
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| f.to_string()).unwrap_or_default(),
        other => other.to_string(),
    }
}

/// Fill the placeholders of `template` and append the query string.
pub fn format_url(method: HttpMethod, template: &str, data: &RequestData) -> Result<String, ApiError> {
    match data {
        RequestData::Empty => Ok(template.to_string()),
        RequestData::Value(value) => fill_single(template, value),
        RequestData::Fields(fields) => {
            let (path, consumed) = fill_fields(template, fields)?;
            let source = query_source(method, fields, &consumed);
            Ok(add_query_params(&path, source.as_ref()))
        }
    }
}

fn fill_single(template: &str, value: &Value) -> Result<String, ApiError> {
    let parts = segments(template);
    let count = parts.iter().filter(|s| matches!(s, Segment::Placeholder(_))).count();
    if count != 1 {
        return Err(ApiError::TemplateArity {
            template: template.to_string(),
            placeholders: count,
        });
    }
    Ok(parts
        .into_iter()
        .map(|s| match s {
            Segment::Literal(text) => text.to_string(),
            Segment::Placeholder(_) => encode_component(&plain(value)),
        })
        .collect())
}

fn fill_fields<'t>(
    template: &'t str,
    fields: &Map<String, Value>,
) -> Result<(String, Vec<&'t str>), ApiError> {
    let mut path = String::with_capacity(template.len());
    let mut consumed = Vec::new();

    for segment in segments(template) {
        match segment {
            Segment::Literal(text) => path.push_str(text),
            Segment::Placeholder(name) => {
                let value = fields
                    .get(name)
                    .filter(|v| !v.is_null())
                    .ok_or_else(|| ApiError::MissingPathParam(name.to_string()))?;
                path.push_str(&encode_component(&plain(value)));
                consumed.push(name);
            }
        }
    }
    Ok((path, consumed))
}

fn query_source(method: HttpMethod, fields: &Map<String, Value>, consumed: &[&str]) -> Option<Map<String, Value>> {
    if !method.is_read() {
        return match fields.get(QUERY_KEY) {
            Some(Value::Object(query)) => Some(query.clone()),
            _ => None,
        };
    }

    let mut source = Map::new();
    for (key, value) in fields {
        if consumed.contains(&key.as_str()) {
            continue;
        }
        match (key.as_str(), value) {
            (QUERY_KEY, Value::Object(query)) => {
                source.extend(query.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            _ => {
                source.insert(key.clone(), value.clone());
            }
        }
    }
    Some(source)
}

/// Append `params` to `url` as a query string with snake_case keys.
///
/// Arrays are comma-joined and not encoded, nulls are skipped, everything
/// else is encoded as a URI component. Nothing is appended when no pair
/// survives.
pub fn add_query_params(url: &str, params: Option<&Map<String, Value>>) -> String {
    let Some(params) = params else {
        return url.to_string();
    };

    let pairs: Vec<String> = convert_map(params, KeyCase::Snake)
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| match value {
            Value::Array(_) => format!("{key}={}", plain(value)),
            other => format!("{key}={}", encode_component(&plain_scalar(other))),
        })
        .collect();

    if pairs.is_empty() {
        return url.to_string();
    }
    format!("{url}?{}", pairs.join("&"))
}

fn plain_scalar(value: &Value) -> String {
    match value {
        Value::Object(_) => value.to_string(),
        other => plain(other),
    }
}

/// Read one decoded query parameter from `url`.
///
/// `+` decodes to a space. A key present without `=` yields an empty string.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or_default();

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key == name).then(|| {
                let value = value.replace('+', " ");
                percent_decode_str(&value).decode_utf8_lossy().into_owned()
            })
        })
}
