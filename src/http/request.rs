//! Inbound gateway event and the HTTP methods the forwarder understands.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// HTTP methods that can be forwarded downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Parse a gateway method name. Matching is exact: `"get"` is not `GET`.
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }

    /// Whether the downstream call for this method carries a JSON body.
    pub fn sends_body(&self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A query string parameter value: a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multi(Vec<String>),
}

impl QueryValue {
    /// Append another value, turning a single value into a list.
    pub fn push(&mut self, value: impl Into<String>) {
        match self {
            QueryValue::Single(first) => {
                let first = std::mem::take(first);
                *self = QueryValue::Multi(vec![first, value.into()]);
            }
            QueryValue::Multi(values) => values.push(value.into()),
        }
    }

    /// Iterate over every value.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            QueryValue::Single(value) => std::slice::from_ref(value),
            QueryValue::Multi(values) => values,
        };
        values.iter().map(String::as_str)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::Multi(values)
    }
}

/// Decode a raw `a=1&b=2&a=3` query string. Repeated keys collect into a list.
pub fn parse_query_string(raw: &str) -> BTreeMap<String, QueryValue> {
    let mut params: BTreeMap<String, QueryValue> = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        match params.get_mut(&*key) {
            Some(existing) => existing.push(value),
            None => {
                params.insert(key.into_owned(), QueryValue::Single(value.into_owned()));
            }
        }
    }
    params
}

/// Proxy event delivered by the gateway for one inbound HTTP request.
///
/// Every field apart from `path` may be missing or `null` on the wire.
/// Unknown fields (request context, stage variables, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayEvent {
    /// Request path, appended verbatim to the base URL.
    pub path: String,
    /// HTTP method as sent by the gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    /// Request headers. Keys are case-sensitive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    /// Raw request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Decoded query string parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string_parameters: Option<BTreeMap<String, QueryValue>>,
}

impl GatewayEvent {
    /// Create an event for `method` on `path`.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            http_method: Some(method.into()),
            ..Self::default()
        }
    }

    /// Add a header to the event.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the raw body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a query string parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query_string_parameters
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// The forwardable method, if the event carries one.
    pub fn method(&self) -> Option<Method> {
        self.http_method.as_deref().and_then(Method::parse)
    }

    /// Get a header value by its exact key.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|headers| headers.get(key))
            .map(String::as_str)
    }

    /// Parse the body as JSON. `None` when the body is missing or empty.
    pub fn json_body(&self) -> Option<Result<serde_json::Value, serde_json::Error>> {
        self.body
            .as_deref()
            .filter(|body| !body.is_empty())
            .map(serde_json::from_str)
    }

    /// Query parameters flattened into key/value pairs, lists expanded.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query_string_parameters
            .iter()
            .flatten()
            .flat_map(|(key, value)| value.values().map(move |v| (key.clone(), v.to_string())))
            .collect()
    }
}
