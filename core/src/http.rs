//! HTTP-shaped events and responses exchanged with the hosting runtime.
//!
//! # Design
//! These types describe the API gateway proxy shape as plain data. A host
//! (the lambda runtime, or the local gateway) turns its native request into
//! an `HttpEvent`, hands it to the handlers, and writes the returned
//! `HttpResponse` back out. Handlers never touch a socket.
//!
//! Field names serialize in the gateway's camelCase so events captured from
//! a real deployment deserialize as-is.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP method of an inbound event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    #[serde(other)]
    Other,
}

impl From<&str> for HttpMethod {
    fn from(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            _ => HttpMethod::Other,
        }
    }
}

/// An inbound request event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpEvent {
    #[serde(default)]
    pub http_method: HttpMethod,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl HttpEvent {
    pub fn new(http_method: HttpMethod, path: &str) -> Self {
        Self {
            http_method,
            path: path.to_string(),
            ..Self::default()
        }
    }

    pub fn with_path_param(mut self, name: &str, value: &str) -> Self {
        self.path_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .map(String::as_str)
    }

    /// The body as text. A base64-flagged body is decoded first; if it does
    /// not decode, the raw text is used.
    pub fn body_text(&self) -> Option<Cow<'_, str>> {
        let body = self.body.as_deref()?;
        if self.is_base64_encoded {
            if let Ok(bytes) = STANDARD.decode(body) {
                return Some(Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()));
            }
        }
        Some(Cow::Borrowed(body))
    }
}

/// An outbound response. `body` is always a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn json(status_code: u16, body: &Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            status_code,
            headers,
            body: body.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Decode the JSON body.
    pub fn json_body(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}
