//! Request and response types exchanged between the host, the worker and the cache.
//!
//! A [`Request`] carries what the strategy dispatcher needs to classify it: the
//! absolute URL, the method and the destination the browser declared. A
//! [`Response`] is a full snapshot (status, headers, body); bodies are
//! [`Bytes`] so cloning one into the cache is a reference-count bump.

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// What the requesting page intends to do with the response.
///
/// Mirrors the `Sec-Fetch-Dest` header values the classifier cares about;
/// everything else collapses into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Top-level navigation.
    Document,
    Image,
    Script,
    Style,
    Font,
    Manifest,
    #[default]
    Other,
}

impl Destination {
    /// Parse a `Sec-Fetch-Dest` header value.
    pub fn from_fetch_dest(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" => Destination::Document,
            "image" => Destination::Image,
            "script" => Destination::Script,
            "style" => Destination::Style,
            "font" => Destination::Font,
            "manifest" => Destination::Manifest,
            _ => Destination::Other,
        }
    }

    /// Best-effort guess from an `Accept` header, for clients that do not send
    /// `Sec-Fetch-Dest`.
    pub fn from_accept(accept: &str) -> Self {
        let first = accept.split(',').next().unwrap_or("").trim();
        if first.starts_with("text/html") {
            Destination::Document
        } else if first.starts_with("image/") {
            Destination::Image
        } else if first.starts_with("text/css") {
            Destination::Style
        } else {
            Destination::Other
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Destination::Document => "document",
            Destination::Image => "image",
            Destination::Script => "script",
            Destination::Style => "style",
            Destination::Font => "font",
            Destination::Manifest => "manifest",
            Destination::Other => "",
        };
        f.write_str(s)
    }
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub destination: Destination,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Request {
    /// A `GET` with no declared destination.
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            destination: Destination::Other,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Cache key: the absolute URL without its fragment.
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.to_string()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// A response from the network or a cached snapshot of one.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// A `200 OK` with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Whether the response qualifies for a runtime cache store.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK
    }
}
