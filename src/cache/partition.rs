//! A single named cache partition.
//!
//! A partition maps request URLs to response snapshots. Entries are replaced
//! wholesale on every store; there is no expiry and no size bound.

use std::collections::HashMap;

use axum::http::Method;

use crate::net::request::{Request, Response};

/// One named, isolated store of cached responses.
#[derive(Debug, Clone)]
pub struct Partition {
    name: String,
    entries: HashMap<String, Response>,
}

impl Partition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the entry for `request`. Only `GET` requests ever match.
    pub fn match_request(&self, request: &Request) -> Option<&Response> {
        if request.method != Method::GET {
            return None;
        }
        self.entries.get(&request.cache_key())
    }

    /// Store `response` under `request`, replacing any previous entry.
    ///
    /// Returns `false` (and stores nothing) for non-`GET` requests.
    pub fn put(&mut self, request: &Request, response: Response) -> bool {
        if request.method != Method::GET {
            return false;
        }
        self.entries.insert(request.cache_key(), response);
        true
    }

    /// Insert by raw key; used when restoring a snapshot.
    pub fn insert_raw(&mut self, key: String, response: Response) {
        self.entries.insert(key, response);
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &Response)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total body bytes held by this partition.
    pub fn bytes_used(&self) -> usize {
        self.entries.values().map(|r| r.body.len()).sum()
    }
}
