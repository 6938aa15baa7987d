// streamctl - CLI for HTTP+JSON network audio streamers
// Copyright (C) 2024 The streamctl contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! In-memory device used by unit tests.

use crate::client::{Transport, TransportError};
use reqwest::Method;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MockTransport {
    documents: HashMap<String, Value>,
    calls: RefCell<Vec<(Method, String)>>,
    failure: Option<TransportError>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, path: &str, doc: Value) -> Self {
        self.documents.insert(path.to_string(), doc);
        self
    }

    pub fn failing(err: TransportError) -> Self {
        Self {
            failure: Some(err),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.calls.borrow().clone()
    }

    /// Every call that could change device state: non-GET requests and
    /// GET requests carrying a query string.
    pub fn writes(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|(m, p)| *m != Method::GET || p.contains('?'))
            .map(|(m, p)| format!("{m} {p}"))
            .collect()
    }
}

impl Transport for MockTransport {
    fn request(&self, method: Method, path: &str) -> Result<Vec<u8>, TransportError> {
        self.calls
            .borrow_mut()
            .push((method.clone(), path.to_string()));
        if let Some(err) = self.failure {
            return Err(err);
        }
        if let Some(doc) = self.documents.get(path) {
            return Ok(serde_json::to_vec(doc).unwrap_or_default());
        }
        if method == Method::GET && !path.contains('?') {
            return Err(TransportError::Other(404));
        }
        Ok(Vec::new())
    }
}
