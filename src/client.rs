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

use crate::error::CtlError;
use crate::query;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, Url};
use serde_json::Value;
use std::error::Error as _;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connect failed")]
    ConnectFailed,
    #[error("device unreachable or in standby")]
    DeviceUnreachable,
    #[error("timed out")]
    Timeout,
    #[error("transport error {0}")]
    Other(u16),
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::Other(_))
    }
}

/// HTTP method as it appears in static command tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Put,
    Post,
    Head,
}

impl Verb {
    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Put => Method::PUT,
            Verb::Post => Method::POST,
            Verb::Head => Method::HEAD,
        }
    }
}

/// One HTTP round trip against a device resource.
///
/// `path` is relative to the device base URL and may carry a query string
/// (`levels/room?volume=52`).
pub trait Transport {
    fn request(&self, method: Method, path: &str) -> Result<Vec<u8>, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    http: Client,
    retries: u8,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration, retries: u8) -> Result<Self> {
        let parsed = Url::parse(base_url).context("parsing device base URL")?;
        let http = Client::builder()
            .user_agent(HeaderValue::from_static("streamctl/0.1"))
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            base_url: parsed,
            http,
            retries,
        })
    }

    fn send_once(&self, method: &Method, url: &Url) -> Result<Vec<u8>, TransportError> {
        let response = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|err| classify(&err))?;

        let body = response.bytes().map_err(|err| classify(&err))?;
        Ok(body.to_vec())
    }
}

impl Transport for HttpTransport {
    fn request(&self, method: Method, path: &str) -> Result<Vec<u8>, TransportError> {
        let normalized = path.trim_start_matches('/');
        let url = self.base_url.join(normalized).map_err(|err| {
            warn!(path, %err, "cannot join path to device URL");
            TransportError::Other(0)
        })?;

        let mut attempt: u8 = 0;
        loop {
            debug!(%method, %url, attempt, "device request");
            match self.send_once(&method, &url) {
                Ok(body) => {
                    debug!(bytes = body.len(), "device response");
                    return Ok(body);
                }
                Err(err) if err.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    warn!(%url, %err, "retrying device request");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn classify(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    if let Some(status) = err.status() {
        return TransportError::Other(status.as_u16());
    }
    if err.is_connect() {
        return match io_kind(err) {
            Some(io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset) => {
                TransportError::DeviceUnreachable
            }
            _ => TransportError::ConnectFailed,
        };
    }
    TransportError::Other(0)
}

fn io_kind(err: &reqwest::Error) -> Option<io::ErrorKind> {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = cause.source();
    }
    None
}

/// GET a resource and parse its body as JSON.
pub fn fetch_json(transport: &dyn Transport, path: &str) -> Result<Value, CtlError> {
    let body = transport.request(Method::GET, path)?;
    Ok(query::parse(&body)?)
}

/// PUT a single `field=value` assignment on a resource.
pub fn write_field(
    transport: &dyn Transport,
    resource: &str,
    field: &str,
    value: i64,
) -> Result<(), CtlError> {
    let path = format!("{resource}?{field}={value}");
    debug!(%path, "writing field");
    transport.request(Method::PUT, &path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::net::TcpListener;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(base, Duration::from_secs(2), 0).unwrap()
    }

    #[test]
    fn gets_json_from_resource() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/levels/room")
                .header("accept", "application/json");
            then.status(200).json_body(json!({"volume": 42}));
        });

        let t = transport(&server.base_url());
        let doc = fetch_json(&t, "levels/room").unwrap();

        mock.assert();
        assert_eq!(doc["volume"], 42);
    }

    #[test]
    fn writes_field_as_query_assignment() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/levels/room")
                .query_param("volume", "52");
            then.status(200);
        });

        let t = transport(&server.base_url());
        write_field(&t, "levels/room", "volume", 52).unwrap();

        mock.assert();
    }

    #[test]
    fn head_request_succeeds_without_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::HEAD).path("/power");
            then.status(200);
        });

        let t = transport(&server.base_url());
        let body = t.request(reqwest::Method::HEAD, "power").unwrap();

        mock.assert();
        assert!(body.is_empty());
    }

    #[test]
    fn http_status_maps_to_other() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/update");
            then.status(500);
        });

        let t = transport(&server.base_url());
        let err = t.request(reqwest::Method::GET, "update").unwrap_err();
        assert_eq!(err, TransportError::Other(500));
        assert!(!err.is_retryable());
    }

    #[test]
    fn slow_device_maps_to_timeout() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/nowplaying");
            then.status(200)
                .delay(Duration::from_millis(800))
                .json_body(json!({}));
        });

        let t = HttpTransport::new(&server.base_url(), Duration::from_millis(150), 0).unwrap();
        let err = t.request(reqwest::Method::GET, "nowplaying").unwrap_err();
        assert_eq!(err, TransportError::Timeout);
    }

    #[test]
    fn refused_connection_maps_to_unreachable() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let t = HttpTransport::new(
            &format!("http://127.0.0.1:{port}/"),
            Duration::from_secs(1),
            1,
        )
        .unwrap();
        let err = t.request(reqwest::Method::GET, "power").unwrap_err();
        assert_eq!(err, TransportError::DeviceUnreachable);
    }

    #[test]
    fn timeout_is_retried_once_when_enabled() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/power");
            then.status(200)
                .delay(Duration::from_millis(600))
                .json_body(json!({}));
        });

        let t = HttpTransport::new(&server.base_url(), Duration::from_millis(150), 1).unwrap();
        let err = t.request(reqwest::Method::GET, "power").unwrap_err();

        assert_eq!(err, TransportError::Timeout);
        assert_eq!(mock.hits(), 2);
    }

    #[test]
    fn no_retry_by_default() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/power");
            then.status(200)
                .delay(Duration::from_millis(600))
                .json_body(json!({}));
        });

        let t = HttpTransport::new(&server.base_url(), Duration::from_millis(150), 0).unwrap();
        let err = t.request(reqwest::Method::GET, "power").unwrap_err();

        assert_eq!(err, TransportError::Timeout);
        assert_eq!(mock.hits(), 1);
    }

    #[test]
    fn status_errors_are_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/update");
            then.status(503);
        });

        let t = HttpTransport::new(&server.base_url(), Duration::from_secs(2), 1).unwrap();
        let err = t.request(reqwest::Method::GET, "update").unwrap_err();

        assert_eq!(err, TransportError::Other(503));
        assert_eq!(mock.hits(), 1);
    }

    #[test]
    fn non_json_body_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/system");
            then.status(200).body("<html>busy</html>");
        });

        let t = transport(&server.base_url());
        let err = fetch_json(&t, "system").unwrap_err();
        assert!(matches!(err, CtlError::InvalidJson(_)));
    }
}
