// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Request and response messages exchanged with the transport.

use crate::{Error, Result};
use bytes::Bytes;
use http::header::{HeaderName, AUTHORIZATION};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use std::collections::HashMap;
use std::str::FromStr;

/// RequestMessage is the outgoing request of one call.
///
/// It is mutated while the request is constructed and signed, and never
/// touched again once handed to the transport.
#[derive(Debug, Clone)]
pub struct RequestMessage {
    method: Method,
    endpoint: String,
    resource_path: String,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
}

impl RequestMessage {
    /// Create a request for the resource path, relative to the endpoint.
    ///
    /// The path may carry a query suffix like `/?accountmeta=true`.
    pub fn new(method: Method, resource_path: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: String::new(),
            resource_path: resource_path.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Attach a body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attach a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The endpoint this request targets.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The resource path relative to the endpoint.
    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    /// All headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// The body, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Declared content length of the body.
    pub fn content_length(&self) -> usize {
        self.body.as_ref().map(|v| v.len()).unwrap_or_default()
    }

    /// Lookup a header, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Check whether a header is set, ignoring ASCII case.
    pub fn contains_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Set a header, replacing any existing header of the same name
    /// regardless of its case.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    pub(crate) fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub(crate) fn set_endpoint(&mut self, endpoint: &str) {
        self.endpoint = endpoint.to_string();
    }

    pub(crate) fn set_resource_path(&mut self, resource_path: String) {
        self.resource_path = resource_path;
    }

    /// The resource used in the canonical string: endpoint path joined with
    /// the resource path by exactly one slash.
    pub fn canonicalized_resource(&self) -> String {
        join_path(endpoint_path(&self.endpoint), &self.resource_path)
    }

    /// The full url of this request.
    pub fn url(&self) -> String {
        join_path(&self.endpoint, &self.resource_path)
    }

    /// Convert into the request handed to the transport.
    pub fn to_http_request(&self) -> Result<http::Request<Bytes>> {
        let mut req = http::Request::builder()
            .method(self.method.clone())
            .uri(self.url())
            .body(self.body.clone().unwrap_or_default())?;

        let headers = req.headers_mut();
        for (k, v) in &self.headers {
            let name = HeaderName::from_str(k)?;
            let mut value = HeaderValue::from_str(v)?;
            if name == AUTHORIZATION {
                value.set_sensitive(true);
            }
            headers.insert(name, value);
        }

        Ok(req)
    }
}

/// Join two path segments with exactly one slash.
pub(crate) fn join_path(base: &str, sub: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        sub.trim_start_matches('/')
    )
}

/// Path component of an endpoint url, empty if it has none.
fn endpoint_path(endpoint: &str) -> &str {
    let rest = endpoint
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(endpoint);
    rest.find('/').map(|idx| &rest[idx..]).unwrap_or("")
}

/// ResponseMessage is created by the transport and read-only to parsers.
#[derive(Debug, Clone)]
pub struct ResponseMessage {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ResponseMessage {
    /// Create a new response.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Check if the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// All headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Lookup a header as string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as utf-8.
    pub fn body_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.body).map_err(|e| {
            Error::response_unparsable("response body is not valid utf-8").with_source(e)
        })
    }
}

impl From<http::Response<Bytes>> for ResponseMessage {
    fn from(resp: http::Response<Bytes>) -> Self {
        let (parts, body) = resp.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }
}
