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

//! Result and exception parser contracts.
//!
//! Parsers are plain functions of the response. They hold no state, so one
//! action can serve any number of concurrent calls.

use crate::xml::XmlElement;
use crate::{Error, ResponseMessage, Result};
use log::warn;
use serde::Deserialize;

/// Maximum characters of a body kept in error context.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Response header carrying the service side request id.
const RESPONSE_REQUEST_ID: &str = "x-mns-request-id";

/// Parses a successful response into a typed value.
///
/// `C` is the per-call context produced by the request builder of the same call.
pub type ParseResult<V, C> = fn(&ResponseMessage, &C) -> Result<V>;

/// Parses a failed response into a structured error.
pub type ParseError = fn(&ResponseMessage) -> Error;

/// ErrorEnvelope is the universal failure payload of the service.
///
/// ```xml
/// <Error xmlns="http://mns.aliyuncs.com/doc/v1/">
///   <Code>QueueNotExist</Code>
///   <Message>The queue name you provided is not exist.</Message>
///   <RequestId>5C5D5C1D8A3C8A4A0A000001</RequestId>
///   <HostId>http://1234.mns.cn-hangzhou.aliyuncs.com</HostId>
/// </Error>
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorEnvelope {
    /// Service error code.
    pub code: String,
    /// Human readable message.
    #[serde(default)]
    pub message: String,
    /// Request id assigned by the service.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Host that served the request.
    #[serde(default)]
    pub host_id: Option<String>,
}

impl ErrorEnvelope {
    /// Decode the envelope from a response body.
    pub fn from_xml(body: &[u8]) -> Result<Self> {
        let body = std::str::from_utf8(body).map_err(|e| {
            Error::response_unparsable("error body is not valid utf-8").with_source(e)
        })?;
        quick_xml::de::from_str(body).map_err(|e| {
            Error::response_unparsable("failed to decode error envelope").with_source(e)
        })
    }

    /// Turn the envelope into a service error.
    pub fn into_error(self) -> Error {
        let mut err = Error::service(self.code, self.message);
        if let Some(request_id) = self.request_id {
            err = err.with_request_id(request_id);
        }
        if let Some(host_id) = self.host_id {
            err = err.with_host_id(host_id);
        }
        err
    }
}

/// The default exception parser: decode the [`ErrorEnvelope`].
///
/// A body that can't be decoded becomes a `ResponseUnparsable` error carrying
/// the status and the head of the body.
pub fn parse_error_envelope(resp: &ResponseMessage) -> Error {
    match ErrorEnvelope::from_xml(resp.body()) {
        Ok(envelope) => {
            let mut err = envelope.into_error();
            if err.request_id().is_none() {
                if let Some(request_id) = resp.header(RESPONSE_REQUEST_ID) {
                    err = err.with_request_id(request_id);
                }
            }
            err.with_context(format!("status: {}", resp.status()))
        }
        Err(err) => {
            warn!(
                "failed to decode error response with status {}",
                resp.status()
            );
            unparsable_body(err, resp)
        }
    }
}

/// Parse the body of a response as an XML document.
pub fn parse_xml_body(resp: &ResponseMessage) -> Result<XmlElement> {
    XmlElement::parse(resp.body()).map_err(|e| unparsable_body(e, resp))
}

fn unparsable_body(err: Error, resp: &ResponseMessage) -> Error {
    let body = String::from_utf8_lossy(resp.body());
    err.with_context(format!("status: {}", resp.status()))
        .with_context(format!("body: {}", truncate_str(&body, MAX_ERROR_BODY_CHARS)))
}

/// Truncates a string to at most `max_chars` characters on a valid UTF-8 boundary.
fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
