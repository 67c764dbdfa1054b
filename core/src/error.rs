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

use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Code used by local errors that have no more specific code.
pub const UNKNOWN_CODE: &str = "Unknown";

/// Result that is a wrapper of `Result<T, reqmns_core::Error>`
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Local arguments are invalid, detected before any network activity.
    InvalidArgument,
    /// Configuration error (missing fields, invalid values, missing runtime).
    ConfigInvalid,
    /// The credential could not be resolved or the signature could not be computed.
    SignatureFailed,
    /// The transport failed to deliver the request or read the response.
    Transport,
    /// The call did not complete within the configured wait timeout.
    Timeout,
    /// The call was cancelled before it completed.
    Cancelled,
    /// The response body could not be decoded.
    ResponseUnparsable,
    /// Unexpected local errors.
    Unexpected,
    /// The service reported an error through the error envelope.
    Service,
    /// The service reported per-item failures that the caller must handle.
    MandatoryHandling,
}

/// The three error severities callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Raised locally: transport, timeout, signing, parsing or argument failures.
    Local,
    /// Decoded from the service error envelope.
    Service,
    /// Partial failures that must not be ignored silently.
    MandatoryHandling,
}

impl ErrorKind {
    /// Map this kind onto its severity category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::Service => ErrorCategory::Service,
            ErrorKind::MandatoryHandling => ErrorCategory::MandatoryHandling,
            _ => ErrorCategory::Local,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidArgument => write!(f, "invalid argument"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::SignatureFailed => write!(f, "signature computation failed"),
            ErrorKind::Transport => write!(f, "transport error"),
            ErrorKind::Timeout => write!(f, "timed out"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
            ErrorKind::ResponseUnparsable => write!(f, "response unparsable"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
            ErrorKind::Service => write!(f, "service error"),
            ErrorKind::MandatoryHandling => write!(f, "service error requires handling"),
        }
    }
}

/// One failed item of a batch operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemFailure {
    /// Error code reported for this item.
    pub code: String,
    /// Error message reported for this item.
    pub message: String,
    /// The key identifying the item, for example a receipt handle.
    pub key: Option<String>,
}

/// Errors that returned by reqmns.
///
/// The error is cheap to clone so a completed [`crate::AsyncResult`] can hand it
/// out any number of times.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    code: String,
    message: String,
    request_id: Option<String>,
    host_id: Option<String>,
    context: Vec<String>,
    failures: Vec<ItemFailure>,
    source: Option<Arc<anyhow::Error>>,
}

impl Error {
    /// Create a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: UNKNOWN_CODE.to_string(),
            message: message.into(),
            request_id: None,
            host_id: None,
            context: Vec::new(),
            failures: Vec::new(),
            source: None,
        }
    }

    /// Add a source error.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(Arc::new(source.into()));
        self
    }

    /// Add a context line for debugging.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Set the request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Set the host id.
    pub fn with_host_id(mut self, host_id: impl Into<String>) -> Self {
        self.host_id = Some(host_id.into());
        self
    }

    /// Set the per-item failures.
    pub fn with_failures(mut self, failures: Vec<ItemFailure>) -> Self {
        self.failures = failures;
        self
    }

    /// Attach the request id only if the error doesn't carry one yet.
    pub(crate) fn or_request_id(mut self, request_id: Option<&str>) -> Self {
        if self.request_id.is_none() {
            self.request_id = request_id.map(|v| v.to_string());
        }
        self
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Get the error code.
    ///
    /// Service errors carry the service's own code, local errors default to [`UNKNOWN_CODE`].
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the request id.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Get the host id reported by the service.
    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    /// Get the context lines.
    pub fn context(&self) -> &[String] {
        &self.context
    }

    /// Get the per-item failures of a mandatory-handling error.
    pub fn failures(&self) -> &[ItemFailure] {
        &self.failures
    }

    /// Check if this error was raised locally.
    pub fn is_local(&self) -> bool {
        self.category() == ErrorCategory::Local
    }

    /// Check if this error was reported by the service.
    pub fn is_service_error(&self) -> bool {
        self.category() != ErrorCategory::Local
    }
}

// Convenience constructors
impl Error {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Create a config invalid error.
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create a signature failed error.
    pub fn signature_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SignatureFailed, message)
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Create a cancelled error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// Create a response unparsable error.
    pub fn response_unparsable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResponseUnparsable, message)
    }

    /// Create an unexpected error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Create a service error with the service's own code.
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Service, message).with_code(code)
    }

    /// Create a mandatory handling error with the given item failures.
    pub fn mandatory_handling(message: impl Into<String>, failures: Vec<ItemFailure>) -> Self {
        Self::new(ErrorKind::MandatoryHandling, message).with_failures(failures)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.kind, self.code)?;

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, ", request_id: {request_id}")?;
        }
        if let Some(host_id) = &self.host_id {
            write!(f, ", host_id: {host_id}")?;
        }
        if !self.failures.is_empty() {
            write!(f, ", failed items: {}", self.failures.len())?;
        }
        if !self.context.is_empty() {
            write!(f, ", context: {{ {} }}", self.context.join(", "))?;
        }
        if let Some(source) = &self.source {
            write!(f, ", source: {source}")?;
        }

        Ok(())
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // If alternate has been specified, we will print like Debug.
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("code", &self.code);
            de.field("message", &self.message);
            de.field("request_id", &self.request_id);
            de.field("host_id", &self.host_id);
            de.field("context", &self.context);
            de.field("failures", &self.failures);
            de.field("source", &self.source);
            return de.finish();
        }

        write!(f, "{self}")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|v| &**v as &(dyn std::error::Error + 'static))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::invalid_argument(err.to_string()).with_source(err)
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::invalid_argument(err.to_string()).with_source(err)
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::invalid_argument(err.to_string()).with_source(err)
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::invalid_argument(err.to_string()).with_source(err)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Self::response_unparsable(err.to_string()).with_source(err)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::response_unparsable(err.to_string()).with_source(err)
    }
}
