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

//! The execution engine shared by every operation.

use crate::async_result::{AsyncResult, Callback};
use crate::constants::{
    CONTENT_TYPE, DATE, DEFAULT_CONTENT_TYPE, MNS_VERSION, MNS_VERSION_HEADER, REQUEST_ID_HEADER,
};
use crate::parse::{ParseError, ParseResult};
use crate::time::{format_http_date, now};
use crate::{Client, Error, RequestMessage, ResponseMessage, Result};
use http::Method;
use log::{debug, warn};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

/// Turn a request into the message to send, plus the context its result
/// parser needs.
pub type BuildRequest<Req, C> = fn(&Req) -> Result<(RequestMessage, C)>;

/// ActionDef is the static description of one remote operation.
///
/// `C` is threaded from the request builder to the result parser of the same
/// call, so per-call choices never leak between concurrent calls.
pub struct ActionDef<Req, V, C = ()> {
    /// Operation name, used in logs.
    pub name: &'static str,
    /// HTTP method of the operation. Requests always go out with it.
    pub method: Method,
    /// Request builder.
    pub build_request: BuildRequest<Req, C>,
    /// Parser of 2xx responses. `None` resolves to `V::default()`.
    pub parse_result: Option<ParseResult<V, C>>,
    /// Parser of every other response.
    pub parse_error: ParseError,
}

impl<Req, V, C> Clone for ActionDef<Req, V, C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            method: self.method.clone(),
            build_request: self.build_request,
            parse_result: self.parse_result,
            parse_error: self.parse_error,
        }
    }
}

impl<Req, V, C> Debug for ActionDef<Req, V, C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDef")
            .field("name", &self.name)
            .field("method", &self.method)
            .finish()
    }
}

/// Action binds one operation to a client.
///
/// It's immutable after construction and safe to share: concurrent calls on
/// the same action never observe each other.
pub struct Action<Req, V, C = ()> {
    def: ActionDef<Req, V, C>,
    client: Client,
    request_id: Option<String>,
}

impl<Req, V, C> Clone for Action<Req, V, C> {
    fn clone(&self) -> Self {
        Self {
            def: self.def.clone(),
            client: self.client.clone(),
            request_id: self.request_id.clone(),
        }
    }
}

impl<Req, V, C> Debug for Action<Req, V, C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("def", &self.def)
            .field("endpoint", &self.client.config().endpoint)
            .field("request_id", &self.request_id)
            .finish()
    }
}

impl<Req, V, C> Action<Req, V, C>
where
    Req: 'static,
    V: Clone + Default + Send + 'static,
    C: Send + 'static,
{
    /// Create a new action.
    ///
    /// A request id is generated here if the client is configured to, and sent
    /// with every call of this action.
    pub fn new(client: Client, def: ActionDef<Req, V, C>) -> Self {
        let request_id = client
            .config()
            .generate_request_id
            .then(|| uuid::Uuid::new_v4().to_string());

        Self {
            def,
            client,
            request_id,
        }
    }

    /// Operation name.
    pub fn name(&self) -> &'static str {
        self.def.name
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.def.method
    }

    /// The request id of this action, if enabled.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// The client this action runs on.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Build the request message of `req`, relative to the configured endpoint.
    ///
    /// An absolute resource path must start with the endpoint, otherwise this
    /// fails with `InvalidArgument`. The method is always the action's own.
    pub fn build_request_message(&self, req: &Req) -> Result<(RequestMessage, C)> {
        let (mut msg, ctx) =
            (self.def.build_request)(req).map_err(|e| e.or_request_id(self.request_id()))?;

        if *msg.method() != self.def.method {
            debug!(
                "action {} builder returned method {}, using {}",
                self.def.name,
                msg.method(),
                self.def.method
            );
            msg.set_method(self.def.method.clone());
        }

        let endpoint = self.client.config().endpoint.as_str();
        let path = msg.resource_path();
        if path.starts_with("http://") || path.starts_with("https://") {
            let relative = path
                .strip_prefix(endpoint.trim_end_matches('/'))
                .filter(|v| v.is_empty() || v.starts_with('/') || v.starts_with('?'));
            let Some(relative) = relative else {
                return Err(Error::invalid_argument(format!(
                    "resource path {path:?} doesn't match endpoint {endpoint:?}"
                ))
                .or_request_id(self.request_id()));
            };
            let relative = relative.to_string();
            msg.set_resource_path(relative);
        }
        msg.set_endpoint(endpoint);

        Ok((msg, ctx))
    }

    /// Call the operation and block until it completes.
    ///
    /// # Notes
    ///
    /// Must not be called from a thread that drives the runtime of the client.
    pub fn execute(&self, req: &Req) -> Result<V> {
        self.execute_with_headers(req, None)
    }

    /// Call the operation with custom headers and block until it completes.
    ///
    /// Custom headers overwrite the headers the engine sets, `Date` and
    /// `Content-Type` included, and are covered by the signature.
    pub fn execute_with_headers(
        &self,
        req: &Req,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<V> {
        self.execute_async_with(req, headers, None)?.get()
    }

    /// Dispatch the operation without waiting for it.
    pub fn execute_async(&self, req: &Req) -> Result<AsyncResult<V>> {
        self.execute_async_with(req, None, None)
    }

    /// Dispatch the operation with optional custom headers and callback.
    ///
    /// Errors raised before dispatch are returned directly and never reach
    /// the callback. Everything after that completes the returned handle, and
    /// the callback runs exactly once with the same outcome.
    pub fn execute_async_with(
        &self,
        req: &Req,
        headers: Option<&HashMap<String, String>>,
        callback: Option<Callback<V>>,
    ) -> Result<AsyncResult<V>> {
        let (mut msg, ctx) = self.build_request_message(req)?;
        self.inject_headers(&mut msg);
        if let Some(headers) = headers {
            for (k, v) in headers {
                msg.set_header(k.as_str(), v.as_str());
            }
        }

        let runtime = self
            .client
            .context()
            .runtime()
            .map_err(|e| e.or_request_id(self.request_id()))?;

        let handle = AsyncResult::new(
            self.client.config().socket_timeout,
            self.request_id.clone(),
            callback,
        );

        debug!(
            "action {} dispatching {} {}",
            self.def.name,
            msg.method(),
            msg.url()
        );
        let task = Dispatch {
            def: self.def.clone(),
            client: self.client.clone(),
            request_id: self.request_id.clone(),
        };
        let name = self.def.name;
        let request_id = self.request_id.clone();
        let inner = runtime.spawn(async move { task.run(msg, ctx).await });
        handle.set_abort_handle(inner.abort_handle());

        // The supervisor outlives a panicking call so the handle always completes.
        let completer = handle.clone();
        runtime.spawn(async move {
            let result = match inner.await {
                Ok(result) => result,
                Err(err) if err.is_panic() => {
                    let message = panic_message(err.into_panic());
                    warn!("action {name} panicked: {message}");
                    Err(Error::unexpected(message)
                        .with_context(format!("action: {name}"))
                        .or_request_id(request_id.as_deref()))
                }
                Err(_) => Err(Error::cancelled("call was cancelled")
                    .with_context(format!("action: {name}"))
                    .or_request_id(request_id.as_deref())),
            };
            if !completer.complete(result) {
                debug!("action {name} already completed, dropping late outcome");
            }
        });

        Ok(handle)
    }

    /// Call the operation and wait for it without blocking the thread.
    pub async fn call(&self, req: &Req) -> Result<V> {
        self.execute_async(req)?.wait().await
    }

    fn inject_headers(&self, msg: &mut RequestMessage) {
        msg.set_header(MNS_VERSION_HEADER, MNS_VERSION);
        if !msg.contains_header(DATE) {
            msg.set_header(DATE, format_http_date(now()));
        }
        if !msg.contains_header(CONTENT_TYPE) {
            msg.set_header(CONTENT_TYPE, DEFAULT_CONTENT_TYPE);
        }
        if let Some(request_id) = &self.request_id {
            msg.set_header(REQUEST_ID_HEADER, request_id.as_str());
        }
    }
}

/// The part of an action that runs on the runtime.
struct Dispatch<Req, V, C> {
    def: ActionDef<Req, V, C>,
    client: Client,
    request_id: Option<String>,
}

impl<Req, V: Default, C> Dispatch<Req, V, C> {
    async fn run(&self, mut msg: RequestMessage, ctx: C) -> Result<V> {
        self.send(&mut msg, ctx).await.map_err(|e| {
            if e.is_local() {
                e.or_request_id(self.request_id.as_deref())
            } else {
                e
            }
        })
    }

    async fn send(&self, msg: &mut RequestMessage, ctx: C) -> Result<V> {
        self.client.sign(msg).await?;

        let req = msg.to_http_request()?;
        let resp = ResponseMessage::from(self.client.context().http_send(req).await?);
        debug!(
            "action {} got response status {}",
            self.def.name,
            resp.status()
        );

        if !resp.is_success() {
            return Err((self.def.parse_error)(&resp));
        }
        match self.def.parse_result {
            Some(parse) => parse(&resp, &ctx),
            None => Ok(V::default()),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        return (*s).to_string();
    }
    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(_) => "call panicked".to_string(),
    }
}
