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

//! Core components of the reqmns client.
//!
//! This crate turns one remote MNS operation into a signed HTTP exchange and
//! hands the outcome back either blocking or asynchronously. The transport
//! itself is pluggable through [`HttpSend`].
//!
//! ## Overview
//!
//! - [`RequestMessage`] / [`ResponseMessage`]: what goes over the wire.
//! - [`RequestSigner`]: the `Authorization: MNS <id>:<signature>` scheme.
//! - [`ActionDef`]: a request builder and parsers bound to one operation.
//! - [`Action`]: runs an `ActionDef` on a [`Client`].
//! - [`AsyncResult`]: the handle of an in-flight call.
//!
//! ## Example
//!
//! ```no_run
//! use reqmns_core::{
//!     parse_error_envelope, parse_xml_body, Action, ActionDef, Client, Config, Context,
//!     OsEnv, RequestMessage, ResponseMessage, Result,
//! };
//! use http::Method;
//!
//! fn build(_: &()) -> Result<(RequestMessage, ())> {
//!     Ok((RequestMessage::new(Method::GET, "/?accountmeta=true"), ()))
//! }
//!
//! fn parse(resp: &ResponseMessage, _: &()) -> Result<String> {
//!     let root = parse_xml_body(resp)?;
//!     Ok(root.text_or("LoggingBucket", Some("")).unwrap_or_default().to_string())
//! }
//!
//! const GET_LOGGING_BUCKET: ActionDef<(), String> = ActionDef {
//!     name: "GetAccountMeta",
//!     method: Method::GET,
//!     build_request: build,
//!     parse_result: Some(parse),
//!     parse_error: parse_error_envelope,
//! };
//!
//! # async fn example(http: impl reqmns_core::HttpSend) -> Result<()> {
//! let ctx = Context::new().with_env(OsEnv).with_http_send(http);
//! let config = Config::default().from_env(&ctx);
//! let client = Client::new(ctx, config)?;
//!
//! let action = Action::new(client, GET_LOGGING_BUCKET);
//! let bucket = action.call(&()).await?;
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod constants;
pub mod hash;
pub mod time;
pub mod utils;
pub mod xml;

mod error;
pub use error::{Error, ErrorCategory, ErrorKind, ItemFailure, Result, UNKNOWN_CODE};
mod context;
pub use context::{Context, Env, HttpSend, NoopEnv, NoopHttpSend, OsEnv, StaticEnv};
mod config;
pub use config::Config;
mod message;
pub use message::{RequestMessage, ResponseMessage};

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod credential;
pub use credential::{Credential, StaticCredentialProvider};
mod signer;
pub use signer::Signer;
mod sign_request;
pub use sign_request::{canonicalize_headers, string_to_sign, RequestSigner};

mod parse;
pub use parse::{
    parse_error_envelope, parse_xml_body, ErrorEnvelope, ParseError, ParseResult,
};
mod async_result;
pub use async_result::{AsyncResult, Callback};
mod client;
pub use client::Client;
mod action;
pub use action::{Action, ActionDef, BuildRequest};
