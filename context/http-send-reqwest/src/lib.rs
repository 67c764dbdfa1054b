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

//! Reqwest based transport for reqmns.
//!
//! ```no_run
//! use reqmns_core::{Config, Context, OsEnv};
//! use reqmns_http_send_reqwest::ReqwestHttpSend;
//!
//! # fn example() -> reqmns_core::Result<()> {
//! let config = Config::default().from_env(&Context::new().with_env(OsEnv));
//! let ctx = Context::new()
//!     .with_env(OsEnv)
//!     .with_http_send(ReqwestHttpSend::from_config(&config)?);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use log::debug;
use reqmns_core::{Config, Error, HttpSend, Result};
use reqwest::{Client, Request};

/// ReqwestHttpSend sends requests with a shared [`reqwest::Client`].
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a new ReqwestHttpSend with the timeouts of the config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connection_timeout)
            .timeout(config.socket_timeout)
            .build()
            .map_err(|e| Error::config_invalid("failed to build http client").with_source(e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let req = Request::try_from(req)
            .map_err(|e| Error::invalid_argument("invalid http request").with_source(e))?;
        debug!("sending {} {}", req.method(), req.url());

        let resp: http::Response<_> = self.client.execute(req).await.map_err(to_error)?.into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(to_error)?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

fn to_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        return Error::timeout("http request timed out").with_source(err);
    }

    let msg = if err.is_connect() {
        "failed to connect"
    } else if err.is_body() || err.is_decode() {
        "failed to read response body"
    } else {
        "http request failed"
    };
    Error::transport(msg).with_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqmns_core::ErrorKind;
    use std::time::Duration;

    #[test]
    fn test_from_config() {
        let config = Config {
            endpoint: "http://127.0.0.1:1".to_string(),
            connection_timeout: Duration::from_millis(100),
            ..Default::default()
        };
        assert!(ReqwestHttpSend::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_connect_failure_is_transport_error() {
        let config = Config {
            endpoint: "http://127.0.0.1:1".to_string(),
            connection_timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let send = ReqwestHttpSend::from_config(&config).unwrap();

        let req = http::Request::builder()
            .method("GET")
            .uri("http://127.0.0.1:1/queues")
            .body(Bytes::new())
            .unwrap();
        let err = send.http_send(req).await.unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::Transport | ErrorKind::Timeout
        ));
        assert!(err.is_local());
        assert_eq!(err.code(), reqmns_core::UNKNOWN_CODE);
    }
}
