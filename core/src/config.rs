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

use crate::constants::*;
use crate::{Context, Error, Result};
use std::time::Duration;

/// Config carries all the configuration of a client.
#[derive(Clone, Debug)]
pub struct Config {
    /// `endpoint` will be loaded from
    ///
    /// - this field if it's not empty
    /// - env value: [`ALIBABA_CLOUD_MNS_ENDPOINT`]
    pub endpoint: String,
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// `access_key_secret` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ACCESS_KEY_SECRET`]
    pub access_key_secret: Option<String>,
    /// `security_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_SECURITY_TOKEN`]
    pub security_token: Option<String>,
    /// Socket read timeout of the transport.
    ///
    /// Also the default time a blocking call waits for its response.
    pub socket_timeout: Duration,
    /// Connection timeout of the transport.
    pub connection_timeout: Duration,
    /// Generate a request id per action and send it with every call.
    pub generate_request_id: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_key_id: None,
            access_key_secret: None,
            security_token: None,
            socket_timeout: Duration::from_secs(33),
            connection_timeout: Duration::from_secs(30),
            generate_request_id: false,
        }
    }
}

impl Config {
    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if self.endpoint.is_empty() {
            if let Some(v) = ctx.env_var(ALIBABA_CLOUD_MNS_ENDPOINT) {
                self.endpoint = v;
            }
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_ACCESS_KEY_ID) {
            self.access_key_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_ACCESS_KEY_SECRET) {
            self.access_key_secret.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_SECURITY_TOKEN) {
            self.security_token.get_or_insert(v);
        }

        self
    }

    /// The static key pair, if both halves are configured.
    pub fn static_key_pair(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.access_key_secret) {
            (Some(id), Some(secret)) => Some((id, secret)),
            _ => None,
        }
    }

    /// Check the endpoint is an absolute http(s) url.
    pub fn validate(&self) -> Result<()> {
        let uri: http::Uri = self.endpoint.parse().map_err(|e| {
            Error::config_invalid(format!("endpoint {:?} is not a valid url", self.endpoint))
                .with_source(e)
        })?;
        match uri.scheme_str() {
            Some("http") | Some("https") if uri.authority().is_some() => Ok(()),
            _ => Err(Error::config_invalid(format!(
                "endpoint {:?} must be an absolute http or https url",
                self.endpoint
            ))),
        }
    }
}
