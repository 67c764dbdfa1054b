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

use crate::{
    Config, Context, Credential, ProvideCredential, RequestMessage, RequestSigner, Result, Signer,
    StaticCredentialProvider,
};
use log::{debug, warn};
use std::sync::Arc;

/// Client holds everything the actions of one endpoint share: the runtime
/// context, the config and the signer.
///
/// Credentials are resolved in this order:
///
/// - the static key pair in [`Config`]
/// - a provider set by [`Client::with_credential_provider`]
///
/// With neither, requests are sent unsigned.
///
/// Client is cheap to clone and safe to share across threads.
#[derive(Clone, Debug)]
pub struct Client {
    ctx: Context,
    config: Arc<Config>,
    signer: Option<Signer<Credential>>,
}

impl Client {
    /// Create a new client.
    ///
    /// Fails with `ConfigInvalid` if the endpoint isn't an absolute http(s) url.
    pub fn new(ctx: Context, config: Config) -> Result<Self> {
        config.validate()?;

        let signer = config.static_key_pair().map(|(ak, sk)| {
            let mut provider = StaticCredentialProvider::new(ak, sk);
            if let Some(token) = config.security_token.as_deref() {
                provider = provider.with_security_token(token);
            }
            Signer::new(ctx.clone(), provider, RequestSigner::new())
        });

        Ok(Self {
            ctx,
            config: Arc::new(config),
            signer,
        })
    }

    /// Resolve credentials from the given provider.
    ///
    /// Ignored if a static key pair is configured.
    pub fn with_credential_provider(
        mut self,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        if self.config.static_key_pair().is_some() {
            warn!("static key pair configured, ignoring credential provider {provider:?}");
            return self;
        }

        self.signer = Some(Signer::new(self.ctx.clone(), provider, RequestSigner::new()));
        self
    }

    /// Replace the signer entirely.
    pub fn with_signer(mut self, signer: Signer<Credential>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// The runtime context.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The signer, `None` if requests are sent unsigned.
    pub fn signer(&self) -> Option<&Signer<Credential>> {
        self.signer.as_ref()
    }

    pub(crate) async fn sign(&self, req: &mut RequestMessage) -> Result<()> {
        match &self.signer {
            Some(signer) => signer.sign(req).await,
            None => {
                debug!(
                    "no credential configured, sending {} {} unsigned",
                    req.method(),
                    req.resource_path()
                );
                Ok(())
            }
        }
    }
}
