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
    Context, Error, ErrorKind, ProvideCredential, RequestMessage, Result, SignRequest,
    SigningCredential,
};
use log::debug;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};

/// Signer binds one credential provider to one signature scheme.
///
/// The resolved credential is cached until it's no longer valid. Every failure
/// while resolving it or computing the signature is reported as
/// [`ErrorKind::SignatureFailed`].
#[derive(Clone)]
pub struct Signer<K: SigningCredential> {
    ctx: Context,
    provider: Arc<dyn ProvideCredential<Credential = K>>,
    scheme: Arc<dyn SignRequest<Credential = K>>,
    credential: Arc<Mutex<Option<K>>>,
}

impl<K: SigningCredential> Debug for Signer<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("provider", &self.provider)
            .field("scheme", &self.scheme)
            .finish()
    }
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        provider: impl ProvideCredential<Credential = K>,
        scheme: impl SignRequest<Credential = K>,
    ) -> Self {
        Self {
            ctx,
            provider: Arc::new(provider),
            scheme: Arc::new(scheme),
            credential: Arc::new(Mutex::new(None)),
        }
    }

    /// Replace the signature scheme, keeping the credential provider.
    pub fn with_scheme(mut self, scheme: impl SignRequest<Credential = K>) -> Self {
        self.scheme = Arc::new(scheme);
        self
    }

    /// Sign the request.
    pub async fn sign(&self, req: &mut RequestMessage) -> Result<()> {
        let cached = self.credential.lock().expect("lock poisoned").clone();
        let credential = if cached.is_valid() {
            cached
        } else {
            debug!("resolving credential from {:?}", self.provider);
            let resolved = self
                .provider
                .provide_credential(&self.ctx)
                .await
                .map_err(|e| {
                    Error::signature_failed("failed to resolve credential").with_source(e)
                })?;
            *self.credential.lock().expect("lock poisoned") = resolved.clone();
            resolved
        };

        let Some(credential) = credential else {
            return Err(Error::signature_failed(
                "credential provider returned no credential",
            ));
        };

        self.scheme
            .sign_request(&self.ctx, req, &credential)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::SignatureFailed => e,
                _ => Error::signature_failed("failed to sign request").with_source(e),
            })
    }
}
