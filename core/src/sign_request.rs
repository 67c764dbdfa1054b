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

//! The MNS header signature scheme.

use crate::constants::{
    CANONICAL_HEADER_PREFIX, CONTENT_MD5, CONTENT_TYPE, DATE, SECURITY_TOKEN, SIGNATURE_SCHEME,
};
use crate::hash::base64_hmac_sha1;
use crate::{Context, Credential, RequestMessage, Result, SignRequest};
use async_trait::async_trait;
use http::header::AUTHORIZATION;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

/// RequestSigner implements the MNS header signature.
///
/// ```text
/// METHOD\nContent-MD5\nContent-Type\nDate\n<x-mns-* headers>\n<resource>
/// ```
///
/// The signature is the base64 encoded HMAC-SHA1 of that string, sent as
/// `Authorization: MNS <AccessKeyId>:<Signature>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestSigner;

impl RequestSigner {
    /// Create a new signer for the MNS header signature.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _: &Context,
        req: &mut RequestMessage,
        cred: &Credential,
    ) -> Result<()> {
        let string_to_sign = string_to_sign(req)?;
        debug!("calculated string to sign: {string_to_sign:?}");

        let signature = base64_hmac_sha1(
            cred.access_key_secret.as_bytes(),
            string_to_sign.as_bytes(),
        )?;

        if let Some(token) = cred.session_token() {
            req.set_header(SECURITY_TOKEN, token);
        }
        req.set_header(
            AUTHORIZATION.as_str(),
            format!("{SIGNATURE_SCHEME} {}:{signature}", cred.access_key_id),
        );

        Ok(())
    }
}

/// Canonicalize headers.
///
/// Keys carrying the `x-mns-` prefix (in any case) are lower-cased, all other
/// keys are kept as they are. The result is sorted by key in byte order.
/// Applying it twice yields the same map as applying it once.
pub fn canonicalize_headers(headers: &HashMap<String, String>) -> BTreeMap<String, String> {
    let mut canonical = BTreeMap::new();
    for (k, v) in headers {
        let lower = k.to_ascii_lowercase();
        if !lower.starts_with(CANONICAL_HEADER_PREFIX) {
            canonical.insert(k.clone(), v.clone());
            continue;
        }
        // On a case collision the already lower-cased key wins, so the
        // outcome doesn't depend on hash map iteration order.
        if k == &lower || !canonical.contains_key(&lower) {
            canonical.insert(lower, v.clone());
        }
    }
    canonical
}

/// Build the string to sign of the request.
pub fn string_to_sign(req: &RequestMessage) -> Result<String> {
    let canonical = canonicalize_headers(req.headers());

    let mut s = String::new();
    writeln!(&mut s, "{}", req.method().as_str())?;
    writeln!(&mut s, "{}", req.header(CONTENT_MD5).unwrap_or_default())?;
    writeln!(&mut s, "{}", req.header(CONTENT_TYPE).unwrap_or_default())?;
    writeln!(&mut s, "{}", req.header(DATE).unwrap_or_default())?;

    let service_headers = canonical
        .iter()
        .filter(|(k, _)| k.starts_with(CANONICAL_HEADER_PREFIX))
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>();
    writeln!(&mut s, "{}", service_headers.join("\n"))?;

    write!(&mut s, "{}", req.canonicalized_resource())?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::base64_hmac_sha1;
    use http::Method;
    use pretty_assertions::assert_eq;

    fn scenario_request() -> RequestMessage {
        RequestMessage::new(Method::GET, "/accountmeta=true")
            .with_header("Date", "Fri, 01 Jan 2021 00:00:00 GMT")
            .with_header("Content-Type", "text/xml;charset=UTF-8")
    }

    #[test]
    fn test_string_to_sign_without_service_headers() -> anyhow::Result<()> {
        let req = scenario_request();
        assert_eq!(
            string_to_sign(&req)?,
            "GET\n\ntext/xml;charset=UTF-8\nFri, 01 Jan 2021 00:00:00 GMT\n\n/accountmeta=true"
        );
        Ok(())
    }

    #[test]
    fn test_string_to_sign_with_service_headers() -> anyhow::Result<()> {
        let req = scenario_request()
            .with_header("X-MNS-Version", "2015-06-06")
            .with_header("x-mns-user-request-id", "rid")
            .with_header("Content-MD5", "md5")
            .with_header("x-other", "ignored");
        assert_eq!(
            string_to_sign(&req)?,
            "GET\nmd5\ntext/xml;charset=UTF-8\nFri, 01 Jan 2021 00:00:00 GMT\n\
             x-mns-user-request-id:rid\nx-mns-version:2015-06-06\n/accountmeta=true"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_request() -> anyhow::Result<()> {
        let mut req = scenario_request();
        let cred = Credential::new("AK", "SK");

        RequestSigner::new()
            .sign_request(&Context::new(), &mut req, &cred)
            .await?;

        let expected = base64_hmac_sha1(
            b"SK",
            b"GET\n\ntext/xml;charset=UTF-8\nFri, 01 Jan 2021 00:00:00 GMT\n\n/accountmeta=true",
        )?;
        assert_eq!(req.header("Authorization"), Some(format!("MNS AK:{expected}").as_str()));
        assert!(req.header(SECURITY_TOKEN).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_signature_ignores_insertion_order() -> anyhow::Result<()> {
        let pairs = [
            ("Date", "Fri, 01 Jan 2021 00:00:00 GMT"),
            ("Content-Type", "text/xml;charset=UTF-8"),
            ("x-mns-version", "2015-06-06"),
            ("X-Mns-Extra", "1"),
            ("x-mns-a", "2"),
        ];
        let mut forward = RequestMessage::new(Method::POST, "/queues/q/messages");
        for (k, v) in pairs.iter() {
            forward.set_header(*k, *v);
        }
        let mut backward = RequestMessage::new(Method::POST, "/queues/q/messages");
        for (k, v) in pairs.iter().rev() {
            backward.set_header(*k, *v);
        }
        assert_eq!(string_to_sign(&forward)?, string_to_sign(&backward)?);

        let cred = Credential::new("AK", "SK");
        let ctx = Context::new();
        RequestSigner.sign_request(&ctx, &mut forward, &cred).await?;
        RequestSigner.sign_request(&ctx, &mut backward, &cred).await?;
        assert_eq!(forward.header("Authorization"), backward.header("Authorization"));
        Ok(())
    }

    #[test]
    fn test_canonicalize_headers_is_idempotent() {
        let headers = HashMap::from([
            ("X-MNS-Version".to_string(), "2015-06-06".to_string()),
            ("x-mns-user-request-id".to_string(), "rid".to_string()),
            ("Content-Type".to_string(), "text/xml".to_string()),
            ("Date".to_string(), "now".to_string()),
        ]);
        let once = canonicalize_headers(&headers);
        let twice = canonicalize_headers(&once.clone().into_iter().collect());
        assert_eq!(once, twice);
        assert_eq!(
            once.keys().collect::<Vec<_>>(),
            vec!["Content-Type", "Date", "x-mns-user-request-id", "x-mns-version"]
        );
    }

    #[test]
    fn test_canonicalize_headers_collision_prefers_lowercase() {
        let headers = HashMap::from([
            ("X-MNS-A".to_string(), "upper".to_string()),
            ("x-mns-a".to_string(), "lower".to_string()),
        ]);
        let canonical = canonicalize_headers(&headers);
        assert_eq!(canonical.len(), 1);
        assert_eq!(canonical["x-mns-a"], "lower");
    }

    #[tokio::test]
    async fn test_session_token_header() -> anyhow::Result<()> {
        let ctx = Context::new();

        let mut req = scenario_request();
        let cred = Credential {
            security_token: Some("token".to_string()),
            ..Credential::new("AK", "SK")
        };
        RequestSigner.sign_request(&ctx, &mut req, &cred).await?;
        assert_eq!(req.header(SECURITY_TOKEN), Some("token"));

        let mut req = scenario_request();
        let cred = Credential {
            security_token: Some(String::new()),
            ..Credential::new("AK", "SK")
        };
        RequestSigner.sign_request(&ctx, &mut req, &cred).await?;
        assert!(!req.contains_header(SECURITY_TOKEN));
        Ok(())
    }
}
