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

//! Hash related utils.

use crate::{Error, Result};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use hmac::Hmac;
use hmac::Mac;
use sha1::Sha1;

/// Base64 encode
pub fn base64_encode(content: &[u8]) -> String {
    BASE64_STANDARD.encode(content)
}

/// Base64 decode
pub fn base64_decode(content: &str) -> Result<Vec<u8>> {
    BASE64_STANDARD
        .decode(content)
        .map_err(|e| Error::response_unparsable("base64 decode failed").with_source(e))
}

/// Base64 encoded HMAC with SHA1 hash.
///
/// Any failure is reported as a signature failure, never swallowed.
pub fn base64_hmac_sha1(key: &[u8], content: &[u8]) -> Result<String> {
    let mut h = Hmac::<Sha1>::new_from_slice(key).map_err(|e| {
        Error::signature_failed("failed to initialize hmac-sha1")
            .with_source(anyhow::anyhow!("{e}"))
    })?;
    h.update(content);

    Ok(base64_encode(&h.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_hmac_sha1() {
        // Reference value from RFC 2202 test case 2.
        let sig = base64_hmac_sha1(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(sig, "7/zfauXrL6LSdBbV8YTfnCWafHk=");
    }

    #[test]
    fn test_base64_roundtrip() {
        let encoded = base64_encode("消息体".as_bytes());
        assert_eq!(base64_decode(&encoded).unwrap(), "消息体".as_bytes());
    }

    #[test]
    fn test_base64_decode_invalid() {
        let err = base64_decode("not base64!").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ResponseUnparsable);
    }
}
