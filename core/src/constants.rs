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

// Headers used by the MNS protocol.
pub const MNS_VERSION_HEADER: &str = "x-mns-version";
pub const MNS_VERSION: &str = "2015-06-06";
pub const REQUEST_ID_HEADER: &str = "x-mns-user-request-id";
pub const SECURITY_TOKEN: &str = "security-token";
pub const CONTENT_MD5: &str = "Content-MD5";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const DATE: &str = "Date";
pub const DEFAULT_CONTENT_TYPE: &str = "text/xml;charset=UTF-8";

pub const SIGNATURE_SCHEME: &str = "MNS";
pub const CANONICAL_HEADER_PREFIX: &str = "x-mns-";

pub const XML_NAMESPACE: &str = "http://mns.aliyuncs.com/doc/v1/";

// Env values used by the config loader.
pub const ALIBABA_CLOUD_MNS_ENDPOINT: &str = "ALIBABA_CLOUD_MNS_ENDPOINT";
pub const ALIBABA_CLOUD_ACCESS_KEY_ID: &str = "ALIBABA_CLOUD_ACCESS_KEY_ID";
pub const ALIBABA_CLOUD_ACCESS_KEY_SECRET: &str = "ALIBABA_CLOUD_ACCESS_KEY_SECRET";
pub const ALIBABA_CLOUD_SECURITY_TOKEN: &str = "ALIBABA_CLOUD_SECURITY_TOKEN";
