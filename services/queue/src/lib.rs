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

//! Queue operations of the MNS service for reqmns.
//!
//! ## Quick Start
//!
//! ```no_run
//! use reqmns_core::{Client, Config, Context, OsEnv};
//! use reqmns_http_send_reqwest::ReqwestHttpSend;
//! use reqmns_queue::{QueueClient, QueueMeta, ReceiveMessageRequest, SendMessageRequest};
//!
//! fn main() -> reqmns_core::Result<()> {
//!     let runtime = tokio::runtime::Runtime::new()?;
//!
//!     // Endpoint and keys are read from `ALIBABA_CLOUD_*` envs.
//!     let config = Config::default().from_env(&Context::new().with_env(OsEnv));
//!     let ctx = Context::new()
//!         .with_env(OsEnv)
//!         .with_http_send(ReqwestHttpSend::from_config(&config)?)
//!         .with_runtime(runtime.handle().clone());
//!     let client = QueueClient::new(Client::new(ctx, config)?);
//!
//!     client.create_queue(&QueueMeta::new("my-queue"))?;
//!     client.send_message(&SendMessageRequest::new("my-queue", "hello"))?;
//!
//!     let messages = client.receive_message(&ReceiveMessageRequest::new("my-queue").with_wait_seconds(3))?;
//!     for message in messages {
//!         println!("{}: {:?}", message.message_id, message.body);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Body Encoding
//!
//! Message bodies are base64 encoded by default. [`BodyEncoding::Raw`] sends
//! utf-8 bodies as they are. The encoding is chosen per call, so one client
//! can serve both kinds of queues concurrently.

#![warn(missing_docs)]

mod model;
pub use model::{
    AccountMeta, BatchDeleteRequest, BodyEncoding, MessageReceipt, QueueMeta,
    ReceiveMessageRequest, ReceivedMessage, SendMessageRequest,
};

mod actions;
pub use actions::{
    BATCH_DELETE_MESSAGE, CREATE_QUEUE, GET_ACCOUNT_META, GET_QUEUE_ATTRIBUTES,
    MAX_BATCH_DELETE, MAX_BATCH_RECEIVE, RECEIVE_MESSAGE, SEND_MESSAGE, SET_ACCOUNT_META,
    SET_QUEUE_ATTRIBUTES,
};

mod client;
pub use client::QueueClient;
