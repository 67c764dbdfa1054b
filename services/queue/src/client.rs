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

use crate::actions::*;
use crate::model::*;
use reqmns_core::{Action, AsyncResult, Callback, Client, Result};

/// QueueClient exposes every queue operation on one client.
///
/// Each operation is served by its own [`Action`], so every operation carries
/// its own request id when request id generation is enabled. All methods take
/// `&self` and the client is safe to share across threads.
///
/// The blocking methods must not be called from a thread that drives the
/// client's runtime; use the `*_async` variants there.
#[derive(Clone, Debug)]
pub struct QueueClient {
    get_account_meta: Action<(), AccountMeta>,
    set_account_meta: Action<AccountMeta, ()>,
    create_queue: Action<QueueMeta, String>,
    set_queue_attributes: Action<QueueMeta, ()>,
    get_queue_attributes: Action<String, QueueMeta>,
    send_message: Action<SendMessageRequest, MessageReceipt>,
    receive_message: Action<ReceiveMessageRequest, Vec<ReceivedMessage>, BodyEncoding>,
    batch_delete_message: Action<BatchDeleteRequest, ()>,
}

impl QueueClient {
    /// Create a queue client on top of a core client.
    pub fn new(client: Client) -> Self {
        Self {
            get_account_meta: Action::new(client.clone(), GET_ACCOUNT_META),
            set_account_meta: Action::new(client.clone(), SET_ACCOUNT_META),
            create_queue: Action::new(client.clone(), CREATE_QUEUE),
            set_queue_attributes: Action::new(client.clone(), SET_QUEUE_ATTRIBUTES),
            get_queue_attributes: Action::new(client.clone(), GET_QUEUE_ATTRIBUTES),
            send_message: Action::new(client.clone(), SEND_MESSAGE),
            receive_message: Action::new(client.clone(), RECEIVE_MESSAGE),
            batch_delete_message: Action::new(client, BATCH_DELETE_MESSAGE),
        }
    }

    /// Get the account attributes.
    pub fn get_account_meta(&self) -> Result<AccountMeta> {
        self.get_account_meta.execute(&())
    }

    /// Get the account attributes without blocking.
    pub fn get_account_meta_async(
        &self,
        callback: Option<Callback<AccountMeta>>,
    ) -> Result<AsyncResult<AccountMeta>> {
        self.get_account_meta.execute_async_with(&(), None, callback)
    }

    /// Update the account attributes.
    pub fn set_account_meta(&self, meta: &AccountMeta) -> Result<()> {
        self.set_account_meta.execute(meta)
    }

    /// Update the account attributes without blocking.
    pub fn set_account_meta_async(
        &self,
        meta: &AccountMeta,
        callback: Option<Callback<()>>,
    ) -> Result<AsyncResult<()>> {
        self.set_account_meta.execute_async_with(meta, None, callback)
    }

    /// Create a queue and return its url.
    pub fn create_queue(&self, meta: &QueueMeta) -> Result<String> {
        self.create_queue.execute(meta)
    }

    /// Create a queue without blocking.
    pub fn create_queue_async(
        &self,
        meta: &QueueMeta,
        callback: Option<Callback<String>>,
    ) -> Result<AsyncResult<String>> {
        self.create_queue.execute_async_with(meta, None, callback)
    }

    /// Overwrite the attributes of a queue.
    pub fn set_queue_attributes(&self, meta: &QueueMeta) -> Result<()> {
        self.set_queue_attributes.execute(meta)
    }

    /// Overwrite the attributes of a queue without blocking.
    pub fn set_queue_attributes_async(
        &self,
        meta: &QueueMeta,
        callback: Option<Callback<()>>,
    ) -> Result<AsyncResult<()>> {
        self.set_queue_attributes
            .execute_async_with(meta, None, callback)
    }

    /// Get the attributes of a queue.
    pub fn get_queue_attributes(&self, queue_name: &str) -> Result<QueueMeta> {
        self.get_queue_attributes.execute(&queue_name.to_string())
    }

    /// Get the attributes of a queue without blocking.
    pub fn get_queue_attributes_async(
        &self,
        queue_name: &str,
        callback: Option<Callback<QueueMeta>>,
    ) -> Result<AsyncResult<QueueMeta>> {
        self.get_queue_attributes
            .execute_async_with(&queue_name.to_string(), None, callback)
    }

    /// Send a message.
    pub fn send_message(&self, req: &SendMessageRequest) -> Result<MessageReceipt> {
        self.send_message.execute(req)
    }

    /// Send a message without blocking.
    pub fn send_message_async(
        &self,
        req: &SendMessageRequest,
        callback: Option<Callback<MessageReceipt>>,
    ) -> Result<AsyncResult<MessageReceipt>> {
        self.send_message.execute_async_with(req, None, callback)
    }

    /// Receive messages.
    ///
    /// An empty queue is reported by the service as a `MessageNotExist` error.
    pub fn receive_message(&self, req: &ReceiveMessageRequest) -> Result<Vec<ReceivedMessage>> {
        self.receive_message.execute(req)
    }

    /// Receive messages without blocking.
    pub fn receive_message_async(
        &self,
        req: &ReceiveMessageRequest,
        callback: Option<Callback<Vec<ReceivedMessage>>>,
    ) -> Result<AsyncResult<Vec<ReceivedMessage>>> {
        self.receive_message.execute_async_with(req, None, callback)
    }

    /// Delete received messages.
    pub fn batch_delete_message(&self, req: &BatchDeleteRequest) -> Result<()> {
        self.batch_delete_message.execute(req)
    }

    /// Delete received messages without blocking.
    pub fn batch_delete_message_async(
        &self,
        req: &BatchDeleteRequest,
        callback: Option<Callback<()>>,
    ) -> Result<AsyncResult<()>> {
        self.batch_delete_message
            .execute_async_with(req, None, callback)
    }
}
