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

//! Entities exchanged with the queue service.

use bytes::Bytes;
use reqmns_core::hash::{base64_decode, base64_encode};
use reqmns_core::xml::{XmlBuilder, XmlElement};
use reqmns_core::{Error, Result};

/// BodyEncoding decides how message bodies travel inside the XML payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyEncoding {
    /// Bodies are base64 encoded, any bytes are allowed.
    #[default]
    Base64,
    /// Bodies are sent as they are and must be valid utf-8.
    Raw,
}

impl BodyEncoding {
    /// Encode a body for the wire.
    pub fn encode(&self, body: &[u8]) -> Result<String> {
        match self {
            BodyEncoding::Base64 => Ok(base64_encode(body)),
            BodyEncoding::Raw => std::str::from_utf8(body)
                .map(|v| v.to_string())
                .map_err(|e| {
                    Error::invalid_argument("raw message body must be valid utf-8").with_source(e)
                }),
        }
    }

    /// Decode a body read from the wire.
    pub fn decode(&self, text: &str) -> Result<Bytes> {
        match self {
            BodyEncoding::Base64 => base64_decode(text).map(Bytes::from),
            BodyEncoding::Raw => Ok(Bytes::copy_from_slice(text.as_bytes())),
        }
    }
}

/// Account level attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountMeta {
    /// Bucket receiving the service logs, empty to disable logging.
    pub logging_bucket: Option<String>,
}

impl AccountMeta {
    pub(crate) fn to_xml(&self) -> Result<Bytes> {
        let mut builder = XmlBuilder::new("Account")?;
        builder.element("LoggingBucket", self.logging_bucket.as_deref(), None)?;
        builder.finish()
    }

    pub(crate) fn from_xml(root: &XmlElement) -> Result<Self> {
        Ok(Self {
            logging_bucket: root.text_or("LoggingBucket", None).map(|v| v.to_string()),
        })
    }
}

/// Queue attributes.
///
/// Only the settable attributes are sent when creating or updating a queue,
/// the counters and timestamps are filled by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueMeta {
    /// Name of the queue.
    pub queue_name: String,
    /// Seconds before a new message becomes visible.
    pub delay_seconds: Option<u64>,
    /// Maximum message body size in bytes.
    pub maximum_message_size: Option<u64>,
    /// Seconds a message is kept before it's dropped.
    pub message_retention_period: Option<u64>,
    /// Seconds a received message stays invisible to other receivers.
    pub visibility_timeout: Option<u64>,
    /// Default long polling wait of receive calls.
    pub polling_wait_seconds: Option<u64>,
    /// Whether operations on this queue are logged.
    pub logging_enabled: Option<bool>,
    /// Messages ready to be received.
    pub active_messages: Option<u64>,
    /// Messages received but not yet deleted.
    pub inactive_messages: Option<u64>,
    /// Messages still delayed.
    pub delay_messages: Option<u64>,
    /// Creation time in seconds since epoch.
    pub create_time: Option<i64>,
    /// Last modification time in seconds since epoch.
    pub last_modify_time: Option<i64>,
}

impl QueueMeta {
    /// Create queue attributes with only the name set.
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            ..Default::default()
        }
    }

    pub(crate) fn to_xml(&self) -> Result<Bytes> {
        let mut builder = XmlBuilder::new("Queue")?;
        builder
            .element("DelaySeconds", self.delay_seconds, None)?
            .element("MaximumMessageSize", self.maximum_message_size, None)?
            .element("MessageRetentionPeriod", self.message_retention_period, None)?
            .element("VisibilityTimeout", self.visibility_timeout, None)?
            .element("PollingWaitSeconds", self.polling_wait_seconds, None)?
            .element("LoggingEnabled", self.logging_enabled.map(format_bool), None)?;
        builder.finish()
    }

    pub(crate) fn from_xml(root: &XmlElement) -> Result<Self> {
        Ok(Self {
            queue_name: root.require("QueueName")?.to_string(),
            delay_seconds: root.value_or("DelaySeconds", None)?,
            maximum_message_size: root.value_or("MaximumMessageSize", None)?,
            message_retention_period: root.value_or("MessageRetentionPeriod", None)?,
            visibility_timeout: root.value_or("VisibilityTimeout", None)?,
            polling_wait_seconds: root.value_or("PollingWaitSeconds", None)?,
            logging_enabled: root
                .text_or("LoggingEnabled", None)
                .map(parse_bool)
                .transpose()?,
            active_messages: root.value_or("ActiveMessages", None)?,
            inactive_messages: root.value_or("InactiveMessages", None)?,
            delay_messages: root.value_or("DelayMessages", None)?,
            create_time: root.value_or("CreateTime", None)?,
            last_modify_time: root.value_or("LastModifyTime", None)?,
        })
    }
}

fn format_bool(v: bool) -> &'static str {
    if v {
        "True"
    } else {
        "False"
    }
}

fn parse_bool(v: &str) -> Result<bool> {
    if v.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if v.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(Error::response_unparsable(format!(
            "invalid boolean value {v:?}"
        )))
    }
}

/// A message to send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMessageRequest {
    /// Target queue.
    pub queue_name: String,
    /// Message body.
    pub body: Bytes,
    /// Seconds before the message becomes visible.
    pub delay_seconds: Option<u64>,
    /// Priority, 1 is the highest.
    pub priority: Option<u64>,
    /// How the body is encoded on the wire.
    pub encoding: BodyEncoding,
}

impl SendMessageRequest {
    /// Create a request sending `body` to the queue.
    pub fn new(queue_name: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            queue_name: queue_name.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    /// Set the delay.
    pub fn with_delay_seconds(mut self, delay_seconds: u64) -> Self {
        self.delay_seconds = Some(delay_seconds);
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: u64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the body encoding.
    pub fn with_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub(crate) fn to_xml(&self) -> Result<Bytes> {
        let body = self.encoding.encode(&self.body)?;

        let mut builder = XmlBuilder::new("Message")?;
        builder
            .element("MessageBody", Some(body), None)?
            .element("DelaySeconds", self.delay_seconds, None)?
            .element("Priority", self.priority, None)?;
        builder.finish()
    }
}

/// The receipt of a sent message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageReceipt {
    /// Id assigned by the service.
    pub message_id: String,
    /// MD5 of the message body as the service received it.
    pub body_md5: Option<String>,
    /// Receipt handle, only returned for delayed messages.
    pub receipt_handle: Option<String>,
}

impl MessageReceipt {
    pub(crate) fn from_xml(root: &XmlElement) -> Result<Self> {
        Ok(Self {
            message_id: root.require("MessageId")?.to_string(),
            body_md5: root.text_or("MessageBodyMD5", None).map(|v| v.to_string()),
            receipt_handle: root.text_or("ReceiptHandle", None).map(|v| v.to_string()),
        })
    }
}

/// Parameters of a receive call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiveMessageRequest {
    /// Source queue.
    pub queue_name: String,
    /// Long polling wait, the queue's default if absent.
    pub wait_seconds: Option<u64>,
    /// Receive up to this many messages at once.
    pub num_of_messages: Option<u32>,
    /// How bodies are encoded on the wire.
    pub encoding: BodyEncoding,
}

impl ReceiveMessageRequest {
    /// Create a request receiving one message from the queue.
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            ..Default::default()
        }
    }

    /// Set the long polling wait.
    pub fn with_wait_seconds(mut self, wait_seconds: u64) -> Self {
        self.wait_seconds = Some(wait_seconds);
        self
    }

    /// Receive a batch of messages.
    pub fn with_num_of_messages(mut self, num_of_messages: u32) -> Self {
        self.num_of_messages = Some(num_of_messages);
        self
    }

    /// Set the body encoding.
    pub fn with_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// A received message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Id assigned by the service.
    pub message_id: String,
    /// Handle used to delete the message or change its visibility.
    pub receipt_handle: String,
    /// MD5 of the body as stored by the service.
    pub body_md5: Option<String>,
    /// Decoded message body.
    pub body: Bytes,
    /// Enqueue time in milliseconds since epoch.
    pub enqueue_time: Option<i64>,
    /// Next time the message becomes visible, in milliseconds since epoch.
    pub next_visible_time: Option<i64>,
    /// First receive time in milliseconds since epoch.
    pub first_dequeue_time: Option<i64>,
    /// How many times the message has been received.
    pub dequeue_count: Option<u64>,
    /// Priority of the message.
    pub priority: Option<u64>,
}

impl ReceivedMessage {
    pub(crate) fn from_xml(el: &XmlElement, encoding: BodyEncoding) -> Result<Self> {
        Ok(Self {
            message_id: el.require("MessageId")?.to_string(),
            receipt_handle: el.require("ReceiptHandle")?.to_string(),
            body_md5: el.text_or("MessageBodyMD5", None).map(|v| v.to_string()),
            body: encoding.decode(el.require("MessageBody")?)?,
            enqueue_time: el.value_or("EnqueueTime", None)?,
            next_visible_time: el.value_or("NextVisibleTime", None)?,
            first_dequeue_time: el.value_or("FirstDequeueTime", None)?,
            dequeue_count: el.value_or("DequeueCount", None)?,
            priority: el.value_or("Priority", None)?,
        })
    }

    /// Decode a receive response, either one `<Message>` or a `<Messages>` batch.
    pub(crate) fn list_from_xml(root: &XmlElement, encoding: BodyEncoding) -> Result<Vec<Self>> {
        if root.name() == "Messages" {
            root.children_named("Message")
                .map(|el| Self::from_xml(el, encoding))
                .collect()
        } else {
            Ok(vec![Self::from_xml(root, encoding)?])
        }
    }
}

/// Receipt handles of the messages to delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDeleteRequest {
    /// Queue holding the messages.
    pub queue_name: String,
    /// Receipt handles returned by receive calls.
    pub receipt_handles: Vec<String>,
}

impl BatchDeleteRequest {
    /// Create a request deleting the given messages.
    pub fn new(queue_name: impl Into<String>, receipt_handles: Vec<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            receipt_handles,
        }
    }

    pub(crate) fn to_xml(&self) -> Result<Bytes> {
        let mut builder = XmlBuilder::new("ReceiptHandles")?;
        for handle in &self.receipt_handles {
            builder.element("ReceiptHandle", Some(handle), None)?;
        }
        builder.finish()
    }
}
