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

//! Operation definitions of the queue service.

use crate::model::*;
use http::header::LOCATION;
use http::Method;
use log::warn;
use reqmns_core::xml::XmlElement;
use reqmns_core::{
    parse_error_envelope, parse_xml_body, ActionDef, Error, ItemFailure, RequestMessage,
    ResponseMessage, Result,
};

/// Maximum receipt handles of one batch delete.
pub const MAX_BATCH_DELETE: usize = 16;
/// Maximum messages of one batch receive.
pub const MAX_BATCH_RECEIVE: u32 = 16;
/// Maximum length of a queue name.
const MAX_QUEUE_NAME_LEN: usize = 256;

/// `GET /?accountmeta=true`
pub const GET_ACCOUNT_META: ActionDef<(), AccountMeta> = ActionDef {
    name: "GetAccountMeta",
    method: Method::GET,
    build_request: build_get_account_meta,
    parse_result: Some(parse_account_meta),
    parse_error: parse_error_envelope,
};

/// `PUT /?accountmeta=true`
pub const SET_ACCOUNT_META: ActionDef<AccountMeta, ()> = ActionDef {
    name: "SetAccountMeta",
    method: Method::PUT,
    build_request: build_set_account_meta,
    parse_result: None,
    parse_error: parse_error_envelope,
};

/// `PUT /queues/<name>`, resolves to the queue url.
pub const CREATE_QUEUE: ActionDef<QueueMeta, String> = ActionDef {
    name: "CreateQueue",
    method: Method::PUT,
    build_request: build_create_queue,
    parse_result: Some(parse_queue_url),
    parse_error: parse_error_envelope,
};

/// `PUT /queues/<name>?metaoverride=true`
pub const SET_QUEUE_ATTRIBUTES: ActionDef<QueueMeta, ()> = ActionDef {
    name: "SetQueueAttributes",
    method: Method::PUT,
    build_request: build_set_queue_attributes,
    parse_result: None,
    parse_error: parse_error_envelope,
};

/// `GET /queues/<name>`
pub const GET_QUEUE_ATTRIBUTES: ActionDef<String, QueueMeta> = ActionDef {
    name: "GetQueueAttributes",
    method: Method::GET,
    build_request: build_get_queue_attributes,
    parse_result: Some(parse_queue_meta),
    parse_error: parse_error_envelope,
};

/// `POST /queues/<name>/messages`
pub const SEND_MESSAGE: ActionDef<SendMessageRequest, MessageReceipt> = ActionDef {
    name: "SendMessage",
    method: Method::POST,
    build_request: build_send_message,
    parse_result: Some(parse_message_receipt),
    parse_error: parse_error_envelope,
};

/// `GET /queues/<name>/messages`
///
/// The body encoding of the request travels to the parser of the same call.
pub const RECEIVE_MESSAGE: ActionDef<ReceiveMessageRequest, Vec<ReceivedMessage>, BodyEncoding> =
    ActionDef {
        name: "ReceiveMessage",
        method: Method::GET,
        build_request: build_receive_message,
        parse_result: Some(parse_received_messages),
        parse_error: parse_error_envelope,
    };

/// `DELETE /queues/<name>/messages`
///
/// Partial failures are reported as a `MandatoryHandling` error listing every
/// receipt handle that couldn't be deleted.
pub const BATCH_DELETE_MESSAGE: ActionDef<BatchDeleteRequest, ()> = ActionDef {
    name: "BatchDeleteMessage",
    method: Method::DELETE,
    build_request: build_batch_delete_message,
    parse_result: None,
    parse_error: parse_batch_delete_error,
};

fn check_queue_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_QUEUE_NAME_LEN
        && name.starts_with(|c: char| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "invalid queue name {name:?}"
        )))
    }
}

fn queue_path(name: &str) -> Result<String> {
    check_queue_name(name)?;
    Ok(format!("/queues/{name}"))
}

fn build_get_account_meta(_: &()) -> Result<(RequestMessage, ())> {
    Ok((RequestMessage::new(Method::GET, "/?accountmeta=true"), ()))
}

fn parse_account_meta(resp: &ResponseMessage, _: &()) -> Result<AccountMeta> {
    AccountMeta::from_xml(&parse_xml_body(resp)?)
}

fn build_set_account_meta(meta: &AccountMeta) -> Result<(RequestMessage, ())> {
    let msg = RequestMessage::new(Method::PUT, "/?accountmeta=true").with_body(meta.to_xml()?);
    Ok((msg, ()))
}

fn build_create_queue(meta: &QueueMeta) -> Result<(RequestMessage, ())> {
    let msg = RequestMessage::new(Method::PUT, queue_path(&meta.queue_name)?)
        .with_body(meta.to_xml()?);
    Ok((msg, ()))
}

fn parse_queue_url(resp: &ResponseMessage, _: &()) -> Result<String> {
    resp.header(LOCATION.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| Error::response_unparsable("queue created without location header"))
}

fn build_set_queue_attributes(meta: &QueueMeta) -> Result<(RequestMessage, ())> {
    let path = format!("{}?metaoverride=true", queue_path(&meta.queue_name)?);
    let msg = RequestMessage::new(Method::PUT, path).with_body(meta.to_xml()?);
    Ok((msg, ()))
}

fn build_get_queue_attributes(queue_name: &String) -> Result<(RequestMessage, ())> {
    Ok((RequestMessage::new(Method::GET, queue_path(queue_name)?), ()))
}

fn parse_queue_meta(resp: &ResponseMessage, _: &()) -> Result<QueueMeta> {
    QueueMeta::from_xml(&parse_xml_body(resp)?)
}

fn build_send_message(req: &SendMessageRequest) -> Result<(RequestMessage, ())> {
    let path = format!("{}/messages", queue_path(&req.queue_name)?);
    let msg = RequestMessage::new(Method::POST, path).with_body(req.to_xml()?);
    Ok((msg, ()))
}

fn parse_message_receipt(resp: &ResponseMessage, _: &()) -> Result<MessageReceipt> {
    MessageReceipt::from_xml(&parse_xml_body(resp)?)
}

fn build_receive_message(req: &ReceiveMessageRequest) -> Result<(RequestMessage, BodyEncoding)> {
    let mut path = format!("{}/messages", queue_path(&req.queue_name)?);

    let mut query = Vec::new();
    if let Some(n) = req.num_of_messages {
        if n == 0 || n > MAX_BATCH_RECEIVE {
            return Err(Error::invalid_argument(format!(
                "num_of_messages must be in 1..={MAX_BATCH_RECEIVE}, got {n}"
            )));
        }
        query.push(format!("numOfMessages={n}"));
    }
    if let Some(wait) = req.wait_seconds {
        query.push(format!("waitseconds={wait}"));
    }
    if !query.is_empty() {
        path.push('?');
        path.push_str(&query.join("&"));
    }

    Ok((RequestMessage::new(Method::GET, path), req.encoding))
}

fn parse_received_messages(
    resp: &ResponseMessage,
    encoding: &BodyEncoding,
) -> Result<Vec<ReceivedMessage>> {
    ReceivedMessage::list_from_xml(&parse_xml_body(resp)?, *encoding)
}

fn build_batch_delete_message(req: &BatchDeleteRequest) -> Result<(RequestMessage, ())> {
    if req.receipt_handles.is_empty() || req.receipt_handles.len() > MAX_BATCH_DELETE {
        return Err(Error::invalid_argument(format!(
            "batch delete takes 1 to {MAX_BATCH_DELETE} receipt handles, got {}",
            req.receipt_handles.len()
        )));
    }

    let path = format!("{}/messages", queue_path(&req.queue_name)?);
    let msg = RequestMessage::new(Method::DELETE, path).with_body(req.to_xml()?);
    Ok((msg, ()))
}

/// Decode the `<Errors>` payload of a partially failed batch delete, and
/// fall back to the error envelope for anything else.
fn parse_batch_delete_error(resp: &ResponseMessage) -> Error {
    let Ok(root) = XmlElement::parse(resp.body()) else {
        return parse_error_envelope(resp);
    };
    if root.name() != "Errors" {
        return parse_error_envelope(resp);
    }

    let failures = root
        .children_named("Error")
        .map(|el| ItemFailure {
            code: el.text_or("ErrorCode", Some("")).unwrap_or_default().to_string(),
            message: el
                .text_or("ErrorMessage", Some(""))
                .unwrap_or_default()
                .to_string(),
            key: el.text_or("ReceiptHandle", None).map(|v| v.to_string()),
        })
        .collect::<Vec<_>>();
    warn!("batch delete failed for {} receipt handles", failures.len());

    let mut err = Error::mandatory_handling(
        format!("{} receipt handles failed to delete", failures.len()),
        failures,
    )
    .with_context(format!("status: {}", resp.status()));
    if let Some(request_id) = resp.header("x-mns-request-id") {
        err = err.with_request_id(request_id);
    }
    err
}
