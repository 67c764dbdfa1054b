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

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use reqmns_core::hash::base64_hmac_sha1;
use reqmns_core::{
    parse_error_envelope, parse_xml_body, Action, ActionDef, Client, Config, Context, Error,
    ErrorCategory, ErrorKind, HttpSend, RequestMessage, ResponseMessage, Result,
};

const ENDPOINT: &str = "http://1234.mns.cn-hangzhou.aliyuncs.com";

#[derive(Debug, Clone)]
enum Reply {
    Respond(StatusCode, &'static str),
    Fail,
    Hang,
}

#[derive(Debug, Clone)]
struct MockHttpSend {
    reply: Reply,
    requests: Arc<Mutex<Vec<http::Request<Bytes>>>>,
}

impl MockHttpSend {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            requests: Arc::default(),
        }
    }

    fn requests(&self) -> Vec<http::Request<Bytes>> {
        self.requests.lock().unwrap().clone()
    }

    fn last_header(&self, name: &str) -> Option<String> {
        self.requests()
            .last()?
            .headers()
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        self.requests.lock().unwrap().push(req);
        match &self.reply {
            Reply::Respond(status, body) => Ok(http::Response::builder()
                .status(*status)
                .header("x-mns-request-id", "SERVER-RID")
                .body(Bytes::from_static(body.as_bytes()))?),
            Reply::Fail => Err(Error::transport("connection reset by peer")),
            Reply::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

fn build_account_meta(_: &()) -> Result<(RequestMessage, ())> {
    Ok((RequestMessage::new(Method::GET, "/?accountmeta=true"), ()))
}

fn build_from_path(path: &String) -> Result<(RequestMessage, ())> {
    Ok((RequestMessage::new(Method::POST, path.as_str()), ()))
}

fn parse_logging_bucket(resp: &ResponseMessage, _: &()) -> Result<String> {
    let root = parse_xml_body(resp)?;
    Ok(root.require("LoggingBucket")?.to_string())
}

const GET_ACCOUNT_META: ActionDef<(), String> = ActionDef {
    name: "GetAccountMeta",
    method: Method::GET,
    build_request: build_account_meta,
    parse_result: Some(parse_logging_bucket),
    parse_error: parse_error_envelope,
};

const GET_PATH: ActionDef<String, ()> = ActionDef {
    name: "GetPath",
    method: Method::GET,
    build_request: build_from_path,
    parse_result: None,
    parse_error: parse_error_envelope,
};

const ACCOUNT_META_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<AccountMeta xmlns="http://mns.aliyuncs.com/doc/v1/">
  <LoggingBucket>mns-logs</LoggingBucket>
</AccountMeta>"#;

const QUEUE_NOT_EXIST_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error xmlns="http://mns.aliyuncs.com/doc/v1/">
  <Code>QueueNotExist</Code>
  <Message>The queue name you provided is not exist.</Message>
  <RequestId>5C5D5C1D8A3C8A4A0A000001</RequestId>
  <HostId>http://1234.mns.cn-hangzhou.aliyuncs.com</HostId>
</Error>"#;

struct Harness {
    runtime: tokio::runtime::Runtime,
    http: MockHttpSend,
}

impl Harness {
    fn new(reply: Reply) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        Self {
            runtime,
            http: MockHttpSend::new(reply),
        }
    }

    fn client(&self, config: Config) -> Client {
        let ctx = Context::new()
            .with_http_send(self.http.clone())
            .with_runtime(self.runtime.handle().clone());
        Client::new(ctx, config).unwrap()
    }

    fn signed_client(&self) -> Client {
        self.client(Config {
            endpoint: ENDPOINT.to_string(),
            access_key_id: Some("AK".to_string()),
            access_key_secret: Some("SK".to_string()),
            ..Default::default()
        })
    }
}

#[test]
fn test_execute_sends_signed_request() -> anyhow::Result<()> {
    let h = Harness::new(Reply::Respond(StatusCode::OK, ACCOUNT_META_BODY));
    let action = Action::new(h.signed_client(), GET_ACCOUNT_META);

    let bucket = action.execute(&())?;
    assert_eq!(bucket, "mns-logs");

    let requests = h.http.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method(), Method::GET);
    assert_eq!(
        requests[0].uri().to_string(),
        format!("{ENDPOINT}/?accountmeta=true")
    );

    let date = h.http.last_header("date").expect("date must be set");
    assert_eq!(
        h.http.last_header("content-type").as_deref(),
        Some("text/xml;charset=UTF-8")
    );
    assert_eq!(
        h.http.last_header("x-mns-version").as_deref(),
        Some("2015-06-06")
    );
    assert!(h.http.last_header("x-mns-user-request-id").is_none());
    assert!(h.http.last_header("security-token").is_none());

    let expected = base64_hmac_sha1(
        b"SK",
        format!("GET\n\ntext/xml;charset=UTF-8\n{date}\nx-mns-version:2015-06-06\n/?accountmeta=true")
            .as_bytes(),
    )?;
    assert_eq!(
        h.http.last_header("authorization"),
        Some(format!("MNS AK:{expected}"))
    );
    Ok(())
}

/// Custom headers win over the headers the engine sets and the signature
/// covers whatever was finally sent, even when the override is misleading.
#[test]
fn test_custom_headers_override_date_and_content_type() -> anyhow::Result<()> {
    let h = Harness::new(Reply::Respond(StatusCode::OK, ACCOUNT_META_BODY));
    let action = Action::new(h.signed_client(), GET_ACCOUNT_META);

    let headers = HashMap::from([
        ("Date".to_string(), "Fri, 01 Jan 2021 00:00:00 GMT".to_string()),
        ("content-type".to_string(), "application/octet-stream".to_string()),
        ("x-mns-version".to_string(), "2099-01-01".to_string()),
    ]);
    action.execute_with_headers(&(), Some(&headers))?;

    assert_eq!(
        h.http.last_header("date").as_deref(),
        Some("Fri, 01 Jan 2021 00:00:00 GMT")
    );
    assert_eq!(
        h.http.last_header("content-type").as_deref(),
        Some("application/octet-stream")
    );

    let expected = base64_hmac_sha1(
        b"SK",
        b"GET\n\napplication/octet-stream\nFri, 01 Jan 2021 00:00:00 GMT\nx-mns-version:2099-01-01\n/?accountmeta=true",
    )?;
    assert_eq!(
        h.http.last_header("authorization"),
        Some(format!("MNS AK:{expected}"))
    );
    Ok(())
}

#[test]
fn test_absolute_path_outside_endpoint_is_rejected() {
    let h = Harness::new(Reply::Respond(StatusCode::OK, ""));
    let action = Action::new(h.signed_client(), GET_PATH);

    let err = action
        .execute(&"http://evil.example.com/queues".to_string())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.category(), ErrorCategory::Local);
    assert!(h.http.requests().is_empty());

    for path in [
        "https://1234.mns.cn-hangzhou.aliyuncs.com/queues",
        "http://1234.mns.cn-hangzhou.aliyuncs.com.evil.example.com/queues",
    ] {
        let err = action.execute_async(&path.to_string()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
    assert!(h.http.requests().is_empty());
}

#[test]
fn test_absolute_path_under_endpoint_and_fixed_method() -> anyhow::Result<()> {
    let h = Harness::new(Reply::Respond(StatusCode::NO_CONTENT, ""));
    let action = Action::new(h.signed_client(), GET_PATH);

    let (msg, _) = action.build_request_message(&format!("{ENDPOINT}/queues/q1"))?;
    assert_eq!(msg.resource_path(), "/queues/q1");
    assert_eq!(msg.endpoint(), ENDPOINT);
    assert_eq!(msg.method(), Method::GET);

    action.execute(&format!("{ENDPOINT}/queues/q1"))?;
    let requests = h.http.requests();
    assert_eq!(requests[0].method(), Method::GET);
    assert_eq!(requests[0].uri().to_string(), format!("{ENDPOINT}/queues/q1"));
    Ok(())
}

#[test]
fn test_service_error() {
    let h = Harness::new(Reply::Respond(StatusCode::NOT_FOUND, QUEUE_NOT_EXIST_BODY));
    let action = Action::new(h.signed_client(), GET_ACCOUNT_META);

    let err = action.execute(&()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Service);
    assert!(err.is_service_error());
    assert_eq!(err.code(), "QueueNotExist");
    assert_eq!(err.message(), "The queue name you provided is not exist.");
    assert_eq!(err.request_id(), Some("5C5D5C1D8A3C8A4A0A000001"));
    assert_eq!(
        err.host_id(),
        Some("http://1234.mns.cn-hangzhou.aliyuncs.com")
    );
}

#[test]
fn test_unparsable_error_response() {
    let h = Harness::new(Reply::Respond(
        StatusCode::BAD_GATEWAY,
        "<html>Bad Gateway</html>",
    ));
    let action = Action::new(h.signed_client(), GET_ACCOUNT_META);

    let err = action.execute(&()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResponseUnparsable);
    assert!(err.is_local());
}

#[test]
fn test_request_id_is_sent_and_attached_to_local_errors() {
    let h = Harness::new(Reply::Fail);
    let client = h.client(Config {
        endpoint: ENDPOINT.to_string(),
        generate_request_id: true,
        ..Default::default()
    });
    let action = Action::new(client, GET_ACCOUNT_META);
    let request_id = action.request_id().expect("request id must be generated");

    let err = action.execute(&()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.code(), "Unknown");
    assert_eq!(err.request_id(), Some(request_id));
    assert_eq!(
        h.http.last_header("x-mns-user-request-id").as_deref(),
        Some(request_id)
    );

    // The same id goes out with every call of the action.
    let _ = action.execute(&());
    let requests = h.http.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].headers()["x-mns-user-request-id"],
        requests[0].headers()["x-mns-user-request-id"]
    );
}

#[test]
fn test_unsigned_without_credentials() -> anyhow::Result<()> {
    let h = Harness::new(Reply::Respond(StatusCode::OK, ACCOUNT_META_BODY));
    let client = h.client(Config {
        endpoint: ENDPOINT.to_string(),
        ..Default::default()
    });
    let action = Action::new(client, GET_ACCOUNT_META);

    action.execute(&())?;
    assert!(h.http.last_header("authorization").is_none());
    assert!(h.http.last_header("date").is_some());
    Ok(())
}

#[test]
fn test_timeout_then_cancel() {
    let h = Harness::new(Reply::Hang);
    let action = Action::new(h.signed_client(), GET_ACCOUNT_META);

    let (tx, rx) = mpsc::channel();
    let handle = action
        .execute_async_with(
            &(),
            None,
            Some(Box::new(move |r: &Result<String>| {
                tx.send(r.as_ref().map_err(|e| e.kind()).cloned()).unwrap();
            })),
        )
        .unwrap();

    let err = handle
        .get_with_timeout(Duration::from_millis(100))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(!handle.is_done());
    assert!(rx.try_recv().is_err());

    assert!(handle.cancel());
    assert_eq!(handle.get().unwrap_err().kind(), ErrorKind::Cancelled);
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(1)).unwrap(),
        Err(ErrorKind::Cancelled)
    );
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_blocking_execute_uses_socket_timeout() {
    let h = Harness::new(Reply::Hang);
    let client = h.client(Config {
        endpoint: ENDPOINT.to_string(),
        socket_timeout: Duration::from_millis(100),
        ..Default::default()
    });
    let action = Action::new(client, GET_ACCOUNT_META);

    let err = action.execute(&()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

fn parse_out_of_range(_: &ResponseMessage, _: &()) -> Result<String> {
    panic!("parser bug: index out of range")
}

const GET_ACCOUNT_META_BROKEN: ActionDef<(), String> = ActionDef {
    name: "GetAccountMeta",
    method: Method::GET,
    build_request: build_account_meta,
    parse_result: Some(parse_out_of_range),
    parse_error: parse_error_envelope,
};

#[test]
fn test_panicking_parser_completes_with_unexpected_error() {
    let h = Harness::new(Reply::Respond(StatusCode::OK, ACCOUNT_META_BODY));
    let client = h.client(Config {
        endpoint: ENDPOINT.to_string(),
        socket_timeout: Duration::from_secs(10),
        generate_request_id: true,
        ..Default::default()
    });
    let action = Action::new(client, GET_ACCOUNT_META_BROKEN);
    let request_id = action.request_id().map(|v| v.to_string());

    let (tx, rx) = mpsc::channel();
    let handle = action
        .execute_async_with(
            &(),
            None,
            Some(Box::new(move |r: &Result<String>| {
                tx.send(r.clone().map_err(|e| e.kind())).unwrap();
            })),
        )
        .unwrap();

    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        Err(ErrorKind::Unexpected)
    );
    let err = handle.get_with_timeout(Duration::from_secs(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unexpected);
    assert_eq!(err.category(), ErrorCategory::Local);
    assert!(err.message().contains("index out of range"));
    assert_eq!(err.request_id().map(|v| v.to_string()), request_id);
    assert!(handle.is_done());
    assert!(!handle.cancel());

    // Blocking calls see the same failure instead of waiting out the timeout.
    let err = action.execute(&()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unexpected);
}

#[test]
fn test_callback_runs_once_on_success() {
    let h = Harness::new(Reply::Respond(StatusCode::OK, ACCOUNT_META_BODY));
    let action = Action::new(h.signed_client(), GET_ACCOUNT_META);

    let (tx, rx) = mpsc::channel();
    let handle = action
        .execute_async_with(
            &(),
            None,
            Some(Box::new(move |r: &Result<String>| {
                tx.send(r.clone().unwrap()).unwrap();
            })),
        )
        .unwrap();

    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        "mns-logs"
    );
    assert!(handle.is_success());
    assert_eq!(handle.get().unwrap(), "mns-logs");
    assert!(!handle.cancel());
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_default_value_without_result_parser() -> anyhow::Result<()> {
    let h = Harness::new(Reply::Respond(StatusCode::NO_CONTENT, ""));
    let action = Action::new(h.signed_client(), GET_PATH);

    action.execute(&"/queues/q1".to_string())?;
    assert_eq!(h.http.requests().len(), 1);
    Ok(())
}

#[test]
fn test_no_runtime() {
    let ctx = Context::new().with_http_send(MockHttpSend::new(Reply::Fail));
    let client = Client::new(
        ctx,
        Config {
            endpoint: ENDPOINT.to_string(),
            ..Default::default()
        },
    )
    .unwrap();
    let action = Action::new(client, GET_ACCOUNT_META);

    let err = action.execute_async(&()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_calls_on_shared_action() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let http = MockHttpSend::new(Reply::Respond(StatusCode::OK, ACCOUNT_META_BODY));
    let ctx = Context::new().with_http_send(http.clone());
    let client = Client::new(
        ctx,
        Config {
            endpoint: ENDPOINT.to_string(),
            access_key_id: Some("AK".to_string()),
            access_key_secret: Some("SK".to_string()),
            ..Default::default()
        },
    )?;
    let action = Arc::new(Action::new(client, GET_ACCOUNT_META));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let action = action.clone();
        tasks.push(tokio::spawn(async move { action.call(&()).await }));
    }
    for task in tasks {
        assert_eq!(task.await??, "mns-logs");
    }
    assert_eq!(http.requests().len(), 16);
    Ok(())
}
