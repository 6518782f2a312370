// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::Request;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use std::time::Duration;
use tokio::time::timeout;

/// Alertmanager webhook body carrying the given alerts
pub fn create_webhook_payload(alerts: serde_json::Value) -> Vec<u8> {
    serde_json::json!({
        "receiver": "default",
        "status": "firing",
        "groupLabels": {},
        "commonLabels": { "severity": "warning" },
        "commonAnnotations": {},
        "externalURL": "https://alertmanager.your-domain.com",
        "version": "4",
        "groupKey": "{}:{}",
        "alerts": alerts
    })
    .to_string()
    .into_bytes()
}

/// Send an HTTP request over TCP and return the status with the body as a string
pub async fn send_tcp_request(
    port: u16,
    uri: &str,
    method: &str,
    body: Option<Vec<u8>>,
) -> Result<(StatusCode, String), Box<dyn std::error::Error>> {
    let stream = timeout(
        Duration::from_secs(2),
        tokio::net::TcpStream::connect(format!("127.0.0.1:{}", port)),
    )
    .await??;

    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

    tokio::spawn(async move {
        let _ = conn.await;
    });

    let request_builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("Host", format!("127.0.0.1:{}", port))
        .header("Content-Type", "application/json");

    let response = if let Some(body_data) = body {
        let body_len = body_data.len();
        let request = request_builder
            .header("Content-Length", body_len.to_string())
            .body(Full::new(Bytes::from(body_data)).boxed())?;
        timeout(Duration::from_secs(5), sender.send_request(request)).await??
    } else {
        let request = request_builder.body(Empty::<Bytes>::new().boxed())?;
        timeout(Duration::from_secs(5), sender.send_request(request)).await??
    };

    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, String::from_utf8(bytes.to_vec())?))
}
