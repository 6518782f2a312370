// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Fake Moogsoft events endpoint that only accepts a single Basic token

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use moogsoft_relay::event::{EventBatch, EventRecord};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const EVENTS_ENDPOINT: &str = "/custom_moogsoft_events";

#[derive(Clone)]
pub struct MockMoogsoft {
    pub addr: SocketAddr,
    pub received_events: Arc<Mutex<Vec<EventRecord>>>,
    pub request_count: Arc<Mutex<usize>>,
}

impl MockMoogsoft {
    /// Start the fake endpoint on a random port
    pub async fn start(token: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Failed to get local addr");

        let received_events = Arc::new(Mutex::new(Vec::new()));
        let request_count = Arc::new(Mutex::new(0));
        let expected_auth = format!("Basic {token}");

        let events_clone = received_events.clone();
        let count_clone = request_count.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };

                let io = TokioIo::new(stream);
                let events = events_clone.clone();
                let count = count_clone.clone();
                let expected_auth = expected_auth.clone();

                tokio::spawn(async move {
                    let service = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let events = events.clone();
                        let count = count.clone();
                        let expected_auth = expected_auth.clone();
                        async move {
                            *count.lock().unwrap() += 1;
                            let authorized = req.uri().path() == EVENTS_ENDPOINT
                                && req
                                    .headers()
                                    .get("Authorization")
                                    .and_then(|v| v.to_str().ok())
                                    == Some(expected_auth.as_str());

                            let body_bytes = req
                                .into_body()
                                .collect()
                                .await
                                .map(|collected| collected.to_bytes())
                                .unwrap_or_default();

                            let (status, body) = if authorized {
                                let batch: EventBatch = serde_json::from_slice(&body_bytes)
                                    .expect("relay sent an invalid events body");
                                events.lock().unwrap().extend(batch.events);
                                (200, "")
                            } else {
                                (403, "Your credentials are invalid")
                            };

                            Ok::<_, hyper::http::Error>(
                                Response::builder()
                                    .status(status)
                                    .body(Full::new(Bytes::from(body)))
                                    .unwrap(),
                            )
                        }
                    });

                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        MockMoogsoft {
            addr,
            received_events,
            request_count,
        }
    }

    /// Get the base URL of the fake endpoint
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.received_events.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        *self.request_count.lock().unwrap()
    }
}
