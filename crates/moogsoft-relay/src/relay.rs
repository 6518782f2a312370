// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{http, Method, Request, Response, StatusCode};
use serde_json::json;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config;
use crate::http_utils::{
    log_and_create_http_response, verify_request_content_length, HttpResponse,
};
use crate::webhook_processor::WebhookProcessor;

pub const WEBHOOK_ENDPOINT_PATH: &str = "/prometheus_webhook_event";
pub const INFO_ENDPOINT_PATH: &str = "/info";
const RELAY_HOST: [u8; 4] = [0, 0, 0, 0];

/// HTTP front of the relay: receives Alertmanager webhooks and hands them to the processor.
pub struct Relay {
    pub config: Arc<config::Config>,
    pub webhook_processor: Arc<dyn WebhookProcessor + Send + Sync>,
}

impl Relay {
    /// Binds the configured port on all interfaces and serves until a fatal listener error.
    pub async fn start_relay(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from((RELAY_HOST, self.config.port));
        let listener = TcpListener::bind(&addr).await?;
        info!("Relay started: listening on {}", listener.local_addr()?);
        self.serve(listener).await
    }

    /// Serves connections accepted on an already bound listener.
    pub async fn serve(
        &self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let webhook_processor = self.webhook_processor.clone();
        let endpoint_config = self.config.clone();

        let service = service_fn(move |req: Request<Incoming>| {
            // called for each http request
            let webhook_processor = webhook_processor.clone();
            let endpoint_config = endpoint_config.clone();

            Relay::endpoint_handler(endpoint_config, req, webhook_processor)
        });

        let server = hyper::server::conn::http1::Builder::new();
        let mut joinset = tokio::task::JoinSet::new();

        loop {
            let conn = tokio::select! {
                con_res = listener.accept() => match con_res {
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::ConnectionAborted
                                | io::ErrorKind::ConnectionReset
                                | io::ErrorKind::ConnectionRefused
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        error!("Server error: {e}");
                        return Err(e.into());
                    }
                    Ok((conn, _)) => conn,
                },
                finished = async {
                    match joinset.join_next().await {
                        Some(finished) => finished,
                        None => std::future::pending().await,
                    }
                } => match finished {
                    Err(e) if e.is_panic() => {
                        error!("Connection handler panicked: {:?}", e);
                        continue;
                    },
                    Ok(()) | Err(_) => continue,
                },
            };
            let conn = hyper_util::rt::TokioIo::new(conn);
            let server = server.clone();
            let service = service.clone();
            joinset.spawn(async move {
                if let Err(e) = server.serve_connection(conn, service).await {
                    error!("Connection error: {e}");
                }
            });
        }
    }

    async fn endpoint_handler(
        config: Arc<config::Config>,
        req: Request<Incoming>,
        webhook_processor: Arc<dyn WebhookProcessor + Send + Sync>,
    ) -> http::Result<HttpResponse> {
        match (req.method(), req.uri().path()) {
            (&Method::POST, WEBHOOK_ENDPOINT_PATH) => {
                match Self::webhook_handler(config, req, webhook_processor).await {
                    Ok(res) => Ok(res),
                    Err(err) => log_and_create_http_response(
                        &format!("Error processing alerts: {err}"),
                        StatusCode::INTERNAL_SERVER_ERROR,
                    ),
                }
            }
            (&Method::GET, INFO_ENDPOINT_PATH) => match Self::info_handler(&config) {
                Ok(res) => Ok(res),
                Err(err) => log_and_create_http_response(
                    &format!("Info endpoint error: {err}"),
                    StatusCode::INTERNAL_SERVER_ERROR,
                ),
            },
            _ => {
                let mut not_found = Response::new(Full::new(Bytes::new()));
                *not_found.status_mut() = StatusCode::NOT_FOUND;
                Ok(not_found)
            }
        }
    }

    async fn webhook_handler(
        config: Arc<config::Config>,
        req: Request<Incoming>,
        webhook_processor: Arc<dyn WebhookProcessor + Send + Sync>,
    ) -> http::Result<HttpResponse> {
        debug!("Received alertmanager webhook");

        let (parts, body) = req.into_parts();
        if let Some(response) = verify_request_content_length(
            &parts.headers,
            config.max_request_content_length,
            "Error processing alerts",
        ) {
            return response;
        }

        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                return log_and_create_http_response(
                    &format!("Error reading alerts request body: {e}"),
                    StatusCode::BAD_REQUEST,
                );
            }
        };

        // double check body size in case transfer encoding is used
        if body.len() > config.max_request_content_length {
            return log_and_create_http_response(
                "Error processing alerts: Payload too large",
                StatusCode::PAYLOAD_TOO_LARGE,
            );
        }

        webhook_processor.process_alerts(config, body).await
    }

    fn info_handler(config: &config::Config) -> http::Result<HttpResponse> {
        let response_json = json!({
            "moogsoft_url": config.moogsoft_intake.url,
            "moogsoft_events_endpoint": config.moogsoft_intake.events_endpoint,
            "moogsoft_token": config.moogsoft_intake.redacted_token(),
        });
        Response::builder()
            .status(200)
            .header(hyper::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(response_json.to_string())))
    }
}
