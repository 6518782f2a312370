// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::{http, StatusCode};
use tracing::debug;

use crate::alert;
use crate::config::Config;
use crate::error::RelayError;
use crate::forwarder::EventForwarder;
use crate::http_utils::{log_and_create_http_response, HttpResponse};
use crate::mapper;

#[async_trait]
pub trait WebhookProcessor {
    /// Decodes an Alertmanager webhook body, maps its alerts to Moogsoft events and forwards
    /// them, answering with the outcome of the downstream call.
    async fn process_alerts(
        &self,
        config: Arc<Config>,
        body: Bytes,
    ) -> http::Result<HttpResponse>;
}

pub struct MoogsoftWebhookProcessor {
    pub forwarder: Arc<dyn EventForwarder + Send + Sync>,
}

#[async_trait]
impl WebhookProcessor for MoogsoftWebhookProcessor {
    async fn process_alerts(
        &self,
        config: Arc<Config>,
        body: Bytes,
    ) -> http::Result<HttpResponse> {
        if config.debug_payloads {
            debug!("Received payload: {}", String::from_utf8_lossy(&body));
        }

        let alerts = match alert::decode(&body) {
            Ok(alerts) => alerts,
            Err(err) => {
                return log_and_create_http_response(
                    &RelayError::from(err).to_string(),
                    StatusCode::BAD_REQUEST,
                );
            }
        };
        debug!("Received {} alerts to process", alerts.len());

        let batch = match mapper::map_batch(
            &alerts,
            &config.mapping_context(),
            config.timestamp_policy,
        ) {
            Ok(batch) => batch,
            Err((index, source)) => {
                return log_and_create_http_response(
                    &RelayError::BatchAborted { index, source }.to_string(),
                    StatusCode::UNPROCESSABLE_ENTITY,
                );
            }
        };

        if batch.events.is_empty() {
            return log_and_create_http_response("no events to send", StatusCode::OK);
        }

        let status = match self
            .forwarder
            .send(batch.events, &config.moogsoft_intake.token)
            .await
        {
            Ok(status) => status,
            Err(err) => {
                return log_and_create_http_response(
                    &RelayError::from(err).to_string(),
                    StatusCode::INTERNAL_SERVER_ERROR,
                );
            }
        };

        if status.is_success() {
            log_and_create_http_response("events sent", status)
        } else {
            log_and_create_http_response(
                &format!("Moogsoft rejected events with status {}", status.as_u16()),
                status,
            )
        }
    }
}
