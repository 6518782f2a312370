// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::ForwardError;
use crate::event::{EventBatch, EventRecord};
use crate::http_utils::build_client;

#[async_trait]
pub trait EventForwarder {
    /// Sends every event in one POST and returns the upstream status code unchanged.
    /// Only a failure to reach the endpoint is reported as an error.
    async fn send(
        &self,
        events: Vec<EventRecord>,
        credential: &str,
    ) -> Result<StatusCode, ForwardError>;
}

pub struct MoogsoftForwarder {
    events_url: String,
    client: reqwest::Client,
}

impl MoogsoftForwarder {
    pub fn new(config: Arc<Config>) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let client = build_client(config.proxy_url.as_deref(), timeout).unwrap_or_else(|e| {
            error!(
                "Unable to parse proxy configuration: {}, no proxy will be used",
                e
            );
            reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default()
        });
        MoogsoftForwarder {
            events_url: config.moogsoft_intake.events_url(),
            client,
        }
    }
}

#[async_trait]
impl EventForwarder for MoogsoftForwarder {
    async fn send(
        &self,
        events: Vec<EventRecord>,
        credential: &str,
    ) -> Result<StatusCode, ForwardError> {
        let n_events = events.len();
        let body = serde_json::to_vec(&EventBatch { events })?;

        let time = Instant::now();
        let response = self
            .client
            .post(&self.events_url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Basic {credential}"))
            .body(body)
            .send()
            .await?;
        let elapsed = time.elapsed();

        let status = response.status();
        if status.is_success() {
            debug!(
                "Moogsoft Forwarder | Sent {n_events} events in {} ms to {}",
                elapsed.as_millis(),
                self.events_url
            );
        } else {
            let body = response.text().await.unwrap_or_default();
            error!("Moogsoft Forwarder | Request failed with status {status}: {body:?}");
        }
        Ok(status)
    }
}
