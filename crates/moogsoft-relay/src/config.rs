// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;

use crate::mapper::{MappingContext, TimestampPolicy};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Moogsoft endpoint and credential the relay forwards to.
#[derive(Clone)]
pub struct MoogsoftIntake {
    pub url: String,
    pub events_endpoint: String,
    pub token: String,
}

impl MoogsoftIntake {
    pub fn events_url(&self) -> String {
        format!("{}{}", self.url, self.events_endpoint)
    }

    /// Token as shown on the info endpoint.
    pub fn redacted_token(&self) -> &'static str {
        if self.token.is_empty() {
            ""
        } else {
            "[REDACTED]"
        }
    }
}

impl std::fmt::Debug for MoogsoftIntake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoogsoftIntake")
            .field("url", &self.url)
            .field("events_endpoint", &self.events_endpoint)
            .field("token", &self.redacted_token())
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub moogsoft_intake: MoogsoftIntake,
    /// value of the `agent` field on every event
    pub environment: String,
    pub xmatters_group_name: String,
    pub timestamp_policy: TimestampPolicy,
    pub max_request_content_length: usize,
    /// timeout for each request to Moogsoft, in seconds
    pub request_timeout_secs: u64,
    pub proxy_url: Option<String>,
    /// log raw inbound payloads
    pub debug_payloads: bool,
}

impl Config {
    pub fn new() -> Result<Config, Box<dyn std::error::Error>> {
        let url = env::var("MOOGSOFT_URL")
            .map_err(|_| anyhow::anyhow!("MOOGSOFT_URL environment variable is not set"))?;
        let events_endpoint = env::var("MOOGSOFT_ENDPOINT")
            .map_err(|_| anyhow::anyhow!("MOOGSOFT_ENDPOINT environment variable is not set"))?;

        let port = match env::var("PORT") {
            Ok(port) => port
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("Invalid PORT '{port}': {e}"))?,
            Err(_) => DEFAULT_PORT,
        };

        let timestamp_policy = match env::var("TIMESTAMP_FAILURE_POLICY") {
            Ok(policy) => policy.parse::<TimestampPolicy>().map_err(anyhow::Error::msg)?,
            Err(_) => TimestampPolicy::default(),
        };

        let request_timeout_secs = env::var("MOOGSOFT_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Config {
            port,
            moogsoft_intake: MoogsoftIntake {
                url,
                events_endpoint,
                token: env::var("MOOGSOFT_TOKEN").unwrap_or_default(),
            },
            environment: env::var("MOOGSOFT_ENV").unwrap_or_default(),
            xmatters_group_name: env::var("XMATTERS_GROUP_NAME").unwrap_or_default(),
            timestamp_policy,
            max_request_content_length: 10 * 1024 * 1024, // 10MB in Bytes
            request_timeout_secs,
            proxy_url: env::var("HTTPS_PROXY").ok(),
            debug_payloads: env::var("DEBUG").is_ok_and(|val| !val.is_empty()),
        })
    }

    pub fn mapping_context(&self) -> MappingContext {
        MappingContext {
            environment: self.environment.clone(),
            xmatters_group_name: self.xmatters_group_name.clone(),
        }
    }
}
