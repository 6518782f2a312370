// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

use crate::error::DecodeError;

/// Lifecycle state of an alert as reported by Alertmanager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertStatus {
    Firing,
    Resolved,
    Unknown,
}

impl From<&str> for AlertStatus {
    fn from(status: &str) -> Self {
        match status {
            "firing" => AlertStatus::Firing,
            "resolved" => AlertStatus::Resolved,
            _ => AlertStatus::Unknown,
        }
    }
}

/// Webhook envelope. Only `alerts` is read, every other envelope field is discarded.
#[derive(Debug, Deserialize)]
struct WebhookPayload {
    alerts: Vec<AlertRecord>,
}

/// A single firing or resolved condition from the webhook `alerts` list.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AlertRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    labels: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    annotations: HashMap<String, String>,
    #[serde(rename = "startsAt", default)]
    starts_at: Option<String>,
    #[serde(rename = "generatorURL", default, deserialize_with = "null_as_default")]
    tool_url: String,
}

/// Reads an explicit `null` the same way as an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl AlertRecord {
    pub fn new(
        status: &str,
        labels: HashMap<String, String>,
        annotations: HashMap<String, String>,
        starts_at: Option<&str>,
        tool_url: &str,
    ) -> Self {
        AlertRecord {
            status: status.to_string(),
            labels,
            annotations,
            starts_at: starts_at.map(str::to_string),
            tool_url: tool_url.to_string(),
        }
    }

    pub fn status(&self) -> AlertStatus {
        AlertStatus::from(self.status.as_str())
    }

    /// Returns the label value, or an empty string when the label is absent.
    pub fn label(&self, name: &str) -> &str {
        self.labels.get(name).map(String::as_str).unwrap_or("")
    }

    /// Returns the annotation value, or an empty string when the annotation is absent.
    pub fn annotation(&self, name: &str) -> &str {
        self.annotations.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn starts_at(&self) -> Option<&str> {
        self.starts_at.as_deref()
    }

    pub fn tool_url(&self) -> &str {
        &self.tool_url
    }
}

/// Parses an Alertmanager webhook body into its alerts, keeping their order.
///
/// Any body that is not an object carrying an `alerts` array fails as a whole.
pub fn decode(payload: &[u8]) -> Result<Vec<AlertRecord>, DecodeError> {
    let payload: WebhookPayload = serde_json::from_slice(payload)?;
    Ok(payload.alerts)
}
