// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Moogsoft severity scale, sent on the wire as its ordinal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Clear = 0,
    #[default]
    Indeterminate = 1,
    Minor = 2,
    Major = 3,
    Critical = 4,
}

impl Severity {
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Severity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Severity::Clear),
            1 => Ok(Severity::Indeterminate),
            2 => Ok(Severity::Minor),
            3 => Ok(Severity::Major),
            4 => Ok(Severity::Critical),
            other => Err(format!("invalid severity ordinal {other}")),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Clear => "CLEAR",
            Severity::Indeterminate => "INDETERMINATE",
            Severity::Minor => "MINOR",
            Severity::Major => "MAJOR",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(name)
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ordinal = u8::deserialize(deserializer)?;
        Severity::try_from(ordinal).map_err(de::Error::custom)
    }
}

/// One event in the Moogsoft events API format.
///
/// Enrichment fields that no mapping rule fills stay empty strings so the
/// downstream schema always receives the full field set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub signature: String,
    pub source: String,
    pub source_id: String,
    pub external_id: String,
    pub manager: String,
    pub class: String,
    pub agent_location: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub severity: Severity,
    pub description: String,
    pub agent_time: String,
    pub agent: String,
    #[serde(rename = "aonMetricName")]
    pub metric_name: String,
    #[serde(rename = "aonMetricValue")]
    pub metric_value: String,
    #[serde(rename = "aonMonitoredEntityName")]
    pub monitored_entity_name: String,
    #[serde(rename = "aonXMattersGroupName")]
    pub xmatters_group_name: String,
    #[serde(rename = "aonSNOWGroupName")]
    pub snow_group_name: String,
    #[serde(rename = "aonToolURL")]
    pub tool_url: String,
    #[serde(rename = "aonIPAddress")]
    pub ip_address: String,
    #[serde(rename = "aonIPSubnet")]
    pub ip_subnet: String,
    #[serde(rename = "aonJSONversion")]
    pub json_version: String,
}

/// Body of a single POST to the events endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventBatch {
    pub events: Vec<EventRecord>,
}
