// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::str::FromStr;

use chrono::DateTime;
use tracing::{debug, warn};

use crate::alert::{AlertRecord, AlertStatus};
use crate::error::MappingError;
use crate::event::{EventRecord, Severity};

const MANAGER: &str = "Prometheus";
const CLASS: &str = "PCF";
const JSON_VERSION: &str = "2";
const SIGNATURE_SEPARATOR: &str = "::";

/// Read-only values shared by every alert of a request.
#[derive(Clone, Debug, Default)]
pub struct MappingContext {
    pub environment: String,
    pub xmatters_group_name: String,
}

/// Non-fatal result of mapping a single alert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MappingOutcome {
    Mapped,
    /// The alert was forwarded through the fallback rule.
    UnsupportedService(String),
}

/// What to do with a batch when one of its alerts cannot be mapped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimestampPolicy {
    /// Skip the offending alert and forward the rest.
    #[default]
    DropAlert,
    /// Fail the whole batch.
    AbortBatch,
}

impl FromStr for TimestampPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drop" => Ok(TimestampPolicy::DropAlert),
            "abort" => Ok(TimestampPolicy::AbortBatch),
            other => Err(format!(
                "Invalid timestamp failure policy '{other}'. Must be one of: drop, abort"
            )),
        }
    }
}

/// Labels identifying a BOSH deployment, job or job process.
#[derive(Debug, PartialEq, Eq)]
pub struct BoshLabels<'a> {
    pub alertname: &'a str,
    pub environment: &'a str,
    pub bosh_name: &'a str,
    pub bosh_job_az: &'a str,
    pub bosh_deployment: &'a str,
    pub bosh_job_name: &'a str,
    pub bosh_job_index: &'a str,
    pub bosh_job_ip: &'a str,
}

/// Service families recognised from the `service` label, each borrowing the
/// labels its signature is built from.
#[derive(Debug, PartialEq, Eq)]
pub enum ServiceFamily<'a> {
    Bosh {
        service: &'a str,
        labels: BoshLabels<'a>,
    },
    CloudFoundry {
        alertname: &'a str,
        environment: &'a str,
        bosh_deployment: &'a str,
    },
    Prometheus {
        alertname: &'a str,
        bosh_deployment: &'a str,
        job: &'a str,
    },
    Unsupported {
        service: &'a str,
        description: &'a str,
    },
}

impl<'a> ServiceFamily<'a> {
    pub fn classify(alert: &'a AlertRecord) -> Self {
        match alert.label("service") {
            service @ ("bosh-deployment" | "bosh-job" | "bosh-job-process") => {
                ServiceFamily::Bosh {
                    service,
                    labels: BoshLabels {
                        alertname: alert.label("alertname"),
                        environment: alert.label("environment"),
                        bosh_name: alert.label("bosh_name"),
                        bosh_job_az: alert.label("bosh_job_az"),
                        bosh_deployment: alert.label("bosh_deployment"),
                        bosh_job_name: alert.label("bosh_job_name"),
                        bosh_job_index: alert.label("bosh_job_index"),
                        bosh_job_ip: alert.label("bosh_job_ip"),
                    },
                }
            }
            "cf" => ServiceFamily::CloudFoundry {
                alertname: alert.label("alertname"),
                environment: alert.label("environment"),
                bosh_deployment: alert.label("bosh_deployment"),
            },
            "prometheus" => ServiceFamily::Prometheus {
                alertname: alert.label("alertname"),
                bosh_deployment: alert.label("bosh_deployment"),
                job: alert.label("job"),
            },
            service => ServiceFamily::Unsupported {
                service,
                description: alert.annotation("description"),
            },
        }
    }

    /// Raw `service` value reported as the event type.
    pub fn event_type(&self) -> &'a str {
        match self {
            ServiceFamily::Bosh { service, .. } => *service,
            ServiceFamily::CloudFoundry { .. } => "cf",
            ServiceFamily::Prometheus { .. } => "prometheus",
            ServiceFamily::Unsupported { service, .. } => *service,
        }
    }

    pub fn signature(&self) -> String {
        match self {
            ServiceFamily::Bosh { labels, .. } => [
                labels.alertname,
                labels.environment,
                labels.bosh_name,
                labels.bosh_job_az,
                labels.bosh_deployment,
                labels.bosh_job_name,
                labels.bosh_job_index,
            ]
            .join(SIGNATURE_SEPARATOR),
            ServiceFamily::CloudFoundry {
                alertname,
                environment,
                bosh_deployment,
            } => [*alertname, *environment, *bosh_deployment].join(SIGNATURE_SEPARATOR),
            ServiceFamily::Prometheus {
                alertname,
                bosh_deployment,
                job,
            } => [*alertname, *bosh_deployment, *job].join(SIGNATURE_SEPARATOR),
            ServiceFamily::Unsupported { description, .. } => description.to_string(),
        }
    }

    /// Identity used by Moogsoft to group events; the signature unless the
    /// family defines its own.
    pub fn external_id(&self, signature: &str) -> String {
        match self {
            ServiceFamily::Bosh { labels, .. } => {
                [labels.environment, labels.bosh_name, labels.bosh_deployment].join("/")
            }
            _ => signature.to_string(),
        }
    }

    fn ip_address(&self) -> &'a str {
        match self {
            ServiceFamily::Bosh { labels, .. } => labels.bosh_job_ip,
            _ => "",
        }
    }
}

/// Resolves the Moogsoft severity from the alert status and `severity` label.
pub fn severity(status: AlertStatus, severity_label: &str) -> Severity {
    match (status, severity_label) {
        (AlertStatus::Firing, "critical") => Severity::Critical,
        (AlertStatus::Firing, "warning") => Severity::Major,
        (AlertStatus::Resolved, _) => Severity::Clear,
        _ => Severity::Indeterminate,
    }
}

/// Converts an RFC 3339 `startsAt` value into unix epoch seconds.
pub fn agent_time(starts_at: &str) -> Result<String, MappingError> {
    let parsed =
        DateTime::parse_from_rfc3339(starts_at).map_err(|source| MappingError::TimestampParse {
            value: starts_at.to_string(),
            source,
        })?;
    Ok(parsed.timestamp().to_string())
}

/// Builds the Moogsoft event for one alert.
pub fn map(
    alert: &AlertRecord,
    context: &MappingContext,
) -> Result<(EventRecord, MappingOutcome), MappingError> {
    let starts_at = alert
        .starts_at()
        .ok_or(MappingError::MissingField("startsAt"))?;
    let agent_time = agent_time(starts_at)?;

    let family = ServiceFamily::classify(alert);
    let signature = family.signature();

    let (severity, outcome) = match &family {
        ServiceFamily::Unsupported { service, .. } => (
            Severity::Indeterminate,
            MappingOutcome::UnsupportedService(service.to_string()),
        ),
        _ => (
            self::severity(alert.status(), alert.label("severity")),
            MappingOutcome::Mapped,
        ),
    };

    let event = EventRecord {
        external_id: family.external_id(&signature),
        signature,
        manager: MANAGER.to_string(),
        class: CLASS.to_string(),
        event_type: family.event_type().to_string(),
        severity,
        description: alert.annotation("description").to_string(),
        agent_time,
        agent: context.environment.clone(),
        xmatters_group_name: context.xmatters_group_name.clone(),
        tool_url: alert.tool_url().to_string(),
        ip_address: family.ip_address().to_string(),
        json_version: JSON_VERSION.to_string(),
        ..Default::default()
    };

    Ok((event, outcome))
}

/// An alert left out of the forwarded batch.
#[derive(Debug)]
pub struct SkippedAlert {
    pub index: usize,
    pub error: MappingError,
}

/// Result of mapping every alert of a webhook call.
#[derive(Debug, Default)]
pub struct MappedBatch {
    pub events: Vec<EventRecord>,
    pub unsupported_services: Vec<String>,
    pub skipped: Vec<SkippedAlert>,
}

/// Maps alerts in order. Unsupported services are collected as warnings;
/// unmappable alerts are skipped or abort the batch according to `policy`.
///
/// On abort, returns the index of the failing alert with its error.
pub fn map_batch(
    alerts: &[AlertRecord],
    context: &MappingContext,
    policy: TimestampPolicy,
) -> Result<MappedBatch, (usize, MappingError)> {
    let mut batch = MappedBatch {
        events: Vec::with_capacity(alerts.len()),
        ..Default::default()
    };

    for (index, alert) in alerts.iter().enumerate() {
        match map(alert, context) {
            Ok((event, MappingOutcome::Mapped)) => batch.events.push(event),
            Ok((event, MappingOutcome::UnsupportedService(service))) => {
                warn!("Unsupported service: '{service}', forwarding alert {index} with fallback signature");
                batch.events.push(event);
                batch.unsupported_services.push(service);
            }
            Err(error) => match policy {
                TimestampPolicy::DropAlert => {
                    warn!("Dropping alert {index}: {error}");
                    batch.skipped.push(SkippedAlert { index, error });
                }
                TimestampPolicy::AbortBatch => return Err((index, error)),
            },
        }
    }

    debug!(
        "Mapped {} of {} alerts into events",
        batch.events.len(),
        alerts.len()
    );
    Ok(batch)
}
