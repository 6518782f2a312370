// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// The inbound body could not be read as an Alertmanager webhook payload.
#[derive(Debug, thiserror::Error)]
#[error("Malformed alert payload: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// Per-alert failures that prevent an event from being built.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("Unable to parse startsAt '{value}': {source}")]
    TimestampParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Alert is missing required field '{0}'")]
    MissingField(&'static str),
}

/// Failures raised while talking to the Moogsoft events endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Failed to serialize events: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Error sending events to Moogsoft: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Request level failures of the webhook pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    MalformedPayload(#[from] DecodeError),

    #[error("Alert {index} could not be mapped: {source}")]
    BatchAborted {
        index: usize,
        #[source]
        source: MappingError,
    },

    #[error(transparent)]
    Downstream(#[from] ForwardError),
}
