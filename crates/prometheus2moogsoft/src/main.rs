// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, sync::Arc};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use moogsoft_relay::{config, forwarder, relay, webhook_processor};

#[tokio::main]
pub async fn main() {
    let log_level = match env::var("DEBUG") {
        Ok(val) if !val.is_empty() => "debug".to_string(),
        _ => env::var("LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or("info".to_string()),
    };

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match config::Config::new() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Error creating config on relay startup: {e}");
            return;
        }
    };
    debug!("Loaded configuration: {:?}", config);

    let forwarder = Arc::new(forwarder::MoogsoftForwarder::new(Arc::clone(&config)));
    let webhook_processor = Arc::new(webhook_processor::MoogsoftWebhookProcessor { forwarder });

    let relay = relay::Relay {
        config: Arc::clone(&config),
        webhook_processor,
    };

    info!(
        "Forwarding alerts to {}",
        config.moogsoft_intake.events_url()
    );
    if let Err(e) = relay.start_relay().await {
        error!("Error when running prometheus2moogsoft relay: {e:?}");
    }
}
