// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global stderr subscriber. `RUST_LOG` wins over the config level.
pub fn init(config_level: &str) -> Result<()> {
    let filter = build_filter(env::var(EnvFilter::DEFAULT_ENV).ok(), config_level)?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

fn build_filter(env_directives: Option<String>, config_level: &str) -> Result<EnvFilter> {
    match env_directives.filter(|value| !value.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(&directives).with_context(|| {
            format!("RUST_LOG={directives:?} is not a valid filter; unset it or use a level such as debug")
        }),
        None => EnvFilter::try_new(config_level)
            .with_context(|| format!("log level {config_level:?} is not a valid filter")),
    }
}
