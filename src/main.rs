//! nicotrans
//!
//! Intercepts the nicovideo comment API on this machine and returns every
//! comment translated.
//!
//! # Architecture Overview
//!
//! ```text
//!   startup:  hosts redirect ──▶ root certificate ──▶ HTTPS listener
//!
//!   client ──POST /api.json/──▶ http handler
//!                                  │
//!                                  ├─▶ comments::upstream ──(dns bypass)──▶ real API
//!                                  ├─▶ comments::records   extract chat text
//!                                  ├─▶ translation::engine chunk ▶ translate ▶ recover
//!                                  └─▶ comments::records   reassemble ──▶ client
//! ```

use std::process::ExitCode;

use clap::Parser;

use nicotrans::cli::Args;
use nicotrans::config::{read_config, validate_config, ProxyConfig};
use nicotrans::lifecycle::{self, Startup};
use nicotrans::observability::{logging, metrics};
use nicotrans::redirect::platform_privilege;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match read_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => ProxyConfig::default(),
    };
    args.apply_overrides(&mut config);

    if let Err(errors) = validate_config(&config) {
        eprintln!("Invalid configuration:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return ExitCode::FAILURE;
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "nicotrans starting");
    tracing::info!(
        address = %config.listener.bind_address(),
        domain = %config.upstream.domain,
        source = %config.translation.source,
        target = %config.translation.target,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let privilege = platform_privilege();
    match lifecycle::run(config, privilege.as_ref()).await {
        Ok(Startup::Stopped) | Ok(Startup::Relaunched) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "nicotrans stopped with an error");
            ExitCode::FAILURE
        }
    }
}
