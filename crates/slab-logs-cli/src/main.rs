// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

mod args;
mod exit_codes;

use clap::Parser;
use tracing::debug;

use slab_logs::{logger, Config, Error, RouterMap};

use args::Cli;

#[tokio::main(flavor = "current_thread")]
pub async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init(cli.log_level) {
        eprintln!("slab-logs: unable to initialize logging: {e}");
    }
    debug!("Logging subsystem enabled");

    let options = cli.report_options();
    let code = match run(&cli).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("slab-logs: {}", options.error_mode.describe(&e));
            exit_code(&e)
        }
    };
    std::process::exit(code);
}

async fn run(cli: &Cli) -> Result<(), Error> {
    // Nothing is searched unless the whole router map loads.
    let router_map = RouterMap::load(&cli.router_map)?;

    let mut config = Config::new(router_map, cli.multicast.as_str());
    if let Some(host) = &cli.host {
        config = config.with_backend_host(host.as_str());
    }
    if let Some(port) = cli.port {
        config = config.with_backend_port(port);
    }

    let report = slab_logs::run(&config, cli.report_options(), std::io::stdout()).await?;
    report.into_result()?;
    Ok(())
}

fn exit_code(err: &Error) -> i32 {
    if err.is_aggregate_failure() {
        exit_codes::MISSING_LOGS
    } else {
        exit_codes::CONFIG_ERROR
    }
}
