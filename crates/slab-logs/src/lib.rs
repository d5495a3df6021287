// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! Fetches recent syslog entries for broadcast slab devices and reports, per
//! device and for the whole router map, whether the expected log events exist.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod logger;
pub mod query;
pub mod report;
pub mod search;
pub mod topology;

pub use aggregator::{Aggregator, DeviceOutcome, DeviceReport, RunReport};
pub use config::{Config, ErrorMode, LogLevel, OutputFormat, ReportOptions};
pub use error::{AggregateFailure, ConfigError, Error, SearchError, TopologyError};
pub use query::{build_query, SearchQuery};
pub use search::{LogSearch, SearchClient, SearchEndpoint, SearchResult};
pub use topology::{RouterMap, RouterMapEntry};

use std::io::Write;

use tracing::{debug, warn};

/// Searches every device of `config.router_map` through `search`, streaming
/// the report to `writer`.
///
/// Per-device failures are part of the returned [`RunReport`]; call
/// [`RunReport::into_result`] to turn missing logs into an error.
pub async fn run_with<S, W>(
    config: &Config,
    search: &S,
    options: ReportOptions,
    writer: W,
) -> Result<RunReport, Error>
where
    S: LogSearch + ?Sized,
    W: Write,
{
    config.validate()?;
    if config.router_map.device_count() == 0 {
        warn!("Router map has no devices to search");
    }

    let mut sink = report::sink_for(options.format, writer);
    let report = Aggregator::new(search, &config.multicast_address)
        .with_error_mode(options.error_mode)
        .run(&config.router_map, sink.as_mut())
        .await?;

    debug!(
        "Run finished: {} devices, {} missing logs",
        report.device_count(),
        report.missing_count()
    );
    Ok(report)
}

/// Same as [`run_with`], querying the backend host from `config`.
pub async fn run<W: Write>(
    config: &Config,
    options: ReportOptions,
    writer: W,
) -> Result<RunReport, Error> {
    config.validate()?;
    let client = SearchClient::new(config.endpoint()?)?;
    debug!("Searching {}", client.endpoint().url());
    run_with(config, &client, options, writer).await
}
