// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Failures while reading or validating the router map. Always fatal, raised
/// before any search request is issued.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("unable to read router map {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse router map {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid router map entry '{destination}': {reason}")]
    Invalid { destination: String, reason: String },
}

/// Errors in the statically known run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("invalid search endpoint url '{url}': {source}")]
    Endpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Per-device search failure. The aggregator folds these into the missing-logs
/// count; they never abort a run.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Connection, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not JSON or lacked the `hits` structure.
    #[error("unexpected search response: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Raised once after the whole router map was traversed and at least one
/// device produced no logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("missing logs for {missing} of {total} devices")]
pub struct AggregateFailure {
    pub missing: usize,
    pub total: usize,
}

/// Top level error surfaced to the binary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),

    #[error(transparent)]
    AggregateFailure(#[from] AggregateFailure),
}

impl Error {
    /// Whether this is the aggregate missing-logs outcome rather than a
    /// setup or I/O failure.
    #[must_use]
    pub fn is_aggregate_failure(&self) -> bool {
        matches!(self, Error::AggregateFailure(_))
    }
}
