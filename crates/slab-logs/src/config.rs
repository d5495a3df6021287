// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Run configuration.
//!
//! Everything a run needs is enumerated explicitly: the router map, the
//! multicast address filtered on, and an optional backend host. Presentation
//! settings (report format, error detail, log verbosity) live next to it.

use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::search::{SearchEndpoint, DEFAULT_HOST, DEFAULT_PORT};
use crate::topology::RouterMap;

#[derive(Debug, Clone)]
pub struct Config {
    pub router_map: RouterMap,
    /// Filtered on verbatim; not checked to be an IP address.
    pub multicast_address: String,
    /// Defaults to `127.0.0.1` when unset.
    pub backend_host: Option<String>,
    /// Defaults to `9200` when unset.
    pub backend_port: Option<u16>,
}

impl Config {
    pub fn new(router_map: RouterMap, multicast_address: impl Into<String>) -> Self {
        Self {
            router_map,
            multicast_address: multicast_address.into(),
            backend_host: None,
            backend_port: None,
        }
    }

    #[must_use]
    pub fn with_backend_host(mut self, host: impl Into<String>) -> Self {
        self.backend_host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_backend_port(mut self, port: u16) -> Self {
        self.backend_port = Some(port);
        self
    }

    pub fn backend_port(&self) -> u16 {
        self.backend_port.unwrap_or(DEFAULT_PORT)
    }

    pub fn backend_host(&self) -> &str {
        self.backend_host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.multicast_address.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "multicast address cannot be empty".to_string(),
            ));
        }

        if self.backend_host().trim().is_empty() {
            return Err(ConfigError::Invalid(
                "backend host cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolves the search endpoint for the configured backend host.
    pub fn endpoint(&self) -> Result<SearchEndpoint, ConfigError> {
        SearchEndpoint::with_port(self.backend_host(), self.backend_port())
    }
}

/// How much detail per-device errors carry in the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorMode {
    /// Top level message only.
    #[default]
    Brief,
    /// Message followed by every underlying cause not already part of it.
    Verbose,
}

impl ErrorMode {
    pub fn describe(self, err: &(dyn StdError + 'static)) -> String {
        let mut text = err.to_string();
        if self == ErrorMode::Verbose {
            let mut source = err.source();
            while let Some(cause) = source {
                let cause_text = cause.to_string();
                // Messages often already end with their direct source.
                if !text.ends_with(&cause_text) {
                    text.push_str(": ");
                    text.push_str(&cause_text);
                }
                source = cause.source();
            }
        }
        text
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Invalid output format: '{s}'. Valid formats are: text, json"
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub format: OutputFormat,
    pub error_mode: ErrorMode,
}

/// Verbosity of the diagnostic log written to stderr. Defaults to `Warn` so
/// only per-device problems show up next to the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl AsRef<str> for LogLevel {
    fn as_ref(&self) -> &str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl LogLevel {
    /// `EnvFilter` directive for this level. HTTP internals stay quiet.
    #[must_use]
    pub fn filter_directive(self) -> String {
        format!("h2=off,hyper=off,hyper_util=off,reqwest=off,{}", self.as_ref())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Invalid log level: '{s}'. Valid levels are: error, warn, info, debug, trace",
            )),
        }
    }
}
