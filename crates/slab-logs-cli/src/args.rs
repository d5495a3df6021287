// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use clap::Parser;
use slab_logs::{ErrorMode, LogLevel, OutputFormat, ReportOptions};

#[derive(Parser, Debug)]
#[command(
    name = "slab-logs",
    version,
    about = "Report recent LWRP syslog entries for every slab in a router map"
)]
pub struct Cli {
    /// Multicast address the logs must mention
    #[arg(short = 'm', long = "multicast", env = "SLAB_LOGS_MULTICAST", value_name = "ADDR")]
    pub multicast: String,

    /// JSON router map: {"<dst key>": {"eng": ..., "dst": <n>, "slabs": [...]}}
    #[arg(short = 'r', long = "router-map", env = "SLAB_LOGS_ROUTER_MAP", value_name = "PATH")]
    pub router_map: PathBuf,

    /// Search backend host, queried on port 9200
    #[arg(long = "host", env = "SLAB_LOGS_HOST", value_name = "HOST")]
    pub host: Option<String>,

    /// Search backend port
    #[arg(long = "port", env = "SLAB_LOGS_PORT", value_name = "PORT")]
    pub port: Option<u16>,

    /// Report format
    #[arg(long, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Include underlying causes in error messages
    #[arg(short, long)]
    pub verbose: bool,

    /// Diagnostic log level written to stderr
    #[arg(long, env = "SLAB_LOGS_LOG_LEVEL", default_value = "warn")]
    pub log_level: LogLevel,
}

impl Cli {
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            format: self.format,
            error_mode: if self.verbose {
                ErrorMode::Verbose
            } else {
                ErrorMode::Brief
            },
        }
    }
}
