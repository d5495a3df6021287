// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Report rendering.
//!
//! The text report is streamed while the router map is traversed:
//!
//! ```text
//! D1: E1 (dst 5)
//!   slabA
//!     error: no logs found
//!   slabB
//!     boot ok
//! ```
//!
//! The JSON report is written once, after the last device.

use std::io::{self, Write};

use serde::Serialize;

use crate::aggregator::{DeviceOutcome, DeviceReport, RunReport};
use crate::config::OutputFormat;
use crate::topology::RouterMapEntry;

/// Receives traversal events in order.
pub trait ReportSink {
    /// Called before the devices of `destination` are searched.
    fn destination(&mut self, destination: &str, entry: &RouterMapEntry) -> io::Result<()>;
    fn device(&mut self, report: &DeviceReport) -> io::Result<()>;
    fn finish(&mut self, report: &RunReport) -> io::Result<()>;
}

pub struct TextSink<W> {
    writer: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for TextSink<W> {
    fn destination(&mut self, destination: &str, entry: &RouterMapEntry) -> io::Result<()> {
        writeln!(
            self.writer,
            "{destination}: {} (dst {})",
            entry.engineering_label, entry.output_id
        )
    }

    fn device(&mut self, report: &DeviceReport) -> io::Result<()> {
        writeln!(self.writer, "  {}", report.device)?;
        match &report.outcome {
            DeviceOutcome::Found(lines) => {
                for line in lines {
                    writeln!(self.writer, "    {line}")?;
                }
            }
            DeviceOutcome::EmptyLogs => writeln!(self.writer, "    error: no logs found")?,
            DeviceOutcome::TransportError(err) => writeln!(self.writer, "    error: {err}")?,
        }
        // keep streamed output visible to a watching runner
        self.writer.flush()
    }

    fn finish(&mut self, report: &RunReport) -> io::Result<()> {
        if report.device_count() > 0 {
            writeln!(
                self.writer,
                "{} of {} devices reported logs",
                report.device_count() - report.missing_count(),
                report.device_count()
            )?;
        }
        self.writer.flush()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    success: bool,
    total: usize,
    missing: usize,
    devices: &'a [DeviceReport],
}

/// Writes nothing until the run finishes, then renders the [`RunReport`] as
/// one document.
pub struct JsonSink<W> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn destination(&mut self, _destination: &str, _entry: &RouterMapEntry) -> io::Result<()> {
        Ok(())
    }

    fn device(&mut self, _report: &DeviceReport) -> io::Result<()> {
        Ok(())
    }

    fn finish(&mut self, report: &RunReport) -> io::Result<()> {
        let document = JsonReport {
            success: report.missing_count() == 0,
            total: report.device_count(),
            missing: report.missing_count(),
            devices: report.devices(),
        };
        serde_json::to_writer_pretty(&mut self.writer, &document)?;
        writeln!(self.writer)?;
        self.writer.flush()
    }
}

/// Sink for `format` writing to `writer`.
pub fn sink_for<'w, W>(format: OutputFormat, writer: W) -> Box<dyn ReportSink + 'w>
where
    W: Write + 'w,
{
    match format {
        OutputFormat::Text => Box::new(TextSink::new(writer)),
        OutputFormat::Json => Box::new(JsonSink::new(writer)),
    }
}
