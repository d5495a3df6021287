// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Router map traversal.
//!
//! Every device in every destination is searched exactly once, in router map
//! order. A device ends in one of three terminal states:
//!
//! | State            | Counts as missing |
//! |------------------|-------------------|
//! | `Found`          | no                |
//! | `EmptyLogs`      | yes               |
//! | `TransportError` | yes               |
//!
//! Failures are captured per device and never stop the traversal. The missing
//! count is only turned into an error once the whole map was visited.

use serde::Serialize;
use tracing::{debug, info_span, warn, Instrument};

use crate::config::ErrorMode;
use crate::error::{AggregateFailure, SearchError};
use crate::query::build_query;
use crate::report::ReportSink;
use crate::search::{LogSearch, SearchResult};
use crate::topology::{RouterMap, RouterMapEntry};

/// Terminal state of a single device search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DeviceOutcome {
    Found(Vec<String>),
    EmptyLogs,
    TransportError(String),
}

impl DeviceOutcome {
    fn from_search(result: Result<SearchResult, SearchError>, error_mode: ErrorMode) -> Self {
        match result {
            Ok(SearchResult::Found(lines)) if !lines.is_empty() => DeviceOutcome::Found(lines),
            Ok(_) => DeviceOutcome::EmptyLogs,
            Err(err) => DeviceOutcome::TransportError(error_mode.describe(&err)),
        }
    }

    /// Whether this outcome counts toward the missing-logs total.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        !matches!(self, DeviceOutcome::Found(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceReport {
    pub destination: String,
    pub engineering_label: String,
    pub output_id: u64,
    pub device: String,
    pub outcome: DeviceOutcome,
}

/// Accumulated result of a full traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    devices: Vec<DeviceReport>,
    missing: usize,
}

impl RunReport {
    fn record(&mut self, report: DeviceReport) {
        if report.outcome.is_missing() {
            self.missing += 1;
        }
        self.devices.push(report);
    }

    pub fn devices(&self) -> &[DeviceReport] {
        &self.devices
    }

    /// Devices that returned no logs or failed.
    pub fn missing_count(&self) -> usize {
        self.missing
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Ok only if every visited device returned at least one log line.
    pub fn into_result(self) -> Result<Vec<DeviceReport>, AggregateFailure> {
        if self.missing > 0 {
            return Err(AggregateFailure {
                missing: self.missing,
                total: self.devices.len(),
            });
        }
        Ok(self.devices)
    }
}

/// Drives one search per device and feeds each outcome to a [`ReportSink`].
pub struct Aggregator<'a, S: ?Sized> {
    search: &'a S,
    multicast_address: &'a str,
    error_mode: ErrorMode,
}

impl<'a, S: LogSearch + ?Sized> Aggregator<'a, S> {
    pub fn new(search: &'a S, multicast_address: &'a str) -> Self {
        Self {
            search,
            multicast_address,
            error_mode: ErrorMode::default(),
        }
    }

    #[must_use]
    pub fn with_error_mode(mut self, error_mode: ErrorMode) -> Self {
        self.error_mode = error_mode;
        self
    }

    /// Visits every device in `router_map`. Only sink I/O errors abort the run;
    /// search failures are recorded in the returned report.
    pub async fn run<K: ReportSink + ?Sized>(
        &self,
        router_map: &RouterMap,
        sink: &mut K,
    ) -> std::io::Result<RunReport> {
        let mut report = RunReport::default();

        for (destination, entry) in router_map.iter() {
            sink.destination(destination, entry)?;

            for device in &entry.device_names {
                let device_report = self
                    .search_device(destination, entry, device)
                    .instrument(info_span!("device", destination, device = device.as_str()))
                    .await;
                sink.device(&device_report)?;
                report.record(device_report);
            }
        }

        debug!(
            "Visited {} devices, {} missing logs",
            report.device_count(),
            report.missing_count()
        );
        sink.finish(&report)?;
        Ok(report)
    }

    async fn search_device(
        &self,
        destination: &str,
        entry: &RouterMapEntry,
        device: &str,
    ) -> DeviceReport {
        let query = build_query(device, entry.output_id, self.multicast_address);
        let result = self.search.execute(&query).await;
        let outcome = DeviceOutcome::from_search(result, self.error_mode);

        match &outcome {
            DeviceOutcome::Found(lines) => debug!("Found {} log lines", lines.len()),
            DeviceOutcome::EmptyLogs => warn!("No logs found"),
            DeviceOutcome::TransportError(err) => warn!("Search failed: {err}"),
        }

        DeviceReport {
            destination: destination.to_string(),
            engineering_label: entry.engineering_label.clone(),
            output_id: entry.output_id,
            device: device.to_string(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SearchQuery;
    use crate::report::TextSink;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned responses keyed by device name; records every device queried.
    #[derive(Default)]
    struct MockSearch {
        responses: HashMap<String, Result<SearchResult, u16>>,
        seen: Mutex<Vec<String>>,
    }

    impl MockSearch {
        fn respond(mut self, device: &str, result: Result<SearchResult, u16>) -> Self {
            self.responses.insert(device.to_string(), result);
            self
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LogSearch for MockSearch {
        async fn execute(&self, query: &SearchQuery) -> Result<SearchResult, SearchError> {
            let device = query.body()["query"]["bool"]["filter"][2]["match_phrase"]
                ["annotation.general.device_name"]
                .as_str()
                .unwrap()
                .to_string();
            self.seen.lock().unwrap().push(device.clone());
            match self.responses.get(&device) {
                Some(Ok(result)) => Ok(result.clone()),
                Some(Err(status)) => Err(SearchError::Status {
                    status: *status,
                    body: "boom".to_string(),
                }),
                None => Ok(SearchResult::NoLogsFound),
            }
        }
    }

    fn entry(label: &str, dst: u64, slabs: &[&str]) -> RouterMapEntry {
        RouterMapEntry {
            engineering_label: label.to_string(),
            output_id: dst,
            device_names: slabs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn found(lines: &[&str]) -> Result<SearchResult, u16> {
        Ok(SearchResult::Found(
            lines.iter().map(|s| s.to_string()).collect(),
        ))
    }

    async fn run(map: &RouterMap, search: &MockSearch) -> (RunReport, String) {
        let mut sink = TextSink::new(Vec::new());
        let report = Aggregator::new(search, "239.1.1.1")
            .run(map, &mut sink)
            .await
            .unwrap();
        (report, String::from_utf8(sink.into_inner()).unwrap())
    }

    #[tokio::test]
    async fn test_one_empty_device_fails_run() {
        let map = RouterMap::from_entries([("D1", entry("E1", 5, &["slabA", "slabB"]))]).unwrap();
        let search = MockSearch::default()
            .respond("slabA", Ok(SearchResult::NoLogsFound))
            .respond("slabB", found(&["boot ok"]));

        let (report, output) = run(&map, &search).await;

        assert_eq!(report.missing_count(), 1);
        assert_eq!(report.devices()[0].outcome, DeviceOutcome::EmptyLogs);
        assert_eq!(
            report.devices()[1].outcome,
            DeviceOutcome::Found(vec!["boot ok".to_string()])
        );
        assert!(output.contains("    error: no logs found"));
        assert!(output.contains("    boot ok"));
        assert_eq!(
            report.into_result(),
            Err(AggregateFailure {
                missing: 1,
                total: 2
            })
        );
    }

    #[tokio::test]
    async fn test_all_devices_found() {
        let map = RouterMap::from_entries([("D1", entry("E1", 5, &["slabA", "slabB"]))]).unwrap();
        let search = MockSearch::default()
            .respond("slabA", found(&["one"]))
            .respond("slabB", found(&["two", "three"]));

        let (report, _) = run(&map, &search).await;

        assert_eq!(report.missing_count(), 0);
        assert_eq!(report.into_result().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_traversal() {
        let map = RouterMap::from_entries([
            ("D1", entry("E1", 1, &["a1", "a2", "a3"])),
            ("D2", entry("E2", 2, &[])),
            ("D3", entry("E3", 3, &["c1", "c2"])),
        ])
        .unwrap();
        let search = MockSearch::default()
            .respond("a1", Err(503))
            .respond("a2", found(&["ok"]))
            .respond("a3", Ok(SearchResult::NoLogsFound))
            .respond("c1", Err(500))
            .respond("c2", found(&["ok"]));

        let (report, _) = run(&map, &search).await;

        assert_eq!(search.seen(), vec!["a1", "a2", "a3", "c1", "c2"]);
        assert_eq!(report.device_count(), map.device_count());
        assert_eq!(report.missing_count(), 3);
        assert!(matches!(
            report.devices()[0].outcome,
            DeviceOutcome::TransportError(_)
        ));
        assert_eq!(report.into_result().unwrap_err().missing, 3);
    }

    #[tokio::test]
    async fn test_found_with_no_lines_counts_as_missing() {
        let map = RouterMap::from_entries([("D1", entry("E1", 5, &["slabA"]))]).unwrap();
        let search = MockSearch::default().respond("slabA", found(&[]));

        let (report, _) = run(&map, &search).await;

        assert_eq!(report.devices()[0].outcome, DeviceOutcome::EmptyLogs);
        assert_eq!(report.missing_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_router_map_succeeds() {
        let search = MockSearch::default();
        let (report, output) = run(&RouterMap::default(), &search).await;

        assert!(output.is_empty());
        assert!(search.seen().is_empty());
        assert!(report.into_result().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verbose_error_mode_keeps_detail() {
        let map = RouterMap::from_entries([("D1", entry("E1", 5, &["slabA"]))]).unwrap();
        let search = MockSearch::default().respond("slabA", Err(502));

        let mut sink = TextSink::new(Vec::new());
        let report = Aggregator::new(&search, "239.1.1.1")
            .with_error_mode(ErrorMode::Verbose)
            .run(&map, &mut sink)
            .await
            .unwrap();

        assert_eq!(
            report.devices()[0].outcome,
            DeviceOutcome::TransportError("backend returned status 502: boom".to_string())
        );
    }
}
