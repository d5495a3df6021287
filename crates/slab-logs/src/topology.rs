// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Router map loading.
//!
//! The router map is a JSON object keyed by destination:
//!
//! ```json
//! {
//!     "D1": { "eng": "E1", "dst": 5, "slabs": ["slabA", "slabB"] }
//! }
//! ```
//!
//! Destination order is preserved as written so the report follows the file.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::TopologyError;

/// One logical destination and the slabs feeding it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouterMapEntry {
    #[serde(rename = "eng")]
    pub engineering_label: String,
    #[serde(rename = "dst")]
    pub output_id: u64,
    #[serde(rename = "slabs")]
    pub device_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RouterMap(IndexMap<String, RouterMapEntry>);

impl RouterMap {
    /// Reads and validates the router map at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TopologyError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| TopologyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let map: RouterMap =
            serde_json::from_str(&contents).map_err(|source| TopologyError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        map.validate()?;

        debug!(
            "Loaded router map {} with {} destinations and {} devices",
            path.display(),
            map.len(),
            map.device_count()
        );
        Ok(map)
    }

    /// Builds a router map from entries already in memory, applying the same
    /// validation as [`RouterMap::load`].
    pub fn from_entries<I, K>(entries: I) -> Result<Self, TopologyError>
    where
        I: IntoIterator<Item = (K, RouterMapEntry)>,
        K: Into<String>,
    {
        let map = RouterMap(entries.into_iter().map(|(k, v)| (k.into(), v)).collect());
        map.validate()?;
        Ok(map)
    }

    fn validate(&self) -> Result<(), TopologyError> {
        for (destination, entry) in &self.0 {
            if entry
                .device_names
                .iter()
                .any(|device| device.trim().is_empty())
            {
                return Err(TopologyError::Invalid {
                    destination: destination.clone(),
                    reason: "device names must not be empty".to_string(),
                });
            }
            if entry.device_names.is_empty() {
                warn!("Destination {destination} has no slabs");
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouterMapEntry)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, destination: &str) -> Option<&RouterMapEntry> {
        self.0.get(destination)
    }

    /// Number of destinations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of devices across every destination.
    pub fn device_count(&self) -> usize {
        self.0.values().map(|entry| entry.device_names.len()).sum()
    }
}
