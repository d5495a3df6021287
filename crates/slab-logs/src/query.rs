// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Search request construction.
//!
//! Each device gets its own request, a `bool` filter over:
//! - the `LwrpUpdated` log tag (best fields, lenient)
//! - the destination tag `LWRP_DST_<output_id>` (phrase, lenient)
//! - the multicast address (phrase, lenient)
//! - `@timestamp` within the last five minutes
//! - an exact phrase match on the device name
//!
//! Only `log.syslog.message` is projected back.

use serde::Serialize;
use serde_json::{json, Value};

/// Log tag every matching syslog line carries.
pub const REQUIRED_LOG_TAG: &str = "LwrpUpdated";
pub const DESTINATION_TAG_PREFIX: &str = "LWRP_DST_";
pub const DEVICE_NAME_FIELD: &str = "annotation.general.device_name";
pub const TIMESTAMP_FIELD: &str = "@timestamp";
pub const WINDOW_START: &str = "now-5m";
pub const WINDOW_END: &str = "now";
/// Maximum number of documents returned for a single device.
pub const MAX_RESULTS: u32 = 10_000;
pub const MESSAGE_FIELD: &str = "log.syslog.message";

/// Request body for a single device search. Built once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SearchQuery {
    body: Value,
}

impl SearchQuery {
    /// The JSON document sent to the backend.
    pub fn body(&self) -> &Value {
        &self.body
    }
}

/// Token identifying logs emitted for output `output_id`.
#[must_use]
pub fn destination_tag(output_id: u64) -> String {
    format!("{DESTINATION_TAG_PREFIX}{output_id}")
}

/// Builds the search for `device_name` on output `output_id`. Inputs are not
/// validated; a malformed value simply matches nothing.
#[must_use]
pub fn build_query(device_name: &str, output_id: u64, multicast_address: &str) -> SearchQuery {
    let body = json!({
        "size": MAX_RESULTS,
        "query": {
            "bool": {
                "filter": [
                    {
                        "bool": {
                            "must": [
                                {
                                    "multi_match": {
                                        "type": "best_fields",
                                        "query": REQUIRED_LOG_TAG,
                                        "lenient": true,
                                    }
                                },
                                {
                                    "multi_match": {
                                        "type": "phrase",
                                        "query": destination_tag(output_id),
                                        "lenient": true,
                                    }
                                },
                                {
                                    "multi_match": {
                                        "type": "phrase",
                                        "query": multicast_address,
                                        "lenient": true,
                                    }
                                },
                            ]
                        }
                    },
                    {
                        "range": {
                            TIMESTAMP_FIELD: { "from": WINDOW_START, "to": WINDOW_END }
                        }
                    },
                    {
                        "match_phrase": { DEVICE_NAME_FIELD: device_name }
                    },
                ]
            }
        },
        "_source": [MESSAGE_FIELD],
    });

    SearchQuery { body }
}
