// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Process exit codes. The job runner invoking this binary keys off them.

pub const SUCCESS: i32 = 0;
pub const MISSING_LOGS: i32 = 1; // One or more devices returned no logs or failed
pub const CONFIG_ERROR: i32 = 2; // Router map, configuration or output failure
