// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Helpers shared by the unit tests

use std::sync::OnceLock;

use fakefs_logging::{Level, LogBuffer};

static TEST_LOGS: OnceLock<Option<LogBuffer>> = OnceLock::new();

/// Route engine logs into an in-memory buffer for the whole test binary.
/// Installing can only succeed once per process; later calls are no-ops.
pub(crate) fn init_test_logging() {
    TEST_LOGS.get_or_init(|| fakefs_logging::init_for_test("fakefs-core", Level::DEBUG).ok());
}
