// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Small shared helpers

use sink_transport::CancelToken;
use std::time::Duration;

/// Sleep that wakes early on cancellation. Returns false if cancelled.
pub(crate) async fn sleep_interruptible(duration: Duration, cancel: &CancelToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancel.cancelled() => false,
    }
}
