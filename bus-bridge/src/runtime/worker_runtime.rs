/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Runtime helper for spawning lane dispatch loops.

use std::future::Future;
use tokio::sync::mpsc::Receiver;
use tokio::task::{JoinError, JoinHandle};
use tracing::Instrument;

/// Join handle of one spawned lane loop, tagged with its worker id.
pub(crate) struct LaneLoopHandle {
    worker_id: String,
    join_handle: JoinHandle<()>,
}

impl LaneLoopHandle {
    pub(crate) fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Waits for the loop to return. Errors only if the loop panicked or was aborted.
    pub(crate) async fn join(self) -> Result<(), JoinError> {
        self.join_handle.await
    }
}

/// Spawns `run_loop` on the ambient tokio runtime inside a `lane` span.
pub(crate) fn spawn_lane_dispatch_loop<J, F, Fut>(
    worker_id: String,
    job_receiver: Receiver<J>,
    run_loop: F,
) -> LaneLoopHandle
where
    J: Send + 'static,
    F: FnOnce(String, Receiver<J>) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let span = tracing::debug_span!("lane", worker_id = worker_id.as_str());
    let join_handle = tokio::spawn(run_loop(worker_id.clone(), job_receiver).instrument(span));

    LaneLoopHandle {
        worker_id,
        join_handle,
    }
}
