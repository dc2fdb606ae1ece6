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

//! Single-file lane worker: one publish in flight at a time, in queue order.

use crate::bus::BusError;
use crate::control_plane::route_compiler::Destination;
use crate::message::Message;
use crate::observability::{events, fields};
use std::sync::Arc;
use tokio::sync::{mpsc::Receiver, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Level};

const COMPONENT: &str = "lane_worker";

/// One message bound for the lane's destination, plus its single-use completion signal.
pub(crate) struct Job {
    pub(crate) message: Arc<Message>,
    pub(crate) completion: oneshot::Sender<Result<(), BusError>>,
}

/// Publishes queued jobs until the queue is closed and drained.
///
/// Once `closing` fires the queue stops accepting jobs, but everything already queued is
/// still published before the loop returns.
pub(crate) async fn lane_dispatch_loop(
    worker_id: String,
    destination: Destination,
    mut jobs: Receiver<Job>,
    closing: CancellationToken,
) {
    debug!(
        event = events::LANE_WORKER_START,
        component = COMPONENT,
        worker_id = worker_id.as_str(),
        destination = destination.label(),
        "lane worker started"
    );

    let mut draining = false;
    loop {
        let next = if draining {
            jobs.recv().await
        } else {
            tokio::select! {
                biased;
                _ = closing.cancelled() => {
                    jobs.close();
                    draining = true;
                    continue;
                }
                job = jobs.recv() => job,
            }
        };

        let Some(job) = next else {
            break;
        };
        dispatch(&worker_id, &destination, job).await;
    }

    info!(
        event = events::LANE_WORKER_STOP,
        component = COMPONENT,
        worker_id = worker_id.as_str(),
        destination = destination.label(),
        reason = fields::REASON_QUEUE_CLOSED,
        "lane queue closed; stopping worker"
    );
}

async fn dispatch(worker_id: &str, destination: &Destination, job: Job) {
    let Job {
        message,
        completion,
    } = job;
    let msg_id = tracing::enabled!(Level::DEBUG).then(|| fields::format_message_id(&message));

    if let Some(msg_id) = msg_id.as_deref() {
        debug!(
            event = events::LANE_PUBLISH_ATTEMPT,
            component = COMPONENT,
            worker_id,
            destination = destination.label(),
            msg_id,
            "attempting lane publish"
        );
    }

    let result = destination.publish(&message).await;
    match &result {
        Ok(()) => {
            if let Some(msg_id) = msg_id.as_deref() {
                debug!(
                    event = events::LANE_PUBLISH_OK,
                    component = COMPONENT,
                    worker_id,
                    destination = destination.label(),
                    msg_id,
                    "lane publish succeeded"
                );
            }
        }
        Err(err) => warn!(
            event = events::LANE_PUBLISH_FAILED,
            component = COMPONENT,
            worker_id,
            destination = destination.label(),
            msg_id = %fields::format_message_id(&message),
            err = %err,
            "lane publish failed"
        ),
    }

    if completion.send(result).is_err() {
        debug!(
            event = events::LANE_COMPLETION_DROPPED,
            component = COMPONENT,
            worker_id,
            destination = destination.label(),
            "submitter stopped waiting for this job"
        );
    }
}
