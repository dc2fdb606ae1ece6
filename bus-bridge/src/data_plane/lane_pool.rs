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

//! Fixed set of bounded lanes in front of one destination.

use crate::bus::BusError;
use crate::control_plane::route_compiler::Destination;
use crate::data_plane::lane_worker::{lane_dispatch_loop, Job};
use crate::message::Message;
use crate::observability::{events, fields};
use crate::runtime::worker_runtime::{spawn_lane_dispatch_loop, LaneLoopHandle};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const COMPONENT: &str = "lane_pool";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum LaneError {
    /// The pool is closing; the job was never published.
    QueueClosed,
    Publish(BusError),
}

impl Display for LaneError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LaneError::QueueClosed => write!(f, "lane queue is closed"),
            LaneError::Publish(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LaneError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LaneError::QueueClosed => None,
            LaneError::Publish(err) => Some(err),
        }
    }
}

/// Lanes for one destination of one route, each served by its own worker task.
pub(crate) struct LanePool {
    destination: Destination,
    senders: Vec<mpsc::Sender<Job>>,
    next_lane: AtomicUsize,
    closing: CancellationToken,
    workers: Mutex<Vec<LaneLoopHandle>>,
}

impl LanePool {
    /// Spawns `lanes` workers (at least one) with `queue_depth` slots each (at least one).
    pub(crate) fn spawn(
        route: &str,
        destination: Destination,
        lanes: usize,
        queue_depth: usize,
    ) -> Self {
        let lanes = lanes.max(1);
        let queue_depth = queue_depth.max(1);
        let closing = CancellationToken::new();

        let mut senders = Vec::with_capacity(lanes);
        let mut workers = Vec::with_capacity(lanes);
        for lane in 0..lanes {
            let (sender, receiver) = mpsc::channel(queue_depth);
            let worker_id = fields::format_lane_id(route, destination.label(), lane);
            let lane_destination = destination.clone();
            let lane_closing = closing.clone();

            workers.push(spawn_lane_dispatch_loop(
                worker_id,
                receiver,
                move |worker_id, receiver| {
                    lane_dispatch_loop(worker_id, lane_destination, receiver, lane_closing)
                },
            ));
            senders.push(sender);
        }

        debug!(
            event = events::LANE_POOL_CREATE,
            component = COMPONENT,
            route_label = route,
            destination = destination.label(),
            lanes,
            queue_depth,
            "lane pool created"
        );

        Self {
            destination,
            senders,
            next_lane: AtomicUsize::new(0),
            closing,
            workers: Mutex::new(workers),
        }
    }

    pub(crate) fn destination(&self) -> &Destination {
        &self.destination
    }

    pub(crate) fn lane_count(&self) -> usize {
        self.senders.len()
    }

    fn pick_lane(&self) -> usize {
        self.next_lane.fetch_add(1, Ordering::Relaxed) % self.senders.len()
    }

    /// Publishes through the next lane in round-robin order.
    ///
    /// Waits for queue space, then for the lane worker's outcome.
    pub(crate) async fn publish(&self, message: Arc<Message>) -> Result<(), LaneError> {
        self.publish_on_lane(self.pick_lane(), message).await
    }

    pub(crate) async fn publish_on_lane(
        &self,
        lane: usize,
        message: Arc<Message>,
    ) -> Result<(), LaneError> {
        let (completion, done) = oneshot::channel();
        self.senders[lane % self.senders.len()]
            .send(Job {
                message,
                completion,
            })
            .await
            .map_err(|_| LaneError::QueueClosed)?;

        match done.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(LaneError::Publish(err)),
            Err(_) => Err(LaneError::QueueClosed),
        }
    }

    /// Stops accepting jobs. Queued jobs are still published; see [`join`][Self::join].
    pub(crate) fn close(&self) {
        if !self.closing.is_cancelled() {
            debug!(
                event = events::LANE_POOL_CLOSE,
                component = COMPONENT,
                destination = self.destination.label(),
                "closing lane pool"
            );
        }
        self.closing.cancel();
    }

    /// Waits until every worker has drained its lane and returned.
    pub(crate) async fn join(&self) {
        let workers = std::mem::take(&mut *self.workers.lock().await);
        for worker in workers {
            let worker_id = worker.worker_id().to_string();
            if let Err(err) = worker.join().await {
                warn!(
                    event = events::LANE_WORKER_JOIN_FAILED,
                    component = COMPONENT,
                    worker_id = worker_id.as_str(),
                    err = %err,
                    "lane worker did not finish cleanly"
                );
            }
        }
    }
}
