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

//! Start/stop orchestration for one compiled route.

use crate::bus::{BusError, MessageHandler};
use crate::control_plane::route_compiler::CompiledRoute;
use crate::data_plane::ingress_handler::RouteHandler;
use crate::data_plane::lane_pool::LanePool;
use crate::data_plane::pipeline::Pipeline;
use crate::engine::EngineConfig;
use crate::observability::events;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

const COMPONENT: &str = "route_lifecycle";

/// A route whose handler is registered on its source and whose lanes are running.
pub(crate) struct RunningRoute {
    name: String,
    cancel: CancellationToken,
    tracker: TaskTracker,
    pools: Vec<Arc<LanePool>>,
}

impl RunningRoute {
    /// Spawns one lane pool per destination, then subscribes the route's handler.
    ///
    /// If the subscription fails the pools are closed and joined before returning.
    pub(crate) async fn start(
        route: &CompiledRoute,
        config: &EngineConfig,
        parent: &CancellationToken,
    ) -> Result<Self, BusError> {
        let cancel = parent.child_token();
        let tracker = TaskTracker::new();
        let pools: Vec<Arc<LanePool>> = route
            .destinations
            .iter()
            .map(|destination| {
                Arc::new(LanePool::spawn(
                    &route.name,
                    destination.clone(),
                    config.lanes_per_destination(),
                    config.lane_queue_depth(),
                ))
            })
            .collect();

        let pipeline = Arc::new(Pipeline::new(
            route,
            pools.clone(),
            config.retry_backoff(),
            cancel.clone(),
        ));
        let handler: Arc<dyn MessageHandler> = Arc::new(RouteHandler::new(
            &route.name,
            pipeline,
            tracker.clone(),
            cancel.clone(),
        ));

        let running = Self {
            name: route.name.clone(),
            cancel,
            tracker,
            pools,
        };

        if let Err(err) = route
            .source
            .bus()
            .subscribe(route.source.source(), handler, running.cancel.clone())
            .await
        {
            warn!(
                event = events::ROUTE_START_FAILED,
                component = COMPONENT,
                route_label = route.name.as_str(),
                source = route.source.label(),
                err = %err,
                "unable to subscribe route handler"
            );
            running.stop().await;
            return Err(err);
        }

        info!(
            event = events::ROUTE_START,
            component = COMPONENT,
            route_label = route.name.as_str(),
            source = route.source.label(),
            destinations = route.destinations.len(),
            mode = %route.mode,
            "route started"
        );
        Ok(running)
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Refuses new messages, waits for in-flight ones, then drains and joins every lane.
    pub(crate) async fn stop(self) {
        info!(
            event = events::ROUTE_STOP_START,
            component = COMPONENT,
            route_label = self.name.as_str(),
            in_flight = self.tracker.len(),
            "stopping route"
        );

        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;

        for pool in &self.pools {
            pool.close();
        }
        for pool in &self.pools {
            pool.join().await;
        }

        info!(
            event = events::ROUTE_STOP_OK,
            component = COMPONENT,
            route_label = self.name.as_str(),
            "route stopped"
        );
    }
}
