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

//! Public routing-engine API.

use crate::bus::{BusError, BusRegistry};
use crate::codec::CodecRegistry;
use crate::control_plane::route_compiler::{CompileError, CompiledRoute, RouteCompiler};
use crate::control_plane::route_lifecycle::RunningRoute;
use crate::control_plane::route_table::RouteTable;
use crate::observability::events;
use crate::routing::delivery_mode::RetryBackoff;
use crate::routing::filter::FilterRegistry;
use crate::routing::projection::ProjectionRegistry;
use futures::future::join_all;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const COMPONENT: &str = "engine";

pub const DEFAULT_LANES_PER_DESTINATION: usize = 16;
pub const DEFAULT_LANE_QUEUE_DEPTH: usize = 8192;

/// Per-engine tuning shared by every route it starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    lanes_per_destination: usize,
    lane_queue_depth: usize,
    retry_backoff: RetryBackoff,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lanes_per_destination: DEFAULT_LANES_PER_DESTINATION,
            lane_queue_depth: DEFAULT_LANE_QUEUE_DEPTH,
            retry_backoff: RetryBackoff::default(),
        }
    }
}

impl EngineConfig {
    /// Values below one are raised to one.
    pub fn with_lanes_per_destination(mut self, lanes: usize) -> Self {
        self.lanes_per_destination = lanes.max(1);
        self
    }

    /// Values below one are raised to one.
    pub fn with_lane_queue_depth(mut self, depth: usize) -> Self {
        self.lane_queue_depth = depth.max(1);
        self
    }

    pub fn with_retry_backoff(mut self, backoff: RetryBackoff) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn lanes_per_destination(&self) -> usize {
        self.lanes_per_destination
    }

    pub fn lane_queue_depth(&self) -> usize {
        self.lane_queue_depth
    }

    pub fn retry_backoff(&self) -> RetryBackoff {
        self.retry_backoff
    }
}

/// Failures of [`Engine::start_routes`]. No route is left running after either.
#[derive(Debug)]
pub enum StartError {
    Compile(CompileError),
    Subscribe { route: String, err: BusError },
}

impl Display for StartError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StartError::Compile(err) => write!(f, "route table rejected: {err}"),
            StartError::Subscribe { route, err } => {
                write!(f, "route {route:?} failed to start: {err}")
            }
        }
    }
}

impl Error for StartError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StartError::Compile(err) => Some(err),
            StartError::Subscribe { err, .. } => Some(err),
        }
    }
}

impl From<CompileError> for StartError {
    fn from(err: CompileError) -> Self {
        StartError::Compile(err)
    }
}

/// Compiles route tables against injected buses and registries, and runs them.
///
/// The engine never opens or closes buses; whoever built the [`BusRegistry`] owns them.
#[derive(Clone)]
pub struct Engine {
    buses: BusRegistry,
    filters: FilterRegistry,
    projections: ProjectionRegistry,
    codecs: CodecRegistry,
    config: EngineConfig,
}

impl Engine {
    /// Engine over `buses` with the built-in filters and projections and no codecs.
    pub fn new(buses: BusRegistry) -> Self {
        Self {
            buses,
            filters: FilterRegistry::with_builtins(),
            projections: ProjectionRegistry::with_builtins(),
            codecs: CodecRegistry::new(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_filters(mut self, filters: FilterRegistry) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_projections(mut self, projections: ProjectionRegistry) -> Self {
        self.projections = projections;
        self
    }

    pub fn with_codecs(mut self, codecs: CodecRegistry) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn buses(&self) -> &BusRegistry {
        &self.buses
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolves every route of `table` without starting anything.
    pub fn compile(&self, table: &RouteTable) -> Result<Vec<CompiledRoute>, CompileError> {
        RouteCompiler::new(&self.buses, &self.filters, &self.projections, &self.codecs)
            .compile(table)
            .map_err(|err| {
                warn!(
                    event = events::ROUTE_COMPILE_FAILED,
                    component = COMPONENT,
                    err = %err,
                    "route table rejected"
                );
                err
            })
    }

    pub async fn start_routes(&self, table: &RouteTable) -> Result<RoutesHandle, StartError> {
        self.start_routes_with_cancel(table, CancellationToken::new())
            .await
    }

    /// Like [`start_routes`][Self::start_routes], with every route's token a child of
    /// `cancel`. Cancelling it makes routes refuse new messages and abandon retries;
    /// [`RoutesHandle::stop`] is still needed to drain and join them.
    pub async fn start_routes_with_cancel(
        &self,
        table: &RouteTable,
        cancel: CancellationToken,
    ) -> Result<RoutesHandle, StartError> {
        let compiled = self.compile(table)?;
        let cancel = cancel.child_token();

        let mut routes = Vec::with_capacity(compiled.len());
        for route in &compiled {
            match RunningRoute::start(route, &self.config, &cancel).await {
                Ok(running) => routes.push(running),
                Err(err) => {
                    let handle = RoutesHandle { cancel, routes };
                    handle.stop().await;
                    return Err(StartError::Subscribe {
                        route: route.name().to_string(),
                        err,
                    });
                }
            }
        }

        info!(
            event = events::ENGINE_START_OK,
            component = COMPONENT,
            routes = routes.len(),
            buses = self.buses.len(),
            "routes started"
        );
        Ok(RoutesHandle { cancel, routes })
    }
}

/// Running routes started by one [`Engine::start_routes`] call.
pub struct RoutesHandle {
    cancel: CancellationToken,
    routes: Vec<RunningRoute>,
}

impl RoutesHandle {
    pub fn route_names(&self) -> Vec<&str> {
        self.routes.iter().map(RunningRoute::name).collect()
    }

    /// Token every route derives its own cancellation from.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Graceful shutdown: every route refuses new messages, finishes in-flight ones, and
    /// drains and joins its lanes. Returns once all routes are down.
    pub async fn stop(self) {
        info!(
            event = events::ENGINE_STOP_START,
            component = COMPONENT,
            routes = self.routes.len(),
            "stopping routes"
        );

        self.cancel.cancel();
        join_all(self.routes.into_iter().map(RunningRoute::stop)).await;

        info!(
            event = events::ENGINE_STOP_OK,
            component = COMPONENT,
            "all routes stopped"
        );
    }
}
