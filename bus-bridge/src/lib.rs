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

//! # bus-bridge
//!
//! `bus-bridge` moves messages between heterogeneous message buses. A declarative
//! [`RouteTable`] is compiled against injected [`BusRegistry`], [`FilterRegistry`],
//! [`ProjectionRegistry`] and [`CodecRegistry`] into live subscriptions; every inbound
//! message is decoded, filtered, optionally projected, and fanned out to one or many
//! destinations. The source is told to commit only after every destination has accepted
//! the message, or after the route's [`DeliveryMode`] allows giving up.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use bus_bridge::{
//!     Bus, BusError, BusRegistry, Engine, Message, MessageHandler, RouteConfig, RouteTable,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! /// Bus that accepts every subscription and publish.
//! struct NullBus;
//!
//! #[async_trait]
//! impl Bus for NullBus {
//!     fn name(&self) -> &str { "null" }
//!     fn has_source(&self, _: &str) -> bool { true }
//!     fn has_target(&self, _: &str) -> bool { true }
//!     async fn subscribe(
//!         &self,
//!         _source_name: &str,
//!         _handler: Arc<dyn MessageHandler>,
//!         _cancel: CancellationToken,
//!     ) -> Result<(), BusError> {
//!         Ok(())
//!     }
//!     async fn publish(&self, _target: &str, _message: &Message) -> Result<(), BusError> {
//!         Ok(())
//!     }
//!     async fn close(&self) -> Result<(), BusError> { Ok(()) }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let buses = BusRegistry::new().with_bus(Arc::new(NullBus));
//! let table = RouteTable {
//!     routes: vec![RouteConfig::direct("orders", ("null", "orders.in"), ("null", "orders.out"))],
//!     group_receivers: Vec::new(),
//! };
//!
//! let engine = Engine::new(buses);
//! let routes = engine.start_routes(&table).await.unwrap();
//! assert_eq!(routes.route_names(), vec!["orders"]);
//! routes.stop().await;
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Bus layer: connector contract, connector-to-bus adapter, registry, egress logging
//! - Codec: bytes to field view and back, resolved per source point
//! - Routing: filters, projections, delivery mode and retry backoff
//! - Control plane: route table model, compiler, per-route start/stop
//! - Data plane: inbound handler, pipeline processor, lane pools and lane workers
//! - Runtime: lane task spawning
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events/spans and does not initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber` initialization.

mod bus;
mod codec;
mod control_plane;
mod data_plane;
mod engine;
mod message;
#[doc(hidden)]
pub mod observability;
mod routing;
mod runtime;

pub use bus::{
    Bus, BusAdapter, BusError, BusRegistry, Connector, Egress, HandleError, Ingress,
    LoggedEgress, MessageHandler,
};
pub use codec::{
    CodecError, CodecRegistry, Decoded, JsonCodec, PayloadCodec, Retained, SchemaDescriptor,
    JSON_CONTENT_TYPE,
};
pub use control_plane::route_compiler::{
    CompileError, CompiledRoute, Destination, Owner, Source,
};
pub use control_plane::route_table::{
    GroupReceiverConfig, ModeConfig, ModeKind, RouteConfig, RouteTable, SourceConfig,
    TargetConfig,
};
pub use data_plane::pipeline::{AggregateError, PublishError};
pub use engine::{
    Engine, EngineConfig, RoutesHandle, StartError, DEFAULT_LANES_PER_DESTINATION,
    DEFAULT_LANE_QUEUE_DEPTH,
};
pub use message::{
    now_unix_ms, Fields, Message, Metadata, META_CONTENT_TYPE, META_CREATED_AT_MS, META_MSG_ID,
    META_ROUTE, META_SIZE, META_SOURCE_NAME,
};
pub use routing::delivery_mode::{
    DeliveryMode, DropPolicy, FailureAction, InvalidModeError, RetryBackoff,
    DEFAULT_RETRY_INITIAL, DEFAULT_RETRY_MAX,
};
pub use routing::filter::{
    Filter, FilterChain, FilterError, FilterRegistry, FilterVerdict, RECENT_1H, SIZE_LE_1MB,
    USER_BASIC,
};
pub use routing::projection::{
    Projection, ProjectionError, ProjectionMode, ProjectionRegistry, KEEP_NAME_AGE_BEST_EFFORT,
    KEEP_NAME_AGE_STRICT,
};
