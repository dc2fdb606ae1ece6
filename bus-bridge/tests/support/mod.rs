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

#![allow(dead_code)]

use bus_bridge::{
    BusRegistry, CodecRegistry, Connector, Engine, EngineConfig, JsonCodec, Metadata,
    RetryBackoff, RouteConfig, RouteTable, SchemaDescriptor, META_CREATED_AT_MS,
};
use memory_bus::{MemoryConnector, MemoryEgress, MemoryIngress};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub(crate) const LEFT: &str = "left";
pub(crate) const RIGHT: &str = "right";

pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `left` carries the ingress points, `right` the egress points.
pub(crate) struct Fixture {
    pub(crate) left: Arc<MemoryConnector>,
    pub(crate) right: Arc<MemoryConnector>,
    pub(crate) buses: BusRegistry,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        init_logging();

        let left = Arc::new(
            MemoryConnector::builder(LEFT)
                .source("users.in")
                .source("orders.in")
                .build(),
        );
        let right = Arc::new(
            MemoryConnector::builder(RIGHT)
                .target("a")
                .target("b")
                .target("c")
                .build(),
        );
        let buses = BusRegistry::from_connectors([
            left.clone() as Arc<dyn Connector>,
            right.clone() as Arc<dyn Connector>,
        ]);

        Self { left, right, buses }
    }

    pub(crate) fn ingress(&self, source: &str) -> Arc<MemoryIngress> {
        self.left
            .ingress(source)
            .expect("fixture ingress should exist")
    }

    pub(crate) fn egress(&self, target: &str) -> Arc<MemoryEgress> {
        self.right
            .egress(target)
            .expect("fixture egress should exist")
    }

    /// Engine with small lane pools and millisecond backoff.
    pub(crate) fn engine(&self) -> Engine {
        Engine::new(self.buses.clone()).with_config(
            EngineConfig::default()
                .with_lanes_per_destination(4)
                .with_lane_queue_depth(64)
                .with_retry_backoff(RetryBackoff::new(
                    Duration::from_millis(1),
                    Duration::from_millis(10),
                )),
        )
    }

    /// Same as [`Fixture::engine`], decoding `users.in` as JSON.
    pub(crate) fn engine_with_user_codec(&self) -> Engine {
        self.engine().with_codecs(
            CodecRegistry::new().with_source(
                "users.in",
                Arc::new(JsonCodec::new(SchemaDescriptor::new("user"))),
            ),
        )
    }
}

pub(crate) fn table(routes: Vec<RouteConfig>) -> RouteTable {
    RouteTable {
        routes,
        group_receivers: Vec::new(),
    }
}

pub(crate) fn created_at(ms: i64) -> Metadata {
    let mut meta = Metadata::new();
    meta.insert(META_CREATED_AT_MS.to_string(), json!(ms));
    meta
}

pub(crate) fn json_payload(value: Value) -> Vec<u8> {
    serde_json::to_vec(&value).expect("test payload should serialize")
}

pub(crate) fn json_of(payload: &[u8]) -> Value {
    serde_json::from_slice(payload).expect("published payload should be JSON")
}
