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

use bus_bridge::{
    CodecRegistry, EngineConfig, GroupReceiverConfig, JsonCodec, RetryBackoff, RouteConfig,
    RouteTable, SchemaDescriptor, DEFAULT_LANES_PER_DESTINATION, DEFAULT_LANE_QUEUE_DEPTH,
    DEFAULT_RETRY_INITIAL, DEFAULT_RETRY_MAX,
};
use memory_bus::MemoryConnector;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub(crate) bridge: BridgeConfig,
    pub(crate) connectors: Vec<ConnectorConfig>,
    #[serde(default)]
    pub(crate) default_schema: Option<SchemaDescriptor>,
    #[serde(default)]
    pub(crate) schemas: Vec<SourceSchema>,
    #[serde(default)]
    pub(crate) group_receivers: Vec<GroupReceiverConfig>,
    pub(crate) routes: Vec<RouteConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct BridgeConfig {
    pub(crate) lanes_per_destination: usize,
    pub(crate) lane_queue_depth: usize,
    pub(crate) retry_initial_ms: u64,
    pub(crate) retry_max_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            lanes_per_destination: DEFAULT_LANES_PER_DESTINATION,
            lane_queue_depth: DEFAULT_LANE_QUEUE_DEPTH,
            retry_initial_ms: DEFAULT_RETRY_INITIAL.as_millis() as u64,
            retry_max_ms: DEFAULT_RETRY_MAX.as_millis() as u64,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    Memory,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConnectorConfig {
    pub(crate) name: String,
    pub(crate) kind: ConnectorKind,
    #[serde(default)]
    pub(crate) sources: Vec<String>,
    #[serde(default)]
    pub(crate) targets: Vec<String>,
}

/// Schema applied to messages arriving on one ingress point.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SourceSchema {
    pub(crate) source: String,
    pub(crate) schema: SchemaDescriptor,
}

impl Config {
    pub fn from_json5(contents: &str) -> Result<Self, Box<dyn Error>> {
        let config: Config = json5::from_str(contents)?;
        config.check_connector_names()?;
        Ok(config)
    }

    pub fn load(path: &str) -> Result<Self, Box<dyn Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Unable to read config file {path}: {e}"))?;
        Self::from_json5(&contents).map_err(|e| format!("Unable to parse config file {path}: {e}").into())
    }

    fn check_connector_names(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for connector in &self.connectors {
            if !seen.insert(connector.name.as_str()) {
                return Err(format!("Duplicate connector name found: {}", connector.name));
            }
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_lanes_per_destination(self.bridge.lanes_per_destination)
            .with_lane_queue_depth(self.bridge.lane_queue_depth)
            .with_retry_backoff(RetryBackoff::new(
                Duration::from_millis(self.bridge.retry_initial_ms),
                Duration::from_millis(self.bridge.retry_max_ms),
            ))
    }

    pub fn route_table(&self) -> RouteTable {
        RouteTable {
            routes: self.routes.clone(),
            group_receivers: self.group_receivers.clone(),
        }
    }

    pub fn codecs(&self) -> CodecRegistry {
        let mut codecs = CodecRegistry::new();
        if let Some(schema) = &self.default_schema {
            codecs = codecs.with_default(Arc::new(JsonCodec::new(schema.clone())));
        }
        for source_schema in &self.schemas {
            codecs.insert(
                source_schema.source.clone(),
                Arc::new(JsonCodec::new(source_schema.schema.clone())),
            );
        }
        codecs
    }

    pub fn build_connectors(&self) -> Vec<Arc<MemoryConnector>> {
        self.connectors
            .iter()
            .map(|connector| match connector.kind {
                ConnectorKind::Memory => {
                    let builder = connector
                        .sources
                        .iter()
                        .fold(MemoryConnector::builder(&connector.name), |builder, source| {
                            builder.source(source)
                        });
                    let builder = connector
                        .targets
                        .iter()
                        .fold(builder, |builder, target| builder.target(target));
                    Arc::new(builder.build())
                }
            })
            .collect()
    }
}
