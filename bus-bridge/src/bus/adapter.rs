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

//! Connector-to-bus adaptation and the connector-name-keyed bus registry.

use crate::bus::{Bus, BusError, Connector, Egress, Ingress, MessageHandler};
use crate::message::Message;
use crate::observability::events;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const COMPONENT: &str = "bus_adapter";

/// [`Bus`] over one [`Connector`], indexing its points by name.
pub struct BusAdapter {
    name: String,
    connector: Arc<dyn Connector>,
    ingresses: HashMap<String, Arc<dyn Ingress>>,
    egresses: HashMap<String, Arc<dyn Egress>>,
    closed: AtomicBool,
}

impl BusAdapter {
    pub fn from_connector(connector: Arc<dyn Connector>) -> Self {
        let ingresses = connector
            .ingresses()
            .into_iter()
            .map(|ingress| (ingress.source_name().to_string(), ingress))
            .collect();
        let egresses = connector
            .egresses()
            .into_iter()
            .map(|egress| (egress.target_name().to_string(), egress))
            .collect();

        Self {
            name: connector.name().to_string(),
            connector,
            ingresses,
            egresses,
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Bus for BusAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_source(&self, source_name: &str) -> bool {
        self.ingresses.contains_key(source_name)
    }

    fn has_target(&self, target_name: &str) -> bool {
        self.egresses.contains_key(target_name)
    }

    async fn subscribe(
        &self,
        source_name: &str,
        handler: Arc<dyn MessageHandler>,
        cancel: CancellationToken,
    ) -> Result<(), BusError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BusError::Closed);
        }
        let ingress = self
            .ingresses
            .get(source_name)
            .ok_or_else(|| BusError::UnknownSource {
                bus: self.name.clone(),
                source: source_name.to_string(),
            })?;

        ingress.start(handler, cancel).await
    }

    async fn publish(&self, target_name: &str, message: &Message) -> Result<(), BusError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BusError::Closed);
        }
        let egress = self
            .egresses
            .get(target_name)
            .ok_or_else(|| BusError::UnknownTarget {
                bus: self.name.clone(),
                target: target_name.to_string(),
            })?;

        egress.publish(message).await
    }

    async fn close(&self) -> Result<(), BusError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let mut first_err = None;
        for (source_name, ingress) in &self.ingresses {
            if let Err(err) = ingress.stop().await {
                warn!(
                    event = events::BUS_CLOSE_FAILED,
                    component = COMPONENT,
                    bus = self.name.as_str(),
                    source_name = source_name.as_str(),
                    err = %err,
                    "unable to stop ingress"
                );
                first_err.get_or_insert(BusError::Close(format!(
                    "bus[{}]: stop ingress {source_name:?}: {err}",
                    self.name
                )));
            }
        }
        for (target_name, egress) in &self.egresses {
            if let Err(err) = egress.close().await {
                warn!(
                    event = events::BUS_CLOSE_FAILED,
                    component = COMPONENT,
                    bus = self.name.as_str(),
                    target_name = target_name.as_str(),
                    err = %err,
                    "unable to close egress"
                );
                first_err.get_or_insert(BusError::Close(format!(
                    "bus[{}]: close egress {target_name:?}: {err}",
                    self.name
                )));
            }
        }
        if let Err(err) = self.connector.close().await {
            first_err.get_or_insert(err);
        }

        debug!(
            event = events::BUS_CLOSED,
            component = COMPONENT,
            bus = self.name.as_str(),
            "bus closed"
        );

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Connector-name-keyed buses, built once at startup and injected into the engine.
#[derive(Clone, Default)]
pub struct BusRegistry {
    buses: HashMap<String, Arc<dyn Bus>>,
}

impl BusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps every connector in a [`BusAdapter`].
    pub fn from_connectors(connectors: impl IntoIterator<Item = Arc<dyn Connector>>) -> Self {
        let mut registry = Self::new();
        for connector in connectors {
            registry.insert(Arc::new(BusAdapter::from_connector(connector)));
        }
        registry
    }

    /// Registers `bus` under its own name, returning any bus it replaced.
    pub fn insert(&mut self, bus: Arc<dyn Bus>) -> Option<Arc<dyn Bus>> {
        self.buses.insert(bus.name().to_string(), bus)
    }

    pub fn with_bus(mut self, bus: Arc<dyn Bus>) -> Self {
        self.insert(bus);
        self
    }

    pub fn get(&self, connector_name: &str) -> Option<Arc<dyn Bus>> {
        self.buses.get(connector_name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buses.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.buses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }

    /// Closes every bus, returning the first failure after attempting all of them.
    pub async fn close_all(&self) -> Result<(), BusError> {
        let mut first_err = None;
        for bus in self.buses.values() {
            if let Err(err) = bus.close().await {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
