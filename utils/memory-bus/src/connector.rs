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

use crate::egress::{EgressHandle, MemoryEgress};
use crate::ingress::MemoryIngress;
use async_trait::async_trait;
use bus_bridge::{BusError, Connector, Egress, Ingress, LoggedEgress};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

const COMPONENT: &str = "memory_connector";

pub struct MemoryConnectorBuilder {
    name: String,
    sources: Vec<String>,
    targets: Vec<String>,
}

impl MemoryConnectorBuilder {
    pub fn source(mut self, source_name: impl Into<String>) -> Self {
        self.sources.push(source_name.into());
        self
    }

    pub fn target(mut self, target_name: impl Into<String>) -> Self {
        self.targets.push(target_name.into());
        self
    }

    /// Duplicate point names collapse into one point.
    pub fn build(mut self) -> MemoryConnector {
        let mut seen = HashSet::new();
        self.sources.retain(|source| seen.insert(source.clone()));
        seen.clear();
        self.targets.retain(|target| seen.insert(target.clone()));
        MemoryConnector {
            ingresses: self
                .sources
                .iter()
                .map(|source| Arc::new(MemoryIngress::new(source)))
                .collect(),
            egresses: self
                .targets
                .iter()
                .map(|target| Arc::new(MemoryEgress::new(target)))
                .collect(),
            name: self.name,
        }
    }
}

/// Connector whose points live in this process.
pub struct MemoryConnector {
    name: String,
    ingresses: Vec<Arc<MemoryIngress>>,
    egresses: Vec<Arc<MemoryEgress>>,
}

impl MemoryConnector {
    pub fn builder(name: impl Into<String>) -> MemoryConnectorBuilder {
        MemoryConnectorBuilder {
            name: name.into(),
            sources: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Injector side of the named ingress point.
    pub fn ingress(&self, source_name: &str) -> Option<Arc<MemoryIngress>> {
        self.ingresses
            .iter()
            .find(|ingress| ingress.source_name() == source_name)
            .cloned()
    }

    /// Recording side of the named egress point.
    pub fn egress(&self, target_name: &str) -> Option<Arc<MemoryEgress>> {
        self.egresses
            .iter()
            .find(|egress| egress.target_name() == target_name)
            .cloned()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn ingresses(&self) -> Vec<Arc<dyn Ingress>> {
        self.ingresses
            .iter()
            .map(|ingress| ingress.clone() as Arc<dyn Ingress>)
            .collect()
    }

    fn egresses(&self) -> Vec<Arc<dyn Egress>> {
        self.egresses
            .iter()
            .map(|egress| {
                Arc::new(LoggedEgress::new(EgressHandle(egress.clone()))) as Arc<dyn Egress>
            })
            .collect()
    }

    async fn close(&self) -> Result<(), BusError> {
        for ingress in &self.ingresses {
            ingress.stop().await?;
        }
        debug!(
            component = COMPONENT,
            connector = self.name.as_str(),
            "connector closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryConnector;
    use bus_bridge::{Bus, BusAdapter, BusError, Connector, Message, Metadata};
    use std::sync::Arc;

    #[test]
    fn builder_exposes_named_points() {
        let connector = MemoryConnector::builder("mem")
            .source("in")
            .target("a")
            .target("b")
            .build();

        assert_eq!(connector.name(), "mem");
        assert_eq!(connector.ingresses().len(), 1);
        assert_eq!(connector.egresses().len(), 2);
        assert!(connector.ingress("in").is_some());
        assert!(connector.egress("b").is_some());
        assert!(connector.egress("c").is_none());
    }

    #[tokio::test]
    async fn adapter_publishes_through_recorded_egress() {
        let connector = Arc::new(MemoryConnector::builder("mem").source("in").target("out").build());
        let bus = BusAdapter::from_connector(connector.clone());

        bus.publish("out", &Message::new(b"hello".to_vec()))
            .await
            .unwrap();
        assert!(matches!(
            bus.publish("missing", &Message::default()).await,
            Err(BusError::UnknownTarget { .. })
        ));

        let egress = connector.egress("out").unwrap();
        assert_eq!(egress.published_count(), 1);

        bus.close().await.unwrap();
        assert!(connector
            .ingress("in")
            .unwrap()
            .inject(b"late".to_vec(), Metadata::new())
            .await
            .is_err());
    }
}
