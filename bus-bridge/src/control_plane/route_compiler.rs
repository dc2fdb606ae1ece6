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

//! Resolves a [`RouteTable`] against the injected buses and registries.
//!
//! Compilation is all-or-nothing: the first unresolved name aborts it, so a table either
//! yields a complete set of runnable routes or none at all.

use crate::bus::{Bus, BusError, BusRegistry};
use crate::codec::{CodecRegistry, PayloadCodec};
use crate::control_plane::route_table::{
    GroupReceiverConfig, ModeConfig, ModeKind, RouteConfig, RouteTable, TargetConfig,
};
use crate::message::Message;
use crate::observability::fields;
use crate::routing::delivery_mode::{DeliveryMode, InvalidModeError};
use crate::routing::filter::{FilterChain, FilterRegistry};
use crate::routing::projection::{Projection, ProjectionRegistry};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

/// Which table entry a [`CompileError`] is about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Owner {
    Route(String),
    Group(String),
}

impl Display for Owner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Owner::Route(name) => write!(f, "route {name:?}"),
            Owner::Group(name) => write!(f, "group receiver {name:?}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileError {
    DuplicateRoute(String),
    DuplicateGroup(String),
    EmptyGroup(String),
    /// Both or neither of `to` / `to_group` are set.
    InvalidDestination { route: String },
    UnknownConnector { owner: Owner, connector: String },
    UnknownSource { route: String, connector: String, source: String },
    UnknownTarget { owner: Owner, connector: String, target: String },
    UnknownGroup { route: String, group: String },
    UnknownFilter { route: String, filter: String },
    UnknownProjection { route: String, projection: String },
    ProjectionWithoutCodec { route: String, projection: String },
    InvalidMode { route: String, err: InvalidModeError },
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::DuplicateRoute(route) => write!(f, "duplicate route name {route:?}"),
            CompileError::DuplicateGroup(group) => {
                write!(f, "duplicate group receiver name {group:?}")
            }
            CompileError::EmptyGroup(group) => {
                write!(f, "group receiver {group:?} has no targets")
            }
            CompileError::InvalidDestination { route } => {
                write!(f, "route {route:?}: exactly one of `to` or `to_group` must be set")
            }
            CompileError::UnknownConnector { owner, connector } => {
                write!(f, "{owner}: connector {connector:?} not found")
            }
            CompileError::UnknownSource {
                route,
                connector,
                source,
            } => write!(
                f,
                "route {route:?}: source {source:?} not found on connector {connector:?}"
            ),
            CompileError::UnknownTarget {
                owner,
                connector,
                target,
            } => write!(
                f,
                "{owner}: target {target:?} not found on connector {connector:?}"
            ),
            CompileError::UnknownGroup { route, group } => {
                write!(f, "route {route:?}: group receiver {group:?} not found")
            }
            CompileError::UnknownFilter { route, filter } => {
                write!(f, "route {route:?}: filter {filter:?} not registered")
            }
            CompileError::UnknownProjection { route, projection } => {
                write!(f, "route {route:?}: projection {projection:?} not registered")
            }
            CompileError::ProjectionWithoutCodec { route, projection } => write!(
                f,
                "route {route:?}: projection {projection:?} needs a codec for its source"
            ),
            CompileError::InvalidMode { route, err } => {
                write!(f, "route {route:?}: invalid mode: {err}")
            }
        }
    }
}

impl Error for CompileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CompileError::InvalidMode { err, .. } => Some(err),
            _ => None,
        }
    }
}

/// A resolved publish point: one egress on one bus.
#[derive(Clone)]
pub struct Destination {
    connector: String,
    target: String,
    label: String,
    bus: Arc<dyn Bus>,
}

impl Destination {
    pub(crate) fn new(bus: Arc<dyn Bus>, target: &str) -> Self {
        let connector = bus.name().to_string();
        Self {
            label: fields::format_point(&connector, target),
            connector,
            target: target.to_string(),
            bus,
        }
    }

    pub fn connector(&self) -> &str {
        &self.connector
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// `connector/target`.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) async fn publish(&self, message: &Message) -> Result<(), BusError> {
        self.bus.publish(&self.target, message).await
    }
}

impl Debug for Destination {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Destination").field(&self.label).finish()
    }
}

/// A resolved ingress point.
#[derive(Clone)]
pub struct Source {
    source: String,
    label: String,
    bus: Arc<dyn Bus>,
}

impl Source {
    pub(crate) fn new(bus: Arc<dyn Bus>, source: &str) -> Self {
        Self {
            label: fields::format_point(bus.name(), source),
            source: source.to_string(),
            bus,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn bus(&self) -> &Arc<dyn Bus> {
        &self.bus
    }
}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Source").field(&self.label).finish()
    }
}

/// Everything one route needs at runtime, with every name already resolved.
#[derive(Clone)]
pub struct CompiledRoute {
    pub(crate) name: String,
    pub(crate) source: Source,
    pub(crate) destinations: Vec<Destination>,
    pub(crate) filters: FilterChain,
    pub(crate) projection: Option<Projection>,
    pub(crate) codec: Option<Arc<dyn PayloadCodec>>,
    pub(crate) mode: DeliveryMode,
}

impl CompiledRoute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.names()
    }

    pub fn projection_name(&self) -> Option<&str> {
        self.projection.as_ref().map(Projection::name)
    }

    pub fn has_codec(&self) -> bool {
        self.codec.is_some()
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }
}

impl Debug for CompiledRoute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRoute")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("destinations", &self.destinations)
            .field("filters", &self.filters.names())
            .field("projection", &self.projection_name())
            .field("codec", &self.codec.as_ref().map(|codec| codec.content_type()))
            .field("mode", &self.mode)
            .finish()
    }
}

/// Borrowed view over the injected buses and registries.
pub(crate) struct RouteCompiler<'a> {
    buses: &'a BusRegistry,
    filters: &'a FilterRegistry,
    projections: &'a ProjectionRegistry,
    codecs: &'a CodecRegistry,
}

impl<'a> RouteCompiler<'a> {
    pub(crate) fn new(
        buses: &'a BusRegistry,
        filters: &'a FilterRegistry,
        projections: &'a ProjectionRegistry,
        codecs: &'a CodecRegistry,
    ) -> Self {
        Self {
            buses,
            filters,
            projections,
            codecs,
        }
    }

    pub(crate) fn compile(&self, table: &RouteTable) -> Result<Vec<CompiledRoute>, CompileError> {
        let groups = self.compile_groups(&table.group_receivers)?;

        let mut seen = HashSet::new();
        let mut compiled = Vec::with_capacity(table.routes.len());
        for route in &table.routes {
            if !seen.insert(route.name.as_str()) {
                return Err(CompileError::DuplicateRoute(route.name.clone()));
            }
            compiled.push(self.compile_route(route, &groups)?);
        }
        Ok(compiled)
    }

    fn compile_groups(
        &self,
        groups: &[GroupReceiverConfig],
    ) -> Result<HashMap<String, Vec<Destination>>, CompileError> {
        let mut resolved = HashMap::with_capacity(groups.len());
        for group in groups {
            if resolved.contains_key(&group.name) {
                return Err(CompileError::DuplicateGroup(group.name.clone()));
            }
            if group.targets.is_empty() {
                return Err(CompileError::EmptyGroup(group.name.clone()));
            }
            let owner = Owner::Group(group.name.clone());
            let destinations = group
                .targets
                .iter()
                .map(|target| self.resolve_target(&owner, target))
                .collect::<Result<Vec<_>, _>>()?;
            resolved.insert(group.name.clone(), destinations);
        }
        Ok(resolved)
    }

    fn compile_route(
        &self,
        route: &RouteConfig,
        groups: &HashMap<String, Vec<Destination>>,
    ) -> Result<CompiledRoute, CompileError> {
        let owner = Owner::Route(route.name.clone());
        let source = self.resolve_source(route)?;

        let destinations = match (&route.to, &route.to_group) {
            (Some(target), None) => vec![self.resolve_target(&owner, target)?],
            (None, Some(group)) => groups
                .get(group)
                .cloned()
                .ok_or_else(|| CompileError::UnknownGroup {
                    route: route.name.clone(),
                    group: group.clone(),
                })?,
            _ => {
                return Err(CompileError::InvalidDestination {
                    route: route.name.clone(),
                })
            }
        };

        let filters = route
            .filters
            .iter()
            .map(|name| {
                self.filters
                    .get(name)
                    .cloned()
                    .ok_or_else(|| CompileError::UnknownFilter {
                        route: route.name.clone(),
                        filter: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let codec = self.codecs.resolve(&route.from.source);

        let projection = match &route.projection {
            Some(name) => {
                let projection = self.projections.get(name).cloned().ok_or_else(|| {
                    CompileError::UnknownProjection {
                        route: route.name.clone(),
                        projection: name.clone(),
                    }
                })?;
                if codec.is_none() {
                    return Err(CompileError::ProjectionWithoutCodec {
                        route: route.name.clone(),
                        projection: name.clone(),
                    });
                }
                Some(projection)
            }
            None => None,
        };

        let mode = compile_mode(&route.mode).map_err(|err| CompileError::InvalidMode {
            route: route.name.clone(),
            err,
        })?;

        Ok(CompiledRoute {
            name: route.name.clone(),
            source,
            destinations,
            filters: FilterChain::new(filters),
            projection,
            codec,
            mode,
        })
    }

    fn resolve_source(&self, route: &RouteConfig) -> Result<Source, CompileError> {
        let connector = &route.from.connector;
        let bus = self
            .buses
            .get(connector)
            .ok_or_else(|| CompileError::UnknownConnector {
                owner: Owner::Route(route.name.clone()),
                connector: connector.clone(),
            })?;
        if !bus.has_source(&route.from.source) {
            return Err(CompileError::UnknownSource {
                route: route.name.clone(),
                connector: connector.clone(),
                source: route.from.source.clone(),
            });
        }

        Ok(Source::new(bus, &route.from.source))
    }

    fn resolve_target(
        &self,
        owner: &Owner,
        target: &TargetConfig,
    ) -> Result<Destination, CompileError> {
        let bus = self
            .buses
            .get(&target.connector)
            .ok_or_else(|| CompileError::UnknownConnector {
                owner: owner.clone(),
                connector: target.connector.clone(),
            })?;
        if !bus.has_target(&target.target) {
            return Err(CompileError::UnknownTarget {
                owner: owner.clone(),
                connector: target.connector.clone(),
                target: target.target.clone(),
            });
        }

        Ok(Destination::new(bus, &target.target))
    }
}

fn compile_mode(mode: &ModeConfig) -> Result<DeliveryMode, InvalidModeError> {
    match mode.kind {
        ModeKind::Persistent if mode.ttl_ms.is_some() || mode.max_attempts.is_some() => {
            Err(InvalidModeError::PersistentWithBounds)
        }
        ModeKind::Persistent => Ok(DeliveryMode::Persistent),
        ModeKind::Drop => {
            DeliveryMode::drop(mode.ttl_ms.map(Duration::from_millis), mode.max_attempts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CompileError, Owner, RouteCompiler};
    use crate::bus::{Bus, BusError, BusRegistry, MessageHandler};
    use crate::codec::{CodecRegistry, JsonCodec, SchemaDescriptor};
    use crate::control_plane::route_table::{
        GroupReceiverConfig, ModeConfig, RouteConfig, RouteTable,
    };
    use crate::message::Message;
    use crate::routing::delivery_mode::{DeliveryMode, InvalidModeError};
    use crate::routing::filter::FilterRegistry;
    use crate::routing::projection::ProjectionRegistry;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    struct StaticBus {
        name: &'static str,
        sources: &'static [&'static str],
        targets: &'static [&'static str],
    }

    #[async_trait]
    impl Bus for StaticBus {
        fn name(&self) -> &str {
            self.name
        }

        fn has_source(&self, source_name: &str) -> bool {
            self.sources.iter().any(|source| *source == source_name)
        }

        fn has_target(&self, target_name: &str) -> bool {
            self.targets.iter().any(|target| *target == target_name)
        }

        async fn subscribe(
            &self,
            _source_name: &str,
            _handler: Arc<dyn MessageHandler>,
            _cancel: CancellationToken,
        ) -> Result<(), BusError> {
            Ok(())
        }

        async fn publish(&self, _target_name: &str, _message: &Message) -> Result<(), BusError> {
            Ok(())
        }

        async fn close(&self) -> Result<(), BusError> {
            Ok(())
        }
    }

    struct Fixture {
        buses: BusRegistry,
        filters: FilterRegistry,
        projections: ProjectionRegistry,
        codecs: CodecRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            let buses = BusRegistry::new()
                .with_bus(Arc::new(StaticBus {
                    name: "rabbit_01",
                    sources: &["orders.inbox"],
                    targets: &["orders.out"],
                }))
                .with_bus(Arc::new(StaticBus {
                    name: "kafka_01",
                    sources: &["app.input"],
                    targets: &["a", "b"],
                }));
            let codecs = CodecRegistry::new().with_source(
                "orders.inbox",
                Arc::new(JsonCodec::new(SchemaDescriptor::new("order"))),
            );

            Self {
                buses,
                filters: FilterRegistry::with_builtins(),
                projections: ProjectionRegistry::with_builtins(),
                codecs,
            }
        }

        fn compile(&self, table: &RouteTable) -> Result<Vec<super::CompiledRoute>, CompileError> {
            RouteCompiler::new(&self.buses, &self.filters, &self.projections, &self.codecs)
                .compile(table)
        }
    }

    fn table(routes: Vec<RouteConfig>) -> RouteTable {
        RouteTable {
            routes,
            group_receivers: vec![GroupReceiverConfig::new(
                "synced_all",
                [("kafka_01", "a"), ("kafka_01", "b"), ("rabbit_01", "orders.out")],
            )],
        }
    }

    #[test]
    fn compiles_direct_and_group_routes() {
        let fixture = Fixture::new();
        let routes = fixture
            .compile(&table(vec![
                RouteConfig::direct("orders", ("rabbit_01", "orders.inbox"), ("kafka_01", "a"))
                    .with_filters(["size_le_1mb", "user_basic"])
                    .with_projection("keep_name_age_strict")
                    .with_mode(ModeConfig::drop(Some(1_000), Some(3))),
                RouteConfig::to_group("fanout", ("kafka_01", "app.input"), "synced_all"),
            ]))
            .expect("table should compile");

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].source().label(), "rabbit_01/orders.inbox");
        assert_eq!(routes[0].filter_names(), vec!["size_le_1mb", "user_basic"]);
        assert_eq!(routes[0].projection_name(), Some("keep_name_age_strict"));
        assert!(routes[0].has_codec());
        assert_eq!(
            routes[0].mode(),
            DeliveryMode::drop(Some(Duration::from_millis(1_000)), Some(3)).unwrap()
        );

        let labels: Vec<&str> = routes[1].destinations().iter().map(|d| d.label()).collect();
        assert_eq!(labels, vec!["kafka_01/a", "kafka_01/b", "rabbit_01/orders.out"]);
        assert!(!routes[1].has_codec());
    }

    #[test]
    fn rejects_routes_with_both_or_neither_destination() {
        let fixture = Fixture::new();
        let mut both = RouteConfig::direct("both", ("kafka_01", "app.input"), ("kafka_01", "a"));
        both.to_group = Some("synced_all".to_string());
        let mut neither = both.clone();
        neither.name = "neither".to_string();
        neither.to = None;
        neither.to_group = None;

        assert_eq!(
            fixture.compile(&table(vec![both])).unwrap_err(),
            CompileError::InvalidDestination {
                route: "both".to_string()
            }
        );
        assert_eq!(
            fixture.compile(&table(vec![neither])).unwrap_err(),
            CompileError::InvalidDestination {
                route: "neither".to_string()
            }
        );
    }

    #[test]
    fn rejects_unresolvable_names() {
        let fixture = Fixture::new();
        let base = RouteConfig::direct("r", ("kafka_01", "app.input"), ("kafka_01", "a"));

        let cases = vec![
            (
                RouteConfig::direct("r", ("nats_01", "x"), ("kafka_01", "a")),
                CompileError::UnknownConnector {
                    owner: Owner::Route("r".to_string()),
                    connector: "nats_01".to_string(),
                },
            ),
            (
                RouteConfig::direct("r", ("kafka_01", "nope"), ("kafka_01", "a")),
                CompileError::UnknownSource {
                    route: "r".to_string(),
                    connector: "kafka_01".to_string(),
                    source: "nope".to_string(),
                },
            ),
            (
                RouteConfig::direct("r", ("kafka_01", "app.input"), ("kafka_01", "zzz")),
                CompileError::UnknownTarget {
                    owner: Owner::Route("r".to_string()),
                    connector: "kafka_01".to_string(),
                    target: "zzz".to_string(),
                },
            ),
            (
                RouteConfig::to_group("r", ("kafka_01", "app.input"), "missing"),
                CompileError::UnknownGroup {
                    route: "r".to_string(),
                    group: "missing".to_string(),
                },
            ),
            (
                base.clone().with_filters(["size_le_1mb", "regex_match"]),
                CompileError::UnknownFilter {
                    route: "r".to_string(),
                    filter: "regex_match".to_string(),
                },
            ),
            (
                base.clone().with_projection("keep_everything"),
                CompileError::UnknownProjection {
                    route: "r".to_string(),
                    projection: "keep_everything".to_string(),
                },
            ),
        ];

        for (route, expected) in cases {
            assert_eq!(fixture.compile(&table(vec![route])).unwrap_err(), expected);
        }
    }

    #[test]
    fn rejects_projection_on_a_source_without_codec() {
        let fixture = Fixture::new();
        let route = RouteConfig::direct("r", ("kafka_01", "app.input"), ("kafka_01", "a"))
            .with_projection("keep_name_age_best_effort");

        assert_eq!(
            fixture.compile(&table(vec![route])).unwrap_err(),
            CompileError::ProjectionWithoutCodec {
                route: "r".to_string(),
                projection: "keep_name_age_best_effort".to_string()
            }
        );
    }

    #[test]
    fn rejects_invalid_modes() {
        let fixture = Fixture::new();
        let base = RouteConfig::direct("r", ("kafka_01", "app.input"), ("kafka_01", "a"));

        let unbounded = base.clone().with_mode(ModeConfig::drop(None, None));
        let mut bounded_persistent = base.with_mode(ModeConfig::persistent());
        bounded_persistent.mode.ttl_ms = Some(10);

        assert_eq!(
            fixture.compile(&table(vec![unbounded])).unwrap_err(),
            CompileError::InvalidMode {
                route: "r".to_string(),
                err: InvalidModeError::Unbounded
            }
        );
        assert_eq!(
            fixture.compile(&table(vec![bounded_persistent])).unwrap_err(),
            CompileError::InvalidMode {
                route: "r".to_string(),
                err: InvalidModeError::PersistentWithBounds
            }
        );
    }

    #[test]
    fn rejects_duplicate_names_and_bad_groups() {
        let fixture = Fixture::new();
        let route = RouteConfig::direct("dup", ("kafka_01", "app.input"), ("kafka_01", "a"));

        assert_eq!(
            fixture
                .compile(&table(vec![route.clone(), route]))
                .unwrap_err(),
            CompileError::DuplicateRoute("dup".to_string())
        );

        let mut groups = table(Vec::new());
        groups
            .group_receivers
            .push(GroupReceiverConfig::new("synced_all", [("kafka_01", "a")]));
        assert_eq!(
            fixture.compile(&groups).unwrap_err(),
            CompileError::DuplicateGroup("synced_all".to_string())
        );

        let empty = RouteTable {
            routes: Vec::new(),
            group_receivers: vec![GroupReceiverConfig::new("none", [])],
        };
        assert_eq!(
            fixture.compile(&empty).unwrap_err(),
            CompileError::EmptyGroup("none".to_string())
        );

        let broken = RouteTable {
            routes: Vec::new(),
            group_receivers: vec![GroupReceiverConfig::new("g", [("kafka_01", "zzz")])],
        };
        assert_eq!(
            fixture.compile(&broken).unwrap_err(),
            CompileError::UnknownTarget {
                owner: Owner::Group("g".to_string()),
                connector: "kafka_01".to_string(),
                target: "zzz".to_string()
            }
        );
    }
}
