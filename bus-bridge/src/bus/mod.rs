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

//! Bus layer.
//!
//! A [`Bus`] is the uniform subscribe/publish capability the routing engine consumes.
//! Broker drivers expose a [`Connector`] made of named [`Ingress`] and [`Egress`] points;
//! [`BusAdapter`] turns one connector into one bus, and [`BusRegistry`] keys buses by
//! connector name for the routing compiler.

mod adapter;
mod logged_egress;

pub use adapter::{BusAdapter, BusRegistry};
pub use logged_egress::LoggedEgress;

use crate::data_plane::pipeline::AggregateError;
use crate::message::Message;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Transport-level failures reported by buses, connectors and their points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BusError {
    UnknownSource { bus: String, source: String },
    UnknownTarget { bus: String, target: String },
    Subscribe(String),
    Publish(String),
    Close(String),
    Closed,
}

impl Display for BusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BusError::UnknownSource { bus, source } => {
                write!(f, "bus[{bus}]: ingress {source:?} not found")
            }
            BusError::UnknownTarget { bus, target } => {
                write!(f, "bus[{bus}]: egress {target:?} not found")
            }
            BusError::Subscribe(reason) => write!(f, "subscribe failed: {reason}"),
            BusError::Publish(reason) => write!(f, "publish failed: {reason}"),
            BusError::Close(reason) => write!(f, "close failed: {reason}"),
            BusError::Closed => write!(f, "bus is closed"),
        }
    }
}

impl Error for BusError {}

/// Why a handler refused to let the source commit a message.
#[derive(Debug)]
pub enum HandleError {
    /// At least one destination did not durably accept the message.
    Undelivered(AggregateError),
    /// The route is stopping and no longer accepts messages.
    ShuttingDown,
}

impl Display for HandleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleError::Undelivered(err) => write!(f, "message undelivered: {err}"),
            HandleError::ShuttingDown => write!(f, "route is shutting down"),
        }
    }
}

impl Error for HandleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HandleError::Undelivered(err) => Some(err),
            HandleError::ShuttingDown => None,
        }
    }
}

/// Callback invoked once per inbound message.
///
/// `Ok(())` means the source may acknowledge/commit the message; an error means it must not,
/// so that upstream redelivers it. Buses may invoke a handler concurrently.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: Message) -> Result<(), HandleError>;
}

/// Uniform subscribe-by-name / publish-by-name capability over one connector instance.
#[async_trait]
pub trait Bus: Send + Sync {
    fn name(&self) -> &str;

    fn has_source(&self, source_name: &str) -> bool;

    fn has_target(&self, target_name: &str) -> bool;

    /// Registers `handler` on the named ingress point. Delivery stops once `cancel` fires.
    async fn subscribe(
        &self,
        source_name: &str,
        handler: Arc<dyn MessageHandler>,
        cancel: CancellationToken,
    ) -> Result<(), BusError>;

    /// Returns only once the transport durably accepted or definitively rejected `message`.
    async fn publish(&self, target_name: &str, message: &Message) -> Result<(), BusError>;

    /// Releases every subscription and publish resource. Idempotent.
    async fn close(&self) -> Result<(), BusError>;
}

/// Named subscription point of a connector.
#[async_trait]
pub trait Ingress: Send + Sync {
    fn source_name(&self) -> &str;

    async fn start(
        &self,
        handler: Arc<dyn MessageHandler>,
        cancel: CancellationToken,
    ) -> Result<(), BusError>;

    async fn stop(&self) -> Result<(), BusError>;
}

/// Named publish point of a connector.
#[async_trait]
pub trait Egress: Send + Sync {
    fn target_name(&self) -> &str;

    async fn publish(&self, message: &Message) -> Result<(), BusError>;

    async fn close(&self) -> Result<(), BusError>;
}

/// Broker-specific driver instance exposing named ingress and egress points.
#[async_trait]
pub trait Connector: Send + Sync {
    fn name(&self) -> &str;

    fn ingresses(&self) -> Vec<Arc<dyn Ingress>>;

    fn egresses(&self) -> Vec<Arc<dyn Egress>>;

    async fn close(&self) -> Result<(), BusError>;
}
