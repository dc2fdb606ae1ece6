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

//! In-process connector for `bus-bridge`.
//!
//! A [`MemoryConnector`] exposes named ingress points fed by [`MemoryIngress::inject`] and
//! named egress points that record what they were asked to publish. Egress points can be
//! scripted to fail or to slow down, which makes the connector suitable for driving the
//! routing engine end to end in tests and for dry runs of the `configurable-bridge` binary.

mod connector;
mod egress;
mod ingress;

pub use connector::{MemoryConnector, MemoryConnectorBuilder};
pub use egress::MemoryEgress;
pub use ingress::{InjectError, MemoryIngress};
