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

//! Data-plane layer.
//!
//! Owns everything that touches individual messages once routes are running: the inbound
//! handler registered on each source, the per-route processing pipeline, and the lane pools
//! that serialize publishes per destination lane.

pub(crate) mod ingress_handler;
pub(crate) mod lane_pool;
pub(crate) mod lane_worker;
pub(crate) mod pipeline;

#[cfg(test)]
pub(crate) mod test_support;
