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

//! Control-plane layer.
//!
//! Owns the declarative route table model, its compilation against the injected buses and
//! registries, and the start/stop lifecycle of each compiled route.

pub(crate) mod route_compiler;
pub(crate) mod route_lifecycle;
pub(crate) mod route_table;
