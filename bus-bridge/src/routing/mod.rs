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

//! Routing policy layer.
//!
//! Holds the per-message decisions a route makes: which messages pass
//! ([`FilterChain`]), what they look like on the way out ([`Projection`]) and how hard the
//! engine tries to deliver them ([`DeliveryMode`]).
//!
//! ```
//! use bus_bridge::{FilterRegistry, Message, ProjectionRegistry};
//! use serde_json::json;
//!
//! let filters = FilterRegistry::with_builtins();
//! let small = Message::new(b"{}".to_vec()).with_meta("size", 2);
//! assert_eq!(filters.get("size_le_1mb").unwrap().evaluate(&small, None), Ok(true));
//!
//! let projections = ProjectionRegistry::with_builtins();
//! let input = json!({"name": "Ann", "city": "Hue"});
//! let projected = projections
//!     .get("keep_name_age_best_effort")
//!     .unwrap()
//!     .apply(&small, input.as_object().unwrap())
//!     .unwrap();
//! assert_eq!(serde_json::Value::Object(projected), json!({"name": "Ann"}));
//! ```

pub(crate) mod delivery_mode;
pub(crate) mod filter;
pub(crate) mod projection;
