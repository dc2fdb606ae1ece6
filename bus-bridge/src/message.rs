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

//! Broker-neutral message model shared by every layer of the bridge.

use serde_json::Value;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Payload length in bytes, refreshed after re-encoding.
pub const META_SIZE: &str = "size";
/// Media type declared by the codec that decoded the payload.
pub const META_CONTENT_TYPE: &str = "content_type";
/// Name of the ingress point the message was received on.
pub const META_SOURCE_NAME: &str = "source_name";
/// Creation time as Unix epoch milliseconds.
pub const META_CREATED_AT_MS: &str = "createdAtMs";
/// Optional identifier, used for log correlation only.
pub const META_MSG_ID: &str = "msg_id";
/// Name of the route that processed the message.
pub const META_ROUTE: &str = "route";

/// Open metadata mapping carried next to the payload.
pub type Metadata = HashMap<String, Value>;

/// Structured view of a payload, as produced by a [`PayloadCodec`][crate::PayloadCodec].
pub type Fields = serde_json::Map<String, Value>;

/// Opaque payload bytes plus an open metadata mapping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Message {
    pub payload: Vec<u8>,
    pub meta: Metadata,
}

impl Message {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            meta: Metadata::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Reads a metadata entry as `i64`, accepting integers, floats and numeric strings.
    pub fn meta_i64(&self, key: &str) -> Option<i64> {
        match self.meta.get(key)? {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|float| float as i64)),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(Value::as_str)
    }

    /// Creation time from `createdAtMs`, if present and parsable.
    pub fn created_at_ms(&self) -> Option<i64> {
        self.meta_i64(META_CREATED_AT_MS).filter(|created| *created > 0)
    }

    /// Age relative to `now_ms`. `None` when no creation time is known.
    pub fn age_ms(&self, now_ms: i64) -> Option<i64> {
        self.created_at_ms().map(|created| now_ms - created)
    }
}

/// Wall-clock time in Unix epoch milliseconds.
pub fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}
