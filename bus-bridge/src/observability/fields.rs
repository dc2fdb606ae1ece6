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

//! Canonical structured field keys and value-format helpers.

use crate::message::{Message, META_MSG_ID};
use serde_json::Value;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const WORKER_ID: &str = "worker_id";
pub const ROUTE_LABEL: &str = "route_label";

pub const MSG_ID: &str = "msg_id";
pub const SOURCE: &str = "source";
pub const DESTINATION: &str = "destination";
pub const LANE: &str = "lane";
pub const ATTEMPT: &str = "attempt";

pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_QUEUE_CLOSED: &str = "queue_closed";
pub const REASON_CANCELLED: &str = "cancelled";
pub const REASON_MAX_ATTEMPTS: &str = "max_attempts_exhausted";
pub const REASON_TTL_EXPIRED: &str = "ttl_expired";

pub fn format_message_id(message: &Message) -> String {
    match message.meta.get(META_MSG_ID) {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Null) | None => NONE.to_string(),
        Some(other) => other.to_string(),
    }
}

/// `connector/point`, the compact form used for sources and destinations in logs.
pub fn format_point(connector: &str, point: &str) -> String {
    format!("{connector}/{point}")
}

/// Stable identifier for one lane of one destination of one route.
pub fn format_lane_id(route: &str, destination: &str, lane: usize) -> String {
    format!("{route}:{destination}#{lane}")
}
