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

//! Egress decorator that records publish latency and outcome as structured events.

use crate::bus::{BusError, Egress};
use crate::message::Message;
use crate::observability::{events, fields};
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, warn};

const COMPONENT: &str = "logged_egress";

/// Wraps an [`Egress`] and logs every publish it delegates.
pub struct LoggedEgress<E> {
    inner: E,
}

impl<E: Egress> LoggedEgress<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

#[async_trait]
impl<E: Egress> Egress for LoggedEgress<E> {
    fn target_name(&self) -> &str {
        self.inner.target_name()
    }

    async fn publish(&self, message: &Message) -> Result<(), BusError> {
        let started = Instant::now();
        let result = self.inner.publish(message).await;
        let elapsed_us = started.elapsed().as_micros() as u64;

        match &result {
            Ok(()) => debug!(
                event = events::EGRESS_PUBLISH_OK,
                component = COMPONENT,
                target = self.inner.target_name(),
                msg_id = %fields::format_message_id(message),
                size = message.payload.len(),
                elapsed_us,
                "egress publish succeeded"
            ),
            Err(err) => warn!(
                event = events::EGRESS_PUBLISH_FAILED,
                component = COMPONENT,
                target = self.inner.target_name(),
                msg_id = %fields::format_message_id(message),
                size = message.payload.len(),
                elapsed_us,
                err = %err,
                "egress publish failed"
            ),
        }

        result
    }

    async fn close(&self) -> Result<(), BusError> {
        self.inner.close().await
    }
}
