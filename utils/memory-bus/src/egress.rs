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

use async_trait::async_trait;
use bus_bridge::{BusError, Egress, Message};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Named egress point that records accepted messages.
pub struct MemoryEgress {
    target_name: String,
    published: Mutex<Vec<Message>>,
    published_notify: Notify,
    attempts: AtomicUsize,
    fail_next: AtomicUsize,
    fail_always: AtomicBool,
    delay: Mutex<Option<Duration>>,
    closed: AtomicBool,
}

impl MemoryEgress {
    pub(crate) fn new(target_name: &str) -> Self {
        Self {
            target_name: target_name.to_string(),
            published: Mutex::new(Vec::new()),
            published_notify: Notify::new(),
            attempts: AtomicUsize::new(0),
            fail_next: AtomicUsize::new(0),
            fail_always: AtomicBool::new(false),
            delay: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Messages accepted so far, in acceptance order.
    pub fn published(&self) -> Vec<Message> {
        self.published
            .lock()
            .map(|published| published.clone())
            .unwrap_or_default()
    }

    pub fn published_count(&self) -> usize {
        self.published
            .lock()
            .map(|published| published.len())
            .unwrap_or_default()
    }

    /// Publish calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Rejects the next `count` publishes.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn fail_always(&self, failing: bool) {
        self.fail_always.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        if let Ok(mut slot) = self.delay.lock() {
            *slot = Some(delay);
        }
    }

    /// Waits until at least `count` messages were accepted, or `timeout` elapses.
    pub async fn wait_for_published(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.published_notify.notified();
                if self.published_count() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }

    fn should_fail(&self) -> bool {
        self.fail_always.load(Ordering::SeqCst)
            || self
                .fail_next
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                    remaining.checked_sub(1)
                })
                .is_ok()
    }

    async fn publish_message(&self, message: &Message) -> Result<(), BusError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }

        let delay = self.delay.lock().ok().and_then(|slot| *slot);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail() {
            return Err(BusError::Publish(format!(
                "{} rejected the message",
                self.target_name
            )));
        }

        self.published
            .lock()
            .map_err(|_| BusError::Publish("egress state poisoned".to_string()))?
            .push(message.clone());
        self.published_notify.notify_waiters();
        Ok(())
    }
}

/// Shared handle the connector hands out, so tests keep inspecting the same point.
pub(crate) struct EgressHandle(pub(crate) Arc<MemoryEgress>);

#[async_trait]
impl Egress for EgressHandle {
    fn target_name(&self) -> &str {
        &self.0.target_name
    }

    async fn publish(&self, message: &Message) -> Result<(), BusError> {
        self.0.publish_message(message).await
    }

    async fn close(&self) -> Result<(), BusError> {
        self.0.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
