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

//! Scriptable in-crate bus shared by the data-plane unit tests.

use crate::bus::{Bus, BusError, MessageHandler};
use crate::control_plane::route_compiler::Destination;
use crate::message::Message;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Metadata key tests use to tag which lane a message was submitted to.
pub(crate) const LANE_TAG: &str = "lane";

#[derive(Default)]
pub(crate) struct ScriptedBus {
    published: Mutex<Vec<(String, Message)>>,
    attempts: AtomicUsize,
    fail_next: AtomicUsize,
    failing_targets: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    in_flight: Mutex<HashMap<i64, usize>>,
    lane_overlap: AtomicBool,
    task_in_flight: Mutex<HashMap<tokio::task::Id, usize>>,
    task_overlap: AtomicBool,
    total_in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_subscribe: AtomicBool,
    handlers: Mutex<HashMap<String, Arc<dyn MessageHandler>>>,
}

impl ScriptedBus {
    pub(crate) fn destination(self: &Arc<Self>, target: &str) -> Destination {
        Destination::new(self.clone(), target)
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub(crate) fn fail_target(&self, target: &str, failing: bool) {
        let mut targets = self.failing_targets.lock().unwrap();
        if failing {
            targets.insert(target.to_string());
        } else {
            targets.remove(target);
        }
    }

    pub(crate) fn fail_subscribe(&self, failing: bool) {
        self.fail_subscribe.store(failing, Ordering::SeqCst);
    }

    /// Handler registered on `source_name`, if any.
    pub(crate) fn handler(&self, source_name: &str) -> Option<Arc<dyn MessageHandler>> {
        self.handlers.lock().unwrap().get(source_name).cloned()
    }

    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub(crate) fn published(&self, target: &str) -> Vec<Message> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(published_to, _)| published_to == target)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub(crate) fn published_payloads(&self, target: &str) -> Vec<Vec<u8>> {
        self.published(target)
            .into_iter()
            .map(|message| message.payload)
            .collect()
    }

    /// Whether two publishes tagged with the same lane ever overlapped.
    pub(crate) fn lane_overlap_detected(&self) -> bool {
        self.lane_overlap.load(Ordering::SeqCst)
    }

    /// Distinct tasks that ever called `publish`.
    pub(crate) fn publishing_task_count(&self) -> usize {
        self.task_in_flight.lock().unwrap().len()
    }

    /// Whether one task ever had two publishes in flight at once.
    pub(crate) fn task_overlap_detected(&self) -> bool {
        self.task_overlap.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent publishes seen across all callers.
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn enter_task(&self) {
        let now = self.total_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(task) = tokio::task::try_id() {
            let mut in_flight = self.task_in_flight.lock().unwrap();
            let count = in_flight.entry(task).or_default();
            *count += 1;
            if *count > 1 {
                self.task_overlap.store(true, Ordering::SeqCst);
            }
        }
    }

    fn leave_task(&self) {
        self.total_in_flight.fetch_sub(1, Ordering::SeqCst);
        if let Some(task) = tokio::task::try_id() {
            if let Some(count) = self.task_in_flight.lock().unwrap().get_mut(&task) {
                *count -= 1;
            }
        }
    }

    fn enter_lane(&self, lane: Option<i64>) {
        if let Some(lane) = lane {
            let mut in_flight = self.in_flight.lock().unwrap();
            let count = in_flight.entry(lane).or_default();
            *count += 1;
            if *count > 1 {
                self.lane_overlap.store(true, Ordering::SeqCst);
            }
        }
    }

    fn leave_lane(&self, lane: Option<i64>) {
        if let Some(lane) = lane {
            if let Some(count) = self.in_flight.lock().unwrap().get_mut(&lane) {
                *count -= 1;
            }
        }
    }

    fn should_fail(&self, target: &str) -> bool {
        if self.failing_targets.lock().unwrap().contains(target) {
            return true;
        }
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl Bus for ScriptedBus {
    fn name(&self) -> &str {
        "scripted"
    }

    fn has_source(&self, _source_name: &str) -> bool {
        true
    }

    fn has_target(&self, _target_name: &str) -> bool {
        true
    }

    async fn subscribe(
        &self,
        source_name: &str,
        handler: Arc<dyn MessageHandler>,
        _cancel: CancellationToken,
    ) -> Result<(), BusError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(BusError::Subscribe(format!("{source_name} is unavailable")));
        }
        self.handlers
            .lock()
            .unwrap()
            .insert(source_name.to_string(), handler);
        Ok(())
    }

    async fn publish(&self, target_name: &str, message: &Message) -> Result<(), BusError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let lane = message.meta_i64(LANE_TAG);
        self.enter_lane(lane);
        self.enter_task();

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.should_fail(target_name) {
            Err(BusError::Publish(format!("{target_name} rejected the message")))
        } else {
            self.published
                .lock()
                .unwrap()
                .push((target_name.to_string(), message.clone()));
            Ok(())
        };

        self.leave_task();
        self.leave_lane(lane);
        result
    }

    async fn close(&self) -> Result<(), BusError> {
        Ok(())
    }
}
