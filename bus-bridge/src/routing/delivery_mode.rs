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

//! Per-route delivery guarantees and the retry decision taken after a failed publish.

use crate::observability::fields;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_RETRY_INITIAL: Duration = Duration::from_millis(50);
pub const DEFAULT_RETRY_MAX: Duration = Duration::from_secs(5);

/// Bounds of a `drop` route. At least one is set and every set bound is positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropPolicy {
    ttl: Option<Duration>,
    max_attempts: Option<u32>,
}

impl DropPolicy {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Retry every failed destination until it succeeds or the route stops.
    Persistent,
    /// Give up on a destination once a bound is hit and count the message as handled.
    Drop(DropPolicy),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidModeError {
    Unbounded,
    ZeroTtl,
    ZeroMaxAttempts,
    PersistentWithBounds,
}

impl Display for InvalidModeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidModeError::Unbounded => {
                write!(f, "drop mode requires ttl_ms, max_attempts or both")
            }
            InvalidModeError::ZeroTtl => write!(f, "drop mode ttl_ms must be positive"),
            InvalidModeError::ZeroMaxAttempts => {
                write!(f, "drop mode max_attempts must be positive")
            }
            InvalidModeError::PersistentWithBounds => {
                write!(f, "persistent mode does not take ttl_ms or max_attempts")
            }
        }
    }
}

impl Error for InvalidModeError {}

/// What to do with a destination after one more failed attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureAction {
    Retry,
    /// Stop retrying and report the destination as handled; carries a log reason.
    Tolerate(&'static str),
}

impl DeliveryMode {
    pub fn drop(ttl: Option<Duration>, max_attempts: Option<u32>) -> Result<Self, InvalidModeError> {
        match (ttl, max_attempts) {
            (None, None) => Err(InvalidModeError::Unbounded),
            (Some(ttl), _) if ttl.is_zero() => Err(InvalidModeError::ZeroTtl),
            (_, Some(0)) => Err(InvalidModeError::ZeroMaxAttempts),
            _ => Ok(DeliveryMode::Drop(DropPolicy { ttl, max_attempts })),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeliveryMode::Persistent => "persistent",
            DeliveryMode::Drop(_) => "drop",
        }
    }

    /// Decides after `attempts` failed publishes of a message that is `age_ms` old.
    ///
    /// An unknown age never satisfies the TTL bound.
    pub fn on_failure(&self, attempts: u32, age_ms: Option<i64>) -> FailureAction {
        let DeliveryMode::Drop(policy) = self else {
            return FailureAction::Retry;
        };

        if policy
            .max_attempts
            .is_some_and(|max_attempts| attempts >= max_attempts)
        {
            return FailureAction::Tolerate(fields::REASON_MAX_ATTEMPTS);
        }

        if let (Some(ttl), Some(age_ms)) = (policy.ttl, age_ms) {
            if age_ms > 0 && age_ms as u128 > ttl.as_millis() {
                return FailureAction::Tolerate(fields::REASON_TTL_EXPIRED);
            }
        }

        FailureAction::Retry
    }
}

impl Display for DeliveryMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryMode::Persistent => write!(f, "persistent"),
            DeliveryMode::Drop(policy) => {
                write!(f, "drop(")?;
                match policy.ttl {
                    Some(ttl) => write!(f, "ttl={}ms", ttl.as_millis())?,
                    None => write!(f, "ttl=none")?,
                }
                match policy.max_attempts {
                    Some(max_attempts) => write!(f, ", max_attempts={max_attempts})"),
                    None => write!(f, ", max_attempts=none)"),
                }
            }
        }
    }
}

/// Bounded exponential backoff between attempts on one destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryBackoff {
    initial: Duration,
    max: Duration,
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self {
            initial: DEFAULT_RETRY_INITIAL,
            max: DEFAULT_RETRY_MAX,
        }
    }
}

impl RetryBackoff {
    /// `max` is raised to `initial` when smaller.
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
        }
    }

    pub fn initial(&self) -> Duration {
        self.initial
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Wait before the retry that follows `failures` consecutive failures (1-based).
    pub fn delay_after(&self, failures: u32) -> Duration {
        let doublings = failures.saturating_sub(1).min(31);
        self.initial
            .checked_mul(1_u32 << doublings)
            .unwrap_or(self.max)
            .min(self.max)
    }
}
