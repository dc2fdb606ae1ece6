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

//! Per-message processing for one route: decode, filter, project, fan out, aggregate.
//!
//! Every destination of a message is delivered concurrently through its own lane pool, and
//! the pipeline only reports success once all of them either published the message or
//! gave up on it under the route's `drop` policy.

use crate::bus::BusError;
use crate::codec::{CodecError, Decoded, PayloadCodec};
use crate::control_plane::route_compiler::CompiledRoute;
use crate::data_plane::lane_pool::{LaneError, LanePool};
use crate::message::{
    now_unix_ms, Fields, Message, META_CONTENT_TYPE, META_ROUTE, META_SIZE, META_SOURCE_NAME,
};
use crate::observability::{events, fields};
use crate::routing::delivery_mode::{DeliveryMode, FailureAction, RetryBackoff};
use crate::routing::filter::{FilterChain, FilterError, FilterVerdict};
use crate::routing::projection::{Projection, ProjectionError};
use futures::future::join_all;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Level};

const COMPONENT: &str = "pipeline";

/// Why one destination ended up without the message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishError {
    /// The route stopped while the destination was still failing.
    Cancelled {
        destination: String,
        attempts: u32,
        last_err: Option<BusError>,
    },
    /// The destination's lanes stopped accepting jobs.
    LaneClosed {
        destination: String,
        attempts: u32,
        last_err: Option<BusError>,
    },
}

impl PublishError {
    pub fn destination(&self) -> &str {
        match self {
            PublishError::Cancelled { destination, .. }
            | PublishError::LaneClosed { destination, .. } => destination,
        }
    }

    /// Publish attempts that reached the bus.
    pub fn attempts(&self) -> u32 {
        match self {
            PublishError::Cancelled { attempts, .. } | PublishError::LaneClosed { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn last_error(&self) -> Option<&BusError> {
        match self {
            PublishError::Cancelled { last_err, .. } | PublishError::LaneClosed { last_err, .. } => {
                last_err.as_ref()
            }
        }
    }
}

impl Display for PublishError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (what, destination, attempts, last_err) = match self {
            PublishError::Cancelled {
                destination,
                attempts,
                last_err,
            } => ("cancelled", destination, attempts, last_err),
            PublishError::LaneClosed {
                destination,
                attempts,
                last_err,
            } => ("lane closed", destination, attempts, last_err),
        };
        write!(f, "{destination}: {what} after {attempts} attempt(s)")?;
        if let Some(err) = last_err {
            write!(f, ", last error: {err}")?;
        }
        Ok(())
    }
}

impl Error for PublishError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.last_error().map(|err| err as &(dyn Error + 'static))
    }
}

/// Every destination that neither accepted the message nor was released from it.
///
/// Returned to the source handler, whose only reaction is to not commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateError {
    route: String,
    failures: Vec<PublishError>,
}

impl AggregateError {
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn failures(&self) -> &[PublishError] {
        &self.failures
    }
}

impl Display for AggregateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "route {:?}: {} destination(s) undelivered",
            self.route,
            self.failures.len()
        )?;
        for (index, failure) in self.failures.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(f, "{separator}{failure}")?;
        }
        Ok(())
    }
}

impl Error for AggregateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.failures
            .first()
            .map(|failure| failure as &(dyn Error + 'static))
    }
}

/// Messages removed from the flow on purpose. They still count as handled.
#[derive(Debug, PartialEq)]
pub(crate) enum DropReason {
    Decode(CodecError),
    Filtered { filter: String },
    FilterFailed { filter: String, err: FilterError },
    Projection(ProjectionError),
    Encode(CodecError),
}

#[derive(Debug, PartialEq)]
pub(crate) enum Outcome {
    Delivered { published: usize, tolerated: usize },
    Dropped(DropReason),
}

enum Delivery {
    Published,
    Tolerated,
}

pub(crate) struct Pipeline {
    route: String,
    source_name: String,
    source_label: String,
    codec: Option<Arc<dyn PayloadCodec>>,
    filters: FilterChain,
    projection: Option<Projection>,
    mode: DeliveryMode,
    backoff: RetryBackoff,
    lanes: Vec<Arc<LanePool>>,
    cancel: CancellationToken,
}

impl Pipeline {
    /// `lanes` holds one pool per destination of `route`, in destination order.
    pub(crate) fn new(
        route: &CompiledRoute,
        lanes: Vec<Arc<LanePool>>,
        backoff: RetryBackoff,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            route: route.name.clone(),
            source_name: route.source.source().to_string(),
            source_label: route.source.label().to_string(),
            codec: route.codec.clone(),
            filters: route.filters.clone(),
            projection: route.projection.clone(),
            mode: route.mode,
            backoff,
            lanes,
            cancel,
        }
    }

    pub(crate) async fn process(&self, mut message: Message) -> Result<Outcome, AggregateError> {
        let decoded = match self.decode(&message) {
            Ok(decoded) => decoded,
            Err(err) => return Ok(self.dropped(&message, DropReason::Decode(err))),
        };
        self.merge_derived_meta(&mut message);

        let view = decoded.as_ref().map(|decoded| &decoded.fields);
        match self.filters.evaluate(&message, view) {
            FilterVerdict::Pass => {}
            FilterVerdict::Rejected { filter } => {
                return Ok(self.dropped(&message, DropReason::Filtered { filter }))
            }
            FilterVerdict::Failed { filter, err } => {
                return Ok(self.dropped(&message, DropReason::FilterFailed { filter, err }))
            }
        }

        if let Some(reason) = self.project(&mut message, decoded.as_ref()) {
            return Ok(self.dropped(&message, reason));
        }

        let message = Arc::new(message);
        let results = join_all(self.lanes.iter().map(|pool| self.deliver(pool, &message))).await;

        let mut published = 0;
        let mut tolerated = 0;
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(Delivery::Published) => published += 1,
                Ok(Delivery::Tolerated) => tolerated += 1,
                Err(err) => failures.push(err),
            }
        }

        if failures.is_empty() {
            debug!(
                event = events::PIPELINE_DELIVERED,
                component = COMPONENT,
                route_label = self.route.as_str(),
                msg_id = %fields::format_message_id(&message),
                published,
                tolerated,
                "message handled by every destination"
            );
            return Ok(Outcome::Delivered {
                published,
                tolerated,
            });
        }

        let err = AggregateError {
            route: self.route.clone(),
            failures,
        };
        warn!(
            event = events::PIPELINE_UNDELIVERED,
            component = COMPONENT,
            route_label = self.route.as_str(),
            msg_id = %fields::format_message_id(&message),
            err = %err,
            "message not delivered; source must not commit"
        );
        Err(err)
    }

    fn decode(&self, message: &Message) -> Result<Option<Decoded>, CodecError> {
        match &self.codec {
            Some(codec) if !message.payload.is_empty() => codec.decode(&message.payload).map(Some),
            _ => Ok(None),
        }
    }

    fn merge_derived_meta(&self, message: &mut Message) {
        let size = message.payload.len();
        message.meta.insert(META_SIZE.to_string(), size.into());
        message
            .meta
            .insert(META_SOURCE_NAME.to_string(), self.source_name.as_str().into());
        message
            .meta
            .insert(META_ROUTE.to_string(), self.route.as_str().into());
        if let Some(codec) = &self.codec {
            message
                .meta
                .insert(META_CONTENT_TYPE.to_string(), codec.content_type().into());
        }
    }

    /// Applies the projection and re-encodes. `None` means the message continues.
    fn project(&self, message: &mut Message, decoded: Option<&Decoded>) -> Option<DropReason> {
        let (Some(projection), Some(codec)) = (&self.projection, &self.codec) else {
            return None;
        };

        let empty = Fields::new();
        let input = decoded.map_or(&empty, |decoded| &decoded.fields);
        let projected = match projection.apply(message, input) {
            Ok(projected) => projected,
            Err(err) => return Some(DropReason::Projection(err)),
        };

        let retained = decoded.map(|decoded| &decoded.retained);
        match codec.encode(&projected, retained) {
            Ok(payload) => {
                message.payload = payload;
                let size = message.payload.len();
                message.meta.insert(META_SIZE.to_string(), size.into());
                None
            }
            Err(err) => Some(DropReason::Encode(err)),
        }
    }

    fn dropped(&self, message: &Message, reason: DropReason) -> Outcome {
        let route_label = self.route.as_str();
        let source = self.source_label.as_str();
        match &reason {
            DropReason::Decode(err) => warn!(
                event = events::PIPELINE_DECODE_FAILED,
                component = COMPONENT,
                route_label,
                source,
                msg_id = %fields::format_message_id(message),
                err = %err,
                "dropping undecodable message"
            ),
            DropReason::Filtered { filter } => {
                if tracing::enabled!(Level::DEBUG) {
                    debug!(
                        event = events::PIPELINE_FILTERED,
                        component = COMPONENT,
                        route_label,
                        source,
                        msg_id = %fields::format_message_id(message),
                        filter = filter.as_str(),
                        "message filtered out"
                    );
                }
            }
            DropReason::FilterFailed { filter, err } => warn!(
                event = events::PIPELINE_FILTER_FAILED,
                component = COMPONENT,
                route_label,
                source,
                msg_id = %fields::format_message_id(message),
                filter = filter.as_str(),
                err = %err,
                "filter failed; dropping message"
            ),
            DropReason::Projection(err @ ProjectionError::MissingField { .. }) => {
                if tracing::enabled!(Level::DEBUG) {
                    debug!(
                        event = events::PIPELINE_PROJECTION_MISSING_FIELD,
                        component = COMPONENT,
                        route_label,
                        source,
                        msg_id = %fields::format_message_id(message),
                        err = %err,
                        "strict projection dropped message"
                    );
                }
            }
            DropReason::Projection(err) => warn!(
                event = events::PIPELINE_PROJECTION_FAILED,
                component = COMPONENT,
                route_label,
                source,
                msg_id = %fields::format_message_id(message),
                err = %err,
                "projection failed; dropping message"
            ),
            DropReason::Encode(err) => warn!(
                event = events::PIPELINE_ENCODE_FAILED,
                component = COMPONENT,
                route_label,
                source,
                msg_id = %fields::format_message_id(message),
                err = %err,
                "re-encode failed; dropping message"
            ),
        }
        Outcome::Dropped(reason)
    }

    /// Drives one destination to a final state according to the route's mode.
    async fn deliver(
        &self,
        pool: &LanePool,
        message: &Arc<Message>,
    ) -> Result<Delivery, PublishError> {
        let destination = pool.destination().label();
        let mut attempts: u32 = 0;
        let mut last_err: Option<BusError> = None;

        loop {
            attempts = attempts.saturating_add(1);
            let err = match pool.publish(message.clone()).await {
                Ok(()) => return Ok(Delivery::Published),
                Err(LaneError::QueueClosed) => {
                    return Err(PublishError::LaneClosed {
                        destination: destination.to_string(),
                        attempts: attempts - 1,
                        last_err,
                    })
                }
                Err(LaneError::Publish(err)) => err,
            };

            match self.mode.on_failure(attempts, message.age_ms(now_unix_ms())) {
                FailureAction::Tolerate(reason) => {
                    warn!(
                        event = events::DELIVERY_TOLERATED,
                        component = COMPONENT,
                        route_label = self.route.as_str(),
                        destination,
                        msg_id = %fields::format_message_id(message),
                        attempt = attempts,
                        reason,
                        err = %err,
                        "giving up on destination under drop mode"
                    );
                    return Ok(Delivery::Tolerated);
                }
                FailureAction::Retry => {}
            }

            let delay = self.backoff.delay_after(attempts);
            debug!(
                event = events::DELIVERY_RETRY_SCHEDULED,
                component = COMPONENT,
                route_label = self.route.as_str(),
                destination,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                err = %err,
                "retrying destination"
            );

            let cancelled = tokio::select! {
                _ = self.cancel.cancelled() => true,
                _ = tokio::time::sleep(delay) => false,
            };
            if cancelled {
                info!(
                    event = events::DELIVERY_CANCELLED,
                    component = COMPONENT,
                    route_label = self.route.as_str(),
                    destination,
                    msg_id = %fields::format_message_id(message),
                    attempt = attempts,
                    reason = fields::REASON_CANCELLED,
                    "route stopping; leaving message uncommitted"
                );
                return Err(PublishError::Cancelled {
                    destination: destination.to_string(),
                    attempts,
                    last_err: Some(err),
                });
            }
            last_err = Some(err);
        }
    }
}
