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

//! Inbound handler registered on a route's source; translates pipeline results into commit
//! decisions.

use crate::bus::{HandleError, MessageHandler};
use crate::data_plane::pipeline::Pipeline;
use crate::message::Message;
use crate::observability::{events, fields};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, Level};

const COMPONENT: &str = "ingress_handler";

pub(crate) struct RouteHandler {
    route: String,
    pipeline: Arc<Pipeline>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl RouteHandler {
    pub(crate) fn new(
        route: &str,
        pipeline: Arc<Pipeline>,
        tracker: TaskTracker,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            route: route.to_string(),
            pipeline,
            tracker,
            cancel,
        }
    }
}

#[async_trait]
impl MessageHandler for RouteHandler {
    async fn handle(&self, message: Message) -> Result<(), HandleError> {
        let route_label = self.route.as_str();

        if self.cancel.is_cancelled() {
            debug!(
                event = events::INGRESS_REJECT_SHUTTING_DOWN,
                component = COMPONENT,
                route_label,
                msg_id = %fields::format_message_id(&message),
                "route stopping; refusing message"
            );
            return Err(HandleError::ShuttingDown);
        }

        if tracing::enabled!(Level::DEBUG) {
            debug!(
                event = events::INGRESS_RECEIVE,
                component = COMPONENT,
                route_label,
                msg_id = %fields::format_message_id(&message),
                size = message.payload.len(),
                "received inbound message"
            );
        }

        let pipeline = self.pipeline.clone();
        self.tracker
            .track_future(async move { pipeline.process(message).await })
            .await
            .map(|_| ())
            .map_err(HandleError::Undelivered)
    }
}

#[cfg(test)]
mod tests {
    use super::RouteHandler;
    use crate::bus::{HandleError, MessageHandler};
    use crate::control_plane::route_compiler::{CompiledRoute, Source};
    use crate::data_plane::lane_pool::LanePool;
    use crate::data_plane::pipeline::Pipeline;
    use crate::data_plane::test_support::ScriptedBus;
    use crate::message::Message;
    use crate::routing::delivery_mode::{DeliveryMode, RetryBackoff};
    use crate::routing::filter::FilterChain;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use tokio_util::task::TaskTracker;

    fn handler(bus: &Arc<ScriptedBus>, cancel: &CancellationToken) -> (RouteHandler, Arc<LanePool>) {
        let route = CompiledRoute {
            name: "r".to_string(),
            source: Source::new(bus.clone(), "in"),
            destinations: vec![bus.destination("out")],
            filters: FilterChain::default(),
            projection: None,
            codec: None,
            mode: DeliveryMode::Persistent,
        };
        let pool = Arc::new(LanePool::spawn("r", bus.destination("out"), 1, 4));
        let pipeline = Pipeline::new(
            &route,
            vec![pool.clone()],
            RetryBackoff::new(Duration::from_millis(1), Duration::from_millis(2)),
            cancel.clone(),
        );
        (
            RouteHandler::new("r", Arc::new(pipeline), TaskTracker::new(), cancel.clone()),
            pool,
        )
    }

    #[tokio::test]
    async fn commits_delivered_messages() {
        let bus = Arc::new(ScriptedBus::default());
        let cancel = CancellationToken::new();
        let (handler, pool) = handler(&bus, &cancel);

        handler
            .handle(Message::new(b"hi".to_vec()))
            .await
            .expect("delivered message should commit");

        assert_eq!(bus.published_payloads("out"), vec![b"hi".to_vec()]);
        pool.close();
        pool.join().await;
    }

    #[tokio::test]
    async fn refuses_messages_once_cancelled() {
        let bus = Arc::new(ScriptedBus::default());
        let cancel = CancellationToken::new();
        let (handler, pool) = handler(&bus, &cancel);
        cancel.cancel();

        let result = handler.handle(Message::new(b"late".to_vec())).await;

        assert!(matches!(result, Err(HandleError::ShuttingDown)));
        assert_eq!(bus.attempts(), 0);
        pool.close();
        pool.join().await;
    }

    #[tokio::test]
    async fn reports_undelivered_messages() {
        let bus = Arc::new(ScriptedBus::default());
        bus.fail_target("out", true);
        let cancel = CancellationToken::new();
        let (handler, pool) = handler(&bus, &cancel);

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            stopper.cancel();
        });
        let result = handler.handle(Message::new(b"x".to_vec())).await;

        match result {
            Err(HandleError::Undelivered(err)) => assert_eq!(err.failures().len(), 1),
            other => panic!("expected undelivered, got {other:?}"),
        }
        pool.close();
        pool.join().await;
    }
}
