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
use bus_bridge::{
    now_unix_ms, BusError, HandleError, Ingress, Message, MessageHandler, Metadata,
    META_CREATED_AT_MS, META_MSG_ID,
};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

const COMPONENT: &str = "memory_ingress";
const DELIVERY_QUEUE_DEPTH: usize = 1024;

/// Why [`MemoryIngress::inject`] did not get a commit.
#[derive(Debug)]
pub enum InjectError {
    /// No handler has been started on the point yet.
    NotSubscribed,
    /// The point was stopped or its subscription cancelled.
    Stopped,
    /// The handler refused to commit the message.
    Refused(HandleError),
}

impl Display for InjectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InjectError::NotSubscribed => write!(f, "no handler subscribed"),
            InjectError::Stopped => write!(f, "ingress stopped"),
            InjectError::Refused(err) => write!(f, "handler refused message: {err}"),
        }
    }
}

impl Error for InjectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InjectError::Refused(err) => Some(err),
            _ => None,
        }
    }
}

struct Delivery {
    message: Message,
    completion: oneshot::Sender<Result<(), HandleError>>,
}

#[derive(Default)]
struct IngressState {
    sender: Option<mpsc::Sender<Delivery>>,
    dispatch_cancel: Option<CancellationToken>,
    stopped: bool,
}

/// Named ingress point. Injected messages are handed to the subscribed handler by a
/// dispatcher task, concurrently, the way a broker client delivers them.
pub struct MemoryIngress {
    source_name: String,
    state: Mutex<IngressState>,
    committed: AtomicUsize,
}

impl MemoryIngress {
    pub(crate) fn new(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            state: Mutex::new(IngressState::default()),
            committed: AtomicUsize::new(0),
        }
    }

    /// Delivers a message and waits for the handler's verdict.
    ///
    /// `msg_id` and `createdAtMs` are stamped unless `meta` already carries them.
    pub async fn inject(
        &self,
        payload: impl Into<Vec<u8>>,
        meta: Metadata,
    ) -> Result<(), InjectError> {
        let sender = {
            let state = self.state.lock().map_err(|_| InjectError::Stopped)?;
            if state.stopped {
                return Err(InjectError::Stopped);
            }
            state.sender.clone().ok_or(InjectError::NotSubscribed)?
        };

        let mut message = Message::new(payload);
        message.meta = meta;
        message
            .meta
            .entry(META_MSG_ID.to_string())
            .or_insert_with(|| Value::from(Uuid::new_v4().to_string()));
        message
            .meta
            .entry(META_CREATED_AT_MS.to_string())
            .or_insert_with(|| Value::from(now_unix_ms()));

        let (completion, verdict) = oneshot::channel();
        sender
            .send(Delivery {
                message,
                completion,
            })
            .await
            .map_err(|_| InjectError::Stopped)?;

        verdict
            .await
            .map_err(|_| InjectError::Stopped)?
            .map_err(InjectError::Refused)?;
        self.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Messages the handler allowed to commit.
    pub fn committed(&self) -> usize {
        self.committed.load(Ordering::SeqCst)
    }

    pub fn is_subscribed(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.sender.is_some() && !state.stopped)
            .unwrap_or(false)
    }
}

async fn dispatch(
    source_name: String,
    handler: Arc<dyn MessageHandler>,
    mut deliveries: mpsc::Receiver<Delivery>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            delivery = deliveries.recv() => {
                let Some(delivery) = delivery else { break };
                let handler = handler.clone();
                tokio::spawn(async move {
                    let verdict = handler.handle(delivery.message).await;
                    let _ = delivery.completion.send(verdict);
                });
            }
        }
    }
    debug!(
        component = COMPONENT,
        source_name = source_name.as_str(),
        "dispatcher stopped"
    );
}

#[async_trait]
impl Ingress for MemoryIngress {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    async fn start(
        &self,
        handler: Arc<dyn MessageHandler>,
        cancel: CancellationToken,
    ) -> Result<(), BusError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| BusError::Subscribe("ingress state poisoned".to_string()))?;
        if state.stopped {
            return Err(BusError::Closed);
        }
        if state.sender.is_some() {
            return Err(BusError::Subscribe(format!(
                "{:?} already has a subscriber",
                self.source_name
            )));
        }

        let (sender, deliveries) = mpsc::channel(DELIVERY_QUEUE_DEPTH);
        let dispatch_cancel = cancel.child_token();
        tokio::spawn(dispatch(
            self.source_name.clone(),
            handler,
            deliveries,
            dispatch_cancel.clone(),
        ));
        state.sender = Some(sender);
        state.dispatch_cancel = Some(dispatch_cancel);

        debug!(
            component = COMPONENT,
            source_name = self.source_name.as_str(),
            "handler subscribed"
        );
        Ok(())
    }

    async fn stop(&self) -> Result<(), BusError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| BusError::Close("ingress state poisoned".to_string()))?;
        state.stopped = true;
        state.sender = None;
        if let Some(cancel) = state.dispatch_cancel.take() {
            cancel.cancel();
        }
        Ok(())
    }
}
