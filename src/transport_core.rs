//! Carrier-neutral transport state.
//!
//! [`TransportCore`] is the part of every transport that does not care how
//! bytes move: it stamps outbound messages with correlation ids, keeps the
//! callbacks waiting on them, and turns an inbound payload into callback
//! invocations, advice notifications and one delivery batch.
//!
//! # Receive batching
//!
//! Each response in a payload goes through the session's incoming extension
//! pipeline on its own task. Results are consumed one at a time, in the order
//! the pipeline steps finish, by the task running [`TransportCore::receive`].
//! All batch bookkeeping therefore happens on a single task and needs no
//! locking; only the callback table, which `send` also touches, sits behind
//! a mutex.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinSet;

use crate::correlation::IdGenerator;
use crate::pending::PendingCallbacks;
use crate::{Callback, Disposition, Endpoint, Message, Payload, SessionPtr};

/// Acquire mutex guard, ignoring poisoning
pub(crate) fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Shared state embedded in every carrier.
pub struct TransportCore {
    connection_type: Arc<str>,
    session: SessionPtr,
    endpoint: Endpoint,
    ids: IdGenerator,
    pending: Mutex<PendingCallbacks>,
}

/// Bookkeeping for one call to `receive`.
struct ReceiveBatch {
    total: usize,
    processed: usize,
    deliverable: bool,
    collected: Vec<Message>,
}

impl ReceiveBatch {
    fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
            deliverable: true,
            collected: Vec::new(),
        }
    }

    /// Count one finished response. Returns the batch to deliver once the
    /// last response is in and nothing suppressed delivery.
    fn ping(&mut self) -> Option<Vec<Message>> {
        self.processed += 1;
        if self.processed == self.total && self.deliverable {
            Some(std::mem::take(&mut self.collected))
        } else {
            None
        }
    }
}

impl TransportCore {
    /// Create core state for a transport of type `connection_type` serving
    /// `session`. The endpoint is captured from the session once, here.
    pub fn new(connection_type: impl Into<Arc<str>>, session: SessionPtr) -> Arc<Self> {
        // ---
        let connection_type = connection_type.into();
        let endpoint = session.endpoint();

        crate::log_debug!("Created new {connection_type} transport for {endpoint}");

        Arc::new(Self {
            connection_type,
            session,
            endpoint,
            ids: IdGenerator::new(),
            pending: Mutex::new(PendingCallbacks::new()),
        })
    }

    /// Registered type name of the owning carrier.
    pub fn connection_type(&self) -> &str {
        &self.connection_type
    }

    /// Session this transport serves.
    pub fn session(&self) -> &SessionPtr {
        &self.session
    }

    /// Endpoint this transport talks to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Number of callbacks still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        lock_ignore_poison(&self.pending).len()
    }

    /// Stamp an outbound payload with a correlation id and store `callback`.
    ///
    /// Only a single message without an id takes part in correlation. The
    /// assigned id, if any, is returned alongside the payload.
    pub fn prepare(&self, payload: Payload, callback: Callback) -> (Payload, Option<String>) {
        // ---
        match payload {
            Payload::Single(mut message) if message.id.is_none() => {
                let id = self.ids.generate();
                message.id = Some(id.clone());
                lock_ignore_poison(&self.pending).register(id.clone(), callback);
                (Payload::Single(message), Some(id))
            }
            other => (other, None),
        }
    }

    /// Drop the callback stored for `id`, e.g. after the request failed.
    pub(crate) fn forget(&self, id: &str) {
        lock_ignore_poison(&self.pending).remove(id);
    }

    /// Drop every pending callback. Returns how many were dropped.
    pub(crate) fn close(&self) -> usize {
        let dropped = lock_ignore_poison(&self.pending).clear();
        if dropped > 0 {
            crate::log_debug!(
                "{} transport for {} closed with {dropped} pending callbacks",
                self.connection_type,
                self.endpoint
            );
        }
        dropped
    }

    /// Process an inbound payload.
    ///
    /// Every response runs through the incoming extension pipeline
    /// concurrently. As each one finishes, its callback (if any) is run, its
    /// advice (if any) is forwarded, and it is collected if it is an event.
    /// After the last one finishes, the collected events are delivered in a
    /// single call unless a callback returned [`Disposition::Suppress`].
    ///
    /// Events are collected in pipeline completion order, which need not
    /// match payload order. An empty payload delivers nothing.
    ///
    /// # Panics
    ///
    /// A panic in a callback or in a pipeline step propagates out of this
    /// function.
    pub async fn receive(&self, payload: Payload) {
        // ---
        let responses = payload.into_messages();

        crate::log_debug!(
            "Client {} received from {}: {:?}",
            self.session.client_id(),
            self.endpoint,
            responses
        );

        let mut batch = ReceiveBatch::new(responses.len());
        let mut steps = JoinSet::new();

        for response in responses {
            let session = self.session.clone();
            steps.spawn(async move { session.pipe_incoming(response).await });
        }

        while let Some(step) = steps.join_next().await {
            let response = match step {
                Ok(response) => response,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => {
                    crate::log_warn!("incoming extension step did not finish: {err}");
                    None
                }
            };

            if let Some(response) = response {
                self.settle(&mut batch, response);
            }

            if let Some(messages) = batch.ping() {
                self.session.deliver_messages(messages);
            }
        }
    }

    /// Apply one response that survived the extension pipeline.
    fn settle(&self, batch: &mut ReceiveBatch, response: Message) {
        // ---
        // Released before the callback runs; it may send again.
        let callback = lock_ignore_poison(&self.pending).take_for(&response);

        match (callback, response.id.as_deref()) {
            (Some(callback), _) => {
                if callback(&response) == Disposition::Suppress {
                    batch.deliverable = false;
                }
            }
            (None, Some(id)) => crate::log_debug!("no pending callback for reply id {id}"),
            (None, None) => {}
        }

        if let Some(advice) = &response.advice {
            self.session.handle_advice(advice.clone());
        }

        if response.is_event() {
            batch.collected.push(response);
        }
    }
}
