// src/domain/transport.rs

//! Transport domain abstractions.
//!
//! A transport moves Bayeux messages between one session and one endpoint
//! over some carrier (HTTP long-polling, an in-process call, ...). This
//! module defines the interface every carrier implements. The carrier-neutral
//! half of the work (correlation ids, pending callbacks, receive batching)
//! lives in [`TransportCore`], which each carrier embeds and exposes through
//! [`Transport::core`]. Concrete carriers live under `src/transport/`.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::{Endpoint, Message, Payload, Result, TransportCore, TransportError};

/// What a reply callback wants done with the rest of its batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    // ---
    /// Deliver the batch's event messages as normal.
    #[default]
    Deliver,

    /// Withhold delivery of every event message in the same batch.
    Suppress,
}

impl From<bool> for Disposition {
    fn from(deliver: bool) -> Self {
        if deliver {
            Disposition::Deliver
        } else {
            Disposition::Suppress
        }
    }
}

/// Reply continuation stored under a message id until the reply arrives.
pub type Callback = Box<dyn FnOnce(&Message) -> Disposition + Send + 'static>;

/// Carrier interface.
///
/// Implementations provide raw I/O through [`request`](Transport::request)
/// and feed whatever comes back into [`TransportCore::receive`]. Everything
/// else has a default built on the embedded core.
///
/// # Teardown
///
/// Dropping or [closing](Transport::close) a transport aborts its in-flight
/// requests and retry timers. Callbacks still waiting for a reply are dropped
/// without being called; callers using
/// [`send_and_wait`](Transport::send_and_wait) see
/// [`TransportError::Closed`].
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    // ---
    /// Returns the shared core state.
    ///
    /// Required method - each carrier returns `&self.core`.
    fn core(&self) -> &Arc<TransportCore>;

    /// Registered type name of this carrier, e.g. `"long-polling"`.
    fn connection_type(&self) -> &str {
        self.core().connection_type()
    }

    /// Endpoint this transport was created for.
    fn endpoint(&self) -> &Endpoint {
        self.core().endpoint()
    }

    /// Number of callbacks still waiting for a reply.
    fn pending_count(&self) -> usize {
        self.core().pending_count()
    }

    /// Carrier-specific delivery of an already prepared payload.
    ///
    /// Returns once the payload is handed to the carrier, not when a reply
    /// arrives.
    async fn request(&self, payload: Payload) -> Result<()>;

    /// Abort in-flight work and drop pending callbacks.
    fn close(&self);

    /// Send a payload, registering `callback` for its reply.
    ///
    /// A single message without an `id` gets a fresh one and `callback` is
    /// stored under it. A message that already has an id, or a batch, is sent
    /// as is and `callback` is dropped unused.
    async fn send(&self, payload: Payload, callback: Callback) -> Result<()> {
        // ---
        let (payload, id) = self.core().prepare(payload, callback);

        crate::log_debug!(
            "Client {} sending message to {}: {:?}",
            self.core().session().client_id(),
            self.endpoint(),
            payload
        );

        let result = self.request(payload).await;

        if result.is_err() {
            if let Some(id) = id {
                self.core().forget(&id);
            }
        }
        result
    }

    /// Send a message and wait for its reply.
    ///
    /// Any `id` already on the message is replaced with a fresh one so the
    /// reply can be matched. The reply is not withheld from delivery.
    async fn send_and_wait(&self, mut message: Message) -> Result<Message> {
        // ---
        message.id = None;

        let (tx, rx) = oneshot::channel();
        let callback: Callback = Box::new(move |reply| {
            let _ = tx.send(reply.clone());
            Disposition::Deliver
        });

        self.send(Payload::Single(message), callback).await?;

        rx.await.map_err(|_| TransportError::Closed)
    }
}

/// Shared transport pointer.
///
/// This is an `Arc<dyn Transport>`; cloning is cheap and every clone talks
/// to the same carrier instance.
pub type TransportPtr = Arc<dyn Transport>;
