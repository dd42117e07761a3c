// src/domain/session.rs

//! Collaborator interfaces.
//!
//! The transport layer sits between two parties it does not own: the client
//! session above it, and (for the in-process carrier) a server object beside
//! it. This module defines the minimal surface required from each, plus the
//! [`Endpoint`] type that names where a session is connecting to.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::{Advice, Message, Payload, TransportError};

/// Client session that owns a transport.
///
/// Handshake, subscriptions and the extension chain live behind this trait;
/// the transport only consumes them.
#[async_trait::async_trait]
pub trait Session: Send + Sync {
    // ---
    /// Client id assigned at handshake, or empty before that.
    fn client_id(&self) -> String;

    /// Where this session connects to.
    fn endpoint(&self) -> Endpoint;

    /// Base retry delay for the HTTP carrier.
    fn configured_timeout(&self) -> Duration;

    /// Run an inbound message through the incoming extension pipeline.
    ///
    /// Returning `None` drops the message.
    async fn pipe_incoming(&self, message: Message) -> Option<Message>;

    /// Hand a batch of event messages to subscribers.
    fn deliver_messages(&self, messages: Vec<Message>);

    /// React to server reconnection advice.
    fn handle_advice(&self, advice: Advice);

    /// Receive failures the transport will not retry, such as a response
    /// body that is not JSON.
    fn handle_error(&self, error: TransportError);
}

/// Shared session pointer.
pub type SessionPtr = Arc<dyn Session>;

/// Reply continuation handed to [`LocalServer::process`].
///
/// Must be called at most once, with whatever the server wants to send back.
pub type OnComplete = Box<dyn FnOnce(Payload) + Send + 'static>;

/// A Bayeux server running in the same process.
pub trait LocalServer: Send + Sync {
    /// Process an inbound request.
    ///
    /// `is_local` is always `true` when called by the in-process carrier.
    /// The server may call `on_complete` before returning or at any later
    /// point; both are valid.
    fn process(&self, message: Payload, is_local: bool, on_complete: OnComplete);
}

/// Shared in-process server pointer.
pub type LocalServerPtr = Arc<dyn LocalServer>;

/// Address a session connects to.
#[derive(Clone)]
pub enum Endpoint {
    // ---
    /// A URL string, e.g. `http://localhost:8000/bayeux`.
    Url(String),

    /// A server object in this process.
    Local(LocalServerPtr),
}

impl Endpoint {
    /// The URL string, if this endpoint is one.
    pub fn as_url(&self) -> Option<&str> {
        match self {
            Endpoint::Url(url) => Some(url),
            Endpoint::Local(_) => None,
        }
    }

    /// The server object, if this endpoint is one.
    pub fn as_local(&self) -> Option<&LocalServerPtr> {
        match self {
            Endpoint::Url(_) => None,
            Endpoint::Local(server) => Some(server),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Url(url) => f.write_str(url),
            Endpoint::Local(_) => f.write_str("<in-process server>"),
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Endpoint::Local(_) => f.write_str("Local(..)"),
        }
    }
}

impl From<&str> for Endpoint {
    fn from(url: &str) -> Self {
        Endpoint::Url(url.to_string())
    }
}

impl From<String> for Endpoint {
    fn from(url: String) -> Self {
        Endpoint::Url(url)
    }
}

impl From<LocalServerPtr> for Endpoint {
    fn from(server: LocalServerPtr) -> Self {
        Endpoint::Local(server)
    }
}
