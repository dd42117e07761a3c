//! Transport layer for Bayeux-style publish/subscribe clients
//!
//! This library moves protocol messages between a client session and its
//! endpoint over exchangeable carriers. It picks a usable carrier for an
//! endpoint, stamps outbound messages with correlation ids, matches replies
//! back to the callbacks waiting on them, forwards server advice, and hands
//! event messages to the session in batches.
//!
//! Two carriers ship with the crate:
//!
//! - `long-polling`: JSON over HTTP `POST`, retrying network failures with
//!   doubling backoff (feature `transport_http`, on by default)
//! - `in-process`: direct calls into a server object in the same process
//!
//! Further carriers plug in through [`CarrierFactory`] and
//! [`CarrierRegistry::register`].
//!

// Import all sub modules once...
mod domain;
mod macros;
mod pending;
mod registry;
mod retry;
mod transport;
mod transport_core;

mod config;
mod correlation;
mod error;
mod transport_builder;

#[allow(unused_imports)]
pub(crate) use macros::{log_debug, log_error, log_info, log_warn};

// Re-export main types
pub use config::HttpConfig;
pub use correlation::IdGenerator;
pub use error::{Result, TransportError};
pub use registry::{CarrierFactory, CarrierRegistry};
pub use transport_builder::TransportBuilder;
pub use transport_core::TransportCore;

pub use transport::{
    //
    LocalCarrier,
    LocalCarrierFactory,
    IN_PROCESS,
    LONG_POLLING,
};

#[cfg(feature = "transport_http")]
pub use transport::{HttpCarrier, HttpCarrierFactory};

// --- public re-exports
pub use domain::{
    //
    Advice,
    Callback,
    Disposition,
    Endpoint,
    LocalServer,
    LocalServerPtr,
    Message,
    OnComplete,
    Payload,
    Session,
    SessionPtr,
    Transport,
    TransportPtr,
};
