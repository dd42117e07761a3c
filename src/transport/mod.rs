//! Carrier implementations.
//!
//! This module provides the concrete implementations of the domain-level
//! `Transport` trait and the factories that register them. The HTTP
//! carrier is behind the `transport_http` feature; the in-process carrier
//! is always available.
//!
//! Domain code must not depend on carrier-specific types.

#[cfg(feature = "transport_http")]
mod http;
mod local;
mod tasks;

#[cfg(feature = "transport_http")]
pub use http::{HttpCarrier, HttpCarrierFactory};

pub use local::{LocalCarrier, LocalCarrierFactory};

pub(crate) use tasks::TaskList;

/// Registered type name of the HTTP long-polling carrier.
pub const LONG_POLLING: &str = "long-polling";

/// Registered type name of the in-process carrier.
pub const IN_PROCESS: &str = "in-process";
