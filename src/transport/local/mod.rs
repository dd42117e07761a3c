// src/transport/local/mod.rs

//! In-process carrier.
//!
//! This module provides a carrier that hands messages straight to a
//! [`LocalServer`](crate::LocalServer) living in the same process, with no
//! serialization and no network. It is what a client uses when it is
//! embedded next to its server, and it is the simplest reference for how a
//! carrier plugs into [`TransportCore`](crate::TransportCore).
//!
//! ## Semantics
//!
//! - `request()` calls the server's `process` and returns as soon as that
//!   call returns.
//! - The server's reply may come back during `process` or at any later
//!   time, from any thread.
//! - Replies are fed to `receive` on the tokio runtime that issued the
//!   request. Replies that arrive after the transport is closed or dropped
//!   are discarded.
//! - If a reply's `receive` panics (a callback bug), the next `request` or
//!   `close()` on this carrier resumes that panic.
//!
//! ## Non-Goals
//!
//! - Retry. A local call cannot fail at the network level.

mod transport;

pub use transport::{LocalCarrier, LocalCarrierFactory};
