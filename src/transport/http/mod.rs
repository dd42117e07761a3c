// src/transport/http/mod.rs

//! HTTP long-polling carrier using `reqwest`.
//!
//! Each outbound payload becomes one JSON `POST` to the endpoint URL, and the
//! JSON body of the response is fed back into the transport core. The server
//! holds `/meta/connect` requests open until it has something to say, which
//! is what makes this long-polling.
//!
//! ## Failure handling
//!
//! - Network failures (connect, I/O, reading the body) are retried after the
//!   session's configured timeout, doubling on each consecutive failure,
//!   with no attempt limit and no delay cap. They are never reported to the
//!   session.
//! - A completed exchange is accepted whatever its status code. If its body
//!   is not JSON the request is abandoned and the session's `handle_error`
//!   receives a [`TransportError::Parse`](crate::TransportError::Parse).
//! - The `reqwest` client has no timeout of its own.
//!
//! ## Teardown
//!
//! Each request runs, retries included, as one task owned by the carrier.
//! Closing or dropping the carrier aborts those tasks, which also cancels any
//! pending retry timer. A panic raised while an exchange handled its reply
//! is resumed by the next `request` or by `close()`.

mod transport;

pub use transport::{HttpCarrier, HttpCarrierFactory};
