//! Domain layer public interface.
//!
//! Message model, collaborator traits and the carrier interface. Nothing
//! here depends on a concrete carrier or HTTP client.
//!
//! All domain consumers must import symbols via this module, not by
//! referencing individual files directly.

mod message;
mod session;
mod transport;

pub use message::{Advice, Message, Payload};

pub use session::{
    //
    Endpoint,
    LocalServer,
    LocalServerPtr,
    OnComplete,
    Session,
    SessionPtr,
};

pub use transport::{
    //
    Callback,
    Disposition,
    Transport,
    TransportPtr,
};
