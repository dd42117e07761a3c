// src/transport/local/transport.rs

//! In-process carrier implementation.

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::transport::TaskList;
use crate::{
    // ---
    CarrierFactory,
    Endpoint,
    LocalServerPtr,
    OnComplete,
    Payload,
    Result,
    Transport,
    TransportCore,
    TransportError,
    TransportPtr,
};

/// Carrier that calls an in-process server directly.
pub struct LocalCarrier {
    // ---
    core: Arc<TransportCore>,
    server: LocalServerPtr,
    replies: TaskList,
}

impl LocalCarrier {
    /// Create a carrier for the server named by `core.endpoint()`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidEndpoint`] if the endpoint is a URL.
    pub fn new(core: Arc<TransportCore>) -> Result<Self> {
        // ---
        let server = core
            .endpoint()
            .as_local()
            .cloned()
            .ok_or_else(|| TransportError::InvalidEndpoint(core.endpoint().to_string()))?;

        Ok(Self {
            core,
            server,
            replies: TaskList::new(),
        })
    }
}

#[async_trait::async_trait]
impl Transport for LocalCarrier {
    // ---

    fn core(&self) -> &Arc<TransportCore> {
        &self.core
    }

    /// Pass the payload to the server's `process`.
    ///
    /// The reply continuation schedules `receive` on the current runtime, so
    /// the server may invoke it from anywhere.
    ///
    /// # Panics
    ///
    /// Resumes the panic of an earlier reply whose `receive` panicked.
    async fn request(&self, payload: Payload) -> Result<()> {
        // ---
        self.replies.check();
        if self.replies.is_closed() {
            return Err(TransportError::Closed);
        }

        let core = self.core.clone();
        let replies = self.replies.downgrade();
        let runtime = Handle::current();

        let on_complete: OnComplete = Box::new(move |reply| {
            let receive = async move { core.receive(reply).await };
            if !replies.spawn_on(receive, &runtime) {
                crate::log_debug!("discarding in-process reply for a closed transport");
            }
        });

        self.server.process(payload, true, on_complete);
        Ok(())
    }

    fn close(&self) {
        // ---
        self.core.close();
        self.replies.close();
    }
}

impl Drop for LocalCarrier {
    fn drop(&mut self) {
        self.core.close();
        self.replies.shutdown();
    }
}

/// Factory registered under [`IN_PROCESS`](crate::IN_PROCESS).
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCarrierFactory;

impl CarrierFactory for LocalCarrierFactory {
    /// Usable only for in-process server endpoints.
    fn is_usable(&self, endpoint: &Endpoint) -> bool {
        endpoint.as_local().is_some()
    }

    fn create(&self, core: Arc<TransportCore>) -> Result<TransportPtr> {
        Ok(Arc::new(LocalCarrier::new(core)?))
    }
}
