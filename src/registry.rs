//! Carrier registration and selection.
//!
//! A [`CarrierRegistry`] is an ordered list of carrier types. It is built
//! once at process start, owned by whatever manages connections, and passed
//! by reference to the code that opens transports.
//!
//! # Priority
//!
//! Selection scans registrations in the order they were added and takes the
//! first one that is both allowed and usable for the session's endpoint.
//! Registration order is therefore a priority order. The `allowed` list only
//! filters; its own order is not consulted.

use std::sync::Arc;

use crate::{Endpoint, Result, SessionPtr, TransportCore, TransportError, TransportPtr};

/// Builds transports of one carrier type.
pub trait CarrierFactory: Send + Sync {
    /// Whether this carrier can reach `endpoint`.
    fn is_usable(&self, endpoint: &Endpoint) -> bool;

    /// Build a transport around `core`.
    ///
    /// Only called after [`is_usable`](CarrierFactory::is_usable) returned
    /// true for `core.endpoint()`.
    fn create(&self, core: Arc<TransportCore>) -> Result<TransportPtr>;
}

struct CarrierRegistration {
    type_name: Arc<str>,
    factory: Arc<dyn CarrierFactory>,
}

/// Ordered set of available carriers.
#[derive(Default)]
pub struct CarrierRegistry {
    registrations: Vec<CarrierRegistration>,
}

impl CarrierRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in carriers, in priority order:
    /// `long-polling` (when the `transport_http` feature is on) then
    /// `in-process`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::HttpClient`] if the HTTP client cannot be
    /// built from `http`.
    #[cfg_attr(not(feature = "transport_http"), allow(unused_variables))]
    pub fn with_defaults(http: &crate::HttpConfig) -> Result<Self> {
        // ---
        let mut registry = Self::new();

        #[cfg(feature = "transport_http")]
        registry.register(crate::LONG_POLLING, crate::HttpCarrierFactory::new(http)?);

        registry.register(crate::IN_PROCESS, crate::LocalCarrierFactory);

        Ok(registry)
    }

    /// Append a carrier type. Transports it creates report `type_name` as
    /// their connection type.
    pub fn register(
        &mut self,
        type_name: impl Into<Arc<str>>,
        factory: impl CarrierFactory + 'static,
    ) {
        // ---
        let type_name = type_name.into();
        crate::log_debug!("registered {type_name} carrier");

        self.registrations.push(CarrierRegistration {
            type_name,
            factory: Arc::new(factory),
        });
    }

    /// Every registered type name, in registration order.
    pub fn supported_types(&self) -> Vec<&str> {
        self.registrations
            .iter()
            .map(|r| r.type_name.as_ref())
            .collect()
    }

    /// Whether `type_name` has been registered.
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.registrations
            .iter()
            .any(|r| r.type_name.as_ref() == type_name)
    }

    /// Build a transport for `session` using any registered carrier.
    ///
    /// Same as [`select_from`](Self::select_from) with every supported type
    /// allowed.
    pub fn select(&self, session: SessionPtr) -> Result<TransportPtr> {
        self.pick(session, |_| true)
    }

    /// Build a transport for `session` from the first registration whose
    /// type is in `allowed` and which can reach the session's endpoint.
    ///
    /// A registration whose factory reports the endpoint usable but then
    /// fails to create a transport is skipped in favour of the next one.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NoUsableTransport`] if no registration
    /// qualifies, or the first creation error if every qualifying
    /// registration failed to create a transport.
    pub fn select_from<S: AsRef<str>>(
        &self,
        session: SessionPtr,
        allowed: &[S],
    ) -> Result<TransportPtr> {
        self.pick(session, |type_name| {
            allowed.iter().any(|a| a.as_ref() == type_name)
        })
    }

    fn pick(&self, session: SessionPtr, allowed: impl Fn(&str) -> bool) -> Result<TransportPtr> {
        // ---
        let endpoint = session.endpoint();
        let mut first_failure = None;

        let candidates = self
            .registrations
            .iter()
            .filter(|r| allowed(r.type_name.as_ref()) && r.factory.is_usable(&endpoint));

        for registration in candidates {
            let core = TransportCore::new(registration.type_name.clone(), session.clone());
            match registration.factory.create(core) {
                Ok(transport) => return Ok(transport),
                Err(err) => {
                    crate::log_warn!(
                        "{} carrier could not be created for {endpoint}: {err}",
                        registration.type_name
                    );
                    first_failure.get_or_insert(err);
                }
            }
        }

        Err(first_failure
            .unwrap_or_else(|| TransportError::NoUsableTransport(endpoint.to_string())))
    }
}
