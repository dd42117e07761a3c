//! Transport builder for opening a transport from a registry.
//!
//! Provides a fluent builder API over [`CarrierRegistry`] selection, with
//! validation of the connection types a caller names.

use crate::{CarrierRegistry, Result, SessionPtr, TransportError, TransportPtr};

/// Builder for opening a transport.
///
/// # Examples
///
/// ## Any usable carrier
/// ```no_run
/// use bayeux_transport::{CarrierRegistry, HttpConfig, SessionPtr, TransportBuilder};
///
/// # fn example(session: SessionPtr) -> bayeux_transport::Result<()> {
/// let registry = CarrierRegistry::with_defaults(&HttpConfig::default())?;
///
/// let transport = TransportBuilder::new(&registry)
///     .session(session)
///     .build()?;
/// # Ok(())
/// # }
/// ```
///
/// ## Restricted to the types the server advertised
/// ```no_run
/// use bayeux_transport::{CarrierRegistry, HttpConfig, SessionPtr, TransportBuilder};
///
/// # fn example(session: SessionPtr) -> bayeux_transport::Result<()> {
/// let registry = CarrierRegistry::with_defaults(&HttpConfig::default())?;
///
/// let transport = TransportBuilder::new(&registry)
///     .session(session)
///     .allowed_types(["long-polling", "callback-polling"])
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct TransportBuilder<'a> {
    registry: &'a CarrierRegistry,
    session: Option<SessionPtr>,
    allowed_types: Option<Vec<String>>,
    connection_type: Option<String>,
}

impl<'a> TransportBuilder<'a> {
    /// Create a builder selecting from `registry`.
    pub fn new(registry: &'a CarrierRegistry) -> Self {
        Self {
            registry,
            session: None,
            allowed_types: None,
            connection_type: None,
        }
    }

    /// Set the session the transport serves (required).
    pub fn session(mut self, session: SessionPtr) -> Self {
        self.session = Some(session);
        self
    }

    /// Only consider these connection types.
    ///
    /// Names the registry does not know are ignored, so a server's advertised
    /// list can be passed through unfiltered. Registration order still
    /// decides priority.
    ///
    /// Cannot be used together with `connection_type()`.
    pub fn allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Force a single connection type.
    ///
    /// Unlike `allowed_types()`, the name must be registered.
    ///
    /// Cannot be used together with `allowed_types()`.
    pub fn connection_type(mut self, type_name: impl Into<String>) -> Self {
        self.connection_type = Some(type_name.into());
        self
    }

    /// Select a carrier and build the transport (consumes self).
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No session was set
    /// - Both `allowed_types()` and `connection_type()` were used
    /// - `connection_type()` names an unregistered type
    /// - No allowed carrier is usable for the session's endpoint
    pub fn build(self) -> Result<TransportPtr> {
        // ---
        let session = self
            .session
            .ok_or_else(|| TransportError::MissingConfig("session".into()))?;

        match (self.allowed_types, self.connection_type) {
            (Some(_), Some(_)) => Err(TransportError::ConfigConflict(
                "Cannot use both allowed_types and connection_type".into(),
            )),
            (None, Some(type_name)) => {
                if !self.registry.is_registered(&type_name) {
                    return Err(TransportError::UnknownConnectionType(format!(
                        "{type_name}, registered types: {}",
                        self.registry.supported_types().join(", ")
                    )));
                }
                self.registry.select_from(session, &[type_name])
            }
            (Some(allowed), None) => self.registry.select_from(session, &allowed),
            (None, None) => self.registry.select(session),
        }
    }
}
