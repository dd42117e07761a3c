// src/transport/http/transport.rs

//! HTTP long-polling carrier implementation.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
use url::Url;

use crate::retry::retry_with_backoff;
use crate::transport::TaskList;
use crate::{
    // ---
    CarrierFactory,
    Endpoint,
    HttpConfig,
    Payload,
    Result,
    Transport,
    TransportCore,
    TransportError,
    TransportPtr,
};

/// Long-polling carrier: JSON over HTTP `POST`.
pub struct HttpCarrier {
    // ---
    core: Arc<TransportCore>,
    client: reqwest::Client,
    url: Url,
    host: String,
    exchanges: TaskList,
}

/// One request and all of its retries.
struct Exchange {
    core: Arc<TransportCore>,
    client: reqwest::Client,
    url: Url,
    host: String,
    body: Bytes,
}

/// `Host` header value for `url`: the host, plus the port when one is given
/// explicitly.
fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// The endpoint as a parsed URL, if it is one.
fn parse_url(endpoint: &Endpoint) -> Option<Url> {
    Url::parse(endpoint.as_url()?).ok()
}

/// A URL this carrier can actually post to.
fn web_url(url: Url) -> Option<Url> {
    let web = matches!(url.scheme(), "http" | "https");
    (web && url.host_str().is_some()).then_some(url)
}

impl HttpCarrier {
    /// Create a carrier posting to the URL named by `core.endpoint()`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidEndpoint`] unless the endpoint is an
    /// `http` or `https` URL with a host.
    pub fn new(core: Arc<TransportCore>, client: reqwest::Client) -> Result<Self> {
        // ---
        let invalid = || TransportError::InvalidEndpoint(core.endpoint().to_string());

        let raw = core.endpoint().as_url().ok_or_else(invalid)?;
        let url = web_url(Url::parse(raw)?).ok_or_else(invalid)?;
        let host = host_header(&url)
            .ok_or_else(|| TransportError::InvalidEndpoint(url.to_string()))?;

        Ok(Self {
            core,
            client,
            url,
            host,
            exchanges: TaskList::new(),
        })
    }
}

#[async_trait::async_trait]
impl Transport for HttpCarrier {
    // ---

    fn core(&self) -> &Arc<TransportCore> {
        &self.core
    }

    /// Encode the payload and start posting it in the background.
    ///
    /// Returns as soon as the exchange is scheduled. Only an encoding failure
    /// or a closed carrier is reported here.
    ///
    /// # Panics
    ///
    /// Resumes the panic of an earlier exchange whose `receive` panicked.
    async fn request(&self, payload: Payload) -> Result<()> {
        // ---
        let body = Bytes::from(serde_json::to_vec(&payload)?);
        let timeout = self.core.session().configured_timeout();

        let exchange = Exchange {
            core: self.core.clone(),
            client: self.client.clone(),
            url: self.url.clone(),
            host: self.host.clone(),
            body,
        };

        if !self.exchanges.spawn(exchange.run(timeout)) {
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    fn close(&self) {
        // ---
        self.core.close();
        self.exchanges.close();
    }
}

impl Drop for HttpCarrier {
    fn drop(&mut self) {
        self.core.close();
        self.exchanges.shutdown();
    }
}

impl Exchange {
    /// Post until a response arrives, then hand it to the core.
    async fn run(self, timeout: Duration) {
        // ---
        let outcome = retry_with_backoff(timeout, |_| self.post()).await;

        match outcome {
            Ok(payload) => self.core.receive(payload).await,
            Err(err) => {
                crate::log_error!("request to {} abandoned: {err}", self.url);
                self.core.session().handle_error(err);
            }
        }
    }

    /// A single attempt.
    async fn post(&self) -> Result<Payload> {
        // ---
        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(HOST, self.host.as_str())
            .header(CONTENT_LENGTH, self.body.len().to_string())
            .body(self.body.clone())
            .send()
            .await?;

        let body = response.bytes().await?;

        serde_json::from_slice(&body).map_err(|err| TransportError::Parse(err.to_string()))
    }
}

/// Factory registered under [`LONG_POLLING`](crate::LONG_POLLING).
///
/// Every transport it creates shares one `reqwest` client and so one
/// connection pool.
#[derive(Clone)]
pub struct HttpCarrierFactory {
    client: reqwest::Client,
}

impl HttpCarrierFactory {
    /// Build the shared client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::HttpClient`] if `reqwest` rejects the
    /// configuration.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        // ---
        let mut builder = reqwest::Client::builder();

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        if let Some(idle) = config.pool_idle_timeout {
            builder = builder.pool_idle_timeout(idle);
        }
        if let Some(max_idle) = config.pool_max_idle_per_host {
            builder = builder.pool_max_idle_per_host(max_idle);
        }

        let client = builder
            .build()
            .map_err(|err| TransportError::HttpClient(err.to_string()))?;

        Ok(Self { client })
    }

    /// Use an existing client. It must not have a request timeout set.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl CarrierFactory for HttpCarrierFactory {
    /// Usable for any endpoint given as a URL. Creation still fails for
    /// schemes other than `http` and `https`.
    fn is_usable(&self, endpoint: &Endpoint) -> bool {
        parse_url(endpoint).is_some()
    }

    fn create(&self, core: Arc<TransportCore>) -> Result<TransportPtr> {
        Ok(Arc::new(HttpCarrier::new(core, self.client.clone())?))
    }
}
