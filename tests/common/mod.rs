// tests/common/mod.rs

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use bayeux_transport::{
    //
    Advice,
    Endpoint,
    Message,
    Session,
    TransportError,
};

/// Something the transport told the session.
#[derive(Debug)]
pub enum SessionEvent {
    Delivered(Vec<Message>),
    Advice(Advice),
    Error(TransportError),
}

/// Session double that records every call and forwards it on a channel.
pub struct MockSession {
    endpoint: Endpoint,
    timeout: Duration,
    /// Per-channel delay applied in the incoming pipeline.
    delays: HashMap<String, Duration>,
    /// Channels the incoming pipeline drops.
    drops: HashSet<String>,
    events: mpsc::UnboundedSender<SessionEvent>,
    pub deliveries: Mutex<Vec<Vec<Message>>>,
    pub advice: Mutex<Vec<Advice>>,
}

impl MockSession {
    pub fn new(endpoint: Endpoint) -> (Arc<Self>, mpsc::UnboundedReceiver<SessionEvent>) {
        MockSessionBuilder::new(endpoint).build()
    }

    pub fn builder(endpoint: Endpoint) -> MockSessionBuilder {
        MockSessionBuilder::new(endpoint)
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    pub fn advice_count(&self) -> usize {
        self.advice.lock().unwrap().len()
    }
}

pub struct MockSessionBuilder {
    endpoint: Endpoint,
    timeout: Duration,
    delays: HashMap<String, Duration>,
    drops: HashSet<String>,
}

impl MockSessionBuilder {
    fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            timeout: Duration::from_millis(50),
            delays: HashMap::new(),
            drops: HashSet::new(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn delay(mut self, channel: &str, delay: Duration) -> Self {
        self.delays.insert(channel.to_string(), delay);
        self
    }

    pub fn drop_channel(mut self, channel: &str) -> Self {
        self.drops.insert(channel.to_string());
        self
    }

    pub fn build(self) -> (Arc<MockSession>, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = MockSession {
            endpoint: self.endpoint,
            timeout: self.timeout,
            delays: self.delays,
            drops: self.drops,
            events: tx,
            deliveries: Mutex::new(Vec::new()),
            advice: Mutex::new(Vec::new()),
        };
        (Arc::new(session), rx)
    }
}

#[async_trait::async_trait]
impl Session for MockSession {
    fn client_id(&self) -> String {
        "mock-client".into()
    }

    fn endpoint(&self) -> Endpoint {
        self.endpoint.clone()
    }

    fn configured_timeout(&self) -> Duration {
        self.timeout
    }

    async fn pipe_incoming(&self, message: Message) -> Option<Message> {
        let channel = message.channel.clone().unwrap_or_default();
        if let Some(delay) = self.delays.get(&channel) {
            tokio::time::sleep(*delay).await;
        }
        if self.drops.contains(&channel) {
            return None;
        }
        Some(message)
    }

    fn deliver_messages(&self, messages: Vec<Message>) {
        self.deliveries.lock().unwrap().push(messages.clone());
        let _ = self.events.send(SessionEvent::Delivered(messages));
    }

    fn handle_advice(&self, advice: Advice) {
        self.advice.lock().unwrap().push(advice.clone());
        let _ = self.events.send(SessionEvent::Advice(advice));
    }

    fn handle_error(&self, error: TransportError) {
        let _ = self.events.send(SessionEvent::Error(error));
    }
}

/// Wait for the next session event, failing the test after two seconds.
pub async fn next_event(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("session event channel closed")
}

#[cfg(feature = "logging")]
mod imp {
    use std::sync::Once;

    static INIT: Once = Once::new();

    pub fn init() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        });
    }
}

#[cfg(not(feature = "logging"))]
mod imp {
    #[inline]
    pub fn init() {}
}

pub fn init_logging() {
    imp::init();
}
