// Named-channel event dispatch

use crate::config::BusConfig;
use crate::device::DeviceKind;
use crate::event::{decode, BusMessage, DecodeError, PowerUpdateEvent};
use crate::state::SyncMetrics;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};


/// Channel handler; runs to completion before the next message is dispatched
pub type Handler = Arc<dyn Fn(&PowerUpdateEvent) + Send + Sync>;

/// Subscription errors
#[derive(Debug, Clone, PartialEq)]
pub enum BusError {
    /// Channel is not mapped to a device type in the bus config
    UnknownChannel(String),
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::UnknownChannel(c) => write!(f, "unknown channel '{}'", c),
        }
    }
}

impl std::error::Error for BusError {}

/// Event bus delivering push events to channel subscribers in order
pub struct EventBus {
    /// Channel name -> device type its params patch
    channels: HashMap<String, DeviceKind>,

    handlers: RwLock<HashMap<String, Vec<Handler>>>,

    metrics: SyncMetrics,
}

impl EventBus {
    pub fn new(config: &BusConfig, metrics: SyncMetrics) -> Self {
        let channels = HashMap::from([
            (config.power_channel.clone(), DeviceKind::InstantPower),
            (config.consumption_channel.clone(), DeviceKind::PowerConsumption),
        ]);

        Self {
            channels,
            handlers: RwLock::new(HashMap::new()),
            metrics,
        }
    }

    /// Device type patched by messages on `channel`
    pub fn channel_kind(&self, channel: &str) -> Option<DeviceKind> {
        self.channels.get(channel).copied()
    }

    /// Register a handler for a channel.
    ///
    /// Handlers on the same channel run in registration order.
    pub fn subscribe<F>(&self, channel: &str, handler: F) -> Result<(), BusError>
    where
        F: Fn(&PowerUpdateEvent) + Send + Sync + 'static,
    {
        if !self.channels.contains_key(channel) {
            return Err(BusError::UnknownChannel(channel.to_string()));
        }

        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(channel.to_string())
            .or_default()
            .push(Arc::new(handler));

        info!(channel = %channel, "Subscribed to channel");
        Ok(())
    }

    /// Decode a message and run the channel's handlers synchronously.
    ///
    /// Messages on channels the bus does not know are ignored. Returns the
    /// number of handlers invoked.
    pub fn publish(&self, message: &BusMessage) -> Result<usize, DecodeError> {
        let kind = match self.channel_kind(&message.event) {
            Some(kind) => kind,
            None => {
                debug!(channel = %message.event, "Ignoring message on unhandled channel");
                return Ok(0);
            }
        };

        let event = decode(message, kind).inspect_err(|_| self.metrics.record_rejected())?;

        // Handlers run without the lock held so they may subscribe
        let subscribers: Vec<Handler> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&message.event)
            .cloned()
            .unwrap_or_default();

        for handler in &subscribers {
            handler(&event);
        }
        Ok(subscribers.len())
    }

    /// Dispatch queued messages one at a time until every sender is dropped.
    ///
    /// Returns the number of messages received.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<BusMessage>) -> u64 {
        info!("Event bus running");
        let mut received = 0u64;

        while let Some(message) = rx.recv().await {
            received += 1;
            if let Err(e) = self.publish(&message) {
                warn!(
                    channel = %message.event,
                    device_id = ?message.device_id,
                    error = %e,
                    "Rejected malformed event"
                );
            }
        }

        warn!(received = received, "Event bus queue closed");
        received
    }
}
