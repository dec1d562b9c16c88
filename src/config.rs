//! Layered configuration for a streaming session.

use std::time::Duration;

use crate::constants::{
    DEFAULT_PING_INTERVAL, DEFAULT_RECONNECT_DELAY, DEFAULT_REQUEST_TIMEOUT, RAW_FRAME_QUEUE_CAPACITY,
};

/// Tunable knobs for a [`crate::client::StreamingClient`] session.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Interval between application-level ping frames.
    pub ping_interval: Duration,
    /// Default deadline for a correlated request when the caller doesn't
    /// override it.
    pub request_timeout: Duration,
    /// Capacity of the bounded channel handing raw frames from the socket
    /// reader to the dispatcher.
    pub raw_frame_queue_capacity: usize,
    /// Whether the connection supervisor should automatically redial and
    /// re-authenticate after an unexpected transport error. Existing
    /// subscriptions are never replayed — the caller re-issues them.
    pub auto_reconnect: bool,
    /// Delay before redialing when `auto_reconnect` is enabled.
    pub reconnect_delay: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            ping_interval: DEFAULT_PING_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            raw_frame_queue_capacity: RAW_FRAME_QUEUE_CAPACITY,
            auto_reconnect: false,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl StreamConfig {
    pub fn builder() -> StreamConfigBuilder {
        StreamConfigBuilder::default()
    }
}

/// Builder for [`StreamConfig`].
#[derive(Debug, Default)]
pub struct StreamConfigBuilder {
    config: Option<StreamConfig>,
}

impl StreamConfigBuilder {
    fn base(&mut self) -> &mut StreamConfig {
        self.config.get_or_insert_with(StreamConfig::default)
    }

    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.base().ping_interval = interval;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.base().request_timeout = timeout;
        self
    }

    pub fn raw_frame_queue_capacity(mut self, capacity: usize) -> Self {
        self.base().raw_frame_queue_capacity = capacity;
        self
    }

    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.base().auto_reconnect = enabled;
        self
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.base().reconnect_delay = delay;
        self
    }

    pub fn build(mut self) -> StreamConfig {
        self.config.take().unwrap_or_default()
    }
}
