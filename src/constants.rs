//! Constants for the streaming client.
//!
//! Timeouts, ping cadence, and queue capacities used internally by the
//! connection supervisor, correlator, and dispatcher. Exported for advanced
//! callers who build their own [`crate::config::StreamConfig`].

use std::time::Duration;

/// Default per-request deadline enforced by the correlator when a caller
/// does not override it.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default interval between application-level ping frames.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(3);

/// Capacity of the bounded handoff queue between the socket reader and the
/// deserializer/dispatcher stage, keeping the read syscall hot.
pub const RAW_FRAME_QUEUE_CAPACITY: usize = 10;

/// Server response code meaning the `LOGIN` request was denied.
pub const CLOSE_STATUS_LOGIN_DENIED: u16 = 3;

/// Server response code meaning the account already holds the maximum
/// number of streaming connections.
pub const CLOSE_STATUS_MAX_CONNECTIONS: u16 = 12;

/// Server close-status meaning "stop streaming due to empty subscription" —
/// treated as a normal server-initiated close, not a transport error.
pub const CLOSE_STATUS_STOP_STREAMING: u16 = 30;

/// Default delay before redialing after an unexpected disconnect when
/// auto-reconnect is enabled.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);
