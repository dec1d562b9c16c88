//! Error types for the streaming client.
//!
//! All fallible operations in this crate return [`Result<T>`], which is an
//! alias for `std::result::Result<T, StreamError>`.
//!
//! [`StreamError`] covers the taxonomy the core distinguishes:
//! - **Precondition** — invalid caller arguments; never reaches the wire.
//! - **Codec** — malformed outbound parameters or inbound JSON.
//! - **Transport** — socket read/write failure; tears the session down.
//! - **Protocol** — a non-zero server response code.
//! - **Timeout** — a per-request deadline elapsed.
//! - **Lifecycle** — cancellation of the connection or a caller's context.

use std::fmt;

use crate::model::WsRespCode;

/// The general `{code, msg}` acknowledgement body the broker attaches to
/// every command response and admin notification.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, PartialEq, Eq)]
pub struct WsResp {
    /// Response code; 0 means success.
    pub code: WsRespCode,
    /// Human-readable message accompanying the code.
    pub msg: String,
}

impl fmt::Display for WsResp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.msg)
    }
}

impl std::error::Error for WsResp {}

/// All possible errors produced by the streaming client.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The caller supplied invalid or incomplete arguments; the command was
    /// never written to the wire.
    #[error("invalid argument: {0}")]
    Precondition(String),

    /// Failed to encode an outbound command or decode an inbound frame.
    #[error("codec error: {0}")]
    Codec(String),

    /// Failed to deserialize a JSON payload.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A WebSocket-level transport error.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// An error building or parsing a URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The server responded with a non-zero [`WsResp`] code.
    #[error("protocol error: {0}")]
    Protocol(#[from] WsResp),

    /// The per-request deadline elapsed before a response arrived.
    #[error("request timed out waiting for a response")]
    Timeout,

    /// The slot was closed without a delivered response (forced eviction).
    #[error("request was evicted; forced timeout")]
    ForcedTimeout,

    /// The connection context was cancelled (session teardown, server close).
    #[error("connection closed")]
    ConnectionClosed,

    /// An identifier (`OptionID`/`FutureID`/`FutureOptionID`) failed to parse.
    #[error("invalid {kind}: {value}")]
    InvalidIdentifier {
        /// Which identifier kind failed to parse.
        kind: &'static str,
        /// The raw string that failed.
        value: String,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StreamError>;
