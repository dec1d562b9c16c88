//! Connection supervisor: dial, LOGIN, keepalive, read loop, teardown.
//!
//! Mirrors the lifecycle of the broker's own reference client — dial the
//! socket, exchange the `ADMIN`/`LOGIN` handshake, then run a ping loop and
//! a read loop side by side until the session is torn down. The read loop
//! never blocks on application logic: it decodes each frame and hands the
//! [`StreamEnvelope`] off to a bounded channel the dispatcher drains, so a
//! slow handler can never stall the socket.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

type WsStream = futures_util::stream::SplitStream<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
>;

use crate::auth::StreamerPreferences;
use crate::codec::decode_envelope;
use crate::config::StreamConfig;
use crate::correlator::Correlator;
use crate::error::{Result, StreamError, WsResp};
use crate::model::{Command, ConnectionState, OutboundCommand, Service, StreamEnvelope};

type WsSink = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    Message,
>;

fn state_to_u8(state: ConnectionState) -> u8 {
    match state {
        ConnectionState::Dialed => 0,
        ConnectionState::LoggedIn => 1,
        ConnectionState::TearingDown => 2,
        ConnectionState::Closed => 3,
    }
}

fn u8_to_state(raw: u8) -> ConnectionState {
    match raw {
        0 => ConnectionState::Dialed,
        1 => ConnectionState::LoggedIn,
        2 => ConnectionState::TearingDown,
        _ => ConnectionState::Closed,
    }
}

/// The outcome of a successful `LOGIN` handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub server: String,
    pub is_professional: bool,
}

/// Owns the socket, the per-session request counter's write side, and the
/// task lifecycle for the ping loop and the read loop.
pub struct Connection {
    cancel: CancellationToken,
    state: AtomicU8,
    writer: Arc<Mutex<WsSink>>,
    correlator: Arc<Correlator>,
    customer_id: String,
    correlation_id: String,
    client_channel: String,
    client_function_id: String,
    url: String,
    /// The access token from the last successful `LOGIN`, retained so a
    /// redial after an unexpected disconnect can re-authenticate without
    /// the caller's involvement. Never logged.
    access_token: Mutex<String>,
}

impl Connection {
    /// Dial the streaming endpoint and spawn the ping/read loops. Does not
    /// perform the `LOGIN` handshake — call [`Connection::login`]
    /// afterwards.
    pub async fn dial(
        prefs: &StreamerPreferences,
        config: &StreamConfig,
        correlator: Arc<Correlator>,
    ) -> Result<(Arc<Self>, mpsc::Receiver<StreamEnvelope>)> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(&prefs.streamer_url)
            .await
            .map_err(StreamError::Transport)?;
        let (sink, mut stream) = ws_stream.split();

        let connection = Arc::new(Self {
            cancel: CancellationToken::new(),
            state: AtomicU8::new(state_to_u8(ConnectionState::Dialed)),
            writer: Arc::new(Mutex::new(sink)),
            correlator,
            customer_id: prefs.schwab_client_customer_id.clone(),
            correlation_id: prefs.schwab_client_correl_id.clone(),
            client_channel: prefs.schwab_client_channel.clone(),
            client_function_id: prefs.schwab_client_function_id.clone(),
            url: prefs.streamer_url.clone(),
            access_token: Mutex::new(String::new()),
        });

        let (envelope_tx, envelope_rx) = mpsc::channel(config.raw_frame_queue_capacity);

        let reader_cancel = connection.cancel.clone();
        let reader_connection = connection.clone();
        let auto_reconnect = config.auto_reconnect;
        let reconnect_delay = config.reconnect_delay;
        let request_timeout = config.request_timeout;
        tokio::spawn(async move {
            'session: loop {
                loop {
                    tokio::select! {
                        () = reader_cancel.cancelled() => {
                            tracing::debug!("read loop cancelled");
                            break 'session;
                        }
                        frame = stream.next() => {
                            match frame {
                                Some(Ok(Message::Text(text))) => {
                                    match decode_envelope(&text) {
                                        Ok(envelope) => {
                                            if envelope_tx.send(envelope).await.is_err() {
                                                break 'session;
                                            }
                                        }
                                        Err(err) => tracing::warn!(%err, "dropping malformed frame"),
                                    }
                                }
                                Some(Ok(Message::Close(_))) | None => {
                                    tracing::info!("server closed the stream");
                                    break;
                                }
                                Some(Ok(_)) => {}
                                Some(Err(err)) => {
                                    tracing::warn!(%err, "transport error in read loop");
                                    break;
                                }
                            }
                        }
                    }
                }

                if !auto_reconnect {
                    reader_connection.mark(ConnectionState::Closed);
                    reader_cancel.cancel();
                    break 'session;
                }

                match reader_connection.reconnect(reconnect_delay, &reader_cancel).await {
                    Some(new_stream) => {
                        stream = new_stream;
                        // Re-login happens on its own task: the response can only
                        // arrive once this loop resumes reading the new stream, so
                        // awaiting it here would deadlock the read loop against itself.
                        let relogin_connection = reader_connection.clone();
                        tokio::spawn(async move {
                            relogin_connection.relogin_if_needed(request_timeout).await;
                        });
                    }
                    None => {
                        reader_connection.mark(ConnectionState::Closed);
                        reader_cancel.cancel();
                        break 'session;
                    }
                }
            }
        });

        let ping_cancel = connection.cancel.clone();
        let ping_connection = connection.clone();
        let ping_interval = config.ping_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(ping_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    () = ping_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if ping_connection.send_ping().await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok((connection, envelope_rx))
    }

    fn mark(&self, state: ConnectionState) {
        self.state.store(state_to_u8(state), Ordering::SeqCst);
    }

    pub fn state(&self) -> ConnectionState {
        u8_to_state(self.state.load(Ordering::SeqCst))
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Transition to `Closed` and cancel the session in response to a
    /// terminal protocol code from the server (login denied, max
    /// connections reached, or stop-streaming). Unlike [`Connection::close`]
    /// this never attempts a `LOGOUT` — the server has already ended the
    /// session.
    pub(crate) fn close_for_protocol(&self) {
        self.mark(ConnectionState::Closed);
        self.cancel.cancel();
    }

    async fn send_ping(&self) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer
            .send(Message::Ping(Vec::new().into()))
            .await
            .map_err(StreamError::Transport)
    }

    /// Write an outbound command to the single socket writer.
    pub async fn write_command(&self, command: OutboundCommand) -> Result<()> {
        let text = serde_json::to_string(&json!({ "requests": [command] }))
            .map_err(StreamError::Json)?;
        let mut writer = self.writer.lock().await;
        writer
            .send(Message::Text(text.into()))
            .await
            .map_err(StreamError::Transport)
    }

    /// Allocate a correlated request, write it, and await the response.
    pub async fn request(
        &self,
        service: Service,
        command: Command,
        parameters: serde_json::Value,
        timeout: Duration,
    ) -> Result<crate::model::ApiResponse> {
        let (request_id, rx, deadline) = self.correlator.new_pending(timeout).await;

        let outbound = OutboundCommand {
            request_id,
            service,
            command,
            customer_id: self.customer_id.clone(),
            correlation_id: self.correlation_id.clone(),
            parameters,
        };
        self.write_command(outbound).await?;
        self.correlator.await_response(rx, deadline, &self.cancel).await
    }

    /// Perform the `ADMIN`/`LOGIN` handshake. The token is retained so a
    /// redial triggered by auto-reconnect can re-authenticate on its own.
    pub async fn login(&self, access_token: String, timeout: Duration) -> Result<LoginResponse> {
        let params = json!({
            "Authorization": access_token.clone(),
            "SchwabClientChannel": self.client_channel,
            "SchwabClientFunctionId": self.client_function_id,
        });
        *self.access_token.lock().await = access_token;
        let response = self
            .request(Service::Admin, Command::Login, params, timeout)
            .await?;

        let ack: WsResp = serde_json::from_value(response.content).map_err(StreamError::Json)?;
        if !ack.code.is_success() {
            return Err(StreamError::Protocol(ack));
        }

        let parts: Vec<&str> = ack.msg.split(';').collect();
        if parts.len() != 2 {
            return Err(StreamError::Codec(format!(
                "expected \"server=...;status=...\" in login message, got {:?}",
                ack.msg
            )));
        }
        let server = after_equals(parts[0]);
        let status = after_equals(parts[1]).to_ascii_uppercase();
        let is_professional = match status.as_str() {
            "PP" => true,
            "NP" => false,
            other => {
                return Err(StreamError::Codec(format!("unknown connection tier {other}")));
            }
        };

        self.mark(ConnectionState::LoggedIn);
        Ok(LoginResponse {
            server,
            is_professional,
        })
    }

    /// Redial after an unexpected disconnect and swap in the new writer
    /// half. Retries on a fixed delay until it succeeds or `cancel` fires.
    /// Never replays subscriptions — the caller re-issues those.
    async fn reconnect(&self, delay: Duration, cancel: &CancellationToken) -> Option<WsStream> {
        loop {
            tokio::select! {
                () = cancel.cancelled() => return None,
                () = tokio::time::sleep(delay) => {}
            }

            tracing::info!(url = %self.url, "attempting reconnect");
            match tokio_tungstenite::connect_async(&self.url).await {
                Ok((ws_stream, _response)) => {
                    let (sink, stream) = ws_stream.split();
                    *self.writer.lock().await = sink;
                    tracing::info!("reconnected");
                    return Some(stream);
                }
                Err(err) => {
                    tracing::warn!(%err, "reconnect attempt failed");
                }
            }
        }
    }

    /// Re-authenticate with the last successful `LOGIN`'s access token,
    /// if one was ever set. A no-op on the very first connect, where no
    /// token has been recorded yet.
    async fn relogin_if_needed(&self, timeout: Duration) {
        let token = self.access_token.lock().await.clone();
        if token.is_empty() {
            return;
        }
        if let Err(err) = self.login(token, timeout).await {
            tracing::warn!(%err, "re-authentication after reconnect failed");
        }
    }

    /// Attempt a graceful `LOGOUT`, then close the socket unconditionally.
    pub async fn close(&self, config: &StreamConfig) -> Result<()> {
        self.mark(ConnectionState::TearingDown);
        let logout = self
            .request(Service::Admin, Command::Logout, json!({}), config.request_timeout)
            .await;

        if let Err(err) = logout {
            tracing::warn!(%err, "logout failed; closing socket anyway");
        }

        let close_result = {
            let mut writer = self.writer.lock().await;
            writer.close().await
        };
        self.cancel.cancel();
        self.mark(ConnectionState::Closed);
        close_result.map_err(StreamError::Transport)
    }
}

fn after_equals(s: &str) -> String {
    s.split_once('=').map(|(_, v)| v.to_string()).unwrap_or_default()
}
