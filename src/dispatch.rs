//! Dispatcher: demultiplexes decoded frames into their sinks.
//!
//! Correlated responses go to the [`Correlator`]; per-service market-data
//! frames are decoded into their typed record and handed to the handler
//! registered for that service, one invocation per element, with a
//! "no handler" error routed to the error sink when none is registered;
//! admin notifications split into heartbeats (delivered to a pong handler)
//! and server messages (delivered to an error/info handler), the latter
//! also closing the session when the code is a terminal protocol stop.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::connection::Connection;
use crate::correlator::Correlator;
use crate::model::{DataFrame, Notification, Service, StreamEnvelope};
use crate::payloads::{ChartEquity, ChartFuture, Equity, Future, FutureOption, OptionQuote};

/// A callback invoked for every heartbeat notification.
pub type PongHandler = Arc<dyn Fn(chrono::DateTime<chrono::Utc>) + Send + Sync>;

/// A callback invoked for every non-heartbeat admin notification.
pub type ServerMessageHandler = Arc<dyn Fn(Notification) + Send + Sync>;

/// A callback invoked once per decoded record of a given service's typed
/// market-data payload.
pub type DataHandler<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Emitted to the error sink when a `DataFrame` can't be routed: no handler
/// is registered for its service, or its content failed to decode.
#[derive(Debug, Clone)]
pub struct DispatchError {
    pub service: Service,
    pub message: String,
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.service, self.message)
    }
}

/// A callback invoked for every [`DispatchError`].
pub type ErrorHandler = Arc<dyn Fn(DispatchError) + Send + Sync>;

/// Drains decoded [`StreamEnvelope`]s and routes their contents.
pub struct Dispatcher {
    correlator: Arc<Correlator>,
    connection: Option<Arc<Connection>>,
    pong_handler: Option<PongHandler>,
    server_message_handler: Option<ServerMessageHandler>,
    error_handler: Option<ErrorHandler>,
    equity_handler: Option<DataHandler<Equity>>,
    option_handler: Option<DataHandler<OptionQuote>>,
    future_handler: Option<DataHandler<Future>>,
    future_option_handler: Option<DataHandler<FutureOption>>,
    chart_equity_handler: Option<DataHandler<ChartEquity>>,
    chart_future_handler: Option<DataHandler<ChartFuture>>,
}

impl Dispatcher {
    pub fn new(correlator: Arc<Correlator>) -> Self {
        Self {
            correlator,
            connection: None,
            pong_handler: None,
            server_message_handler: None,
            error_handler: None,
            equity_handler: None,
            option_handler: None,
            future_handler: None,
            future_option_handler: None,
            chart_equity_handler: None,
            chart_future_handler: None,
        }
    }

    /// Give the dispatcher a handle back to the connection it's draining, so
    /// a terminal protocol stop code can close the session.
    pub fn with_connection(mut self, connection: Arc<Connection>) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn with_pong_handler(mut self, handler: PongHandler) -> Self {
        self.pong_handler = Some(handler);
        self
    }

    pub fn with_server_message_handler(mut self, handler: ServerMessageHandler) -> Self {
        self.server_message_handler = Some(handler);
        self
    }

    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    pub fn with_equity_handler(mut self, handler: DataHandler<Equity>) -> Self {
        self.equity_handler = Some(handler);
        self
    }

    pub fn with_option_handler(mut self, handler: DataHandler<OptionQuote>) -> Self {
        self.option_handler = Some(handler);
        self
    }

    pub fn with_future_handler(mut self, handler: DataHandler<Future>) -> Self {
        self.future_handler = Some(handler);
        self
    }

    pub fn with_future_option_handler(mut self, handler: DataHandler<FutureOption>) -> Self {
        self.future_option_handler = Some(handler);
        self
    }

    pub fn with_chart_equity_handler(mut self, handler: DataHandler<ChartEquity>) -> Self {
        self.chart_equity_handler = Some(handler);
        self
    }

    pub fn with_chart_future_handler(mut self, handler: DataHandler<ChartFuture>) -> Self {
        self.chart_future_handler = Some(handler);
        self
    }

    /// Drive the dispatch loop until the channel closes or cancellation
    /// fires.
    pub async fn run(self, mut envelopes: mpsc::Receiver<StreamEnvelope>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::debug!("dispatcher cancelled");
                    break;
                }
                envelope = envelopes.recv() => {
                    match envelope {
                        Some(envelope) => self.dispatch(envelope).await,
                        None => break,
                    }
                }
            }
        }
    }

    async fn dispatch(&self, envelope: StreamEnvelope) {
        if !envelope.api_responses.is_empty() {
            self.correlator.publish(envelope.api_responses).await;
        }

        for frame in envelope.data {
            self.dispatch_data_frame(frame);
        }

        for notification in envelope.notify {
            match &notification {
                Notification::Heartbeat { server_timestamp } => {
                    if let Some(handler) = &self.pong_handler {
                        handler(*server_timestamp);
                    }
                }
                Notification::ServerMessage { code, .. } => {
                    if code.is_terminal_stop() {
                        if let Some(connection) = &self.connection {
                            tracing::info!(%code, "terminal protocol stop; closing session");
                            connection.close_for_protocol();
                        }
                    }
                    if let Some(handler) = &self.server_message_handler {
                        handler(notification.clone());
                    }
                }
            }
        }
    }

    /// Decode one service-tagged frame into a sequence of its typed record
    /// and invoke the registered handler once per element. Routes to the
    /// error sink when no handler is registered for the frame's service, or
    /// when its content fails to decode as a sequence of records.
    fn dispatch_data_frame(&self, frame: DataFrame) {
        let service = frame.service;
        let result = match service {
            Service::LevelOneEquities => {
                Self::decode_and_invoke(&frame.content, &self.equity_handler, Equity::decode)
            }
            Service::LevelOneOptions => {
                Self::decode_and_invoke(&frame.content, &self.option_handler, OptionQuote::decode)
            }
            Service::LevelOneFutures => {
                Self::decode_and_invoke(&frame.content, &self.future_handler, Future::decode)
            }
            Service::LevelOneFuturesOptions => Self::decode_and_invoke(
                &frame.content,
                &self.future_option_handler,
                FutureOption::decode,
            ),
            Service::ChartEquity => {
                Self::decode_and_invoke(&frame.content, &self.chart_equity_handler, ChartEquity::decode)
            }
            Service::ChartFutures => {
                Self::decode_and_invoke(&frame.content, &self.chart_future_handler, ChartFuture::decode)
            }
            _ => Err(format!("no typed decoder is implemented for service {service}")),
        };

        if let Err(message) = result {
            self.emit_error(DispatchError { service, message });
        }
    }

    fn decode_and_invoke<T>(
        content: &Value,
        handler: &Option<DataHandler<T>>,
        decode: fn(&Value) -> crate::error::Result<T>,
    ) -> std::result::Result<(), String> {
        let Some(handler) = handler else {
            return Err("no handler registered for this service".to_string());
        };
        let elements = content
            .as_array()
            .ok_or_else(|| "content is not an array of records".to_string())?;

        for element in elements {
            match decode(element) {
                Ok(record) => handler(record),
                Err(err) => tracing::warn!(%err, "dropping undecodable data record"),
            }
        }
        Ok(())
    }

    fn emit_error(&self, error: DispatchError) {
        tracing::warn!(%error, "dispatch error");
        if let Some(handler) = &self.error_handler {
            handler(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Command, RequestID, WsRespCode};
    use chrono::Utc;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[tokio::test]
    async fn routes_api_responses_to_the_correlator() {
        let correlator = Arc::new(Correlator::new());
        let (id, rx, _deadline) = correlator.new_pending(std::time::Duration::from_secs(5)).await;

        let dispatcher = Dispatcher::new(correlator.clone());
        let envelope = StreamEnvelope {
            api_responses: vec![crate::model::ApiResponse {
                service: Service::Admin,
                command: Command::Login,
                request_id: id,
                correlation_id: "c".to_string(),
                timestamp: Utc::now(),
                content: json!({"code": 0, "msg": "ok"}),
            }],
            data: vec![],
            notify: vec![],
        };

        dispatcher.dispatch(envelope).await;
        let delivered = rx.await.unwrap();
        assert_eq!(delivered.request_id, RequestID(0));
    }

    #[tokio::test]
    async fn routes_decoded_equity_records_to_the_registered_handler() {
        let correlator = Arc::new(Correlator::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let dispatcher = Dispatcher::new(correlator).with_equity_handler(Arc::new(move |quote: Equity| {
            seen_clone.lock().unwrap().push(quote.symbol);
        }));

        let envelope = StreamEnvelope {
            api_responses: vec![],
            data: vec![DataFrame {
                service: Service::LevelOneEquities,
                command: Command::Subs,
                timestamp: Utc::now(),
                content: json!([{"key": "AAPL", "1": 189.9, "2": 190.1}]),
            }],
            notify: vec![],
        };
        dispatcher.dispatch(envelope).await;

        assert_eq!(*seen.lock().unwrap(), vec!["AAPL".to_string()]);
    }

    #[tokio::test]
    async fn unregistered_service_reaches_the_error_sink() {
        let correlator = Arc::new(Correlator::new());
        let errors = Arc::new(Mutex::new(Vec::new()));
        let errors_clone = errors.clone();
        let dispatcher = Dispatcher::new(correlator)
            .with_error_handler(Arc::new(move |err: DispatchError| errors_clone.lock().unwrap().push(err)));

        let envelope = StreamEnvelope {
            api_responses: vec![],
            data: vec![DataFrame {
                service: Service::LevelOneEquities,
                command: Command::Subs,
                timestamp: Utc::now(),
                content: json!([{"key": "AAPL"}]),
            }],
            notify: vec![],
        };
        dispatcher.dispatch(envelope).await;

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].service, Service::LevelOneEquities);
    }

    #[tokio::test]
    async fn heartbeats_and_server_messages_reach_distinct_handlers() {
        let pong_count = Arc::new(AtomicUsize::new(0));
        let error_count = Arc::new(AtomicUsize::new(0));

        let pong_count_clone = pong_count.clone();
        let error_count_clone = error_count.clone();
        let correlator = Arc::new(Correlator::new());
        let dispatcher = Dispatcher::new(correlator)
            .with_pong_handler(Arc::new(move |_ts| {
                pong_count_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .with_server_message_handler(Arc::new(move |_n| {
                error_count_clone.fetch_add(1, Ordering::SeqCst);
            }));

        let envelope = StreamEnvelope {
            api_responses: vec![],
            data: vec![],
            notify: vec![
                Notification::Heartbeat {
                    server_timestamp: Utc::now(),
                },
                Notification::ServerMessage {
                    service: Some(Service::Admin),
                    timestamp: Some(Utc::now()),
                    code: WsRespCode::ReachedSymbolLimit,
                    message: "too many symbols".to_string(),
                },
            ],
        };
        dispatcher.dispatch(envelope).await;

        assert_eq!(pong_count.load(Ordering::SeqCst), 1);
        assert_eq!(error_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_streaming_notification_without_a_connection_handle_is_a_no_op() {
        // Dialing a real socket isn't available in a unit test, so the
        // actual `close_for_protocol` call is covered end-to-end by
        // tests/live.rs; this just guards against a panic when no
        // connection handle was wired in (`with_connection` was never
        // called, which `StreamClientBuilder` always does in practice).
        let correlator = Arc::new(Correlator::new());
        let dispatcher = Dispatcher::new(correlator);
        let envelope = StreamEnvelope {
            api_responses: vec![],
            data: vec![],
            notify: vec![Notification::ServerMessage {
                service: Some(Service::Admin),
                timestamp: Some(Utc::now()),
                code: WsRespCode::StopStreaming,
                message: "Stop streaming due to empty subscription".to_string(),
            }],
        };
        dispatcher.dispatch(envelope).await;
    }
}
