//! Top-level façade wiring the correlator, connection supervisor, and
//! dispatcher into a single handle, the way the teacher's `DhanFeedManager`
//! composes its per-connection workers behind one builder-configured
//! entry point.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::auth::CredentialsProvider;
use crate::commands::CommandFacade;
use crate::config::StreamConfig;
use crate::connection::{Connection, LoginResponse};
use crate::correlator::Correlator;
use crate::dispatch::{DataHandler, Dispatcher, ErrorHandler, PongHandler, ServerMessageHandler};
use crate::error::Result;
use crate::model::ConnectionState;
use crate::payloads::{ChartEquity, ChartFuture, Equity, Future, FutureOption, OptionQuote};

/// A live streaming session: a dialed, authenticated connection plus the
/// dispatcher draining it.
pub struct StreamingClient {
    connection: Arc<Connection>,
    dispatcher_handle: tokio::task::JoinHandle<()>,
    config: StreamConfig,
}

impl StreamingClient {
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn commands(&self) -> CommandFacade<'_> {
        CommandFacade::new(&self.connection, self.config.request_timeout)
    }

    pub fn cancellation(&self) -> &CancellationToken {
        self.connection.cancellation()
    }

    /// Log out and close the underlying socket.
    pub async fn close(self) -> Result<()> {
        let result = self.connection.close(&self.config).await;
        self.dispatcher_handle.abort();
        result
    }
}

/// Builds and connects a [`StreamingClient`].
///
/// Typed per-service data handlers and the heartbeat/server-message/error
/// handlers must all be registered here, before [`connect`](Self::connect)
/// — the dispatcher starts draining the socket as soon as it's dialed, so
/// there's no later point at which registering a handler wouldn't race
/// already-arrived frames.
#[derive(Default)]
pub struct StreamClientBuilder {
    config: StreamConfig,
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

impl StreamClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.config.ping_interval = interval;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn on_heartbeat(mut self, handler: PongHandler) -> Self {
        self.pong_handler = Some(handler);
        self
    }

    pub fn on_server_message(mut self, handler: ServerMessageHandler) -> Self {
        self.server_message_handler = Some(handler);
        self
    }

    /// Register the sink for frames whose service has no typed handler
    /// registered, or whose content fails to decode.
    pub fn on_dispatch_error(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Register the handler invoked once per decoded `LEVELONE_EQUITIES`
    /// record.
    pub fn on_equity(mut self, handler: DataHandler<Equity>) -> Self {
        self.equity_handler = Some(handler);
        self
    }

    /// Register the handler invoked once per decoded `LEVELONE_OPTIONS`
    /// record.
    pub fn on_option(mut self, handler: DataHandler<OptionQuote>) -> Self {
        self.option_handler = Some(handler);
        self
    }

    /// Register the handler invoked once per decoded `LEVELONE_FUTURES`
    /// record.
    pub fn on_future(mut self, handler: DataHandler<Future>) -> Self {
        self.future_handler = Some(handler);
        self
    }

    /// Register the handler invoked once per decoded
    /// `LEVELONE_FUTURES_OPTIONS` record.
    pub fn on_future_option(mut self, handler: DataHandler<FutureOption>) -> Self {
        self.future_option_handler = Some(handler);
        self
    }

    /// Register the handler invoked once per decoded `CHART_EQUITY` bar.
    pub fn on_chart_equity(mut self, handler: DataHandler<ChartEquity>) -> Self {
        self.chart_equity_handler = Some(handler);
        self
    }

    /// Register the handler invoked once per decoded `CHART_FUTURES` bar.
    pub fn on_chart_future(mut self, handler: DataHandler<ChartFuture>) -> Self {
        self.chart_future_handler = Some(handler);
        self
    }

    /// Dial, authenticate, and start the dispatcher.
    pub async fn connect(
        self,
        credentials: &dyn CredentialsProvider,
    ) -> Result<(StreamingClient, LoginResponse)> {
        let prefs = credentials.preferences();
        let correlator = Arc::new(Correlator::new());

        let (connection, envelopes) =
            Connection::dial(&prefs, &self.config, correlator.clone()).await?;

        let mut dispatcher = Dispatcher::new(correlator).with_connection(connection.clone());
        if let Some(handler) = self.pong_handler {
            dispatcher = dispatcher.with_pong_handler(handler);
        }
        if let Some(handler) = self.server_message_handler {
            dispatcher = dispatcher.with_server_message_handler(handler);
        }
        if let Some(handler) = self.error_handler {
            dispatcher = dispatcher.with_error_handler(handler);
        }
        if let Some(handler) = self.equity_handler {
            dispatcher = dispatcher.with_equity_handler(handler);
        }
        if let Some(handler) = self.option_handler {
            dispatcher = dispatcher.with_option_handler(handler);
        }
        if let Some(handler) = self.future_handler {
            dispatcher = dispatcher.with_future_handler(handler);
        }
        if let Some(handler) = self.future_option_handler {
            dispatcher = dispatcher.with_future_option_handler(handler);
        }
        if let Some(handler) = self.chart_equity_handler {
            dispatcher = dispatcher.with_chart_equity_handler(handler);
        }
        if let Some(handler) = self.chart_future_handler {
            dispatcher = dispatcher.with_chart_future_handler(handler);
        }
        let cancel = connection.cancellation().clone();
        let dispatcher_handle = tokio::spawn(dispatcher.run(envelopes, cancel));

        let login = connection
            .login(credentials.access_token(), self.config.request_timeout)
            .await?;

        let client = StreamingClient {
            connection,
            dispatcher_handle,
            config: self.config,
        };
        Ok((client, login))
    }
}
