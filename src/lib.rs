//! # schwab-streamer
//!
//! A streaming market-data client for a brokerage WebSocket API: request
//! correlation, connection supervision, and positional wire decoding for
//! real-time quotes, chart bars, and account activity.
//!
//! The REST/OAuth2 surface that hands back a bearer token and streamer
//! preferences is out of scope — implement [`auth::CredentialsProvider`]
//! against your own REST client and pass it to [`client::StreamClientBuilder`].
//!
//! ## Quick start
//!
//! ```no_run
//! use schwab_streamer::auth::{CredentialsProvider, StreamerPreferences};
//! use schwab_streamer::client::StreamClientBuilder;
//! use schwab_streamer::model::Service;
//!
//! struct MyCredentials;
//!
//! impl CredentialsProvider for MyCredentials {
//!     fn access_token(&self) -> String {
//!         "token".to_string()
//!     }
//!
//!     fn preferences(&self) -> StreamerPreferences {
//!         StreamerPreferences {
//!             streamer_url: "wss://streamer.example.com/ws".to_string(),
//!             schwab_client_customer_id: "customer".to_string(),
//!             schwab_client_correl_id: "correl".to_string(),
//!             schwab_client_channel: "IO".to_string(),
//!             schwab_client_function_id: "APIAPP".to_string(),
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> schwab_streamer::error::Result<()> {
//!     let (client, _login) = StreamClientBuilder::new().connect(&MyCredentials).await?;
//!     client
//!         .commands()
//!         .subscribe(Service::ChartEquity, &["AAPL".to_string()], &[1, 2, 5])
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod codec;
pub mod commands;
pub mod config;
pub mod connection;
pub mod constants;
pub mod correlator;
pub mod dispatch;
pub mod error;
pub mod ids;
pub mod model;
pub mod payloads;

pub use config::StreamConfig;

/// Re-export the main client types at crate root for convenience.
pub use client::{StreamClientBuilder, StreamingClient};
/// Re-export the error type and Result alias.
pub use error::{Result, StreamError};
