//! Integration tests against a real Schwab streamer connection.
//!
//! # Running
//!
//! These tests require a real, already-issued OAuth2 access token and the
//! streamer preferences the broker's REST "user preferences" endpoint
//! returns for the associated account. Set the following environment
//! variables before running:
//!
//! ```sh
//! export SCHWAB_ACCESS_TOKEN="..."
//! export SCHWAB_STREAMER_URL="wss://..."
//! export SCHWAB_CLIENT_CUSTOMER_ID="..."
//! export SCHWAB_CLIENT_CORREL_ID="..."
//! cargo test --test live -- --nocapture
//! ```
//!
//! Without these env vars, every test is silently skipped. This crate has
//! no REST/OAuth2 client of its own to mint a token with, so there is no
//! sandbox equivalent to dial without one.
//!
//! # What is tested
//!
//! - **Login** — dial and authenticate, validate the `server=...;status=...`
//!   handshake response.
//! - **Subscribe / unsubscribe** — a `LEVELONE_EQUITIES` round trip on a
//!   liquid, well-known symbol.
//! - **Data flow** — at least one decoded `LEVELONE_EQUITIES` record
//!   reaches the registered handler after subscribing.

use std::sync::Arc;
use std::time::Duration;

use schwab_streamer::auth::{CredentialsProvider, StreamerPreferences};
use schwab_streamer::client::StreamClientBuilder;
use schwab_streamer::model::Service;
use tokio::sync::mpsc;

/// A liquid, well-known symbol for testing.
const AAPL: &str = "AAPL";

struct EnvCredentials {
    token: String,
    prefs: StreamerPreferences,
}

impl CredentialsProvider for EnvCredentials {
    fn access_token(&self) -> String {
        self.token.clone()
    }

    fn preferences(&self) -> StreamerPreferences {
        self.prefs.clone()
    }
}

/// Helper: build credentials from the environment, or `None` to skip.
fn env_credentials() -> Option<EnvCredentials> {
    let token = std::env::var("SCHWAB_ACCESS_TOKEN").ok()?;
    let streamer_url = std::env::var("SCHWAB_STREAMER_URL").ok()?;
    let schwab_client_customer_id = std::env::var("SCHWAB_CLIENT_CUSTOMER_ID").ok()?;
    let schwab_client_correl_id = std::env::var("SCHWAB_CLIENT_CORREL_ID").ok()?;
    if token.is_empty() || streamer_url.is_empty() {
        return None;
    }
    Some(EnvCredentials {
        token,
        prefs: StreamerPreferences {
            streamer_url,
            schwab_client_customer_id,
            schwab_client_correl_id,
            schwab_client_channel: "IO".to_string(),
            schwab_client_function_id: "APIAPP".to_string(),
        },
    })
}

/// Macro to skip a test when credentials are missing.
macro_rules! require_credentials {
    () => {
        match env_credentials() {
            Some(c) => c,
            None => {
                eprintln!("skipped (SCHWAB_ACCESS_TOKEN / SCHWAB_STREAMER_URL not set)");
                return;
            }
        }
    };
}

#[tokio::test]
async fn test_login_succeeds() {
    let credentials = require_credentials!();
    let (client, login) = StreamClientBuilder::new()
        .request_timeout(Duration::from_secs(10))
        .connect(&credentials)
        .await
        .expect("connect failed");
    assert!(!login.server.is_empty(), "login response should name a server");
    client.close().await.expect("close failed");
}

#[tokio::test]
async fn test_subscribe_and_receive_data() {
    let credentials = require_credentials!();
    let (tx, mut data) = mpsc::unbounded_channel();
    let (client, _login) = StreamClientBuilder::new()
        .request_timeout(Duration::from_secs(10))
        .on_equity(Arc::new(move |quote| {
            let _ = tx.send(quote);
        }))
        .connect(&credentials)
        .await
        .expect("connect failed");

    client
        .commands()
        .subscribe(Service::LevelOneEquities, &[AAPL.to_string()], &[1, 2, 3])
        .await
        .expect("subscribe failed");

    let quote = tokio::time::timeout(Duration::from_secs(15), data.recv())
        .await
        .expect("timed out waiting for a data record")
        .expect("data channel closed unexpectedly");
    assert_eq!(quote.symbol, AAPL);

    client
        .commands()
        .unsubscribe(Service::LevelOneEquities, &[AAPL.to_string()])
        .await
        .expect("unsubscribe failed");
    client.close().await.expect("close failed");
}
