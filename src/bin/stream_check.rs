//! Binary to connect to the streaming endpoint and subscribe to a couple
//! of `CHART_EQUITY` symbols for inspecting live data.
//!
//! # Usage
//!
//! ```sh
//! export STREAMER_ACCESS_TOKEN="your-bearer-token"
//! export STREAMER_URL="wss://streamer.example.com/ws"
//! export STREAMER_CUSTOMER_ID="your-customer-id"
//! export STREAMER_CORREL_ID="your-correl-id"
//! cargo run --bin stream_check --features cli
//! ```

use std::env;
use std::sync::Arc;
use std::time::Duration;

use schwab_streamer::auth::{CredentialsProvider, StreamerPreferences};
use schwab_streamer::client::StreamClientBuilder;
use schwab_streamer::model::Service;
use tokio::sync::mpsc;
use tokio::time;

struct EnvCredentials {
    token: String,
    preferences: StreamerPreferences,
}

impl CredentialsProvider for EnvCredentials {
    fn access_token(&self) -> String {
        self.token.clone()
    }

    fn preferences(&self) -> StreamerPreferences {
        self.preferences.clone()
    }
}

#[tokio::main]
async fn main() -> schwab_streamer::error::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let credentials = EnvCredentials {
        token: env::var("STREAMER_ACCESS_TOKEN")
            .expect("set STREAMER_ACCESS_TOKEN env var before running"),
        preferences: StreamerPreferences {
            streamer_url: env::var("STREAMER_URL").expect("set STREAMER_URL env var before running"),
            schwab_client_customer_id: env::var("STREAMER_CUSTOMER_ID")
                .expect("set STREAMER_CUSTOMER_ID env var before running"),
            schwab_client_correl_id: env::var("STREAMER_CORREL_ID")
                .expect("set STREAMER_CORREL_ID env var before running"),
            schwab_client_channel: "IO".to_string(),
            schwab_client_function_id: "APIAPP".to_string(),
        },
    };

    let (tx, mut data) = mpsc::unbounded_channel();

    println!("Connecting to the streaming endpoint…");
    let (client, login) = StreamClientBuilder::new()
        .on_chart_equity(Arc::new(move |bar| {
            let _ = tx.send(format!("{bar:?}"));
        }))
        .connect(&credentials)
        .await?;
    println!("Logged in: server={} professional={}", login.server, login.is_professional);

    println!("Subscribing to CHART_EQUITY AAPL,MSFT…");
    client
        .commands()
        .subscribe(
            Service::ChartEquity,
            &["AAPL".to_string(), "MSFT".to_string()],
            &[1, 2, 3, 4, 5, 6, 7, 8],
        )
        .await?;

    println!("Listening for events for 10 seconds…");
    let deadline = time::sleep(Duration::from_secs(10));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                println!("\n10 seconds elapsed — disconnecting…");
                break;
            }
            bar = data.recv() => {
                match bar {
                    Some(bar) => println!("{bar}"),
                    None => {
                        println!("Data channel closed");
                        break;
                    }
                }
            }
        }
    }

    client.close().await?;
    println!("Done.");

    Ok(())
}
