//! The external collaborator boundary.
//!
//! OAuth2 token refresh and the REST "user preferences" lookup that hands
//! back a streamer URL and correlation identifiers live outside this
//! crate. Callers implement [`CredentialsProvider`] against their own
//! REST client; this crate only consumes the resulting value.

/// Per-session values the broker's REST "user preferences" endpoint
/// returns, needed to dial and authenticate the streaming socket.
#[derive(Debug, Clone)]
pub struct StreamerPreferences {
    /// The `wss://` URL to dial.
    pub streamer_url: String,
    pub schwab_client_customer_id: String,
    pub schwab_client_correl_id: String,
    pub schwab_client_channel: String,
    pub schwab_client_function_id: String,
}

/// Generate a fresh session correlation identifier for
/// `StreamerPreferences::schwab_client_correl_id`. Wire-formatted as a
/// hyphenated UUID string, matching the identifier shape the broker's own
/// reference client builds (a real `uuid.UUID`, serialized as text over the
/// streamer connection — see `WSCreds.SessionID`).
pub fn new_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Supplies the bearer token and streamer preferences needed to open and
/// authenticate a session.
///
/// Production code wires a real OAuth2/REST client behind this trait; this
/// crate ships only the seam.
pub trait CredentialsProvider: Send + Sync {
    /// A valid (non-expired) bearer token for the `LOGIN` command.
    fn access_token(&self) -> String;

    /// The streamer preferences to dial and authenticate with.
    fn preferences(&self) -> StreamerPreferences;
}

#[cfg(test)]
pub(crate) struct StaticCredentials {
    pub token: String,
    pub preferences: StreamerPreferences,
}

#[cfg(test)]
impl CredentialsProvider for StaticCredentials {
    fn access_token(&self) -> String {
        self.token.clone()
    }

    fn preferences(&self) -> StreamerPreferences {
        self.preferences.clone()
    }
}
