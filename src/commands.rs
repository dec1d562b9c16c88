//! Command Facade: typed subscribe/add/view/unsubscribe operations per
//! service.
//!
//! Each service request carries the same two wire parameters — a
//! comma-joined `keys` symbol list and a comma-joined `fields` tag list —
//! so every operation here funnels through [`join_symbols`]/[`join_fields`]
//! and the same precondition checks the broker's own reference client
//! applies: `SUBS` and `ADD` both require at least one symbol; `SUBS` and
//! `VIEW` both require at least one field.

use std::time::Duration;

use serde_json::{json, Value};

use crate::codec::{join_fields, join_symbols};
use crate::connection::Connection;
use crate::error::{Result, StreamError};
use crate::model::{ApiResponse, Command, Service};

fn require_symbols(symbols: &[String]) -> Result<()> {
    if symbols.is_empty() {
        return Err(StreamError::Precondition("at least one symbol is required".to_string()));
    }
    Ok(())
}

fn require_fields(fields: &[u8]) -> Result<()> {
    if fields.is_empty() {
        return Err(StreamError::Precondition("at least one field is required".to_string()));
    }
    Ok(())
}

fn subscription_params(symbols: &[String], fields: &[u8]) -> Result<Value> {
    let mut params = serde_json::Map::new();
    if !symbols.is_empty() {
        params.insert("keys".to_string(), Value::String(join_symbols(symbols)?));
    }
    if !fields.is_empty() {
        params.insert("fields".to_string(), Value::String(join_fields(fields)));
    }
    Ok(Value::Object(params))
}

/// Typed subscribe/add/view/unsubs operations, generalized across every
/// subscribable service.
pub struct CommandFacade<'a> {
    connection: &'a Connection,
    timeout: Duration,
}

impl<'a> CommandFacade<'a> {
    pub fn new(connection: &'a Connection, timeout: Duration) -> Self {
        Self { connection, timeout }
    }

    /// `SUBS` — replace the subscription set for `service` with exactly
    /// `symbols`/`fields`.
    pub async fn subscribe(
        &self,
        service: Service,
        symbols: &[String],
        fields: &[u8],
    ) -> Result<ApiResponse> {
        require_symbols(symbols)?;
        require_fields(fields)?;
        let params = subscription_params(symbols, fields)?;
        self.connection
            .request(service, Command::Subs, params, self.timeout)
            .await
    }

    /// `ADD` — add `symbols` to the existing subscription for `service`.
    /// `fields` is only required the first time a subscription is created.
    pub async fn add(
        &self,
        service: Service,
        symbols: &[String],
        fields: &[u8],
    ) -> Result<ApiResponse> {
        require_symbols(symbols)?;
        let params = subscription_params(symbols, fields)?;
        self.connection
            .request(service, Command::Add, params, self.timeout)
            .await
    }

    /// `VIEW` — narrow the field set returned for an existing
    /// subscription, without altering the symbol list.
    pub async fn set_view(&self, service: Service, fields: &[u8]) -> Result<ApiResponse> {
        require_fields(fields)?;
        let params = json!({ "fields": join_fields(fields) });
        self.connection
            .request(service, Command::View, params, self.timeout)
            .await
    }

    /// `UNSUBS` — remove `symbols` from the subscription for `service`.
    /// Requires at least one symbol.
    pub async fn unsubscribe(&self, service: Service, symbols: &[String]) -> Result<ApiResponse> {
        require_symbols(symbols)?;
        let params = json!({ "keys": join_symbols(symbols)? });
        self.connection
            .request(service, Command::Unsubs, params, self.timeout)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_params_require_symbols_and_fields() {
        assert!(require_symbols(&[]).is_err());
        assert!(require_fields(&[]).is_err());
        assert!(require_symbols(&["AAPL".to_string()]).is_ok());
    }

    #[test]
    fn subscription_params_omits_absent_fields() {
        let params = subscription_params(&["AAPL".to_string()], &[]).unwrap();
        assert_eq!(params, json!({"keys": "AAPL"}));
    }

    #[test]
    fn subscription_params_rejects_empty_symbol() {
        let err = subscription_params(&["".to_string()], &[1]).unwrap_err();
        assert!(matches!(err, StreamError::Precondition(_)));
    }
}
