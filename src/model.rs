//! Core wire-level data model shared by the codec, correlator, dispatcher,
//! and command facade.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{CLOSE_STATUS_LOGIN_DENIED, CLOSE_STATUS_MAX_CONNECTIONS, CLOSE_STATUS_STOP_STREAMING};

/// Monotonically assigned per-session request identifier.
///
/// Wire form is a decimal string, but the broker has been observed to send
/// integers and, occasionally, floats — [`RequestID`] deserializes from any
/// of the three and always serializes back as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestID(pub u64);

impl RequestID {
    pub fn next(counter: u64) -> Self {
        Self(counter)
    }
}

impl fmt::Display for RequestID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RequestID {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for RequestID {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let id = match value {
            Value::String(s) => s.parse::<u64>().map_err(serde::de::Error::custom)?,
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().map(|f| f as u64))
                .ok_or_else(|| serde::de::Error::custom("requestid number out of range"))?,
            other => {
                return Err(serde::de::Error::custom(format!(
                    "requestid must be a string or number, got {other}"
                )));
            }
        };
        Ok(RequestID(id))
    }
}

/// Response codes the broker attaches to `{code, msg}` acknowledgement
/// bodies. The numeric set is sparse by design — unused values in between
/// are never sent — so this is a closed enum with an explicit fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WsRespCode {
    Success,
    LoginDenied,
    UnknownFailure,
    ServiceNotAvailable,
    CloseConnection,
    ReachedSymbolLimit,
    StreamConnNotFound,
    BadCommandFormat,
    FailedCommandSubs,
    FailedCommandUnsubs,
    FailedCommandAdd,
    FailedCommandView,
    SucceededCommandSubs,
    SucceededCommandUnsubs,
    SucceededCommandAdd,
    SucceededCommandView,
    StopStreaming,
    /// A code outside the known set; carries the raw value.
    Unknown(u16),
}

impl WsRespCode {
    const fn code(self) -> u16 {
        match self {
            Self::Success => 0,
            Self::LoginDenied => 3,
            Self::UnknownFailure => 9,
            Self::ServiceNotAvailable => 11,
            Self::CloseConnection => 12,
            Self::ReachedSymbolLimit => 19,
            Self::StreamConnNotFound => 20,
            Self::BadCommandFormat => 21,
            Self::FailedCommandSubs => 22,
            Self::FailedCommandUnsubs => 23,
            Self::FailedCommandAdd => 24,
            Self::FailedCommandView => 25,
            Self::SucceededCommandSubs => 26,
            Self::SucceededCommandUnsubs => 27,
            Self::SucceededCommandAdd => 28,
            Self::SucceededCommandView => 29,
            Self::StopStreaming => 30,
            Self::Unknown(raw) => raw,
        }
    }

    fn from_code(raw: u16) -> Self {
        match raw {
            0 => Self::Success,
            3 => Self::LoginDenied,
            9 => Self::UnknownFailure,
            11 => Self::ServiceNotAvailable,
            12 => Self::CloseConnection,
            19 => Self::ReachedSymbolLimit,
            20 => Self::StreamConnNotFound,
            21 => Self::BadCommandFormat,
            22 => Self::FailedCommandSubs,
            23 => Self::FailedCommandUnsubs,
            24 => Self::FailedCommandAdd,
            25 => Self::FailedCommandView,
            26 => Self::SucceededCommandSubs,
            27 => Self::SucceededCommandUnsubs,
            28 => Self::SucceededCommandAdd,
            29 => Self::SucceededCommandView,
            30 => Self::StopStreaming,
            other => Self::Unknown(other),
        }
    }

    /// Whether this code represents a successful, informational response —
    /// the bare `Success` ack as well as the per-command `Succeeded*` acks
    /// `SUBS`/`ADD`/`VIEW`/`UNSUBS` receive.
    pub const fn is_success(self) -> bool {
        matches!(
            self,
            Self::Success
                | Self::SucceededCommandSubs
                | Self::SucceededCommandUnsubs
                | Self::SucceededCommandAdd
                | Self::SucceededCommandView
        )
    }

    /// Whether this code is a terminal protocol stop: login was denied, the
    /// account already holds the maximum number of connections, or the
    /// server asked the client to stop streaming. A session must transition
    /// to `Closed` on any of these, not just log and continue.
    pub const fn is_terminal_stop(self) -> bool {
        let code = self.code();
        code == CLOSE_STATUS_LOGIN_DENIED || code == CLOSE_STATUS_MAX_CONNECTIONS || code == CLOSE_STATUS_STOP_STREAMING
    }
}

impl fmt::Display for WsRespCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for WsRespCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(self.code())
    }
}

impl<'de> Deserialize<'de> for WsRespCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u16::deserialize(deserializer)?;
        Ok(Self::from_code(raw))
    }
}

/// Closed set of subscribable/administrative services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Admin,
    LevelOneEquities,
    LevelOneOptions,
    LevelOneFutures,
    LevelOneFuturesOptions,
    LevelOneForex,
    NyseBook,
    NasdaqBook,
    OptionsBook,
    ChartEquity,
    ChartFutures,
    ScreenerEquity,
    ScreenerOption,
    AcctActivity,
}

impl Service {
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::LevelOneEquities => "LEVELONE_EQUITIES",
            Self::LevelOneOptions => "LEVELONE_OPTIONS",
            Self::LevelOneFutures => "LEVELONE_FUTURES",
            Self::LevelOneFuturesOptions => "LEVELONE_FUTURES_OPTIONS",
            Self::LevelOneForex => "LEVELONE_FOREX",
            Self::NyseBook => "NYSE_BOOK",
            Self::NasdaqBook => "NASDAQ_BOOK",
            Self::OptionsBook => "OPTIONS_BOOK",
            Self::ChartEquity => "CHART_EQUITY",
            Self::ChartFutures => "CHART_FUTURES",
            Self::ScreenerEquity => "SCREENER_EQUITY",
            Self::ScreenerOption => "SCREENER_OPTION",
            Self::AcctActivity => "ACCT_ACTIVITY",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw.to_ascii_uppercase().as_str() {
            "ADMIN" => Self::Admin,
            "LEVELONE_EQUITIES" => Self::LevelOneEquities,
            "LEVELONE_OPTIONS" => Self::LevelOneOptions,
            "LEVELONE_FUTURES" => Self::LevelOneFutures,
            "LEVELONE_FUTURES_OPTIONS" => Self::LevelOneFuturesOptions,
            "LEVELONE_FOREX" => Self::LevelOneForex,
            "NYSE_BOOK" => Self::NyseBook,
            "NASDAQ_BOOK" => Self::NasdaqBook,
            "OPTIONS_BOOK" => Self::OptionsBook,
            "CHART_EQUITY" => Self::ChartEquity,
            "CHART_FUTURES" => Self::ChartFutures,
            "SCREENER_EQUITY" => Self::ScreenerEquity,
            "SCREENER_OPTION" => Self::ScreenerOption,
            "ACCT_ACTIVITY" => Self::AcctActivity,
            _ => return None,
        })
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl Serialize for Service {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for Service {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unknown service {raw}")))
    }
}

/// Closed set of commands a caller may issue against a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Login,
    Subs,
    Add,
    Unsubs,
    View,
    Logout,
}

impl Command {
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::Subs => "SUBS",
            Self::Add => "ADD",
            Self::Unsubs => "UNSUBS",
            Self::View => "VIEW",
            Self::Logout => "LOGOUT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw.to_ascii_uppercase().as_str() {
            "LOGIN" => Self::Login,
            "SUBS" => Self::Subs,
            "ADD" => Self::Add,
            "UNSUBS" => Self::Unsubs,
            "VIEW" => Self::View,
            "LOGOUT" => Self::Logout,
            _ => return None,
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl Serialize for Command {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for Command {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unknown command {raw}")))
    }
}

/// Lifecycle state of a single streaming session, mutated only by the
/// connection supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Dialed,
    LoggedIn,
    TearingDown,
    Closed,
}

/// A correlated response to a previously issued [`Command`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiResponse {
    pub service: Service,
    pub command: Command,
    #[serde(rename = "requestid")]
    pub request_id: RequestID,
    #[serde(rename = "SchwabClientCorrelId")]
    pub correlation_id: String,
    #[serde(with = "epoch_millis")]
    pub timestamp: DateTime<Utc>,
    pub content: Value,
}

/// An uncorrelated market-data payload, routed by `service` to the handler
/// registered for it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataFrame {
    pub service: Service,
    pub command: Command,
    #[serde(with = "epoch_millis")]
    pub timestamp: DateTime<Utc>,
    pub content: Value,
}

/// An admin-channel notification: either a heartbeat or a server message.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Heartbeat { server_timestamp: DateTime<Utc> },
    ServerMessage {
        service: Option<Service>,
        timestamp: Option<DateTime<Utc>>,
        code: WsRespCode,
        message: String,
    },
}

impl<'de> Deserialize<'de> for Notification {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if let Some(heartbeat) = value.get("heartbeat") {
            let millis: i64 = match heartbeat {
                Value::String(s) => s.parse().map_err(serde::de::Error::custom)?,
                Value::Number(n) => n
                    .as_i64()
                    .ok_or_else(|| serde::de::Error::custom("heartbeat out of range"))?,
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "heartbeat must be string or number, got {other}"
                    )));
                }
            };
            let server_timestamp = DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| serde::de::Error::custom("heartbeat millis out of range"))?;
            return Ok(Self::Heartbeat { server_timestamp });
        }

        let service = value
            .get("service")
            .and_then(Value::as_str)
            .and_then(Service::parse);
        let timestamp = value
            .get("timestamp")
            .and_then(Value::as_i64)
            .and_then(DateTime::from_timestamp_millis);

        // The code/message pair rides inside a nested `content` object, not
        // at the top level — only `service`/`timestamp` are top-level.
        let content = value.get("content");
        let code = content
            .and_then(|c| c.get("code"))
            .and_then(Value::as_u64)
            .map(|c| WsRespCode::from_code(c as u16))
            .unwrap_or(WsRespCode::Success);
        let message = content
            .and_then(|c| c.get("msg"))
            .or_else(|| content.and_then(|c| c.get("message")))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self::ServerMessage {
            service,
            timestamp,
            code,
            message,
        })
    }
}

/// Top-level inbound frame. Any subset of the three fields may be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamEnvelope {
    #[serde(default, rename = "response")]
    pub api_responses: Vec<ApiResponse>,
    #[serde(default)]
    pub data: Vec<DataFrame>,
    #[serde(default)]
    pub notify: Vec<Notification>,
}

/// An outbound command, serialized as a single JSON object and written to
/// the socket as one text frame.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundCommand {
    #[serde(rename = "requestid")]
    pub request_id: RequestID,
    pub service: Service,
    pub command: Command,
    #[serde(rename = "SchwabClientCustomerId")]
    pub customer_id: String,
    #[serde(rename = "SchwabClientCorrelId")]
    pub correlation_id: String,
    pub parameters: Value,
}

/// The `{"requests": [...]}` wrapper the broker expects on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEnvelope {
    pub requests: Vec<OutboundCommand>,
}

mod epoch_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(value.timestamp_millis())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = i64::deserialize(deserializer)?;
        DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| serde::de::Error::custom("timestamp millis out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_round_trips_through_string() {
        let id = RequestID(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"42\"");
        let back: RequestID = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn request_id_accepts_integer_and_float() {
        let from_int: RequestID = serde_json::from_str("7").unwrap();
        assert_eq!(from_int, RequestID(7));
        let from_float: RequestID = serde_json::from_str("7.0").unwrap();
        assert_eq!(from_float, RequestID(7));
    }

    #[test]
    fn service_parse_is_case_insensitive() {
        assert_eq!(Service::parse("chart_equity"), Some(Service::ChartEquity));
        assert_eq!(Service::parse("CHART_EQUITY"), Some(Service::ChartEquity));
        assert_eq!(Service::parse("not_a_service"), None);
    }

    #[test]
    fn ws_resp_code_round_trips_known_and_unknown() {
        assert!(WsRespCode::from_code(0).is_success());
        assert_eq!(WsRespCode::from_code(30), WsRespCode::StopStreaming);
        assert_eq!(WsRespCode::from_code(200), WsRespCode::Unknown(200));
    }

    #[test]
    fn ws_resp_code_treats_per_command_success_acks_as_success() {
        assert!(WsRespCode::from_code(26).is_success());
        assert!(WsRespCode::from_code(29).is_success());
        assert!(!WsRespCode::from_code(22).is_success());
        assert_eq!(WsRespCode::from_code(22), WsRespCode::FailedCommandSubs);
    }

    #[test]
    fn notification_decodes_the_literal_heartbeat_fixture() {
        let heartbeat: Notification =
            serde_json::from_str(r#"{"heartbeat":"7899846466"}"#).unwrap();
        match heartbeat {
            Notification::Heartbeat { server_timestamp } => {
                assert_eq!(server_timestamp.timestamp_millis(), 7_899_846_466);
            }
            other => panic!("expected Heartbeat, got {other:?}"),
        }
    }

    #[test]
    fn notification_distinguishes_heartbeat_from_server_message() {
        let heartbeat: Notification =
            serde_json::from_str(r#"{"heartbeat":"1700000000000"}"#).unwrap();
        assert!(matches!(heartbeat, Notification::Heartbeat { .. }));

        let server_message: Notification = serde_json::from_str(
            r#"{"service":"ADMIN","timestamp":1700000000000,"content":{"code":30,"msg":"stop"}}"#,
        )
        .unwrap();
        match server_message {
            Notification::ServerMessage { code, message, .. } => {
                assert_eq!(code, WsRespCode::StopStreaming);
                assert_eq!(message, "stop");
            }
            other => panic!("expected ServerMessage, got {other:?}"),
        }
    }

    #[test]
    fn notification_decodes_the_stop_streaming_server_message() {
        // Literal shape of an empty-subscription stop notice.
        let raw = r#"{"notify":[{"service":"ADMIN","timestamp":1742275584551,"content":{"code":30,"msg":"Stop streaming due to empty subscription"}}]}"#;
        let envelope: StreamEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.notify.len(), 1);
        match &envelope.notify[0] {
            Notification::ServerMessage {
                service,
                timestamp,
                code,
                message,
            } => {
                assert_eq!(*service, Some(Service::Admin));
                assert_eq!(timestamp.unwrap().timestamp_millis(), 1_742_275_584_551);
                assert_eq!(*code, WsRespCode::StopStreaming);
                assert!(code.is_terminal_stop());
                assert_eq!(message, "Stop streaming due to empty subscription");
            }
            other => panic!("expected ServerMessage, got {other:?}"),
        }
    }

    #[test]
    fn is_terminal_stop_covers_login_denied_and_max_connections_too() {
        assert!(WsRespCode::LoginDenied.is_terminal_stop());
        assert!(WsRespCode::CloseConnection.is_terminal_stop());
        assert!(!WsRespCode::Success.is_terminal_stop());
        assert!(!WsRespCode::ReachedSymbolLimit.is_terminal_stop());
    }
}
