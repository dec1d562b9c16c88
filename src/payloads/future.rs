use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::codec::{as_object, get_f64_opt, get_key, get_millis_opt};
use crate::error::Result;

/// Numeric field tags for `LEVELONE_FUTURES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FutureField {
    BidPrice = 1,
    AskPrice = 2,
    LastPrice = 3,
    BidSize = 4,
    AskSize = 5,
    TotalVolume = 8,
    QuoteTime = 10,
    TradeTime = 11,
    HighPrice = 12,
    LowPrice = 13,
}

/// One decoded level-one futures quote/trade update.
#[derive(Debug, Clone, PartialEq)]
pub struct Future {
    pub symbol: String,
    pub bid_price: Option<f64>,
    pub ask_price: Option<f64>,
    pub last_price: Option<f64>,
    pub bid_size: Option<f64>,
    pub ask_size: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub total_volume: Option<f64>,
    pub quote_time: Option<DateTime<Utc>>,
    pub trade_time: Option<DateTime<Utc>>,
}

impl Future {
    pub fn decode(value: &Value) -> Result<Self> {
        let obj = as_object(value)?;
        Ok(Self {
            symbol: get_key(obj)?,
            bid_price: get_f64_opt(obj, FutureField::BidPrice as u8),
            ask_price: get_f64_opt(obj, FutureField::AskPrice as u8),
            last_price: get_f64_opt(obj, FutureField::LastPrice as u8),
            bid_size: get_f64_opt(obj, FutureField::BidSize as u8),
            ask_size: get_f64_opt(obj, FutureField::AskSize as u8),
            high_price: get_f64_opt(obj, FutureField::HighPrice as u8),
            low_price: get_f64_opt(obj, FutureField::LowPrice as u8),
            total_volume: get_f64_opt(obj, FutureField::TotalVolume as u8),
            quote_time: get_millis_opt(obj, FutureField::QuoteTime as u8),
            trade_time: get_millis_opt(obj, FutureField::TradeTime as u8),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_partial_quote() {
        let value = json!({"key": "/ESZ4", "1": 4500.0, "2": 4500.5});
        let quote = Future::decode(&value).unwrap();
        assert_eq!(quote.symbol, "/ESZ4");
        assert_eq!(quote.bid_price, Some(4500.0));
        assert_eq!(quote.total_volume, None);
    }
}
