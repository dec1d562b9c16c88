use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::codec::{as_object, get_char, get_f64_opt, get_key, get_millis_opt};
use crate::error::Result;

/// Numeric field tags for `LEVELONE_EQUITIES`.
///
/// The broker's full table runs past fifty fields; this implements the
/// quote-and-trade core every consumer needs (bid/ask/last, sizes, volume,
/// and the quote/trade timestamps) rather than transcribing all of them —
/// callers needing a field outside this set can decode `content` directly
/// with the same [`crate::codec`] accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EquityField {
    BidPrice = 1,
    AskPrice = 2,
    LastPrice = 3,
    BidSize = 4,
    AskSize = 5,
    TotalVolume = 8,
    LastSize = 9,
    HighPrice = 10,
    LowPrice = 11,
    ExchangeId = 13,
    QuoteTime = 34,
    TradeTime = 35,
}

/// One decoded level-one equity quote/trade update.
#[derive(Debug, Clone, PartialEq)]
pub struct Equity {
    pub symbol: String,
    pub bid_price: Option<f64>,
    pub ask_price: Option<f64>,
    pub last_price: Option<f64>,
    pub bid_size: Option<f64>,
    pub ask_size: Option<f64>,
    pub total_volume: Option<f64>,
    pub last_size: Option<f64>,
    pub quote_time: Option<DateTime<Utc>>,
    pub trade_time: Option<DateTime<Utc>>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub exchange_id: Option<char>,
}

impl Equity {
    pub fn decode(value: &Value) -> Result<Self> {
        let obj = as_object(value)?;
        Ok(Self {
            symbol: get_key(obj)?,
            bid_price: get_f64_opt(obj, EquityField::BidPrice as u8),
            ask_price: get_f64_opt(obj, EquityField::AskPrice as u8),
            last_price: get_f64_opt(obj, EquityField::LastPrice as u8),
            bid_size: get_f64_opt(obj, EquityField::BidSize as u8),
            ask_size: get_f64_opt(obj, EquityField::AskSize as u8),
            total_volume: get_f64_opt(obj, EquityField::TotalVolume as u8),
            last_size: get_f64_opt(obj, EquityField::LastSize as u8),
            quote_time: get_millis_opt(obj, EquityField::QuoteTime as u8),
            trade_time: get_millis_opt(obj, EquityField::TradeTime as u8),
            high_price: get_f64_opt(obj, EquityField::HighPrice as u8),
            low_price: get_f64_opt(obj, EquityField::LowPrice as u8),
            exchange_id: get_char(obj, EquityField::ExchangeId as u8).ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_quote_fields_present() {
        let value = json!({
            "key": "AAPL",
            "1": 189.9,
            "2": 190.1,
            "3": 190.0,
            "4": 100.0,
            "5": 200.0,
        });
        let quote = Equity::decode(&value).unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.bid_price, Some(189.9));
        assert_eq!(quote.ask_price, Some(190.1));
        assert_eq!(quote.total_volume, None);
    }

    #[test]
    fn missing_key_is_rejected() {
        let value = json!({"1": 1.0});
        assert!(Equity::decode(&value).is_err());
    }
}
