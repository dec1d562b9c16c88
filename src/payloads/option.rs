use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::codec::{as_object, get_f64_opt, get_key, get_millis_opt};
use crate::error::Result;

/// Numeric field tags for `LEVELONE_OPTIONS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OptionField {
    BidPrice = 2,
    AskPrice = 3,
    LastPrice = 4,
    HighPrice = 5,
    LowPrice = 6,
    Volume = 8,
    OpenInterest = 9,
    Volatility = 10,
    Delta = 28,
    Gamma = 29,
    Theta = 30,
    Vega = 31,
    QuoteTime = 38,
    TradeTime = 39,
}

/// One decoded level-one option quote/trade update, including the greeks
/// the broker streams alongside price.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionQuote {
    pub symbol: String,
    pub bid_price: Option<f64>,
    pub ask_price: Option<f64>,
    pub last_price: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub volatility: Option<f64>,
    pub volume: Option<f64>,
    pub quote_time: Option<DateTime<Utc>>,
    pub trade_time: Option<DateTime<Utc>>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub theta: Option<f64>,
    pub vega: Option<f64>,
    pub open_interest: Option<f64>,
}

impl OptionQuote {
    pub fn decode(value: &Value) -> Result<Self> {
        let obj = as_object(value)?;
        Ok(Self {
            symbol: get_key(obj)?,
            bid_price: get_f64_opt(obj, OptionField::BidPrice as u8),
            ask_price: get_f64_opt(obj, OptionField::AskPrice as u8),
            last_price: get_f64_opt(obj, OptionField::LastPrice as u8),
            high_price: get_f64_opt(obj, OptionField::HighPrice as u8),
            low_price: get_f64_opt(obj, OptionField::LowPrice as u8),
            volatility: get_f64_opt(obj, OptionField::Volatility as u8),
            volume: get_f64_opt(obj, OptionField::Volume as u8),
            quote_time: get_millis_opt(obj, OptionField::QuoteTime as u8),
            trade_time: get_millis_opt(obj, OptionField::TradeTime as u8),
            delta: get_f64_opt(obj, OptionField::Delta as u8),
            gamma: get_f64_opt(obj, OptionField::Gamma as u8),
            theta: get_f64_opt(obj, OptionField::Theta as u8),
            vega: get_f64_opt(obj, OptionField::Vega as u8),
            open_interest: get_f64_opt(obj, OptionField::OpenInterest as u8),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_greeks() {
        let value = json!({
            "key": "AAPL  240119C00195000",
            "4": 12.3,
            "28": 0.45,
            "29": 0.02,
        });
        let quote = OptionQuote::decode(&value).unwrap();
        assert_eq!(quote.last_price, Some(12.3));
        assert_eq!(quote.delta, Some(0.45));
        assert_eq!(quote.gamma, Some(0.02));
        assert_eq!(quote.theta, None);
    }
}
