use serde_json::Value;

use crate::codec::{as_object, get_f64_opt, get_key};
use crate::error::Result;

/// Numeric field tags for `LEVELONE_FUTURES_OPTIONS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FutureOptionField {
    BidPrice = 1,
    AskPrice = 2,
    LastPrice = 3,
    BidSize = 4,
    AskSize = 5,
    Volume = 8,
}

/// One decoded level-one futures-option quote/trade update.
#[derive(Debug, Clone, PartialEq)]
pub struct FutureOption {
    pub symbol: String,
    pub bid_price: Option<f64>,
    pub ask_price: Option<f64>,
    pub last_price: Option<f64>,
    pub bid_size: Option<f64>,
    pub ask_size: Option<f64>,
    pub volume: Option<f64>,
}

impl FutureOption {
    pub fn decode(value: &Value) -> Result<Self> {
        let obj = as_object(value)?;
        Ok(Self {
            symbol: get_key(obj)?,
            bid_price: get_f64_opt(obj, FutureOptionField::BidPrice as u8),
            ask_price: get_f64_opt(obj, FutureOptionField::AskPrice as u8),
            last_price: get_f64_opt(obj, FutureOptionField::LastPrice as u8),
            bid_size: get_f64_opt(obj, FutureOptionField::BidSize as u8),
            ask_size: get_f64_opt(obj, FutureOptionField::AskSize as u8),
            volume: get_f64_opt(obj, FutureOptionField::Volume as u8),
        })
    }
}
