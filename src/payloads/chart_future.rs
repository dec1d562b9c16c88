use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::codec::{as_object, get_f64, get_key, get_millis};
use crate::error::Result;

/// Numeric field tags for `CHART_FUTURES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChartFutureField {
    ChartTime = 1,
    OpenPrice = 2,
    HighPrice = 3,
    LowPrice = 4,
    ClosePrice = 5,
    Volume = 6,
}

/// One decoded minute bar for a futures contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFuture {
    pub symbol: String,
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl ChartFuture {
    pub fn decode(value: &Value) -> Result<Self> {
        let obj = as_object(value)?;
        Ok(Self {
            symbol: get_key(obj)?,
            time: get_millis(obj, ChartFutureField::ChartTime as u8)?,
            open: get_f64(obj, ChartFutureField::OpenPrice as u8)?,
            high: get_f64(obj, ChartFutureField::HighPrice as u8)?,
            low: get_f64(obj, ChartFutureField::LowPrice as u8)?,
            close: get_f64(obj, ChartFutureField::ClosePrice as u8)?,
            volume: get_f64(obj, ChartFutureField::Volume as u8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_a_minute_bar() {
        let value = json!({
            "key": "/ESZ4",
            "1": 1_700_000_000_000i64,
            "2": 4500.25,
            "3": 4505.0,
            "4": 4498.5,
            "5": 4502.75,
            "6": 900.0,
        });
        let bar = ChartFuture::decode(&value).unwrap();
        assert_eq!(bar.symbol, "/ESZ4");
        assert_eq!(bar.close, 4502.75);
    }
}
