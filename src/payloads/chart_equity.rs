use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::codec::{as_object, get_f64, get_i64, get_key, get_millis};
use crate::error::Result;

/// Numeric field tags for `CHART_EQUITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChartEquityField {
    Sequence = 1,
    OpenPrice = 2,
    HighPrice = 3,
    LowPrice = 4,
    ClosePrice = 5,
    Volume = 6,
    ChartTime = 7,
    ChartDay = 8,
}

/// One decoded minute bar for an equity symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartEquity {
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub sequence: i64,
    pub time: DateTime<Utc>,
    pub day: i64,
}

impl ChartEquity {
    pub fn decode(value: &Value) -> Result<Self> {
        let obj = as_object(value)?;
        Ok(Self {
            symbol: get_key(obj)?,
            sequence: get_i64(obj, ChartEquityField::Sequence as u8)?,
            open: get_f64(obj, ChartEquityField::OpenPrice as u8)?,
            high: get_f64(obj, ChartEquityField::HighPrice as u8)?,
            low: get_f64(obj, ChartEquityField::LowPrice as u8)?,
            close: get_f64(obj, ChartEquityField::ClosePrice as u8)?,
            volume: get_f64(obj, ChartEquityField::Volume as u8)?,
            time: get_millis(obj, ChartEquityField::ChartTime as u8)?,
            day: get_i64(obj, ChartEquityField::ChartDay as u8)?,
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
            "key": "AAPL",
            "1": 415,
            "2": 190.1,
            "3": 190.5,
            "4": 189.9,
            "5": 190.3,
            "6": 12345.0,
            "7": 1_700_000_000_000i64,
            "8": 20_240_115,
        });
        let bar = ChartEquity::decode(&value).unwrap();
        assert_eq!(bar.symbol, "AAPL");
        assert_eq!(bar.sequence, 415);
        assert_eq!(bar.close, 190.3);
    }
}
