//! Domain symbol identifiers with strict, bidirectional grammars.
//!
//! These wire formats are distinct from ordinary equity tickers: futures,
//! future options, and options each encode structured fields (root symbol,
//! expiry, strike, side) into a single string the broker treats as an
//! opaque key.

use std::fmt;

use crate::error::{Result, StreamError};

const MONTH_CODES: [char; 12] = [
    'F', 'G', 'H', 'J', 'K', 'M', 'N', 'Q', 'U', 'V', 'X', 'Z',
];

fn month_code(month: u8) -> Result<char> {
    MONTH_CODES
        .get(usize::from(month.wrapping_sub(1)))
        .copied()
        .ok_or_else(|| StreamError::InvalidIdentifier {
            kind: "FutureID",
            value: format!("month {month}"),
        })
}

fn month_from_code(code: char) -> Option<u8> {
    MONTH_CODES
        .iter()
        .position(|&c| c == code)
        .map(|idx| idx as u8 + 1)
}

/// A futures contract identifier: `/ROOT<MONTH CODE><YY>`, e.g. `/ESZ4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FutureID {
    pub root: String,
    pub month: u8,
    pub year: u8,
}

impl FutureID {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || StreamError::InvalidIdentifier {
            kind: "FutureID",
            value: raw.to_string(),
        };
        let body = raw.strip_prefix('/').ok_or_else(invalid)?;
        if body.len() < 3 {
            return Err(invalid());
        }
        let split = body.len() - 2;
        let (head, year_str) = body.split_at(split);
        let mut chars: Vec<char> = head.chars().collect();
        let month_char = chars.pop().ok_or_else(invalid)?;
        let root: String = chars.into_iter().collect();
        if root.is_empty() {
            return Err(invalid());
        }
        let year: u8 = year_str.parse().map_err(|_| invalid())?;
        let month = month_from_code(month_char).ok_or_else(invalid)?;
        Ok(Self { root, month, year })
    }
}

impl fmt::Display for FutureID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = month_code(self.month).map_err(|_| fmt::Error)?;
        write!(f, "/{}{}{:02}", self.root, code, self.year)
    }
}

/// A future-option identifier: `./ROOT<MONTH CODE><YY><C|P><STRIKE>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FutureOptionID {
    pub root: String,
    pub month: u8,
    pub year: u8,
    pub is_call: bool,
    pub strike: String,
}

impl FutureOptionID {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || StreamError::InvalidIdentifier {
            kind: "FutureOptionID",
            value: raw.to_string(),
        };
        let body = raw.strip_prefix("./").ok_or_else(invalid)?;
        let cp_index = body
            .find(|c| c == 'C' || c == 'P')
            .ok_or_else(invalid)?;
        let (head, tail) = body.split_at(cp_index);
        let is_call = tail.starts_with('C');
        let strike = tail[1..].to_string();
        if strike.is_empty() {
            return Err(invalid());
        }
        if head.len() < 3 {
            return Err(invalid());
        }
        let split = head.len() - 2;
        let (root_and_month, year_str) = head.split_at(split);
        let mut chars: Vec<char> = root_and_month.chars().collect();
        let month_char = chars.pop().ok_or_else(invalid)?;
        let root: String = chars.into_iter().collect();
        if root.is_empty() {
            return Err(invalid());
        }
        let year: u8 = year_str.parse().map_err(|_| invalid())?;
        let month = month_from_code(month_char).ok_or_else(invalid)?;
        Ok(Self {
            root,
            month,
            year,
            is_call,
            strike,
        })
    }
}

impl fmt::Display for FutureOptionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = month_code(self.month).map_err(|_| fmt::Error)?;
        let side = if self.is_call { 'C' } else { 'P' };
        write!(f, "./{}{}{:02}{}{}", self.root, code, self.year, side, self.strike)
    }
}

/// A 21-character OCC-style option symbol:
/// `<SYMBOL padded to 6><YYMMDD><C|P><STRIKE*1000, zero-padded to 8 digits>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptionID {
    pub underlying: String,
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub is_call: bool,
    /// Strike price in thousandths of a dollar, as encoded on the wire.
    pub strike_millis: u64,
}

impl OptionID {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || StreamError::InvalidIdentifier {
            kind: "OptionID",
            value: raw.to_string(),
        };
        if raw.len() != 21 {
            return Err(invalid());
        }
        let underlying = raw[0..6].trim_end().to_string();
        let year: u8 = raw[6..8].parse().map_err(|_| invalid())?;
        let month: u8 = raw[8..10].parse().map_err(|_| invalid())?;
        let day: u8 = raw[10..12].parse().map_err(|_| invalid())?;
        let side = raw.as_bytes()[12];
        let is_call = match side {
            b'C' => true,
            b'P' => false,
            _ => return Err(invalid()),
        };
        let strike_millis: u64 = raw[13..21].trim_start_matches('0').parse().unwrap_or(0);
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(invalid());
        }
        Ok(Self {
            underlying,
            year,
            month,
            day,
            is_call,
            strike_millis,
        })
    }

    pub fn strike_dollars(&self) -> f64 {
        self.strike_millis as f64 / 1000.0
    }
}

impl fmt::Display for OptionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = if self.is_call { 'C' } else { 'P' };
        write!(
            f,
            "{:<6}{:02}{:02}{:02}{}{:08}",
            self.underlying, self.year, self.month, self.day, side, self.strike_millis
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn future_id_round_trips() {
        let id = FutureID::parse("/ESZ24").unwrap();
        assert_eq!(id.root, "ES");
        assert_eq!(id.month, 12);
        assert_eq!(id.year, 24);
        assert_eq!(id.to_string(), "/ESZ24");
    }

    #[test]
    fn future_id_round_trips_single_digit_year() {
        let id = FutureID::parse("/ESZ04").unwrap();
        assert_eq!(id.year, 4);
        assert_eq!(id.to_string(), "/ESZ04");
    }

    #[test]
    fn future_id_rejects_missing_slash() {
        assert!(FutureID::parse("ESZ24").is_err());
    }

    #[test]
    fn future_option_id_round_trips() {
        let id = FutureOptionID::parse("./ESZ24C4500").unwrap();
        assert_eq!(id.root, "ES");
        assert_eq!(id.year, 24);
        assert!(id.is_call);
        assert_eq!(id.strike, "4500");
        assert_eq!(id.to_string(), "./ESZ24C4500");
    }

    #[test]
    fn option_id_round_trips() {
        let raw = "AAPL  240119C00195000";
        let id = OptionID::parse(raw).unwrap();
        assert_eq!(id.underlying, "AAPL");
        assert_eq!(id.year, 24);
        assert_eq!(id.month, 1);
        assert_eq!(id.day, 19);
        assert!(id.is_call);
        assert_eq!(id.strike_millis, 195_000);
        assert_eq!(id.strike_dollars(), 195.0);
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn option_id_parses_the_literal_put_fixture() {
        let raw = "AAPL  20270102P00123456";
        let id = OptionID::parse(raw).unwrap();
        assert_eq!(id.underlying, "AAPL");
        assert_eq!(id.year, 27);
        assert_eq!(id.month, 1);
        assert_eq!(id.day, 2);
        assert!(!id.is_call);
        assert_eq!(id.strike_millis, 123_456);
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn option_id_rejects_wrong_length() {
        assert!(OptionID::parse("AAPL").is_err());
    }

    #[test]
    fn option_id_rejects_bad_side() {
        let raw = "AAPL  240119X00195000";
        assert!(OptionID::parse(raw).is_err());
    }
}
