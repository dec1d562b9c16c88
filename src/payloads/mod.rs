//! Typed per-service payload records.
//!
//! Every record here decodes from the same shape the broker emits: a JSON
//! object keyed by `"key"` for the symbol plus numeric strings ("0", "1",
//! …) for the service-specific fields, walked once per record with the
//! accessor table in [`crate::codec`] rather than by per-field derive
//! tags.

mod chart_equity;
mod chart_future;
mod equity;
mod future;
mod future_option;
mod option;

pub use chart_equity::ChartEquity;
pub use chart_future::ChartFuture;
pub use equity::Equity;
pub use future::Future;
pub use future_option::FutureOption;
pub use option::OptionQuote;
