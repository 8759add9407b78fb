//! Historical index bar retrieval.
//!
//! This crate owns everything between a fetch request and a canonical
//! [`BarSeries`](models::bar_series::BarSeries): the provider abstraction and
//! one concrete kline REST provider, the raw-table normalizer, the
//! partial-date range resolver, and the single-shot fetch task that the
//! scenario scheduler spawns workers around.

pub mod fetch;
pub mod models;
pub mod normalize;
pub mod providers;
pub mod range;
pub mod tz;
