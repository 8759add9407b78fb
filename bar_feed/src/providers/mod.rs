//! Provider abstraction for market data sources.
//!
//! This module defines the [`DataProvider`] trait, a unified interface for
//! fetching raw time-series bar tables from any market data vendor. Each
//! concrete implementation (such as the [Eastmoney kline
//! provider](crate::providers::eastmoney)) handles vendor-specific API logic
//! and hands back an uninterpreted [`RawTable`] plus the [`FieldMap`] that
//! tells the [normalizer](crate::normalize) how to read it.
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`dyn DataProvider`) for runtime selection of providers.

pub mod eastmoney;
pub mod errors;

pub use errors::{ProviderError, ProviderInitError};

use async_trait::async_trait;

use crate::models::request::BarsRequest;
use crate::normalize::{FieldMap, RawTable};

#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Column labels and source time zone for this provider's raw tables.
    fn field_map(&self) -> FieldMap;

    /// Fetch the raw bar table for one request. Exactly one upstream call;
    /// retry policy belongs to the caller.
    async fn fetch_raw(&self, request: &BarsRequest) -> Result<RawTable, ProviderError>;
}
