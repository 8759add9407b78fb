//! Multi-scenario background loading for the chart tool.
//!
//! A *scenario* is one named fetch request (period plus date range or
//! lookback). This crate owns the scenario registry, launches one concurrent
//! fetch worker per started scenario, tracks each scenario through an
//! explicit four-phase lifecycle, and exposes a non-blocking snapshot query
//! that the presentation layer polls before rendering anything.

pub mod config;
pub mod presentation;
pub mod scenario;
pub mod scheduler;
pub mod state;
