//! Sinetron API - client for the short-drama aggregation API
//!
//! Typed access to the catalog endpoints (latest, trending, search),
//! series detail, and the per-episode stream payload that feeds the
//! core source resolver. Transport is a single opaque
//! `fetch_json(endpoint, params)` seam; hosts with proxy fallback or
//! caching layers implement [`VideoApi`] themselves.

pub mod catalog;
pub mod client;
pub mod error;

pub use catalog::{Catalog, EpisodeEntry, SearchPage, SeriesDetail, SeriesSummary};
pub use client::{HttpApi, VideoApi, DEFAULT_API_BASE};
pub use error::{ApiError, Result};
