//! Collaborator traits supplied by the caller.
//!
//! The cache layer performs no network I/O of its own; these are its only way out.

use async_trait::async_trait;

use super::types::{AnalysisRequest, Indicators, PriceSeries, PromptMaterial};
use crate::error::UpstreamError;

/// Market-data provider: item key in, raw time series out.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_series(&self, request: &AnalysisRequest) -> Result<PriceSeries, UpstreamError>;
}

/// Text-generation provider: prompt material in, commentary text out.
///
/// Prompt wording is the implementor's concern.
#[async_trait]
pub trait CommentarySource: Send + Sync {
    async fn generate(&self, material: &PromptMaterial) -> Result<String, UpstreamError>;
}

/// Stateless indicator arithmetic over a series.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, series: &PriceSeries) -> Indicators;
}

impl<F> Analyzer for F
where
    F: Fn(&PriceSeries) -> Indicators + Send + Sync,
{
    fn analyze(&self, series: &PriceSeries) -> Indicators {
        self(series)
    }
}
