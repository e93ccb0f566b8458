//! Orchestrator Module
//!
//! Composes two fetch caches into the end-to-end workflow: raw market series under
//! a direct key with a short freshness window, and generated commentary under a
//! content-derived key with a long one. Commentary failures degrade to a local
//! fallback; market-data failures propagate.

mod fallback;
mod sources;
mod types;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::cache::{CacheStats, DurableStore, FetchCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::keys::{ContentKeyDeriver, FieldValue};
use crate::rate_limit::{RateLimiter, SourceId};

pub use fallback::fallback_commentary;
pub use sources::{Analyzer, CommentarySource, MarketDataSource};
pub use types::{
    Analysis, AnalysisRequest, CommentaryOrigin, Indicators, Language, PriceBar, PriceChange,
    PriceSeries, PromptMaterial, Trend,
};

/// Namespace prefix for commentary entries.
pub const COMMENTARY_PREFIX: &str = "commentary";

// == Orchestrator Config ==
/// Freshness windows and throttle spacing for both paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub market_freshness: Duration,
    pub commentary_freshness: Duration,
    pub market_min_interval: Duration,
    pub text_min_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        Self {
            market_freshness: config.market_freshness(),
            commentary_freshness: config.commentary_freshness(),
            market_min_interval: config.market_min_interval(),
            text_min_interval: config.text_min_interval(),
        }
    }
}

/// Projection hashed into the commentary key. Raw volume and the moving
/// averages are left out so they never invalidate cached text.
pub fn commentary_key_deriver() -> ContentKeyDeriver {
    ContentKeyDeriver::new()
        .field("symbol")
        .field("period")
        .field("language")
        .rounded("current_price", 2)
        .field("trend")
        .rounded("rsi", 0)
        .rounded("price_change", 1)
}

// == Orchestrator ==
/// End-to-end resolver over a market-data source, a commentary source and an analyzer.
pub struct Orchestrator<M, C, A> {
    market_cache: FetchCache,
    commentary_cache: FetchCache,
    market: M,
    commentary: C,
    analyzer: A,
    deriver: ContentKeyDeriver,
    config: OrchestratorConfig,
}

impl<M, C, A> Orchestrator<M, C, A>
where
    M: MarketDataSource,
    C: CommentarySource,
    A: Analyzer,
{
    // == Constructor ==
    /// Builds both fetch caches over `store`, each with its own throttle.
    pub fn new(
        store: Arc<DurableStore>,
        config: OrchestratorConfig,
        market: M,
        commentary: C,
        analyzer: A,
    ) -> Self {
        let limiter = Arc::new(
            RateLimiter::new()
                .with_source(SourceId::MARKET_DATA, config.market_min_interval)
                .with_source(SourceId::TEXT_GENERATION, config.text_min_interval),
        );

        Self {
            market_cache: FetchCache::new(store.clone(), limiter.clone(), SourceId::MARKET_DATA),
            commentary_cache: FetchCache::new(store, limiter, SourceId::TEXT_GENERATION),
            market,
            commentary,
            analyzer,
            deriver: commentary_key_deriver(),
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Counters for the market-series cache.
    pub fn market_stats(&self) -> CacheStats {
        self.market_cache.stats()
    }

    /// Counters for the commentary cache.
    pub fn commentary_stats(&self) -> CacheStats {
        self.commentary_cache.stats()
    }

    // == Resolve ==
    /// Returns series, indicators and commentary for `request`.
    ///
    /// Market-data and storage failures propagate with nothing cached. A failing
    /// commentary source yields the fallback text, which is not cached, so the
    /// next call tries the real source again.
    pub async fn resolve(&self, request: &AnalysisRequest) -> Result<Analysis> {
        info!("Analyzing {} for {}", request.symbol, request.period);

        let series: PriceSeries = self
            .market_cache
            .get_or_fetch(&request.series_key(), self.config.market_freshness, || {
                self.market.fetch_series(request)
            })
            .await?;

        let indicators = self.analyzer.analyze(&series);
        let material = PromptMaterial {
            symbol: request.symbol.clone(),
            period: request.period.clone(),
            language: request.language,
            indicators,
        };

        let (commentary, commentary_origin) = self.resolve_commentary(&material).await?;

        Ok(Analysis {
            symbol: request.symbol.clone(),
            period: request.period.clone(),
            last_updated: series.last_updated(),
            series,
            indicators: material.indicators,
            commentary,
            commentary_origin,
        })
    }

    /// Cache key for the commentary derived from `material`.
    pub fn commentary_key(&self, material: &PromptMaterial) -> String {
        let indicators = &material.indicators;
        let fields: [(&str, FieldValue); 7] = [
            ("symbol", material.symbol.as_str().into()),
            ("period", material.period.as_str().into()),
            ("language", material.language.code().into()),
            ("current_price", indicators.current_price.into()),
            ("trend", indicators.trend.as_str().into()),
            ("rsi", indicators.rsi.into()),
            ("price_change", indicators.price_change_1d.percent.into()),
        ];
        self.deriver.derive(fields).namespaced(COMMENTARY_PREFIX)
    }

    async fn resolve_commentary(
        &self,
        material: &PromptMaterial,
    ) -> Result<(String, CommentaryOrigin)> {
        let key = self.commentary_key(material);
        let generated = AtomicBool::new(false);

        let outcome = self
            .commentary_cache
            .get_or_fetch(&key, self.config.commentary_freshness, || {
                generated.store(true, Ordering::Relaxed);
                self.commentary.generate(material)
            })
            .await;

        match outcome {
            Ok(text) if generated.load(Ordering::Relaxed) => {
                Ok((text, CommentaryOrigin::Generated))
            }
            Ok(text) => {
                info!("Using cached commentary for {}", material.symbol);
                Ok((text, CommentaryOrigin::Cached))
            }
            Err(CacheError::Upstream(err)) => {
                warn!(
                    "Commentary generation for {} failed, using fallback: {}",
                    material.symbol, err
                );
                Ok((fallback_commentary(material), CommentaryOrigin::Fallback))
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(price: f64, rsi: Option<f64>, volume_avg: f64) -> PromptMaterial {
        PromptMaterial {
            symbol: "AAPL".to_string(),
            period: "1mo".to_string(),
            language: Language::En,
            indicators: Indicators {
                current_price: price,
                rsi,
                volume_avg,
                trend: Trend::Bullish,
                ..Indicators::default()
            },
        }
    }

    #[test]
    fn test_config_from_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.market_freshness, Duration::from_secs(3600));
        assert_eq!(config.commentary_freshness, Duration::from_secs(24 * 3600));
        assert_eq!(config.market_min_interval, Duration::from_secs(1));
        assert_eq!(config.text_min_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_commentary_projection_rounds_and_ignores_volume() {
        let deriver = commentary_key_deriver();
        let derive = |m: &PromptMaterial| {
            deriver.derive([
                ("symbol", FieldValue::from(m.symbol.as_str())),
                ("current_price", m.indicators.current_price.into()),
                ("rsi", m.indicators.rsi.into()),
                ("volume_avg", m.indicators.volume_avg.into()),
            ])
        };

        let base = derive(&material(150.251, Some(65.2), 1.0e6));
        let noisy = derive(&material(150.254, Some(64.9), 2.0e6));
        let moved = derive(&material(151.0, Some(65.2), 1.0e6));

        assert_eq!(base, noisy);
        assert_ne!(base, moved);
    }
}
