//! Domain payloads passed between the orchestrator and its collaborators.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Language ==
/// Output language for commentary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Sv,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Sv => "sv",
        }
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    /// Unknown codes fall back to English.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "sv" => Language::Sv,
            _ => Language::En,
        })
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// == Trend ==
/// Moving-average trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
    #[default]
    Neutral,
    InsufficientData,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Bullish => "bullish",
            Trend::Bearish => "bearish",
            Trend::Neutral => "neutral",
            Trend::InsufficientData => "insufficient_data",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Price Series ==
/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Raw time series returned by the market-data provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Timestamp of the most recent bar.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|bar| bar.timestamp)
    }
}

// == Indicators ==
/// Absolute and percentage change over a lookback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub amount: f64,
    pub percent: f64,
}

/// Technical indicators computed from a series by the caller's analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub current_price: f64,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub rsi: Option<f64>,
    pub volume_avg: f64,
    pub price_change_1d: PriceChange,
    pub price_change_5d: PriceChange,
    pub trend: Trend,
}

// == Requests ==
/// What the caller wants analysed. Symbol and period are passed through unvalidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub period: String,
    #[serde(default)]
    pub language: Language,
}

impl AnalysisRequest {
    pub fn new(symbol: impl Into<String>, period: impl Into<String>, language: Language) -> Self {
        Self {
            symbol: symbol.into(),
            period: period.into(),
            language,
        }
    }

    /// Direct cache key for the raw series: `stock_{symbol}_{period}`.
    pub fn series_key(&self) -> String {
        format!("stock_{}_{}", self.symbol, self.period)
    }
}

/// Everything the text-generation collaborator needs to build its prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptMaterial {
    pub symbol: String,
    pub period: String,
    pub language: Language,
    pub indicators: Indicators,
}

// == Analysis ==
/// Where the commentary in an [`Analysis`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentaryOrigin {
    Cached,
    Generated,
    Fallback,
}

/// End-to-end result of [`Orchestrator::resolve`](super::Orchestrator::resolve).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub symbol: String,
    pub period: String,
    pub series: PriceSeries,
    pub indicators: Indicators,
    pub commentary: String,
    pub commentary_origin: CommentaryOrigin,
    pub last_updated: Option<DateTime<Utc>>,
}
