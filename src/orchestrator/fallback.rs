//! Locally built commentary used when text generation fails.

use super::types::{Language, PromptMaterial};

/// Deterministic template commentary for `material`.
pub fn fallback_commentary(material: &PromptMaterial) -> String {
    let price = material.indicators.current_price;
    let change = material.indicators.price_change_1d.percent;
    let trend = material.indicators.trend;

    match material.language {
        Language::En => format!(
            "{} is trading at ${:.2}. Price change: {:+.2}%. Current trend appears {}.",
            material.symbol, price, change, trend
        ),
        Language::Sv => format!(
            "{} handlas för ${:.2}. Prisförändring: {:+.2}%. Nuvarande trend verkar {}.",
            material.symbol, price, change, trend
        ),
    }
}
