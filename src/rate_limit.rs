//! Rate Limiter Module
//!
//! Enforces a minimum spacing between successive calls to each upstream source.
//! Sources are independent: waiting on one never delays another.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

// == Source Id ==
/// Identifies an upstream source for throttling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceId(Cow<'static, str>);

impl SourceId {
    /// Market-data provider.
    pub const MARKET_DATA: SourceId = SourceId::from_static("market_data");
    /// Text-generation provider.
    pub const TEXT_GENERATION: SourceId = SourceId::from_static("text_generation");

    /// Creates an id from a static name.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates an id from an owned name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Source Gate ==
#[derive(Debug)]
struct SourceGate {
    min_interval: Duration,
    // Held across the wait so concurrent callers of one source queue up
    last_call: Mutex<Option<Instant>>,
}

// == Rate Limiter ==
/// Per-source minimum-interval throttle.
///
/// Guarantees spacing between successive calls issued by this process. It is not
/// a request budget and provides no fairness across sources.
#[derive(Debug, Default)]
pub struct RateLimiter {
    gates: HashMap<SourceId, SourceGate>,
}

impl RateLimiter {
    // == Constructor ==
    /// Creates a limiter with no registered sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `source` with the given minimum spacing (builder style).
    pub fn with_source(mut self, source: SourceId, min_interval: Duration) -> Self {
        self.gates.insert(
            source,
            SourceGate {
                min_interval,
                last_call: Mutex::new(None),
            },
        );
        self
    }

    /// Minimum spacing for `source`, or None if it was never registered.
    pub fn min_interval(&self, source: &SourceId) -> Option<Duration> {
        self.gates.get(source).map(|gate| gate.min_interval)
    }

    // == Throttle ==
    /// Waits until at least `min_interval` has passed since the previous call for
    /// `source`, then records this call and returns.
    ///
    /// Never fails. Unregistered sources pass straight through.
    pub async fn throttle(&self, source: &SourceId) {
        let Some(gate) = self.gates.get(source) else {
            return;
        };

        let mut last_call = gate.last_call.lock().await;
        if let Some(previous) = *last_call {
            let ready_at = previous + gate.min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(
                    "Throttling {} for {}ms",
                    source,
                    (ready_at - now).as_millis()
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter() -> RateLimiter {
        RateLimiter::new()
            .with_source(SourceId::MARKET_DATA, Duration::from_secs(1))
            .with_source(SourceId::TEXT_GENERATION, Duration::from_secs(2))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_immediate() {
        let limiter = limiter();
        let start = Instant::now();
        limiter.throttle(&SourceId::MARKET_DATA).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successive_calls_are_spaced() {
        let limiter = limiter();

        limiter.throttle(&SourceId::TEXT_GENERATION).await;
        let first = Instant::now();
        limiter.throttle(&SourceId::TEXT_GENERATION).await;

        assert!(first.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sources_are_independent() {
        let limiter = limiter();

        limiter.throttle(&SourceId::MARKET_DATA).await;
        let start = Instant::now();
        limiter.throttle(&SourceId::TEXT_GENERATION).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_interval_elapsed() {
        let limiter = limiter();

        limiter.throttle(&SourceId::MARKET_DATA).await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        let start = Instant::now();
        limiter.throttle(&SourceId::MARKET_DATA).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregistered_source_is_not_throttled() {
        let limiter = limiter();
        let other = SourceId::new("unregistered");

        let start = Instant::now();
        limiter.throttle(&other).await;
        limiter.throttle(&other).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(limiter.min_interval(&other).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_spaced() {
        let limiter = Arc::new(limiter());
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.throttle(&SourceId::MARKET_DATA).await;
                    Instant::now()
                })
            })
            .collect();

        let mut finished = Vec::new();
        for handle in handles {
            finished.push(handle.await.unwrap());
        }
        finished.sort();

        assert_eq!(finished[0] - start, Duration::ZERO);
        assert!(finished[1] - finished[0] >= Duration::from_secs(1));
        assert!(finished[2] - finished[1] >= Duration::from_secs(1));
    }

    #[test]
    fn test_source_id_display() {
        assert_eq!(SourceId::MARKET_DATA.to_string(), "market_data");
        assert_eq!(SourceId::new("custom").as_str(), "custom");
        assert_eq!(SourceId::new("market_data"), SourceId::MARKET_DATA);
    }
}
