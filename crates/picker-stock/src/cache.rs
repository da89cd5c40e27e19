//! Time-bounded memos for LLM commentary and company fundamentals

use cached::{Cached, TimedCache};
use picker_core::{Fundamentals, ScoreRecord, ScoringModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Identity of one commentary request
///
/// Scores are kept in hundredths, so records that would print the same two-decimal
/// table share a commentary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub symbol: String,
    pub model: ScoringModel,
    /// Sub-scores followed by the overall score, in hundredths
    pub scores: Vec<i64>,
}

impl Fingerprint {
    /// Fingerprint of a score record
    pub fn of(record: &ScoreRecord) -> Self {
        let scores = record
            .sub_scores()
            .into_iter()
            .map(|(_, value)| value)
            .chain(std::iter::once(record.overall_score))
            .map(hundredths)
            .collect();

        Self {
            symbol: record.symbol.clone(),
            model: record.model,
            scores,
        }
    }
}

fn hundredths(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Thread-safe TTL cache shared by the commentary and fundamentals lookups
pub struct TtlCache<K, V> {
    cache: Arc<RwLock<TimedCache<K, V>>>,
}

/// Commentary text keyed by score fingerprint
pub type CommentaryCache = TtlCache<Fingerprint, String>;

/// Company fundamentals keyed by symbol
pub type FundamentalsCache = TtlCache<String, Fundamentals>;

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: Clone,
{
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a value from the cache
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    /// Insert a value into the cache
    pub async fn insert(&self, key: K, value: V) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Get or fetch a value using the provided fetcher function
    ///
    /// Only successful fetches are stored; an error is returned as-is and the next
    /// call for the same key tries again.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!(?key, "cache hit");
            return Ok(value);
        }

        tracing::debug!(?key, "cache miss");

        let value = fetcher().await?;
        self.insert(key, value.clone()).await;

        Ok(value)
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<K, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picker_core::{CanonicalFeatures, DefaultedFields, score};

    fn record(symbol: &str, momentum_pct: f64) -> ScoreRecord {
        let features = CanonicalFeatures {
            momentum_pct,
            rsi: Some(42.0),
            last_volume: 120,
            average_volume: 100.0,
            volume_ratio: Some(1.2),
            pe_ratio: 12.0,
            debt_to_equity: 0.5,
            return_on_equity: 0.2,
            news_sentiment: 0.0,
            defaulted: DefaultedFields::default(),
        };
        score(symbol, &features, ScoringModel::Fundamental).unwrap()
    }

    #[test]
    fn test_fingerprint_rounds_to_hundredths() {
        let a = Fingerprint::of(&record("NVDA", 2.0));
        let b = Fingerprint::of(&record("NVDA", 2.001));
        let c = Fingerprint::of(&record("NVDA", 2.1));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.scores.len(), 5);
        assert_eq!(a.scores[0], 200);
    }

    #[test]
    fn test_fingerprint_depends_on_symbol() {
        assert_ne!(
            Fingerprint::of(&record("AMD", 2.0)),
            Fingerprint::of(&record("NVDA", 2.0))
        );
    }

    #[tokio::test]
    async fn test_cache_insert_and_get() {
        let cache = CommentaryCache::new(Duration::from_secs(60));
        let key = Fingerprint::of(&record("TSLA", 1.0));

        cache.insert(key.clone(), "Hold.".to_string()).await;

        assert_eq!(cache.get(&key).await.as_deref(), Some("Hold."));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_cache_get_or_fetch() {
        let cache = CommentaryCache::new(Duration::from_secs(60));
        let key = Fingerprint::of(&record("PLTR", 3.0));

        let mut call_count = 0;
        let result = cache
            .get_or_fetch(key.clone(), || {
                call_count += 1;
                async { Ok::<_, String>("Buy.".to_string()) }
            })
            .await
            .unwrap();
        assert_eq!(result, "Buy.");
        assert_eq!(call_count, 1);

        let result = cache
            .get_or_fetch(key, || {
                call_count += 1;
                async { Ok::<_, String>("Sell.".to_string()) }
            })
            .await
            .unwrap();
        assert_eq!(result, "Buy.");
        assert_eq!(call_count, 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = CommentaryCache::new(Duration::from_secs(60));
        let key = Fingerprint::of(&record("SOFI", 1.0));

        let result = cache
            .get_or_fetch(key.clone(), || async { Err::<String, _>("timeout") })
            .await;
        assert_eq!(result, Err("timeout"));
        assert!(cache.is_empty().await);

        let result = cache
            .get_or_fetch(key, || async { Ok::<_, &str>("Hold.".to_string()) })
            .await;
        assert_eq!(result, Ok("Hold.".to_string()));
    }

    #[tokio::test]
    async fn test_fundamentals_are_shared_between_clones() {
        let cache = FundamentalsCache::new(Duration::from_secs(3_600));
        let shared = cache.clone();

        let fetched = cache
            .get_or_fetch("MC.PA".to_string(), || async {
                Ok::<_, String>(Fundamentals {
                    pe_ratio: Some(24.0),
                    ..Default::default()
                })
            })
            .await
            .unwrap();
        assert_eq!(fetched.pe_ratio, Some(24.0));

        let again = shared
            .get_or_fetch("MC.PA".to_string(), || async {
                Err::<Fundamentals, _>("should not be called".to_string())
            })
            .await
            .unwrap();
        assert_eq!(again.pe_ratio, Some(24.0));
        assert_eq!(shared.len().await, 1);
    }
}
