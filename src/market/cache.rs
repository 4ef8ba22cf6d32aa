//! TTL cache of market signals, backed by the durable store

use crate::error::Result;
use crate::input::store::SkillStore;
use crate::market::MarketSignal;
use crate::processing::profile::canonical_name;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.millis.store(to.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

/// In-memory signal map in front of the store.
///
/// Entries are recomputable, so concurrent writers of one key simply
/// overwrite each other. Durable rows are pulled in lazily on a memory miss.
pub struct SignalCache {
    entries: RwLock<HashMap<String, MarketSignal>>,
    store: Arc<dyn SkillStore>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
}

impl SignalCache {
    pub fn new(store: Arc<dyn SkillStore>, clock: Arc<dyn Clock>, ttl: chrono::Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            store,
            clock,
            ttl,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Fresh signal for `skill`, if memory or the store holds one. Never fetches.
    pub async fn peek(&self, skill: &str) -> Option<MarketSignal> {
        let key = canonical_name(skill);
        let now = self.now();

        if let Some(signal) = self.entries.read().await.get(&key) {
            if signal.is_fresh(now, self.ttl) {
                debug!("Signal cache hit for '{}'", key);
                return Some(signal.clone());
            }
        }

        match self.store.get_signal(&key).await {
            Ok(Some(signal)) if signal.is_fresh(now, self.ttl) => {
                debug!("Warmed signal for '{}' from the store", key);
                self.entries.write().await.insert(key, signal.clone());
                Some(signal)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Reading stored signal for '{}' failed: {}", key, e);
                None
            }
        }
    }

    /// Cache `signal` and persist it. The memory entry is written even when
    /// persisting fails; the store error is returned for the caller to log.
    pub async fn put(&self, signal: MarketSignal) -> Result<()> {
        let key = canonical_name(&signal.skill);
        self.entries.write().await.insert(key, signal.clone());
        self.store.upsert_signal(signal).await
    }

    pub async fn invalidate(&self, skill: &str) {
        self.entries.write().await.remove(&canonical_name(skill));
    }

    /// Every fresh signal known to memory or the store, by skill name
    pub async fn fresh_signals(&self) -> Result<Vec<MarketSignal>> {
        let now = self.now();
        let mut merged: HashMap<String, MarketSignal> = HashMap::new();

        for signal in self.store.list_signals().await? {
            merged.insert(canonical_name(&signal.skill), signal);
        }
        for (key, signal) in self.entries.read().await.iter() {
            let newer = merged
                .get(key)
                .map_or(true, |stored| stored.last_updated <= signal.last_updated);
            if newer {
                merged.insert(key.clone(), signal.clone());
            }
        }

        let mut fresh: Vec<MarketSignal> = merged.into_values().filter(|s| s.is_fresh(now, self.ttl)).collect();
        fresh.sort_by(|a, b| a.skill.cmp(&b.skill));
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::store::MemoryStore;
    use crate::market::Trend;

    fn signal(skill: &str, at: DateTime<Utc>) -> MarketSignal {
        MarketSignal {
            skill: skill.to_string(),
            trend: Trend::Rising,
            score: 0.7,
            job_count: 500,
            avg_salary: 100_000.0,
            sources: vec!["github".to_string()],
            last_updated: at,
        }
    }

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        clock.advance(chrono::Duration::hours(2));
        assert_eq!(
            clock.now().timestamp_millis(),
            (start + chrono::Duration::hours(2)).timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_peek_respects_ttl() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = SignalCache::new(Arc::new(MemoryStore::new()), clock.clone(), chrono::Duration::hours(24));

        cache.put(signal("rust", clock.now())).await.unwrap();
        assert!(cache.peek("Rust").await.is_some());

        clock.advance(chrono::Duration::hours(25));
        assert!(cache.peek("rust").await.is_none());
    }

    #[tokio::test]
    async fn test_peek_warms_from_store() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        store.upsert_signal(signal("go", clock.now())).await.unwrap();

        let cache = SignalCache::new(store, clock, chrono::Duration::hours(24));
        assert_eq!(cache.peek("go").await.unwrap().score, 0.7);
    }

    #[tokio::test]
    async fn test_fresh_signals_skips_stale() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        store
            .upsert_signal(signal("cobol", clock.now() - chrono::Duration::hours(48)))
            .await
            .unwrap();

        let cache = SignalCache::new(store, clock.clone(), chrono::Duration::hours(24));
        cache.put(signal("rust", clock.now())).await.unwrap();

        let fresh = cache.fresh_signals().await.unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].skill, "rust");
    }
}
