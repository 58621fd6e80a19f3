//! Single-slot TTL cache for the last whale snapshot.
//!
//! There is no single-flight: two requests that miss together both run the
//! pipeline and the later `store` wins. Snapshots are replaced whole, never
//! merged.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::WhaleSnapshot;

/// Time source, swappable in tests
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

pub struct WhaleCache {
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    slot: RwLock<Option<WhaleSnapshot>>,
}

impl WhaleCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock,
            slot: RwLock::new(None),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The cached snapshot while it is younger than the TTL
    pub async fn fresh(&self) -> Option<WhaleSnapshot> {
        let slot = self.slot.read().await;
        let snapshot = slot.as_ref()?;
        let age = self.clock.now() - snapshot.fetched_at;
        if age < self.ttl {
            debug!("Cache hit (age {}s)", age.num_seconds());
            Some(snapshot.clone())
        } else {
            debug!("Cache stale (age {}s)", age.num_seconds());
            None
        }
    }

    /// Overwrite the slot unconditionally
    pub async fn store(&self, snapshot: WhaleSnapshot) {
        *self.slot.write().await = Some(snapshot);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::WhaleStats;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    /// Clock that only moves when told to
    pub(crate) struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        pub(crate) fn new(start: DateTime<Utc>) -> Self {
            Self(Mutex::new(start))
        }

        pub(crate) fn advance(&self, secs: i64) {
            let mut now = self.0.lock().unwrap();
            *now += TimeDelta::seconds(secs);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn snapshot(at: DateTime<Utc>, price: i64) -> WhaleSnapshot {
        WhaleSnapshot {
            transactions: vec![],
            wallets: vec![],
            stats: WhaleStats::default(),
            price: Decimal::from(price),
            fetched_at: at,
        }
    }

    #[tokio::test]
    async fn empty_cache_misses() {
        let cache = WhaleCache::new(Duration::from_secs(60), Arc::new(SystemClock));
        assert!(cache.fresh().await.is_none());
    }

    #[tokio::test]
    async fn serves_within_ttl_and_expires_after() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let cache = WhaleCache::new(Duration::from_secs(60), clock.clone());

        cache.store(snapshot(start, 1)).await;
        clock.advance(59);
        assert_eq!(cache.fresh().await, Some(snapshot(start, 1)));

        clock.advance(1);
        assert!(cache.fresh().await.is_none());
    }

    #[tokio::test]
    async fn store_replaces_previous_snapshot() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let cache = WhaleCache::new(Duration::from_secs(60), clock.clone());

        cache.store(snapshot(start, 1)).await;
        cache.store(snapshot(start, 2)).await;
        assert_eq!(cache.fresh().await.unwrap().price, Decimal::from(2));
    }
}
