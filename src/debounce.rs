//! Pending-write slots.
//!
//! A slot holds at most one value per key. Pushing replaces the held value and
//! restarts the quiet period, so a burst of edits collapses into a single
//! write carrying the latest value. Timers that wake for a replaced value find
//! a newer generation in the slot and do nothing. A value whose write fails
//! goes back into its slot unless a newer one arrived meanwhile.

use async_trait::async_trait;
use dashmap::DashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::ServiceError;
use crate::metrics::PENDING_WRITES_SUPERSEDED;

/// Destination of flushed values
#[async_trait]
pub trait WriteSink<K, V>: Send + Sync + 'static {
    async fn write(&self, key: K, value: V) -> Result<(), ServiceError>;
}

struct Slot<V> {
    generation: u64,
    value: V,
}

struct Inner<K, V> {
    name: &'static str,
    quiet_period: Duration,
    slots: DashMap<K, Slot<V>>,
    next_generation: AtomicU64,
    sink: Arc<dyn WriteSink<K, V>>,
}

/// Replace-not-queue write buffer keyed by `K`
pub struct PendingWrites<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for PendingWrites<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Outcome of draining every slot
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushSummary {
    pub written: usize,
    pub failed: usize,
}

impl FlushSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl std::ops::Add for FlushSummary {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            written: self.written + other.written,
            failed: self.failed + other.failed,
        }
    }
}

impl<K, V> Inner<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn write_or_restore(&self, key: K, slot: Slot<V>) -> Result<(), ServiceError> {
        match self.sink.write(key.clone(), slot.value.clone()).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.slots.entry(key).or_insert(slot);
                Err(e)
            }
        }
    }
}

impl<K, V> PendingWrites<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(
        name: &'static str,
        quiet_period: Duration,
        sink: Arc<dyn WriteSink<K, V>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                quiet_period,
                slots: DashMap::new(),
                next_generation: AtomicU64::new(1),
                sink,
            }),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.inner.quiet_period
    }

    /// Stores `value` for `key` and restarts its quiet period
    pub fn push(&self, key: K, value: V) -> u64 {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let replaced = self
            .inner
            .slots
            .insert(key.clone(), Slot { generation, value });
        if replaced.is_some() {
            PENDING_WRITES_SUPERSEDED
                .with_label_values(&[self.inner.name])
                .inc();
        }

        let deadline = tokio::time::Instant::now() + self.inner.quiet_period;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let taken = inner
                .slots
                .remove_if(&key, |_, slot| slot.generation == generation);
            match taken {
                Some((key, slot)) => {
                    if let Err(e) = inner.write_or_restore(key.clone(), slot).await {
                        warn!(slot = inner.name, ?key, error = %e, "debounced write failed, value kept");
                    }
                }
                None => debug!(slot = inner.name, generation, "superseded timer woke"),
            }
        });

        generation
    }

    /// Writes the pending value for `key` now. Returns whether anything was pending.
    pub async fn flush(&self, key: &K) -> Result<bool, ServiceError> {
        match self.inner.slots.remove(key) {
            Some((key, slot)) => {
                self.inner.write_or_restore(key, slot).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Attempts every pending value, e.g. during shutdown. Failed values stay pending.
    pub async fn flush_all(&self) -> FlushSummary {
        let keys: Vec<K> = self.inner.slots.iter().map(|e| e.key().clone()).collect();
        let mut summary = FlushSummary::default();
        for key in keys {
            match self.flush(&key).await {
                Ok(true) => summary.written += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(slot = self.inner.name, ?key, error = %e, "pending write failed during flush");
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.inner.slots.contains_key(key)
    }

    pub fn pending_len(&self) -> usize {
        self.inner.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<(u32, String)>>,
    }

    #[async_trait]
    impl WriteSink<u32, String> for RecordingSink {
        async fn write(&self, key: u32, value: String) -> Result<(), ServiceError> {
            self.writes.lock().unwrap().push((key, value));
            Ok(())
        }
    }

    fn slots(sink: Arc<RecordingSink>) -> PendingWrites<u32, String> {
        PendingWrites::new("test", Duration::from_millis(2500), sink)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_single_latest_write() {
        let sink = Arc::new(RecordingSink::default());
        let pending = slots(sink.clone());

        for i in 0..5 {
            pending.push(7, format!("edit {}", i));
            tokio::time::advance(Duration::from_millis(400)).await;
        }
        assert!(sink.writes.lock().unwrap().is_empty());

        tokio::time::advance(Duration::from_millis(2500)).await;
        settle().await;

        assert_eq!(*sink.writes.lock().unwrap(), vec![(7, "edit 4".to_string())]);
        assert!(!pending.is_pending(&7));
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_written_inside_quiet_period() {
        let sink = Arc::new(RecordingSink::default());
        let pending = slots(sink.clone());

        pending.push(1, "a".into());
        tokio::time::advance(Duration::from_millis(2499)).await;
        settle().await;
        assert!(sink.writes.lock().unwrap().is_empty());
        assert!(pending.is_pending(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let sink = Arc::new(RecordingSink::default());
        let pending = slots(sink.clone());

        pending.push(1, "one".into());
        pending.push(2, "two".into());
        tokio::time::advance(Duration::from_millis(3000)).await;
        settle().await;

        let mut writes = sink.writes.lock().unwrap().clone();
        writes.sort();
        assert_eq!(writes, vec![(1, "one".into()), (2, "two".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_now_and_cancels_timer() {
        let sink = Arc::new(RecordingSink::default());
        let pending = slots(sink.clone());

        pending.push(3, "draft".into());
        assert!(pending.flush(&3).await.unwrap());
        assert!(!pending.flush(&3).await.unwrap());

        tokio::time::advance(Duration::from_millis(5000)).await;
        settle().await;
        assert_eq!(*sink.writes.lock().unwrap(), vec![(3, "draft".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_all_drains_every_slot() {
        let sink = Arc::new(RecordingSink::default());
        let pending = slots(sink.clone());

        pending.push(1, "x".into());
        pending.push(2, "y".into());
        assert_eq!(
            pending.flush_all().await,
            FlushSummary {
                written: 2,
                failed: 0
            }
        );
        assert_eq!(pending.pending_len(), 0);
    }

    /// Fails every write for one key
    struct FlakySink {
        failing: u32,
        writes: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl WriteSink<u32, String> for FlakySink {
        async fn write(&self, key: u32, _value: String) -> Result<(), ServiceError> {
            if key == self.failing {
                return Err(ServiceError::InternalError("disk full".into()));
            }
            self.writes.lock().unwrap().push(key);
            Ok(())
        }
    }

    fn flaky(failing: u32) -> Arc<FlakySink> {
        Arc::new(FlakySink {
            failing,
            writes: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn failed_flush_keeps_the_value() {
        let sink = flaky(1);
        let pending = PendingWrites::new("test", Duration::from_secs(60), sink.clone());

        pending.push(1, "keep me".into());
        assert!(pending.flush(&1).await.is_err());
        assert!(pending.is_pending(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn flush_all_attempts_every_key_past_a_failure() {
        let sink = flaky(1);
        let pending = PendingWrites::new("test", Duration::from_secs(60), sink.clone());

        for key in 0..20 {
            pending.push(key, format!("value {}", key));
        }
        let summary = pending.flush_all().await;

        assert_eq!(
            summary,
            FlushSummary {
                written: 19,
                failed: 1
            }
        );
        assert!(!summary.is_clean());
        assert_eq!(sink.writes.lock().unwrap().len(), 19);
        assert_eq!(pending.pending_len(), 1);
        assert!(pending.is_pending(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_timer_write_stays_pending() {
        let sink = flaky(4);
        let pending = PendingWrites::new("test", Duration::from_millis(100), sink.clone());

        pending.push(4, "retry later".into());
        tokio::time::advance(Duration::from_millis(200)).await;
        settle().await;

        assert!(pending.is_pending(&4));
    }
}
