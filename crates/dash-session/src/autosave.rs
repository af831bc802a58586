//! Debounced autosave
//!
//! The first observed value becomes the baseline and is not saved. Each
//! later value that serializes differently from the last observed one
//! (re)starts the quiet-period timer; when it elapses the latest value is
//! saved. A save already in flight suppresses the trigger instead of
//! queueing a follow-up. Failed saves are logged and not retried.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dash_schema::TenantConfig;
use dash_store::{tenant_key, StorageAdapter};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::error::SessionResult;

/// Where autosaved values go
#[async_trait]
pub trait SaveTarget<T>: Send + Sync {
    async fn save(&self, value: &T) -> SessionResult<()>;
}

/// Saves tenant configurations through a storage adapter
#[derive(Clone)]
pub struct TenantSaveTarget {
    store: Arc<dyn StorageAdapter>,
}

impl TenantSaveTarget {
    #[must_use]
    pub fn new(store: Arc<dyn StorageAdapter>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SaveTarget<TenantConfig> for TenantSaveTarget {
    async fn save(&self, value: &TenantConfig) -> SessionResult<()> {
        let document = serde_json::to_value(value)?;
        self.store.set(&tenant_key(&value.id), document).await?;
        Ok(())
    }
}

/// Counters of one controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutosaveStats {
    /// Timers started by a changed value
    pub scheduled: u64,
    pub saved: u64,
    pub failed: u64,
    /// Triggers dropped because a save was in flight
    pub suppressed: u64,
}

#[derive(Default)]
struct Counters {
    scheduled: AtomicU64,
    saved: AtomicU64,
    failed: AtomicU64,
    suppressed: AtomicU64,
}

struct Pending<T> {
    snapshot: Option<String>,
    latest: Option<T>,
    timer: Option<JoinHandle<()>>,
}

struct Inner<T> {
    target: Arc<dyn SaveTarget<T>>,
    delay: Duration,
    pending: Mutex<Pending<T>>,
    busy: AtomicBool,
    counters: Counters,
}

/// Debounced, single-flight autosave of a watched value
///
/// Must be used from within a tokio runtime.
pub struct AutosaveController<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for AutosaveController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> AutosaveController<T>
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(target: Arc<dyn SaveTarget<T>>, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                target,
                delay,
                pending: Mutex::new(Pending {
                    snapshot: None,
                    latest: None,
                    timer: None,
                }),
                busy: AtomicBool::new(false),
                counters: Counters::default(),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Report the current value of the watched configuration
    ///
    /// Returns whether a save was scheduled.
    pub fn observe(&self, value: &T) -> bool {
        let snapshot = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "autosave could not serialize value");
                return false;
            }
        };

        let mut pending = self.inner.pending.lock();
        match pending.snapshot.as_deref() {
            None => {
                pending.snapshot = Some(snapshot);
                return false;
            }
            Some(previous) if previous == snapshot => return false,
            Some(_) => {}
        }
        pending.snapshot = Some(snapshot);
        pending.latest = Some(value.clone());
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }

        let inner = Arc::clone(&self.inner);
        pending.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            // Detached so a later abort of this timer cannot cut a save short.
            tokio::spawn(Inner::save_latest(inner));
        }));
        self.inner.counters.scheduled.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Record `value` as already persisted, dropping any pending save
    pub fn rebase(&self, value: &T) {
        let mut pending = self.inner.pending.lock();
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }
        pending.latest = None;
        pending.snapshot = serde_json::to_string(value).ok();
    }

    /// Cancel the pending timer and save its value now
    ///
    /// Returns whether a save ran.
    pub async fn flush(&self) -> bool {
        let has_pending = {
            let mut pending = self.inner.pending.lock();
            if let Some(timer) = pending.timer.take() {
                timer.abort();
            }
            pending.latest.is_some()
        };
        if !has_pending {
            return false;
        }
        Inner::save_latest(Arc::clone(&self.inner)).await
    }

    /// Drop the pending save, if any
    pub fn cancel(&self) {
        let mut pending = self.inner.pending.lock();
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }
        pending.latest = None;
    }

    #[inline]
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.inner.pending.lock().latest.is_some()
    }

    #[must_use]
    pub fn stats(&self) -> AutosaveStats {
        let c = &self.inner.counters;
        AutosaveStats {
            scheduled: c.scheduled.load(Ordering::Relaxed),
            saved: c.saved.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            suppressed: c.suppressed.load(Ordering::Relaxed),
        }
    }
}

impl<T> Inner<T>
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    async fn save_latest(inner: Arc<Self>) -> bool {
        if inner.busy.swap(true, Ordering::AcqRel) {
            inner.counters.suppressed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("autosave already in flight, skipping trigger");
            return false;
        }
        let latest = inner.pending.lock().latest.take();
        let Some(value) = latest else {
            inner.busy.store(false, Ordering::Release);
            return false;
        };

        let result = inner.target.save(&value).await;
        inner.busy.store(false, Ordering::Release);

        match result {
            Ok(()) => {
                inner.counters.saved.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("autosave complete");
                true
            }
            Err(e) => {
                inner.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(error = %e, "autosave failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use dash_store::StoreError;
    use serde_json::{json, Value as JsonValue};

    #[derive(Default)]
    struct Recorder {
        saved: Mutex<Vec<JsonValue>>,
        delay: Option<Duration>,
        fail: bool,
    }

    #[async_trait]
    impl SaveTarget<JsonValue> for Recorder {
        async fn save(&self, value: &JsonValue) -> SessionResult<()> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(SessionError::Store(StoreError::Backend("down".into())));
            }
            self.saved.lock().push(value.clone());
            Ok(())
        }
    }

    fn controller(recorder: Recorder) -> (Arc<Recorder>, AutosaveController<JsonValue>) {
        let recorder = Arc::new(recorder);
        let controller = AutosaveController::new(recorder.clone(), Duration::from_millis(2000));
        (recorder, controller)
    }

    #[tokio::test(start_paused = true)]
    async fn first_observation_is_baseline() {
        let (recorder, autosave) = controller(Recorder::default());
        assert!(!autosave.observe(&json!({"v": 0})));
        assert!(!autosave.observe(&json!({"v": 0})));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(recorder.saved.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_one_save() {
        let (recorder, autosave) = controller(Recorder::default());
        autosave.observe(&json!({"v": 0}));

        for v in 1..=3 {
            autosave.observe(&json!({ "v": v }));
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(recorder.saved.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(*recorder.saved.lock(), vec![json!({"v": 3})]);
        assert_eq!(autosave.stats().saved, 1);
        assert_eq!(autosave.stats().scheduled, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_save_suppresses_trigger() {
        let (recorder, autosave) = controller(Recorder {
            delay: Some(Duration::from_secs(10)),
            ..Recorder::default()
        });
        autosave.observe(&json!(0));
        autosave.observe(&json!(1));
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert!(autosave.is_saving());

        autosave.observe(&json!(2));
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(autosave.stats().suppressed, 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(*recorder.saved.lock(), vec![json!(1)]);
        assert!(autosave.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_counted_not_retried() {
        let (_, autosave) = controller(Recorder {
            fail: true,
            ..Recorder::default()
        });
        autosave.observe(&json!(0));
        autosave.observe(&json!(1));
        tokio::time::sleep(Duration::from_secs(10)).await;

        let stats = autosave.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.saved, 0);
        assert!(!autosave.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn flush_saves_immediately() {
        let (recorder, autosave) = controller(Recorder::default());
        autosave.observe(&json!(0));
        autosave.observe(&json!(1));

        assert!(autosave.flush().await);
        assert_eq!(*recorder.saved.lock(), vec![json!(1)]);
        assert!(!autosave.flush().await);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(recorder.saved.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rebase_drops_pending() {
        let (recorder, autosave) = controller(Recorder::default());
        autosave.observe(&json!(0));
        autosave.observe(&json!(1));
        autosave.rebase(&json!(1));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(recorder.saved.lock().is_empty());
        assert!(!autosave.observe(&json!(1)));
    }
}
