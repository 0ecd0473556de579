//! Thread identifier to storage unit resolution.
//!
//! The locator keeps at most one actor per thread identifier. The first
//! resolve of an identifier opens its unit through the [`UnitFactory`] and
//! spawns the actor; every later resolve returns a handle to that same actor.
//! Concurrent first resolves of one identifier open the unit exactly once.
//!
//! Units are not kept forever. An entry is released when its actor has been
//! idle past the idle timeout, or when the resident count exceeds the cap
//! (least recently resolved first). Either way an entry is only removed while
//! the map holds the sole handle, and handles are only cloned out under the
//! map's lock, so a caller's handle always addresses a live actor and no two
//! actors ever serve one identifier at the same time. A released thread is
//! reopened from its backing storage on the next resolve.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use threadkeep_types::error::ThreadStoreError;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::actor::{IdlePolicy, ThreadHandle};
use super::store::UnitFactory;

/// One resident (or opening) thread.
struct Slot {
    handle: OnceCell<ThreadHandle>,
    last_used: AtomicU64,
}

impl Slot {
    fn new(tick: u64) -> Self {
        Self {
            handle: OnceCell::new(),
            last_used: AtomicU64::new(tick),
        }
    }

    /// Opened, and nobody outside the map holds its handle.
    fn is_idle(&self) -> bool {
        self.handle.get().is_some_and(ThreadHandle::is_sole_handle)
    }
}

type Units = DashMap<String, Arc<Slot>>;

/// Remove `slot` from `units` if it is still the entry for `thread_id` and idle.
fn release(units: &Units, thread_id: &str, slot: *const Slot) -> bool {
    units
        .remove_if(thread_id, |_, current| {
            std::ptr::eq(Arc::as_ptr(current), slot) && current.is_idle()
        })
        .is_some()
}

/// Resolves thread identifiers to their single storage-unit actor.
pub struct ThreadLocator<F: UnitFactory> {
    factory: F,
    mailbox_capacity: usize,
    idle_timeout: Option<Duration>,
    max_resident: Option<usize>,
    clock: AtomicU64,
    units: Arc<Units>,
}

impl<F: UnitFactory> ThreadLocator<F> {
    /// Create a locator opening units through `factory`. Units stay resident
    /// until a cap or idle timeout is configured.
    pub fn new(factory: F, mailbox_capacity: usize) -> Self {
        Self {
            factory,
            mailbox_capacity,
            idle_timeout: None,
            max_resident: None,
            clock: AtomicU64::new(0),
            units: Arc::new(DashMap::new()),
        }
    }

    /// Release a unit after its actor has been idle this long. Zero disables.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout).filter(|d| !d.is_zero());
        self
    }

    /// Keep at most this many units resident while their handles are unused.
    pub fn with_max_resident(mut self, max_resident: usize) -> Self {
        self.max_resident = Some(max_resident.max(1));
        self
    }

    /// Access the unit factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Resolve `thread_id` to its actor, opening the unit on first use.
    ///
    /// If opening fails (e.g. schema setup is rejected) the error is returned
    /// and nothing is cached, so the next resolve tries again.
    pub async fn resolve(&self, thread_id: &str) -> Result<ThreadHandle, ThreadStoreError> {
        loop {
            if let Some(handle) = self.resident(thread_id) {
                debug!(thread_id, "resolved thread");
                return Ok(handle);
            }

            let (slot, inserted) = match self.units.entry(thread_id.to_string()) {
                Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
                Entry::Vacant(entry) => {
                    let slot = Arc::new(Slot::new(self.tick()));
                    entry.insert(Arc::clone(&slot));
                    (slot, true)
                }
            };
            if inserted {
                self.enforce_cap();
            }

            let opened = slot
                .handle
                .get_or_try_init(|| self.open(thread_id, &slot))
                .await;
            if let Err(err) = opened {
                self.units.remove_if(thread_id, |_, current| {
                    Arc::ptr_eq(current, &slot) && current.handle.get().is_none()
                });
                return Err(err);
            }
            // The handle is taken under the map lock on the next pass.
        }
    }

    /// Number of identifiers with a resident (or opening) unit.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Clone the handle of an opened unit while holding its map entry.
    fn resident(&self, thread_id: &str) -> Option<ThreadHandle> {
        let slot = self.units.get(thread_id)?;
        let handle = slot.handle.get()?.clone();
        slot.last_used.store(self.tick(), Ordering::Relaxed);
        Some(handle)
    }

    async fn open(&self, thread_id: &str, slot: &Arc<Slot>) -> Result<ThreadHandle, ThreadStoreError> {
        let unit = self.factory.open(thread_id).await?;
        info!(thread_id, resident = self.units.len(), "opened thread storage unit");

        let idle = self.idle_timeout.map(|timeout| {
            let units: Weak<Units> = Arc::downgrade(&self.units);
            let slot: Weak<Slot> = Arc::downgrade(slot);
            let thread_id = thread_id.to_string();
            IdlePolicy {
                timeout,
                retire: Box::new(move || {
                    units
                        .upgrade()
                        .is_some_and(|units| release(&units, &thread_id, slot.as_ptr()))
                }),
            }
        });

        Ok(ThreadHandle::spawn_with(
            thread_id,
            unit,
            self.mailbox_capacity,
            idle,
        ))
    }

    /// Release least recently resolved idle units until under the cap.
    fn enforce_cap(&self) {
        let Some(max_resident) = self.max_resident else {
            return;
        };

        while self.units.len() > max_resident {
            let oldest = self
                .units
                .iter()
                .filter(|entry| entry.value().is_idle())
                .min_by_key(|entry| entry.value().last_used.load(Ordering::Relaxed))
                .map(|entry| (entry.key().clone(), Arc::clone(entry.value())));

            let Some((thread_id, slot)) = oldest else {
                // Everything resident is in use right now.
                break;
            };
            if release(&self.units, &thread_id, Arc::as_ptr(&slot)) {
                debug!(thread_id = %thread_id, "evicted least recently used thread unit");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::testing::{MemoryFactory, text_message};

    #[tokio::test]
    async fn test_same_id_resolves_to_same_unit() {
        let locator = ThreadLocator::new(MemoryFactory::default(), 8);

        let a = locator.resolve("t1").await.unwrap();
        let b = locator.resolve("t1").await.unwrap();
        assert!(a.same_unit(&b));

        a.append_message(text_message("m1", "2024-01-01T00:00:00Z", "hi"))
            .await
            .unwrap();
        assert_eq!(b.get_messages().await.unwrap().len(), 1);
        assert_eq!(locator.factory().opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_ids_are_isolated() {
        let locator = ThreadLocator::new(MemoryFactory::default(), 8);

        let a = locator.resolve("t1").await.unwrap();
        let b = locator.resolve("t2").await.unwrap();
        assert!(!a.same_unit(&b));

        a.append_message(text_message("m1", "2024-01-01T00:00:00Z", "hi"))
            .await
            .unwrap();
        assert!(b.get_messages().await.unwrap().is_empty());
        assert_eq!(locator.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_first_resolves_open_once() {
        let locator = Arc::new(ThreadLocator::new(MemoryFactory::default(), 8));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let locator = Arc::clone(&locator);
            tasks.push(tokio::spawn(async move { locator.resolve("shared").await }));
        }
        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap().unwrap());
        }

        assert_eq!(locator.factory().opens.load(Ordering::SeqCst), 1);
        assert!(handles.iter().all(|h| h.same_unit(&handles[0])));
    }

    #[tokio::test]
    async fn test_failed_open_is_not_cached() {
        let factory = MemoryFactory::default();
        factory.failing.lock().unwrap().push("bad".to_string());
        let locator = ThreadLocator::new(factory, 8);

        let err = locator.resolve("bad").await.err().unwrap();
        assert!(matches!(err, ThreadStoreError::StorageUnavailable(_)));
        assert!(locator.is_empty());

        locator.factory().failing.lock().unwrap().clear();
        let handle = locator.resolve("bad").await.unwrap();
        assert!(handle.get_messages().await.unwrap().is_empty());
        assert_eq!(locator.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_locator() {
        let locator = ThreadLocator::new(MemoryFactory::default(), 8);
        assert!(locator.is_empty());
        locator.resolve("t1").await.unwrap();
        assert!(!locator.is_empty());
    }

    #[tokio::test]
    async fn test_cap_bounds_resident_units_and_reopens_evicted_threads() {
        let locator = ThreadLocator::new(MemoryFactory::default(), 8).with_max_resident(4);

        for i in 0..40 {
            let handle = locator.resolve(&format!("t{i}")).await.unwrap();
            handle
                .append_message(text_message(&format!("m{i}"), "2024-01-01T00:00:00Z", "x"))
                .await
                .unwrap();
            assert!(locator.len() <= 5, "resident units: {}", locator.len());
        }
        assert!(locator.len() <= 4);

        let first = locator.resolve("t0").await.unwrap();
        let ids: Vec<String> = first
            .get_messages()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["m0"]);
        assert!(locator.factory().opens.load(Ordering::SeqCst) > 40);
    }

    #[tokio::test]
    async fn test_cap_keeps_units_with_live_handles() {
        let locator = ThreadLocator::new(MemoryFactory::default(), 8).with_max_resident(1);

        let held = locator.resolve("held").await.unwrap();
        for i in 0..5 {
            locator.resolve(&format!("t{i}")).await.unwrap();
        }

        let again = locator.resolve("held").await.unwrap();
        assert!(held.same_unit(&again));
        assert_eq!(locator.factory().opens.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_evicted_unit_is_closed() {
        let locator = ThreadLocator::new(MemoryFactory::default(), 8).with_max_resident(1);

        locator.resolve("t1").await.unwrap();
        locator.resolve("t2").await.unwrap();

        let closes = Arc::clone(&locator.factory().closes);
        for _ in 0..100 {
            if closes.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(locator.len(), 1);
    }

    #[tokio::test]
    async fn test_idle_unit_is_released_and_reopened() {
        let locator =
            ThreadLocator::new(MemoryFactory::default(), 8).with_idle_timeout(Duration::from_millis(20));

        let handle = locator.resolve("t1").await.unwrap();
        handle
            .append_message(text_message("m1", "2024-01-01T00:00:00Z", "hi"))
            .await
            .unwrap();
        drop(handle);

        for _ in 0..100 {
            if locator.is_empty() && locator.factory().closes.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(locator.is_empty());
        assert_eq!(locator.factory().closes.load(Ordering::SeqCst), 1);

        let handle = locator.resolve("t1").await.unwrap();
        assert_eq!(handle.message_count().await.unwrap(), 1);
        assert_eq!(locator.factory().opens.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_idle_unit_with_live_handle_stays_resident() {
        let locator =
            ThreadLocator::new(MemoryFactory::default(), 8).with_idle_timeout(Duration::from_millis(10));

        let handle = locator.resolve("t1").await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(locator.len(), 1);
        handle
            .append_message(text_message("m1", "2024-01-01T00:00:00Z", "hi"))
            .await
            .unwrap();
        let again = locator.resolve("t1").await.unwrap();
        assert!(handle.same_unit(&again));
        assert_eq!(locator.factory().closes.load(Ordering::SeqCst), 0);
    }
}
