//! In-memory transactional store.
//!
//! # Responsibilities
//! - Hand out fresh, never-reused ids
//! - Run read-modify-write transactions atomically per id
//! - Keep tombstones so deleted ids can be told apart from unknown ids

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::observability::metrics;
use crate::store::entry::Entry;
use crate::store::error::{StoreError, StoreResult};

/// How `create` mints new ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// Decimal counter starting at 1.
    #[default]
    Sequential,
    /// Random UUIDv4 strings.
    Uuid,
}

/// Result of a create-or-replace transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted {
    pub entry: Entry,
    /// True when no live entry existed before the transaction.
    pub created: bool,
}

#[derive(Debug)]
enum Slot {
    /// Reserved by an upsert that has not committed yet.
    Vacant,
    Live(Entry),
    Tombstone,
}

type SharedSlot = Arc<Mutex<Slot>>;

struct StoreInner {
    slots: DashMap<String, SharedSlot>,
    clock: AtomicU64,
    sequence: AtomicU64,
    live: AtomicUsize,
    strategy: IdStrategy,
}

/// Thread-safe store of versioned JSON entries.
///
/// Cloning is cheap and every clone shares the same data.
#[derive(Clone)]
pub struct ResourceStore {
    inner: Arc<StoreInner>,
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new(IdStrategy::default())
    }
}

impl std::fmt::Debug for ResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore")
            .field("strategy", &self.inner.strategy)
            .field("live", &self.len())
            .finish()
    }
}

impl ResourceStore {
    /// Create an empty store.
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                slots: DashMap::new(),
                clock: AtomicU64::new(0),
                sequence: AtomicU64::new(0),
                live: AtomicUsize::new(0),
                strategy,
            }),
        }
    }

    /// Read the current entry, if it is live.
    pub fn read(&self, id: &str) -> StoreResult<Option<Entry>> {
        let Some(slot) = self.slot(id) else {
            return Ok(None);
        };
        let guard = lock(id, &slot)?;
        Ok(match &*guard {
            Slot::Live(entry) => Some(entry.clone()),
            Slot::Vacant | Slot::Tombstone => None,
        })
    }

    /// Store a new value under a freshly generated id.
    pub fn create(&self, value: Value) -> StoreResult<String> {
        loop {
            let id = self.generate_id();
            // Ids claimed through `upsert` are skipped, never overwritten.
            if let MapEntry::Vacant(vacant) = self.inner.slots.entry(id.clone()) {
                let entry = self.stamp(&id, value);
                vacant.insert(Arc::new(Mutex::new(Slot::Live(entry))));
                self.record_created();
                tracing::debug!(id = %id, "Entry created");
                return Ok(id);
            }
        }
    }

    /// Replace an entry's value with the result of `transform`.
    ///
    /// The transform sees the committed entry and runs while the id is locked,
    /// so concurrent updates to the same id are serialised. The version is
    /// bumped even when the value is unchanged.
    pub fn update<F>(&self, id: &str, transform: F) -> StoreResult<Entry>
    where
        F: FnOnce(&Entry) -> StoreResult<Value>,
    {
        self.update_if(id, None, transform)
    }

    /// `update` that only commits while the entry is still at `expected`.
    ///
    /// With an expected version, a changed, deleted or missing entry fails
    /// with `Stale` and the transform never runs.
    pub fn update_if<F>(&self, id: &str, expected: Option<u64>, transform: F) -> StoreResult<Entry>
    where
        F: FnOnce(&Entry) -> StoreResult<Value>,
    {
        let stale = |found| StoreError::Stale {
            id: id.to_string(),
            expected: expected.unwrap_or_default(),
            found,
        };

        let Some(slot) = self.slot(id) else {
            return Err(match expected {
                Some(_) => stale(None),
                None => StoreError::NotFound(id.to_string()),
            });
        };
        let mut guard = lock(id, &slot)?;

        let current = match (&*guard, expected) {
            (Slot::Live(entry), Some(version)) if entry.version != version => {
                return Err(stale(Some(entry.version)));
            }
            (Slot::Live(entry), _) => entry,
            (Slot::Tombstone | Slot::Vacant, Some(_)) => return Err(stale(None)),
            (Slot::Tombstone, None) => return Err(StoreError::Gone(id.to_string())),
            (Slot::Vacant, None) => return Err(StoreError::NotFound(id.to_string())),
        };

        let value = transform(current)?;
        let entry = self.stamp(id, value);
        *guard = Slot::Live(entry.clone());

        tracing::debug!(id = %id, version = entry.version, "Entry updated");
        Ok(entry)
    }

    /// Create or replace the entry at a caller-chosen id.
    ///
    /// `f` receives the live entry, if any. A tombstoned id is revived.
    pub fn upsert<F>(&self, id: &str, f: F) -> StoreResult<Upserted>
    where
        F: FnOnce(Option<&Entry>) -> StoreResult<Value>,
    {
        let slot = Arc::clone(
            self.inner
                .slots
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Slot::Vacant)))
                .value(),
        );
        let mut guard = lock(id, &slot)?;

        let current = match &*guard {
            Slot::Live(entry) => Some(entry),
            Slot::Vacant | Slot::Tombstone => None,
        };
        let created = current.is_none();

        let value = match f(current) {
            Ok(value) => value,
            Err(e) => {
                let reserved = matches!(&*guard, Slot::Vacant);
                drop(guard);
                if reserved {
                    self.release(id, &slot);
                }
                return Err(e);
            }
        };
        let entry = self.stamp(id, value);
        *guard = Slot::Live(entry.clone());
        drop(guard);

        if created {
            self.record_created();
        }
        tracing::debug!(id = %id, version = entry.version, created, "Entry written");
        Ok(Upserted { entry, created })
    }

    /// Unconditionally store `value` at `id`.
    pub fn put(&self, id: &str, value: Value) -> StoreResult<Upserted> {
        self.upsert(id, |_| Ok(value))
    }

    /// Delete an entry, leaving a tombstone. Unknown and already deleted ids are ignored.
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        let Some(slot) = self.slot(id) else {
            return Ok(());
        };
        let mut guard = lock(id, &slot)?;

        if matches!(&*guard, Slot::Live(_)) {
            *guard = Slot::Tombstone;
            drop(guard);
            let live = self.inner.live.fetch_sub(1, Ordering::SeqCst) - 1;
            metrics::record_store_size(live);
            tracing::debug!(id = %id, "Entry deleted");
        }
        Ok(())
    }

    /// True when the id held an entry that has since been deleted.
    pub fn existed(&self, id: &str) -> StoreResult<bool> {
        let Some(slot) = self.slot(id) else {
            return Ok(false);
        };
        let guard = lock(id, &slot)?;
        Ok(matches!(&*guard, Slot::Tombstone))
    }

    /// Snapshot of all live entries, ordered by id.
    pub fn list(&self) -> StoreResult<Vec<Entry>> {
        let slots: Vec<(String, SharedSlot)> = self
            .inner
            .slots
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();

        let mut entries = Vec::with_capacity(slots.len());
        for (id, slot) in slots {
            if let Slot::Live(entry) = &*lock(&id, &slot)? {
                entries.push(entry.clone());
            }
        }

        // Shorter ids first keeps sequential ids in numeric order.
        entries.sort_by(|a, b| (a.id.len(), &a.id).cmp(&(b.id.len(), &b.id)));
        Ok(entries)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.live.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, id: &str) -> Option<SharedSlot> {
        self.inner.slots.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Drop a reservation nobody else holds, so failed upserts leave no slot behind.
    fn release(&self, id: &str, slot: &SharedSlot) {
        // The shard stays write-locked inside `remove_if`, so no new handle to
        // the slot can be taken while the count is checked.
        self.inner.slots.remove_if(id, |_, current| {
            Arc::ptr_eq(current, slot)
                && Arc::strong_count(current) == 2
                && current
                    .try_lock()
                    .map_or(false, |guard| matches!(&*guard, Slot::Vacant))
        });
    }

    fn generate_id(&self) -> String {
        match self.inner.strategy {
            IdStrategy::Sequential => {
                (self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1).to_string()
            }
            IdStrategy::Uuid => Uuid::new_v4().to_string(),
        }
    }

    fn stamp(&self, id: &str, value: Value) -> Entry {
        Entry {
            id: id.to_string(),
            value,
            version: self.inner.clock.fetch_add(1, Ordering::SeqCst) + 1,
            modified_at: Utc::now(),
        }
    }

    fn record_created(&self) {
        let live = self.inner.live.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_store_size(live);
    }
}

fn lock<'a>(id: &str, slot: &'a Mutex<Slot>) -> StoreResult<MutexGuard<'a, Slot>> {
    slot.lock().map_err(|_| StoreError::Poisoned(id.to_string()))
}
