use super::providers::{Clock, IdProvider, SystemClock, UuidIdProvider};
use super::types::{StoreError, Widget, WidgetToCreate, WidgetToUpdate};

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type ZIndex = BTreeMap<i32, Widget>;

/// In-memory widget repository, addressable by id and ordered by `z`.
///
/// Locking:
/// - `writes` serializes create, update and delete against each other.
/// - `by_z` is guarded by a reader/writer lock. Writers hold it in write mode
///   for the whole coordinate change, including a shift, so a range read never
///   sees a widget twice or misses one that is being moved.
/// - `by_id` is a `DashMap`; point reads never wait on writers.
///
/// Lock order is always `writes` then `by_z`.
pub struct WidgetStore {
    by_id: DashMap<String, Widget>,
    by_z: RwLock<ZIndex>,
    writes: Mutex<()>,
    ids: Arc<dyn IdProvider>,
    clock: Arc<dyn Clock>,
}

impl Default for WidgetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetStore {
    pub fn new() -> Self {
        Self::with_providers(Arc::new(UuidIdProvider), Arc::new(SystemClock))
    }

    pub fn with_providers(ids: Arc<dyn IdProvider>, clock: Arc<dyn Clock>) -> Self {
        tracing::info!("In-memory widget store initialized");
        Self {
            by_id: DashMap::new(),
            by_z: RwLock::new(BTreeMap::new()),
            writes: Mutex::new(()),
            ids,
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Inserts a new widget.
    ///
    /// Without a `z` the widget goes on top (`i32::MIN` in an empty store).
    /// With an occupied `z`, everything at or above it moves up by one first.
    pub fn create(&self, draft: WidgetToCreate) -> Result<Widget, StoreError> {
        let _writes = self.lock_writes();
        // Picked before the z index is locked.
        let id = self.fresh_id();
        let mut by_z = self.write_index();

        let z = match draft.z {
            Some(z) => {
                if by_z.contains_key(&z) {
                    check_shift(&by_z, z, None)?;
                    let moved = shift(&mut by_z, &self.by_id, z);
                    tracing::debug!("Shifted {} widgets up from z={}", moved, z);
                }
                z
            }
            None => next_free_z(&by_z)?,
        };

        let widget = Widget {
            id: id.clone(),
            x: draft.x,
            y: draft.y,
            z,
            width: draft.width,
            height: draft.height,
            last_modified: self.clock.now_ms(),
        };

        by_z.insert(z, widget.clone());
        self.by_id.insert(id, widget.clone());

        tracing::debug!("Created widget {} at z={}", widget.id, widget.z);
        Ok(widget)
    }

    pub fn read_one(&self, id: &str) -> Option<Widget> {
        self.by_id.get(id).map(|entry| entry.value().clone())
    }

    /// Up to `limit` widgets in ascending `z`, starting at `from_z` when given.
    pub fn read_range(&self, limit: usize, from_z: Option<i32>) -> Vec<Widget> {
        let by_z = self.read_index();
        let lower = from_z.map_or(Bound::Unbounded, Bound::Included);

        by_z.range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, widget)| widget.clone())
            .collect()
    }

    /// Applies `patch` to the widget `id`.
    ///
    /// Moving onto a `z` held by another widget shifts that widget and all
    /// above it up by one. Moving onto a free `z`, or onto its own, does not.
    pub fn update(&self, id: &str, patch: WidgetToUpdate) -> Result<Widget, StoreError> {
        let _writes = self.lock_writes();

        let existing = self
            .read_one(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let updated = patch.apply(&existing, self.clock.now_ms());

        let mut by_z = self.write_index();
        if updated.z != existing.z {
            let occupied = by_z.contains_key(&updated.z);
            if occupied {
                check_shift(&by_z, updated.z, Some(existing.z))?;
            }
            by_z.remove(&existing.z);
            if occupied {
                let moved = shift(&mut by_z, &self.by_id, updated.z);
                tracing::debug!("Shifted {} widgets up from z={}", moved, updated.z);
            }
        }

        by_z.insert(updated.z, updated.clone());
        self.by_id.insert(updated.id.clone(), updated.clone());

        tracing::debug!(
            "Updated widget {} (z {} -> {})",
            updated.id,
            existing.z,
            updated.z
        );
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<Widget, StoreError> {
        let _writes = self.lock_writes();

        let existing = self
            .read_one(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut by_z = self.write_index();
        by_z.remove(&existing.z);
        self.by_id.remove(&existing.id);

        tracing::debug!("Deleted widget {} from z={}", existing.id, existing.z);
        Ok(existing)
    }

    fn fresh_id(&self) -> String {
        loop {
            let candidate = self.ids.next_id();
            if !self.by_id.contains_key(&candidate) {
                return candidate;
            }
            tracing::warn!("Id provider returned an id already in use: {}", candidate);
        }
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_index(&self) -> RwLockReadGuard<'_, ZIndex> {
        self.by_z.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_index(&self) -> RwLockWriteGuard<'_, ZIndex> {
        self.by_z.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Coordinate for an appended widget.
fn next_free_z(by_z: &ZIndex) -> Result<i32, StoreError> {
    match by_z.last_key_value() {
        None => Ok(i32::MIN),
        Some((&top, _)) => top.checked_add(1).ok_or(StoreError::Overflow),
    }
}

/// Fails if shifting `[start, +inf)` would push a widget past `i32::MAX`.
/// `leaving` is a coordinate that is vacated before the shift happens.
fn check_shift(by_z: &ZIndex, start: i32, leaving: Option<i32>) -> Result<(), StoreError> {
    let top = by_z
        .range(start..)
        .rev()
        .map(|(&z, _)| z)
        .find(|&z| Some(z) != leaving);

    match top {
        Some(i32::MAX) => Err(StoreError::Overflow),
        _ => Ok(()),
    }
}

/// Moves every widget at or above `start` up by one.
///
/// The suffix is drained out of the index before anything is reinserted, so no
/// write lands on a coordinate still held by a not-yet-moved neighbour.
/// Callers must have run [`check_shift`] first.
fn shift(by_z: &mut ZIndex, by_id: &DashMap<String, Widget>, start: i32) -> usize {
    let suffix = by_z.split_off(&start);
    let count = suffix.len();

    for (_, widget) in suffix {
        let moved = widget.moved_up();
        by_id.insert(moved.id.clone(), moved.clone());
        by_z.insert(moved.z, moved);
    }

    count
}
