//! Reference-counted slot table.
//!
//! [`SlotTable`] is the arena behind the entity manager. Each slot holds at
//! most one value plus a reference count and a generation:
//!
//! - `refcount == 0` if and only if the slot holds no value.
//! - The generation is bumped every time a slot is vacated, so handles issued
//!   for the previous occupant stop validating.
//!
//! Slots are claimed by a linear scan. With [`AllocationStrategy::NextFit`]
//! the scan starts at a cursor that persists between claims and wraps around
//! the table once; with [`AllocationStrategy::LowestFree`] it always starts at
//! index 0. When no slot is free, the [`CapacityPolicy`] decides between a
//! hard [`EntityError::CapacityExhausted`] and growing the table.
//!
//! Capacity is a logical limit. Slot storage is only allocated when a claim
//! first reaches an index, so a large configured capacity costs nothing up
//! front. An allocation failure is reported as `CapacityExhausted`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::handle::EntityHandle;
use crate::EntityError;

/// Largest number of slots a table can address with a 32-bit index.
pub const MAX_CAPACITY: usize = u32::MAX as usize;

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// What happens when every slot is occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// The table never grows; a full table fails with `CapacityExhausted`.
    #[default]
    Fixed,
    /// The table doubles in size, up to `max` slots.
    Grow {
        /// Upper bound on the number of slots.
        max: usize,
    },
}

/// Where the free-slot scan starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStrategy {
    /// Scan forward from the slot after the previous claim, wrapping once.
    /// Biases allocation toward untouched slots.
    #[default]
    NextFit,
    /// Always take the lowest free index.
    LowestFree,
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    refcount: u32,
    generation: u32,
}

impl<T> Slot<T> {
    fn empty() -> Self {
        Self {
            value: None,
            refcount: 0,
            generation: 0,
        }
    }

    fn is_free(&self) -> bool {
        self.refcount == 0
    }
}

// ---------------------------------------------------------------------------
// SlotTable
// ---------------------------------------------------------------------------

/// A fixed-capacity (optionally growable) arena of reference-counted slots.
#[derive(Debug)]
pub struct SlotTable<T> {
    /// Slots touched so far. Indices in `slots.len()..limit` are free and
    /// not yet allocated.
    slots: Vec<Slot<T>>,
    /// Logical number of slots.
    limit: usize,
    /// Next index the `NextFit` scan starts from. Never past `slots.len()`.
    cursor: usize,
    /// Number of occupied slots.
    live: usize,
    policy: CapacityPolicy,
    strategy: AllocationStrategy,
}

impl<T> SlotTable<T> {
    /// Create a table with `capacity` free slots.
    pub fn new(capacity: usize, policy: CapacityPolicy, strategy: AllocationStrategy) -> Self {
        Self {
            slots: Vec::new(),
            limit: capacity.min(MAX_CAPACITY),
            cursor: 0,
            live: 0,
            policy,
            strategy,
        }
    }

    /// Claim a free slot and fill it with the value built by `make`.
    ///
    /// `make` receives the handle of the claimed slot so the value can record
    /// its own identity. The slot starts with a reference count of 1. Nothing
    /// is modified when the claim fails.
    pub fn claim<F>(&mut self, make: F) -> Result<EntityHandle, EntityError>
    where
        F: FnOnce(EntityHandle) -> T,
    {
        let (index, limit) = match self.find_free() {
            Some(index) => (index, self.limit),
            None => (self.slots.len(), self.grown_limit()?),
        };
        if index == self.slots.len() {
            self.slots
                .try_reserve(1)
                .map_err(|_| EntityError::CapacityExhausted { capacity: self.limit })?;
            self.slots.push(Slot::empty());
        }
        if limit != self.limit {
            warn!(old = self.limit, new = limit, "slot table full, growing");
            self.limit = limit;
        }

        let slot = &mut self.slots[index];
        let handle = EntityHandle::new(index as u32, slot.generation);
        slot.value = Some(make(handle));
        slot.refcount = 1;
        self.live += 1;
        self.cursor = (index + 1) % self.limit;
        Ok(handle)
    }

    /// First free index in scan order. An unallocated index is returned as
    /// `slots.len()`, which the caller then allocates.
    fn find_free(&self) -> Option<usize> {
        let len = self.slots.len();
        let untouched = (len < self.limit).then_some(len);
        match self.strategy {
            AllocationStrategy::NextFit => (self.cursor..len)
                .find(|&i| self.slots[i].is_free())
                .or(untouched)
                .or_else(|| (0..self.cursor.min(len)).find(|&i| self.slots[i].is_free())),
            AllocationStrategy::LowestFree => {
                self.slots.iter().position(Slot::is_free).or(untouched)
            }
        }
    }

    /// The limit the capacity policy allows once every slot is occupied.
    fn grown_limit(&self) -> Result<usize, EntityError> {
        let max = match self.policy {
            CapacityPolicy::Fixed => {
                return Err(EntityError::CapacityExhausted { capacity: self.limit })
            }
            CapacityPolicy::Grow { max } => max.min(MAX_CAPACITY),
        };
        if self.limit >= max {
            return Err(EntityError::CapacityExhausted { capacity: self.limit });
        }
        Ok(self.limit.saturating_mul(2).max(1).min(max))
    }

    /// Resolve a handle to its slot index, failing closed on anything stale.
    fn validate(&self, handle: EntityHandle) -> Result<usize, EntityError> {
        let index = handle.index() as usize;
        match self.slots.get(index) {
            Some(slot) if !slot.is_free() && slot.generation == handle.generation() => Ok(index),
            _ => Err(EntityError::StaleHandle { handle }),
        }
    }

    /// Whether `handle` refers to the current occupant of its slot.
    pub fn is_live(&self, handle: EntityHandle) -> bool {
        self.validate(handle).is_ok()
    }

    pub fn get(&self, handle: EntityHandle) -> Result<&T, EntityError> {
        let index = self.validate(handle)?;
        self.slots[index]
            .value
            .as_ref()
            .ok_or(EntityError::StaleHandle { handle })
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Result<&mut T, EntityError> {
        let index = self.validate(handle)?;
        self.slots[index]
            .value
            .as_mut()
            .ok_or(EntityError::StaleHandle { handle })
    }

    /// Current reference count of a live handle.
    pub fn refcount(&self, handle: EntityHandle) -> Result<u32, EntityError> {
        let index = self.validate(handle)?;
        Ok(self.slots[index].refcount)
    }

    /// Take an additional reference. Returns the new count.
    pub fn add_ref(&mut self, handle: EntityHandle) -> Result<u32, EntityError> {
        let index = self.validate(handle)?;
        let slot = &mut self.slots[index];
        slot.refcount = slot
            .refcount
            .checked_add(1)
            .ok_or(EntityError::RefcountOverflow { handle })?;
        Ok(slot.refcount)
    }

    /// Drop one reference. When the count reaches zero the slot is vacated
    /// and the value is returned.
    pub fn release(&mut self, handle: EntityHandle) -> Result<Option<T>, EntityError> {
        let index = self.validate(handle)?;
        self.slots[index].refcount -= 1;
        if self.slots[index].refcount == 0 {
            debug!(%handle, "last reference released");
            Ok(self.vacate(index))
        } else {
            Ok(None)
        }
    }

    /// Vacate a slot regardless of its reference count.
    pub fn remove(&mut self, handle: EntityHandle) -> Result<T, EntityError> {
        let index = self.validate(handle)?;
        self.vacate(index).ok_or(EntityError::StaleHandle { handle })
    }

    fn vacate(&mut self, index: usize) -> Option<T> {
        let slot = &mut self.slots[index];
        slot.refcount = 0;
        slot.generation = slot.generation.wrapping_add(1);
        self.live -= 1;
        slot.value.take()
    }

    /// Handles of every occupied slot, in index order.
    ///
    /// The result is a snapshot: it does not borrow the table, so callers may
    /// mutate the table while walking it and re-validate each handle.
    pub fn occupied(&self) -> Vec<EntityHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    /// Iterate over occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value
                .as_ref()
                .map(|v| (EntityHandle::new(i as u32, slot.generation), v))
        })
    }

    /// Iterate mutably over occupied slots in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityHandle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(|v| (EntityHandle::new(i as u32, generation), v))
        })
    }

    /// Vacate every slot. Outstanding handles all become stale. Returns the
    /// number of values dropped.
    pub fn clear(&mut self) -> usize {
        let mut dropped = 0;
        for index in 0..self.slots.len() {
            if !self.slots[index].is_free() {
                self.vacate(index);
                dropped += 1;
            }
        }
        self.cursor = 0;
        dropped
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Total number of slots, occupied or not.
    pub fn capacity(&self) -> usize {
        self.limit
    }

    pub fn policy(&self) -> CapacityPolicy {
        self.policy
    }

    pub fn strategy(&self) -> AllocationStrategy {
        self.strategy
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
