//! Entity handles.
//!
//! An [`EntityHandle`] is a 64-bit value that packs a *generation* counter in
//! the high 32 bits and a slot *index* in the low 32 bits. The slot table bumps
//! the generation every time a slot is vacated, so a handle captured before
//! the slot was recycled compares unequal to the new occupant's handle and
//! fails validation.
//!
//! A handle owns nothing. Copying or dropping one never touches the entity it
//! refers to; every dereference goes through the
//! [`EntityManager`](crate::manager::EntityManager).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A generational reference to one slot of the entity table.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle(u64);

impl EntityHandle {
    /// Construct a handle from a slot index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation, e.g. for passing across a scripting boundary.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`. The result still has to be validated by
    /// the manager before use.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityHandle({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}
