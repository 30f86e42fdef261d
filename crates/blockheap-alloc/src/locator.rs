use core::ptr::NonNull;

use blockheap_arena::ArenaId;
use blockheap_flags::AllocFlags;
use getset::CopyGetters;

use crate::{
  error::{
    AllocError,
    AllocResult,
  },
  table::AllocTable,
};

/// Picks an arena for an allocation. Called with the arena the selector prefers.
pub type AllocLocatorFn = fn(ArenaId, AllocFlags) -> Option<ArenaId>;
/// Picks the arena owning a pointer. Called with [`ArenaId::DEFAULT`] as the current arena.
pub type FreeLocatorFn = fn(ArenaId, NonNull<u8>) -> Option<ArenaId>;

/// Pluggable routing of requests to arenas. Empty slots and `None` answers fall back to
/// selector routing on allocation and address containment on free.
#[derive(Debug, Clone, Copy, Default, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Locator {
  alloc: Option<AllocLocatorFn>,
  free: Option<FreeLocatorFn>,
}

impl Locator {
  pub const fn new(alloc: Option<AllocLocatorFn>, free: Option<FreeLocatorFn>) -> Self {
    Self { alloc, free }
  }

  pub fn set(&mut self, alloc: Option<AllocLocatorFn>, free: Option<FreeLocatorFn>) {
    self.alloc = alloc;
    self.free = free;
  }

  pub fn is_default(&self) -> bool {
    self.alloc.is_none() && self.free.is_none()
  }

  pub fn resolve_for_alloc(&self, table: &AllocTable, flags: AllocFlags) -> AllocResult<ArenaId> {
    let preferred = flags
      .slot()
      .and_then(|slot| table.named(slot))
      .map_or(ArenaId::DEFAULT, |arena| arena.id());

    let chosen = self
      .alloc
      .and_then(|locate| locate(preferred, flags))
      .unwrap_or(preferred);

    if !table.contains_arena(chosen) {
      return Err(AllocError::UnknownArena(chosen));
    }
    Ok(chosen)
  }

  pub fn resolve_for_free(&self, table: &AllocTable, ptr: NonNull<u8>) -> AllocResult<ArenaId> {
    if let Some(chosen) = self.free.and_then(|locate| locate(ArenaId::DEFAULT, ptr)) {
      if !table.contains_arena(chosen) {
        return Err(AllocError::UnknownArena(chosen));
      }
      return Ok(chosen);
    }

    table.locate(ptr).ok_or(AllocError::UnknownPointer)
  }
}
