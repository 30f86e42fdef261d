use core::ptr::NonNull;

use blockheap_arena::{
  Arena,
  ArenaId,
};
use blockheap_sys::region::Region;
use getset::{
  CopyGetters,
  Getters,
};
use tracing::debug;

use crate::{
  config::MAX_NAMED_ARENAS,
  error::{
    AllocError,
    AllocResult,
  },
};

/// The default arena plus up to [`MAX_NAMED_ARENAS`] named top-level arenas.
///
/// `n_arenas` counts every live arena, nested ones included.
#[derive(Debug, Getters, CopyGetters)]
pub struct AllocTable {
  #[getset(get = "pub")]
  default_arena: Arena,
  named: [Option<Arena>; MAX_NAMED_ARENAS],
  #[getset(get_copy = "pub")]
  n_arenas: usize,
  next_id: u32,
}

impl AllocTable {
  pub fn new(region: Region, max_blocks: usize) -> AllocResult<Self> {
    let default_arena = Arena::new(ArenaId::DEFAULT, region, max_blocks)?;
    debug!(base = region.addr(), len = region.len(), "default arena created");

    Ok(Self {
      default_arena,
      named: [const { None }; MAX_NAMED_ARENAS],
      n_arenas: 1,
      next_id: ArenaId::DEFAULT.raw() + 1,
    })
  }

  /// Id the next arena will receive. Ids are only consumed through [`AllocTable::adopt`].
  ///
  /// `u32::MAX` is never handed out; the C surface uses it to mean "no arena".
  pub(crate) fn peek_id(&self) -> AllocResult<ArenaId> {
    if self.next_id == u32::MAX {
      return Err(AllocError::ArenaIdsExhausted);
    }
    Ok(ArenaId::from_raw(self.next_id))
  }

  /// Accounts for a nested arena created under the id from [`AllocTable::peek_id`].
  pub(crate) fn adopt(&mut self, id: ArenaId) {
    debug_assert_eq!(id.raw(), self.next_id);
    self.next_id = self.next_id.saturating_add(1);
    self.n_arenas += 1;
  }

  pub(crate) fn forget(&mut self, dropped: usize) {
    self.n_arenas -= dropped;
  }

  pub fn create_named(&mut self, slot: usize, region: Region, max_blocks: usize) -> AllocResult<ArenaId> {
    let entry = self.named.get(slot).ok_or(AllocError::SlotOutOfRange(slot))?;
    if entry.is_some() {
      return Err(AllocError::SlotInUse(slot));
    }
    if self.iter().any(|arena| arena.region().overlaps(&region)) {
      return Err(AllocError::InvalidArgument("region overlaps a live arena"));
    }

    let id = self.peek_id()?;
    let arena = Arena::new(id, region, max_blocks)?;
    self.named[slot] = Some(arena);
    self.adopt(id);

    debug!(slot, arena = %id, base = region.addr(), len = region.len(), "named arena created");
    Ok(id)
  }

  pub fn destroy_named(&mut self, slot: usize) -> AllocResult<ArenaId> {
    let entry = self.named.get_mut(slot).ok_or(AllocError::SlotOutOfRange(slot))?;
    let arena = entry.as_ref().ok_or(AllocError::InvalidArgument("arena slot is empty"))?;
    if arena.has_live() {
      return Err(AllocError::ArenaNotEmpty);
    }

    let id = arena.id();
    let dropped = arena.arena_count();
    *entry = None;
    self.forget(dropped);

    debug!(slot, arena = %id, dropped, "named arena destroyed");
    Ok(id)
  }

  pub fn named(&self, slot: usize) -> Option<&Arena> {
    self.named.get(slot)?.as_ref()
  }

  pub fn slot_of(&self, id: ArenaId) -> Option<usize> {
    self
      .named
      .iter()
      .position(|entry| entry.as_ref().is_some_and(|arena| arena.id() == id))
  }

  /// Top-level arenas: the default arena first, then named slots in order.
  pub fn iter(&self) -> impl Iterator<Item = &Arena> {
    core::iter::once(&self.default_arena).chain(self.named.iter().flatten())
  }

  fn iter_mut(&mut self) -> impl Iterator<Item = &mut Arena> {
    core::iter::once(&mut self.default_arena).chain(self.named.iter_mut().flatten())
  }

  pub fn arena(&self, id: ArenaId) -> Option<&Arena> {
    self.iter().find_map(|arena| arena.find(id))
  }

  pub fn arena_mut(&mut self, id: ArenaId) -> Option<&mut Arena> {
    self.iter_mut().find_map(|arena| arena.find_mut(id))
  }

  pub fn contains_arena(&self, id: ArenaId) -> bool {
    self.arena(id).is_some()
  }

  /// Innermost arena whose region holds `ptr`.
  pub fn locate(&self, ptr: NonNull<u8>) -> Option<ArenaId> {
    self.iter().find_map(|arena| arena.locate(ptr))
  }
}

#[cfg(test)]
mod tests {
  use blockheap_sys::backing::Backing;

  use super::*;

  #[test]
  fn test_ids_run_out_without_reuse() {
    let backing = Backing::new(1024).unwrap();
    let named = Backing::new(256).unwrap();
    let mut table = AllocTable::new(backing.region().unwrap(), 8).unwrap();
    table.next_id = u32::MAX - 1;

    let last = table.create_named(0, named.region().unwrap(), 8).unwrap();
    assert_eq!(last.raw(), u32::MAX - 1);
    table.destroy_named(0).unwrap();

    assert_eq!(
      table.create_named(0, named.region().unwrap(), 8),
      Err(AllocError::ArenaIdsExhausted)
    );
    assert_eq!(table.peek_id(), Err(AllocError::ArenaIdsExhausted));
    assert_eq!(table.n_arenas(), 1);
    assert!(table.named(0).is_none());
  }
}
