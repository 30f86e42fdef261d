use core::ptr::NonNull;

use blockheap_arena::{
  Arena,
  ArenaId,
  Request,
  Reservation,
};
use blockheap_flags::{
  AllocFlags,
  AllocKind,
  ContentKind,
  Provenance,
};
use blockheap_sys::region::Region;
use getset::Getters;
use tracing::{
  debug,
  trace,
  warn,
};

use crate::{
  config::{
    CollapsePolicy,
    HeapConfig,
    MAX_NAMED_ARENAS,
  },
  error::{
    AllocError,
    AllocResult,
  },
  locator::{
    AllocLocatorFn,
    FreeLocatorFn,
    Locator,
  },
  table::AllocTable,
};

/// Snapshot of the block starting at a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  pub arena: ArenaId,
  pub offset: usize,
  pub len: usize,
  pub used: usize,
  pub content: ContentKind,
  pub reserved: bool,
  pub provenance: Provenance,
  /// Arena hosted by the block, if any.
  pub nested: Option<ArenaId>,
}

/// The allocator core: an allocation table, the installed locator and the policies that
/// drive placement and collapse.
#[derive(Debug, Getters)]
pub struct Heap {
  #[getset(get = "pub")]
  table: AllocTable,
  #[getset(get = "pub")]
  config: HeapConfig,
  #[getset(get = "pub")]
  locator: Locator,
}

impl Heap {
  pub fn new(region: Region, config: HeapConfig) -> AllocResult<Self> {
    config.validate()?;
    let table = AllocTable::new(region, config.max_blocks())?;

    Ok(Self {
      table,
      config,
      locator: Locator::default(),
    })
  }

  #[inline(always)]
  pub fn n_arenas(&self) -> usize {
    self.table.n_arenas()
  }

  pub fn arena(&self, id: ArenaId) -> Option<&Arena> {
    self.table.arena(id)
  }

  /// Reserves `size` bytes in the arena chosen by the locator for `flags`.
  pub fn alloc(&mut self, size: usize, flags: AllocFlags) -> AllocResult<NonNull<u8>> {
    let target = self.locator.resolve_for_alloc(&self.table, flags)?;
    self.reserve_in(target, size, flags).map(|r| r.ptr)
  }

  /// Reserves `size` bytes in `arena`, bypassing the locator.
  pub fn alloc_in(&mut self, arena: ArenaId, size: usize, flags: AllocFlags) -> AllocResult<NonNull<u8>> {
    self.reserve_in(arena, size, flags).map(|r| r.ptr)
  }

  /// [`Heap::alloc`], with the whole rounded block zero-filled.
  pub fn alloc_zeroed(&mut self, size: usize, flags: AllocFlags) -> AllocResult<NonNull<u8>> {
    let target = self.locator.resolve_for_alloc(&self.table, flags)?;
    let reservation = self.reserve_in(target, size, flags)?;
    unsafe { reservation.ptr.as_ptr().write_bytes(0, reservation.len) };
    Ok(reservation.ptr)
  }

  fn reserve_in(&mut self, target: ArenaId, size: usize, flags: AllocFlags) -> AllocResult<Reservation> {
    let fit = self.config.fit();
    let mut request = Request::new(flags);
    if flags.kind().hosts_arena() {
      request = request.with_nested(self.table.peek_id()?, self.config.nested_max_blocks());
    }

    let arena = self
      .table
      .arena_mut(target)
      .ok_or(AllocError::UnknownArena(target))?;
    let reservation = arena.reserve(size, request, fit)?;

    if let Some(id) = reservation.nested {
      self.table.adopt(id);
      debug!(parent = %target, arena = %id, len = reservation.len, kind = ?flags.kind(), "nested arena created");
    }
    trace!(arena = %target, size, ptr = ?reservation.ptr, "alloc");
    Ok(reservation)
  }

  /// Returns the block starting at `ptr` to its arena.
  pub fn free(&mut self, ptr: NonNull<u8>) -> AllocResult<()> {
    let owner = self
      .locator
      .resolve_for_free(&self.table, ptr)
      .inspect_err(|err| warn!(?ptr, %err, "free of unowned pointer"))?;
    self.free_in(owner, ptr)
  }

  fn free_in(&mut self, owner: ArenaId, ptr: NonNull<u8>) -> AllocResult<()> {
    let mut owner = owner;
    let mut ptr = ptr;

    loop {
      let arena = self
        .table
        .arena_mut(owner)
        .ok_or(AllocError::UnknownArena(owner))?;
      let release = arena
        .release(ptr)
        .map_err(AllocError::from)
        .inspect_err(|err| warn!(arena = %owner, ?ptr, %err, "rejected free"))?;
      let parent = arena.parent();
      let host = arena.host();

      self.table.forget(release.arenas_dropped);
      trace!(arena = %owner, ?ptr, len = release.len, dropped = release.arenas_dropped, "free");

      let collapse = self.config.collapse() == CollapsePolicy::Auto && release.pristine;
      match (parent, host) {
        (Some(parent), Some(host)) if collapse && self.hosts_subarena(parent, host) => {
          debug!(arena = %owner, %parent, "collapsing empty nested arena");
          owner = parent;
          ptr = host;
        }
        _ => return Ok(()),
      }
    }
  }

  /// A private arena's host stays reserved to its caller, so only subarena hosts collapse.
  fn hosts_subarena(&self, parent: ArenaId, host: NonNull<u8>) -> bool {
    self
      .table
      .arena(parent)
      .and_then(|arena| arena.block_at(host))
      .is_some_and(|block| !block.reserved())
  }

  /// Creates a named arena in the slot addressed by the selector of `flags`.
  pub fn create_arena(&mut self, region: Region, flags: AllocFlags) -> AllocResult<ArenaId> {
    match flags.slot() {
      None => Err(AllocError::InvalidArgument(
        "selector 0 names the default arena",
      )),
      Some(slot) if slot >= MAX_NAMED_ARENAS => Err(AllocError::SlotOutOfRange(slot)),
      Some(slot) => self.create_arena_at(slot, region),
    }
  }

  pub fn create_arena_at(&mut self, slot: usize, region: Region) -> AllocResult<ArenaId> {
    self.table.create_named(slot, region, self.config.max_blocks())
  }

  /// Carves a subarena of `size` bytes (header included) out of the arena chosen for `flags`.
  pub fn create_subarena(&mut self, size: usize, flags: AllocFlags) -> AllocResult<ArenaId> {
    let flags = flags.with_kind(AllocKind::Subarena);
    let parent = self.locator.resolve_for_alloc(&self.table, flags)?;
    self.create_subarena_in(parent, size, flags)
  }

  pub fn create_subarena_in(&mut self, parent: ArenaId, size: usize, flags: AllocFlags) -> AllocResult<ArenaId> {
    let flags = flags.with_kind(AllocKind::Subarena);
    self
      .reserve_in(parent, size, flags)?
      .nested
      .ok_or(AllocError::Inconsistent("subarena reservation hosts no arena"))
  }

  /// Destroys a named or nested arena that holds no live blocks.
  pub fn destroy_arena(&mut self, id: ArenaId) -> AllocResult<()> {
    if id.is_default() {
      return Err(AllocError::InvalidArgument("the default arena cannot be destroyed"));
    }
    if let Some(slot) = self.table.slot_of(id) {
      self.table.destroy_named(slot)?;
      return Ok(());
    }

    let arena = self.table.arena(id).ok_or(AllocError::UnknownArena(id))?;
    if arena.has_live() {
      return Err(AllocError::ArenaNotEmpty);
    }
    let (Some(parent), Some(host)) = (arena.parent(), arena.host()) else {
      return Err(AllocError::Inconsistent("nested arena without a host"));
    };

    debug!(arena = %id, %parent, "destroying nested arena");
    self.free_in(parent, host)
  }

  pub fn set_arena_locator(&mut self, alloc: Option<AllocLocatorFn>, free: Option<FreeLocatorFn>) {
    self.locator.set(alloc, free);
    debug!(
      alloc = alloc.is_some(),
      free = free.is_some(),
      "arena locator replaced"
    );
  }

  pub fn block_info(&self, ptr: NonNull<u8>) -> AllocResult<BlockInfo> {
    let id = self.table.locate(ptr).ok_or(AllocError::UnknownPointer)?;
    let arena = self.table.arena(id).ok_or(AllocError::UnknownArena(id))?;
    let block = arena.block_at(ptr).ok_or(AllocError::CorruptPointer)?;

    Ok(BlockInfo {
      arena: id,
      offset: block.offset(),
      len: block.len(),
      used: block.used(),
      content: block.content_kind(),
      reserved: block.reserved(),
      provenance: block.provenance(),
      nested: block.nested().map(Arena::id),
    })
  }

  /// Checks every arena and the live-arena count.
  pub fn validate(&self) -> AllocResult<()> {
    let mut count = 0;
    for arena in self.table.iter() {
      arena.validate()?;
      count += arena.arena_count();
    }
    if count != self.table.n_arenas() {
      return Err(AllocError::Inconsistent("live arena count is off"));
    }
    Ok(())
  }
}
