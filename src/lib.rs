#![cfg_attr(not(test), no_std)]

//! Process-wide heap. One [`Heap`] lives behind a spin lock; the free functions here forward
//! to it once [`init`] has run.

use core::ptr::NonNull;

use blockheap_alloc::{
  AllocError,
  AllocLocatorFn,
  AllocResult,
  ArenaId,
  FreeLocatorFn,
  Heap,
  HeapConfig,
};
use blockheap_flags::AllocFlags;
use blockheap_sys::region::Region;
use spin::Mutex;
use tracing::debug;

pub mod prelude {
  pub use blockheap_alloc::{
    AllocError,
    AllocLocatorFn,
    AllocResult,
    ArenaId,
    BlockInfo,
    CollapsePolicy,
    FitPolicy,
    FreeLocatorFn,
    Heap,
    HeapConfig,
  };
  pub use blockheap_flags::{
    AllocFlags,
    AllocKind,
  };
  pub use blockheap_sys::prelude::*;
}

static HEAP: Mutex<Option<Heap>> = Mutex::new(None);

/// Installs the global heap over `region`.
///
/// # Panics
///
/// Panics if the heap cannot be built or is already installed.
pub fn init(region: Region, config: HeapConfig) {
  if let Err(err) = try_init(region, config) {
    panic!("blockheap: heap initialization failed: {err}");
  }
}

pub fn try_init(region: Region, config: HeapConfig) -> AllocResult<()> {
  let mut slot = HEAP.lock();
  if slot.is_some() {
    return Err(AllocError::InvalidArgument("heap is already initialized"));
  }

  *slot = Some(Heap::new(region, config)?);
  debug!(base = region.addr(), len = region.len(), "global heap installed");
  Ok(())
}

pub fn is_initialized() -> bool {
  HEAP.lock().is_some()
}

/// Runs `f` against the global heap while holding its lock. `f` must not call back into
/// this module.
pub fn with_heap<R>(f: impl FnOnce(&mut Heap) -> R) -> AllocResult<R> {
  let mut slot = HEAP.lock();
  let heap = slot.as_mut().ok_or(AllocError::Uninitialized)?;
  Ok(f(heap))
}

pub fn alloc(size: usize, flags: AllocFlags) -> AllocResult<NonNull<u8>> {
  with_heap(|heap| heap.alloc(size, flags))?
}

pub fn alloc_zeroed(size: usize, flags: AllocFlags) -> AllocResult<NonNull<u8>> {
  with_heap(|heap| heap.alloc_zeroed(size, flags))?
}

pub fn free(ptr: NonNull<u8>) -> AllocResult<()> {
  with_heap(|heap| heap.free(ptr))?
}

pub fn create_arena(region: Region, flags: AllocFlags) -> AllocResult<ArenaId> {
  with_heap(|heap| heap.create_arena(region, flags))?
}

pub fn create_subarena(size: usize, flags: AllocFlags) -> AllocResult<ArenaId> {
  with_heap(|heap| heap.create_subarena(size, flags))?
}

pub fn destroy_arena(id: ArenaId) -> AllocResult<()> {
  with_heap(|heap| heap.destroy_arena(id))?
}

pub fn set_arena_locator(alloc: Option<AllocLocatorFn>, free: Option<FreeLocatorFn>) -> AllocResult<()> {
  with_heap(|heap| heap.set_arena_locator(alloc, free))
}
