//! C entry points over the global heap. Status returns are 0 on success and a negative
//! [`AllocError::code`] on failure; arena handles are raw ids with [`BLK_NO_ARENA`] for
//! failure or "no preference".

use core::ptr::{
  self,
  NonNull,
};

pub use blockheap::prelude::*;
use spin::Mutex;
use tracing::debug;

pub const BLK_OK: i32 = 0;
pub const BLK_NO_ARENA: u32 = u32::MAX;

pub type BlkAllocLocator = extern "C" fn(preferred: u32, flags: u32) -> u32;
pub type BlkFreeLocator = extern "C" fn(current: u32, ptr: *mut u8) -> u32;

struct CLocator {
  alloc: Option<BlkAllocLocator>,
  free: Option<BlkFreeLocator>,
}

static C_LOCATOR: Mutex<CLocator> = Mutex::new(CLocator {
  alloc: None,
  free: None,
});

fn status(result: AllocResult<()>) -> i32 {
  match result {
    Ok(()) => BLK_OK,
    Err(err) => err.code(),
  }
}

fn handle(result: AllocResult<ArenaId>) -> u32 {
  result.map_or(BLK_NO_ARENA, ArenaId::raw)
}

fn arena_of(handle: u32) -> Option<ArenaId> {
  (handle != BLK_NO_ARENA).then(|| ArenaId::from_raw(handle))
}

unsafe fn region(base: *mut u8, len: usize) -> AllocResult<Region> {
  let base = NonNull::new(base).ok_or(AllocError::InvalidArgument("null region base"))?;
  Ok(unsafe { Region::from_raw_parts(base, len) }?)
}

fn alloc_trampoline(preferred: ArenaId, flags: AllocFlags) -> Option<ArenaId> {
  let callback = C_LOCATOR.lock().alloc?;
  arena_of(callback(preferred.raw(), flags.bits()))
}

fn free_trampoline(current: ArenaId, ptr: NonNull<u8>) -> Option<ArenaId> {
  let callback = C_LOCATOR.lock().free?;
  arena_of(callback(current.raw(), ptr.as_ptr()))
}

#[unsafe(no_mangle)]
pub extern "C" fn blk_page_size() -> usize {
  page_size()
}

/// # Safety
///
/// `base..base + len` must be writable memory handed to the heap for the rest of the process.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn blk_init(base: *mut u8, len: usize) -> i32 {
  let result = unsafe { region(base, len) }
    .and_then(|region| blockheap::try_init(region, HeapConfig::default()));
  status(result)
}

#[unsafe(no_mangle)]
pub extern "C" fn blk_alloc(size: usize, flags: u32) -> *mut u8 {
  blockheap::alloc(size, AllocFlags::from_bits(flags)).map_or(ptr::null_mut(), NonNull::as_ptr)
}

#[unsafe(no_mangle)]
pub extern "C" fn blk_free(ptr: *mut u8) -> i32 {
  let result = NonNull::new(ptr)
    .ok_or(AllocError::InvalidArgument("null pointer"))
    .and_then(blockheap::free);
  status(result)
}

/// # Safety
///
/// Same contract as [`blk_init`] for the new arena's memory.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn blk_create_arena(base: *mut u8, len: usize, flags: u32) -> u32 {
  let result = unsafe { region(base, len) }
    .and_then(|region| blockheap::create_arena(region, AllocFlags::from_bits(flags)));
  handle(result)
}

#[unsafe(no_mangle)]
pub extern "C" fn blk_create_subarena(size: usize, flags: u32) -> u32 {
  handle(blockheap::create_subarena(size, AllocFlags::from_bits(flags)))
}

#[unsafe(no_mangle)]
pub extern "C" fn blk_destroy_arena(handle: u32) -> i32 {
  let result = arena_of(handle)
    .ok_or(AllocError::InvalidArgument("no arena handle"))
    .and_then(blockheap::destroy_arena);
  status(result)
}

/// Installs C locator callbacks. A callback answers [`BLK_NO_ARENA`] to keep the default
/// choice. Callbacks run with the heap locked and must not call back into `blk_*`. Nothing is
/// installed unless the heap is initialized.
#[unsafe(no_mangle)]
pub extern "C" fn blk_set_arena_locator(
  alloc: Option<BlkAllocLocator>,
  free: Option<BlkFreeLocator>,
) -> i32 {
  let trampolines = (
    alloc.map(|_| alloc_trampoline as AllocLocatorFn),
    free.map(|_| free_trampoline as FreeLocatorFn),
  );
  let result = blockheap::with_heap(|heap| {
    let mut locator = C_LOCATOR.lock();
    locator.alloc = alloc;
    locator.free = free;
    heap.set_arena_locator(trampolines.0, trampolines.1);
  });

  if result.is_ok() {
    debug!(alloc = alloc.is_some(), free = free.is_some(), "C arena locator installed");
  }
  status(result)
}
