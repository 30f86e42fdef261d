#![cfg_attr(not(test), no_std)]

//! Allocation table, arena locator and the allocator core built on top of them.

pub mod config;
pub mod error;
pub mod heap;
pub mod locator;
pub mod table;

pub use blockheap_arena::ArenaId;
pub use blockheap_flags::AllocFlags;
pub use config::{
  CollapsePolicy,
  FitPolicy,
  HeapConfig,
};
pub use error::{
  AllocError,
  AllocResult,
};
pub use heap::{
  BlockInfo,
  Heap,
};
pub use locator::{
  AllocLocatorFn,
  FreeLocatorFn,
  Locator,
};
pub use table::AllocTable;
