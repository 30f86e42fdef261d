#![cfg_attr(not(test), no_std)]

pub mod backing;
pub mod math;
pub mod prim;
pub mod region;

pub mod prelude {
  pub use super::{
    backing::{
      Backing,
      SysError,
      SysResult,
    },
    math::{
      align_down,
      align_up,
      is_aligned,
      is_word_aligned,
      word_align,
    },
    prim::{
      ARENA_HEADER_SIZE,
      WORD_ALIGN,
      page_size,
    },
    region::{
      Region,
      RegionError,
      RegionResult,
    },
  };
}
