#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod arena;
mod block;
mod error;

pub use arena::{
  Arena,
  ArenaStats,
  FitPolicy,
  Release,
  Request,
  Reservation,
};
pub use block::{
  Block,
  Content,
};
pub use error::{
  ArenaError,
  ArenaResult,
};

/// Handle naming one arena. Ids are handed out once and never reused, so a handle to a
/// destroyed arena stays detectably stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArenaId(u32);

impl ArenaId {
  pub const DEFAULT: Self = Self(0);

  #[inline(always)]
  pub const fn from_raw(raw: u32) -> Self {
    Self(raw)
  }

  #[inline(always)]
  pub const fn raw(self) -> u32 {
    self.0
  }

  #[inline(always)]
  pub const fn is_default(self) -> bool {
    self.0 == 0
  }
}

impl core::fmt::Display for ArenaId {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "arena#{}", self.0)
  }
}
