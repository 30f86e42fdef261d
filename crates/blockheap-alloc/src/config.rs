use getset::CopyGetters;

pub use blockheap_arena::FitPolicy;

use crate::error::{
  AllocError,
  AllocResult,
};

pub const MAX_NAMED_ARENAS: usize = 8;
pub const DEFAULT_MAX_BLOCKS: usize = 64;
pub const DEFAULT_NESTED_MAX_BLOCKS: usize = 16;

/// What happens to a nested arena once its last block is freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollapsePolicy {
  /// The arena stays until it is destroyed or its host block is freed.
  #[default]
  Explicit,
  /// The host block is freed in the parent, which may collapse in turn.
  Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct HeapConfig {
  fit: FitPolicy,
  collapse: CollapsePolicy,
  /// Block capacity of the default and named arenas.
  max_blocks: usize,
  /// Block capacity of every nested arena.
  nested_max_blocks: usize,
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self {
      fit: FitPolicy::default(),
      collapse: CollapsePolicy::default(),
      max_blocks: DEFAULT_MAX_BLOCKS,
      nested_max_blocks: DEFAULT_NESTED_MAX_BLOCKS,
    }
  }
}

impl HeapConfig {
  pub const fn with_fit(mut self, fit: FitPolicy) -> Self {
    self.fit = fit;
    self
  }

  pub const fn with_collapse(mut self, collapse: CollapsePolicy) -> Self {
    self.collapse = collapse;
    self
  }

  pub const fn with_max_blocks(mut self, max_blocks: usize) -> Self {
    self.max_blocks = max_blocks;
    self
  }

  pub const fn with_nested_max_blocks(mut self, nested_max_blocks: usize) -> Self {
    self.nested_max_blocks = nested_max_blocks;
    self
  }

  pub fn validate(&self) -> AllocResult<()> {
    if self.max_blocks == 0 || self.nested_max_blocks == 0 {
      return Err(AllocError::InvalidArgument("block capacity must be non-zero"));
    }
    Ok(())
  }
}
