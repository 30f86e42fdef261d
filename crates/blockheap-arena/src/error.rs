use blockheap_sys::region::RegionError;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
  #[error("invalid argument: {0}")]
  InvalidArgument(&'static str),
  #[error("no vacant block can hold {requested} bytes (largest vacant block is {largest_free})")]
  OutOfMemory { requested: usize, largest_free: usize },
  #[error("block table is full ({max_blocks} blocks)")]
  BlockTableFull { max_blocks: usize },
  #[error("pointer does not start a block")]
  CorruptPointer,
  #[error("block is already vacant")]
  DoubleFree,
  #[error("arena still holds live allocations")]
  NotEmpty,
  #[error("arena invariant violated: {0}")]
  Inconsistent(&'static str),
  #[error(transparent)]
  Region(#[from] RegionError),
}

pub type ArenaResult<T> = Result<T, ArenaError>;
