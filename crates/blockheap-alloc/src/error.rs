use blockheap_arena::{
  ArenaError,
  ArenaId,
};
use blockheap_sys::region::RegionError;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  #[error("invalid argument: {0}")]
  InvalidArgument(&'static str),
  #[error("out of memory: {requested} bytes requested, largest vacant block is {largest_free}")]
  OutOfMemory { requested: usize, largest_free: usize },
  #[error("arena block table is full ({max_blocks} blocks)")]
  ArenaBlockTableFull { max_blocks: usize },
  #[error("arena slot {0} is already in use")]
  SlotInUse(usize),
  #[error("arena slot {0} is out of range")]
  SlotOutOfRange(usize),
  #[error("arena still holds live allocations")]
  ArenaNotEmpty,
  #[error("pointer lies in no arena")]
  UnknownPointer,
  #[error("pointer does not start a block")]
  CorruptPointer,
  #[error("block is already free")]
  DoubleFree,
  #[error("{0} does not exist")]
  UnknownArena(ArenaId),
  #[error("heap is not initialized")]
  Uninitialized,
  #[error("heap invariant violated: {0}")]
  Inconsistent(&'static str),
  #[error("every arena id has been handed out")]
  ArenaIdsExhausted,
}

impl AllocError {
  /// Negative status code reported across the C ABI.
  pub const fn code(&self) -> i32 {
    match self {
      AllocError::InvalidArgument(_) => -1,
      AllocError::OutOfMemory { .. } => -2,
      AllocError::ArenaBlockTableFull { .. } => -3,
      AllocError::SlotInUse(_) => -4,
      AllocError::SlotOutOfRange(_) => -5,
      AllocError::ArenaNotEmpty => -6,
      AllocError::UnknownPointer => -7,
      AllocError::CorruptPointer => -8,
      AllocError::DoubleFree => -9,
      AllocError::UnknownArena(_) => -10,
      AllocError::Uninitialized => -11,
      AllocError::Inconsistent(_) => -12,
      AllocError::ArenaIdsExhausted => -13,
    }
  }

  /// Errors caused by a pointer that was never handed out or was already returned.
  pub const fn is_integrity(&self) -> bool {
    matches!(
      self,
      AllocError::UnknownPointer | AllocError::CorruptPointer | AllocError::DoubleFree
    )
  }
}

impl From<RegionError> for AllocError {
  fn from(err: RegionError) -> Self {
    match err {
      RegionError::Empty => AllocError::InvalidArgument("region is empty"),
      RegionError::Misaligned => AllocError::InvalidArgument("region is not word aligned"),
      RegionError::Overflow => AllocError::InvalidArgument("region overflows the address space"),
      RegionError::OutOfBounds { .. } => AllocError::InvalidArgument("region is out of bounds"),
    }
  }
}

impl From<ArenaError> for AllocError {
  fn from(err: ArenaError) -> Self {
    match err {
      ArenaError::InvalidArgument(msg) => AllocError::InvalidArgument(msg),
      ArenaError::OutOfMemory {
        requested,
        largest_free,
      } => AllocError::OutOfMemory {
        requested,
        largest_free,
      },
      ArenaError::BlockTableFull { max_blocks } => AllocError::ArenaBlockTableFull { max_blocks },
      ArenaError::CorruptPointer => AllocError::CorruptPointer,
      ArenaError::DoubleFree => AllocError::DoubleFree,
      ArenaError::NotEmpty => AllocError::ArenaNotEmpty,
      ArenaError::Inconsistent(msg) => AllocError::Inconsistent(msg),
      ArenaError::Region(err) => err.into(),
    }
  }
}

pub type AllocResult<T> = Result<T, AllocError>;
