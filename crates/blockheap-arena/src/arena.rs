use alloc::{
  boxed::Box,
  vec::Vec,
};
use core::ptr::NonNull;

use blockheap_flags::{
  AllocFlags,
  ContentKind,
  Provenance,
};
use blockheap_sys::{
  math::{
    is_word_aligned,
    word_align,
  },
  prim::ARENA_HEADER_SIZE,
  region::Region,
};
use getset::CopyGetters;
use tracing::{
  debug,
  trace,
};

use crate::{
  ArenaId,
  block::{
    Block,
    Content,
  },
  error::{
    ArenaError,
    ArenaResult,
  },
};

/// How a vacant block is picked for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitPolicy {
  /// Lowest-addressed vacant block that fits.
  #[default]
  FirstFit,
  /// Smallest vacant block that fits; ties go to the lowest address.
  BestFit,
}

/// One allocation request against a single arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
  flags: AllocFlags,
  nested: Option<(ArenaId, usize)>,
}

impl Request {
  pub const fn new(flags: AllocFlags) -> Self {
    Self {
      flags,
      nested: None,
    }
  }

  /// Id and block capacity for the arena a hosting request creates.
  pub const fn with_nested(self, id: ArenaId, max_blocks: usize) -> Self {
    Self {
      flags: self.flags,
      nested: Some((id, max_blocks)),
    }
  }

  pub const fn flags(&self) -> AllocFlags {
    self.flags
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
  pub ptr: NonNull<u8>,
  pub offset: usize,
  pub len: usize,
  pub nested: Option<ArenaId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
  /// Length of the freed block before coalescing.
  pub len: usize,
  /// Arenas destroyed along with the block's content.
  pub arenas_dropped: usize,
  /// The arena is a single vacant block again.
  pub pristine: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArenaStats {
  pub len: usize,
  pub used: usize,
  pub free: usize,
  pub n_blocks: usize,
  pub max_blocks: usize,
  pub live_blocks: usize,
  pub largest_free: usize,
}

/// A fixed region carved into an ordered, gap-free sequence of blocks.
///
/// ```text
///  region.base                                              region.base + len
///  +-----------+--------------------------+--------+------------------------+
///  | Object    | Arena (host)             | Object | Empty                  |
///  |           | hdr | nested arena ...   |        |                        |
///  +-----------+--------------------------+--------+------------------------+
/// ```
///
/// A fresh arena is one vacant block. Reservations split blocks, releases coalesce them, and
/// the block count never exceeds `max_blocks`.
#[derive(Debug, CopyGetters)]
pub struct Arena {
  #[getset(get_copy = "pub")]
  id: ArenaId,
  #[getset(get_copy = "pub")]
  parent: Option<ArenaId>,
  #[getset(get_copy = "pub")]
  region: Region,
  #[getset(get_copy = "pub")]
  max_blocks: usize,
  #[getset(get_copy = "pub")]
  content: ContentKind,
  #[getset(get_copy = "pub")]
  host: Option<NonNull<u8>>,
  blocks: Vec<Block>,
}

impl Arena {
  pub fn new(id: ArenaId, region: Region, max_blocks: usize) -> ArenaResult<Self> {
    Self::build(id, None, None, region, max_blocks)
  }

  fn build(
    id: ArenaId,
    parent: Option<ArenaId>,
    host: Option<NonNull<u8>>,
    region: Region,
    max_blocks: usize,
  ) -> ArenaResult<Self> {
    if max_blocks == 0 {
      return Err(ArenaError::InvalidArgument("an arena needs room for one block"));
    }

    let mut blocks = Vec::with_capacity(max_blocks);
    blocks.push(Block::vacant(0, region.len()));

    Ok(Self {
      id,
      parent,
      region,
      max_blocks,
      content: ContentKind::Object,
      host,
      blocks,
    })
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.region.len()
  }

  #[inline(always)]
  pub fn is_nested(&self) -> bool {
    self.parent.is_some()
  }

  pub fn blocks(&self) -> &[Block] {
    &self.blocks
  }

  #[inline(always)]
  pub fn n_blocks(&self) -> usize {
    self.blocks.len()
  }

  #[inline(always)]
  pub fn contains(&self, ptr: NonNull<u8>) -> bool {
    self.region.contains(ptr)
  }

  pub fn block_ptr(&self, block: &Block) -> NonNull<u8> {
    self.region.at(block.offset())
  }

  fn index_of(&self, offset: usize) -> Option<usize> {
    self.blocks.binary_search_by_key(&offset, |b| b.offset()).ok()
  }

  /// Block starting exactly at `ptr`.
  pub fn block_at(&self, ptr: NonNull<u8>) -> Option<&Block> {
    let offset = self.region.offset_of(ptr)?;
    self.index_of(offset).map(|i| &self.blocks[i])
  }

  /// Block whose range covers `ptr`.
  pub fn block_containing(&self, ptr: NonNull<u8>) -> Option<&Block> {
    let offset = self.region.offset_of(ptr)?;
    let index = self.blocks.partition_point(|b| b.end() <= offset);
    self.blocks.get(index)
  }

  pub fn largest_free(&self) -> usize {
    self
      .blocks
      .iter()
      .filter(|b| b.is_vacant())
      .map(Block::available)
      .max()
      .unwrap_or(0)
  }

  /// Back to a single vacant block spanning the region.
  pub fn is_pristine(&self) -> bool {
    self.blocks.len() == 1 && self.blocks[0].is_vacant()
  }

  /// Any reserved block, or a subarena that itself holds live blocks.
  pub fn has_live(&self) -> bool {
    self
      .blocks
      .iter()
      .any(|b| b.reserved() || b.nested().is_some_and(Arena::has_live))
  }

  /// This arena plus every arena nested below it.
  pub fn arena_count(&self) -> usize {
    1 + self.nested_arenas().map(Arena::arena_count).sum::<usize>()
  }

  pub fn nested_arenas(&self) -> impl Iterator<Item = &Arena> {
    self.blocks.iter().filter_map(Block::nested)
  }

  fn nested_arenas_mut(&mut self) -> impl Iterator<Item = &mut Arena> {
    self.blocks.iter_mut().filter_map(Block::nested_mut)
  }

  pub fn find(&self, id: ArenaId) -> Option<&Arena> {
    if self.id == id {
      return Some(self);
    }
    self.nested_arenas().find_map(|a| a.find(id))
  }

  pub fn find_mut(&mut self, id: ArenaId) -> Option<&mut Arena> {
    if self.id == id {
      return Some(self);
    }
    self.nested_arenas_mut().find_map(|a| a.find_mut(id))
  }

  /// Innermost arena (this one or a nested one) whose region holds `ptr`.
  pub fn locate(&self, ptr: NonNull<u8>) -> Option<ArenaId> {
    if !self.contains(ptr) {
      return None;
    }

    let nested = self
      .block_containing(ptr)
      .and_then(Block::nested)
      .and_then(|n| n.locate(ptr));
    Some(nested.unwrap_or(self.id))
  }

  fn find_fit(&self, size: usize, fit: FitPolicy) -> Option<usize> {
    let mut candidates = self
      .blocks
      .iter()
      .enumerate()
      .filter(|(_, b)| b.is_vacant() && b.available() >= size);

    match fit {
      FitPolicy::FirstFit => candidates.next().map(|(i, _)| i),
      FitPolicy::BestFit => candidates.min_by_key(|(_, b)| b.available()).map(|(i, _)| i),
    }
  }

  fn nested_content(&self, request: &Request, offset: usize, len: usize) -> ArenaResult<Content> {
    if !request.flags.kind().hosts_arena() {
      return Ok(Content::Object);
    }

    let (id, max_blocks) = request
      .nested
      .ok_or(ArenaError::InvalidArgument("nested arena requested without an id"))?;
    let region = self
      .region
      .sub(offset + ARENA_HEADER_SIZE, len - ARENA_HEADER_SIZE)?;
    let host = self.region.at(offset);
    let arena = Arena::build(id, Some(self.id), Some(host), region, max_blocks)?;

    debug!(parent = %self.id, nested = %id, len = region.len(), "hosting nested arena");
    Ok(Content::Arena(Box::new(arena)))
  }

  /// Carves `size` bytes (rounded up to the word size) out of a vacant block.
  ///
  /// Nothing is modified unless the whole reservation succeeds.
  pub fn reserve(&mut self, size: usize, request: Request, fit: FitPolicy) -> ArenaResult<Reservation> {
    if size == 0 {
      return Err(ArenaError::InvalidArgument("zero-sized allocation"));
    }
    let rounded = word_align(size).ok_or(ArenaError::InvalidArgument("allocation size overflows"))?;

    let kind = request.flags.kind();
    if kind.hosts_arena() && rounded <= ARENA_HEADER_SIZE {
      return Err(ArenaError::InvalidArgument(
        "nested arena does not fit past its header",
      ));
    }

    let index = self
      .find_fit(rounded, fit)
      .ok_or(ArenaError::OutOfMemory {
        requested: rounded,
        largest_free: self.largest_free(),
      })?;

    let offset = self.blocks[index].offset();
    let leftover = self.blocks[index].len() - rounded;
    if leftover > 0 && self.blocks.len() >= self.max_blocks {
      return Err(ArenaError::BlockTableFull {
        max_blocks: self.max_blocks,
      });
    }

    let content = self.nested_content(&request, offset, rounded)?;
    let nested = request.nested.filter(|_| kind.hosts_arena()).map(|(id, _)| id);

    if leftover > 0 {
      let tail = self.blocks[index].split_off(rounded);
      self.blocks.insert(index + 1, tail);
    }
    self.blocks[index].occupy(Provenance::new(kind, request.flags), kind.reserves(), content);

    trace!(arena = %self.id, offset, len = rounded, ?kind, "reserved block");
    Ok(Reservation {
      ptr: self.region.at(offset),
      offset,
      len: rounded,
      nested,
    })
  }

  /// Vacates the block starting at `ptr` and merges it with vacant neighbours.
  pub fn release(&mut self, ptr: NonNull<u8>) -> ArenaResult<Release> {
    let offset = self.region.offset_of(ptr).ok_or(ArenaError::CorruptPointer)?;
    let index = self.index_of(offset).ok_or(ArenaError::CorruptPointer)?;

    let block = &mut self.blocks[index];
    if block.is_vacant() {
      return Err(ArenaError::DoubleFree);
    }
    let len = block.len();
    let arenas_dropped = block.vacate();
    self.coalesce(index);

    trace!(arena = %self.id, offset, len, arenas_dropped, "released block");
    Ok(Release {
      len,
      arenas_dropped,
      pristine: self.is_pristine(),
    })
  }

  fn coalesce(&mut self, mut index: usize) {
    if self.blocks.get(index + 1).is_some_and(Block::is_vacant) {
      let next = self.blocks.remove(index + 1);
      self.blocks[index].absorb(next);
    }

    if index > 0 && self.blocks[index - 1].is_vacant() {
      let current = self.blocks.remove(index);
      index -= 1;
      self.blocks[index].absorb(current);
    }
  }

  pub fn stats(&self) -> ArenaStats {
    let mut stats = ArenaStats {
      len: self.len(),
      n_blocks: self.blocks.len(),
      max_blocks: self.max_blocks,
      ..ArenaStats::default()
    };

    for block in &self.blocks {
      if block.is_vacant() {
        stats.free += block.available();
        stats.largest_free = stats.largest_free.max(block.available());
      } else {
        stats.used += block.used();
        stats.live_blocks += 1;
      }
    }
    stats
  }

  /// Checks the partition, counter and nesting invariants of this arena and everything
  /// nested in it.
  pub fn validate(&self) -> ArenaResult<()> {
    if self.blocks.is_empty() {
      return Err(ArenaError::Inconsistent("arena has no blocks"));
    }
    if self.blocks.len() > self.max_blocks {
      return Err(ArenaError::Inconsistent("block count exceeds capacity"));
    }

    let mut expected = 0;
    let mut prev_vacant = false;
    for block in &self.blocks {
      if block.offset() != expected {
        return Err(ArenaError::Inconsistent("blocks leave a gap or overlap"));
      }
      if block.len() == 0 {
        return Err(ArenaError::Inconsistent("zero-length block"));
      }
      if !is_word_aligned(block.used()) || !is_word_aligned(block.available()) {
        return Err(ArenaError::Inconsistent("block counters are not word aligned"));
      }
      if block.is_vacant() && (block.used() != 0 || !block.provenance().is_none()) {
        return Err(ArenaError::Inconsistent("vacant block carries data"));
      }
      if block.is_vacant() && prev_vacant {
        return Err(ArenaError::Inconsistent("adjacent vacant blocks were not merged"));
      }
      if let Some(nested) = block.nested() {
        self.validate_nested(block, nested)?;
      }

      prev_vacant = block.is_vacant();
      expected = block.end();
    }

    if expected != self.len() {
      return Err(ArenaError::Inconsistent("blocks do not cover the region"));
    }
    Ok(())
  }

  fn validate_nested(&self, block: &Block, nested: &Arena) -> ArenaResult<()> {
    if nested.parent != Some(self.id) {
      return Err(ArenaError::Inconsistent("nested arena names the wrong parent"));
    }
    if nested.host != Some(self.block_ptr(block)) {
      return Err(ArenaError::Inconsistent("nested arena names the wrong host"));
    }
    if nested.region.addr() != self.region.addr() + block.offset() + ARENA_HEADER_SIZE
      || nested.len() + ARENA_HEADER_SIZE != block.len()
    {
      return Err(ArenaError::Inconsistent("nested arena escapes its host block"));
    }
    nested.validate()
  }
}

unsafe impl Send for Arena {}
