use alloc::boxed::Box;
use core::mem;

use blockheap_flags::{
  AllocBits,
  ContentKind,
  Provenance,
};
use getset::CopyGetters;

use crate::arena::Arena;

/// What occupies a block. A hosting block owns the arena nested inside it.
#[derive(Debug)]
pub enum Content {
  Empty,
  Object,
  Arena(Box<Arena>),
}

impl Content {
  pub fn kind(&self) -> ContentKind {
    match self {
      Content::Empty => ContentKind::Empty,
      Content::Object => ContentKind::Object,
      Content::Arena(_) => ContentKind::Arena,
    }
  }
}

/// A sub-range of an arena: `offset` is relative to the arena base and
/// `used + available` is the block length.
#[derive(Debug, CopyGetters)]
pub struct Block {
  #[getset(get_copy = "pub")]
  offset: usize,
  #[getset(get_copy = "pub")]
  used: usize,
  #[getset(get_copy = "pub")]
  available: usize,
  #[getset(get_copy = "pub")]
  reserved: bool,
  #[getset(get_copy = "pub")]
  provenance: Provenance,
  content: Content,
}

impl Block {
  pub(crate) fn vacant(offset: usize, len: usize) -> Self {
    Self {
      offset,
      used: 0,
      available: len,
      reserved: false,
      provenance: Provenance::NONE,
      content: Content::Empty,
    }
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.used + self.available
  }

  #[inline(always)]
  pub fn end(&self) -> usize {
    self.offset + self.len()
  }

  /// Free for reuse: not reserved and holding nothing.
  #[inline(always)]
  pub fn is_vacant(&self) -> bool {
    !self.reserved && matches!(self.content, Content::Empty)
  }

  pub fn content(&self) -> &Content {
    &self.content
  }

  pub fn content_kind(&self) -> ContentKind {
    self.content.kind()
  }

  /// Content bits in the packed header layout: in use, object, arena.
  pub fn content_bits(&self) -> AllocBits {
    self.content_kind().content_bits(self.reserved)
  }

  pub fn nested(&self) -> Option<&Arena> {
    match &self.content {
      Content::Arena(arena) => Some(&**arena),
      _ => None,
    }
  }

  pub fn nested_mut(&mut self) -> Option<&mut Arena> {
    match &mut self.content {
      Content::Arena(arena) => Some(&mut **arena),
      _ => None,
    }
  }

  pub(crate) fn occupy(&mut self, provenance: Provenance, reserved: bool, content: Content) {
    self.used = self.len();
    self.available = 0;
    self.reserved = reserved;
    self.provenance = provenance;
    self.content = content;
  }

  /// Shrinks a vacant block to `len` bytes, returning the vacant tail.
  pub(crate) fn split_off(&mut self, len: usize) -> Block {
    debug_assert!(self.is_vacant());
    let tail = Block::vacant(self.offset + len, self.len() - len);
    self.used = 0;
    self.available = len;
    tail
  }

  pub(crate) fn absorb(&mut self, other: Block) {
    debug_assert_eq!(self.end(), other.offset);
    self.available += other.len();
  }

  /// Marks the block vacant and returns how many arenas were dropped with its content.
  pub(crate) fn vacate(&mut self) -> usize {
    let dropped = match mem::replace(&mut self.content, Content::Empty) {
      Content::Arena(arena) => arena.arena_count(),
      _ => 0,
    };
    self.available = self.len();
    self.used = 0;
    self.reserved = false;
    self.provenance = Provenance::NONE;
    dropped
  }
}
