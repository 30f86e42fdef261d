#![cfg_attr(not(test), no_std)]

//! The packed flags word shared with callers, and the tagged values it decodes to.
//!
//! ```text
//!  31            12 11  10   9   8  7          0
//! +----------------+---+---+---+---+------------+
//! |     unused     | S | A | O | U |  selector  |
//! +----------------+---+---+---+---+------------+
//! ```
//!
//! `U`/`O`/`A`/`S` are the internal allocation bits (in use, object, arena, subarena) shifted
//! left by [`USER_SHIFT`]. Selector 0 picks the default arena, selector `s` picks named slot
//! `s - 1`.

use core::ops::{
  BitAnd,
  BitOr,
};

pub const USER_SHIFT: u32 = 8;
pub const SELECTOR_MASK: u32 = 0xFF;

/// Internal allocation bits, as recorded on a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AllocBits(u32);

impl AllocBits {
  pub const NONE: Self = Self(0);
  pub const IN_USE: Self = Self(1 << 0);
  pub const OBJECT: Self = Self(1 << 1);
  pub const ARENA: Self = Self(1 << 2);
  pub const SUBARENA: Self = Self(1 << 3);

  const MASK: u32 = 0xF;

  #[inline(always)]
  pub const fn from_bits_truncate(bits: u32) -> Self {
    Self(bits & Self::MASK)
  }

  #[inline(always)]
  pub const fn bits(self) -> u32 {
    self.0
  }

  #[inline(always)]
  pub const fn contains(self, other: Self) -> bool {
    self.0 & other.0 == other.0
  }

  #[inline(always)]
  pub const fn union(self, other: Self) -> Self {
    Self(self.0 | other.0)
  }

  #[inline(always)]
  pub const fn is_empty(self) -> bool {
    self.0 == 0
  }
}

impl BitOr for AllocBits {
  type Output = Self;

  fn bitor(self, rhs: Self) -> Self {
    self.union(rhs)
  }
}

impl BitAnd for AllocBits {
  type Output = Self;

  fn bitand(self, rhs: Self) -> Self {
    Self(self.0 & rhs.0)
  }
}

/// How a block was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocKind {
  /// A plain object reservation.
  Object,
  /// A private nested arena; its hosting block stays reserved.
  Arena,
  /// A nested arena whose hosting block is not marked in use.
  Subarena,
}

impl AllocKind {
  /// Bits recorded on the block for this kind of request.
  pub const fn alloc_bits(self) -> AllocBits {
    match self {
      AllocKind::Object => AllocBits::IN_USE.union(AllocBits::OBJECT),
      AllocKind::Arena => AllocBits::IN_USE.union(AllocBits::ARENA),
      AllocKind::Subarena => AllocBits::SUBARENA,
    }
  }

  pub const fn content(self) -> ContentKind {
    match self {
      AllocKind::Object => ContentKind::Object,
      AllocKind::Arena | AllocKind::Subarena => ContentKind::Arena,
    }
  }

  pub const fn reserves(self) -> bool {
    !matches!(self, AllocKind::Subarena)
  }

  pub const fn hosts_arena(self) -> bool {
    matches!(self, AllocKind::Arena | AllocKind::Subarena)
  }
}

/// What currently occupies a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
  Empty,
  Object,
  Arena,
}

impl ContentKind {
  /// Content bits as packed into a block header.
  pub const fn content_bits(self, reserved: bool) -> AllocBits {
    let content = match self {
      ContentKind::Empty => AllocBits::NONE,
      ContentKind::Object => AllocBits::OBJECT,
      ContentKind::Arena => AllocBits::ARENA,
    };
    if reserved {
      content.union(AllocBits::IN_USE)
    } else {
      content
    }
  }
}

/// The caller-visible flags word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AllocFlags(u32);

impl AllocFlags {
  pub const DEFAULT: Self = Self(0);

  /// Keeps every bit, including unused ones, so the caller's word can be reported back.
  #[inline(always)]
  pub const fn from_bits(bits: u32) -> Self {
    Self(bits)
  }

  #[inline(always)]
  pub const fn bits(self) -> u32 {
    self.0
  }

  #[inline(always)]
  pub const fn selector(self) -> u8 {
    (self.0 & SELECTOR_MASK) as u8
  }

  /// Named slot addressed by the selector, or `None` for the default arena.
  pub const fn slot(self) -> Option<usize> {
    match self.selector() {
      0 => None,
      s => Some(s as usize - 1),
    }
  }

  #[inline(always)]
  pub const fn alloc_bits(self) -> AllocBits {
    AllocBits::from_bits_truncate(self.0 >> USER_SHIFT)
  }

  pub const fn kind(self) -> AllocKind {
    let bits = self.alloc_bits();
    if bits.contains(AllocBits::SUBARENA) {
      AllocKind::Subarena
    } else if bits.contains(AllocBits::ARENA) {
      AllocKind::Arena
    } else {
      AllocKind::Object
    }
  }

  pub const fn with_selector(self, selector: u8) -> Self {
    Self((self.0 & !SELECTOR_MASK) | selector as u32)
  }

  /// Flags addressing named `slot`. Slots past 254 cannot be encoded and saturate.
  pub const fn for_slot(slot: usize) -> Self {
    let selector = if slot >= SELECTOR_MASK as usize {
      SELECTOR_MASK as u8
    } else {
      slot as u8 + 1
    };
    Self::DEFAULT.with_selector(selector)
  }

  pub const fn with_kind(self, kind: AllocKind) -> Self {
    let cleared = self.0 & !(AllocBits::MASK << USER_SHIFT);
    Self(cleared | kind.alloc_bits().bits() << USER_SHIFT)
  }

  pub const fn object() -> Self {
    Self::DEFAULT.with_kind(AllocKind::Object)
  }

  pub const fn arena() -> Self {
    Self::DEFAULT.with_kind(AllocKind::Arena)
  }

  pub const fn subarena() -> Self {
    Self::DEFAULT.with_kind(AllocKind::Subarena)
  }
}

impl From<u32> for AllocFlags {
  fn from(bits: u32) -> Self {
    Self::from_bits(bits)
  }
}

impl From<AllocFlags> for u32 {
  fn from(flags: AllocFlags) -> Self {
    flags.bits()
  }
}

/// Immutable record of how a block came to be, kept for diagnostics and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Provenance {
  alloc: AllocBits,
  user: AllocFlags,
}

impl Provenance {
  pub const NONE: Self = Self {
    alloc: AllocBits::NONE,
    user: AllocFlags::DEFAULT,
  };

  pub const fn new(kind: AllocKind, user: AllocFlags) -> Self {
    Self {
      alloc: kind.alloc_bits(),
      user,
    }
  }

  pub const fn alloc_bits(&self) -> AllocBits {
    self.alloc
  }

  pub const fn user_flags(&self) -> AllocFlags {
    self.user
  }

  pub const fn is_none(&self) -> bool {
    self.alloc.is_empty() && self.user.bits() == 0
  }
}

#[cfg(test)]
mod tests;
