use core::ptr::NonNull;

use thiserror::Error;

use crate::math::is_word_aligned;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegionError {
  #[error("region is empty")]
  Empty,
  #[error("region base or length is not word aligned")]
  Misaligned,
  #[error("region end overflows the address space")]
  Overflow,
  #[error("sub-range {offset}+{len} lies outside the region")]
  OutOfBounds { offset: usize, len: usize },
}

pub type RegionResult<T> = Result<T, RegionError>;

/// A fixed span of memory handed to the allocator: base address plus length.
///
/// The allocator only does address arithmetic on a region. Pointers derived from it keep the
/// provenance of `base`, so handing them back to the owner of the memory is sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
  base: NonNull<u8>,
  len: usize,
}

impl Region {
  /// # Safety
  ///
  /// `base..base + len` must be valid for reads and writes and must not be used by anything
  /// other than the allocator for as long as the region (or any pointer carved out of it) is
  /// alive.
  pub unsafe fn from_raw_parts(base: NonNull<u8>, len: usize) -> RegionResult<Self> {
    if len == 0 {
      return Err(RegionError::Empty);
    }
    let addr = base.as_ptr() as usize;
    if !is_word_aligned(addr) || !is_word_aligned(len) {
      return Err(RegionError::Misaligned);
    }
    addr.checked_add(len).ok_or(RegionError::Overflow)?;

    Ok(Self { base, len })
  }

  /// # Safety
  ///
  /// Same contract as [`Region::from_raw_parts`], applied to the whole slice.
  pub unsafe fn from_slice(slice: &mut [u8]) -> RegionResult<Self> {
    let len = slice.len();
    let base = NonNull::from(slice).cast::<u8>();
    unsafe { Self::from_raw_parts(base, len) }
  }

  #[inline(always)]
  pub const fn base(&self) -> NonNull<u8> {
    self.base
  }

  #[inline(always)]
  pub const fn len(&self) -> usize {
    self.len
  }

  #[inline(always)]
  pub fn addr(&self) -> usize {
    self.base.as_ptr() as usize
  }

  #[inline(always)]
  pub fn end(&self) -> usize {
    // checked in the constructor
    self.addr() + self.len
  }

  pub fn contains(&self, ptr: NonNull<u8>) -> bool {
    let addr = ptr.as_ptr() as usize;
    addr >= self.addr() && addr < self.end()
  }

  pub fn overlaps(&self, other: &Region) -> bool {
    self.addr() < other.end() && other.addr() < self.end()
  }

  /// Byte offset of `ptr` from the base, if `ptr` lies inside the region.
  pub fn offset_of(&self, ptr: NonNull<u8>) -> Option<usize> {
    if !self.contains(ptr) {
      return None;
    }
    Some(ptr.as_ptr() as usize - self.addr())
  }

  /// Pointer `offset` bytes past the base. `offset` may equal `len` (one past the end).
  pub fn at(&self, offset: usize) -> NonNull<u8> {
    debug_assert!(offset <= self.len);
    // SAFETY: offset stays within (or one past) the region, which is a single allocation.
    unsafe { self.base.add(offset) }
  }

  pub fn sub(&self, offset: usize, len: usize) -> RegionResult<Region> {
    let end = offset
      .checked_add(len)
      .ok_or(RegionError::OutOfBounds { offset, len })?;
    if end > self.len {
      return Err(RegionError::OutOfBounds { offset, len });
    }
    if len == 0 {
      return Err(RegionError::Empty);
    }
    if !is_word_aligned(offset) || !is_word_aligned(len) {
      return Err(RegionError::Misaligned);
    }

    Ok(Region {
      base: self.at(offset),
      len,
    })
  }

  /// # Safety
  ///
  /// No other reference to the region's bytes may be live for the returned lifetime.
  pub unsafe fn as_mut_slice<'mem>(&self) -> &'mem mut [u8] {
    unsafe { core::slice::from_raw_parts_mut(self.base.as_ptr(), self.len) }
  }
}

unsafe impl Send for Region {}
unsafe impl Sync for Region {}
