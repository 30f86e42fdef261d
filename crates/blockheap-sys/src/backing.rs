use core::ptr::NonNull;

use thiserror::Error;

use crate::{
  math::align_up,
  prim::page_size,
  region::{
    Region,
    RegionError,
  },
};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SysError {
  #[error("host memory is not available on this target")]
  Unsupported,
  #[error("host refused to map {0} bytes")]
  OutOfMemory(usize),
  #[error("invalid mapping request")]
  InvalidArgument,
  #[error(transparent)]
  Region(#[from] RegionError),
}

pub type SysResult<T> = Result<T, SysError>;

/// Where hosted builds get the fixed memory an allocator is initialised with.
///
/// # Safety
///
/// Implementors must ensure that:
/// - `map` returns a page-aligned, read/write span of at least `len` bytes owned by the caller
/// - `unmap` only releases spans previously returned by `map` on the same source
pub unsafe trait Source
where
  Self: Send + Sync,
{
  /// # Safety
  ///
  /// `len` must be a non-zero multiple of the page size.
  unsafe fn map(&self, len: usize) -> SysResult<NonNull<u8>> {
    _ = len;
    Err(SysError::Unsupported)
  }

  /// # Safety
  ///
  /// `base` and `len` must describe a live mapping from this source, which is not touched again.
  unsafe fn unmap(&self, base: NonNull<u8>, len: usize) -> SysResult<()> {
    _ = (base, len);
    Err(SysError::Unsupported)
  }
}

pub struct UnsupportedSource {}
unsafe impl Source for UnsupportedSource {}

#[cfg(any(target_os = "linux", target_os = "macos"))]
pub struct UnixSource {}

#[cfg(any(target_os = "linux", target_os = "macos"))]
unsafe impl Source for UnixSource {
  unsafe fn map(&self, len: usize) -> SysResult<NonNull<u8>> {
    if len == 0 || len % page_size() != 0 {
      return Err(SysError::InvalidArgument);
    }

    let prot = libc::PROT_READ | libc::PROT_WRITE;
    let flags = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;
    let ptr = unsafe { libc::mmap(core::ptr::null_mut(), len, prot, flags, -1, 0) };

    if ptr == libc::MAP_FAILED {
      return Err(SysError::OutOfMemory(len));
    }
    NonNull::new(ptr.cast::<u8>()).ok_or(SysError::OutOfMemory(len))
  }

  unsafe fn unmap(&self, base: NonNull<u8>, len: usize) -> SysResult<()> {
    let result = unsafe { libc::munmap(base.as_ptr().cast::<libc::c_void>(), len) };
    if result == 0 {
      return Ok(());
    }

    Err(SysError::InvalidArgument)
  }
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
pub static HOST: &dyn Source = &UnixSource {};

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub static HOST: &dyn Source = &UnsupportedSource {};

/// Owned, zero-filled host memory for running the allocator off-target.
///
/// The mapping is rounded up to whole pages; [`Backing::region`] exposes exactly the
/// requested length.
pub struct Backing {
  base: NonNull<u8>,
  len: usize,
  mapped: usize,
}

impl Backing {
  pub fn new(len: usize) -> SysResult<Self> {
    if len == 0 {
      return Err(SysError::Region(RegionError::Empty));
    }
    let mapped = align_up(len, page_size()).ok_or(SysError::Region(RegionError::Overflow))?;
    let base = unsafe { HOST.map(mapped) }?;

    Ok(Self { base, len, mapped })
  }

  pub fn len(&self) -> usize {
    self.len
  }

  /// Region spanning the requested length. The region must not outlive `self`.
  pub fn region(&self) -> SysResult<Region> {
    Ok(unsafe { Region::from_raw_parts(self.base, self.len) }?)
  }
}

impl Drop for Backing {
  fn drop(&mut self) {
    let _ = unsafe { HOST.unmap(self.base, self.mapped) };
  }
}

unsafe impl Send for Backing {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  #[cfg(any(target_os = "linux", target_os = "macos"))]
  fn test_backing_new() {
    let backing = Backing::new(1024).unwrap();
    let region = backing.region().unwrap();

    assert_eq!(backing.len(), 1024);
    assert_eq!(region.len(), 1024);
    assert_eq!(region.addr() % page_size(), 0);
  }

  #[test]
  #[cfg(any(target_os = "linux", target_os = "macos"))]
  fn test_backing_is_writable() {
    let backing = Backing::new(page_size() * 2).unwrap();
    let region = backing.region().unwrap();
    let bytes = unsafe { region.as_mut_slice() };

    assert!(bytes.iter().all(|b| *b == 0));
    bytes[0] = 42;
    bytes[bytes.len() - 1] = 24;
    assert_eq!(bytes[0], 42);
    assert_eq!(bytes[bytes.len() - 1], 24);
  }

  #[test]
  fn test_backing_zero_len() {
    assert!(matches!(
      Backing::new(0),
      Err(SysError::Region(RegionError::Empty))
    ));
  }

  #[test]
  #[cfg(any(target_os = "linux", target_os = "macos"))]
  fn test_backing_odd_len_region() {
    let backing = Backing::new(6).unwrap();
    assert_eq!(backing.region(), Err(SysError::Region(RegionError::Misaligned)));
  }

  #[test]
  fn test_unsupported_source() {
    let source = UnsupportedSource {};
    let mapped = unsafe { source.map(4096) };
    assert_eq!(mapped, Err(SysError::Unsupported));
  }
}
