use core::sync::atomic::{
  AtomicUsize,
  Ordering,
};

/// Granularity of every block offset and length.
pub const WORD_ALIGN: usize = 4;

/// Bytes at the front of a hosting block kept for the nested arena's descriptor.
/// Sized for the 28-byte on-target arena descriptor.
pub const ARENA_HEADER_SIZE: usize = 28;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const COMMON_PAGE_SIZE: usize = 4096;

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn page_size_helper() -> usize {
  unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn page_size_helper() -> usize {
  COMMON_PAGE_SIZE
}

/// Page size of the host; only used when backing memory comes from the OS.
pub fn page_size() -> usize {
  static PAGE_SIZE: AtomicUsize = AtomicUsize::new(0);

  match PAGE_SIZE.load(Ordering::Acquire) {
    0 => {
      let size = page_size_helper();
      PAGE_SIZE.store(size, Ordering::Release);
      size
    }
    size => size,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::math::is_word_aligned;

  #[test]
  fn test_header_is_word_aligned() {
    assert!(is_word_aligned(ARENA_HEADER_SIZE));
    assert!(WORD_ALIGN.is_power_of_two());
  }

  #[test]
  fn test_page_size() {
    let size = page_size();
    assert!(size > 0);
    assert!(size.is_power_of_two());
    assert_eq!(page_size(), size);
  }
}
