use crate::prim::WORD_ALIGN;

pub const fn is_aligned(value: usize, align: usize) -> Option<bool> {
  if !align.is_power_of_two() {
    return None;
  }
  Some(value & (align - 1) == 0)
}

pub const fn align_up(value: usize, align: usize) -> Option<usize> {
  if !align.is_power_of_two() {
    return None;
  }

  let mask = align - 1;
  match value.checked_add(mask) {
    Some(sum) => Some(sum & !mask),
    None => None,
  }
}

pub const fn align_down(value: usize, align: usize) -> Option<usize> {
  if !align.is_power_of_two() {
    return None;
  }
  Some(value & !(align - 1))
}

/// Rounds a byte count up to the block granularity.
#[inline(always)]
pub const fn word_align(value: usize) -> Option<usize> {
  align_up(value, WORD_ALIGN)
}

#[inline(always)]
pub const fn is_word_aligned(value: usize) -> bool {
  value & (WORD_ALIGN - 1) == 0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_is_aligned() {
    assert_eq!(is_aligned(0, 4), Some(true));
    assert_eq!(is_aligned(4, 4), Some(true));
    assert_eq!(is_aligned(6, 4), Some(false));
    assert_eq!(is_aligned(6, 2), Some(true));
    assert_eq!(is_aligned(16, 8), Some(true));
    assert_eq!(is_aligned(12, 8), Some(false));

    assert_eq!(is_aligned(12, 3), None);
    assert_eq!(is_aligned(12, 0), None);
  }

  #[test]
  fn test_align_up() {
    assert_eq!(align_up(0, 4), Some(0));
    assert_eq!(align_up(1, 4), Some(4));
    assert_eq!(align_up(4, 4), Some(4));
    assert_eq!(align_up(5, 4), Some(8));
    assert_eq!(align_up(9, 8), Some(16));

    assert_eq!(align_up(usize::MAX, 4), None);
    assert_eq!(align_up(usize::MAX - 2, 4), None);
    assert_eq!(align_up(10, 6), None);
  }

  #[test]
  fn test_align_down() {
    assert_eq!(align_down(0, 4), Some(0));
    assert_eq!(align_down(3, 4), Some(0));
    assert_eq!(align_down(7, 4), Some(4));
    assert_eq!(align_down(1027, 1024), Some(1024));
    assert_eq!(align_down(7, 5), None);
  }

  #[test]
  fn test_word_align() {
    let expectations = [(1..=4, 4), (5..=8, 8), (97..=100, 100), (101..=104, 104)];

    for (sizes, expected) in expectations {
      for size in sizes {
        assert_eq!(word_align(size), Some(expected));
      }
    }

    assert_eq!(word_align(0), Some(0));
    assert_eq!(word_align(usize::MAX), None);
  }

  #[test]
  fn test_is_word_aligned() {
    assert!(is_word_aligned(0));
    assert!(is_word_aligned(100));
    assert!(is_word_aligned(1024));
    assert!(!is_word_aligned(2));
    assert!(!is_word_aligned(1023));
  }
}
