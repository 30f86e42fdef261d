use super::*;

#[test]
fn test_internal_bit_positions() {
  assert_eq!(AllocBits::IN_USE.bits(), 0b0001);
  assert_eq!(AllocBits::OBJECT.bits(), 0b0010);
  assert_eq!(AllocBits::ARENA.bits(), 0b0100);
  assert_eq!(AllocBits::SUBARENA.bits(), 0b1000);
}

#[test]
fn test_user_bits_are_shifted_internal_bits() {
  assert_eq!(AllocFlags::object().bits(), 0x0300);
  assert_eq!(AllocFlags::arena().bits(), 0x0500);
  assert_eq!(AllocFlags::subarena().bits(), 0x0800);

  let flags = AllocFlags::from_bits(0x0503);
  assert_eq!(flags.alloc_bits(), AllocBits::IN_USE | AllocBits::ARENA);
  assert_eq!(flags.selector(), 3);
}

#[test]
fn test_selector_maps_to_slot() {
  assert_eq!(AllocFlags::DEFAULT.slot(), None);
  assert_eq!(AllocFlags::from_bits(1).slot(), Some(0));
  assert_eq!(AllocFlags::from_bits(8).slot(), Some(7));
  assert_eq!(AllocFlags::from_bits(9).slot(), Some(8));
  assert_eq!(AllocFlags::from_bits(0x0804).slot(), Some(3));

  for slot in 0..8 {
    assert_eq!(AllocFlags::for_slot(slot).slot(), Some(slot));
  }
  assert_eq!(AllocFlags::for_slot(4000).selector(), 0xFF);
}

#[test]
fn test_kind_decoding() {
  assert_eq!(AllocFlags::DEFAULT.kind(), AllocKind::Object);
  assert_eq!(AllocFlags::object().kind(), AllocKind::Object);
  assert_eq!(AllocFlags::arena().kind(), AllocKind::Arena);
  assert_eq!(AllocFlags::subarena().kind(), AllocKind::Subarena);

  // subarena wins when a caller sets both
  let both = AllocFlags::from_bits((AllocBits::ARENA | AllocBits::SUBARENA).bits() << USER_SHIFT);
  assert_eq!(both.kind(), AllocKind::Subarena);
}

#[test]
fn test_with_kind_keeps_selector() {
  let flags = AllocFlags::for_slot(2).with_kind(AllocKind::Subarena);
  assert_eq!(flags.selector(), 3);
  assert_eq!(flags.kind(), AllocKind::Subarena);

  let flags = flags.with_kind(AllocKind::Object);
  assert_eq!(flags.selector(), 3);
  assert_eq!(flags.alloc_bits(), AllocBits::IN_USE | AllocBits::OBJECT);
}

#[test]
fn test_with_selector_keeps_kind() {
  let flags = AllocFlags::arena().with_selector(7);
  assert_eq!(flags.kind(), AllocKind::Arena);
  assert_eq!(flags.selector(), 7);
  assert_eq!(flags.bits(), 0x0507);
}

#[test]
fn test_unused_bits_survive() {
  let raw = 0xABCD_0102;
  let flags = AllocFlags::from(raw);
  assert_eq!(u32::from(flags), raw);
  assert_eq!(flags.selector(), 0x02);
  assert_eq!(flags.alloc_bits(), AllocBits::IN_USE);
}

#[test]
fn test_kind_properties() {
  assert!(AllocKind::Object.reserves());
  assert!(AllocKind::Arena.reserves());
  assert!(!AllocKind::Subarena.reserves());

  assert!(!AllocKind::Object.hosts_arena());
  assert!(AllocKind::Arena.hosts_arena());
  assert!(AllocKind::Subarena.hosts_arena());

  assert_eq!(AllocKind::Object.content(), ContentKind::Object);
  assert_eq!(AllocKind::Subarena.content(), ContentKind::Arena);
}

#[test]
fn test_content_bits() {
  assert_eq!(ContentKind::Empty.content_bits(false), AllocBits::NONE);
  assert_eq!(
    ContentKind::Object.content_bits(true),
    AllocBits::IN_USE | AllocBits::OBJECT
  );
  // a subarena host carries the arena bit without the in-use bit
  assert_eq!(ContentKind::Arena.content_bits(false), AllocBits::ARENA);
}

#[test]
fn test_provenance() {
  assert!(Provenance::NONE.is_none());
  assert!(Provenance::default().is_none());

  let flags = AllocFlags::for_slot(1).with_kind(AllocKind::Subarena);
  let provenance = Provenance::new(flags.kind(), flags);
  assert!(!provenance.is_none());
  assert_eq!(provenance.alloc_bits(), AllocBits::SUBARENA);
  assert_eq!(provenance.user_flags(), flags);
}
