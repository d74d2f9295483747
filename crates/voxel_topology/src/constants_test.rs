use super::*;

#[test]
fn test_bit_offset_roundtrip() {
  for bit in 0..NEIGHBORHOOD_SIZE as u32 {
    let o = bit_to_offset(bit);
    assert_eq!(offset_to_bit(o.x, o.y, o.z), bit, "Roundtrip failed for bit {}", bit);
  }
}

#[test]
fn test_center_bit() {
  assert_eq!(bit_to_offset(CENTER_BIT), IVec3::ZERO);
  assert_eq!(NEIGHBOR_MASK & (1 << CENTER_BIT), 0);
  assert_eq!(NEIGHBOR_MASK.count_ones(), 26);
}

#[test]
fn test_mask_sizes() {
  assert_eq!(N6_MASK.count_ones(), 6);
  assert_eq!(N18_MASK.count_ones(), 18);
  assert_eq!(N26_MASK.count_ones(), 26);
  assert_eq!(N26_MASK, NEIGHBOR_MASK);
  assert_eq!(N6_MASK & !N18_MASK, 0);
}

#[test]
fn test_face_offsets_match_n6() {
  let mut mask = 0u32;
  for o in FACE_OFFSETS {
    assert_eq!(offset_order(o), 1);
    mask |= 1 << offset_to_bit(o.x, o.y, o.z);
  }
  assert_eq!(mask, N6_MASK);
}

#[test]
fn test_neighbor_offsets_are_unique_and_ordered() {
  let bits: Vec<u32> = NEIGHBOR_OFFSETS
    .iter()
    .map(|o| offset_to_bit(o.x, o.y, o.z))
    .collect();
  assert!(bits.windows(2).all(|w| w[0] < w[1]));
  assert!(!bits.contains(&CENTER_BIT));
}

#[test]
fn test_table_sizes() {
  assert_eq!(TABLE_ENTRIES, 134_217_728);
  assert_eq!(PACKED_TABLE_BYTES * 8, TABLE_ENTRIES);
}
