use super::*;

#[test]
fn test_corner_offsets_match_index_bits() {
  for (i, [x, y, z]) in CORNER_OFFSETS.iter().enumerate() {
    assert_eq!(*x as usize, i & 1, "Corner {} x bit", i);
    assert_eq!(*y as usize, (i >> 1) & 1, "Corner {} y bit", i);
    assert_eq!(*z as usize, (i >> 2) & 1, "Corner {} z bit", i);
    assert_eq!(corner_index(*x, *y, *z), i);
  }
}

#[test]
fn test_defaults_are_sane() {
  assert!(DEFAULT_MAX_DEPTH >= 1 && DEFAULT_MAX_DEPTH <= MAX_SUPPORTED_DEPTH);
  assert!(DEFAULT_MIN_ERROR > 0.0);
  assert!(DEFAULT_PLANE_ANGULAR_TOLERANCE >= 0.0);
  assert!(DEFAULT_PLANE_LINEAR_TOLERANCE >= 0.0);
  assert!(DEFAULT_WELD_TOLERANCE > 0.0);
  // 3 bits per level must fit a u64 path
  assert!(MAX_SUPPORTED_DEPTH as u32 * 3 <= 64);
}
