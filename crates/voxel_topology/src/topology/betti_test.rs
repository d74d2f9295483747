use super::*;

fn mask(dims: IVec3, f: impl Fn(IVec3) -> bool) -> Vec<bool> {
  let mut out = Vec::with_capacity((dims.x * dims.y * dims.z) as usize);
  for z in 0..dims.z {
    for y in 0..dims.y {
      for x in 0..dims.x {
        out.push(f(IVec3::new(x, y, z)));
      }
    }
  }
  out
}

fn in_box(p: IVec3, lo: i32, hi: i32) -> bool {
  p.cmpge(IVec3::splat(lo)).all() && p.cmple(IVec3::splat(hi)).all()
}

#[test]
fn test_empty_volume() {
  let dims = IVec3::splat(3);
  let (betti, counts) = BettiNumbers::of_mask(dims, &mask(dims, |_| false), Connectivity::TwentySix);
  assert_eq!(betti, BettiNumbers::default());
  assert_eq!(counts.chi(), 0);
}

#[test]
fn test_hollow_cube_has_one_cavity() {
  let dims = IVec3::splat(5);
  let m = mask(dims, |p| in_box(p, 1, 3) && p != IVec3::splat(2));
  for connectivity in [Connectivity::Six, Connectivity::TwentySix] {
    let (betti, counts) = BettiNumbers::of_mask(dims, &m, connectivity);
    assert_eq!(betti, BettiNumbers { h0: 1, h1: 0, h2: 1 }, "{:?}", connectivity);
    assert_eq!(counts.chi(), 2);
    assert_eq!(betti.euler_characteristic(), counts.chi());
  }
}

#[test]
fn test_ring_has_one_handle() {
  // 3×3 square ring in the z = 1 plane.
  let dims = IVec3::new(5, 5, 3);
  let m = mask(dims, |p| {
    p.z == 1 && (1..=3).contains(&p.x) && (1..=3).contains(&p.y) && !(p.x == 2 && p.y == 2)
  });
  for connectivity in [Connectivity::Six, Connectivity::TwentySix] {
    let (betti, counts) = BettiNumbers::of_mask(dims, &m, connectivity);
    assert_eq!(betti, BettiNumbers { h0: 1, h1: 1, h2: 0 }, "{:?}", connectivity);
    assert_eq!(betti.euler_characteristic(), counts.chi());
  }
}

#[test]
fn test_diagonal_pair_depends_on_connectivity() {
  let dims = IVec3::splat(4);
  let m = mask(dims, |p| p == IVec3::new(1, 1, 1) || p == IVec3::new(2, 2, 2));
  let (six, _) = BettiNumbers::of_mask(dims, &m, Connectivity::Six);
  let (twenty_six, _) = BettiNumbers::of_mask(dims, &m, Connectivity::TwentySix);
  assert_eq!(six.h0, 2);
  assert_eq!(twenty_six.h0, 1);
  assert_eq!(six.h1 + six.h2 + twenty_six.h1 + twenty_six.h2, 0);
}

#[test]
fn test_delta_from_parts() {
  let delta = BettiDelta::from_parts(0, -1, -1);
  assert_eq!(delta, BettiDelta { h0: 0, h1: 0, h2: -1 });
  assert_eq!(delta.total(), -1);
}

#[test]
fn test_count_components_background() {
  let dims = IVec3::splat(5);
  let m = mask(dims, |p| in_box(p, 1, 3) && p != IVec3::splat(2));
  assert_eq!(count_components(dims, &m, false, Connectivity::Six), 2);
  assert_eq!(count_components(dims, &m, true, Connectivity::TwentySix), 1);
}
