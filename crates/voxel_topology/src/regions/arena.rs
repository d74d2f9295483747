//! Region storage keyed by stable ids.

use crate::types::{RegionId, RegionKind, Side};

/// Maximal set of voxels sharing a region id.
#[derive(Clone, Debug)]
pub struct Region {
  pub id: RegionId,
  pub kind: RegionKind,
  /// Member voxels (grid indices). May hold stale entries between a voxel
  /// move and the next [`crate::regions::SimplifyContext::refresh_region`].
  pub voxels: Vec<usize>,
  /// Cost of the whole region ending up foreground.
  pub cost_fg: f64,
  /// Cost of the whole region ending up background.
  pub cost_bg: f64,
  valid: bool,
}

impl Region {
  fn new(id: RegionId, kind: RegionKind) -> Self {
    Self {
      id,
      kind,
      voxels: Vec::new(),
      cost_fg: 0.0,
      cost_bg: 0.0,
      valid: true,
    }
  }

  #[inline]
  pub fn is_valid(&self) -> bool {
    self.valid
  }

  /// Side fixed by the region's kind, `None` while it is an undecided generator.
  #[inline]
  pub fn side(&self) -> Option<Side> {
    self.kind.is_terminal().then(|| self.kind.native_side())
  }

  #[inline]
  pub fn cost_to(&self, side: Side) -> f64 {
    match side {
      Side::Foreground => self.cost_fg,
      Side::Background => self.cost_bg,
    }
  }

  /// Positive for cut-leaning regions, negative for fill-leaning ones.
  #[inline]
  pub fn signed_cost(&self) -> f64 {
    self.cost_bg - self.cost_fg
  }

  /// Cost of the more expensive side; ranks violators in the repair loop.
  #[inline]
  pub fn magnitude(&self) -> f64 {
    self.cost_fg.max(self.cost_bg)
  }
}

/// Arena of regions. Invalidated regions keep their slot so ids stay stable.
#[derive(Clone, Debug, Default)]
pub struct RegionArena {
  regions: Vec<Region>,
}

impl RegionArena {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn alloc(&mut self, kind: RegionKind) -> RegionId {
    let id = self.regions.len() as RegionId;
    self.regions.push(Region::new(id, kind));
    id
  }

  /// Valid region `id`. Looking up a stale id is a maintenance bug.
  #[inline]
  pub fn get(&self, id: RegionId) -> &Region {
    let region = &self.regions[id as usize];
    assert!(region.valid, "lookup of invalidated region {id}");
    region
  }

  #[inline]
  pub fn get_mut(&mut self, id: RegionId) -> &mut Region {
    let region = &mut self.regions[id as usize];
    assert!(region.valid, "lookup of invalidated region {id}");
    region
  }

  #[inline]
  pub fn try_get(&self, id: RegionId) -> Option<&Region> {
    self.regions.get(id as usize).filter(|r| r.valid)
  }

  #[inline]
  pub fn is_valid(&self, id: RegionId) -> bool {
    self.try_get(id).is_some()
  }

  /// Kind of valid region `id`.
  #[inline]
  pub fn kind(&self, id: RegionId) -> RegionKind {
    self.get(id).kind
  }

  /// Invalidate `id`, returning its voxels.
  pub fn invalidate(&mut self, id: RegionId) -> Vec<usize> {
    let region = self.get_mut(id);
    region.valid = false;
    region.cost_fg = 0.0;
    region.cost_bg = 0.0;
    std::mem::take(&mut region.voxels)
  }

  /// Number of slots ever allocated (valid or not).
  #[inline]
  pub fn slot_count(&self) -> usize {
    self.regions.len()
  }

  /// Valid regions in id order.
  pub fn iter(&self) -> impl Iterator<Item = &Region> {
    self.regions.iter().filter(|r| r.valid)
  }

  /// Ids of valid regions of `kind`.
  pub fn ids_of(&self, kind: RegionKind) -> Vec<RegionId> {
    self.iter().filter(|r| r.kind == kind).map(|r| r.id).collect()
  }

  /// Ids of valid Cut and Fill regions.
  pub fn generator_ids(&self) -> Vec<RegionId> {
    self
      .iter()
      .filter(|r| r.kind.is_generator())
      .map(|r| r.id)
      .collect()
  }

  pub fn count(&self, kind: RegionKind) -> usize {
    self.iter().filter(|r| r.kind == kind).count()
  }
}
