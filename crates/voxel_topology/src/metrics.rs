//! Run statistics: per-stage wall clock times, stage counters and rolling
//! windows of per-cluster solve times.
//!
//! # Usage
//!
//! ```ignore
//! let mut timings = StageTimings::default();
//! let queues = timings.time(Stage::Label, || label_terminals(&mut ctx));
//! println!("{}", timings);
//! ```

use std::collections::VecDeque;
use std::fmt;

use web_time::Instant;

use crate::generators::SimplifierStats;
use crate::greedy::GreedyStats;
use crate::solve::SolveStats;

/// Rolling window for storing recent values (e.g., timing history).
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
  buffer: VecDeque<T>,
  capacity: usize,
}

impl<T> RollingWindow<T> {
  /// Create a new rolling window with the given capacity.
  pub fn new(capacity: usize) -> Self {
    Self {
      buffer: VecDeque::with_capacity(capacity),
      capacity,
    }
  }

  /// Push a new value, evicting the oldest if at capacity.
  pub fn push(&mut self, value: T) {
    if self.buffer.len() >= self.capacity {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
  }

  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

}

impl<T: Copy + Default + std::ops::Add<Output = T>> RollingWindow<T> {
  pub fn sum(&self) -> T {
    self.buffer.iter().copied().fold(T::default(), |acc, x| acc + x)
  }
}

impl RollingWindow<u64> {
  pub fn average(&self) -> f64 {
    if self.buffer.is_empty() {
      0.0
    } else {
      self.sum() as f64 / self.buffer.len() as f64
    }
  }

  pub fn min_max(&self) -> Option<(u64, u64)> {
    let min = *self.buffer.iter().min()?;
    let max = *self.buffer.iter().max()?;
    Some((min, max))
  }
}

impl Default for RollingWindow<u64> {
  fn default() -> Self {
    Self::new(256)
  }
}

/// Pipeline stages with their own timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
  Label,
  Grow,
  Generators,
  Simplify,
  Isolation,
  Local,
  Global,
  Greedy,
}

impl Stage {
  pub const ALL: [Stage; 8] = [
    Stage::Label,
    Stage::Grow,
    Stage::Generators,
    Stage::Simplify,
    Stage::Isolation,
    Stage::Local,
    Stage::Global,
    Stage::Greedy,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Stage::Label => "label",
      Stage::Grow => "grow",
      Stage::Generators => "generators",
      Stage::Simplify => "simplify",
      Stage::Isolation => "isolation",
      Stage::Local => "local",
      Stage::Global => "global",
      Stage::Greedy => "greedy",
    }
  }
}

/// Accumulated wall clock time per stage, in microseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageTimings {
  us: [u64; Stage::ALL.len()],
}

impl StageTimings {
  pub fn record(&mut self, stage: Stage, us: u64) {
    self.us[stage as usize] += us;
  }

  /// Run `f` and add its duration to `stage`.
  pub fn time<R>(&mut self, stage: Stage, f: impl FnOnce() -> R) -> R {
    let start = Instant::now();
    let out = f();
    self.record(stage, start.elapsed().as_micros() as u64);
    out
  }

  pub fn get(&self, stage: Stage) -> u64 {
    self.us[stage as usize]
  }

  pub fn total_us(&self) -> u64 {
    self.us.iter().sum()
  }

  pub fn iter(&self) -> impl Iterator<Item = (Stage, u64)> + '_ {
    Stage::ALL.iter().map(|&s| (s, self.get(s)))
  }
}

impl fmt::Display for StageTimings {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, (stage, us)) in self.iter().enumerate() {
      if i > 0 {
        write!(f, " ")?;
      }
      write!(f, "{}={:.1}ms", stage.name(), us as f64 / 1000.0)?;
    }
    Ok(())
  }
}

/// Counters and timings of one pipeline run.
#[derive(Clone, Debug, Default)]
pub struct PipelineStats {
  pub timings: StageTimings,
  /// Voxels absorbed by the grower into Core / Neighborhood.
  pub grown: [usize; 2],
  /// Generators right after labeling.
  pub initial_generators: usize,
  pub simplifier: SimplifierStats,
  /// Isolated generators moved to the opposite side.
  pub isolated: usize,
  pub solve: SolveStats,
  /// Present when the greedy pass decided the generators.
  pub greedy: Option<GreedyStats>,
}
