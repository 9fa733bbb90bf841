use log::debug;
use serde::Serialize;

use crate::constants::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheLine {
    pub tag: u64,
    pub valid: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelStats {
    pub hits: u64,
    pub misses: u64,
}

impl LevelStats {
    /// Hits as a percentage of accesses, 0 before the first access
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64 * 100.0
    }
}

/// One direct-mapped cache level
#[derive(Debug)]
pub struct CacheLevel {
    name: &'static str,
    lines: Vec<CacheLine>,
    stats: LevelStats,
}

impl CacheLevel {
    pub fn new(name: &'static str, num_lines: usize) -> Self {
        CacheLevel {
            name,
            lines: vec![CacheLine::default(); num_lines],
            stats: LevelStats::default(),
        }
    }

    /// `(line index, tag)` for a physical address
    #[inline]
    pub fn locate(&self, physical: u64) -> (usize, u64) {
        let block = physical / CACHE_BLOCK_SIZE as u64;
        let num_lines = self.lines.len() as u64;
        ((block % num_lines) as usize, block / num_lines)
    }

    /// Counted lookup; a miss installs the block.
    pub fn access(&mut self, physical: u64) -> bool {
        let (index, tag) = self.locate(physical);
        let line = &mut self.lines[index];

        if line.valid && line.tag == tag {
            self.stats.hits += 1;
            debug!("{} hit: pa={} line={} tag={}", self.name, physical, index, tag);
            return true;
        }

        self.stats.misses += 1;
        debug!("{} miss: pa={} line={} tag={}", self.name, physical, index, tag);
        *line = CacheLine { tag, valid: true };
        false
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    pub fn stats(&self) -> LevelStats {
        self.stats
    }
}

/// Which level satisfied an access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessOutcome {
    L1Hit,
    L2Hit,
    Miss,
}

#[derive(Debug)]
pub struct CacheHierarchy {
    l1: CacheLevel,
    l2: CacheLevel,
}

impl CacheHierarchy {
    pub fn new() -> Self {
        CacheHierarchy {
            l1: CacheLevel::new("L1", L1_LINES),
            l2: CacheLevel::new("L2", L2_LINES),
        }
    }

    /// L1, then L2 with promotion into L1, else fill L2 then L1 from memory.
    ///
    /// Promotion and fills go through the counted lookup, so each of them
    /// shows up in the level's stats.
    pub fn access(&mut self, physical: u64) -> AccessOutcome {
        if self.l1.access(physical) {
            return AccessOutcome::L1Hit;
        }

        if self.l2.access(physical) {
            self.l1.access(physical);
            return AccessOutcome::L2Hit;
        }

        self.l2.access(physical);
        self.l1.access(physical);
        AccessOutcome::Miss
    }

    pub fn l1(&self) -> &CacheLevel {
        &self.l1
    }

    pub fn l2(&self) -> &CacheLevel {
        &self.l2
    }
}

impl Default for CacheHierarchy {
    fn default() -> Self {
        Self::new()
    }
}
