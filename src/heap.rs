use std::fmt;
use std::str::FromStr;

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::{Result, SimError};

/// Placement strategy used to pick a free block for an allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStrategy {
    #[default]
    FirstFit,
    BestFit,
    WorstFit,
}

impl FromStr for AllocationStrategy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "first" => Ok(AllocationStrategy::FirstFit),
            "best" => Ok(AllocationStrategy::BestFit),
            "worst" => Ok(AllocationStrategy::WorstFit),
            other => Err(SimError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AllocationStrategy::FirstFit => "First Fit",
            AllocationStrategy::BestFit => "Best Fit",
            AllocationStrategy::WorstFit => "Worst Fit",
        };
        f.write_str(name)
    }
}

/// A contiguous span of the heap, either free or owned by one allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryBlock {
    pub start: usize,
    pub size: usize,
    /// `None` while the block is free
    pub id: Option<u32>,
}

impl MemoryBlock {
    fn free(start: usize, size: usize) -> Self {
        MemoryBlock { start, size, id: None }
    }

    fn used(start: usize, size: usize, id: u32) -> Self {
        MemoryBlock { start, size, id: Some(id) }
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.id.is_none()
    }

    /// One past the last byte of the block
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.size
    }
}

impl fmt::Display for MemoryBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04x} - 0x{:04x}] ", self.start, self.end() - 1)?;
        match self.id {
            None => write!(f, "FREE"),
            Some(id) => write!(f, "USED (id={})", id),
        }
    }
}

/// A successful allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub id: u32,
    pub start: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocCounters {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
}

/// Point-in-time view of the heap for reporting
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeapStats {
    pub total: usize,
    pub used: usize,
    pub free: usize,
    pub largest_free: usize,
    pub utilization_pct: f64,
    pub external_fragmentation_pct: f64,
    pub internal_fragmentation_pct: f64,
    pub counters: AllocCounters,
}

/// Explicit free-list heap over a single linear range `[0, size)`
///
/// Blocks are kept sorted by start offset, cover the whole range without
/// gaps or overlap, and no two neighbours are ever both free.
#[derive(Debug)]
pub struct HeapAllocator {
    blocks: Vec<MemoryBlock>,
    strategy: AllocationStrategy,
    next_id: u32,
    counters: AllocCounters,
}

impl HeapAllocator {
    pub fn new(strategy: AllocationStrategy) -> Self {
        HeapAllocator {
            blocks: Vec::new(),
            strategy,
            next_id: 1,
            counters: AllocCounters::default(),
        }
    }

    /// Discard every block and start over with one free block of `size` bytes.
    /// Allocation counters survive re-initialization.
    pub fn initialize(&mut self, size: i64) -> Result<()> {
        let size = positive_size(size)?;
        self.blocks.clear();
        self.blocks.push(MemoryBlock::free(0, size));
        self.next_id = 1;
        info!("heap initialized with {} bytes", size);
        Ok(())
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        !self.blocks.is_empty()
    }

    pub fn strategy(&self) -> AllocationStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: AllocationStrategy) {
        info!("allocation strategy set to {}", strategy);
        self.strategy = strategy;
    }

    /// Carve `size` bytes from the front of the free block chosen by the
    /// active strategy.
    pub fn allocate(&mut self, size: i64) -> Result<Allocation> {
        let size = positive_size(size)?;
        if !self.is_initialized() {
            return Err(SimError::NotInitialized);
        }

        self.counters.requests += 1;

        let id = self.next_id;
        let (Some(index), Some(next_id)) = (self.select_block(size), id.checked_add(1)) else {
            self.counters.failures += 1;
            warn!("allocation of {} bytes failed ({})", size, self.strategy);
            return Err(SimError::OutOfMemory { requested: size });
        };

        self.counters.successes += 1;
        self.next_id = next_id;

        let chosen = &mut self.blocks[index];
        let start = chosen.start;
        chosen.start += size;
        chosen.size -= size;
        if chosen.size == 0 {
            self.blocks.remove(index);
        }
        self.blocks.insert(index, MemoryBlock::used(start, size, id));

        debug!("allocated id={} at 0x{:04x} ({} bytes)", id, start, size);
        Ok(Allocation { id, start, size })
    }

    /// Index of the free block the active strategy picks for `size` bytes.
    /// Ties go to the lowest address.
    fn select_block(&self, size: usize) -> Option<usize> {
        let mut candidates = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| block.is_free() && block.size >= size);

        let chosen = match self.strategy {
            AllocationStrategy::FirstFit => candidates.next(),
            AllocationStrategy::BestFit => candidates.min_by_key(|(_, block)| block.size),
            AllocationStrategy::WorstFit => {
                candidates.reduce(|best, next| if next.1.size > best.1.size { next } else { best })
            }
        };
        chosen.map(|(index, _)| index)
    }

    /// Release the block owned by `id`, merging it with free neighbours.
    pub fn free(&mut self, id: i64) -> Result<()> {
        let mut index = self
            .blocks
            .iter()
            .position(|block| block.id.is_some_and(|owner| i64::from(owner) == id))
            .ok_or(SimError::UnknownId(id))?;

        self.blocks[index].id = None;

        if index > 0 && self.blocks[index - 1].is_free() {
            self.blocks[index - 1].size += self.blocks[index].size;
            self.blocks.remove(index);
            index -= 1;
        }

        if index + 1 < self.blocks.len() && self.blocks[index + 1].is_free() {
            self.blocks[index].size += self.blocks[index + 1].size;
            self.blocks.remove(index + 1);
        }

        debug!("freed id={}", id);
        Ok(())
    }

    /// Release the allocated block that starts exactly at `address`.
    pub fn free_by_address(&mut self, address: i64) -> Result<()> {
        let id = self
            .blocks
            .iter()
            .find(|block| !block.is_free() && i64::try_from(block.start) == Ok(address))
            .and_then(|block| block.id)
            .ok_or(SimError::UnknownAddress(address))?;
        self.free(i64::from(id))
    }

    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    pub fn counters(&self) -> AllocCounters {
        self.counters
    }

    pub fn total_size(&self) -> usize {
        self.blocks.iter().map(|b| b.size).sum()
    }

    pub fn used_size(&self) -> usize {
        self.blocks.iter().filter(|b| !b.is_free()).map(|b| b.size).sum()
    }

    pub fn free_size(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_free()).map(|b| b.size).sum()
    }

    pub fn largest_free_block(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.is_free())
            .map(|b| b.size)
            .max()
            .unwrap_or(0)
    }

    /// Used bytes as a percentage of the heap, 0 for an empty heap
    pub fn utilization(&self) -> f64 {
        let total = self.total_size();
        if total == 0 {
            return 0.0;
        }
        self.used_size() as f64 / total as f64 * 100.0
    }

    /// `1 - largest_free / total_free` as a percentage, 0 when nothing is free
    pub fn external_fragmentation(&self) -> f64 {
        let free = self.free_size();
        if free == 0 {
            return 0.0;
        }
        (1.0 - self.largest_free_block() as f64 / free as f64) * 100.0
    }

    /// Always 0: blocks are carved to exactly the requested size.
    pub fn internal_fragmentation(&self) -> f64 {
        0.0
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            total: self.total_size(),
            used: self.used_size(),
            free: self.free_size(),
            largest_free: self.largest_free_block(),
            utilization_pct: self.utilization(),
            external_fragmentation_pct: self.external_fragmentation(),
            internal_fragmentation_pct: self.internal_fragmentation(),
            counters: self.counters,
        }
    }
}

impl Default for HeapAllocator {
    fn default() -> Self {
        Self::new(AllocationStrategy::default())
    }
}

fn positive_size(size: i64) -> Result<usize> {
    if size <= 0 {
        return Err(SimError::InvalidSize(size));
    }
    usize::try_from(size).map_err(|_| SimError::InvalidSize(size))
}
