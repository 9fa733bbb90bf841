use serde::Serialize;

use crate::cache::LevelStats;
use crate::error::Result;
use crate::eviction::ReplacementPolicy;
use crate::heap::{Allocation, AllocationStrategy, HeapAllocator, HeapStats, MemoryBlock};
use crate::translation::Translation;
use crate::vm_manager::{LoadOutcome, TranslationStats, VMManager};

/// Start-up settings; geometry is fixed by `constants`
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    pub strategy: AllocationStrategy,
    pub policy: ReplacementPolicy,
    /// Initialize the heap with this many bytes at start-up
    pub heap_size: Option<i64>,
}

/// Snapshot of every counter the simulator keeps
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub strategy: AllocationStrategy,
    pub policy: ReplacementPolicy,
    pub heap: HeapStats,
    pub translation: TranslationStats,
    pub resident_pages: usize,
    pub l1: LevelStats,
    pub l2: LevelStats,
}

/// The whole simulated memory subsystem.
///
/// Owns every piece of mutable state; nothing is global.
#[derive(Default)]
pub struct Simulator {
    heap: HeapAllocator,
    vm: VMManager,
}

impl Simulator {
    pub fn new(config: &SimConfig) -> Result<Self> {
        let mut sim = Simulator {
            heap: HeapAllocator::new(config.strategy),
            vm: VMManager::new(config.policy),
        };
        if let Some(size) = config.heap_size {
            sim.init_heap(size)?;
        }
        Ok(sim)
    }

    pub fn init_heap(&mut self, size: i64) -> Result<()> {
        self.heap.initialize(size)
    }

    pub fn allocate(&mut self, size: i64) -> Result<Allocation> {
        self.heap.allocate(size)
    }

    pub fn free_by_id(&mut self, id: i64) -> Result<()> {
        self.heap.free(id)
    }

    pub fn free_by_address(&mut self, address: i64) -> Result<()> {
        self.heap.free_by_address(address)
    }

    pub fn set_allocation_strategy(&mut self, name: &str) -> Result<AllocationStrategy> {
        let strategy = name.parse()?;
        self.heap.set_strategy(strategy);
        Ok(strategy)
    }

    pub fn set_eviction_policy(&mut self, name: &str) -> Result<ReplacementPolicy> {
        let policy = name.parse()?;
        self.vm.set_policy(policy);
        Ok(policy)
    }

    pub fn load_page(&mut self, page: i64) -> Result<LoadOutcome> {
        self.vm.load(page)
    }

    pub fn translate(&mut self, va: i64) -> Result<Translation> {
        self.vm.translate(va)
    }

    pub fn dump_heap(&self) -> &[MemoryBlock] {
        self.heap.blocks()
    }

    pub fn heap(&self) -> &HeapAllocator {
        &self.heap
    }

    pub fn vm(&self) -> &VMManager {
        &self.vm
    }

    pub fn stats(&self) -> Stats {
        Stats {
            strategy: self.heap.strategy(),
            policy: self.vm.policy(),
            heap: self.heap.stats(),
            translation: self.vm.stats(),
            resident_pages: self.vm.page_table().resident_count(),
            l1: self.vm.caches().l1().stats(),
            l2: self.vm.caches().l2().stats(),
        }
    }
}
