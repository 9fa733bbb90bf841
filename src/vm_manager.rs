use log::{debug, info, warn};
use serde::Serialize;

use crate::cache::CacheHierarchy;
use crate::constants::*;
use crate::error::{Result, SimError};
use crate::eviction::{Clock, FifoQueue, RecencyLedger, ReplacementPolicy};
use crate::memory::{FreeFrameList, PageTable};
use crate::translation::{Tlb, Translation, VirtualAddress};

/// What `load` did to make a page resident
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Mapped into a frame that was free
    Loaded { page: usize, frame: usize },
    /// `victim` was evicted to free `frame`
    Replaced { page: usize, frame: usize, victim: usize },
    /// The page was already resident; nothing changed
    AlreadyResident { page: usize, frame: usize },
}

impl LoadOutcome {
    pub fn frame(&self) -> usize {
        match *self {
            LoadOutcome::Loaded { frame, .. }
            | LoadOutcome::Replaced { frame, .. }
            | LoadOutcome::AlreadyResident { frame, .. } => frame,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TranslationStats {
    pub tlb_hits: u64,
    pub tlb_misses: u64,
    pub page_faults: u64,
    pub page_loads: u64,
    pub evictions: u64,
}

/// Demand-paged translator over a fixed frame pool
///
/// Every successful translation is followed by an access to the cache
/// hierarchy with the resulting physical address.
pub struct VMManager {
    page_table: PageTable,
    frames: FreeFrameList,
    tlb: Tlb,
    fifo: FifoQueue,
    recency: RecencyLedger,
    clock: Clock,
    policy: ReplacementPolicy,
    stats: TranslationStats,
    caches: CacheHierarchy,
}

impl VMManager {
    pub fn new(policy: ReplacementPolicy) -> Self {
        VMManager {
            page_table: PageTable::new(),
            frames: FreeFrameList::new(),
            tlb: Tlb::new(),
            fifo: FifoQueue::new(),
            recency: RecencyLedger::new(),
            clock: Clock::default(),
            policy,
            stats: TranslationStats::default(),
            caches: CacheHierarchy::new(),
        }
    }

    pub fn policy(&self) -> ReplacementPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ReplacementPolicy) {
        info!("replacement policy set to {}", policy);
        self.policy = policy;
    }

    /// Translate `va` and run the physical address through the caches.
    pub fn translate(&mut self, va: i64) -> Result<Translation> {
        let (va, frame, tlb_hit) = self.resolve(va)?;
        let physical = va.physical(frame);
        let cache = self.caches.access(physical);

        Ok(Translation { va, frame, physical, tlb_hit, cache })
    }

    /// TLB first, then the page table. A page-table hit refreshes the
    /// TLB and the page's recency but not its FIFO position.
    fn resolve(&mut self, va: i64) -> Result<(VirtualAddress, usize, bool)> {
        let va = VirtualAddress::from_raw(va)?;

        if let Some(frame) = self.tlb.lookup(va.page) {
            self.stats.tlb_hits += 1;
            debug!("TLB hit: page {} -> frame {}", va.page, frame);
            return Ok((va, frame, true));
        }

        self.stats.tlb_misses += 1;
        debug!("TLB miss: page {}", va.page);

        let Some(frame) = self.page_table.frame_of(va.page) else {
            self.stats.page_faults += 1;
            warn!("page fault at page {}", va.page);
            return Err(SimError::PageFault(va.page));
        };

        self.tlb.install(va.page, frame);
        self.recency.touch(va.page, self.clock.tick());
        Ok((va, frame, false))
    }

    /// Make `page` resident, evicting a victim if every frame is taken.
    pub fn load(&mut self, page: i64) -> Result<LoadOutcome> {
        let page = usize::try_from(page)
            .ok()
            .filter(|&p| p < NUM_PAGES)
            .ok_or(SimError::InvalidPage { page, max: NUM_PAGES - 1 })?;

        if let Some(frame) = self.page_table.frame_of(page) {
            debug!("page {} already resident in frame {}", page, frame);
            return Ok(LoadOutcome::AlreadyResident { page, frame });
        }

        let (frame, victim) = match self.frames.first_free() {
            Some(frame) => (frame, None),
            None => {
                let (victim, frame) = self.evict().ok_or(SimError::NoEvictableFrame(page))?;
                (frame, Some(victim))
            }
        };

        self.frames.mark_occupied(frame);
        self.page_table.map(page, frame);
        self.recency.touch(page, self.clock.tick());

        let page_table = &self.page_table;
        self.fifo.push(page, |p| page_table.entry(p).is_valid());

        self.stats.page_loads += 1;
        info!("page {} loaded into frame {}", page, frame);

        Ok(match victim {
            Some(victim) => LoadOutcome::Replaced { page, frame, victim },
            None => LoadOutcome::Loaded { page, frame },
        })
    }

    /// Remove the policy's victim from memory, returning `(victim, frame)`.
    fn evict(&mut self) -> Option<(usize, usize)> {
        let victim = self.select_victim().or_else(|| self.page_table.first_resident())?;

        let frame = self.page_table.unmap(victim)?;
        self.frames.release(frame);
        self.recency.remove(victim);
        self.stats.evictions += 1;

        info!("evicted page {} from frame {} ({})", victim, frame, self.policy);
        Some((victim, frame))
    }

    fn select_victim(&mut self) -> Option<usize> {
        match self.policy {
            ReplacementPolicy::Fifo => {
                while let Some(page) = self.fifo.pop_front() {
                    if self.page_table.entry(page).is_valid() {
                        return Some(page);
                    }
                    debug!("skipping stale FIFO slot for page {}", page);
                }
                None
            }
            ReplacementPolicy::Lru => {
                let page_table = &self.page_table;
                self.recency.least_recent(|page| page_table.entry(page).is_valid())
            }
        }
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn frames(&self) -> &FreeFrameList {
        &self.frames
    }

    pub fn tlb(&self) -> &Tlb {
        &self.tlb
    }

    pub fn recency(&self) -> &RecencyLedger {
        &self.recency
    }

    pub fn fifo(&self) -> &FifoQueue {
        &self.fifo
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn caches(&self) -> &CacheHierarchy {
        &self.caches
    }

    pub fn stats(&self) -> TranslationStats {
        self.stats
    }
}

impl Default for VMManager {
    fn default() -> Self {
        Self::new(ReplacementPolicy::default())
    }
}
