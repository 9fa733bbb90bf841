pub const OFFSET_BITS: u32 = 6;

pub const PAGE_SIZE: usize = 1 << OFFSET_BITS;
pub const NUM_PAGES: usize = 32;
pub const NUM_FRAMES: usize = 16;

pub const VM_SIZE: usize = NUM_PAGES * PAGE_SIZE;
pub const PM_SIZE: usize = NUM_FRAMES * PAGE_SIZE;

pub const TLB_SIZE: usize = 4;

// A resident page can hold several FIFO slots after LRU evict/reload cycles,
// so the ring is sized well past the frame count.
pub const FIFO_SLOTS: usize = 4 * NUM_PAGES;

pub const CACHE_BLOCK_SIZE: usize = PAGE_SIZE;
pub const L1_LINES: usize = 8;
pub const L2_LINES: usize = 16;

pub const OFFSET_MASK: u64 = (1 << OFFSET_BITS) - 1;
