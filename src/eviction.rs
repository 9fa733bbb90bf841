use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::constants::*;
use crate::error::{Result, SimError};

/// Victim selection when a page must be loaded and no frame is free
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementPolicy {
    #[default]
    Fifo,
    Lru,
}

impl FromStr for ReplacementPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "fifo" => Ok(ReplacementPolicy::Fifo),
            "lru" => Ok(ReplacementPolicy::Lru),
            other => Err(SimError::UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplacementPolicy::Fifo => f.write_str("FIFO"),
            ReplacementPolicy::Lru => f.write_str("LRU"),
        }
    }
}

/// Logical clock; every stamped event gets a distinct, increasing value
#[derive(Debug, Default)]
pub struct Clock {
    next: u64,
}

impl Clock {
    pub fn tick(&mut self) -> u64 {
        let now = self.next;
        self.next += 1;
        now
    }

    pub fn now(&self) -> u64 {
        self.next
    }
}

/// Load-order ring of page numbers with fixed capacity.
///
/// Slots are not removed when their page is evicted by other means; callers
/// skip them on pop. A full ring drops slots whose page is no longer resident
/// before accepting more.
#[derive(Debug)]
pub struct FifoQueue {
    slots: [Option<usize>; FIFO_SLOTS],
    head: usize,
    len: usize,
}

impl FifoQueue {
    pub fn new() -> Self {
        FifoQueue {
            slots: [None; FIFO_SLOTS],
            head: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push<F>(&mut self, page: usize, is_resident: F)
    where
        F: Fn(usize) -> bool,
    {
        if self.len == FIFO_SLOTS {
            self.compact(is_resident);
        }
        if self.len == FIFO_SLOTS {
            // Every slot still names a resident page
            self.pop_front();
        }
        let tail = (self.head + self.len) % FIFO_SLOTS;
        self.slots[tail] = Some(page);
        self.len += 1;
    }

    pub fn pop_front(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let page = self.slots[self.head].take();
        self.head = (self.head + 1) % FIFO_SLOTS;
        self.len -= 1;
        page
    }

    /// Pages from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter_map(move |i| self.slots[(self.head + i) % FIFO_SLOTS])
    }

    fn compact<F>(&mut self, is_resident: F)
    where
        F: Fn(usize) -> bool,
    {
        let live: Vec<usize> = self.iter().filter(|&page| is_resident(page)).collect();
        self.slots = [None; FIFO_SLOTS];
        self.head = 0;
        self.len = live.len();
        for (i, page) in live.into_iter().enumerate() {
            self.slots[i] = Some(page);
        }
    }
}

impl Default for FifoQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Last-use stamp per page; present only while the page is resident
#[derive(Debug)]
pub struct RecencyLedger {
    stamps: [Option<u64>; NUM_PAGES],
}

impl RecencyLedger {
    pub fn new() -> Self {
        RecencyLedger {
            stamps: [None; NUM_PAGES],
        }
    }

    pub fn touch(&mut self, page: usize, stamp: u64) {
        self.stamps[page] = Some(stamp);
    }

    pub fn remove(&mut self, page: usize) {
        self.stamps[page] = None;
    }

    pub fn get(&self, page: usize) -> Option<u64> {
        self.stamps[page]
    }

    /// Page with the smallest stamp among those accepted by `is_resident`
    pub fn least_recent<F>(&self, is_resident: F) -> Option<usize>
    where
        F: Fn(usize) -> bool,
    {
        self.stamps
            .iter()
            .enumerate()
            .filter_map(|(page, stamp)| stamp.map(|s| (page, s)))
            .filter(|&(page, _)| is_resident(page))
            .min_by_key(|&(_, stamp)| stamp)
            .map(|(page, _)| page)
    }
}

impl Default for RecencyLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_str() {
        assert_eq!("fifo".parse(), Ok(ReplacementPolicy::Fifo));
        assert_eq!("lru".parse(), Ok(ReplacementPolicy::Lru));
        assert_eq!(
            "clock".parse::<ReplacementPolicy>(),
            Err(SimError::UnknownPolicy("clock".to_string()))
        );
    }

    #[test]
    fn test_clock_is_strictly_increasing() {
        let mut clock = Clock::default();
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.tick(), 1);
        assert_eq!(clock.now(), 2);
    }

    #[test]
    fn test_fifo_order() {
        let mut q = FifoQueue::new();
        q.push(4, |_| true);
        q.push(1, |_| true);
        q.push(9, |_| true);

        assert_eq!(q.len(), 3);
        assert_eq!(q.pop_front(), Some(4));
        assert_eq!(q.pop_front(), Some(1));
        assert_eq!(q.pop_front(), Some(9));
        assert_eq!(q.pop_front(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn test_fifo_wraps_around() {
        let mut q = FifoQueue::new();
        for i in 0..FIFO_SLOTS {
            q.push(i % NUM_PAGES, |_| true);
        }
        for _ in 0..10 {
            q.pop_front();
        }
        for i in 0..10 {
            q.push(20 + i, |_| true);
        }
        assert_eq!(q.len(), FIFO_SLOTS);
        assert_eq!(q.iter().next(), Some(10 % NUM_PAGES));
        assert_eq!(q.iter().last(), Some(29));
    }

    #[test]
    fn test_full_fifo_compacts_evicted_pages() {
        let mut q = FifoQueue::new();
        for i in 0..FIFO_SLOTS {
            q.push(i % NUM_PAGES, |_| true);
        }
        // Only even pages are still resident
        q.push(3, |page| page % 2 == 0);

        assert_eq!(q.len(), FIFO_SLOTS / 2 + 1);
        let pages: Vec<usize> = q.iter().collect();
        assert_eq!(&pages[..3], &[0, 2, 4]);
        assert_eq!(pages.last(), Some(&3));
    }

    #[test]
    fn test_full_fifo_with_every_page_resident_drops_oldest() {
        let mut q = FifoQueue::new();
        for i in 0..FIFO_SLOTS {
            q.push(i % NUM_PAGES, |_| true);
        }
        q.push(7, |_| true);
        assert_eq!(q.len(), FIFO_SLOTS);
        assert_eq!(q.pop_front(), Some(1));
    }

    #[test]
    fn test_recency_least_recent() {
        let mut ledger = RecencyLedger::new();
        ledger.touch(3, 10);
        ledger.touch(7, 4);
        ledger.touch(1, 8);

        assert_eq!(ledger.least_recent(|_| true), Some(7));
        // Pages the caller reports as non-resident are skipped
        assert_eq!(ledger.least_recent(|p| p != 7), Some(1));

        ledger.remove(7);
        assert_eq!(ledger.get(7), None);
        assert_eq!(ledger.least_recent(|_| true), Some(1));
    }

    #[test]
    fn test_recency_empty() {
        let ledger = RecencyLedger::new();
        assert_eq!(ledger.least_recent(|_| true), None);
    }
}
