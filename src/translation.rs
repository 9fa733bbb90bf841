use crate::cache::AccessOutcome;
use crate::constants::*;
use crate::error::{Result, SimError};
use crate::memory::FreeFrameList;

/// Represents the decomposed components of a Virtual Address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub va: u64,
    pub page: usize,
    pub offset: usize,
}

impl VirtualAddress {
    /// Decompose a raw VA, rejecting anything outside the virtual address space
    pub fn from_raw(va: i64) -> Result<Self> {
        let raw = u64::try_from(va).map_err(|_| SimError::AddressOutOfRange(va))?;
        let page = (raw >> OFFSET_BITS) as usize;
        if page >= NUM_PAGES {
            return Err(SimError::AddressOutOfRange(va));
        }
        let offset = (raw & OFFSET_MASK) as usize;

        Ok(VirtualAddress { va: raw, page, offset })
    }

    /// PA = frame * PAGE_SIZE + offset
    #[inline]
    pub fn physical(&self, frame: usize) -> u64 {
        FreeFrameList::frame_to_address(frame) + self.offset as u64
    }
}

impl std::fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VA({}) = (p={}, w={})", self.va, self.page, self.offset)
    }
}

/// Everything observable about one successful translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    pub va: VirtualAddress,
    pub frame: usize,
    pub physical: u64,
    pub tlb_hit: bool,
    pub cache: AccessOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TlbEntry {
    pub page: usize,
    pub frame: usize,
    pub valid: bool,
}

/// Translation cache: a fixed ring of slots overwritten in order.
///
/// Entries are never invalidated when their page is evicted, so a hit may
/// return a frame that has since been given to another page.
#[derive(Debug, Default)]
pub struct Tlb {
    entries: [TlbEntry; TLB_SIZE],
    next: usize,
}

impl Tlb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, page: usize) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.valid && entry.page == page)
            .map(|entry| entry.frame)
    }

    /// Overwrite the oldest slot regardless of its content
    pub fn install(&mut self, page: usize, frame: usize) {
        self.entries[self.next] = TlbEntry { page, frame, valid: true };
        self.next = (self.next + 1) % TLB_SIZE;
    }

    pub fn entries(&self) -> &[TlbEntry] {
        &self.entries
    }

    /// Slot the next install will overwrite
    pub fn cursor(&self) -> usize {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_va_decomposition() {
        // 70 = page 1, offset 6
        let va = VirtualAddress::from_raw(70).unwrap();
        assert_eq!(va.page, 1);
        assert_eq!(va.offset, 6);
        assert_eq!(va.va, 70);
    }

    #[test]
    fn test_va_decomposition_edge_cases() {
        let va = VirtualAddress::from_raw(0).unwrap();
        assert_eq!((va.page, va.offset), (0, 0));

        // Last byte of the virtual address space
        let last = (VM_SIZE - 1) as i64;
        let va = VirtualAddress::from_raw(last).unwrap();
        assert_eq!((va.page, va.offset), (NUM_PAGES - 1, PAGE_SIZE - 1));
    }

    #[test]
    fn test_va_out_of_range() {
        let past_end = VM_SIZE as i64;
        assert_eq!(
            VirtualAddress::from_raw(past_end),
            Err(SimError::AddressOutOfRange(past_end))
        );
        assert_eq!(VirtualAddress::from_raw(-1), Err(SimError::AddressOutOfRange(-1)));
    }

    #[test]
    fn test_va_reconstruction() {
        for &original in &[0i64, 1, 63, 64, 70, 1000, 2047] {
            let va = VirtualAddress::from_raw(original).unwrap();
            let reconstructed = (va.page * PAGE_SIZE + va.offset) as i64;
            assert_eq!(reconstructed, original, "Failed for VA={}", original);
        }
    }

    #[test]
    fn test_physical_address() {
        let va = VirtualAddress::from_raw(70).unwrap();
        assert_eq!(va.physical(0), 6);
        assert_eq!(va.physical(3), 3 * 64 + 6);
    }

    #[test]
    fn test_display() {
        let va = VirtualAddress::from_raw(70).unwrap();
        let display = format!("{}", va);
        assert!(display.contains("70"));
        assert!(display.contains("p=1"));
        assert!(display.contains("w=6"));
    }

    #[test]
    fn test_tlb_empty_lookup_misses() {
        let tlb = Tlb::new();
        // Default slots are invalid even though they hold page 0
        assert_eq!(tlb.lookup(0), None);
    }

    #[test]
    fn test_tlb_install_and_lookup() {
        let mut tlb = Tlb::new();
        tlb.install(3, 7);
        assert_eq!(tlb.lookup(3), Some(7));
        assert_eq!(tlb.lookup(4), None);
        assert_eq!(tlb.cursor(), 1);
    }

    #[test]
    fn test_tlb_ring_overwrites_oldest() {
        let mut tlb = Tlb::new();
        for page in 0..TLB_SIZE {
            tlb.install(page, page + 10);
        }
        assert_eq!(tlb.cursor(), 0);

        // Fifth install wraps around onto page 0's slot
        tlb.install(20, 1);
        assert_eq!(tlb.lookup(0), None);
        assert_eq!(tlb.lookup(1), Some(11));
        assert_eq!(tlb.lookup(20), Some(1));
        assert_eq!(tlb.entries()[0], TlbEntry { page: 20, frame: 1, valid: true });
    }

    #[test]
    fn test_tlb_duplicate_page_first_slot_wins() {
        let mut tlb = Tlb::new();
        tlb.install(5, 1);
        tlb.install(5, 2);
        // Linear scan returns the lower slot
        assert_eq!(tlb.lookup(5), Some(1));
    }
}
