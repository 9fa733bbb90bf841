use serde::Serialize;

use crate::constants::*;

/// One page table slot; `frame` is `Some` exactly while the page is resident
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageTableEntry {
    pub frame: Option<usize>,
}

impl PageTableEntry {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.frame.is_some()
    }
}

/// Single-level page table indexed by virtual page number
pub struct PageTable {
    entries: [PageTableEntry; NUM_PAGES],
}

impl PageTable {
    /// Create a page table with every entry invalid
    pub fn new() -> Self {
        PageTable {
            entries: [PageTableEntry::default(); NUM_PAGES],
        }
    }

    /// Get the entry for a page
    #[inline]
    pub fn entry(&self, page: usize) -> PageTableEntry {
        self.entries[page]
    }

    /// Frame currently holding `page`, if resident
    #[inline]
    pub fn frame_of(&self, page: usize) -> Option<usize> {
        self.entries[page].frame
    }

    /// Mark `page` resident in `frame`
    pub fn map(&mut self, page: usize, frame: usize) {
        self.entries[page] = PageTableEntry { frame: Some(frame) };
    }

    /// Invalidate `page`, returning the frame it occupied
    pub fn unmap(&mut self, page: usize) -> Option<usize> {
        self.entries[page].frame.take()
    }

    /// First resident page in page-number order
    pub fn first_resident(&self) -> Option<usize> {
        self.entries.iter().position(PageTableEntry::is_valid)
    }

    /// Resident pages as `(page, frame)` pairs in page-number order
    pub fn resident(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(page, entry)| entry.frame.map(|frame| (page, frame)))
    }

    pub fn resident_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_valid()).count()
    }
}

impl Default for PageTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks which physical frames are occupied
pub struct FreeFrameList {
    used: [bool; NUM_FRAMES],
}

impl FreeFrameList {
    /// All frames start out free
    pub fn new() -> Self {
        FreeFrameList {
            used: [false; NUM_FRAMES],
        }
    }

    /// Lowest-numbered free frame
    pub fn first_free(&self) -> Option<usize> {
        self.used.iter().position(|&used| !used)
    }

    pub fn mark_occupied(&mut self, frame: usize) {
        self.used[frame] = true;
    }

    pub fn release(&mut self, frame: usize) {
        self.used[frame] = false;
    }

    #[inline]
    pub fn is_occupied(&self, frame: usize) -> bool {
        self.used[frame]
    }

    pub fn free_count(&self) -> usize {
        self.used.iter().filter(|&&used| !used).count()
    }

    /// Calculate the starting physical address of a frame
    #[inline]
    pub fn frame_to_address(frame: usize) -> u64 {
        (frame * PAGE_SIZE) as u64
    }
}

impl Default for FreeFrameList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_table_initialization() {
        let pt = PageTable::new();
        // Nothing is resident
        assert!(!pt.entry(0).is_valid());
        assert!(!pt.entry(NUM_PAGES - 1).is_valid());
        assert_eq!(pt.first_resident(), None);
        assert_eq!(pt.resident_count(), 0);
    }

    #[test]
    fn test_page_table_map_unmap() {
        let mut pt = PageTable::new();
        pt.map(5, 9);

        assert_eq!(pt.frame_of(5), Some(9));
        assert!(pt.entry(5).is_valid());
        assert_eq!(pt.first_resident(), Some(5));

        assert_eq!(pt.unmap(5), Some(9));
        assert_eq!(pt.frame_of(5), None);
        // Unmapping twice yields nothing
        assert_eq!(pt.unmap(5), None);
    }

    #[test]
    fn test_page_table_resident_listing() {
        let mut pt = PageTable::new();
        pt.map(7, 0);
        pt.map(2, 1);
        pt.map(31, 2);

        let resident: Vec<_> = pt.resident().collect();
        assert_eq!(resident, vec![(2, 1), (7, 0), (31, 2)]);
        assert_eq!(pt.resident_count(), 3);
    }

    #[test]
    fn test_free_frames_lowest_first() {
        let mut ffl = FreeFrameList::new();
        assert_eq!(ffl.first_free(), Some(0));
        assert_eq!(ffl.free_count(), NUM_FRAMES);

        ffl.mark_occupied(0);
        ffl.mark_occupied(1);
        assert_eq!(ffl.first_free(), Some(2));

        ffl.release(0);
        assert_eq!(ffl.first_free(), Some(0));
        assert!(ffl.is_occupied(1));
    }

    #[test]
    fn test_all_frames_occupied() {
        let mut ffl = FreeFrameList::new();
        for f in 0..NUM_FRAMES {
            ffl.mark_occupied(f);
        }
        assert_eq!(ffl.first_free(), None);
        assert_eq!(ffl.free_count(), 0);
    }

    #[test]
    fn test_frame_to_address() {
        assert_eq!(FreeFrameList::frame_to_address(0), 0);
        assert_eq!(FreeFrameList::frame_to_address(1), 64);
        assert_eq!(FreeFrameList::frame_to_address(15), 960);
    }
}
