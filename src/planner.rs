//! Read block planning
//!
//! Groups a sparse set of register addresses into contiguous spans so that a
//! poll cycle needs as few requests as possible. Addresses closer than the
//! merge gap share a block and the registers in between are read and
//! ignored.

use serde::Serialize;

/// Default merge-gap tolerance between two addresses of the same block
pub const DEFAULT_MAX_GAP: u16 = 3;

/// Most holding registers a single read request may return
pub const MAX_READ_COUNT: u16 = 125;

/// A contiguous span of holding registers fetched in one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadBlock {
    pub start: u16,
    pub count: u16,
}

impl ReadBlock {
    /// `count` must be at least one; an empty block has no last address.
    pub const fn new(start: u16, count: u16) -> Self {
        debug_assert!(count > 0, "read block must cover at least one register");
        Self { start, count }
    }

    /// Last address covered by the block (inclusive)
    pub const fn end(&self) -> u16 {
        self.start + (self.count - 1)
    }

    pub const fn contains(&self, address: u16) -> bool {
        address >= self.start && address <= self.end()
    }
}

/// Plan read blocks with the protocol's per-request limit
pub fn plan(addresses: &[u16], max_gap: u16) -> Vec<ReadBlock> {
    plan_bounded(addresses, max_gap, MAX_READ_COUNT)
}

/// Plan read blocks, never letting a block grow past `max_count` registers.
///
/// An equal gap extends the current block rather than starting a new one.
pub fn plan_bounded(addresses: &[u16], max_gap: u16, max_count: u16) -> Vec<ReadBlock> {
    let mut sorted = addresses.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let Some((&first, rest)) = sorted.split_first() else {
        return Vec::new();
    };

    let max_count = u32::from(max_count.max(1));
    let mut blocks = Vec::new();
    let (mut start, mut end) = (first, first);

    for &addr in rest {
        let gap = addr - end;
        let span = u32::from(addr - start) + 1;
        if gap <= max_gap && span <= max_count {
            end = addr;
        } else {
            blocks.push(ReadBlock::new(start, end - start + 1));
            start = addr;
            end = addr;
        }
    }
    blocks.push(ReadBlock::new(start, end - start + 1));
    blocks
}
