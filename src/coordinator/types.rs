use crate::planner::ReadBlock;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Raw register words of the last fully successful poll, keyed by address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<u16, u16>);

impl Snapshot {
    pub fn get(&self, address: u16) -> Option<u16> {
        self.0.get(&address).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Record the words returned for `block`
    pub(crate) fn absorb(&mut self, block: ReadBlock, words: &[u16]) {
        for (address, word) in (block.start..=block.end()).zip(words) {
            self.0.insert(address, *word);
        }
    }
}

/// State published to observers after every cycle
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollState {
    /// Latest snapshot; kept from the last good cycle when a cycle fails
    pub data: Option<Arc<Snapshot>>,
    /// Whether the most recent cycle succeeded
    pub last_update_success: bool,
    /// Error of the most recent failed cycle
    pub last_error: Option<String>,
    /// When `data` was published
    pub last_success_at: Option<DateTime<Utc>>,
    /// When the most recent cycle finished
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub total_polls: u64,
    pub failed_polls: u64,
    pub last_poll_duration_ms: Option<u64>,
}
