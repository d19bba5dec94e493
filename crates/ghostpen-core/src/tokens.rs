use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Token tallies reported by one model response, or accumulated over a
/// session. Cache reads and writes are counted separately from `input`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub input: u64,
    pub output: u64,
    pub cache_write: u64,
    pub cache_read: u64,
}

impl UsageCounters {
    pub fn total(&self) -> u64 {
        self.input + self.output + self.cache_write + self.cache_read
    }
}

impl AddAssign for UsageCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.input += rhs.input;
        self.output += rhs.output;
        self.cache_write += rhs.cache_write;
        self.cache_read += rhs.cache_read;
    }
}
