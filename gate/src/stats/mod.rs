use std::fmt;

use parking_lot::Mutex;
use serde_derive::{Deserialize, Serialize};

/// Running totals of one run.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub successful_reads: u64,
    pub failed_reads: u64,
    pub successful_writes: u64,
    pub failed_writes: u64,
}

impl Tally {
    #[inline]
    pub fn read_attempts(&self) -> u64 {
        self.successful_reads + self.failed_reads
    }

    #[inline]
    pub fn write_attempts(&self) -> u64 {
        self.successful_writes + self.failed_writes
    }
}

/// Counters shared by all workers. Every update happens under one guard.
#[derive(Default)]
pub struct StatsCounters {
    count_guard: Mutex<Tally>,
}

impl StatsCounters {
    pub fn new() -> StatsCounters {
        Default::default()
    }

    pub fn record_read(&self, admitted: bool) {
        let mut tally = self.count_guard.lock();
        if admitted {
            tally.successful_reads += 1;
        } else {
            tally.failed_reads += 1;
        }
    }

    pub fn record_write(&self, admitted: bool) {
        let mut tally = self.count_guard.lock();
        if admitted {
            tally.successful_writes += 1;
        } else {
            tally.failed_writes += 1;
        }
    }

    pub fn snapshot(&self) -> Tally {
        *self.count_guard.lock()
    }
}

impl fmt::Debug for StatsCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StatsCounters").field(&self.snapshot()).finish()
    }
}
