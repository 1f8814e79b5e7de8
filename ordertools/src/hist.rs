//! Coincidence resolution and histogram storage

use serde::{Deserialize, Serialize};

use crate::bit;

/// How a closed window is resolved into a histogram bucket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Bucket `k` counts closures where exactly `k` channels co-fired
    Order,
    /// One bucket per distinct channel pattern
    Pattern,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Order
    }
}

impl Mode {
    /// Number of buckets for `n` channels
    pub fn bins(self, n: usize) -> usize {
        match self {
            Mode::Order => n + 1,
            Mode::Pattern => 1 << n,
        }
    }

    #[inline(always)]
    pub fn bucket(self, mask: u32) -> usize {
        match self {
            Mode::Order => bit::order(mask),
            Mode::Pattern => mask as usize,
        }
    }

    /// Bucket labels for `n` channels: orders `0..=n`, or pattern masks
    pub fn index(self, n: usize) -> Vec<usize> {
        (0..self.bins(n)).collect()
    }
}

/// Fixed-size counter array. Counters only ever grow until cleared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram {
    counts: Vec<u64>,
}

impl Histogram {
    pub fn new(len: usize) -> Self {
        Histogram {
            counts: vec![0; len],
        }
    }

    #[inline(always)]
    pub fn increment(&mut self, idx: usize) {
        self.counts[idx] += 1;
    }

    pub fn clear(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}
