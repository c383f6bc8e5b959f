//! Range partitioner: split the fixed decimal passcode space into equal, ordered batches.

use anyhow::{Result, bail};

use crate::PasscodeRange;

/// The numeric passcode space `0..10^digits`, cut into `partitions` batches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchSpace {
    pub digits: u32,
    pub partitions: u32,
}

/// One sub-range of the space with its zero-based batch index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub index: u32,
    pub range: PasscodeRange,
}

impl SearchSpace {
    /// Validated constructor. The partitioner only handles evenly divisible spaces.
    pub fn new(digits: u32, partitions: u32) -> Result<Self> {
        if digits == 0 || digits > 18 {
            bail!("passcode width must be between 1 and 18 digits, got {digits}");
        }
        if partitions == 0 {
            bail!("partition count must be at least 1");
        }
        let space = Self { digits, partitions };
        if space.size() % partitions as u64 != 0 {
            bail!(
                "{} candidates do not split evenly into {} partitions",
                space.size(),
                partitions
            );
        }
        Ok(space)
    }

    /// Total number of candidates (N).
    pub fn size(&self) -> u64 {
        10_u64.pow(self.digits)
    }

    /// Candidates per partition (N / K).
    pub fn partition_size(&self) -> u64 {
        self.size() / self.partitions as u64
    }

    /// Zero-padded candidate string for `n`.
    pub fn format(&self, n: u64) -> String {
        format!("{:0width$}", n, width = self.digits as usize)
    }

    /// Contiguous, non-overlapping ranges covering the whole space, in index order.
    pub fn partition(&self) -> Vec<Partition> {
        let step = self.partition_size();
        (0..self.partitions)
            .map(|index| {
                let from = index as u64 * step;
                Partition {
                    index,
                    range: PasscodeRange::new(self.format(from), self.format(from + step - 1)),
                }
            })
            .collect()
    }
}
