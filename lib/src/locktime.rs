//! Flags for nSequence and nLockTime locks.
use bitflags::bitflags;

use crate::{
    consts::ChainPosition,
    error::{LimitsError, LimitsResult},
};

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct LockTimeFlags: u32 {
        /// Interpret sequence numbers as relative lock-time constraints.
        const VERIFY_SEQUENCE = 1 << 0;
        /// Use the median time past instead of the block time as the end
        /// point timestamp.
        const MEDIAN_TIME_PAST = 1 << 1;
    }
}

/// Lock-time flags applied by non-consensus code.
pub const STANDARD_LOCKTIME_VERIFY_FLAGS: LockTimeFlags =
    LockTimeFlags::VERIFY_SEQUENCE.union(LockTimeFlags::MEDIAN_TIME_PAST);

impl LockTimeFlags {
    /// Decodes a raw flag word, rejecting undefined bits.
    pub fn decode(bits: u32) -> LimitsResult<Self> {
        Self::from_bits(bits).ok_or(LimitsError::UnknownLockTimeFlags(bits))
    }

    pub fn verify_sequence(&self) -> bool {
        self.contains(LockTimeFlags::VERIFY_SEQUENCE)
    }

    pub fn use_median_time_past(&self) -> bool {
        self.contains(LockTimeFlags::MEDIAN_TIME_PAST)
    }

    /// Timestamp absolute lock times are compared against at `position`.
    pub fn lock_time_cutoff(&self, position: &ChainPosition) -> u64 {
        if self.use_median_time_past() {
            position.median_time_past
        } else {
            position.time
        }
    }
}
