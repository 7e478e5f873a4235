//! Block sigop allowance derived from block size.
use crate::{
    consts::{MAX_BLOCK_SIGOPS_PER_MB, ONE_MEGABYTE},
    error::{LimitsError, LimitsResult},
};

/// Compute the maximum number of sigops a block of `block_size` bytes may
/// contain: [MAX_BLOCK_SIGOPS_PER_MB] times the block size in MB, rounded up.
///
/// A block of exactly N megabytes counts as N, one byte more counts as N + 1.
/// Zero-size blocks are rejected with [LimitsError::ZeroBlockSize].
pub fn max_sigops_for_block_size(block_size: u64) -> LimitsResult<u64> {
    max_sigops_with_allowance(block_size, MAX_BLOCK_SIGOPS_PER_MB)
}

pub(crate) fn max_sigops_with_allowance(block_size: u64, sigops_per_mb: u64) -> LimitsResult<u64> {
    if block_size == 0 {
        return Err(LimitsError::ZeroBlockSize);
    }
    let mb_rounded_up = block_size.div_ceil(ONE_MEGABYTE);
    Ok(mb_rounded_up.saturating_mul(sigops_per_mb))
}
