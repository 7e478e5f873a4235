use crate::{
    consts::{ChainPosition, ForkCondition},
    limits::LimitName,
};

#[derive(Debug, thiserror::Error)]
pub enum LimitsError {
    /// For limit names that are not part of the table.
    #[error("Unknown limit name: {0}")]
    InvalidLimitName(String),

    /// For network names without a spec.
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    /// For upgrade names not known to the schedule.
    #[error("Unknown upgrade: {0}")]
    UnknownUpgrade(String),

    /// For block sizes below one byte.
    #[error("Block size must be at least one byte")]
    ZeroBlockSize,

    /// For tables where the post-Genesis value is tighter than the pre-Genesis one.
    #[error("Limit {name} drops from {pre_genesis} to {post_genesis} at Genesis")]
    RegimeInversion {
        name: LimitName,
        pre_genesis: u64,
        post_genesis: u64,
    },

    /// For lock-time flag words with undefined bits set.
    #[error("Unknown lock-time flag bits: {0:#x}")]
    UnknownLockTimeFlags(u32),

    /// For schedules where nothing is active at the given position.
    #[error(
        "No upgrade active at height {}, time {}",
        position.height,
        position.time
    )]
    NoActiveUpgrade { position: ChainPosition },

    /// For Genesis schedules not keyed on block height.
    #[error("Genesis on {network} must activate by height, got {condition:?}")]
    GenesisNotHeightKeyed {
        network: String,
        condition: ForkCondition,
    },

    /// For I/O errors while reading configuration.
    #[error("There was a I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// For Serde errors while reading configuration.
    #[error("There was a deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type LimitsResult<T> = Result<T, LimitsError>;
