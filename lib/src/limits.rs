//! Named consensus limits and the two regimes they are defined for.
use core::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{
    consts::{
        COINBASE_MATURITY, LEGACY_MAX_BLOCK_SIZE, MAX_BLOCK_SIGOPS_PER_MB,
        MAX_OPS_PER_SCRIPT_AFTER_GENESIS, MAX_OPS_PER_SCRIPT_BEFORE_GENESIS,
        MAX_PUBKEYS_PER_MULTISIG_AFTER_GENESIS, MAX_PUBKEYS_PER_MULTISIG_BEFORE_GENESIS,
        MAX_TX_SIGOPS_COUNT_AFTER_GENESIS, MAX_TX_SIGOPS_COUNT_BEFORE_GENESIS, MAX_TX_SIZE,
    },
    error::{LimitsError, LimitsResult},
    sigops,
};

/// Which set of limit values is in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Regime {
    PreGenesis,
    PostGenesis,
}

impl Regime {
    pub fn from_genesis_active(active: bool) -> Self {
        if active {
            Regime::PostGenesis
        } else {
            Regime::PreGenesis
        }
    }

    pub fn is_post_genesis(&self) -> bool {
        matches!(self, Regime::PostGenesis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitName {
    MaxTxSize,
    LegacyMaxBlockSize,
    MaxBlockSigopsPerMb,
    MaxTxSigopsCount,
    MaxOpsPerScript,
    MaxPubkeysPerMultisig,
    CoinbaseMaturity,
}

impl LimitName {
    pub const ALL: [LimitName; 7] = [
        LimitName::MaxTxSize,
        LimitName::LegacyMaxBlockSize,
        LimitName::MaxBlockSigopsPerMb,
        LimitName::MaxTxSigopsCount,
        LimitName::MaxOpsPerScript,
        LimitName::MaxPubkeysPerMultisig,
        LimitName::CoinbaseMaturity,
    ];

    /// Returns `true` if the value of this limit changes at Genesis.
    pub const fn is_regime_split(&self) -> bool {
        matches!(
            self,
            LimitName::MaxTxSigopsCount
                | LimitName::MaxOpsPerScript
                | LimitName::MaxPubkeysPerMultisig
        )
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            LimitName::MaxTxSize => "max_tx_size",
            LimitName::LegacyMaxBlockSize => "legacy_max_block_size",
            LimitName::MaxBlockSigopsPerMb => "max_block_sigops_per_mb",
            LimitName::MaxTxSigopsCount => "max_tx_sigops_count",
            LimitName::MaxOpsPerScript => "max_ops_per_script",
            LimitName::MaxPubkeysPerMultisig => "max_pubkeys_per_multisig",
            LimitName::CoinbaseMaturity => "coinbase_maturity",
        }
    }
}

impl FromStr for LimitName {
    type Err = LimitsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LimitName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| LimitsError::InvalidLimitName(s.to_string()))
    }
}

impl Display for LimitName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A limit with one value per [Regime].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegimeValue {
    pub pre_genesis: u64,
    pub post_genesis: u64,
}

impl RegimeValue {
    pub const fn new(pre_genesis: u64, post_genesis: u64) -> Self {
        Self {
            pre_genesis,
            post_genesis,
        }
    }

    #[inline]
    pub const fn get(&self, regime: Regime) -> u64 {
        match regime {
            Regime::PreGenesis => self.pre_genesis,
            Regime::PostGenesis => self.post_genesis,
        }
    }
}

/// Reference values of every consensus limit.
pub const DEFAULT_LIMIT_TABLE: LimitTable = LimitTable {
    max_tx_size: MAX_TX_SIZE,
    legacy_max_block_size: LEGACY_MAX_BLOCK_SIZE,
    max_block_sigops_per_mb: MAX_BLOCK_SIGOPS_PER_MB,
    max_tx_sigops_count: RegimeValue::new(
        MAX_TX_SIGOPS_COUNT_BEFORE_GENESIS,
        MAX_TX_SIGOPS_COUNT_AFTER_GENESIS,
    ),
    max_ops_per_script: RegimeValue::new(
        MAX_OPS_PER_SCRIPT_BEFORE_GENESIS,
        MAX_OPS_PER_SCRIPT_AFTER_GENESIS,
    ),
    max_pubkeys_per_multisig: RegimeValue::new(
        MAX_PUBKEYS_PER_MULTISIG_BEFORE_GENESIS,
        MAX_PUBKEYS_PER_MULTISIG_AFTER_GENESIS,
    ),
    coinbase_maturity: COINBASE_MATURITY,
};

/// Values of the consensus limits for one network.
///
/// Missing fields in a serialized table fall back to [DEFAULT_LIMIT_TABLE].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitTable {
    /// Maximum transaction size in bytes.
    pub max_tx_size: u64,
    /// Maximum block size in bytes before the UAHF.
    pub legacy_max_block_size: u64,
    /// Signature check operations allowed per started megabyte of block.
    pub max_block_sigops_per_mb: u64,
    pub max_tx_sigops_count: RegimeValue,
    /// Non-push operations per script.
    pub max_ops_per_script: RegimeValue,
    pub max_pubkeys_per_multisig: RegimeValue,
    /// Confirmations before a coinbase output can be spent.
    pub coinbase_maturity: u64,
}

impl Default for LimitTable {
    fn default() -> Self {
        DEFAULT_LIMIT_TABLE
    }
}

impl LimitTable {
    /// Returns the value of `name` under `regime`. Limits without a
    /// Genesis split ignore `regime`.
    pub const fn value_of(&self, name: LimitName, regime: Regime) -> u64 {
        match name {
            LimitName::MaxTxSize => self.max_tx_size,
            LimitName::LegacyMaxBlockSize => self.legacy_max_block_size,
            LimitName::MaxBlockSigopsPerMb => self.max_block_sigops_per_mb,
            LimitName::MaxTxSigopsCount => self.max_tx_sigops_count.get(regime),
            LimitName::MaxOpsPerScript => self.max_ops_per_script.get(regime),
            LimitName::MaxPubkeysPerMultisig => self.max_pubkeys_per_multisig.get(regime),
            LimitName::CoinbaseMaturity => self.coinbase_maturity,
        }
    }

    /// Maximum signature check operations for a block of `block_size` bytes,
    /// using this table's per-megabyte allowance.
    pub fn max_block_sigops(&self, block_size: u64) -> LimitsResult<u64> {
        sigops::max_sigops_with_allowance(block_size, self.max_block_sigops_per_mb)
    }

    /// Checks that Genesis never tightens a limit.
    pub fn validate(&self) -> LimitsResult<()> {
        for name in LimitName::ALL.into_iter().filter(LimitName::is_regime_split) {
            let pre_genesis = self.value_of(name, Regime::PreGenesis);
            let post_genesis = self.value_of(name, Regime::PostGenesis);
            if post_genesis < pre_genesis {
                error!("Rejecting limit table: {name} drops from {pre_genesis} to {post_genesis}");
                return Err(LimitsError::RegimeInversion {
                    name,
                    pre_genesis,
                    post_genesis,
                });
            }
        }
        Ok(())
    }
}
