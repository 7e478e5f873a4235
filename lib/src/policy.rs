//! Resolves the limit regime for a chain position.
use tracing::debug;

use crate::{
    consts::{
        get_network_spec, ChainPosition, Network, NetworkSpec, SupportedNetworkSpecs, UpgradeId,
    },
    error::{LimitsError, LimitsResult},
    limits::{LimitName, LimitTable, Regime},
};

/// Validated, read-only limit configuration for one network.
///
/// Build it once at startup and share it (by reference or `Arc`) with every
/// component that needs a limit, so the activation rule lives in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusPolicy {
    spec: NetworkSpec,
}

impl ConsensusPolicy {
    pub fn new(spec: NetworkSpec) -> LimitsResult<Self> {
        spec.validate()?;
        debug!(
            "Consensus policy for {} with Genesis at {:?}",
            spec.name,
            spec.upgrades.get(&UpgradeId::Genesis)
        );
        Ok(Self { spec })
    }

    /// Policy for one of the built-in networks.
    pub fn for_network(network: Network) -> Self {
        // Presets always carry the reference table.
        Self {
            spec: get_network_spec(network),
        }
    }

    /// Policy for the network called `name` in `specs`.
    pub fn from_specs(specs: &SupportedNetworkSpecs, name: &str) -> LimitsResult<Self> {
        let spec = specs
            .get_network_spec(name)
            .ok_or_else(|| LimitsError::UnknownNetwork(name.to_string()))?;
        Self::new(spec)
    }

    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    pub fn limits(&self) -> &LimitTable {
        &self.spec.limits
    }

    pub fn is_active(&self, upgrade: UpgradeId, position: &ChainPosition) -> bool {
        self.spec.is_active(upgrade, position)
    }

    /// [Regime::PreGenesis] strictly before the Genesis activation point,
    /// [Regime::PostGenesis] at and after it.
    #[inline]
    pub fn regime_at(&self, position: &ChainPosition) -> Regime {
        Regime::from_genesis_active(self.is_active(UpgradeId::Genesis, position))
    }

    pub fn value_at(&self, name: LimitName, position: &ChainPosition) -> u64 {
        self.scoped(position).value_of(name)
    }

    /// Limits in force at `position`.
    pub fn scoped(&self, position: &ChainPosition) -> ScopedLimits<'_> {
        ScopedLimits {
            table: &self.spec.limits,
            regime: self.regime_at(position),
        }
    }
}

impl Default for ConsensusPolicy {
    fn default() -> Self {
        Self::for_network(Network::default())
    }
}

/// A [LimitTable] viewed under one [Regime].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopedLimits<'a> {
    table: &'a LimitTable,
    regime: Regime,
}

impl<'a> ScopedLimits<'a> {
    pub fn new(table: &'a LimitTable, regime: Regime) -> Self {
        Self { table, regime }
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    #[inline]
    pub fn value_of(&self, name: LimitName) -> u64 {
        self.table.value_of(name, self.regime)
    }

    pub fn max_tx_size(&self) -> u64 {
        self.value_of(LimitName::MaxTxSize)
    }

    pub fn legacy_max_block_size(&self) -> u64 {
        self.value_of(LimitName::LegacyMaxBlockSize)
    }

    pub fn max_block_sigops_per_mb(&self) -> u64 {
        self.value_of(LimitName::MaxBlockSigopsPerMb)
    }

    pub fn max_tx_sigops_count(&self) -> u64 {
        self.value_of(LimitName::MaxTxSigopsCount)
    }

    pub fn max_ops_per_script(&self) -> u64 {
        self.value_of(LimitName::MaxOpsPerScript)
    }

    pub fn max_pubkeys_per_multisig(&self) -> u64 {
        self.value_of(LimitName::MaxPubkeysPerMultisig)
    }

    pub fn coinbase_maturity(&self) -> u64 {
        self.value_of(LimitName::CoinbaseMaturity)
    }

    pub fn max_block_sigops(&self, block_size: u64) -> LimitsResult<u64> {
        self.table.max_block_sigops(block_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        consts::{ForkCondition, GENESIS_ACTIVATION_REGTEST},
        limits::RegimeValue,
    };

    #[test]
    fn regime_switches_at_activation_height() {
        let policy = ConsensusPolicy::for_network(Network::Regtest);
        assert_eq!(
            policy.regime_at(&ChainPosition::at_height(GENESIS_ACTIVATION_REGTEST - 1)),
            Regime::PreGenesis
        );
        assert_eq!(
            policy.regime_at(&ChainPosition::at_height(GENESIS_ACTIVATION_REGTEST)),
            Regime::PostGenesis
        );
    }

    #[test]
    fn scoped_accessors() {
        let policy = ConsensusPolicy::for_network(Network::Stn);
        let pre = policy.scoped(&ChainPosition::at_height(99));
        assert_eq!(pre.max_ops_per_script(), 500);
        assert_eq!(pre.max_pubkeys_per_multisig(), 20);
        assert_eq!(pre.max_tx_sigops_count(), 20_000);

        let post = policy.scoped(&ChainPosition::at_height(100));
        assert_eq!(post.regime(), Regime::PostGenesis);
        assert_eq!(post.max_ops_per_script(), u32::MAX as u64);
        assert_eq!(post.max_pubkeys_per_multisig(), i32::MAX as u64);
        assert_eq!(post.max_tx_sigops_count(), u32::MAX as u64);
        assert_eq!(post.max_tx_size(), 1_000_000);
        assert_eq!(post.legacy_max_block_size(), 1_000_000);
        assert_eq!(post.max_block_sigops_per_mb(), 20_000);
        assert_eq!(post.coinbase_maturity(), 100);
        assert_eq!(post.max_block_sigops(1_500_000).unwrap(), 40_000);
    }

    #[test]
    fn unscheduled_genesis_stays_pre_genesis() {
        let mut spec = get_network_spec(Network::Mainnet);
        spec.upgrades.insert(UpgradeId::Genesis, ForkCondition::TBD);
        let policy = ConsensusPolicy::new(spec).unwrap();
        assert_eq!(
            policy.regime_at(&ChainPosition::at_height(u64::MAX)),
            Regime::PreGenesis
        );
    }

    #[test]
    fn new_rejects_inverted_table() {
        let mut spec = get_network_spec(Network::Testnet);
        spec.limits.max_ops_per_script = RegimeValue::new(500, 499);
        assert!(matches!(
            ConsensusPolicy::new(spec),
            Err(LimitsError::RegimeInversion {
                name: LimitName::MaxOpsPerScript,
                ..
            })
        ));
    }

    #[test]
    fn custom_table_flows_through() {
        let mut spec = get_network_spec(Network::Regtest);
        spec.limits.max_block_sigops_per_mb = 5;
        let policy = ConsensusPolicy::new(spec).unwrap();
        let scoped = policy.scoped(&ChainPosition::at_height(0));
        assert_eq!(scoped.max_block_sigops(2_000_001).unwrap(), 15);
    }

    #[test]
    fn unknown_network_name() {
        let specs = SupportedNetworkSpecs::default();
        assert!(matches!(
            ConsensusPolicy::from_specs(&specs, "nonet"),
            Err(LimitsError::UnknownNetwork(_))
        ));
        assert!(ConsensusPolicy::from_specs(&specs, "mainnet").is_ok());
    }
}
