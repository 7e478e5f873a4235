// Copyright 2023 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Constants and network upgrade schedules for the consensus rules.
use core::fmt::Display;
use std::{
    collections::{BTreeMap, HashMap},
    fs::File,
    io::BufReader,
    path::PathBuf,
    str::FromStr,
};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    error::{LimitsError, LimitsResult},
    limits::LimitTable,
};

/// Block height.
pub type BlockHeight = u64;

/// 1KB
pub const ONE_KILOBYTE: u64 = 1_000;
/// 1MB
pub const ONE_MEGABYTE: u64 = ONE_KILOBYTE * 1_000;
/// 1GB
pub const ONE_GIGABYTE: u64 = ONE_MEGABYTE * 1_000;

/// The maximum allowed size for a transaction, in bytes.
pub const MAX_TX_SIZE: u64 = ONE_MEGABYTE;
/// The maximum allowed size for a block, before the UAHF.
pub const LEGACY_MAX_BLOCK_SIZE: u64 = ONE_MEGABYTE;

/// The maximum allowed number of signature check operations per MB in a block
/// (network rule).
pub const MAX_BLOCK_SIGOPS_PER_MB: u64 = 20_000;

/// Allowed number of signature check operations per transaction.
pub const MAX_TX_SIGOPS_COUNT: u64 = 20_000;
/// Allowed number of signature check operations per transaction before Genesis.
pub const MAX_TX_SIGOPS_COUNT_BEFORE_GENESIS: u64 = 20_000;
/// Allowed number of signature check operations per transaction after Genesis.
pub const MAX_TX_SIGOPS_COUNT_AFTER_GENESIS: u64 = u32::MAX as u64;

/// Maximum number of non-push operations per script before Genesis.
pub const MAX_OPS_PER_SCRIPT_BEFORE_GENESIS: u64 = 500;
/// Maximum number of non-push operations per script after Genesis.
pub const MAX_OPS_PER_SCRIPT_AFTER_GENESIS: u64 = u32::MAX as u64;

/// Maximum number of public keys per multisig before Genesis.
pub const MAX_PUBKEYS_PER_MULTISIG_BEFORE_GENESIS: u64 = 20;
/// Maximum number of public keys per multisig after Genesis.
///
/// A script of maximum length holds fewer keys than this, since every
/// compressed key takes 33 bytes.
pub const MAX_PUBKEYS_PER_MULTISIG_AFTER_GENESIS: u64 = i32::MAX as u64;

/// Coinbase transaction outputs can only be spent after this number of new
/// blocks (network rule).
pub const COINBASE_MATURITY: u64 = 100;

/// Activation time for P2SH (April 1st 2012).
pub const P2SH_ACTIVATION_TIME: u64 = 1_333_234_914;

/// Genesis activation height on mainnet.
pub const GENESIS_ACTIVATION_MAINNET: BlockHeight = 620_538;
/// Genesis activation height on testnet.
pub const GENESIS_ACTIVATION_TESTNET: BlockHeight = 1_344_302;
/// Genesis activation height on the scaling test network.
pub const GENESIS_ACTIVATION_STN: BlockHeight = 100;
/// Genesis activation height on regtest.
pub const GENESIS_ACTIVATION_REGTEST: BlockHeight = 10_000;

lazy_static! {
    /// The mainnet specification.
    pub static ref MAINNET_NETWORK_SPEC: NetworkSpec =
        NetworkSpec::with_genesis_at(Network::Mainnet, GENESIS_ACTIVATION_MAINNET);

    /// The testnet specification.
    pub static ref TESTNET_NETWORK_SPEC: NetworkSpec =
        NetworkSpec::with_genesis_at(Network::Testnet, GENESIS_ACTIVATION_TESTNET);

    /// The scaling test network specification.
    pub static ref STN_NETWORK_SPEC: NetworkSpec =
        NetworkSpec::with_genesis_at(Network::Stn, GENESIS_ACTIVATION_STN);

    /// The regtest specification.
    pub static ref REGTEST_NETWORK_SPEC: NetworkSpec =
        NetworkSpec::with_genesis_at(Network::Regtest, GENESIS_ACTIVATION_REGTEST);
}

pub fn get_network_spec(network: Network) -> NetworkSpec {
    match network {
        Network::Mainnet => MAINNET_NETWORK_SPEC.clone(),
        Network::Testnet => TESTNET_NETWORK_SPEC.clone(),
        Network::Stn => STN_NETWORK_SPEC.clone(),
        Network::Regtest => REGTEST_NETWORK_SPEC.clone(),
    }
}

/// Where on the chain a block sits, as seen by the code validating it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainPosition {
    /// Height of the block being validated.
    pub height: BlockHeight,
    /// Timestamp in the block header.
    pub time: u64,
    /// Median time of the previous blocks.
    pub median_time_past: u64,
}

impl ChainPosition {
    pub fn new(height: BlockHeight, time: u64, median_time_past: u64) -> Self {
        Self {
            height,
            time,
            median_time_past,
        }
    }

    /// A position with only the height known. Timestamps are zero.
    pub fn at_height(height: BlockHeight) -> Self {
        Self {
            height,
            ..Default::default()
        }
    }
}

/// Protocol upgrades the limit rules depend on, in activation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UpgradeId {
    /// Rules in force from the first block.
    Base,
    /// Pay-to-script-hash evaluation.
    P2sh,
    /// The Genesis upgrade, which lifts most script limits.
    Genesis,
}

impl UpgradeId {
    pub const fn as_str(&self) -> &'static str {
        match self {
            UpgradeId::Base => "base",
            UpgradeId::P2sh => "p2sh",
            UpgradeId::Genesis => "genesis",
        }
    }
}

impl FromStr for UpgradeId {
    type Err = LimitsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base" => Ok(UpgradeId::Base),
            "p2sh" => Ok(UpgradeId::P2sh),
            "genesis" => Ok(UpgradeId::Genesis),
            _ => Err(LimitsError::UnknownUpgrade(s.to_string())),
        }
    }
}

impl Display for UpgradeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The condition at which an upgrade is activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForkCondition {
    /// The upgrade is activated with a certain block.
    Block(BlockHeight),
    /// The upgrade is activated once the block time reaches this timestamp.
    Timestamp(u64),
    /// The upgrade is not yet active.
    TBD,
}

impl ForkCondition {
    /// Returns whether the condition has been met.
    pub fn active(&self, position: &ChainPosition) -> bool {
        match self {
            ForkCondition::Block(block) => *block <= position.height,
            ForkCondition::Timestamp(ts) => *ts <= position.time,
            ForkCondition::TBD => false,
        }
    }
}

/// Specification of a specific network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    pub upgrades: BTreeMap<UpgradeId, ForkCondition>,
    #[serde(default)]
    pub limits: LimitTable,
}

impl NetworkSpec {
    /// Creates a spec with the standard upgrade schedule and Genesis at `height`.
    pub fn with_genesis_at(network: Network, height: BlockHeight) -> Self {
        NetworkSpec {
            name: network.to_string(),
            upgrades: BTreeMap::from([
                (UpgradeId::Base, ForkCondition::Block(0)),
                (UpgradeId::P2sh, ForkCondition::Timestamp(P2SH_ACTIVATION_TIME)),
                (UpgradeId::Genesis, ForkCondition::Block(height)),
            ]),
            limits: LimitTable::default(),
        }
    }

    /// Returns whether `upgrade` is active at `position`. Upgrades missing
    /// from the schedule are never active.
    pub fn is_active(&self, upgrade: UpgradeId, position: &ChainPosition) -> bool {
        self.upgrades
            .get(&upgrade)
            .is_some_and(|fork| fork.active(position))
    }

    /// Returns the latest [UpgradeId] active at `position` or an error if
    /// nothing in the schedule applies.
    pub fn active_upgrade(&self, position: &ChainPosition) -> LimitsResult<UpgradeId> {
        self.upgrades
            .iter()
            .rev()
            .find(|(_, fork)| fork.active(position))
            .map(|(upgrade, _)| *upgrade)
            .ok_or(LimitsError::NoActiveUpgrade {
                position: *position,
            })
    }

    /// Returns the Genesis activation height if it is scheduled by height.
    pub fn genesis_height(&self) -> Option<BlockHeight> {
        match self.upgrades.get(&UpgradeId::Genesis) {
            Some(ForkCondition::Block(height)) => Some(*height),
            _ => None,
        }
    }

    pub fn network(&self) -> Option<Network> {
        Network::from_str(&self.name).ok()
    }

    /// Checks the invariants of the schedule and the limit table.
    ///
    /// Genesis must be keyed on height: block times are not monotonic, so a
    /// timestamp condition could flip the regime back at a later block.
    pub fn validate(&self) -> LimitsResult<()> {
        match self.upgrades.get(&UpgradeId::Genesis) {
            None | Some(ForkCondition::Block(_)) | Some(ForkCondition::TBD) => {}
            Some(condition) => {
                error!("Rejecting network spec {}: Genesis at {condition:?}", self.name);
                return Err(LimitsError::GenesisNotHeightKeyed {
                    network: self.name.clone(),
                    condition: *condition,
                });
            }
        }
        self.limits.validate()
    }
}

/// The set of networks a node can be configured for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedNetworkSpecs(HashMap<String, NetworkSpec>);

impl Default for SupportedNetworkSpecs {
    fn default() -> Self {
        let specs = [
            Network::Mainnet,
            Network::Testnet,
            Network::Stn,
            Network::Regtest,
        ]
        .into_iter()
        .map(|network| (network.to_string(), get_network_spec(network)))
        .collect();
        SupportedNetworkSpecs(specs)
    }
}

impl SupportedNetworkSpecs {
    /// Reads a JSON list of network specs and overlays it on the built-in
    /// presets. Entries from the file replace presets with the same name.
    pub fn merge_from_file(file_path: PathBuf) -> LimitsResult<SupportedNetworkSpecs> {
        let file = File::open(&file_path)?;
        let reader = BufReader::new(file);
        let loaded: Vec<NetworkSpec> = serde_json::from_reader(reader)?;
        info!(
            "Loaded {} network spec(s) from {}",
            loaded.len(),
            file_path.display()
        );
        let mut merged = SupportedNetworkSpecs::default();
        merged.extend(loaded)?;
        Ok(merged)
    }

    /// Adds specs after validating them, replacing entries with the same name.
    pub fn extend(&mut self, specs: impl IntoIterator<Item = NetworkSpec>) -> LimitsResult<()> {
        for spec in specs {
            spec.validate()?;
            if self.0.contains_key(&spec.name) {
                warn!("Overriding network spec {}", spec.name);
            }
            self.0.insert(spec.name.clone(), spec);
        }
        Ok(())
    }

    pub fn supported_networks(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn get_network_spec(&self, name: &str) -> Option<NetworkSpec> {
        self.0.get(name).cloned()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// The main network
    #[default]
    Mainnet,
    /// The public test network
    Testnet,
    /// The scaling test network
    Stn,
    /// Local regression test network
    Regtest,
}

impl FromStr for Network {
    type Err = LimitsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "stn" => Ok(Network::Stn),
            "regtest" => Ok(Network::Regtest),
            _ => Err(LimitsError::UnknownNetwork(s.to_string())),
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Stn => "stn",
            Network::Regtest => "regtest",
        })
    }
}
