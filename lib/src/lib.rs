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

pub mod consts;
pub mod error;
pub mod limits;
pub mod locktime;
pub mod policy;
pub mod sigops;

pub use consts::{ChainPosition, ForkCondition, Network, NetworkSpec, UpgradeId};
pub use error::{LimitsError, LimitsResult};
pub use limits::{LimitName, LimitTable, Regime, RegimeValue};
pub use locktime::{LockTimeFlags, STANDARD_LOCKTIME_VERIFY_FLAGS};
pub use policy::{ConsensusPolicy, ScopedLimits};
pub use sigops::max_sigops_for_block_size;
