// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Configuration for the backtest engine and its venues.

use meridian_common::cache::database::InMemoryCacheDatabase;
use meridian_execution::{
    matching_engine::OrderMatchingEngineConfig,
    models::{FeeModelAny, FillModel},
};
use meridian_model::{
    enums::{AccountType, OmsType},
    identifiers::{TraderId, Venue},
    types::{Currency, Money},
};
use meridian_risk::engine::RiskEngineConfig;

use crate::modules::SimulationModule;

/// Configuration for a `BacktestEngine`.
#[derive(Clone, Debug)]
pub struct BacktestEngineConfig {
    /// The trader ID for the backtest node.
    pub trader_id: TraderId,
    /// The optional cache database backing (state persists across restarts).
    pub cache_database: Option<InMemoryCacheDatabase>,
    /// Whether the cache database is flushed on engine creation.
    pub cache_db_flush: bool,
    /// The risk engine configuration.
    pub risk: RiskEngineConfig,
}

impl Default for BacktestEngineConfig {
    /// Creates a new default [`BacktestEngineConfig`] instance.
    fn default() -> Self {
        Self {
            trader_id: TraderId::new("BACKTESTER-001"),
            cache_database: None,
            cache_db_flush: true,
            risk: RiskEngineConfig::default(),
        }
    }
}

/// Configuration for one simulated venue added to a backtest.
pub struct BacktestVenueConfig {
    /// The venue ID.
    pub venue: Venue,
    /// The order management system (OMS) type.
    pub oms_type: OmsType,
    /// The account type.
    pub account_type: AccountType,
    /// The starting balances per currency.
    pub starting_balances: Vec<Money>,
    /// The single-currency account base currency, if constrained.
    pub base_currency: Option<Currency>,
    /// The fill model for the venue's matching engines.
    pub fill_model: FillModel,
    /// The fee model for the venue's matching engines.
    pub fee_model: FeeModelAny,
    /// The simulation modules registered with the venue.
    pub modules: Vec<Box<dyn SimulationModule>>,
    /// The matching engine configuration.
    pub matching_config: OrderMatchingEngineConfig,
}

impl BacktestVenueConfig {
    /// Creates a new [`BacktestVenueConfig`] instance with default models.
    #[must_use]
    pub fn new(
        venue: Venue,
        oms_type: OmsType,
        account_type: AccountType,
        starting_balances: Vec<Money>,
    ) -> Self {
        Self {
            venue,
            oms_type,
            account_type,
            base_currency: starting_balances.first().map(|money| money.currency),
            starting_balances,
            fill_model: FillModel::default(),
            fee_model: FeeModelAny::default(),
            modules: Vec::new(),
            matching_config: OrderMatchingEngineConfig::default(),
        }
    }

    /// Sets the fill model.
    #[must_use]
    pub fn with_fill_model(mut self, fill_model: FillModel) -> Self {
        self.fill_model = fill_model;
        self
    }

    /// Sets the fee model.
    #[must_use]
    pub fn with_fee_model(mut self, fee_model: FeeModelAny) -> Self {
        self.fee_model = fee_model;
        self
    }

    /// Adds a simulation module.
    #[must_use]
    pub fn with_module(mut self, module: Box<dyn SimulationModule>) -> Self {
        self.modules.push(module);
        self
    }
}
