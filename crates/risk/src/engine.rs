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

//! The `RiskEngine`: pre-trade checks, an order-rate throttle, and the
//! trading-state gate between strategies and the execution engine.

use std::{cell::RefCell, rc::Rc};

use ahash::AHashMap;
use meridian_common::{
    cache::Cache,
    clock::Clock,
    msgbus::{self, MessageBus, handler::{ShareableMessageHandler, TypedMessageHandler}},
};
use meridian_core::UUID4;
use meridian_model::{
    accounts::Account,
    enums::{AccountType, OrderSide, OrderSideSpecified, PriceType, TradingState},
    events::{OrderDenied, OrderEventAny},
    identifiers::InstrumentId,
    instruments::{Instrument, InstrumentAny},
    orders::{Order, OrderAny},
    types::Price,
};
use meridian_execution::messages::{
    EXEC_ENGINE_EXECUTE, EXEC_ENGINE_PROCESS, RISK_ENGINE_EXECUTE, TradingCommand,
};
use ustr::Ustr;

use crate::throttler::Throttler;

/// The bus topic on which trading state changes are published.
pub const TRADING_STATE_TOPIC: &str = "events.risk.trading_state";

/// Configuration for the `RiskEngine`.
#[derive(Clone, Debug)]
pub struct RiskEngineConfig {
    /// Whether all pre-trade checks are bypassed.
    pub bypass: bool,
    /// The maximum order submit rate (orders per second).
    pub max_order_submit_rate: u64,
    /// The maximum notional value per order, per instrument.
    pub max_notional_per_order: AHashMap<InstrumentId, f64>,
}

impl Default for RiskEngineConfig {
    fn default() -> Self {
        Self {
            bypass: false,
            max_order_submit_rate: 100,
            max_notional_per_order: AHashMap::new(),
        }
    }
}

/// The outcome of a risk check, actioned after the engine borrow is released.
#[derive(Debug)]
pub enum RiskDecision {
    /// Forward the command to the execution engine.
    Forward(TradingCommand),
    /// Deny the order with the given event.
    Deny(OrderEventAny),
    /// Drop the command (already logged).
    Drop,
}

/// Validates trading commands pre-trade and gates them on the trading state.
pub struct RiskEngine {
    /// The current trading state.
    pub trading_state: TradingState,
    config: RiskEngineConfig,
    clock: Rc<RefCell<dyn Clock>>,
    cache: Rc<RefCell<Cache>>,
    throttler: Throttler,
}

impl RiskEngine {
    /// Creates a new [`RiskEngine`] instance.
    #[must_use]
    pub fn new(
        config: RiskEngineConfig,
        clock: Rc<RefCell<dyn Clock>>,
        cache: Rc<RefCell<Cache>>,
    ) -> Self {
        let throttler = Throttler::per_second(config.max_order_submit_rate);
        Self {
            trading_state: TradingState::Active,
            config,
            clock,
            cache,
            throttler,
        }
    }

    /// Registers the engine's command endpoint on the bus.
    pub fn register_endpoints(engine: Rc<RefCell<Self>>, msgbus: &Rc<RefCell<MessageBus>>) {
        let engine_clone = engine.clone();
        let msgbus_clone = msgbus.clone();
        let handler = ShareableMessageHandler(Rc::new(TypedMessageHandler::new(
            Some(RISK_ENGINE_EXECUTE),
            move |command: &TradingCommand| {
                let decision = engine_clone.borrow_mut().execute(command.clone());
                match decision {
                    RiskDecision::Forward(command) => msgbus::send(
                        &msgbus_clone,
                        &Ustr::from(EXEC_ENGINE_EXECUTE),
                        &command as &dyn std::any::Any,
                    ),
                    RiskDecision::Deny(event) => msgbus::send(
                        &msgbus_clone,
                        &Ustr::from(EXEC_ENGINE_PROCESS),
                        &event as &dyn std::any::Any,
                    ),
                    RiskDecision::Drop => {}
                }
            },
        )));
        msgbus.borrow_mut().register(RISK_ENGINE_EXECUTE, handler);
    }

    /// Sets the trading state, returning the state event value to publish on
    /// [`TRADING_STATE_TOPIC`].
    pub fn set_trading_state(&mut self, state: TradingState) -> TradingState {
        log::info!("Trading state set to {state}");
        self.trading_state = state;
        state
    }

    /// Sets the trading state on the shared `engine` and publishes it on
    /// [`TRADING_STATE_TOPIC`].
    pub fn set_trading_state_shared(
        engine: &Rc<RefCell<Self>>,
        msgbus: &Rc<RefCell<MessageBus>>,
        state: TradingState,
    ) {
        let state = engine.borrow_mut().set_trading_state(state);
        msgbus::publish(
            msgbus,
            &Ustr::from(TRADING_STATE_TOPIC),
            &state as &dyn std::any::Any,
        );
    }

    /// Executes the given trading `command` through the pre-trade checks.
    pub fn execute(&mut self, command: TradingCommand) -> RiskDecision {
        if self.config.bypass {
            return RiskDecision::Forward(command);
        }
        match command {
            TradingCommand::SubmitOrder(ref submit) => {
                let order = submit.order.clone();
                match self.check_submit(&order) {
                    Ok(()) => RiskDecision::Forward(command),
                    Err(reason) => self.deny_order(&order, &reason),
                }
            }
            TradingCommand::ModifyOrder(ref modify) => {
                if self.trading_state == TradingState::Halted {
                    log::warn!(
                        "Dropping {modify}: TradingState is HALTED",
                    );
                    return RiskDecision::Drop;
                }
                let instrument = self.cache.borrow().instrument(&modify.instrument_id).copied();
                let Some(instrument) = instrument else {
                    log::error!(
                        "Dropping {modify}: no instrument {} in cache",
                        modify.instrument_id
                    );
                    return RiskDecision::Drop;
                };
                if let Some(price) = modify.price {
                    if let Err(e) = instrument.validate_price(price) {
                        log::error!("Dropping {modify}: {e}");
                        return RiskDecision::Drop;
                    }
                }
                if let Some(quantity) = modify.quantity {
                    if let Err(e) = instrument.validate_quantity(quantity) {
                        log::error!("Dropping {modify}: {e}");
                        return RiskDecision::Drop;
                    }
                }
                RiskDecision::Forward(command)
            }
            // Cancels always pass: they only reduce risk
            TradingCommand::CancelOrder(_) => RiskDecision::Forward(command),
        }
    }

    fn check_submit(&mut self, order: &OrderAny) -> Result<(), String> {
        // Trading state gate
        match self.trading_state {
            TradingState::Halted => {
                return Err("TradingState is HALTED: cannot submit orders".to_string());
            }
            TradingState::Reducing => {
                if !self.is_reducing(order) {
                    return Err(format!(
                        "TradingState is REDUCING: order {} would increase exposure",
                        order.client_order_id()
                    ));
                }
            }
            TradingState::Active => {}
        }

        // Instrument must be known
        let instrument = self
            .cache
            .borrow()
            .instrument(&order.instrument_id())
            .copied()
            .ok_or_else(|| format!("no instrument for {}", order.instrument_id()))?;

        // Quantity on the lot grid and within limits
        instrument
            .validate_quantity(order.quantity())
            .map_err(|e| e.to_string())?;

        // Prices on the tick grid
        if let Some(price) = order.price() {
            instrument.validate_price(price).map_err(|e| e.to_string())?;
        }
        if let Some(trigger_price) = order.trigger_price() {
            instrument
                .validate_price(trigger_price)
                .map_err(|e| e.to_string())?;
        }

        // Notional limit
        if let Some(max_notional) = self
            .config
            .max_notional_per_order
            .get(&order.instrument_id())
        {
            if let Some(price) = self.reference_price(&instrument, order) {
                let notional =
                    instrument.calculate_notional_value(order.quantity(), price, None);
                if notional.as_f64() > *max_notional {
                    return Err(format!(
                        "notional {notional} exceeds maximum {max_notional} per order"
                    ));
                }
            }
        }

        // Cash account free balance must cover the order
        self.check_balance(&instrument, order)?;

        // Order submit rate throttle
        let ts_now = self.clock.borrow().timestamp_ns();
        if !self.throttler.check(ts_now) {
            return Err("exceeded maximum order submit rate".to_string());
        }

        Ok(())
    }

    /// Checks the venue's cash account holds sufficient free balance for the
    /// order: the quote-currency notional for buys, the base-currency asset
    /// quantity for sells. Skipped when no reference price is available or
    /// the account holds no balance in the required currency.
    fn check_balance(&self, instrument: &InstrumentAny, order: &OrderAny) -> Result<(), String> {
        if order.is_reduce_only() {
            return Ok(());
        }
        let Some(price) = self.reference_price(instrument, order) else {
            return Ok(());
        };

        let cache = self.cache.borrow();
        let Some(account) = cache.account_for_venue(&order.instrument_id().venue) else {
            return Ok(());
        };
        if account.account_type() != AccountType::Cash {
            return Ok(());
        }

        let (currency, required) = match order.order_side_specified() {
            OrderSideSpecified::Buy => {
                let notional = instrument.calculate_notional_value(order.quantity(), price, None);
                (notional.currency, notional.as_f64())
            }
            OrderSideSpecified::Sell => match instrument.base_currency() {
                Some(base_currency) => (base_currency, order.quantity().as_f64()),
                None => return Ok(()),
            },
        };

        if let Some(free) = account.balance_free(Some(currency)) {
            if required > free.as_f64() {
                return Err(format!(
                    "insufficient free balance: required {required:.2} {currency}, free {free}"
                ));
            }
        }
        Ok(())
    }

    /// Returns whether the order reduces existing exposure for its instrument
    /// and strategy.
    fn is_reducing(&self, order: &OrderAny) -> bool {
        let cache = self.cache.borrow();
        let open = cache.positions_open(Some(&order.instrument_id()), Some(&order.strategy_id()));
        let reducible: f64 = open
            .iter()
            .filter(|position| match order.order_side() {
                OrderSide::Buy => position.is_short(),
                OrderSide::Sell => position.is_long(),
                OrderSide::NoOrderSide => false,
            })
            .map(|position| position.quantity.as_f64())
            .sum();
        order.quantity().as_f64() <= reducible
    }

    fn reference_price(&self, instrument: &InstrumentAny, order: &OrderAny) -> Option<Price> {
        order
            .price()
            .or(order.trigger_price())
            .or_else(|| {
                let price_type = match order.order_side_specified() {
                    OrderSideSpecified::Buy => PriceType::Ask,
                    OrderSideSpecified::Sell => PriceType::Bid,
                };
                self.cache.borrow().price(&instrument.id(), price_type)
            })
    }

    fn deny_order(&self, order: &OrderAny, reason: &str) -> RiskDecision {
        log::warn!("Denied order {}: {reason}", order.client_order_id());
        let ts_now = self.clock.borrow().timestamp_ns();
        RiskDecision::Deny(OrderEventAny::Denied(OrderDenied::new(
            order.trader_id(),
            order.strategy_id(),
            order.instrument_id(),
            order.client_order_id(),
            Ustr::from(reason),
            UUID4::new(),
            ts_now,
            ts_now,
        )))
    }

    /// Resets the engine to its initial state.
    pub fn reset(&mut self) {
        self.trading_state = TradingState::Active;
        self.throttler.reset();
    }
}
