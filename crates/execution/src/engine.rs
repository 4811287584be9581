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

//! The `ExecutionEngine`: routes validated trading commands to execution
//! clients and applies order events to state.
//!
//! For fills, the engine resolves position IDs per the venue's OMS policy:
//! NETTING nets into the open position for the instrument and strategy;
//! HEDGING reduces open opposite-side positions first-in-first-out. A fill
//! which would cross through zero is split, with the residual opening a new
//! position under a flipped ID.

use std::{cell::RefCell, rc::Rc};

use ahash::AHashMap;
use anyhow::Result;
use meridian_common::{
    cache::Cache,
    clock::Clock,
    msgbus::{self, MessageBus, handler::{ShareableMessageHandler, TypedMessageHandler}},
};
use meridian_core::UUID4;
use meridian_model::{
    enums::{OmsType, OrderSideSpecified},
    events::{
        OrderEventAny, OrderFilled, OrderPendingCancel, OrderPendingUpdate, OrderSubmitted,
        PositionChanged, PositionClosed, PositionEventAny, PositionOpened,
        position::PositionState,
    },
    identifiers::{ClientId, InstrumentId, PositionId, StrategyId, TradeId, Venue},
    instruments::InstrumentAny,
    orders::{Order, OrderAny},
    position::Position,
    types::Quantity,
};
use ustr::Ustr;

use crate::{
    client::ExecutionClient,
    messages::{EXEC_ENGINE_EXECUTE, EXEC_ENGINE_PROCESS, TradingCommand},
};

/// Returns the bus topic for order events of the given strategy and
/// instrument.
#[must_use]
pub fn order_events_topic(strategy_id: StrategyId, instrument_id: InstrumentId) -> Ustr {
    Ustr::from(&format!("events.order.{strategy_id}.{instrument_id}"))
}

/// Returns the bus topic for position events of the given strategy and
/// instrument.
#[must_use]
pub fn position_events_topic(strategy_id: StrategyId, instrument_id: InstrumentId) -> Ustr {
    Ustr::from(&format!("events.position.{strategy_id}.{instrument_id}"))
}

/// An event held back for publication after the engine borrow is released.
#[derive(Clone, Debug)]
pub enum DeferredEvent {
    /// An order event with its topic.
    Order(Ustr, OrderEventAny),
    /// A position event with its topic.
    Position(Ustr, PositionEventAny),
}

/// Publishes the given deferred `events` in order.
pub fn publish_deferred(msgbus: &Rc<RefCell<MessageBus>>, events: Vec<DeferredEvent>) {
    for event in events {
        match event {
            DeferredEvent::Order(topic, event) => {
                msgbus::publish(msgbus, &topic, &event as &dyn std::any::Any);
            }
            DeferredEvent::Position(topic, event) => {
                msgbus::publish(msgbus, &topic, &event as &dyn std::any::Any);
            }
        }
    }
}

/// Routes trading commands to execution clients and applies order events to
/// cached state.
pub struct ExecutionEngine {
    clock: Rc<RefCell<dyn Clock>>,
    cache: Rc<RefCell<Cache>>,
    clients: AHashMap<ClientId, Rc<dyn ExecutionClient>>,
    routing: AHashMap<Venue, ClientId>,
    oms_types: AHashMap<Venue, OmsType>,
    pos_id_count: u64,
}

impl ExecutionEngine {
    /// Creates a new [`ExecutionEngine`] instance.
    #[must_use]
    pub fn new(clock: Rc<RefCell<dyn Clock>>, cache: Rc<RefCell<Cache>>) -> Self {
        Self {
            clock,
            cache,
            clients: AHashMap::new(),
            routing: AHashMap::new(),
            oms_types: AHashMap::new(),
            pos_id_count: 0,
        }
    }

    /// Registers the given execution `client` with its venue OMS type.
    pub fn register_client(&mut self, client: Rc<dyn ExecutionClient>, oms_type: OmsType) {
        let venue = client.venue();
        log::info!("Registered execution client {} for {venue}", client.client_id());
        self.routing.insert(venue, client.client_id());
        self.oms_types.insert(venue, oms_type);
        self.clients.insert(client.client_id(), client);
    }

    /// Registers the engine's command and event endpoints on the bus.
    pub fn register_endpoints(engine: Rc<RefCell<Self>>, msgbus: &Rc<RefCell<MessageBus>>) {
        let engine_clone = engine.clone();
        let msgbus_clone = msgbus.clone();
        let execute_handler = ShareableMessageHandler(Rc::new(TypedMessageHandler::new(
            Some(EXEC_ENGINE_EXECUTE),
            move |command: &TradingCommand| {
                let deferred = engine_clone
                    .borrow_mut()
                    .execute(command.clone())
                    .expect("Execution command failed");
                publish_deferred(&msgbus_clone, deferred);
            },
        )));
        msgbus
            .borrow_mut()
            .register(EXEC_ENGINE_EXECUTE, execute_handler);

        let engine_clone = engine.clone();
        let msgbus_clone = msgbus.clone();
        let process_handler = ShareableMessageHandler(Rc::new(TypedMessageHandler::new(
            Some(EXEC_ENGINE_PROCESS),
            move |event: &OrderEventAny| {
                let deferred = engine_clone
                    .borrow_mut()
                    .process(event)
                    .expect("Invalid order event");
                publish_deferred(&msgbus_clone, deferred);
            },
        )));
        msgbus
            .borrow_mut()
            .register(EXEC_ENGINE_PROCESS, process_handler);
    }

    fn client_for_venue(&self, venue: &Venue, client_id: Option<ClientId>) -> Option<Rc<dyn ExecutionClient>> {
        let client_id = client_id.or_else(|| self.routing.get(venue).copied())?;
        self.clients.get(&client_id).cloned()
    }

    /// Executes the given trading `command`, forwarding it to the routed
    /// execution client.
    ///
    /// Returns the order events to publish once the engine borrow is
    /// released.
    ///
    /// # Errors
    ///
    /// Returns an error on a cache or client failure.
    pub fn execute(&mut self, command: TradingCommand) -> Result<Vec<DeferredEvent>> {
        let mut deferred = Vec::new();
        let venue = command.instrument_id().venue;
        let Some(client) = self.client_for_venue(&venue, command.client_id()) else {
            log::error!("No execution client for venue {venue}");
            return Ok(deferred);
        };

        match command {
            TradingCommand::SubmitOrder(mut submit) => {
                // Validate against the cache
                if self
                    .cache
                    .borrow()
                    .instrument(&submit.instrument_id)
                    .is_none()
                {
                    log::error!(
                        "Cannot submit order: no instrument {} in cache",
                        submit.instrument_id
                    );
                    return Ok(deferred);
                }
                {
                    let mut cache = self.cache.borrow_mut();
                    if cache.order(&submit.client_order_id).is_none() {
                        cache.add_order(submit.order.clone(), submit.position_id)?;
                    }
                }

                let ts_now = self.clock.borrow().timestamp_ns();
                let submitted = OrderEventAny::Submitted(OrderSubmitted::new(
                    submit.trader_id,
                    submit.strategy_id,
                    submit.instrument_id,
                    submit.client_order_id,
                    client.account_id(),
                    UUID4::new(),
                    ts_now,
                    ts_now,
                ));
                let mut order = self
                    .cache
                    .borrow()
                    .order(&submit.client_order_id)
                    .cloned()
                    .expect("order just added");
                order.apply(submitted)?;
                self.cache.borrow_mut().update_order(&order)?;
                deferred.push(DeferredEvent::Order(
                    order_events_topic(submit.strategy_id, submit.instrument_id),
                    submitted,
                ));

                submit.order = order;
                client.submit_order(&submit)?;
            }
            TradingCommand::ModifyOrder(modify) => {
                let Some(mut order) = self.cache.borrow().order(&modify.client_order_id).cloned()
                else {
                    log::error!("Cannot modify order: {} not found", modify.client_order_id);
                    return Ok(deferred);
                };
                let ts_now = self.clock.borrow().timestamp_ns();
                let pending = OrderEventAny::PendingUpdate(OrderPendingUpdate::new(
                    modify.trader_id,
                    modify.strategy_id,
                    modify.instrument_id,
                    modify.client_order_id,
                    order.account_id().unwrap_or(client.account_id()),
                    UUID4::new(),
                    ts_now,
                    ts_now,
                ));
                order.apply(pending)?;
                self.cache.borrow_mut().update_order(&order)?;
                deferred.push(DeferredEvent::Order(
                    order_events_topic(modify.strategy_id, modify.instrument_id),
                    pending,
                ));
                client.modify_order(&modify)?;
            }
            TradingCommand::CancelOrder(cancel) => {
                let Some(mut order) = self.cache.borrow().order(&cancel.client_order_id).cloned()
                else {
                    log::error!("Cannot cancel order: {} not found", cancel.client_order_id);
                    return Ok(deferred);
                };
                let ts_now = self.clock.borrow().timestamp_ns();
                let pending = OrderEventAny::PendingCancel(OrderPendingCancel::new(
                    cancel.trader_id,
                    cancel.strategy_id,
                    cancel.instrument_id,
                    cancel.client_order_id,
                    order.account_id().unwrap_or(client.account_id()),
                    UUID4::new(),
                    ts_now,
                    ts_now,
                ));
                order.apply(pending)?;
                self.cache.borrow_mut().update_order(&order)?;
                deferred.push(DeferredEvent::Order(
                    order_events_topic(cancel.strategy_id, cancel.instrument_id),
                    pending,
                ));
                client.cancel_order(&cancel)?;
            }
        }
        Ok(deferred)
    }

    /// Processes the given order `event`: applies it via the state machine,
    /// updates the cache, runs position aggregation for fills, and returns the
    /// events to publish once the engine borrow is released.
    ///
    /// # Errors
    ///
    /// Returns an error if the event is an illegal transition (fatal, never
    /// silently dropped), or on a cache failure.
    pub fn process(&mut self, event: &OrderEventAny) -> Result<Vec<DeferredEvent>> {
        let mut deferred = Vec::new();
        let client_order_id = event.client_order_id();
        let Some(mut order) = self.cache.borrow().order(&client_order_id).cloned() else {
            log::error!("Order {client_order_id} not found in cache for {}", event.kind());
            return Ok(deferred);
        };

        match event {
            OrderEventAny::Filled(fill) => {
                self.handle_fill(&mut order, *fill, &mut deferred)?;
            }
            _ => {
                order.apply(*event)?;
                self.cache.borrow_mut().update_order(&order)?;
                deferred.push(DeferredEvent::Order(
                    order_events_topic(order.strategy_id(), order.instrument_id()),
                    *event,
                ));
            }
        }

        debug_assert!(self.cache.borrow().check_integrity());
        Ok(deferred)
    }

    // -- POSITION AGGREGATION --------------------------------------------------------------------

    fn handle_fill(
        &mut self,
        order: &mut OrderAny,
        fill: OrderFilled,
        deferred: &mut Vec<DeferredEvent>,
    ) -> Result<()> {
        let instrument = self
            .cache
            .borrow()
            .instrument(&fill.instrument_id)
            .copied()
            .ok_or_else(|| {
                anyhow::anyhow!("No instrument {} in cache for fill", fill.instrument_id)
            })?;
        let oms_type = self
            .oms_types
            .get(&fill.instrument_id.venue)
            .copied()
            .unwrap_or(OmsType::Netting);

        let resolved = self.resolve_fills(order, fill, oms_type);
        let order_topic = order_events_topic(order.strategy_id(), order.instrument_id());
        let position_topic = position_events_topic(order.strategy_id(), order.instrument_id());

        for sub_fill in resolved {
            order.apply(OrderEventAny::Filled(sub_fill))?;
            self.cache.borrow_mut().update_order(order)?;
            deferred.push(DeferredEvent::Order(
                order_topic,
                OrderEventAny::Filled(sub_fill),
            ));

            let position_event = self.apply_fill_to_position(&instrument, sub_fill)?;
            deferred.push(DeferredEvent::Position(position_topic, position_event));
        }
        Ok(())
    }

    /// Resolves the given `fill` into one or more fills with position IDs
    /// assigned per the OMS policy, splitting where a fill would cross a
    /// position through zero.
    fn resolve_fills(
        &mut self,
        order: &OrderAny,
        fill: OrderFilled,
        oms_type: OmsType,
    ) -> Vec<OrderFilled> {
        // An explicitly targeted position takes precedence (hedging close)
        let target = fill
            .position_id
            .or_else(|| {
                self.cache
                    .borrow()
                    .position_id(&order.client_order_id())
                    .copied()
            });
        if let Some(position_id) = target {
            return self.split_against_position(fill, position_id, 0);
        }

        match oms_type {
            OmsType::Netting => {
                let open_id = self
                    .cache
                    .borrow()
                    .positions_open(Some(&fill.instrument_id), Some(&fill.strategy_id))
                    .first()
                    .map(|position| position.id);
                match open_id {
                    Some(position_id) => self.split_against_position(fill, position_id, 0),
                    None => {
                        let position_id = self.generate_position_id();
                        vec![with_position_id(fill, position_id, None)]
                    }
                }
            }
            OmsType::Hedging => self.resolve_hedging_fills(fill),
        }
    }

    /// Walks open opposite-side positions first-in-first-out, reducing each in
    /// turn; any residual quantity opens a new position.
    fn resolve_hedging_fills(&mut self, fill: OrderFilled) -> Vec<OrderFilled> {
        let fill_side = fill.order_side.as_specified();
        let reducible: Vec<(PositionId, Quantity)> = self
            .cache
            .borrow()
            .positions_open(Some(&fill.instrument_id), Some(&fill.strategy_id))
            .iter()
            .filter(|position| match fill_side {
                OrderSideSpecified::Buy => position.is_short(),
                OrderSideSpecified::Sell => position.is_long(),
            })
            .map(|position| (position.id, position.quantity))
            .collect();

        if reducible.is_empty() {
            // Each opening fill creates a distinct position
            let position_id = self.generate_position_id();
            return vec![with_position_id(fill, position_id, None)];
        }

        let mut fills = Vec::new();
        let mut remaining = fill.last_qty;
        let mut split = 0_usize;
        for (position_id, quantity) in reducible {
            if remaining.is_zero() {
                break;
            }
            let close_qty = remaining.min(quantity);
            let mut sub_fill = with_position_id(fill, position_id, split_suffix(fill.trade_id, split));
            sub_fill.last_qty = close_qty;
            fills.push(sub_fill);
            remaining -= close_qty;
            split += 1;
        }
        if remaining.is_positive() {
            let position_id = self.generate_position_id();
            let mut residual = with_position_id(fill, position_id, split_suffix(fill.trade_id, split));
            residual.last_qty = remaining;
            fills.push(residual);
        }
        fills
    }

    /// Splits the given `fill` against the targeted position where it would
    /// cross through zero: the close portion realizes PnL, the residual opens
    /// a new position under the flipped ID.
    fn split_against_position(
        &mut self,
        fill: OrderFilled,
        position_id: PositionId,
        split: usize,
    ) -> Vec<OrderFilled> {
        let crossing = {
            let cache = self.cache.borrow();
            cache.position(&position_id).and_then(|position| {
                let is_reducing = match fill.order_side.as_specified() {
                    OrderSideSpecified::Buy => position.is_short(),
                    OrderSideSpecified::Sell => position.is_long(),
                };
                if position.is_open() && is_reducing && fill.last_qty > position.quantity {
                    Some(position.quantity)
                } else {
                    None
                }
            })
        };

        match crossing {
            Some(close_qty) => {
                let mut close_fill =
                    with_position_id(fill, position_id, split_suffix(fill.trade_id, split));
                close_fill.last_qty = close_qty;

                let flipped_id = PositionId::new(format!("{position_id}F"));
                let mut flip_fill =
                    with_position_id(fill, flipped_id, split_suffix(fill.trade_id, split + 1));
                flip_fill.last_qty = fill.last_qty - close_qty;

                log::warn!(
                    "Splitting fill {} across position {position_id} (closing {close_qty}, flipping {})",
                    fill.trade_id,
                    flip_fill.last_qty,
                );
                vec![close_fill, flip_fill]
            }
            None => vec![with_position_id(
                fill,
                position_id,
                split_suffix(fill.trade_id, split),
            )],
        }
    }

    fn apply_fill_to_position(
        &mut self,
        instrument: &InstrumentAny,
        fill: OrderFilled,
    ) -> Result<PositionEventAny> {
        let position_id = fill.position_id.expect("resolved fill has a position ID");
        let existing = self.cache.borrow().position(&position_id).cloned();

        match existing {
            Some(mut position) if position.is_open() => {
                position.apply(&fill);
                self.cache.borrow_mut().update_position(&position)?;
                let state = PositionState::from_position(&position, &fill, UUID4::new());
                if position.is_closed() {
                    Ok(PositionEventAny::Closed(PositionClosed { state }))
                } else {
                    Ok(PositionEventAny::Changed(PositionChanged { state }))
                }
            }
            Some(position) => {
                anyhow::bail!(
                    "Fill {} targeted closed position {}",
                    fill.trade_id,
                    position.id
                )
            }
            None => {
                let position = Position::new(instrument, fill);
                let state = PositionState::from_position(&position, &fill, UUID4::new());
                self.cache.borrow_mut().add_position(position)?;
                Ok(PositionEventAny::Opened(PositionOpened { state }))
            }
        }
    }

    fn generate_position_id(&mut self) -> PositionId {
        self.pos_id_count += 1;
        PositionId::new(format!("P-{}", self.pos_id_count))
    }

    /// Resets the engine's position ID counter.
    pub fn reset(&mut self) {
        self.pos_id_count = 0;
    }
}

fn with_position_id(
    mut fill: OrderFilled,
    position_id: PositionId,
    trade_id: Option<TradeId>,
) -> OrderFilled {
    fill.position_id = Some(position_id);
    if let Some(trade_id) = trade_id {
        fill.trade_id = trade_id;
    }
    fill
}

/// Returns a suffixed trade ID for fill splits beyond the first.
fn split_suffix(trade_id: TradeId, split: usize) -> Option<TradeId> {
    if split == 0 {
        None
    } else {
        Some(TradeId::new(format!("{trade_id}-{split}")))
    }
}
