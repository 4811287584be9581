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

use std::{cell::RefCell, rc::Rc};

use meridian_common::{
    clock::TestClock,
    msgbus::{MessageBus, handler::{ShareableMessageHandler, TypedMessageHandler}},
};
use meridian_core::UnixNanos;
use meridian_model::{
    enums::{AccountType, OmsType, OrderSide, OrderStatus, OrderType, TimeInForce},
    events::OrderEventAny,
    identifiers::{AccountId, InstrumentId},
    orders::{Order, OrderAny, OrderTestBuilder},
    stubs::{audusd_sim, instrument_any, quote_tick, usdjpy_sim},
    types::{Price, Quantity},
};
use rstest::rstest;

use crate::{
    matching_engine::{OrderMatchingEngine, OrderMatchingEngineConfig},
    messages::EXEC_ENGINE_PROCESS,
    models::{FeeModelAny, FillModel, MakerTakerFeeModel},
};

struct TestHarness {
    engine: OrderMatchingEngine,
    events: Rc<RefCell<Vec<OrderEventAny>>>,
}

fn harness_for(
    instrument: meridian_model::instruments::InstrumentAny,
    fill_model: FillModel,
) -> TestHarness {
    let clock = Rc::new(RefCell::new(TestClock::new()));
    let msgbus = MessageBus::default().into_shared();

    let events = Rc::new(RefCell::new(Vec::new()));
    let events_clone = events.clone();
    let handler = ShareableMessageHandler(Rc::new(TypedMessageHandler::new(
        Some(EXEC_ENGINE_PROCESS),
        move |event: &OrderEventAny| {
            events_clone.borrow_mut().push(*event);
        },
    )));
    msgbus.borrow_mut().register(EXEC_ENGINE_PROCESS, handler);

    let engine = OrderMatchingEngine::new(
        instrument,
        1,
        fill_model,
        FeeModelAny::MakerTaker(MakerTakerFeeModel),
        OmsType::Netting,
        AccountType::Cash,
        clock,
        msgbus,
        OrderMatchingEngineConfig::default(),
    );
    TestHarness { engine, events }
}

fn harness() -> TestHarness {
    harness_for(instrument_any(audusd_sim()), FillModel::default())
}

fn kinds(events: &Rc<RefCell<Vec<OrderEventAny>>>) -> Vec<&'static str> {
    events.borrow().iter().map(OrderEventAny::kind).collect()
}

/// Applies a submitted event, as the execution engine does before forwarding
/// an order to its venue.
fn submit(order: &mut OrderAny) {
    let event = OrderEventAny::Submitted(meridian_model::events::OrderSubmitted::new(
        order.trader_id(),
        order.strategy_id(),
        order.instrument_id(),
        order.client_order_id(),
        AccountId::default(),
        meridian_core::UUID4::new(),
        UnixNanos::default(),
        UnixNanos::default(),
    ));
    order.apply(event).unwrap();
}

#[rstest]
fn test_market_order_fills_at_top_of_book() {
    let mut harness = harness();
    let instrument_id = InstrumentId::from("AUD/USD.SIM");
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74995", "0.75000", 1));

    let mut order = OrderTestBuilder::new(OrderType::Market)
        .instrument_id(instrument_id)
        .side(OrderSide::Buy)
        .quantity(Quantity::from(100_000_u32))
        .build();
    submit(&mut order);
    harness
        .engine
        .process_order(&mut order, AccountId::default());

    assert_eq!(kinds(&harness.events), vec!["OrderFilled"]);
    let OrderEventAny::Filled(fill) = harness.events.borrow()[0] else {
        panic!("expected fill")
    };
    assert_eq!(fill.last_px, Price::from("0.75000"));
    assert_eq!(fill.last_qty, Quantity::from(100_000_u32));
    assert_eq!(order.status(), OrderStatus::Filled);
}

#[rstest]
fn test_market_order_rejected_with_no_market() {
    let mut harness = harness();
    let mut order = OrderTestBuilder::new(OrderType::Market)
        .instrument_id(InstrumentId::from("AUD/USD.SIM"))
        .side(OrderSide::Buy)
        .quantity(Quantity::from(100_000_u32))
        .build();
    submit(&mut order);
    harness
        .engine
        .process_order(&mut order, AccountId::default());

    assert_eq!(kinds(&harness.events), vec!["OrderRejected"]);
    assert_eq!(order.status(), OrderStatus::Rejected);
}

#[rstest]
fn test_market_order_slips_one_tick_when_model_slips() {
    let fill_model = FillModel::new(1.0, 1.0, 1.0, Some(42)).unwrap();
    let mut harness = harness_for(instrument_any(audusd_sim()), fill_model);
    let instrument_id = InstrumentId::from("AUD/USD.SIM");
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74995", "0.75000", 1));

    let mut order = OrderTestBuilder::new(OrderType::Market)
        .instrument_id(instrument_id)
        .side(OrderSide::Buy)
        .quantity(Quantity::from(100_000_u32))
        .build();
    submit(&mut order);
    harness
        .engine
        .process_order(&mut order, AccountId::default());

    let OrderEventAny::Filled(fill) = harness.events.borrow()[0] else {
        panic!("expected fill")
    };
    // One tick adverse to the buyer
    assert_eq!(fill.last_px, Price::from("0.75001"));
}

#[rstest]
fn test_limit_order_rests_then_fills_when_touched() {
    let mut harness = harness();
    let instrument_id = InstrumentId::from("AUD/USD.SIM");
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74995", "0.75000", 1));

    let mut order = OrderTestBuilder::new(OrderType::Limit)
        .instrument_id(instrument_id)
        .side(OrderSide::Buy)
        .price(Price::from("0.74900"))
        .quantity(Quantity::from(100_000_u32))
        .build();
    submit(&mut order);
    harness
        .engine
        .process_order(&mut order, AccountId::default());

    // No fill yet: order accepted and resting
    assert_eq!(kinds(&harness.events), vec!["OrderAccepted"]);
    assert!(harness.engine.order_exists(order.client_order_id()));

    // Quote arrives with the ask touching the limit price
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74895", "0.74900", 2));

    assert_eq!(kinds(&harness.events), vec!["OrderAccepted", "OrderFilled"]);
    let OrderEventAny::Filled(fill) = harness.events.borrow()[1] else {
        panic!("expected fill")
    };
    assert_eq!(fill.last_px, Price::from("0.74900"));
    assert!(!harness.engine.order_exists(order.client_order_id()));
}

#[rstest]
fn test_touched_limit_never_fills_with_zero_probability() {
    let fill_model = FillModel::new(0.0, 1.0, 0.0, Some(42)).unwrap();
    let mut harness = harness_for(instrument_any(audusd_sim()), fill_model);
    let instrument_id = InstrumentId::from("AUD/USD.SIM");
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74995", "0.75000", 1));

    let mut order = OrderTestBuilder::new(OrderType::Limit)
        .instrument_id(instrument_id)
        .side(OrderSide::Buy)
        .price(Price::from("0.74900"))
        .quantity(Quantity::from(100_000_u32))
        .build();
    submit(&mut order);
    harness
        .engine
        .process_order(&mut order, AccountId::default());

    // Ask touches but never crosses the limit price
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74895", "0.74900", 2));
    assert_eq!(kinds(&harness.events), vec!["OrderAccepted"]);

    // A crossed price always fills regardless of the probability
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74890", "0.74895", 3));
    assert_eq!(kinds(&harness.events), vec!["OrderAccepted", "OrderFilled"]);
}

#[rstest]
fn test_post_only_marketable_limit_rejected() {
    let mut harness = harness();
    let instrument_id = InstrumentId::from("AUD/USD.SIM");
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74995", "0.75000", 1));

    let mut order = OrderTestBuilder::new(OrderType::Limit)
        .instrument_id(instrument_id)
        .side(OrderSide::Buy)
        .price(Price::from("0.75005"))
        .quantity(Quantity::from(100_000_u32))
        .post_only(true)
        .build();
    submit(&mut order);
    harness
        .engine
        .process_order(&mut order, AccountId::default());

    assert_eq!(kinds(&harness.events), vec!["OrderRejected"]);
}

#[rstest]
fn test_fok_limit_canceled_when_not_marketable() {
    let mut harness = harness();
    let instrument_id = InstrumentId::from("AUD/USD.SIM");
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74995", "0.75000", 1));

    let mut order = OrderTestBuilder::new(OrderType::Limit)
        .instrument_id(instrument_id)
        .side(OrderSide::Buy)
        .price(Price::from("0.74900"))
        .quantity(Quantity::from(100_000_u32))
        .time_in_force(TimeInForce::Fok)
        .build();
    submit(&mut order);
    harness
        .engine
        .process_order(&mut order, AccountId::default());

    assert_eq!(kinds(&harness.events), vec!["OrderAccepted", "OrderCanceled"]);
    assert_eq!(order.status(), OrderStatus::Canceled);
}

#[rstest]
fn test_stop_limit_triggers_then_fills_marketable() {
    // S3 scenario: trigger 1.00010, limit 1.00020, ask walks up
    let mut harness = harness_for(
        instrument_any(usdjpy_sim()),
        FillModel::new(1.0, 1.0, 0.0, Some(42)).unwrap(),
    );
    let instrument_id = InstrumentId::from("USD/JPY.SIM");
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "1.000", "1.005", 1));

    let mut order = OrderTestBuilder::new(OrderType::StopLimit)
        .instrument_id(instrument_id)
        .side(OrderSide::Buy)
        .trigger_price(Price::from("1.010"))
        .price(Price::from("1.020"))
        .quantity(Quantity::from(50_000_u32))
        .build();
    submit(&mut order);
    harness
        .engine
        .process_order(&mut order, AccountId::default());
    assert_eq!(kinds(&harness.events), vec!["OrderAccepted"]);

    // Ask reaches the trigger exactly: triggered, then marketable at 1.015
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "1.005", "1.010", 2));
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "1.010", "1.015", 3));

    let kinds = kinds(&harness.events);
    assert!(kinds.contains(&"OrderTriggered"));
    assert_eq!(kinds.last(), Some(&"OrderFilled"));
    let OrderEventAny::Filled(fill) = *harness.events.borrow().last().unwrap() else {
        panic!("expected fill")
    };
    assert_eq!(fill.last_px, Price::from("1.015"));
}

#[rstest]
fn test_stop_market_at_trigger_gated_by_probability() {
    // With prob_fill_on_stop=0.0 a touched trigger never fires
    let mut harness = harness_for(
        instrument_any(audusd_sim()),
        FillModel::new(1.0, 0.0, 0.0, Some(42)).unwrap(),
    );
    let instrument_id = InstrumentId::from("AUD/USD.SIM");
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74990", "0.74995", 1));

    let mut order = OrderTestBuilder::new(OrderType::StopMarket)
        .instrument_id(instrument_id)
        .side(OrderSide::Buy)
        .trigger_price(Price::from("0.75000"))
        .quantity(Quantity::from(100_000_u32))
        .build();
    submit(&mut order);
    harness
        .engine
        .process_order(&mut order, AccountId::default());

    // Ask touches the trigger exactly
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74995", "0.75000", 2));
    assert_eq!(kinds(&harness.events), vec!["OrderAccepted"]);

    // A crossed trigger always fires
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.75000", "0.75005", 3));
    assert_eq!(kinds(&harness.events), vec!["OrderAccepted", "OrderFilled"]);
}

#[rstest]
fn test_stop_market_at_trigger_with_certain_probability_always_fills() {
    let mut harness = harness_for(
        instrument_any(audusd_sim()),
        FillModel::new(1.0, 1.0, 0.0, Some(42)).unwrap(),
    );
    let instrument_id = InstrumentId::from("AUD/USD.SIM");
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74990", "0.74995", 1));

    let mut order = OrderTestBuilder::new(OrderType::StopMarket)
        .instrument_id(instrument_id)
        .side(OrderSide::Buy)
        .trigger_price(Price::from("0.75000"))
        .quantity(Quantity::from(100_000_u32))
        .build();
    submit(&mut order);
    harness
        .engine
        .process_order(&mut order, AccountId::default());

    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74995", "0.75000", 2));
    assert_eq!(kinds(&harness.events), vec!["OrderAccepted", "OrderFilled"]);
}

#[rstest]
fn test_gtd_order_expires() {
    let mut harness = harness();
    let instrument_id = InstrumentId::from("AUD/USD.SIM");
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74995", "0.75000", 1));

    let mut order = OrderTestBuilder::new(OrderType::Limit)
        .instrument_id(instrument_id)
        .side(OrderSide::Buy)
        .price(Price::from("0.74900"))
        .quantity(Quantity::from(100_000_u32))
        .time_in_force(TimeInForce::Gtd)
        .expire_time(UnixNanos::from(100))
        .build();
    submit(&mut order);
    harness
        .engine
        .process_order(&mut order, AccountId::default());
    assert_eq!(kinds(&harness.events), vec!["OrderAccepted"]);

    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74995", "0.75000", 100));
    assert_eq!(kinds(&harness.events), vec!["OrderAccepted", "OrderExpired"]);
    assert!(!harness.engine.order_exists(order.client_order_id()));
}

#[rstest]
fn test_bar_driven_stop_trigger_is_deterministic() {
    let mut harness = harness_for(
        instrument_any(audusd_sim()),
        FillModel::new(1.0, 1.0, 0.0, Some(42)).unwrap(),
    );
    let instrument_id = InstrumentId::from("AUD/USD.SIM");

    // Establish the market from a first bar
    let bar_type = meridian_model::data::BarType::from("AUD/USD.SIM-1-MINUTE-LAST-EXTERNAL");
    let bar = meridian_model::data::Bar::new(
        bar_type,
        Price::from("0.74900"),
        Price::from("0.74950"),
        Price::from("0.74850"),
        Price::from("0.74900"),
        Quantity::from(1_000_000_u32),
        UnixNanos::from(60),
        UnixNanos::from(60),
    );
    harness.engine.process_bar(&bar);

    let mut order = OrderTestBuilder::new(OrderType::StopMarket)
        .instrument_id(instrument_id)
        .side(OrderSide::Buy)
        .trigger_price(Price::from("0.75000"))
        .quantity(Quantity::from(100_000_u32))
        .build();
    submit(&mut order);
    harness
        .engine
        .process_order(&mut order, AccountId::default());
    assert_eq!(kinds(&harness.events), vec!["OrderAccepted"]);

    // A bullish bar walks open -> high -> low -> close; the high reaches the
    // trigger so the stop fills during the walk
    let bar = meridian_model::data::Bar::new(
        bar_type,
        Price::from("0.74900"),
        Price::from("0.75050"),
        Price::from("0.74880"),
        Price::from("0.75000"),
        Quantity::from(1_000_000_u32),
        UnixNanos::from(120),
        UnixNanos::from(120),
    );
    harness.engine.process_bar(&bar);

    assert_eq!(kinds(&harness.events), vec!["OrderAccepted", "OrderFilled"]);
    let OrderEventAny::Filled(fill) = *harness.events.borrow().last().unwrap() else {
        panic!("expected fill")
    };
    // Filled during the walk to the bar high
    assert_eq!(fill.last_px, Price::from("0.75050"));
}

#[rstest]
fn test_reset_clears_state() {
    let mut harness = harness();
    let instrument_id = InstrumentId::from("AUD/USD.SIM");
    harness
        .engine
        .process_quote_tick(&quote_tick(instrument_id, "0.74995", "0.75000", 1));

    let mut order = OrderTestBuilder::new(OrderType::Limit)
        .instrument_id(instrument_id)
        .side(OrderSide::Buy)
        .price(Price::from("0.74900"))
        .quantity(Quantity::from(100_000_u32))
        .build();
    submit(&mut order);
    harness
        .engine
        .process_order(&mut order, AccountId::default());
    assert!(harness.engine.order_exists(order.client_order_id()));

    harness.engine.reset();
    assert!(!harness.engine.order_exists(order.client_order_id()));
    assert!(harness.engine.best_bid_price().is_none());
}
