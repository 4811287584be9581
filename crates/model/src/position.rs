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

//! Represents a position in a market, aggregated from order fills.
//!
//! The position ID may be assigned by the venue, or generated by the execution
//! engine per the venue's OMS policy. A position is OPEN while its quantity is
//! positive and CLOSED once a fill brings the quantity to zero; fills which
//! would cross through zero are split by the execution engine before they
//! reach the position.

use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
};

use meridian_core::UnixNanos;
use serde::{Deserialize, Serialize};

use crate::{
    enums::{OrderSide, PositionSide},
    events::OrderFilled,
    identifiers::{
        AccountId, ClientOrderId, InstrumentId, PositionId, StrategyId, TradeId, TraderId,
    },
    instruments::{Instrument, InstrumentAny},
    types::{Currency, Money, Price, Quantity},
};

/// Represents a position in a market.
///
/// The quantity is unsigned; `side` carries the direction and `signed_qty`
/// provides the signed view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// The fills applied to the position, in apply order.
    pub events: Vec<OrderFilled>,
    /// The trader ID associated with the position.
    pub trader_id: TraderId,
    /// The strategy ID associated with the position.
    pub strategy_id: StrategyId,
    /// The position's instrument ID.
    pub instrument_id: InstrumentId,
    /// The position ID.
    pub id: PositionId,
    /// The account ID associated with the position.
    pub account_id: AccountId,
    /// The client order ID for the order which opened the position.
    pub opening_order_id: ClientOrderId,
    /// The client order ID for the order which closed the position, if closed.
    pub closing_order_id: Option<ClientOrderId>,
    /// The entry direction from open.
    pub entry: OrderSide,
    /// The current position side.
    pub side: PositionSide,
    /// The current signed quantity (positive for LONG, negative for SHORT).
    pub signed_qty: f64,
    /// The current open quantity.
    pub quantity: Quantity,
    /// The peak directional quantity reached by the position.
    pub peak_qty: Quantity,
    /// The price decimal precision for the instrument.
    pub price_precision: u8,
    /// The size decimal precision for the instrument.
    pub size_precision: u8,
    /// The contract multiplier.
    pub multiplier: Quantity,
    /// Whether the instrument quotes inversely.
    pub is_inverse: bool,
    /// The instrument base currency, if any.
    pub base_currency: Option<Currency>,
    /// The instrument quote currency.
    pub quote_currency: Currency,
    /// The settlement currency for PnL.
    pub settlement_currency: Currency,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the position opened.
    pub ts_opened: UnixNanos,
    /// UNIX timestamp (nanoseconds) of the last fill.
    pub ts_last: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the position closed, if closed.
    pub ts_closed: Option<UnixNanos>,
    /// The total open duration in nanoseconds, if closed.
    pub duration_ns: Option<u64>,
    /// The volume-weighted average open price.
    pub avg_px_open: f64,
    /// The volume-weighted average close price, if any close fills.
    pub avg_px_close: Option<f64>,
    /// The realized return for the position.
    pub realized_return: f64,
    /// The realized PnL for the position (including commissions).
    pub realized_pnl: Option<Money>,
    /// The trade match IDs for the position's fills.
    pub trade_ids: Vec<TradeId>,
    /// The total bought quantity.
    pub buy_qty: Quantity,
    /// The total sold quantity.
    pub sell_qty: Quantity,
    /// The accumulated commissions per currency.
    pub commissions: HashMap<Currency, Money>,
}

impl Position {
    /// Creates a new [`Position`] instance from its opening `fill`.
    ///
    /// # Panics
    ///
    /// Panics if the fill has no position ID, or a zero fill quantity.
    #[must_use]
    pub fn new(instrument: &InstrumentAny, fill: OrderFilled) -> Self {
        assert_eq!(instrument.id(), fill.instrument_id);
        assert!(fill.last_qty.is_positive(), "Fill quantity was zero");
        let position_id = fill.position_id.expect("Fill must have a position ID");

        let mut position = Self {
            events: Vec::new(),
            trader_id: fill.trader_id,
            strategy_id: fill.strategy_id,
            instrument_id: fill.instrument_id,
            id: position_id,
            account_id: fill.account_id,
            opening_order_id: fill.client_order_id,
            closing_order_id: None,
            entry: fill.order_side,
            side: PositionSide::Flat,
            signed_qty: 0.0,
            quantity: Quantity::zero(instrument.size_precision()),
            peak_qty: Quantity::zero(instrument.size_precision()),
            price_precision: instrument.price_precision(),
            size_precision: instrument.size_precision(),
            multiplier: instrument.multiplier(),
            is_inverse: instrument.is_inverse(),
            base_currency: instrument.base_currency(),
            quote_currency: instrument.quote_currency(),
            settlement_currency: instrument.settlement_currency(),
            ts_init: fill.ts_init,
            ts_opened: fill.ts_event,
            ts_last: fill.ts_event,
            ts_closed: None,
            duration_ns: None,
            avg_px_open: fill.last_px.as_f64(),
            avg_px_close: None,
            realized_return: 0.0,
            realized_pnl: None,
            trade_ids: Vec::new(),
            buy_qty: Quantity::zero(instrument.size_precision()),
            sell_qty: Quantity::zero(instrument.size_precision()),
            commissions: HashMap::new(),
        };
        position.apply(&fill);
        position
    }

    /// Applies the given `fill` to the position in timestamp order.
    ///
    /// # Panics
    ///
    /// Panics if the fill's trade ID was already applied, or the fill side is
    /// unspecified.
    pub fn apply(&mut self, fill: &OrderFilled) {
        assert!(
            !self.trade_ids.contains(&fill.trade_id),
            "Duplicate trade ID {}",
            fill.trade_id
        );

        self.events.push(*fill);
        self.trade_ids.push(fill.trade_id);

        if let Some(commission) = fill.commission {
            let entry = self
                .commissions
                .entry(commission.currency)
                .or_insert_with(|| Money::zero(commission.currency));
            *entry += commission;
        }

        match fill.order_side {
            OrderSide::Buy => self.handle_buy_order_fill(fill),
            OrderSide::Sell => self.handle_sell_order_fill(fill),
            OrderSide::NoOrderSide => panic!("Fill order side was `NoOrderSide`"),
        }

        // Set quantities
        self.quantity = Quantity::new(self.signed_qty.abs(), self.size_precision);
        if self.quantity > self.peak_qty {
            self.peak_qty = self.quantity;
        }

        // Set state
        if self.signed_qty > 0.0 {
            self.entry = OrderSide::Buy;
            self.side = PositionSide::Long;
        } else if self.signed_qty < 0.0 {
            self.entry = OrderSide::Sell;
            self.side = PositionSide::Short;
        } else {
            self.side = PositionSide::Flat;
            self.closing_order_id = Some(fill.client_order_id);
            self.ts_closed = Some(fill.ts_event);
            self.duration_ns = Some(fill.ts_event.saturating_sub(self.ts_opened.as_u64()));
        }

        self.ts_last = fill.ts_event;
    }

    fn handle_buy_order_fill(&mut self, fill: &OrderFilled) {
        let mut realized_pnl = match fill.commission {
            Some(commission) if commission.currency == self.settlement_currency => {
                -commission.as_f64()
            }
            _ => 0.0,
        };
        let last_px = fill.last_px.as_f64();
        let last_qty = fill.last_qty.as_f64();

        if self.signed_qty > 0.0 {
            // Extending LONG
            self.avg_px_open = self.calculate_avg_px_open(last_px, last_qty);
        } else if self.signed_qty < 0.0 {
            // Reducing SHORT
            let close_qty = last_qty.min(self.signed_qty.abs());
            self.avg_px_close = Some(self.calculate_avg_px_close(last_px, close_qty));
            self.realized_return = self.calculate_return(self.avg_px_open, last_px);
            realized_pnl += self.calculate_pnl_value(self.avg_px_open, last_px, close_qty);
        }

        self.add_realized_pnl(realized_pnl);
        self.signed_qty += last_qty;
        self.buy_qty += fill.last_qty;
    }

    fn handle_sell_order_fill(&mut self, fill: &OrderFilled) {
        let mut realized_pnl = match fill.commission {
            Some(commission) if commission.currency == self.settlement_currency => {
                -commission.as_f64()
            }
            _ => 0.0,
        };
        let last_px = fill.last_px.as_f64();
        let last_qty = fill.last_qty.as_f64();

        if self.signed_qty < 0.0 {
            // Extending SHORT
            self.avg_px_open = self.calculate_avg_px_open(last_px, last_qty);
        } else if self.signed_qty > 0.0 {
            // Reducing LONG
            let close_qty = last_qty.min(self.signed_qty);
            self.avg_px_close = Some(self.calculate_avg_px_close(last_px, close_qty));
            self.realized_return = self.calculate_return(self.avg_px_open, last_px);
            realized_pnl += self.calculate_pnl_value(self.avg_px_open, last_px, close_qty);
        }

        self.add_realized_pnl(realized_pnl);
        self.signed_qty -= last_qty;
        self.sell_qty += fill.last_qty;
    }

    fn add_realized_pnl(&mut self, value: f64) {
        let pnl = Money::new(value, self.settlement_currency);
        self.realized_pnl = Some(match self.realized_pnl {
            Some(existing) => existing + pnl,
            None => pnl,
        });
    }

    fn calculate_avg_px(&self, qty: f64, avg_px: f64, last_px: f64, last_qty: f64) -> f64 {
        let start_cost = avg_px * qty;
        let event_cost = last_px * last_qty;
        (start_cost + event_cost) / (qty + last_qty)
    }

    fn calculate_avg_px_open(&self, last_px: f64, last_qty: f64) -> f64 {
        self.calculate_avg_px(self.quantity.as_f64(), self.avg_px_open, last_px, last_qty)
    }

    fn calculate_avg_px_close(&self, last_px: f64, last_qty: f64) -> f64 {
        match self.avg_px_close {
            Some(avg_px_close) => {
                let close_qty = match self.entry {
                    OrderSide::Buy => self.sell_qty.as_f64(),
                    _ => self.buy_qty.as_f64(),
                };
                self.calculate_avg_px(close_qty, avg_px_close, last_px, last_qty)
            }
            None => last_px,
        }
    }

    fn calculate_return(&self, avg_px_open: f64, avg_px_close: f64) -> f64 {
        (avg_px_close - avg_px_open) / avg_px_open * self.side_multiplier()
    }

    fn calculate_pnl_value(&self, avg_px_open: f64, avg_px_close: f64, quantity: f64) -> f64 {
        if self.is_inverse {
            quantity
                * self.multiplier.as_f64()
                * self.side_multiplier()
                * (1.0 / avg_px_open - 1.0 / avg_px_close)
        } else {
            quantity
                * self.multiplier.as_f64()
                * self.side_multiplier()
                * (avg_px_close - avg_px_open)
        }
    }

    fn side_multiplier(&self) -> f64 {
        match self.side {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
            PositionSide::Flat => match self.entry {
                // Position currently flat during the closing fill application
                OrderSide::Buy => 1.0,
                _ => -1.0,
            },
        }
    }

    /// Calculates the PnL for the given prices and quantity (in the settlement
    /// currency, directional by the current side).
    #[must_use]
    pub fn calculate_pnl(&self, avg_px_open: f64, avg_px_close: f64, quantity: Quantity) -> Money {
        Money::new(
            self.calculate_pnl_value(avg_px_open, avg_px_close, quantity.as_f64()),
            self.settlement_currency,
        )
    }

    /// Returns the unrealized PnL of the position marked at the given `last` price.
    #[must_use]
    pub fn unrealized_pnl(&self, last: Price) -> Money {
        if self.side == PositionSide::Flat {
            Money::zero(self.settlement_currency)
        } else {
            self.calculate_pnl(self.avg_px_open, last.as_f64(), self.quantity)
        }
    }

    /// Returns the total PnL (realized + unrealized at the given `last` price).
    #[must_use]
    pub fn total_pnl(&self, last: Price) -> Money {
        self.realized_pnl
            .unwrap_or_else(|| Money::zero(self.settlement_currency))
            + self.unrealized_pnl(last)
    }

    /// Returns the current notional exposure marked at the given `last` price.
    #[must_use]
    pub fn notional_value(&self, last: Price) -> Money {
        if self.is_inverse {
            Money::new(
                self.quantity.as_f64() * self.multiplier.as_f64(),
                self.base_currency.expect("Inverse without base currency"),
            )
        } else {
            Money::new(
                self.quantity.as_f64() * self.multiplier.as_f64() * last.as_f64(),
                self.quote_currency,
            )
        }
    }

    /// Returns the distinct client order IDs for the position's fills.
    #[must_use]
    pub fn client_order_ids(&self) -> Vec<ClientOrderId> {
        let mut ids: Vec<ClientOrderId> = self.events.iter().map(|f| f.client_order_id).collect();
        ids.dedup();
        ids
    }

    /// Returns the last fill event, if any.
    #[must_use]
    pub fn last_event(&self) -> Option<&OrderFilled> {
        self.events.last()
    }

    /// Returns the count of applied fills.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Returns whether the position is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.side != PositionSide::Flat && self.ts_closed.is_none()
    }

    /// Returns whether the position is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    /// Returns whether the position is long.
    #[must_use]
    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    /// Returns whether the position is short.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let quantity_str = if self.side == PositionSide::Flat {
            String::new()
        } else {
            format!("{} ", self.quantity.to_formatted_string())
        };
        write!(
            f,
            "{}({}{} {}, id={})",
            stringify!(Position),
            quantity_str,
            self.side,
            self.instrument_id,
            self.id,
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use meridian_core::{UUID4, UnixNanos};
    use rstest::rstest;

    use super::*;
    use crate::{
        enums::{LiquiditySide, OrderType},
        identifiers::VenueOrderId,
        stubs::{audusd_sim, instrument_any},
    };

    fn fill(
        instrument: &InstrumentAny,
        side: OrderSide,
        qty: u64,
        px: &str,
        trade_id: &str,
        ts: u64,
    ) -> OrderFilled {
        OrderFilled::new(
            TraderId::default(),
            StrategyId::default(),
            instrument.id(),
            ClientOrderId::new(format!("O-{trade_id}")),
            VenueOrderId::new("SIM-1-001"),
            AccountId::default(),
            TradeId::new(trade_id),
            side,
            OrderType::Market,
            Quantity::from(qty),
            Price::from(px),
            instrument.quote_currency(),
            LiquiditySide::Taker,
            Some(PositionId::new("P-001")),
            Some(Money::zero(instrument.quote_currency())),
            UUID4::new(),
            UnixNanos::from(ts),
            UnixNanos::from(ts),
        )
    }

    #[rstest]
    fn test_open_long(audusd_sim: crate::instruments::CurrencyPair) {
        let instrument = instrument_any(audusd_sim);
        let position = Position::new(&instrument, fill(&instrument, OrderSide::Buy, 100_000, "0.75000", "1", 1));

        assert_eq!(position.side, PositionSide::Long);
        assert_eq!(position.quantity, Quantity::from(100_000_u32));
        assert_eq!(position.signed_qty, 100_000.0);
        assert_eq!(position.avg_px_open, 0.75);
        assert!(position.is_open());
        assert_eq!(position.realized_pnl, Some(Money::zero(Currency::USD())));
    }

    #[rstest]
    fn test_extend_long_updates_vwap(audusd_sim: crate::instruments::CurrencyPair) {
        let instrument = instrument_any(audusd_sim);
        let mut position = Position::new(&instrument, fill(&instrument, OrderSide::Buy, 100_000, "0.75000", "1", 1));
        position.apply(&fill(&instrument, OrderSide::Buy, 100_000, "0.76000", "2", 2));

        assert_eq!(position.quantity, Quantity::from(200_000_u32));
        assert_eq!(position.avg_px_open, 0.755);
        assert_eq!(position.peak_qty, Quantity::from(200_000_u32));
    }

    #[rstest]
    fn test_reduce_long_realizes_pnl(audusd_sim: crate::instruments::CurrencyPair) {
        let instrument = instrument_any(audusd_sim);
        let mut position = Position::new(&instrument, fill(&instrument, OrderSide::Buy, 100_000, "0.75000", "1", 1));
        position.apply(&fill(&instrument, OrderSide::Sell, 50_000, "0.75100", "2", 2));

        assert_eq!(position.side, PositionSide::Long);
        assert_eq!(position.quantity, Quantity::from(50_000_u32));
        // 50_000 * (0.751 - 0.750) = 50.0 USD
        assert_eq!(position.realized_pnl, Some(Money::new(50.0, Currency::USD())));
        assert_eq!(position.avg_px_close, Some(0.751));
    }

    #[rstest]
    fn test_close_long(audusd_sim: crate::instruments::CurrencyPair) {
        let instrument = instrument_any(audusd_sim);
        let mut position = Position::new(&instrument, fill(&instrument, OrderSide::Buy, 100_000, "0.75000", "1", 1));
        position.apply(&fill(&instrument, OrderSide::Sell, 100_000, "0.74000", "2", 5));

        assert_eq!(position.side, PositionSide::Flat);
        assert!(position.is_closed());
        assert!(position.quantity.is_zero());
        assert_eq!(position.ts_closed, Some(UnixNanos::from(5)));
        assert_eq!(position.duration_ns, Some(4));
        // 100_000 * (0.740 - 0.750) = -1_000 USD
        assert_eq!(
            position.realized_pnl,
            Some(Money::new(-1_000.0, Currency::USD()))
        );
    }

    #[rstest]
    fn test_short_position_pnl(audusd_sim: crate::instruments::CurrencyPair) {
        let instrument = instrument_any(audusd_sim);
        let mut position = Position::new(&instrument, fill(&instrument, OrderSide::Sell, 100_000, "0.75000", "1", 1));

        assert_eq!(position.side, PositionSide::Short);
        assert_eq!(position.signed_qty, -100_000.0);

        position.apply(&fill(&instrument, OrderSide::Buy, 100_000, "0.74900", "2", 2));
        // Short from 0.750 covered at 0.749: +100 USD
        assert_eq!(position.realized_pnl, Some(Money::new(100.0, Currency::USD())));
        assert!(position.is_closed());
    }

    #[rstest]
    fn test_unrealized_pnl(audusd_sim: crate::instruments::CurrencyPair) {
        let instrument = instrument_any(audusd_sim);
        let position = Position::new(&instrument, fill(&instrument, OrderSide::Buy, 100_000, "0.75000", "1", 1));

        assert_eq!(
            position.unrealized_pnl(Price::from("0.75500")),
            Money::new(500.0, Currency::USD())
        );
        assert_eq!(
            position.total_pnl(Price::from("0.75500")),
            Money::new(500.0, Currency::USD())
        );
    }

    #[rstest]
    fn test_sum_of_fill_quantities_equals_position(audusd_sim: crate::instruments::CurrencyPair) {
        let instrument = instrument_any(audusd_sim);
        let mut position = Position::new(&instrument, fill(&instrument, OrderSide::Buy, 100_000, "0.75000", "1", 1));
        position.apply(&fill(&instrument, OrderSide::Buy, 50_000, "0.75100", "2", 2));
        position.apply(&fill(&instrument, OrderSide::Sell, 30_000, "0.75200", "3", 3));

        let signed_sum: f64 = position
            .events
            .iter()
            .map(|f| match f.order_side {
                OrderSide::Buy => f.last_qty.as_f64(),
                _ => -f.last_qty.as_f64(),
            })
            .sum();
        assert_eq!(signed_sum, position.signed_qty);
        assert_eq!(position.quantity, Quantity::from(120_000_u32));
    }

    #[rstest]
    #[should_panic(expected = "Duplicate trade ID")]
    fn test_duplicate_trade_id_panics(audusd_sim: crate::instruments::CurrencyPair) {
        let instrument = instrument_any(audusd_sim);
        let mut position = Position::new(&instrument, fill(&instrument, OrderSide::Buy, 100_000, "0.75000", "1", 1));
        position.apply(&fill(&instrument, OrderSide::Buy, 100_000, "0.75000", "1", 2));
    }
}
