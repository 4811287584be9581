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

//! A top-of-book (L1) order book maintained from market data.
//!
//! Depth beyond the top level is not modeled: fill simulation returns the full
//! requested quantity at the top-of-book price, which keeps bar- and
//! quote-driven matching deterministic.

use std::fmt::{Display, Formatter};

use meridian_core::UnixNanos;
use thiserror::Error;

use crate::{
    data::{BookOrder, OrderBookDelta, QuoteTick, TradeTick},
    enums::{BookAction, OrderSide, OrderSideSpecified},
    identifiers::InstrumentId,
    types::{Price, Quantity},
};

/// Errors from order book operations.
#[derive(Debug, Error)]
pub enum BookError {
    /// The data was for a different instrument.
    #[error("Instrument mismatch: book {book}, data {data}")]
    InstrumentMismatch {
        /// The book's instrument ID.
        book: InstrumentId,
        /// The data's instrument ID.
        data: InstrumentId,
    },
    /// The delta order side was unspecified.
    #[error("Book delta order side was `NoOrderSide`")]
    NoOrderSide,
}

/// A single top-of-book level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookLevel {
    /// The level price.
    pub price: Price,
    /// The level size.
    pub size: Quantity,
}

/// A top-of-book (L1) order book for an instrument.
#[derive(Clone, Debug)]
pub struct OrderBook {
    /// The book's instrument ID.
    pub instrument_id: InstrumentId,
    /// The count of updates applied.
    pub update_count: u64,
    /// UNIX timestamp (nanoseconds) of the last applied update.
    pub ts_last: UnixNanos,
    bid: Option<BookLevel>,
    ask: Option<BookLevel>,
    last: Option<Price>,
}

impl OrderBook {
    /// Creates a new [`OrderBook`] instance.
    #[must_use]
    pub fn new(instrument_id: InstrumentId) -> Self {
        Self {
            instrument_id,
            update_count: 0,
            ts_last: UnixNanos::default(),
            bid: None,
            ask: None,
            last: None,
        }
    }

    /// Returns the best bid price, if any.
    #[must_use]
    pub fn best_bid_price(&self) -> Option<Price> {
        self.bid.map(|level| level.price)
    }

    /// Returns the best ask price, if any.
    #[must_use]
    pub fn best_ask_price(&self) -> Option<Price> {
        self.ask.map(|level| level.price)
    }

    /// Returns the best bid size, if any.
    #[must_use]
    pub fn best_bid_size(&self) -> Option<Quantity> {
        self.bid.map(|level| level.size)
    }

    /// Returns the best ask size, if any.
    #[must_use]
    pub fn best_ask_size(&self) -> Option<Quantity> {
        self.ask.map(|level| level.size)
    }

    /// Returns the last traded price, if any.
    #[must_use]
    pub const fn last_price(&self) -> Option<Price> {
        self.last
    }

    /// Returns whether the book has a bid level.
    #[must_use]
    pub const fn has_bid(&self) -> bool {
        self.bid.is_some()
    }

    /// Returns whether the book has an ask level.
    #[must_use]
    pub const fn has_ask(&self) -> bool {
        self.ask.is_some()
    }

    /// Updates the top of book from the given `quote`.
    ///
    /// # Errors
    ///
    /// Returns an error if the quote is for a different instrument.
    pub fn update_quote_tick(&mut self, quote: &QuoteTick) -> Result<(), BookError> {
        self.check_instrument(quote.instrument_id)?;
        self.bid = Some(BookLevel {
            price: quote.bid_price,
            size: quote.bid_size,
        });
        self.ask = Some(BookLevel {
            price: quote.ask_price,
            size: quote.ask_size,
        });
        self.record_update(quote.ts_event);
        Ok(())
    }

    /// Updates the top of book from the given `trade` (both sides collapse to
    /// the traded price).
    ///
    /// # Errors
    ///
    /// Returns an error if the trade is for a different instrument.
    pub fn update_trade_tick(&mut self, trade: &TradeTick) -> Result<(), BookError> {
        self.check_instrument(trade.instrument_id)?;
        let level = BookLevel {
            price: trade.price,
            size: trade.size,
        };
        self.bid = Some(level);
        self.ask = Some(level);
        self.last = Some(trade.price);
        self.record_update(trade.ts_event);
        Ok(())
    }

    /// Applies the given book `delta` to the top of book.
    ///
    /// Only deltas at or better than the current top are retained for an L1
    /// book.
    ///
    /// # Errors
    ///
    /// Returns an error if the delta is for a different instrument or has an
    /// unspecified side.
    pub fn apply_delta(&mut self, delta: &OrderBookDelta) -> Result<(), BookError> {
        self.check_instrument(delta.instrument_id)?;
        if delta.order.side == OrderSide::NoOrderSide && delta.action != BookAction::Clear {
            return Err(BookError::NoOrderSide);
        }

        match delta.action {
            BookAction::Clear => {
                self.bid = None;
                self.ask = None;
            }
            BookAction::Add | BookAction::Update => {
                let level = BookLevel {
                    price: delta.order.price,
                    size: delta.order.size,
                };
                match delta.order.side {
                    OrderSide::Buy => {
                        if self.bid.is_none_or(|bid| level.price >= bid.price) {
                            self.bid = Some(level);
                        }
                    }
                    OrderSide::Sell => {
                        if self.ask.is_none_or(|ask| level.price <= ask.price) {
                            self.ask = Some(level);
                        }
                    }
                    OrderSide::NoOrderSide => unreachable!(),
                }
            }
            BookAction::Delete => match delta.order.side {
                OrderSide::Buy => {
                    if self.bid.is_some_and(|bid| bid.price == delta.order.price) {
                        self.bid = None;
                    }
                }
                OrderSide::Sell => {
                    if self.ask.is_some_and(|ask| ask.price == delta.order.price) {
                        self.ask = None;
                    }
                }
                OrderSide::NoOrderSide => unreachable!(),
            },
        }
        self.record_update(delta.ts_event);
        Ok(())
    }

    /// Simulates the fills for the given `order` against the current top of
    /// book.
    ///
    /// A buy fills at the best ask when the order price crosses it (symmetric
    /// for sells); the full order size fills at the level price.
    #[must_use]
    pub fn simulate_fills(&self, order: &BookOrder) -> Vec<(Price, Quantity)> {
        match order.side.as_specified() {
            OrderSideSpecified::Buy => match self.ask {
                Some(ask) if order.price >= ask.price => vec![(ask.price, order.size)],
                _ => vec![],
            },
            OrderSideSpecified::Sell => match self.bid {
                Some(bid) if order.price <= bid.price => vec![(bid.price, order.size)],
                _ => vec![],
            },
        }
    }

    /// Clears all levels from the book.
    pub fn clear(&mut self, ts_event: UnixNanos) {
        self.bid = None;
        self.ask = None;
        self.last = None;
        self.record_update(ts_event);
    }

    fn check_instrument(&self, instrument_id: InstrumentId) -> Result<(), BookError> {
        if instrument_id != self.instrument_id {
            return Err(BookError::InstrumentMismatch {
                book: self.instrument_id,
                data: instrument_id,
            });
        }
        Ok(())
    }

    fn record_update(&mut self, ts_event: UnixNanos) {
        self.update_count += 1;
        self.ts_last = ts_event;
    }
}

impl Display for OrderBook {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(instrument_id={}, bid={}, ask={})",
            stringify!(OrderBook),
            self.instrument_id,
            self.best_bid_price()
                .map_or("None".to_string(), |p| p.to_string()),
            self.best_ask_price()
                .map_or("None".to_string(), |p| p.to_string()),
        )
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn quote(bid: &str, ask: &str) -> QuoteTick {
        QuoteTick::new(
            InstrumentId::from("AUD/USD.SIM"),
            Price::from(bid),
            Price::from(ask),
            Quantity::from(1_000_000_u32),
            Quantity::from(1_000_000_u32),
            UnixNanos::from(1),
            UnixNanos::from(1),
        )
    }

    #[rstest]
    fn test_update_quote_tick() {
        let mut book = OrderBook::new(InstrumentId::from("AUD/USD.SIM"));
        book.update_quote_tick(&quote("0.75000", "0.75005")).unwrap();

        assert_eq!(book.best_bid_price(), Some(Price::from("0.75000")));
        assert_eq!(book.best_ask_price(), Some(Price::from("0.75005")));
        assert_eq!(book.update_count, 1);
    }

    #[rstest]
    fn test_instrument_mismatch_errors() {
        let mut book = OrderBook::new(InstrumentId::from("USD/JPY.SIM"));
        assert!(book.update_quote_tick(&quote("0.75000", "0.75005")).is_err());
    }

    #[rstest]
    fn test_update_trade_tick_collapses_book() {
        let mut book = OrderBook::new(InstrumentId::from("AUD/USD.SIM"));
        let trade = TradeTick::new(
            InstrumentId::from("AUD/USD.SIM"),
            Price::from("0.75000"),
            Quantity::from(100_000_u32),
            crate::enums::AggressorSide::Buyer,
            crate::identifiers::TradeId::new("1"),
            UnixNanos::from(1),
            UnixNanos::from(1),
        );
        book.update_trade_tick(&trade).unwrap();

        assert_eq!(book.best_bid_price(), Some(Price::from("0.75000")));
        assert_eq!(book.best_ask_price(), Some(Price::from("0.75000")));
        assert_eq!(book.last_price(), Some(Price::from("0.75000")));
    }

    #[rstest]
    fn test_simulate_fills_buy_crossing() {
        let mut book = OrderBook::new(InstrumentId::from("AUD/USD.SIM"));
        book.update_quote_tick(&quote("0.75000", "0.75005")).unwrap();

        let order = BookOrder::new(
            OrderSide::Buy,
            Price::from("0.75010"),
            Quantity::from(100_000_u32),
            0,
        );
        let fills = book.simulate_fills(&order);
        assert_eq!(
            fills,
            vec![(Price::from("0.75005"), Quantity::from(100_000_u32))]
        );
    }

    #[rstest]
    fn test_simulate_fills_buy_not_crossing() {
        let mut book = OrderBook::new(InstrumentId::from("AUD/USD.SIM"));
        book.update_quote_tick(&quote("0.75000", "0.75005")).unwrap();

        let order = BookOrder::new(
            OrderSide::Buy,
            Price::from("0.74900"),
            Quantity::from(100_000_u32),
            0,
        );
        assert!(book.simulate_fills(&order).is_empty());
    }

    #[rstest]
    fn test_clear() {
        let mut book = OrderBook::new(InstrumentId::from("AUD/USD.SIM"));
        book.update_quote_tick(&quote("0.75000", "0.75005")).unwrap();
        book.clear(UnixNanos::from(2));

        assert!(!book.has_bid());
        assert!(!book.has_ask());
    }
}
