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

//! The order matching core: current market prices and the resting order lists.

use meridian_model::{
    enums::OrderSideSpecified,
    identifiers::{ClientOrderId, InstrumentId},
    orders::{OrderError, PassiveOrderAny},
    types::Price,
};

/// A generic order matching core holding the current bid/ask/last prices and
/// the resting orders per side.
///
/// Orders within a side are held in submission order, which is price-time
/// priority for a top-of-book market.
#[derive(Clone, Debug)]
pub struct OrderMatchingCore {
    /// The instrument ID for the matching core.
    pub instrument_id: InstrumentId,
    /// The price increment for the matching core.
    pub price_increment: Price,
    /// The current best bid price.
    pub bid: Option<Price>,
    /// The current best ask price.
    pub ask: Option<Price>,
    /// The last traded price.
    pub last: Option<Price>,
    orders_bid: Vec<PassiveOrderAny>,
    orders_ask: Vec<PassiveOrderAny>,
}

impl OrderMatchingCore {
    /// Creates a new [`OrderMatchingCore`] instance.
    #[must_use]
    pub const fn new(instrument_id: InstrumentId, price_increment: Price) -> Self {
        Self {
            instrument_id,
            price_increment,
            bid: None,
            ask: None,
            last: None,
            orders_bid: Vec::new(),
            orders_ask: Vec::new(),
        }
    }

    // -- QUERIES ---------------------------------------------------------------------------------

    /// Returns the price precision for the matching core.
    #[must_use]
    pub const fn price_precision(&self) -> u8 {
        self.price_increment.precision
    }

    /// Returns the resting order with the given `client_order_id`, if any.
    #[must_use]
    pub fn get_order(&self, client_order_id: ClientOrderId) -> Option<&PassiveOrderAny> {
        self.orders_bid
            .iter()
            .find(|o| o.client_order_id() == client_order_id)
            .or_else(|| {
                self.orders_ask
                    .iter()
                    .find(|o| o.client_order_id() == client_order_id)
            })
    }

    /// Returns the resting bid-side orders in priority order.
    #[must_use]
    pub fn get_orders_bid(&self) -> &[PassiveOrderAny] {
        self.orders_bid.as_slice()
    }

    /// Returns the resting ask-side orders in priority order.
    #[must_use]
    pub fn get_orders_ask(&self) -> &[PassiveOrderAny] {
        self.orders_ask.as_slice()
    }

    /// Returns whether an order with the given `client_order_id` is resting.
    #[must_use]
    pub fn order_exists(&self, client_order_id: ClientOrderId) -> bool {
        self.get_order(client_order_id).is_some()
    }

    // -- COMMANDS --------------------------------------------------------------------------------

    /// Sets the last traded price.
    pub const fn set_last_raw(&mut self, last: Price) {
        self.last = Some(last);
    }

    /// Sets the best bid price.
    pub const fn set_bid_raw(&mut self, bid: Price) {
        self.bid = Some(bid);
    }

    /// Sets the best ask price.
    pub const fn set_ask_raw(&mut self, ask: Price) {
        self.ask = Some(ask);
    }

    /// Resets the matching core, clearing prices and resting orders.
    pub fn reset(&mut self) {
        self.bid = None;
        self.ask = None;
        self.last = None;
        self.orders_bid.clear();
        self.orders_ask.clear();
    }

    /// Adds a passive order to the appropriate side.
    pub fn add_order(&mut self, order: PassiveOrderAny) {
        match order.order_side_specified() {
            OrderSideSpecified::Buy => self.orders_bid.push(order),
            OrderSideSpecified::Sell => self.orders_ask.push(order),
        }
    }

    /// Deletes a resting order by `client_order_id`.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError::NotFound`] if the order is not resting.
    pub fn delete_order(&mut self, client_order_id: ClientOrderId) -> Result<(), OrderError> {
        if let Some(index) = self
            .orders_bid
            .iter()
            .position(|o| o.client_order_id() == client_order_id)
        {
            self.orders_bid.remove(index);
            return Ok(());
        }
        if let Some(index) = self
            .orders_ask
            .iter()
            .position(|o| o.client_order_id() == client_order_id)
        {
            self.orders_ask.remove(index);
            return Ok(());
        }
        Err(OrderError::NotFound(client_order_id))
    }

    /// Replaces a resting order in place, retaining its priority.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError::NotFound`] if the order is not resting.
    pub fn update_order(&mut self, order: PassiveOrderAny) -> Result<(), OrderError> {
        let client_order_id = order.client_order_id();
        let orders = match order.order_side_specified() {
            OrderSideSpecified::Buy => &mut self.orders_bid,
            OrderSideSpecified::Sell => &mut self.orders_ask,
        };
        match orders
            .iter()
            .position(|o| o.client_order_id() == client_order_id)
        {
            Some(index) => {
                orders[index] = order;
                Ok(())
            }
            None => Err(OrderError::NotFound(client_order_id)),
        }
    }

    // -- MATCHING --------------------------------------------------------------------------------

    /// Returns whether a limit order at `price` on the given `side` is
    /// marketable against the current top of book.
    #[must_use]
    pub fn is_limit_matched(&self, side: OrderSideSpecified, price: Price) -> bool {
        match side {
            OrderSideSpecified::Buy => self.ask.is_some_and(|a| a <= price),
            OrderSideSpecified::Sell => self.bid.is_some_and(|b| b >= price),
        }
    }

    /// Returns whether a stop order at `price` on the given `side` is
    /// triggered by the opposite top of book.
    #[must_use]
    pub fn is_stop_matched(&self, side: OrderSideSpecified, price: Price) -> bool {
        match side {
            OrderSideSpecified::Buy => self.ask.is_some_and(|a| a >= price),
            OrderSideSpecified::Sell => self.bid.is_some_and(|b| b <= price),
        }
    }

    /// Returns whether a limit order at `price` is exactly at (touching) the
    /// opposite top of book rather than crossing it.
    #[must_use]
    pub fn is_limit_touched(&self, side: OrderSideSpecified, price: Price) -> bool {
        match side {
            OrderSideSpecified::Buy => self.ask.is_some_and(|a| a == price),
            OrderSideSpecified::Sell => self.bid.is_some_and(|b| b == price),
        }
    }

    /// Returns whether a stop order at `price` is exactly at (touching) the
    /// trigger rather than crossed through.
    #[must_use]
    pub fn is_stop_touched(&self, side: OrderSideSpecified, price: Price) -> bool {
        match side {
            OrderSideSpecified::Buy => self.ask.is_some_and(|a| a == price),
            OrderSideSpecified::Sell => self.bid.is_some_and(|b| b == price),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use meridian_model::{
        enums::{OrderSide, OrderType},
        orders::{Order, OrderTestBuilder, PassiveOrderAny},
        types::Quantity,
    };
    use rstest::rstest;

    use super::*;

    fn matching_core() -> OrderMatchingCore {
        OrderMatchingCore::new(InstrumentId::from("AUD/USD.SIM"), Price::from("0.00001"))
    }

    fn limit_order(side: OrderSide, price: &str) -> PassiveOrderAny {
        let order = OrderTestBuilder::new(OrderType::Limit)
            .instrument_id(InstrumentId::from("AUD/USD.SIM"))
            .side(side)
            .price(Price::from(price))
            .quantity(Quantity::from(100_000_u32))
            .build();
        PassiveOrderAny::try_from(order).unwrap()
    }

    #[rstest]
    fn test_add_order_routes_to_side() {
        let mut core = matching_core();
        let bid = limit_order(OrderSide::Buy, "0.74900");
        let ask = limit_order(OrderSide::Sell, "0.75100");
        let bid_id = bid.client_order_id();

        core.add_order(bid);
        core.add_order(ask);

        assert_eq!(core.get_orders_bid().len(), 1);
        assert_eq!(core.get_orders_ask().len(), 1);
        assert!(core.order_exists(bid_id));
    }

    #[rstest]
    fn test_delete_order_not_found() {
        let mut core = matching_core();
        let order = limit_order(OrderSide::Buy, "0.74900");
        assert!(core.delete_order(order.client_order_id()).is_err());
    }

    #[rstest]
    fn test_delete_order_when_exists() {
        let mut core = matching_core();
        let order = limit_order(OrderSide::Buy, "0.74900");
        let client_order_id = order.client_order_id();
        core.add_order(order);
        core.delete_order(client_order_id).unwrap();
        assert!(!core.order_exists(client_order_id));
    }

    #[rstest]
    #[case(None, None, "0.75000", OrderSide::Buy, false)]
    #[case(Some("0.74900"), Some("0.75000"), "0.74900", OrderSide::Buy, false)] // below ask
    #[case(Some("0.74900"), Some("0.75000"), "0.75000", OrderSide::Buy, true)] // at ask
    #[case(Some("0.74900"), Some("0.75000"), "0.75100", OrderSide::Buy, true)] // above ask
    #[case(Some("0.74900"), Some("0.75000"), "0.75000", OrderSide::Sell, false)] // above bid
    #[case(Some("0.74900"), Some("0.75000"), "0.74900", OrderSide::Sell, true)] // at bid
    #[case(Some("0.74900"), Some("0.75000"), "0.74800", OrderSide::Sell, true)] // below bid
    fn test_is_limit_matched(
        #[case] bid: Option<&str>,
        #[case] ask: Option<&str>,
        #[case] price: &str,
        #[case] side: OrderSide,
        #[case] expected: bool,
    ) {
        let mut core = matching_core();
        core.bid = bid.map(Price::from);
        core.ask = ask.map(Price::from);
        assert_eq!(
            core.is_limit_matched(side.as_specified(), Price::from(price)),
            expected
        );
    }

    #[rstest]
    #[case(None, None, "0.75000", OrderSide::Buy, false)]
    #[case(Some("0.74900"), Some("0.75000"), "0.75100", OrderSide::Buy, false)] // above ask
    #[case(Some("0.74900"), Some("0.75000"), "0.75000", OrderSide::Buy, true)] // at ask
    #[case(Some("0.74900"), Some("0.75000"), "0.74900", OrderSide::Buy, true)] // below ask
    #[case(Some("0.74900"), Some("0.75000"), "0.74800", OrderSide::Sell, false)] // below bid
    #[case(Some("0.74900"), Some("0.75000"), "0.74900", OrderSide::Sell, true)] // at bid
    #[case(Some("0.74900"), Some("0.75000"), "0.75000", OrderSide::Sell, true)] // above bid
    fn test_is_stop_matched(
        #[case] bid: Option<&str>,
        #[case] ask: Option<&str>,
        #[case] price: &str,
        #[case] side: OrderSide,
        #[case] expected: bool,
    ) {
        let mut core = matching_core();
        core.bid = bid.map(Price::from);
        core.ask = ask.map(Price::from);
        assert_eq!(
            core.is_stop_matched(side.as_specified(), Price::from(price)),
            expected
        );
    }

    #[rstest]
    fn test_touched_versus_crossed() {
        let mut core = matching_core();
        core.bid = Some(Price::from("0.74900"));
        core.ask = Some(Price::from("0.75000"));

        let side = OrderSide::Buy.as_specified();
        assert!(core.is_stop_touched(side, Price::from("0.75000")));
        assert!(!core.is_stop_touched(side, Price::from("0.74900")));
        assert!(core.is_limit_touched(side, Price::from("0.75000")));
        assert!(!core.is_limit_touched(side, Price::from("0.75100")));
    }
}
