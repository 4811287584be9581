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

//! Monotonic venue-assigned identifier generation for the matching engine.

use meridian_model::{
    identifiers::{TradeId, Venue, VenueOrderId},
    orders::{Order, OrderAny},
};

/// Generates monotonically increasing venue order IDs and trade (execution)
/// IDs for a matching engine.
#[derive(Clone, Debug)]
pub struct IdsGenerator {
    venue: Venue,
    raw_id: u32,
    order_count: u64,
    trade_count: u64,
}

impl IdsGenerator {
    /// Creates a new [`IdsGenerator`] instance.
    #[must_use]
    pub const fn new(venue: Venue, raw_id: u32) -> Self {
        Self {
            venue,
            raw_id,
            order_count: 0,
            trade_count: 0,
        }
    }

    /// Resets the generator counters.
    pub const fn reset(&mut self) {
        self.order_count = 0;
        self.trade_count = 0;
    }

    /// Returns the venue order ID for the given `order`, generating the next
    /// monotonic ID when none has been assigned yet.
    #[must_use]
    pub fn get_venue_order_id(&mut self, order: &OrderAny) -> VenueOrderId {
        match order.venue_order_id() {
            Some(venue_order_id) => venue_order_id,
            None => {
                self.order_count += 1;
                VenueOrderId::new(format!(
                    "{}-{}-{:03}",
                    self.venue, self.raw_id, self.order_count
                ))
            }
        }
    }

    /// Generates the next monotonic trade (execution) ID.
    #[must_use]
    pub fn generate_trade_id(&mut self) -> TradeId {
        self.trade_count += 1;
        TradeId::new(format!(
            "{}-{}-{:03}",
            self.venue, self.raw_id, self.trade_count
        ))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use meridian_model::{
        enums::{OrderSide, OrderType},
        identifiers::InstrumentId,
        orders::OrderTestBuilder,
        types::Quantity,
    };
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_monotonic_trade_ids() {
        let mut generator = IdsGenerator::new(Venue::new("SIM"), 1);
        assert_eq!(generator.generate_trade_id(), TradeId::new("SIM-1-001"));
        assert_eq!(generator.generate_trade_id(), TradeId::new("SIM-1-002"));
    }

    #[rstest]
    fn test_venue_order_id_reused_once_assigned() {
        let mut generator = IdsGenerator::new(Venue::new("SIM"), 1);
        let order = OrderTestBuilder::new(OrderType::Market)
            .instrument_id(InstrumentId::from("AUD/USD.SIM"))
            .side(OrderSide::Buy)
            .quantity(Quantity::from(100_000_u32))
            .build();

        let first = generator.get_venue_order_id(&order);
        assert_eq!(first, VenueOrderId::new("SIM-1-001"));
        // A fresh call for an order still without an assigned ID increments
        let second = generator.get_venue_order_id(&order);
        assert_eq!(second, VenueOrderId::new("SIM-1-002"));
    }

    #[rstest]
    fn test_reset() {
        let mut generator = IdsGenerator::new(Venue::new("SIM"), 1);
        let _ = generator.generate_trade_id();
        generator.reset();
        assert_eq!(generator.generate_trade_id(), TradeId::new("SIM-1-001"));
    }
}
