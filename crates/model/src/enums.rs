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

//! Enumerations for the trading domain model.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, FromRepr};

/// An account type provided by a trading venue or broker.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// An account with unleveraged cash assets only.
    Cash = 1,
    /// An account which facilitates trading on margin, using account assets as collateral.
    Margin = 2,
}

/// The source of a bar aggregation.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationSource {
    /// The bar is aggregated by the venue or data provider.
    External = 1,
    /// The bar is aggregated internally by the data engine.
    Internal = 2,
}

/// The side of a trade's aggressor (liquidity taker).
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggressorSide {
    /// There was no specific aggressor for the trade.
    NoAggressor = 0,
    /// The BUY order was the aggressor for the trade.
    Buyer = 1,
    /// The SELL order was the aggressor for the trade.
    Seller = 2,
}

/// The aggregation method for a bar window.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BarAggregation {
    /// Based on a number of ticks.
    Tick = 1,
    /// Based on the buy/sell volume of the instrument.
    Volume = 2,
    /// Based on the notional value traded.
    Value = 3,
    /// Based on a time interval in seconds.
    Second = 4,
    /// Based on a time interval in minutes.
    Minute = 5,
    /// Based on a time interval in hours.
    Hour = 6,
    /// Based on a time interval in days.
    Day = 7,
}

impl BarAggregation {
    /// Returns whether the aggregation is driven by the clock rather than data thresholds.
    #[must_use]
    pub const fn is_time_aggregated(&self) -> bool {
        matches!(self, Self::Second | Self::Minute | Self::Hour | Self::Day)
    }
}

/// The action applied by an order book delta.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookAction {
    /// A new order level is added to the book.
    Add = 1,
    /// An existing order level is updated in the book.
    Update = 2,
    /// An order level is deleted from the book.
    Delete = 3,
    /// The book is cleared of all levels.
    Clear = 4,
}

/// The type of a currency.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurrencyType {
    /// A cryptocurrency or crypto token.
    Crypto = 1,
    /// A fiat currency issued by a government.
    Fiat = 2,
}

/// The liquidity side for a trade.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiquiditySide {
    /// No liquidity side specified.
    NoLiquiditySide = 0,
    /// The order passively provided liquidity to the market (made a market).
    Maker = 1,
    /// The order aggressively took liquidity from the market.
    Taker = 2,
}

/// The order management system (OMS) type for a trading venue or strategy.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OmsType {
    /// There is one position per instrument and strategy (netted by the venue).
    Netting = 1,
    /// There can be multiple positions per instrument, one per opening fill.
    Hedging = 2,
}

/// The order side for an order or fill.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// No order side specified.
    #[default]
    NoOrderSide = 0,
    /// The order is a BUY.
    Buy = 1,
    /// The order is a SELL.
    Sell = 2,
}

impl OrderSide {
    /// Converts to the specified (non-null) order side.
    ///
    /// # Panics
    ///
    /// Panics if the side is [`OrderSide::NoOrderSide`].
    #[must_use]
    pub fn as_specified(&self) -> OrderSideSpecified {
        match self {
            Self::Buy => OrderSideSpecified::Buy,
            Self::Sell => OrderSideSpecified::Sell,
            Self::NoOrderSide => panic!("Order side was `NoOrderSide`"),
        }
    }
}

/// A specified (BUY or SELL) order side.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSideSpecified {
    /// The order is a BUY.
    Buy = 1,
    /// The order is a SELL.
    Sell = 2,
}

impl OrderSideSpecified {
    /// Returns the opposite side.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Converts back to an [`OrderSide`].
    #[must_use]
    pub const fn as_order_side(&self) -> OrderSide {
        match self {
            Self::Buy => OrderSide::Buy,
            Self::Sell => OrderSide::Sell,
        }
    }
}

/// The status of an order through its lifecycle state machine.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// The order is initialized (instantiated) within the system.
    Initialized = 1,
    /// The order was denied by the system, based on a pre-trade risk check (terminal state).
    Denied = 2,
    /// The order was submitted to the trading venue.
    Submitted = 3,
    /// The order was acknowledged by the trading venue as resting/working.
    Accepted = 4,
    /// The order was rejected by the trading venue (terminal state).
    Rejected = 5,
    /// The order is currently pending a request to modify at the trading venue.
    PendingUpdate = 6,
    /// The order is currently pending a request to cancel at the trading venue.
    PendingCancel = 7,
    /// The order stop trigger fired and the order became a working limit order.
    Triggered = 8,
    /// The order was partially filled at the trading venue.
    PartiallyFilled = 9,
    /// The order was completely filled at the trading venue (terminal state).
    Filled = 10,
    /// The order was canceled (terminal state).
    Canceled = 11,
    /// The order reached its specified time in force and expired (terminal state).
    Expired = 12,
}

/// The type of an order.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// An order to buy or sell immediately at the best available market price.
    Market = 1,
    /// An order to buy or sell at a specified price or better.
    Limit = 2,
    /// An order which becomes a market order once the trigger price is reached.
    StopMarket = 3,
    /// An order which becomes a limit order once the trigger price is reached.
    StopLimit = 4,
}

/// The position side for a position.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSide {
    /// The position is flat (quantity is zero).
    Flat = 1,
    /// The position is long (nets a positive quantity).
    Long = 2,
    /// The position is short (nets a negative quantity).
    Short = 3,
}

/// The price type for a market quote or mark.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceType {
    /// The best quoted price at which market participants are willing to buy.
    Bid = 1,
    /// The best quoted price at which market participants are willing to sell.
    Ask = 2,
    /// The midpoint between the bid and ask prices.
    Mid = 3,
    /// The price of the last trade.
    Last = 4,
}

/// The time-in-force (lifetime policy) for an order.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    /// Good-till-canceled: the order remains working until canceled.
    Gtc = 1,
    /// Immediate-or-cancel: any portion not filled immediately is canceled.
    Ioc = 2,
    /// Fill-or-kill: the order must fill completely and immediately or is canceled.
    Fok = 3,
    /// Good for the trading session (day).
    Day = 4,
    /// Good-till-date: the order remains working until the expire time.
    Gtd = 5,
}

/// The trading state of the system (risk gate).
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    AsRefStr,
    FromRepr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradingState {
    /// Trading is enabled, all commands pass risk checks normally.
    Active = 1,
    /// All trading commands are denied.
    Halted = 2,
    /// Only commands which would reduce existing exposure are allowed.
    Reducing = 3,
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(OrderSide::Buy, "BUY")]
    #[case(OrderSide::Sell, "SELL")]
    #[case(OrderSide::NoOrderSide, "NO_ORDER_SIDE")]
    fn test_order_side_display(#[case] side: OrderSide, #[case] expected: &str) {
        assert_eq!(side.to_string(), expected);
    }

    #[rstest]
    fn test_order_side_from_str() {
        assert_eq!(OrderSide::from_str("BUY").unwrap(), OrderSide::Buy);
        assert_eq!(OrderSide::from_str("sell").unwrap(), OrderSide::Sell);
        assert!(OrderSide::from_str("HOLD").is_err());
    }

    #[rstest]
    fn test_order_side_specified_opposite() {
        assert_eq!(OrderSideSpecified::Buy.opposite(), OrderSideSpecified::Sell);
        assert_eq!(OrderSideSpecified::Sell.opposite(), OrderSideSpecified::Buy);
    }

    #[rstest]
    #[should_panic(expected = "Order side was `NoOrderSide`")]
    fn test_as_specified_panics_on_no_order_side() {
        let _ = OrderSide::NoOrderSide.as_specified();
    }

    #[rstest]
    #[case(OrderStatus::PartiallyFilled, "PARTIALLY_FILLED")]
    #[case(OrderStatus::PendingUpdate, "PENDING_UPDATE")]
    fn test_order_status_display(#[case] status: OrderStatus, #[case] expected: &str) {
        assert_eq!(status.to_string(), expected);
    }

    #[rstest]
    #[case(BarAggregation::Tick, false)]
    #[case(BarAggregation::Volume, false)]
    #[case(BarAggregation::Value, false)]
    #[case(BarAggregation::Second, true)]
    #[case(BarAggregation::Minute, true)]
    fn test_bar_aggregation_is_time_aggregated(
        #[case] aggregation: BarAggregation,
        #[case] expected: bool,
    ) {
        assert_eq!(aggregation.is_time_aggregated(), expected);
    }

    #[rstest]
    fn test_enum_serde_round_trip() {
        let json = serde_json::to_string(&TimeInForce::Gtc).unwrap();
        assert_eq!(json, "\"GTC\"");
        let tif: TimeInForce = serde_json::from_str(&json).unwrap();
        assert_eq!(tif, TimeInForce::Gtc);
    }
}
