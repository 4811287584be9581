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

//! A tagged sum type covering all instrument definitions.

use meridian_core::UnixNanos;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    identifiers::{InstrumentId, Symbol},
    instruments::{CurrencyPair, Equity, Instrument},
    types::{Currency, Price, Quantity},
};

/// A tagged sum type covering all instrument definitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstrumentAny {
    /// A spot currency pair.
    CurrencyPair(CurrencyPair),
    /// A cash equity.
    Equity(Equity),
}

impl Instrument for InstrumentAny {
    fn id(&self) -> InstrumentId {
        match self {
            Self::CurrencyPair(inst) => inst.id(),
            Self::Equity(inst) => inst.id(),
        }
    }

    fn raw_symbol(&self) -> Symbol {
        match self {
            Self::CurrencyPair(inst) => inst.raw_symbol(),
            Self::Equity(inst) => inst.raw_symbol(),
        }
    }

    fn base_currency(&self) -> Option<Currency> {
        match self {
            Self::CurrencyPair(inst) => inst.base_currency(),
            Self::Equity(inst) => inst.base_currency(),
        }
    }

    fn quote_currency(&self) -> Currency {
        match self {
            Self::CurrencyPair(inst) => inst.quote_currency(),
            Self::Equity(inst) => inst.quote_currency(),
        }
    }

    fn settlement_currency(&self) -> Currency {
        match self {
            Self::CurrencyPair(inst) => inst.settlement_currency(),
            Self::Equity(inst) => inst.settlement_currency(),
        }
    }

    fn is_inverse(&self) -> bool {
        match self {
            Self::CurrencyPair(inst) => inst.is_inverse(),
            Self::Equity(inst) => inst.is_inverse(),
        }
    }

    fn price_precision(&self) -> u8 {
        match self {
            Self::CurrencyPair(inst) => inst.price_precision(),
            Self::Equity(inst) => inst.price_precision(),
        }
    }

    fn size_precision(&self) -> u8 {
        match self {
            Self::CurrencyPair(inst) => inst.size_precision(),
            Self::Equity(inst) => inst.size_precision(),
        }
    }

    fn price_increment(&self) -> Price {
        match self {
            Self::CurrencyPair(inst) => inst.price_increment(),
            Self::Equity(inst) => inst.price_increment(),
        }
    }

    fn size_increment(&self) -> Quantity {
        match self {
            Self::CurrencyPair(inst) => inst.size_increment(),
            Self::Equity(inst) => inst.size_increment(),
        }
    }

    fn multiplier(&self) -> Quantity {
        match self {
            Self::CurrencyPair(inst) => inst.multiplier(),
            Self::Equity(inst) => inst.multiplier(),
        }
    }

    fn lot_size(&self) -> Option<Quantity> {
        match self {
            Self::CurrencyPair(inst) => inst.lot_size(),
            Self::Equity(inst) => inst.lot_size(),
        }
    }

    fn max_quantity(&self) -> Option<Quantity> {
        match self {
            Self::CurrencyPair(inst) => inst.max_quantity(),
            Self::Equity(inst) => inst.max_quantity(),
        }
    }

    fn min_quantity(&self) -> Option<Quantity> {
        match self {
            Self::CurrencyPair(inst) => inst.min_quantity(),
            Self::Equity(inst) => inst.min_quantity(),
        }
    }

    fn margin_init(&self) -> Decimal {
        match self {
            Self::CurrencyPair(inst) => inst.margin_init(),
            Self::Equity(inst) => inst.margin_init(),
        }
    }

    fn margin_maint(&self) -> Decimal {
        match self {
            Self::CurrencyPair(inst) => inst.margin_maint(),
            Self::Equity(inst) => inst.margin_maint(),
        }
    }

    fn maker_fee(&self) -> Decimal {
        match self {
            Self::CurrencyPair(inst) => inst.maker_fee(),
            Self::Equity(inst) => inst.maker_fee(),
        }
    }

    fn taker_fee(&self) -> Decimal {
        match self {
            Self::CurrencyPair(inst) => inst.taker_fee(),
            Self::Equity(inst) => inst.taker_fee(),
        }
    }

    fn ts_event(&self) -> UnixNanos {
        match self {
            Self::CurrencyPair(inst) => inst.ts_event(),
            Self::Equity(inst) => inst.ts_event(),
        }
    }

    fn ts_init(&self) -> UnixNanos {
        match self {
            Self::CurrencyPair(inst) => inst.ts_init(),
            Self::Equity(inst) => inst.ts_init(),
        }
    }
}

impl From<CurrencyPair> for InstrumentAny {
    fn from(value: CurrencyPair) -> Self {
        Self::CurrencyPair(value)
    }
}

impl From<Equity> for InstrumentAny {
    fn from(value: Equity) -> Self {
        Self::Equity(value)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::stubs::audusd_sim;

    #[rstest]
    fn test_dispatch(audusd_sim: CurrencyPair) {
        let instrument = InstrumentAny::from(audusd_sim);
        assert_eq!(instrument.id(), audusd_sim.id);
        assert_eq!(instrument.price_precision(), 5);
        assert_eq!(instrument.quote_currency(), Currency::USD());
    }

    #[rstest]
    fn test_serde_round_trip(audusd_sim: CurrencyPair) {
        let instrument = InstrumentAny::from(audusd_sim);
        let json = serde_json::to_string(&instrument).unwrap();
        let parsed: InstrumentAny = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, instrument);
    }
}
