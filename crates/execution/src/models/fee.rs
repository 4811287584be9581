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

use meridian_model::{
    enums::LiquiditySide,
    instruments::{Instrument, InstrumentAny},
    types::{Money, Price, Quantity},
};
use rust_decimal::prelude::ToPrimitive;

/// The pluggable commission model for simulated execution.
pub trait FeeModel {
    /// Calculates the commission for a fill of `fill_quantity` at `fill_px`.
    ///
    /// # Errors
    ///
    /// Returns an error if the liquidity side is unspecified when required.
    fn get_commission(
        &self,
        liquidity_side: LiquiditySide,
        fill_quantity: Quantity,
        fill_px: Price,
        instrument: &InstrumentAny,
        is_first_fill: bool,
    ) -> anyhow::Result<Money>;
}

/// A tagged sum type covering all fee models.
#[derive(Clone, Debug)]
pub enum FeeModelAny {
    /// A fixed commission per order.
    Fixed(FixedFeeModel),
    /// A maker/taker percentage of notional from the instrument fee schedule.
    MakerTaker(MakerTakerFeeModel),
}

impl FeeModel for FeeModelAny {
    fn get_commission(
        &self,
        liquidity_side: LiquiditySide,
        fill_quantity: Quantity,
        fill_px: Price,
        instrument: &InstrumentAny,
        is_first_fill: bool,
    ) -> anyhow::Result<Money> {
        match self {
            Self::Fixed(model) => model.get_commission(
                liquidity_side,
                fill_quantity,
                fill_px,
                instrument,
                is_first_fill,
            ),
            Self::MakerTaker(model) => model.get_commission(
                liquidity_side,
                fill_quantity,
                fill_px,
                instrument,
                is_first_fill,
            ),
        }
    }
}

impl Default for FeeModelAny {
    fn default() -> Self {
        Self::MakerTaker(MakerTakerFeeModel)
    }
}

/// A commission model charging a fixed amount, either once per order or on
/// every fill.
#[derive(Clone, Debug)]
pub struct FixedFeeModel {
    commission: Money,
    charge_commission_once: bool,
}

impl FixedFeeModel {
    /// Creates a new [`FixedFeeModel`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if `commission` is negative.
    pub fn new(commission: Money, charge_commission_once: Option<bool>) -> anyhow::Result<Self> {
        if commission.raw < 0 {
            anyhow::bail!("Commission must be greater than or equal to zero")
        }
        Ok(Self {
            commission,
            charge_commission_once: charge_commission_once.unwrap_or(true),
        })
    }
}

impl FeeModel for FixedFeeModel {
    fn get_commission(
        &self,
        _liquidity_side: LiquiditySide,
        _fill_quantity: Quantity,
        _fill_px: Price,
        _instrument: &InstrumentAny,
        is_first_fill: bool,
    ) -> anyhow::Result<Money> {
        if !self.charge_commission_once || is_first_fill {
            Ok(self.commission)
        } else {
            Ok(Money::zero(self.commission.currency))
        }
    }
}

/// A commission model applying the instrument's maker/taker percentage fee
/// schedule to the fill notional.
#[derive(Clone, Debug)]
pub struct MakerTakerFeeModel;

impl FeeModel for MakerTakerFeeModel {
    fn get_commission(
        &self,
        liquidity_side: LiquiditySide,
        fill_quantity: Quantity,
        fill_px: Price,
        instrument: &InstrumentAny,
        _is_first_fill: bool,
    ) -> anyhow::Result<Money> {
        let notional = instrument
            .calculate_notional_value(fill_quantity, fill_px, Some(false))
            .as_f64();
        let commission = match liquidity_side {
            LiquiditySide::Maker => notional * instrument.maker_fee().to_f64().unwrap_or(0.0),
            LiquiditySide::Taker => notional * instrument.taker_fee().to_f64().unwrap_or(0.0),
            LiquiditySide::NoLiquiditySide => anyhow::bail!("Liquidity side not set"),
        };
        if instrument.is_inverse() {
            Ok(Money::new(
                commission,
                instrument
                    .base_currency()
                    .expect("Inverse instrument without base currency"),
            ))
        } else {
            Ok(Money::new(commission, instrument.quote_currency()))
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use meridian_model::{
        stubs::{audusd_sim, instrument_any},
        types::Currency,
    };
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;

    #[rstest]
    fn test_fixed_model_charges_once_by_default() {
        let model = FixedFeeModel::new(Money::new(2.0, Currency::USD()), None).unwrap();
        let instrument = instrument_any(audusd_sim());
        let first = model
            .get_commission(
                LiquiditySide::Taker,
                Quantity::from(100_000_u32),
                Price::from("0.75000"),
                &instrument,
                true,
            )
            .unwrap();
        let next = model
            .get_commission(
                LiquiditySide::Taker,
                Quantity::from(100_000_u32),
                Price::from("0.75000"),
                &instrument,
                false,
            )
            .unwrap();
        assert_eq!(first, Money::new(2.0, Currency::USD()));
        assert_eq!(next, Money::zero(Currency::USD()));
    }

    #[rstest]
    fn test_fixed_model_negative_commission_errors() {
        assert!(FixedFeeModel::new(Money::new(-1.0, Currency::USD()), None).is_err());
    }

    #[rstest]
    fn test_maker_taker_model_with_fee_schedule() {
        let mut instrument = audusd_sim();
        instrument.maker_fee = dec!(0.0002);
        instrument.taker_fee = dec!(0.0004);
        let instrument = instrument_any(instrument);
        let model = MakerTakerFeeModel;

        let taker = model
            .get_commission(
                LiquiditySide::Taker,
                Quantity::from(100_000_u32),
                Price::from("0.75000"),
                &instrument,
                true,
            )
            .unwrap();
        // notional 75_000 * 0.0004 = 30 USD
        assert_eq!(taker, Money::new(30.0, Currency::USD()));

        let maker = model
            .get_commission(
                LiquiditySide::Maker,
                Quantity::from(100_000_u32),
                Price::from("0.75000"),
                &instrument,
                true,
            )
            .unwrap();
        assert_eq!(maker, Money::new(15.0, Currency::USD()));
    }

    #[rstest]
    fn test_maker_taker_model_no_liquidity_side_errors() {
        let instrument = instrument_any(audusd_sim());
        let result = MakerTakerFeeModel.get_commission(
            LiquiditySide::NoLiquiditySide,
            Quantity::from(1_u32),
            Price::from("1.0"),
            &instrument,
            true,
        );
        assert!(result.is_err());
    }
}
