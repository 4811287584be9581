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

//! Bar aggregate types (OHLCV) over time/tick/volume/value windows.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use meridian_core::{UnixNanos, datetime::NANOSECONDS_IN_SECOND};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    enums::{AggregationSource, BarAggregation, PriceType},
    identifiers::InstrumentId,
    types::{Price, Quantity},
};

/// Represents a bar aggregation specification: a step, method, and price type.
#[repr(C)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct BarSpecification {
    /// The step for binning samples for bar aggregation.
    pub step: usize,
    /// The type of bar aggregation.
    pub aggregation: BarAggregation,
    /// The price type to use for aggregation.
    pub price_type: PriceType,
}

impl BarSpecification {
    /// Creates a new [`BarSpecification`] instance.
    #[must_use]
    pub const fn new(step: usize, aggregation: BarAggregation, price_type: PriceType) -> Self {
        Self {
            step,
            aggregation,
            price_type,
        }
    }

    /// Returns the window duration in nanoseconds for time-aggregated specs.
    ///
    /// # Panics
    ///
    /// Panics if the aggregation is not time-driven.
    #[must_use]
    pub fn timedelta_ns(&self) -> u64 {
        let step = self.step as u64;
        match self.aggregation {
            BarAggregation::Second => step * NANOSECONDS_IN_SECOND,
            BarAggregation::Minute => step * 60 * NANOSECONDS_IN_SECOND,
            BarAggregation::Hour => step * 3600 * NANOSECONDS_IN_SECOND,
            BarAggregation::Day => step * 86_400 * NANOSECONDS_IN_SECOND,
            _ => panic!(
                "Aggregation {} is not time-driven",
                self.aggregation
            ),
        }
    }

    /// Returns whether this specification is time-driven.
    #[must_use]
    pub const fn is_time_aggregated(&self) -> bool {
        self.aggregation.is_time_aggregated()
    }
}

impl Display for BarSpecification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.step, self.aggregation, self.price_type)
    }
}

/// Represents a bar type including the instrument, specification, and source.
#[repr(C)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct BarType {
    /// The bar type's instrument ID.
    pub instrument_id: InstrumentId,
    /// The bar type's specification.
    pub spec: BarSpecification,
    /// The aggregation source (EXTERNAL or INTERNAL).
    pub aggregation_source: AggregationSource,
}

impl BarType {
    /// Creates a new [`BarType`] instance.
    #[must_use]
    pub const fn new(
        instrument_id: InstrumentId,
        spec: BarSpecification,
        aggregation_source: AggregationSource,
    ) -> Self {
        Self {
            instrument_id,
            spec,
            aggregation_source,
        }
    }
}

impl Display for BarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.instrument_id, self.spec, self.aggregation_source
        )
    }
}

impl FromStr for BarType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pieces: Vec<&str> = s.rsplitn(5, '-').collect();
        if pieces.len() != 5 {
            anyhow::bail!(
                "Error parsing `BarType` from '{s}': expected '<instrument_id>-<step>-<aggregation>-<price_type>-<source>'"
            );
        }
        // rsplitn returns in reverse order
        let instrument_id = InstrumentId::from_str(pieces[4])?;
        let step: usize = pieces[3]
            .parse()
            .map_err(|e| anyhow::anyhow!("Error parsing `BarType` step from '{s}': {e}"))?;
        let aggregation = BarAggregation::from_str(pieces[2])
            .map_err(|e| anyhow::anyhow!("Error parsing `BarType` aggregation from '{s}': {e}"))?;
        let price_type = PriceType::from_str(pieces[1])
            .map_err(|e| anyhow::anyhow!("Error parsing `BarType` price type from '{s}': {e}"))?;
        let aggregation_source = AggregationSource::from_str(pieces[0])
            .map_err(|e| anyhow::anyhow!("Error parsing `BarType` source from '{s}': {e}"))?;
        Ok(Self {
            instrument_id,
            spec: BarSpecification::new(step, aggregation, price_type),
            aggregation_source,
        })
    }
}

impl From<&str> for BarType {
    /// Creates a [`BarType`] from its string representation.
    ///
    /// # Panics
    ///
    /// Panics if the string is not a valid bar type.
    fn from(value: &str) -> Self {
        Self::from_str(value).unwrap()
    }
}

impl Serialize for BarType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BarType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value_str = String::deserialize(deserializer)?;
        Self::from_str(&value_str).map_err(serde::de::Error::custom)
    }
}

/// Represents an aggregated bar (OHLCV) over a specified window.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bar {
    /// The bar type for the bar.
    pub bar_type: BarType,
    /// The bar's open price.
    pub open: Price,
    /// The bar's high price.
    pub high: Price,
    /// The bar's low price.
    pub low: Price,
    /// The bar's close price.
    pub close: Price,
    /// The bar's traded volume.
    pub volume: Quantity,
    /// UNIX timestamp (nanoseconds) when the bar window closed.
    pub ts_event: UnixNanos,
    /// UNIX timestamp (nanoseconds) when the instance was initialized.
    pub ts_init: UnixNanos,
}

impl Bar {
    /// Creates a new [`Bar`] instance.
    #[must_use]
    pub const fn new(
        bar_type: BarType,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Quantity,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Self {
        Self {
            bar_type,
            open,
            high,
            low,
            close,
            volume,
            ts_event,
            ts_init,
        }
    }

    /// Returns the bar's instrument ID.
    #[must_use]
    pub const fn instrument_id(&self) -> InstrumentId {
        self.bar_type.instrument_id
    }

    /// Returns whether the bar closed higher than it opened.
    #[must_use]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

impl Display for Bar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{}",
            self.bar_type, self.open, self.high, self.low, self.close, self.volume, self.ts_event,
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

    #[rstest]
    fn test_bar_type_string_round_trip() {
        let bar_type = BarType::new(
            InstrumentId::from("AUD/USD.SIM"),
            BarSpecification::new(1, BarAggregation::Minute, PriceType::Mid),
            AggregationSource::Internal,
        );
        let s = bar_type.to_string();
        assert_eq!(s, "AUD/USD.SIM-1-MINUTE-MID-INTERNAL");
        assert_eq!(BarType::from(s.as_str()), bar_type);
    }

    #[rstest]
    fn test_bar_type_from_str_invalid() {
        assert!(BarType::from_str("AUD/USD.SIM-1-MINUTE").is_err());
        assert!(BarType::from_str("AUD/USD.SIM-x-MINUTE-MID-INTERNAL").is_err());
    }

    #[rstest]
    #[case(BarAggregation::Second, 1, NANOSECONDS_IN_SECOND)]
    #[case(BarAggregation::Minute, 5, 300 * NANOSECONDS_IN_SECOND)]
    #[case(BarAggregation::Hour, 1, 3600 * NANOSECONDS_IN_SECOND)]
    fn test_timedelta_ns(
        #[case] aggregation: BarAggregation,
        #[case] step: usize,
        #[case] expected: u64,
    ) {
        let spec = BarSpecification::new(step, aggregation, PriceType::Last);
        assert_eq!(spec.timedelta_ns(), expected);
    }

    #[rstest]
    fn test_bar_is_bullish() {
        let bar_type = BarType::from("AUD/USD.SIM-1-MINUTE-MID-INTERNAL");
        let bar = Bar::new(
            bar_type,
            Price::from("0.75000"),
            Price::from("0.75100"),
            Price::from("0.74900"),
            Price::from("0.75050"),
            Quantity::from(100_000_u32),
            UnixNanos::from(60_000_000_000),
            UnixNanos::from(60_000_000_000),
        );
        assert!(bar.is_bullish());
    }

    #[rstest]
    fn test_serde_round_trip() {
        let bar_type = BarType::from("USD/JPY.SIM-1-MINUTE-BID-EXTERNAL");
        let bar = Bar::new(
            bar_type,
            Price::from("90.002"),
            Price::from("90.004"),
            Price::from("90.001"),
            Price::from("90.003"),
            Quantity::from(1_000_000_u32),
            UnixNanos::from(1),
            UnixNanos::from(1),
        );
        let json = serde_json::to_string(&bar).unwrap();
        let parsed: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bar);
    }
}
