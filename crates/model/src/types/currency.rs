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

//! A `Currency` flyweight keyed by its code, backed by a process-wide registry.

use std::{
    collections::HashMap,
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    str::FromStr,
    sync::{Mutex, OnceLock},
};

use meridian_core::correctness::{FAILED, check_valid_string};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ustr::Ustr;

use crate::enums::CurrencyType;

static CURRENCY_MAP: OnceLock<Mutex<HashMap<String, Currency>>> = OnceLock::new();

/// Represents a medium of exchange in a specified denomination with a fixed
/// decimal precision.
#[repr(C)]
#[derive(Clone, Copy, Eq)]
pub struct Currency {
    /// The currency code as an uppercase string (e.g. "AUD").
    pub code: Ustr,
    /// The currency decimal precision.
    pub precision: u8,
    /// The ISO 4217 currency code number.
    pub iso4217: u16,
    /// The currency name.
    pub name: Ustr,
    /// The currency type, either CRYPTO or FIAT.
    pub currency_type: CurrencyType,
}

impl Currency {
    /// Creates a new [`Currency`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if `code` or `name` are invalid strings, or if
    /// `precision` exceeds the fixed-point maximum.
    pub fn new_checked<T: AsRef<str>>(
        code: T,
        precision: u8,
        iso4217: u16,
        name: T,
        currency_type: CurrencyType,
    ) -> anyhow::Result<Self> {
        check_valid_string(code.as_ref(), stringify!(code))?;
        check_valid_string(name.as_ref(), stringify!(name))?;
        crate::types::fixed::check_fixed_precision(precision)?;
        Ok(Self {
            code: Ustr::from(code.as_ref()),
            precision,
            iso4217,
            name: Ustr::from(name.as_ref()),
            currency_type,
        })
    }

    /// Creates a new [`Currency`] instance.
    ///
    /// # Panics
    ///
    /// Panics if a correctness check fails (see [`Currency::new_checked`]).
    pub fn new<T: AsRef<str>>(
        code: T,
        precision: u8,
        iso4217: u16,
        name: T,
        currency_type: CurrencyType,
    ) -> Self {
        Self::new_checked(code, precision, iso4217, name, currency_type).expect(FAILED)
    }

    /// Registers the given `currency` in the internal currency map.
    ///
    /// Re-registering an equal value is a no-op. Registering a differing value
    /// under an existing code is an error unless `overwrite` is true.
    ///
    /// # Errors
    ///
    /// Returns an error if a different currency is already registered under the
    /// same code and `overwrite` is false.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn register(currency: Self, overwrite: bool) -> anyhow::Result<()> {
        let mut map = CURRENCY_MAP
            .get_or_init(|| Mutex::new(HashMap::new()))
            .lock()
            .expect("mutex poisoned");

        if let Some(existing) = map.get(currency.code.as_str()) {
            let equal = existing.precision == currency.precision
                && existing.iso4217 == currency.iso4217
                && existing.name == currency.name
                && existing.currency_type == currency.currency_type;
            if equal {
                return Ok(()); // Idempotent
            }
            if !overwrite {
                anyhow::bail!(
                    "Currency '{}' already registered with differing definition",
                    currency.code
                );
            }
        }

        map.insert(currency.code.to_string(), currency);
        Ok(())
    }

    /// Returns whether a currency with the given `code` exists in the registry.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn is_registered(code: &str) -> bool {
        ensure_default_currencies();
        CURRENCY_MAP
            .get_or_init(|| Mutex::new(HashMap::new()))
            .lock()
            .expect("mutex poisoned")
            .contains_key(code)
    }

    /// Returns the currency registered under `code`, or `None`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn try_from_str(code: &str) -> Option<Self> {
        ensure_default_currencies();
        CURRENCY_MAP
            .get_or_init(|| Mutex::new(HashMap::new()))
            .lock()
            .expect("mutex poisoned")
            .get(code)
            .copied()
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from_str(s)
            .ok_or_else(|| anyhow::anyhow!("Unknown currency code: '{s}'"))
    }
}

impl From<&str> for Currency {
    /// Creates a [`Currency`] from a registered code.
    ///
    /// # Panics
    ///
    /// Panics if the code is not registered.
    fn from(value: &str) -> Self {
        Self::from_str(value).expect(FAILED)
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Hash for Currency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl Debug for Currency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(code={}, precision={}, iso4217={}, name={}, currency_type={})",
            stringify!(Currency),
            self.code,
            self.precision,
            self.iso4217,
            self.name,
            self.currency_type,
        )
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

impl Serialize for Currency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code.as_str())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        Self::from_str(&code).map_err(serde::de::Error::custom)
    }
}

fn ensure_default_currencies() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        for currency in default_currencies() {
            Currency::register(currency, false).expect("default currency registration");
        }
    });
}

fn default_currencies() -> Vec<Currency> {
    vec![
        Currency::new("AUD", 2, 36, "Australian dollar", CurrencyType::Fiat),
        Currency::new("CAD", 2, 124, "Canadian dollar", CurrencyType::Fiat),
        Currency::new("CHF", 2, 756, "Swiss franc", CurrencyType::Fiat),
        Currency::new("EUR", 2, 978, "Euro", CurrencyType::Fiat),
        Currency::new("GBP", 2, 826, "British pound", CurrencyType::Fiat),
        Currency::new("JPY", 0, 392, "Japanese yen", CurrencyType::Fiat),
        Currency::new("NZD", 2, 554, "New Zealand dollar", CurrencyType::Fiat),
        Currency::new("USD", 2, 840, "United States dollar", CurrencyType::Fiat),
        Currency::new("BTC", 8, 0, "Bitcoin", CurrencyType::Crypto),
        Currency::new("ETH", 8, 0, "Ethereum", CurrencyType::Crypto),
        Currency::new("USDT", 8, 0, "Tether", CurrencyType::Crypto),
    ]
}

impl Currency {
    /// Returns the Australian dollar.
    #[allow(non_snake_case)]
    #[must_use]
    pub fn AUD() -> Self {
        Self::from("AUD")
    }

    /// Returns the Canadian dollar.
    #[allow(non_snake_case)]
    #[must_use]
    pub fn CAD() -> Self {
        Self::from("CAD")
    }

    /// Returns the Swiss franc.
    #[allow(non_snake_case)]
    #[must_use]
    pub fn CHF() -> Self {
        Self::from("CHF")
    }

    /// Returns the euro.
    #[allow(non_snake_case)]
    #[must_use]
    pub fn EUR() -> Self {
        Self::from("EUR")
    }

    /// Returns the British pound.
    #[allow(non_snake_case)]
    #[must_use]
    pub fn GBP() -> Self {
        Self::from("GBP")
    }

    /// Returns the Japanese yen.
    #[allow(non_snake_case)]
    #[must_use]
    pub fn JPY() -> Self {
        Self::from("JPY")
    }

    /// Returns the New Zealand dollar.
    #[allow(non_snake_case)]
    #[must_use]
    pub fn NZD() -> Self {
        Self::from("NZD")
    }

    /// Returns the United States dollar.
    #[allow(non_snake_case)]
    #[must_use]
    pub fn USD() -> Self {
        Self::from("USD")
    }

    /// Returns Bitcoin.
    #[allow(non_snake_case)]
    #[must_use]
    pub fn BTC() -> Self {
        Self::from("BTC")
    }

    /// Returns Ethereum.
    #[allow(non_snake_case)]
    #[must_use]
    pub fn ETH() -> Self {
        Self::from("ETH")
    }

    /// Returns Tether.
    #[allow(non_snake_case)]
    #[must_use]
    pub fn USDT() -> Self {
        Self::from("USDT")
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
    fn test_default_currency_lookup() {
        let usd = Currency::USD();
        assert_eq!(usd.code.as_str(), "USD");
        assert_eq!(usd.precision, 2);
        assert_eq!(usd.iso4217, 840);
        assert_eq!(usd.currency_type, CurrencyType::Fiat);
    }

    #[rstest]
    fn test_jpy_zero_precision() {
        assert_eq!(Currency::JPY().precision, 0);
    }

    #[rstest]
    fn test_unknown_code_errors() {
        assert!(Currency::from_str("XXXUNKNOWN").is_err());
    }

    #[rstest]
    fn test_register_idempotent_for_equal_value() {
        let aud = Currency::AUD();
        assert!(Currency::register(aud, false).is_ok());
        assert!(Currency::register(aud, false).is_ok());
    }

    #[rstest]
    fn test_register_conflicting_definition_errors() {
        // Same code as USD with differing precision
        let bogus = Currency::new("USD", 4, 840, "United States dollar", CurrencyType::Fiat);
        assert!(Currency::register(bogus, false).is_err());
    }

    #[rstest]
    fn test_register_user_currency() {
        let currency = Currency::new("ZZZ", 2, 0, "Test coin", CurrencyType::Crypto);
        Currency::register(currency, false).unwrap();
        assert_eq!(Currency::from("ZZZ"), currency);
    }

    #[rstest]
    fn test_equality_is_textual() {
        assert_eq!(Currency::USD(), Currency::from("USD"));
        assert_ne!(Currency::USD(), Currency::AUD());
    }

    #[rstest]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&Currency::AUD()).unwrap();
        assert_eq!(json, "\"AUD\"");
        let parsed: Currency = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Currency::AUD());
    }
}
