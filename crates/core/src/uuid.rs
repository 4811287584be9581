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

//! A `UUID4` universally unique identifier version 4 (RFC 4122).

use std::{
    fmt::{Debug, Display, Formatter},
    hash::Hash,
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Represents a universally unique identifier (UUID) version 4
/// based on a 128-bit label as specified in RFC 4122.
#[repr(C)]
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UUID4 {
    value: Uuid,
}

impl UUID4 {
    /// Creates a new [`UUID4`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: Uuid::new_v4(),
        }
    }

    /// Returns the UUID value as a hyphenated lowercase string.
    #[must_use]
    pub fn to_uuid_string(&self) -> String {
        self.value.to_string()
    }
}

impl FromStr for UUID4 {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(value)?;
        if uuid.get_version() != Some(uuid::Version::Random) {
            anyhow::bail!("Invalid UUID version 4 string: {value}");
        }
        Ok(Self { value: uuid })
    }
}

impl From<&str> for UUID4 {
    /// Creates a [`UUID4`] from a string slice.
    ///
    /// # Panics
    ///
    /// Panics if the `value` string is not a valid UUID v4.
    fn from(value: &str) -> Self {
        Self::from_str(value).expect("`value` should be a valid UUID v4 string")
    }
}

impl Default for UUID4 {
    /// Creates a new default [`UUID4`] instance.
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for UUID4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(\"{}\")", stringify!(UUID4), self.value)
    }
}

impl Display for UUID4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Serialize for UUID4 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_uuid_string())
    }
}

impl<'de> Deserialize<'de> for UUID4 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value_str = String::deserialize(deserializer)?;
        Self::from_str(&value_str).map_err(serde::de::Error::custom)
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
    fn test_new() {
        let uuid = UUID4::new();
        let value = uuid.to_uuid_string();
        assert_eq!(value.len(), 36);
        assert_eq!(value.chars().filter(|&c| c == '-').count(), 4);
    }

    #[rstest]
    fn test_uniqueness() {
        assert_ne!(UUID4::new(), UUID4::new());
    }

    #[rstest]
    fn test_from_str_round_trip() {
        let uuid = UUID4::new();
        let parsed = UUID4::from_str(&uuid.to_uuid_string()).unwrap();
        assert_eq!(parsed, uuid);
    }

    #[rstest]
    fn test_from_str_invalid() {
        assert!(UUID4::from_str("not-a-uuid").is_err());
        // Valid UUID but wrong version (v1 style timestamp layout)
        assert!(UUID4::from_str("c232a7e4-0000-11ee-be56-0242ac120002").is_err());
    }

    #[rstest]
    fn test_string_reprs() {
        let uuid = UUID4::from("2d89666b-1a1e-4a75-b193-4eb3b454c757");
        assert_eq!(format!("{uuid}"), "2d89666b-1a1e-4a75-b193-4eb3b454c757");
        assert_eq!(
            format!("{uuid:?}"),
            "UUID4(\"2d89666b-1a1e-4a75-b193-4eb3b454c757\")"
        );
    }

    #[rstest]
    fn test_serde_round_trip() {
        let uuid = UUID4::new();
        let json = serde_json::to_string(&uuid).unwrap();
        let parsed: UUID4 = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, uuid);
    }
}
