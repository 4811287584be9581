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

//! Represents a valid position ID.

use meridian_core::correctness::{FAILED, check_valid_string};
use ustr::Ustr;

use crate::identifiers::macros::impl_identifier;

/// Represents a valid position ID.
#[repr(C)]
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PositionId(Ustr);

impl PositionId {
    /// Creates a new [`PositionId`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a valid string.
    pub fn new_checked<T: AsRef<str>>(value: T) -> anyhow::Result<Self> {
        check_valid_string(value.as_ref(), stringify!(value))?;
        Ok(Self(Ustr::from(value.as_ref())))
    }

    /// Creates a new [`PositionId`] instance.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not a valid string.
    pub fn new<T: AsRef<str>>(value: T) -> Self {
        Self::new_checked(value).expect(FAILED)
    }

    /// Returns whether this position ID ends with the flipped suffix 'F'.
    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.0.ends_with('F')
    }
}

impl Default for PositionId {
    fn default() -> Self {
        Self::new("P-001")
    }
}

impl_identifier!(PositionId);

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_new() {
        let id = PositionId::new("P-123456789");
        assert_eq!(id.as_str(), "P-123456789");
        assert!(!id.is_flipped());
    }

    #[rstest]
    fn test_is_flipped() {
        assert!(PositionId::new("P-123456789F").is_flipped());
    }
}
