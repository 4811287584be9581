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

/// Configuration for an `OrderMatchingEngine`.
#[derive(Clone, Copy, Debug)]
pub struct OrderMatchingEngineConfig {
    /// Whether bars drive matching (decomposed into a deterministic
    /// open-high-low-close walk).
    pub bar_execution: bool,
    /// Whether stop orders already in the market at submission are rejected.
    pub reject_stop_orders: bool,
    /// Whether GTD expirations are processed by the engine.
    pub support_gtd_orders: bool,
}

impl Default for OrderMatchingEngineConfig {
    /// Creates a new default [`OrderMatchingEngineConfig`] instance.
    fn default() -> Self {
        Self {
            bar_execution: true,
            reject_stop_orders: true,
            support_gtd_orders: true,
        }
    }
}
