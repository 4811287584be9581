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

//! The contract implemented by all execution clients (live venue adapters and
//! the simulated exchange).

use meridian_core::UnixNanos;
use meridian_model::{
    identifiers::{AccountId, ClientId, Venue},
    types::{AccountBalance, MarginBalance},
};

use crate::messages::{CancelOrder, ModifyOrder, SubmitOrder};

/// The contract implemented by all execution clients.
///
/// The execution engine routes validated commands to a client; the client
/// produces order and account events back onto the bus.
pub trait ExecutionClient {
    /// Returns the client ID.
    fn client_id(&self) -> ClientId;

    /// Returns the account ID for the client.
    fn account_id(&self) -> AccountId;

    /// Returns the venue the client executes on.
    fn venue(&self) -> Venue;

    /// Returns whether the client is connected.
    fn is_connected(&self) -> bool;

    /// Starts the client, acquiring any required resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the client fails to start.
    fn start(&self) -> anyhow::Result<()>;

    /// Stops the client, releasing resources on every exit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the client fails to stop cleanly.
    fn stop(&self) -> anyhow::Result<()>;

    /// Submits the given order to the venue.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport failure.
    fn submit_order(&self, command: &SubmitOrder) -> anyhow::Result<()>;

    /// Requests modification of a working order at the venue.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport failure.
    fn modify_order(&self, command: &ModifyOrder) -> anyhow::Result<()>;

    /// Requests cancellation of a working order at the venue.
    ///
    /// # Errors
    ///
    /// Returns an error on a transport failure.
    fn cancel_order(&self, command: &CancelOrder) -> anyhow::Result<()>;

    /// Generates and publishes an `AccountState` event with the given
    /// balances and margins.
    ///
    /// # Errors
    ///
    /// Returns an error if event generation fails.
    fn generate_account_state(
        &self,
        balances: Vec<AccountBalance>,
        margins: Vec<MarginBalance>,
        reported: bool,
        ts_event: UnixNanos,
    ) -> anyhow::Result<()>;
}
