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

//! The event-driven backtester for the Meridian trading kernel.
//!
//! A `SimulatedExchange` venue matches orders against historical tick and bar
//! streams; the `BacktestEngine` drives the deterministic time-keyed event
//! loop over merged data streams with identical semantics to live trading.

pub mod config;
pub mod data_iterator;
pub mod engine;
pub mod exchange;
pub mod execution_client;
pub mod modules;
