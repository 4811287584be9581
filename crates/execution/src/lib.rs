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

//! Execution machinery for the Meridian trading kernel: trading commands, the
//! execution client contract, the `ExecutionEngine`, the order matching core
//! and engine, fill and fee models, and the `Strategy` interface.

pub mod client;
pub mod engine;
pub mod matching_core;
pub mod matching_engine;
pub mod messages;
pub mod models;
pub mod strategy;
