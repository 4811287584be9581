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

//! A multi-stream, time-ordered data iterator for the backtest engine.
//!
//! Source streams are heap-merged into one monotone sequence on `ts_init`;
//! ties break by stream priority (insertion order of the streams) then by
//! element order within a stream.

use std::collections::{BinaryHeap, HashMap};

use meridian_model::data::{Data, HasTsInit};
use meridian_core::UnixNanos;

/// Keeps heap entries ordered by `(ts_init, priority, index)`.
#[derive(Debug, Eq, PartialEq)]
struct HeapEntry {
    ts: UnixNanos,
    priority: usize,
    index: usize,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap is a max-heap: reverse for min behavior
        self.ts
            .cmp(&other.ts)
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| self.index.cmp(&other.index))
            .reverse()
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A multi-stream, time-ordered data iterator.
#[derive(Debug, Default)]
pub struct BacktestDataIterator {
    streams: Vec<Vec<Data>>,
    names: HashMap<String, usize>,
    indices: Vec<usize>,
    heap: BinaryHeap<HeapEntry>,
}

impl BacktestDataIterator {
    /// Creates an empty [`BacktestDataIterator`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a named data stream, sorting it by `ts_init`.
    ///
    /// Stream priority for timestamp ties follows stream insertion order.
    pub fn add_data(&mut self, name: &str, mut data: Vec<Data>) {
        if data.is_empty() {
            return;
        }
        data.sort_by_key(HasTsInit::ts_init);

        match self.names.get(name) {
            Some(&priority) => self.streams[priority] = data,
            None => {
                let priority = self.streams.len();
                self.names.insert(name.to_string(), priority);
                self.streams.push(data);
                self.indices.push(0);
            }
        }
        self.rebuild_heap();
    }

    /// Returns the timestamp of the next data element without consuming it.
    #[must_use]
    pub fn peek_ts(&self) -> Option<UnixNanos> {
        self.heap.peek().map(|entry| entry.ts)
    }

    /// Returns the next data element across all streams in chronological
    /// order.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Data> {
        let entry = self.heap.pop()?;
        let stream = &self.streams[entry.priority];
        let element = stream[entry.index].clone();

        let next_index = entry.index + 1;
        self.indices[entry.priority] = next_index;
        if next_index < stream.len() {
            self.heap.push(HeapEntry {
                ts: stream[next_index].ts_init(),
                priority: entry.priority,
                index: next_index,
            });
        }
        Some(element)
    }

    /// Returns whether all streams are exhausted.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.heap.is_empty()
    }

    /// Rewinds all streams to the beginning (the data is retained).
    pub fn reset(&mut self) {
        for index in &mut self.indices {
            *index = 0;
        }
        self.rebuild_heap();
    }

    fn rebuild_heap(&mut self) {
        self.heap.clear();
        for (priority, stream) in self.streams.iter().enumerate() {
            let index = self.indices[priority];
            if index < stream.len() {
                self.heap.push(HeapEntry {
                    ts: stream[index].ts_init(),
                    priority,
                    index,
                });
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use meridian_model::{identifiers::InstrumentId, stubs::quote_tick};
    use rstest::rstest;

    use super::*;

    fn quote(id: &str, ts: u64) -> Data {
        Data::Quote(quote_tick(InstrumentId::from(id), "1.00000", "1.00010", ts))
    }

    #[rstest]
    fn test_single_stream_in_order() {
        let mut iterator = BacktestDataIterator::new();
        iterator.add_data(
            "main",
            vec![quote("AUD/USD.SIM", 3), quote("AUD/USD.SIM", 1)],
        );
        assert_eq!(iterator.next().unwrap().ts_init(), UnixNanos::from(1));
        assert_eq!(iterator.next().unwrap().ts_init(), UnixNanos::from(3));
        assert!(iterator.next().is_none());
        assert!(iterator.is_done());
    }

    #[rstest]
    fn test_two_stream_merge() {
        let mut iterator = BacktestDataIterator::new();
        iterator.add_data("s1", vec![quote("A.B", 1), quote("A.B", 4)]);
        iterator.add_data("s2", vec![quote("C.D", 2), quote("C.D", 3)]);

        let mut timestamps = Vec::new();
        while let Some(data) = iterator.next() {
            timestamps.push(data.ts_init().as_u64());
        }
        assert_eq!(timestamps, vec![1, 2, 3, 4]);
    }

    #[rstest]
    fn test_tie_breaks_by_stream_priority() {
        let mut iterator = BacktestDataIterator::new();
        iterator.add_data("first", vec![quote("A.B", 1)]);
        iterator.add_data("second", vec![quote("C.D", 1)]);

        assert_eq!(
            iterator.next().unwrap().instrument_id(),
            InstrumentId::from("A.B")
        );
        assert_eq!(
            iterator.next().unwrap().instrument_id(),
            InstrumentId::from("C.D")
        );
    }

    #[rstest]
    fn test_reset_rewinds_all_streams() {
        let mut iterator = BacktestDataIterator::new();
        iterator.add_data("s1", vec![quote("A.B", 1), quote("A.B", 2)]);
        while iterator.next().is_some() {}
        assert!(iterator.is_done());

        iterator.reset();
        assert!(!iterator.is_done());
        assert_eq!(iterator.next().unwrap().ts_init(), UnixNanos::from(1));
    }

    #[rstest]
    fn test_replace_stream() {
        let mut iterator = BacktestDataIterator::new();
        iterator.add_data("s1", vec![quote("A.B", 1)]);
        iterator.add_data("s1", vec![quote("A.B", 5)]);
        assert_eq!(iterator.next().unwrap().ts_init(), UnixNanos::from(5));
        assert!(iterator.next().is_none());
    }
}
