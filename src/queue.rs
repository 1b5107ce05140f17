// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use parking_lot::Mutex;

use crate::record::LogRecord;

/// An unbounded, ordered buffer of records pending the next flush.
///
/// Appends from any number of threads are serialized by a short critical section; a drain swaps
/// the whole buffer out under the same lock, so every record lands in exactly one drain.
#[derive(Debug, Default)]
pub struct EntryQueue {
    records: Mutex<Vec<LogRecord>>,
}

impl EntryQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. Never fails.
    pub fn append(&self, record: LogRecord) {
        self.records.lock().push(record);
    }

    /// Takes every record appended since the last drain, in arrival order.
    pub fn drain_all(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    /// Number of pending records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether no record is pending.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}
