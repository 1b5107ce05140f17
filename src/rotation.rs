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

//! Size-based rotation planning.
//!
//! A [`RotationPolicy`] splits a flushed payload into chunks that fit the active file, with a
//! rotation between every two chunks. It only tracks sizes; [`FileWriter`](crate::FileWriter)
//! carries the resulting instructions out on disk.

use std::ops::Range;

/// Size limits of a file chain. Fixed for the lifetime of a sink.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RotationConfig {
    /// Maximum size of the active file in bytes, `0` for unlimited.
    pub max_size: u64,
    /// Number of backup files kept, `0` for none.
    pub backup_count: u32,
    /// Whether to keep appending to a pre-existing active file instead of starting clean.
    pub continue_from_last: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size: 5 * 1024 * 1024,
            backup_count: 0,
            continue_from_last: false,
        }
    }
}

impl RotationConfig {
    /// Upper bound of bytes retained across the active file and all backups, `None` when
    /// unlimited.
    pub fn capacity(&self) -> Option<u64> {
        if self.max_size == 0 {
            None
        } else {
            Some(self.max_size.saturating_mul(1 + self.backup_count as u64))
        }
    }
}

/// One step of writing a payload.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum WriteInstruction {
    /// Shift backups down by one slot, move the active file into `Backup_0` and start an empty
    /// active file.
    Rotate,
    /// Append this range of the payload to the active file.
    Append(Range<usize>),
}

/// Tracks the active file size and plans how payloads are written.
#[derive(Clone, Debug)]
pub struct RotationPolicy {
    current_size: u64,
    max_size: u64,
    backup_count: u32,
}

impl RotationPolicy {
    /// Creates a policy for an active file that already holds `current_size` bytes.
    pub fn new(config: &RotationConfig, current_size: u64) -> Self {
        Self {
            current_size,
            max_size: config.max_size,
            backup_count: config.backup_count,
        }
    }

    /// Bytes currently in the active file, as far as the policy knows.
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Plans the writes of `payload` and advances the tracked size as if they succeeded.
    ///
    /// With a size limit, a rotation is emitted before a chunk whenever the active file is full,
    /// so no file ever exceeds `max_size`. Every iteration consumes at least one byte, so the
    /// plan is finite however large the payload is.
    pub fn plan(&mut self, payload: &[u8]) -> Vec<WriteInstruction> {
        let len = payload.len();
        if len == 0 {
            return vec![];
        }

        if self.max_size == 0 {
            self.current_size += len as u64;
            return vec![WriteInstruction::Append(0..len)];
        }

        let mut instructions = vec![];
        let mut cursor = 0;
        while cursor < len {
            if self.current_size >= self.max_size {
                instructions.push(WriteInstruction::Rotate);
                self.current_size = 0;
            }

            let remaining = self.max_size - self.current_size;
            let chunk = remaining.min((len - cursor) as u64) as usize;
            instructions.push(WriteInstruction::Append(cursor..cursor + chunk));
            self.current_size += chunk as u64;
            cursor += chunk;
        }
        instructions
    }

    /// Drops the leading instructions of a plan whose bytes would be rotated out of the chain
    /// before the plan completes.
    ///
    /// After `R` rotations only the last `backup_count + 1` generations survive. When
    /// `R > backup_count`, everything before rotation number `R - backup_count` is evicted,
    /// including the pre-existing chain, and that rotation plus the `backup_count` after it
    /// already push all of it out. The files left on disk are the same as executing the full
    /// plan.
    pub fn skip_evicted(&self, mut instructions: Vec<WriteInstruction>) -> Vec<WriteInstruction> {
        let rotations = instructions
            .iter()
            .filter(|i| matches!(i, WriteInstruction::Rotate))
            .count();
        let backups = self.backup_count as usize;
        if rotations <= backups {
            return instructions;
        }

        let first_kept = rotations - backups;
        let start = instructions
            .iter()
            .enumerate()
            .filter(|(_, i)| matches!(i, WriteInstruction::Rotate))
            .nth(first_kept - 1)
            .map(|(pos, _)| pos)
            .unwrap_or(0);
        instructions.drain(..start);
        instructions
    }
}
