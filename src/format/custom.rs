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

use std::fmt;

use jiff::Zoned;

use crate::Error;
use crate::format::Formatter;
use crate::format::Payload;
use crate::record::LogRecord;

type BatchFunction = dyn Fn(&[LogRecord], &Zoned) -> Result<Payload, Error> + Send + Sync + 'static;
type RecordFunction = dyn Fn(&LogRecord, &Zoned) -> Result<Payload, Error> + Send + Sync + 'static;

enum Function {
    Batch(Box<BatchFunction>),
    PerRecord(Box<RecordFunction>),
}

/// A formatter that you can pass a custom format function.
///
/// The function may return text or raw bytes; either is accepted and normalized to bytes before
/// it reaches the file.
///
/// ```rust
/// use rotalog::format::CustomFormatter;
/// use rotalog::format::Payload;
///
/// let formatter = CustomFormatter::per_record(|record, now| {
///     Ok(Payload::from(format!(
///         "{} {} {}\n",
///         now.timestamp(),
///         record.level(),
///         record.message()
///     )))
/// });
/// ```
pub struct CustomFormatter {
    f: Function,
}

impl fmt::Debug for CustomFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomFormatter {{ ... }}")
    }
}

impl CustomFormatter {
    /// Creates a formatter that renders a whole batch at once.
    pub fn new(
        f: impl Fn(&[LogRecord], &Zoned) -> Result<Payload, Error> + Send + Sync + 'static,
    ) -> Self {
        CustomFormatter {
            f: Function::Batch(Box::new(f)),
        }
    }

    /// Creates a formatter that renders each record separately; outputs are concatenated in
    /// arrival order.
    pub fn per_record(
        f: impl Fn(&LogRecord, &Zoned) -> Result<Payload, Error> + Send + Sync + 'static,
    ) -> Self {
        CustomFormatter {
            f: Function::PerRecord(Box::new(f)),
        }
    }
}

impl Formatter for CustomFormatter {
    fn format(&self, records: &[LogRecord], now: &Zoned) -> Result<Payload, Error> {
        match &self.f {
            Function::Batch(f) => f(records, now),
            Function::PerRecord(f) => {
                let mut bytes = Vec::new();
                for record in records {
                    bytes.extend(f(record, now)?.into_bytes());
                }
                Ok(Payload::Bytes(bytes))
            }
        }
    }
}
