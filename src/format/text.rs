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

use std::borrow::Cow;
use std::fmt::Write;

use jiff::Zoned;
use jiff::fmt::strtime;

use crate::Error;
use crate::format::Formatter;
use crate::format::Payload;
use crate::record::LogRecord;

/// A formatter that renders each record as a text line.
///
/// Output format:
///
/// ```text
/// [INFO] 11.08.2024 22:44:57 - server started
/// [WARN] 11.08.2024 22:44:57 - disk usage at 91%
/// [ERROR] 11.08.2024 22:44:57 - connection reset
/// ```
///
/// # Examples
///
/// ```
/// use rotalog::format::TextFormatter;
///
/// let formatter = TextFormatter::default().time_format("%Y-%m-%dT%H:%M:%S%:z");
/// ```
#[derive(Debug, Clone)]
pub struct TextFormatter {
    time_format: Cow<'static, str>,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            time_format: Cow::Borrowed("%d.%m.%Y %H:%M:%S"),
        }
    }
}

impl TextFormatter {
    /// Sets the `strftime` format of the timestamp.
    pub fn time_format(mut self, format: impl Into<Cow<'static, str>>) -> Self {
        self.time_format = format.into();
        self
    }
}

impl Formatter for TextFormatter {
    fn format(&self, records: &[LogRecord], now: &Zoned) -> Result<Payload, Error> {
        let time = strtime::format(self.time_format.as_bytes(), now).map_err(|err| {
            Error::new("failed to render timestamp")
                .with_context("format", &self.time_format)
                .with_source(err)
        })?;

        let mut text = String::new();
        for record in records {
            // SAFETY: write to a string always succeeds
            writeln!(
                &mut text,
                "[{}] {time} - {}",
                record.level(),
                record.message()
            )
            .unwrap();
        }
        Ok(Payload::Text(text))
    }
}
