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

use jiff::Zoned;
use serde::Serialize;

use crate::Error;
use crate::format::Formatter;
use crate::format::Payload;
use crate::record::LogRecord;

/// A JSON formatter, one object per line.
///
/// Output format:
///
/// ```json
/// {"timestamp":"2024-08-11T22:44:57.172051+08:00","level":"ERROR","message":"Hello error!"}
/// {"timestamp":"2024-08-11T22:44:57.172051+08:00","level":"WARN","message":"Hello warn!"}
/// ```
///
/// # Examples
///
/// ```
/// use rotalog::format::JsonFormatter;
///
/// let json_formatter = JsonFormatter::default();
/// ```
#[derive(Default, Debug, Clone)]
#[non_exhaustive]
pub struct JsonFormatter {}

#[derive(Debug, Clone, Serialize)]
struct RecordLine<'a> {
    #[serde(serialize_with = "serialize_time_zone")]
    timestamp: &'a Zoned,
    level: &'a str,
    message: &'a str,
}

fn serialize_time_zone<S>(timestamp: &&Zoned, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&format_args!("{timestamp:.6}"))
}

impl Formatter for JsonFormatter {
    fn format(&self, records: &[LogRecord], now: &Zoned) -> Result<Payload, Error> {
        let mut bytes = Vec::new();
        for record in records {
            let line = RecordLine {
                timestamp: now,
                level: record.level().name(),
                message: record.message(),
            };
            serde_json::to_writer(&mut bytes, &line)
                .map_err(|err| Error::new("failed to serialize record").with_source(err))?;
            bytes.push(b'\n');
        }
        Ok(Payload::Bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::record::Level;

    #[test]
    fn test_json_lines() {
        let now = Zoned::from_str("2024-08-11T22:44:57+08:00[+08:00]").unwrap();
        let records = vec![
            LogRecord::new(Level::Info, "hello"),
            LogRecord::new(Level::Warn, "quote \" here"),
        ];

        let bytes = JsonFormatter::default()
            .format(&records, &now)
            .unwrap()
            .into_bytes();
        let text = String::from_utf8(bytes).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["level"], "INFO");
        assert_eq!(first["message"], "hello");
        assert!(first["timestamp"].as_str().unwrap().starts_with("2024-08-11T22:44:57"));

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["message"], "quote \" here");
    }
}
