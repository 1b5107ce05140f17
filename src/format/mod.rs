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

//! Formatters turning a batch of records into bytes.

use std::fmt;

use jiff::Zoned;

use crate::Error;
use crate::record::LogRecord;

mod custom;
#[cfg(feature = "layout-json")]
mod json;
mod text;

pub use self::custom::CustomFormatter;
#[cfg(feature = "layout-json")]
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

/// The output of a [`Formatter`], either text or raw bytes.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Payload {
    /// UTF-8 text.
    Text(String),
    /// Raw bytes, written as is.
    Bytes(Vec<u8>),
}

impl Payload {
    /// Normalizes the payload to bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Text(text) => text.into_bytes(),
            Payload::Bytes(bytes) => bytes,
        }
    }

    /// Length of the payload in bytes.
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Bytes(bytes) => bytes.len(),
        }
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(bytes)
    }
}

/// A formatter for batches of log records.
///
/// `now` is the flush time, already converted to the sink's time zone. It is shared by every
/// record of the batch.
pub trait Formatter: fmt::Debug + Send + Sync + 'static {
    /// Formats the records in arrival order.
    fn format(&self, records: &[LogRecord], now: &Zoned) -> Result<Payload, Error>;
}

impl<T: Formatter> From<T> for Box<dyn Formatter> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_normalization() {
        assert_eq!(Payload::from("abc").into_bytes(), b"abc".to_vec());
        assert_eq!(Payload::from(vec![0xff, 0x00]).into_bytes(), vec![0xff, 0x00]);
        assert!(Payload::from(String::new()).is_empty());
        assert_eq!(Payload::from("çok").len(), 4);
    }
}
