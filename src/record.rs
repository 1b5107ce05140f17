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

//! Log records and levels.

use std::borrow::Cow;
use std::fmt;

/// The level tag of a log record.
///
/// Levels are labels rather than a severity ordering; the sink never filters on them.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Level {
    /// `LOG`
    Log,
    /// `INFO`
    Info,
    /// `WARN`
    Warn,
    /// `ERROR`
    Error,
    /// `DEBUG`
    Debug,
    /// `WARNING`
    Warning,
    /// `ALERT`
    Alert,
    /// `SUCCESS`
    Success,
    /// A user-defined level, rendered as given.
    Custom(Cow<'static, str>),
}

impl Level {
    /// The rendered name of this level.
    pub fn name(&self) -> &str {
        match self {
            Level::Log => "LOG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Debug => "DEBUG",
            Level::Warning => "WARNING",
            Level::Alert => "ALERT",
            Level::Success => "SUCCESS",
            Level::Custom(name) => name,
        }
    }

    /// Creates a user-defined level.
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        Level::Custom(name.into())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warn,
            log::Level::Info => Level::Info,
            log::Level::Debug | log::Level::Trace => Level::Debug,
        }
    }
}

/// A pending log entry.
///
/// Records carry no timestamp; the time is taken once per flush and shared by the whole batch.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct LogRecord {
    level: Level,
    message: String,
}

impl LogRecord {
    /// Creates a new record.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// The level of the record.
    pub fn level(&self) -> &Level {
        &self.level
    }

    /// The message body.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Joins variadic message parts with a single space.
///
/// # Examples
///
/// ```
/// let message = rotalog::record::join_args(&[&"LINE", &7, &"done"]);
/// assert_eq!(message, "LINE 7 done");
/// ```
pub fn join_args(args: &[&dyn fmt::Display]) -> String {
    use std::fmt::Write;

    let mut message = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            message.push(' ');
        }
        // SAFETY: write to a string always succeeds
        write!(&mut message, "{arg}").unwrap();
    }
    message
}
