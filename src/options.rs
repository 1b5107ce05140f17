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

use std::path::PathBuf;
use std::time::Duration;

use jiff::tz::TimeZone;

use crate::Error;
use crate::format::Formatter;
use crate::rotation::RotationConfig;
use crate::trap::Trap;

const DEFAULT_MAX_SIZE: u64 = 5 * 1024 * 1024;
const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Options of a [`Sink`](crate::Sink).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use rotalog::Options;
///
/// let options = Options::default()
///     .filename("logs/server.log")
///     .max_size(1024 * 1024)
///     .backup_count(3)
///     .interval(Duration::from_millis(500));
/// ```
///
/// With the `internal-serde` feature, options can also be deserialized, using camelCase keys
/// and the interval in milliseconds:
///
/// ```json
/// { "filename": "logs/app.log", "maxSize": 4096, "backupCount": 3, "interval": 200 }
/// ```
#[derive(Debug)]
#[cfg_attr(feature = "internal-serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "internal-serde", serde(default, rename_all = "camelCase"))]
pub struct Options {
    filename: Option<PathBuf>,
    max_size: u64,
    backup_count: u32,
    #[cfg_attr(
        feature = "internal-serde",
        serde(deserialize_with = "deserialize_millis")
    )]
    interval: Duration,
    continue_from_last: bool,
    time_zone: Option<String>,
    #[cfg_attr(feature = "internal-serde", serde(skip))]
    formatter: Option<Box<dyn Formatter>>,
    #[cfg_attr(feature = "internal-serde", serde(skip))]
    trap: Option<Box<dyn Trap>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            filename: None,
            max_size: DEFAULT_MAX_SIZE,
            backup_count: 0,
            interval: DEFAULT_INTERVAL,
            continue_from_last: false,
            time_zone: None,
            formatter: None,
            trap: None,
        }
    }
}

#[cfg(feature = "internal-serde")]
fn deserialize_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let millis = <u64 as serde::Deserialize>::deserialize(deserializer)?;
    Ok(Duration::from_millis(millis))
}

impl Options {
    /// Sets the path of the active log file.
    ///
    /// Defaults to `app.log`, or `logs/app.log` when backups are kept.
    #[must_use]
    pub fn filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the maximum size of a log file in bytes. `0` disables rotation.
    ///
    /// Defaults to 5 MiB.
    #[must_use]
    pub fn max_size(mut self, n: u64) -> Self {
        self.max_size = n;
        self
    }

    /// Sets the number of backup files to keep.
    #[must_use]
    pub fn backup_count(mut self, n: u32) -> Self {
        self.backup_count = n;
        self
    }

    /// Sets the flush interval. Defaults to one second.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Keeps appending to a pre-existing log file instead of deleting it.
    #[must_use]
    pub fn continue_from_last(mut self, yes: bool) -> Self {
        self.continue_from_last = yes;
        self
    }

    /// Sets the IANA time zone the flush timestamp is rendered in. Defaults to the system time
    /// zone.
    #[must_use]
    pub fn time_zone(mut self, name: impl Into<String>) -> Self {
        self.time_zone = Some(name.into());
        self
    }

    /// Sets the formatter. Defaults to [`TextFormatter`](crate::format::TextFormatter).
    #[must_use]
    pub fn formatter(mut self, formatter: impl Into<Box<dyn Formatter>>) -> Self {
        self.formatter = Some(formatter.into());
        self
    }

    /// Sets where background flush errors are reported. Defaults to
    /// [`DefaultTrap`](crate::trap::DefaultTrap).
    #[must_use]
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = Some(trap.into());
        self
    }

    pub(crate) fn rotation_config(&self) -> RotationConfig {
        RotationConfig {
            max_size: self.max_size,
            backup_count: self.backup_count,
            continue_from_last: self.continue_from_last,
        }
    }

    pub(crate) fn resolved_filename(&self) -> PathBuf {
        match &self.filename {
            Some(filename) => filename.clone(),
            None if self.backup_count > 0 => PathBuf::from("logs").join("app.log"),
            None => PathBuf::from("app.log"),
        }
    }

    pub(crate) fn resolved_interval(&self) -> Result<Duration, Error> {
        if self.interval.is_zero() {
            return Err(Error::new("flush interval must be greater than zero"));
        }
        Ok(self.interval)
    }

    pub(crate) fn resolved_time_zone(&self) -> Result<Option<TimeZone>, Error> {
        let Some(name) = &self.time_zone else {
            return Ok(None);
        };
        if name.eq_ignore_ascii_case("UTC") {
            return Ok(Some(TimeZone::UTC));
        }
        TimeZone::get(name).map(Some).map_err(|err| {
            Error::new("unknown time zone")
                .with_context("name", name)
                .with_source(err)
        })
    }

    pub(crate) fn take_formatter(&mut self) -> Option<Box<dyn Formatter>> {
        self.formatter.take()
    }

    pub(crate) fn take_trap(&mut self) -> Option<Box<dyn Trap>> {
        self.trap.take()
    }
}
