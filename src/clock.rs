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

use jiff::Timestamp;
use jiff::Zoned;
use jiff::tz::TimeZone;

#[derive(Debug)]
pub(crate) enum Clock {
    DefaultClock,
    #[cfg(test)]
    ManualClock(ManualClock),
}

impl Clock {
    /// The current time, in `tz` or the system time zone.
    pub(crate) fn now(&self, tz: Option<&TimeZone>) -> Zoned {
        let now = match self {
            Clock::DefaultClock => Timestamp::now(),
            #[cfg(test)]
            Clock::ManualClock(clock) => clock.now(),
        };
        match tz {
            Some(tz) => now.to_zoned(tz.clone()),
            None => now.to_zoned(TimeZone::system()),
        }
    }
}

/// The time could be reset.
#[derive(Debug)]
#[cfg(test)]
pub(crate) struct ManualClock {
    now: parking_lot::Mutex<Timestamp>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new(now: Timestamp) -> ManualClock {
        ManualClock {
            now: parking_lot::Mutex::new(now),
        }
    }

    fn now(&self) -> Timestamp {
        *self.now.lock()
    }

    pub(crate) fn set_now(&self, now: Timestamp) {
        *self.now.lock() = now;
    }
}
