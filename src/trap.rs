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

//! Side channel for errors raised by background flushes.
//!
//! Producer-facing calls never fail, so flush failures and skipped backup shifts are handed to a
//! [`Trap`] instead of being returned to the caller.

use std::fmt;
use std::io;
use std::io::Write;

use crate::Error;

/// A trap that receives errors the sink cannot return to a caller.
pub trait Trap: fmt::Debug + Send + Sync + 'static {
    /// Handle an error.
    fn trap(&self, err: &Error);
}

impl<T: Trap> From<T> for Box<dyn Trap> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// A default trap that sends errors to standard error if possible.
///
/// If standard error is not available, it does nothing.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct DefaultTrap {}

impl Trap for DefaultTrap {
    fn trap(&self, err: &Error) {
        let _ = writeln!(io::stderr(), "{err}");
    }
}

type TrapFunction = dyn Fn(&Error) + Send + Sync + 'static;

/// A trap that forwards errors to a closure.
///
/// # Examples
///
/// ```
/// use rotalog::trap::CallbackTrap;
///
/// let trap = CallbackTrap::new(|err| eprintln!("log sink: {err}"));
/// ```
pub struct CallbackTrap {
    f: Box<TrapFunction>,
}

impl fmt::Debug for CallbackTrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallbackTrap {{ ... }}")
    }
}

impl CallbackTrap {
    /// Creates a trap from the given closure.
    pub fn new(f: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        CallbackTrap { f: Box::new(f) }
    }
}

impl Trap for CallbackTrap {
    fn trap(&self, err: &Error) {
        (self.f)(err)
    }
}
