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


/// Writes a message with the given level to an [`Output`](crate::Output), joining every argument
/// with a single space.
///
/// # Examples
///
/// ```
/// use rotalog::output::Stdout;
/// use rotalog::record::Level;
///
/// rotalog::emit!(Stdout::default(), Level::custom("AUDIT"), "user", 42, "logged in");
/// ```
#[macro_export]
macro_rules! emit {
    ($output:expr, $level:expr $(, $arg:expr)* $(,)?) => {
        $crate::Output::emit(
            &$output,
            $level,
            &$crate::record::join_args(&[$(&$arg as &dyn ::std::fmt::Display),*]),
        )
    };
}

/// Writes a `LOG` message. See [`emit!`].
#[macro_export]
macro_rules! log {
    ($output:expr $(, $arg:expr)* $(,)?) => {
        $crate::emit!($output, $crate::record::Level::Log $(, $arg)*)
    };
}

/// Writes an `INFO` message. See [`emit!`].
#[macro_export]
macro_rules! info {
    ($output:expr $(, $arg:expr)* $(,)?) => {
        $crate::emit!($output, $crate::record::Level::Info $(, $arg)*)
    };
}

/// Writes a `WARN` message. See [`emit!`].
#[macro_export]
macro_rules! warn {
    ($output:expr $(, $arg:expr)* $(,)?) => {
        $crate::emit!($output, $crate::record::Level::Warn $(, $arg)*)
    };
}

/// Writes an `ERROR` message. See [`emit!`].
#[macro_export]
macro_rules! error {
    ($output:expr $(, $arg:expr)* $(,)?) => {
        $crate::emit!($output, $crate::record::Level::Error $(, $arg)*)
    };
}

/// Writes a `DEBUG` message. See [`emit!`].
#[macro_export]
macro_rules! debug {
    ($output:expr $(, $arg:expr)* $(,)?) => {
        $crate::emit!($output, $crate::record::Level::Debug $(, $arg)*)
    };
}

/// Writes a `WARNING` message. See [`emit!`].
#[macro_export]
macro_rules! warning {
    ($output:expr $(, $arg:expr)* $(,)?) => {
        $crate::emit!($output, $crate::record::Level::Warning $(, $arg)*)
    };
}

/// Writes an `ALERT` message. See [`emit!`].
#[macro_export]
macro_rules! alert {
    ($output:expr $(, $arg:expr)* $(,)?) => {
        $crate::emit!($output, $crate::record::Level::Alert $(, $arg)*)
    };
}

/// Writes a `SUCCESS` message. See [`emit!`].
#[macro_export]
macro_rules! success {
    ($output:expr $(, $arg:expr)* $(,)?) => {
        $crate::emit!($output, $crate::record::Level::Success $(, $arg)*)
    };
}
