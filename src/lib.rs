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


//! Rotalog is a buffered, size-rotating log sink.
//!
//! # Overview
//!
//! Messages are queued in memory and written to a log file on a fixed interval, when the sink is
//! closed, and when the process exits or is terminated with `SIGTERM`/`SIGINT`. Once the file
//! reaches its size limit it is rotated into a bounded chain of backups named
//! `Backup_{i}_{file name}`, `Backup_0` being the newest.
//!
//! # Examples
//!
//! Attach a sink in front of the console:
//!
//! ```
//! use rotalog::Options;
//! use rotalog::Output;
//! use rotalog::output::Console;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let console = rotalog::connect(
//!     Console::default(),
//!     Options::default()
//!         .filename(dir.path().join("app.log"))
//!         .max_size(5 * 1024 * 1024)
//!         .backup_count(3),
//! )
//! .unwrap();
//!
//! console.info("written to stdout and queued for app.log");
//! rotalog::error!(console, "request", 17, "failed");
//! ```
//!
//! Use a standalone sink as the `log` crate logger:
//!
//! ```no_run
//! use rotalog::Options;
//!
//! let sink = rotalog::new_log(Options::default().filename("logs/server.log")).unwrap();
//! rotalog::bridge::setup_log_crate(sink);
//!
//! log::warn!("cache is cold");
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod bridge;
pub mod format;
pub mod lifecycle;
pub mod output;
pub mod record;
pub mod rotation;
pub mod trap;

mod clock;
mod error;
mod macros;
mod options;
mod queue;
mod scheduler;
mod sink;
mod writer;

pub use self::error::Error;
pub use self::format::Formatter;
pub use self::options::Options;
pub use self::output::Decorated;
pub use self::output::Output;
pub use self::queue::EntryQueue;
pub use self::record::Level;
pub use self::record::LogRecord;
pub use self::rotation::RotationConfig;
pub use self::rotation::RotationPolicy;
pub use self::rotation::WriteInstruction;
pub use self::scheduler::FlushMode;
pub use self::scheduler::FlushOutcome;
pub use self::sink::Sink;
pub use self::trap::Trap;
pub use self::writer::FileWriter;

/// Creates a sink and attaches it in front of `output`.
///
/// Unless [`Options::continue_from_last`] is set, an existing log file at the configured path is
/// deleted, together with its backups.
pub fn connect<O: Output>(output: O, options: Options) -> Result<Decorated<O>, Error> {
    let sink = Sink::new(options)?;
    Ok(Decorated::new(sink, output))
}

/// Creates a standalone sink that is not attached to any other output.
pub fn new_log(options: Options) -> Result<Sink, Error> {
    Sink::new(options)
}
