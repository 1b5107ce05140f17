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


//! Bridge from the [`log`] crate facade into a sink.

use crate::Output;
use crate::Sink;
use crate::record::Level;
use crate::record::LogRecord;

/// A [`log::Log`] implementation that queues every `log` record in a [`Sink`].
///
/// Records are accepted at every level; use [`log::set_max_level`] to filter. `TRACE` records are
/// tagged `DEBUG`.
#[derive(Debug)]
pub struct SinkLogger {
    sink: Sink,
}

impl SinkLogger {
    /// Creates a logger that forwards into `sink`.
    pub fn new(sink: Sink) -> Self {
        Self { sink }
    }

    /// The sink records are queued in.
    pub fn sink(&self) -> &Sink {
        &self.sink
    }
}

impl log::Log for SinkLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let message = match record.args().as_str() {
            Some(message) => message.to_string(),
            None => record.args().to_string(),
        };
        self.sink
            .append(LogRecord::new(Level::from(record.level()), message));
    }

    fn flush(&self) {
        Output::flush(&self.sink);
    }
}

/// Set up the log crate global logger.
///
/// This function calls [`log::set_boxed_logger`] with a [`SinkLogger`] so that all logs from the
/// log crate are queued in `sink`. The sink is never dropped; its pending records are written by
/// its timer and by the exit hooks.
///
/// This function will set the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
pub fn try_setup_log_crate(sink: Sink) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(SinkLogger::new(sink)))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Set up the log crate global logger.
///
/// This function will set the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
///
/// # Panics
///
/// Panic if the log crate global logger has already been set.
///
/// # Examples
///
/// ```no_run
/// use rotalog::Options;
///
/// let sink = rotalog::new_log(Options::default().filename("logs/app.log")).unwrap();
/// rotalog::bridge::setup_log_crate(sink);
///
/// log::info!("listening on {}", 8080);
/// ```
pub fn setup_log_crate(sink: Sink) {
    try_setup_log_crate(sink).expect(
        "rotalog::bridge::setup_log_crate must be called before the log crate global logger initialized",
    )
}
