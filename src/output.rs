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

//! Outputs that a sink can be attached to.
//!
//! [`connect`](crate::connect) wraps an existing [`Output`] in a [`Decorated`] output: every
//! message is queued in the sink first and then passed on to the wrapped output unchanged.

use std::io::Write;
use std::sync::Arc;

use crate::Sink;
use crate::record::Level;

/// Something that log messages can be written to.
///
/// Only [`emit`](Output::emit) is required; the per-level methods forward to it.
pub trait Output: Send + Sync {
    /// Writes a message with the given level.
    fn emit(&self, level: Level, message: &str);

    /// Flushes buffered messages, if any.
    fn flush(&self) {}

    /// Writes a `LOG` message.
    fn log(&self, message: &str) {
        self.emit(Level::Log, message)
    }

    /// Writes an `INFO` message.
    fn info(&self, message: &str) {
        self.emit(Level::Info, message)
    }

    /// Writes a `WARN` message.
    fn warn(&self, message: &str) {
        self.emit(Level::Warn, message)
    }

    /// Writes an `ERROR` message.
    fn error(&self, message: &str) {
        self.emit(Level::Error, message)
    }

    /// Writes a `DEBUG` message.
    fn debug(&self, message: &str) {
        self.emit(Level::Debug, message)
    }

    /// Writes a `WARNING` message.
    fn warning(&self, message: &str) {
        self.emit(Level::Warning, message)
    }

    /// Writes an `ALERT` message.
    fn alert(&self, message: &str) {
        self.emit(Level::Alert, message)
    }

    /// Writes a `SUCCESS` message.
    fn success(&self, message: &str) {
        self.emit(Level::Success, message)
    }
}

impl<T: Output + ?Sized> Output for &T {
    fn emit(&self, level: Level, message: &str) {
        (**self).emit(level, message)
    }

    fn flush(&self) {
        (**self).flush()
    }
}

impl<T: Output + ?Sized> Output for Arc<T> {
    fn emit(&self, level: Level, message: &str) {
        (**self).emit(level, message)
    }

    fn flush(&self) {
        (**self).flush()
    }
}

impl<T: Output + ?Sized> Output for Box<T> {
    fn emit(&self, level: Level, message: &str) {
        (**self).emit(level, message)
    }

    fn flush(&self) {
        (**self).flush()
    }
}

/// An output that prints messages to stdout, one per line, without decoration.
#[derive(Debug, Default, Clone, Copy)]
#[non_exhaustive]
pub struct Stdout {}

impl Output for Stdout {
    fn emit(&self, _: Level, message: &str) {
        let _ = writeln!(std::io::stdout(), "{message}");
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

/// An output that prints messages to stderr, one per line, without decoration.
#[derive(Debug, Default, Clone, Copy)]
#[non_exhaustive]
pub struct Stderr {}

impl Output for Stderr {
    fn emit(&self, _: Level, message: &str) {
        let _ = writeln!(std::io::stderr(), "{message}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// An output that prints warnings and errors to stderr and everything else to stdout.
#[derive(Debug, Default, Clone, Copy)]
#[non_exhaustive]
pub struct Console {}

impl Output for Console {
    fn emit(&self, level: Level, message: &str) {
        match level {
            Level::Warn | Level::Error | Level::Warning | Level::Alert => {
                Stderr::default().emit(level, message)
            }
            _ => Stdout::default().emit(level, message),
        }
    }

    fn flush(&self) {
        Stdout::default().flush();
        Stderr::default().flush();
    }
}

/// An output that drops every message.
#[derive(Debug, Default, Clone, Copy)]
#[non_exhaustive]
pub struct Discard {}

impl Output for Discard {
    fn emit(&self, _: Level, _: &str) {}
}

/// An output that queues every message in a [`Sink`] and then forwards it to `inner`.
#[derive(Debug)]
pub struct Decorated<O> {
    sink: Sink,
    inner: O,
}

impl<O: Output> Decorated<O> {
    /// Attaches `sink` in front of `inner`.
    pub fn new(sink: Sink, inner: O) -> Self {
        Self { sink, inner }
    }

    /// The sink messages are queued in.
    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// The wrapped output.
    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Detaches the sink from the wrapped output.
    pub fn into_parts(self) -> (Sink, O) {
        (self.sink, self.inner)
    }
}

impl<O: Output> Output for Decorated<O> {
    fn emit(&self, level: Level, message: &str) {
        self.sink.emit(level.clone(), message);
        self.inner.emit(level, message);
    }

    fn flush(&self) {
        Output::flush(&self.sink);
        self.inner.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;
    use crate::Options;

    #[derive(Debug, Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl Output for Recorder {
        fn emit(&self, level: Level, message: &str) {
            self.lines.lock().push(format!("{level}:{message}"));
        }
    }

    #[test]
    fn test_level_methods_forward_to_emit() {
        let recorder = Recorder::default();
        recorder.log("a");
        recorder.info("b");
        recorder.warn("c");
        recorder.error("d");
        recorder.debug("e");
        recorder.warning("f");
        recorder.alert("g");
        recorder.success("h");
        recorder.emit(Level::custom("TRACE"), "i");

        assert_eq!(
            *recorder.lines.lock(),
            vec![
                "LOG:a", "INFO:b", "WARN:c", "ERROR:d", "DEBUG:e", "WARNING:f", "ALERT:g",
                "SUCCESS:h", "TRACE:i",
            ]
        );
    }

    #[test]
    fn test_decorated_queues_then_forwards() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(
            Options::default()
                .filename(dir.path().join("app.log"))
                .interval(Duration::from_secs(3600)),
        )
        .unwrap();

        let decorated = Decorated::new(sink, Recorder::default());
        decorated.warn("disk almost full");
        decorated.success("backup done");

        assert_eq!(decorated.sink().pending(), 2);
        assert_eq!(
            *decorated.inner().lines.lock(),
            vec!["WARN:disk almost full", "SUCCESS:backup done"]
        );

        decorated.flush();
        let text = fs::read_to_string(decorated.sink().path()).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[WARN] "));
        assert!(lines[0].ends_with(" - disk almost full"));
        assert!(lines[1].starts_with("[SUCCESS] "));

        let (sink, recorder) = decorated.into_parts();
        sink.close().unwrap();
        assert_eq!(recorder.lines.lock().len(), 2);
    }

    #[test]
    fn test_outputs_behind_pointers() {
        let recorder = Arc::new(Recorder::default());
        let outputs: Vec<Box<dyn Output>> =
            vec![Box::new(recorder.clone()), Box::new(Discard::default())];
        for output in &outputs {
            output.alert("x");
        }
        (&*recorder).info("y");

        assert_eq!(*recorder.lines.lock(), vec!["ALERT:x", "INFO:y"]);
    }
}
