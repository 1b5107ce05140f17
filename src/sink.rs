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
use std::sync::Arc;

use jiff::tz::TimeZone;
use parking_lot::Mutex;

use crate::Error;
use crate::Options;
use crate::clock::Clock;
use crate::format::Formatter;
use crate::format::TextFormatter;
use crate::lifecycle;
use crate::lifecycle::Registration;
use crate::output::Output;
use crate::queue::EntryQueue;
use crate::record::Level;
use crate::record::LogRecord;
use crate::rotation::RotationConfig;
use crate::rotation::RotationPolicy;
use crate::scheduler::FlushMode;
use crate::scheduler::FlushOutcome;
use crate::scheduler::FlushScheduler;
use crate::trap::DefaultTrap;
use crate::trap::Trap;
use crate::writer::FileWriter;

/// A buffered, size-rotating log sink.
///
/// Records are queued in memory and written to the active file by a background thread every
/// flush interval, on [`Sink::flush`], when the sink is closed or dropped, and when the process
/// exits or receives `SIGTERM`/`SIGINT`.
///
/// # Examples
///
/// ```
/// use rotalog::Options;
/// use rotalog::Output;
/// use rotalog::Sink;
///
/// let dir = tempfile::tempdir().unwrap();
/// let sink = Sink::new(
///     Options::default()
///         .filename(dir.path().join("app.log"))
///         .max_size(1024 * 1024)
///         .backup_count(2),
/// )
/// .unwrap();
///
/// sink.info("server started");
/// rotalog::warn!(sink, "disk usage at", 91, "percent");
/// sink.close().unwrap();
/// ```
#[derive(Debug)]
pub struct Sink {
    core: Arc<Core>,
    scheduler: FlushScheduler,
    registration: Option<Registration>,
}

impl Sink {
    /// Creates a sink, opening (and unless continuing, resetting) its log file.
    pub fn new(options: Options) -> Result<Sink, Error> {
        Self::build(options, Clock::DefaultClock)
    }

    pub(crate) fn build(mut options: Options, clock: Clock) -> Result<Sink, Error> {
        let config = options.rotation_config();
        let path = options.resolved_filename();
        let interval = options.resolved_interval()?;
        let time_zone = options.resolved_time_zone()?;
        let formatter = options
            .take_formatter()
            .unwrap_or_else(|| TextFormatter::default().into());
        let trap: Arc<dyn Trap> = match options.take_trap() {
            Some(trap) => Arc::from(trap),
            None => Arc::new(DefaultTrap::default()),
        };

        let (writer, current_size) = FileWriter::open(&path, &config, trap.clone())?;
        let policy = RotationPolicy::new(&config, current_size);

        let core = Arc::new(Core {
            config,
            queue: EntryQueue::new(),
            formatter,
            time_zone,
            clock,
            trap,
            state: Mutex::new(FlushState {
                config,
                writer,
                policy,
                stale: false,
            }),
        });

        let registration = lifecycle::register(&core);
        let scheduler = FlushScheduler::start(core.clone(), interval, "rotalog-flush".to_string())?;

        Ok(Sink {
            core,
            scheduler,
            registration: Some(registration),
        })
    }

    /// Queues a record. Never blocks beyond an in-memory append, never fails.
    pub fn append(&self, record: LogRecord) {
        self.core.queue.append(record);
    }

    /// Flushes pending records now, waiting for an in-flight flush first.
    pub fn flush(&self) -> Result<FlushOutcome, Error> {
        self.core.flush(FlushMode::Forced)
    }

    /// Flushes pending records now unless a flush is already running.
    pub fn try_flush(&self) -> Result<FlushOutcome, Error> {
        self.core.flush(FlushMode::Periodic)
    }

    /// Asks the background thread to flush without waiting for the next tick.
    pub fn request_flush(&self) {
        self.scheduler.wake();
    }

    /// Number of records waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.core.queue.len()
    }

    /// Path of the active log file.
    pub fn path(&self) -> PathBuf {
        self.core.state.lock().writer.path().to_path_buf()
    }

    /// Path of backup slot `index`, `0` being the newest.
    pub fn backup_path(&self, index: u32) -> PathBuf {
        self.core.state.lock().writer.backup_path(index)
    }

    /// The rotation limits of this sink.
    pub fn config(&self) -> RotationConfig {
        self.core.config
    }

    /// Stops the timer, runs a final flush and closes the log file.
    pub fn close(mut self) -> Result<(), Error> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), Error> {
        let Some(registration) = self.registration.take() else {
            return Ok(());
        };

        self.scheduler.shutdown();
        let flushed = self.core.flush(FlushMode::Forced);
        let closed = self.core.state.lock().writer.close();
        drop(registration);

        flushed?;
        closed
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            self.core.trap(&err);
        }
    }
}

impl Output for Sink {
    fn emit(&self, level: Level, message: &str) {
        self.append(LogRecord::new(level, message));
    }

    fn flush(&self) {
        if let Err(err) = Sink::flush(self) {
            self.core.trap(&err);
        }
    }
}

/// The part of a sink shared with its timer thread and the lifecycle registry.
pub(crate) struct Core {
    config: RotationConfig,
    queue: EntryQueue,
    formatter: Box<dyn Formatter>,
    time_zone: Option<TimeZone>,
    clock: Clock,
    trap: Arc<dyn Trap>,
    state: Mutex<FlushState>,
}

impl std::fmt::Debug for Core {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Core")
            .field("config", &self.config)
            .field("pending", &self.queue.len())
            .field("formatter", &self.formatter)
            .field("time_zone", &self.time_zone)
            .finish_non_exhaustive()
    }
}

/// The file side of a sink; holding its lock is what makes a flush in progress.
#[derive(Debug)]
struct FlushState {
    config: RotationConfig,
    writer: FileWriter,
    policy: RotationPolicy,
    // set when a write failed part way, so the tracked size may be off
    stale: bool,
}

impl Core {
    /// Runs one flush pass.
    ///
    /// The drained batch is never requeued: if formatting or the primary write fails, those
    /// records are lost and the error is returned.
    pub(crate) fn flush(&self, mode: FlushMode) -> Result<FlushOutcome, Error> {
        let mut state = match mode {
            FlushMode::Periodic => match self.state.try_lock() {
                Some(state) => state,
                None => return Ok(FlushOutcome::Busy),
            },
            FlushMode::Forced => self.state.lock(),
        };

        let records = self.queue.drain_all();
        if records.is_empty() {
            return Ok(FlushOutcome::Empty);
        }

        let now = self.clock.now(self.time_zone.as_ref());
        let payload = self.formatter.format(&records, &now).map_err(|err| {
            Error::new("failed to format log records")
                .with_context("records", records.len())
                .with_source(err)
        })?;
        let bytes = payload.into_bytes();

        state.write(&bytes)?;
        Ok(FlushOutcome::Written {
            records: records.len(),
            bytes: bytes.len(),
        })
    }

    pub(crate) fn trap(&self, err: &Error) {
        self.trap.trap(err);
    }
}

impl FlushState {
    fn write(&mut self, payload: &[u8]) -> Result<(), Error> {
        if self.stale {
            self.policy = RotationPolicy::new(&self.config, self.writer.len()?);
            self.stale = false;
        }

        let plan = self.policy.plan(payload);
        let plan = self.policy.skip_evicted(plan);
        if let Err(err) = self.writer.execute(payload, &plan) {
            self.stale = true;
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::str::FromStr;
    use std::sync::Arc;
    use std::time::Duration;

    use jiff::Timestamp;
    use tempfile::TempDir;

    use super::*;
    use crate::clock::ManualClock;
    use crate::format::CustomFormatter;
    use crate::trap::CallbackTrap;

    // long enough that the timer never fires during a test
    const NO_TICK: Duration = Duration::from_secs(3600);

    fn options(dir: &TempDir) -> Options {
        Options::default()
            .filename(dir.path().join("app.log"))
            .interval(NO_TICK)
    }

    fn fixed_width(max_size: u64, backup_count: u32) -> Options {
        Options::default()
            .max_size(max_size)
            .backup_count(backup_count)
            .interval(NO_TICK)
            .formatter(CustomFormatter::per_record(|record, _| {
                Ok(record.message().to_string().into())
            }))
    }

    #[test]
    fn test_empty_flush_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(options(&dir)).unwrap();

        assert_eq!(sink.flush().unwrap(), FlushOutcome::Empty);
        assert_eq!(fs::read(sink.path()).unwrap(), b"");
        assert!(!sink.backup_path(0).exists());
        sink.close().unwrap();
    }

    #[test]
    fn test_time_is_taken_once_per_flush() {
        let dir = tempfile::tempdir().unwrap();
        let now = Timestamp::from_str("2024-08-11T19:44:57Z").unwrap();
        let sink = Sink::build(
            options(&dir).time_zone("UTC"),
            Clock::ManualClock(ManualClock::new(now)),
        )
        .unwrap();

        sink.emit(Level::Info, "server started");
        sink.emit(Level::custom("AUDIT"), "login");
        assert_eq!(sink.pending(), 2);
        assert_eq!(
            sink.flush().unwrap(),
            FlushOutcome::Written {
                records: 2,
                bytes: 80,
            }
        );
        assert_eq!(sink.pending(), 0);

        assert_eq!(
            fs::read_to_string(sink.path()).unwrap(),
            "[INFO] 11.08.2024 19:44:57 - server started\n[AUDIT] 11.08.2024 19:44:57 - login\n"
        );
        sink.close().unwrap();
    }

    #[test]
    fn test_unlimited_size_never_rotates() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(fixed_width(0, 2).filename(dir.path().join("app.log"))).unwrap();

        let line = "x".repeat(1024);
        for _ in 0..64 {
            sink.emit(Level::Log, &line);
        }
        sink.flush().unwrap();

        assert_eq!(fs::metadata(sink.path()).unwrap().len(), 64 * 1024);
        assert!(!sink.backup_path(0).exists());
        sink.close().unwrap();
    }

    #[test]
    fn test_batch_larger_than_chain_keeps_newest_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(fixed_width(1024, 3).filename(dir.path().join("app.log"))).unwrap();

        for c in [b'a', b'b', b'c', b'd'] {
            sink.emit(Level::Log, &String::from_utf8(vec![c; 1024]).unwrap());
        }
        sink.flush().unwrap();

        assert_eq!(fs::read(sink.path()).unwrap(), vec![b'd'; 1024]);
        assert_eq!(fs::read(sink.backup_path(0)).unwrap(), vec![b'c'; 1024]);
        assert_eq!(fs::read(sink.backup_path(1)).unwrap(), vec![b'b'; 1024]);
        assert_eq!(fs::read(sink.backup_path(2)).unwrap(), vec![b'a'; 1024]);
        assert!(!sink.backup_path(3).exists());

        // one more batch pushes `a` out of the chain
        sink.emit(Level::Log, &"e".repeat(10));
        sink.flush().unwrap();
        assert_eq!(fs::read(sink.path()).unwrap(), vec![b'e'; 10]);
        assert_eq!(fs::read(sink.backup_path(2)).unwrap(), vec![b'b'; 1024]);
        sink.close().unwrap();
    }

    #[test]
    fn test_files_stay_within_limits() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(fixed_width(100, 2).filename(dir.path().join("app.log"))).unwrap();

        let mut written = 0;
        for i in 0..50 {
            let line = format!("{i:03}{}\n", "-".repeat(i % 17));
            written += line.len();
            sink.emit(Level::Log, &line);
            if i % 7 == 0 {
                sink.flush().unwrap();
            }
        }
        sink.flush().unwrap();

        let mut retained = fs::metadata(sink.path()).unwrap().len();
        assert!(retained <= 100);
        for index in 0..2 {
            let len = fs::metadata(sink.backup_path(index)).unwrap().len();
            assert_eq!(len, 100);
            retained += len;
        }
        assert!(!sink.backup_path(2).exists());
        assert!(retained <= sink.config().capacity().unwrap());
        assert!(retained <= written as u64);
        sink.close().unwrap();
    }

    #[test]
    fn test_continue_from_last_fills_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, vec![b'o'; 500]).unwrap();

        let sink = Sink::new(
            fixed_width(1024, 1)
                .filename(&path)
                .continue_from_last(true),
        )
        .unwrap();
        sink.emit(Level::Log, &"n".repeat(600));
        sink.flush().unwrap();

        let mut backup = vec![b'o'; 500];
        backup.extend(vec![b'n'; 524]);
        assert_eq!(fs::read(sink.backup_path(0)).unwrap(), backup);
        assert_eq!(fs::read(&path).unwrap(), vec![b'n'; 76]);
        sink.close().unwrap();
    }

    #[test]
    fn test_format_failure_is_returned_and_trapped() {
        let dir = tempfile::tempdir().unwrap();
        let trapped = Arc::new(parking_lot::Mutex::new(vec![]));
        let sink = Sink::new(
            options(&dir)
                .formatter(CustomFormatter::new(|_, _| Err(Error::new("boom"))))
                .trap(CallbackTrap::new({
                    let trapped = trapped.clone();
                    move |err| trapped.lock().push(err.to_string())
                })),
        )
        .unwrap();

        sink.emit(Level::Error, "lost");
        let err = sink.flush().unwrap_err();
        assert_eq!(err.message(), "failed to format log records");
        // the batch is dropped, not requeued
        assert_eq!(sink.pending(), 0);

        // background failures have no caller to return to
        sink.emit(Level::Error, "lost too");
        sink.request_flush();
        for _ in 0..200 {
            if !trapped.lock().is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(trapped.lock()[0].contains("failed to format log records"));
        sink.close().unwrap();
    }

    #[test]
    fn test_timer_flushes_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(options(&dir).interval(Duration::from_millis(20))).unwrap();

        sink.emit(Level::Success, "deployed");
        for _ in 0..200 {
            if sink.pending() == 0 && fs::metadata(sink.path()).unwrap().len() > 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        let text = fs::read_to_string(sink.path()).unwrap();
        assert!(text.starts_with("[SUCCESS] "), "{text}");
        assert!(text.ends_with(" - deployed\n"), "{text}");
        sink.close().unwrap();
    }

    #[test]
    fn test_request_flush_wakes_the_timer() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(options(&dir)).unwrap();

        sink.emit(Level::Info, "now");
        sink.request_flush();
        for _ in 0..200 {
            if sink.pending() == 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(sink.pending(), 0);
        sink.close().unwrap();
    }

    #[test]
    fn test_close_and_drop_flush_pending_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");

        let sink = Sink::new(options(&dir)).unwrap();
        sink.emit(Level::Warn, "closing");
        sink.close().unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("- closing\n"));

        let sink = Sink::new(options(&dir).continue_from_last(true)).unwrap();
        sink.emit(Level::Warn, "dropping");
        drop(sink);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("- closing\n"));
        assert!(text.contains("- dropping\n"));
    }

    #[test]
    fn test_periodic_flush_skips_while_busy() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(options(&dir)).unwrap();

        sink.emit(Level::Info, "queued");
        let state = sink.core.state.lock();
        assert_eq!(sink.try_flush().unwrap(), FlushOutcome::Busy);
        drop(state);

        assert_eq!(sink.pending(), 1);
        assert!(matches!(
            sink.try_flush().unwrap(),
            FlushOutcome::Written { records: 1, .. }
        ));
        sink.close().unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn test_failed_write_does_not_stop_later_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = Sink::new(fixed_width(10, 0).filename(&path)).unwrap();

        sink.emit(Level::Log, "0123456789");
        sink.flush().unwrap();

        // the rotation cannot reopen a directory as the active file
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        sink.emit(Level::Log, "lost");
        assert!(sink.flush().is_err());
        assert_eq!(sink.pending(), 0);

        fs::remove_dir(&path).unwrap();
        sink.emit(Level::Log, "xyz");
        assert_eq!(
            sink.flush().unwrap(),
            FlushOutcome::Written {
                records: 1,
                bytes: 3,
            }
        );
        assert_eq!(fs::read(&path).unwrap(), b"xyz");
        assert_eq!(sink.core.state.lock().policy.current_size(), 3);

        // fills the file to 10 bytes, then rotates
        sink.emit(Level::Log, "0123456789");
        sink.flush().unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"789");
        sink.close().unwrap();
    }

    #[test]
    fn test_invalid_options_fail_construction() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Sink::new(options(&dir).interval(Duration::ZERO)).is_err());
        assert!(Sink::new(options(&dir).time_zone("Not/A_Zone")).is_err());
    }
}
