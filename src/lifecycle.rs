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

//! Process-wide registry of live sinks.
//!
//! Every [`Sink`](crate::Sink) registers here on construction and deregisters when closed. The
//! first registration installs the process hooks:
//!
//! * on Unix, an `atexit` handler, so returning from `main` or calling [`std::process::exit`]
//!   flushes every live sink;
//! * with the `signals` feature on Unix, a thread handling `SIGTERM` and `SIGINT` that flushes
//!   every live sink and then exits the process with status 0.
//!
//! Each of these runs [`finalize`], which flushes at most once per process.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::Weak;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;

use crate::scheduler::FlushMode;
use crate::sink::Core;

#[derive(Debug, Default)]
struct Lifecycle {
    next_id: AtomicU64,
    sinks: Mutex<BTreeMap<u64, Weak<Core>>>,
    finalized: AtomicBool,
}

fn lifecycle() -> &'static Lifecycle {
    static LIFECYCLE: OnceLock<Lifecycle> = OnceLock::new();
    LIFECYCLE.get_or_init(|| {
        install_hooks();
        Lifecycle::default()
    })
}

/// Membership of a sink in the registry. Dropping it deregisters the sink.
#[derive(Debug)]
pub(crate) struct Registration {
    id: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        lifecycle().sinks.lock().remove(&self.id);
    }
}

pub(crate) fn register(core: &Arc<Core>) -> Registration {
    let lifecycle = lifecycle();
    let id = lifecycle.next_id.fetch_add(1, Ordering::Relaxed);
    lifecycle.sinks.lock().insert(id, Arc::downgrade(core));
    Registration { id }
}

/// Number of sinks currently registered.
pub fn registered() -> usize {
    lifecycle()
        .sinks
        .lock()
        .values()
        .filter(|sink| sink.strong_count() > 0)
        .count()
}

/// Runs a forced flush of every live sink, in registration order.
///
/// Errors are reported to each sink's trap.
pub fn flush_all() {
    let sinks = lifecycle()
        .sinks
        .lock()
        .values()
        .filter_map(Weak::upgrade)
        .collect::<Vec<_>>();

    for core in sinks {
        if let Err(err) = core.flush(FlushMode::Forced) {
            core.trap(&err);
        }
    }
}

/// Runs the final flush of the process. Only the first call flushes; later calls return
/// immediately.
///
/// This is what the exit and signal hooks call. Call it yourself before terminating the process
/// in a way that skips both, such as [`std::process::abort`].
pub fn finalize() {
    if lifecycle().finalized.swap(true, Ordering::SeqCst) {
        return;
    }
    flush_all();
}

fn install_hooks() {
    #[cfg(unix)]
    {
        extern "C" fn flush_at_exit() {
            // unwinding out of an `extern "C"` function aborts
            let _ = std::panic::catch_unwind(finalize);
        }

        // SAFETY: `flush_at_exit` is a plain function that never unwinds.
        if unsafe { libc::atexit(flush_at_exit) } != 0 {
            let _ = std::io::Write::write_all(
                &mut std::io::stderr(),
                b"rotalog failed to register the exit hook\n",
            );
        }
    }

    #[cfg(all(unix, feature = "signals"))]
    install_signal_handler();
}

#[cfg(all(unix, feature = "signals"))]
fn install_signal_handler() {
    use signal_hook::consts::SIGINT;
    use signal_hook::consts::SIGTERM;
    use signal_hook::iterator::Signals;

    let mut signals = match Signals::new([SIGTERM, SIGINT]) {
        Ok(signals) => signals,
        Err(err) => {
            let _ = std::io::Write::write_all(
                &mut std::io::stderr(),
                format!("rotalog failed to register signal handlers: {err}\n").as_bytes(),
            );
            return;
        }
    };

    let spawned = std::thread::Builder::new()
        .name("rotalog-signals".to_string())
        .spawn(move || {
            if signals.forever().next().is_some() {
                finalize();
                std::process::exit(0);
            }
        });
    if let Err(err) = spawned {
        let _ = std::io::Write::write_all(
            &mut std::io::stderr(),
            format!("rotalog failed to spawn the signal thread: {err}\n").as_bytes(),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::Options;
    use crate::Output;
    use crate::Sink;

    #[test]
    fn test_flush_all_reaches_every_live_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sinks = (0..3)
            .map(|i| {
                Sink::new(
                    Options::default()
                        .filename(dir.path().join(format!("{i}.log")))
                        .interval(Duration::from_secs(3600)),
                )
                .unwrap()
            })
            .collect::<Vec<_>>();
        assert!(registered() >= 3);

        for sink in &sinks {
            sink.alert("flushed by the registry");
        }
        flush_all();

        for sink in sinks {
            assert_eq!(sink.pending(), 0);
            let text = std::fs::read_to_string(sink.path()).unwrap();
            assert!(text.ends_with(" - flushed by the registry\n"));
            sink.close().unwrap();
        }
    }
}
