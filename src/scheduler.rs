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

//! Periodic flushing on a background thread.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::select;

use crate::Error;
use crate::sink::Core;

/// How a flush treats a flush that is already running.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FlushMode {
    /// Skip if another flush is in progress. Used by the timer.
    Periodic,
    /// Wait for an in-progress flush, then run a pass of its own. Used on shutdown.
    Forced,
}

/// What a flush pass did.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FlushOutcome {
    /// Another flush was in progress; nothing was done.
    Busy,
    /// The queue was empty; no file was touched.
    Empty,
    /// Records were formatted and written.
    Written {
        /// Number of records drained.
        records: usize,
        /// Number of payload bytes handed to the file writer.
        bytes: usize,
    },
}

#[derive(Debug)]
enum Message {
    Flush,
    Shutdown,
}

/// Handle of the timer thread that flushes a sink on a fixed interval.
///
/// The thread only ever holds the sink's internals; it does not keep the process alive, and it
/// stops when the handle is shut down or dropped.
#[derive(Debug)]
pub(crate) struct FlushScheduler {
    sender: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

impl FlushScheduler {
    pub(crate) fn start(
        core: Arc<Core>,
        interval: Duration,
        thread_name: String,
    ) -> Result<FlushScheduler, Error> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let worker = Worker {
            core,
            receiver,
            interval,
        };
        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker.run())
            .map_err(|err| Error::new("failed to spawn flush thread").with_source(err))?;
        Ok(FlushScheduler {
            sender,
            handle: Some(handle),
        })
    }

    /// Asks the timer thread to flush now instead of waiting for the next tick.
    pub(crate) fn wake(&self) {
        let _ = self.sender.send(Message::Flush);
    }

    /// Stops the timer thread and waits for an in-flight periodic flush to finish.
    pub(crate) fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        // the worker may already be gone if it panicked
        let _ = self.sender.send(Message::Shutdown);
        if handle.join().is_err() {
            let _ = std::io::Write::write_all(
                &mut std::io::stderr(),
                b"rotalog flush thread panicked\n",
            );
        }
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker {
    core: Arc<Core>,
    receiver: Receiver<Message>,
    interval: Duration,
}

impl Worker {
    fn run(self) {
        let ticker = crossbeam_channel::tick(self.interval);
        loop {
            select! {
                recv(ticker) -> _ => self.flush(),
                recv(self.receiver) -> message => match message {
                    Ok(Message::Flush) => self.flush(),
                    Ok(Message::Shutdown) | Err(_) => break,
                },
            }
        }
    }

    fn flush(&self) {
        if let Err(err) = self.core.flush(FlushMode::Periodic) {
            self.core.trap(&err);
        }
    }
}
