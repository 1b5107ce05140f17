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

use std::ffi::OsStr;
use std::ffi::OsString;
use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use crate::Error;
use crate::Trap;
use crate::rotation::RotationConfig;
use crate::rotation::RotationPolicy;
use crate::rotation::WriteInstruction;

/// Owns the open handle of the active log file and its backup chain.
///
/// Backups live next to the active file as `Backup_{i}_{file name}`, where `Backup_0` holds the
/// most recently rotated-out content.
#[derive(Debug)]
pub struct FileWriter {
    path: PathBuf,
    dir: PathBuf,
    filename: OsString,
    backup_count: u32,
    file: Option<File>,
    closed: bool,
    trap: Arc<dyn Trap>,
}

impl FileWriter {
    /// Opens the active file at `path`, creating parent directories as needed.
    ///
    /// Unless `config.continue_from_last` is set, the active file and every backup of it are
    /// deleted first. When continuing, backups beyond `config.backup_count` are deleted, and an
    /// active file larger than `config.max_size` is split across the chain as if it had been
    /// written in one go. Returns the writer and the current size of the active file.
    pub fn open(
        path: impl AsRef<Path>,
        config: &RotationConfig,
        trap: Arc<dyn Trap>,
    ) -> Result<(FileWriter, u64), Error> {
        let path = std::path::absolute(path.as_ref()).map_err(|err| {
            Error::new("failed to resolve log file path")
                .with_path(path.as_ref())
                .with_source(err)
        })?;
        let filename = path
            .file_name()
            .ok_or_else(|| Error::new("log file path has no file name").with_path(&path))?
            .to_os_string();
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        fs::create_dir_all(&dir).map_err(|err| {
            Error::new("failed to create log directory")
                .with_context("dir", dir.display())
                .with_source(err)
        })?;

        let mut writer = FileWriter {
            path,
            dir,
            filename,
            backup_count: config.backup_count,
            file: None,
            closed: false,
            trap,
        };

        if config.continue_from_last {
            writer.remove_backups(config.backup_count)?;
        } else {
            writer.remove_active()?;
            writer.remove_backups(0)?;
        }

        writer.file = Some(writer.open_active(false)?);
        let mut current_size = writer.len()?;
        if config.max_size > 0 && current_size > config.max_size {
            current_size = writer.rechunk_active(config)?;
        }
        Ok((writer, current_size))
    }

    /// Path of the active file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of backup slot `index`, `0` being the newest.
    pub fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = OsString::from(format!("Backup_{index}_"));
        name.push(&self.filename);
        self.dir.join(name)
    }

    /// Size of the active file on disk, `0` if it does not exist.
    pub fn len(&self) -> Result<u64, Error> {
        let metadata = match &self.file {
            Some(file) => file.metadata(),
            None => match fs::metadata(&self.path) {
                Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
                metadata => metadata,
            },
        };
        metadata.map(|metadata| metadata.len()).map_err(|err| {
            Error::new("failed to read log file metadata")
                .with_path(&self.path)
                .with_source(err)
        })
    }

    /// Appends bytes to the active file, reopening it if a failed rotation left it unopened.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.file_mut()?.write_all(bytes).map_err(|err| {
            Error::new("failed to write log file")
                .with_path(&self.path)
                .with_source(err)
        })
    }

    /// Shifts every backup one slot older, moves the active file into `Backup_0` and reopens an
    /// empty active file.
    ///
    /// A failed shift or rename is reported to the trap and skipped; the remaining slots are
    /// still attempted. Only failing to reopen the active file is an error; the next append then
    /// tries to reopen it.
    pub fn rotate(&mut self) -> Result<(), Error> {
        if self.closed {
            return Err(self.closed_error());
        }
        if let Some(file) = self.file.take() {
            if let Err(err) = file.sync_data() {
                self.trap.trap(
                    &Error::new("failed to sync log file before rotation")
                        .with_path(&self.path)
                        .with_source(err),
                );
            }
        }

        if self.backup_count > 0 {
            for index in (0..self.backup_count - 1).rev() {
                let from = self.backup_path(index);
                let to = self.backup_path(index + 1);
                self.shift(&from, &to);
            }
            let to = self.backup_path(0);
            let from = self.path.clone();
            self.shift(&from, &to);
        }

        self.file = Some(self.open_active(true)?);
        Ok(())
    }

    /// Carries out a plan produced by [`RotationPolicy::plan`](crate::RotationPolicy::plan).
    pub fn execute(&mut self, payload: &[u8], plan: &[WriteInstruction]) -> Result<(), Error> {
        for instruction in plan {
            match instruction {
                WriteInstruction::Rotate => self.rotate()?,
                WriteInstruction::Append(range) => self.append(&payload[range.clone()])?,
            }
        }
        self.file_mut()?.flush().map_err(|err| {
            Error::new("failed to flush log file")
                .with_path(&self.path)
                .with_source(err)
        })
    }

    /// Syncs and closes the active file. Further writes fail.
    pub fn close(&mut self) -> Result<(), Error> {
        self.closed = true;
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        file.flush()
            .and_then(|()| file.sync_all())
            .map_err(|err| {
                Error::new("failed to sync log file")
                    .with_path(&self.path)
                    .with_source(err)
            })
    }

    /// Whether the writer still accepts writes, i.e. [`close`](FileWriter::close) was not called.
    pub fn is_open(&self) -> bool {
        !self.closed
    }

    fn file_mut(&mut self) -> Result<&mut File, Error> {
        if self.closed {
            return Err(self.closed_error());
        }
        let file = match self.file.take() {
            Some(file) => file,
            None => self.open_active(false)?,
        };
        Ok(self.file.insert(file))
    }

    fn closed_error(&self) -> Error {
        Error::new("log file is closed").with_path(&self.path)
    }

    // An earlier run with a larger `max_size` may have left an oversized active file.
    fn rechunk_active(&mut self, config: &RotationConfig) -> Result<u64, Error> {
        let previous = fs::read(&self.path).map_err(|err| {
            Error::new("failed to read previous log file")
                .with_path(&self.path)
                .with_source(err)
        })?;
        self.file = Some(self.open_active(true)?);

        let mut policy = RotationPolicy::new(config, 0);
        let plan = policy.plan(&previous);
        let plan = policy.skip_evicted(plan);
        self.execute(&previous, &plan)?;
        Ok(policy.current_size())
    }

    fn shift(&self, from: &Path, to: &Path) {
        match fs::rename(from, to) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => self.trap.trap(
                &Error::new("failed to shift backup file")
                    .with_context("from", from.display())
                    .with_context("to", to.display())
                    .with_source(err),
            ),
        }
    }

    fn open_active(&self, truncate: bool) -> Result<File, Error> {
        let mut open_options = OpenOptions::new();
        if truncate {
            open_options.write(true).truncate(true).create(true);
        } else {
            open_options.append(true).create(true);
        }
        open_options.open(&self.path).map_err(|err| {
            Error::new("failed to open log file")
                .with_path(&self.path)
                .with_source(err)
        })
    }

    fn remove_active(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::new("failed to remove previous log file")
                .with_path(&self.path)
                .with_source(err)),
        }
    }

    /// Removes every backup in slot `from` or later, including slots beyond the configured count
    /// left over from runs with a larger one.
    fn remove_backups(&self, from: u32) -> Result<(), Error> {
        let read_dir = fs::read_dir(&self.dir).map_err(|err| {
            Error::new("failed to read log dir")
                .with_context("dir", self.dir.display())
                .with_source(err)
        })?;

        let backups = read_dir.filter_map(|entry| {
            let entry = entry.ok()?;
            let metadata = entry.metadata().ok()?;

            // the writer only creates files, never delete a dir or symlink
            if !metadata.is_file() {
                return None;
            }

            let index = backup_index(&entry.file_name(), &self.filename)?;
            (index >= from).then(|| entry.path())
        });

        for backup in backups {
            if let Err(err) = fs::remove_file(&backup) {
                self.trap.trap(
                    &Error::new("failed to remove previous backup file")
                        .with_path(&backup)
                        .with_source(err),
                );
            }
        }
        Ok(())
    }
}

/// The slot of `name` if it is `Backup_{n}_{filename}`.
fn backup_index(name: &OsStr, filename: &OsStr) -> Option<u32> {
    let name = name.to_str()?;
    let filename = filename.to_str()?;
    let index = name
        .strip_prefix("Backup_")?
        .strip_suffix(filename)?
        .strip_suffix('_')?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // too many digits for a slot the writer could have made, still one of ours
    Some(index.parse().unwrap_or(u32::MAX))
}
