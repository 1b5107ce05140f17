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


//! This case ensures that a termination signal flushes every live sink before the process exits.

#[cfg(unix)]
fn main() {
    use std::fmt::Write;
    use std::path::Path;
    use std::time::Duration;

    use rotalog::Options;
    use rotalog::output::Discard;

    const RECORDS: usize = 500;

    fn run_child(path: &Path, signal: libc::c_int) {
        let decorated = rotalog::connect(
            Discard::default(),
            Options::default()
                .filename(path)
                .max_size(4096)
                .backup_count(100)
                .interval(Duration::from_secs(3600)),
        )
        .unwrap();

        for i in 0..RECORDS {
            rotalog::warning!(decorated, "LINE", format!("{i:04}"));
        }

        // SAFETY: raising a signal handled by the signal thread
        unsafe {
            libc::raise(signal);
        }

        // the signal thread exits the process
        std::thread::sleep(Duration::from_secs(30));
        std::process::exit(2);
    }

    let args = std::env::args().collect::<Vec<_>>();
    if args.get(1).map(String::as_str) == Some("child") {
        let signal = args[3].parse().unwrap();
        run_child(Path::new(&args[2]), signal);
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let mut captured_output = String::new();
    for (i, signal) in [libc::SIGTERM, libc::SIGINT].into_iter().cycle().take(10).enumerate() {
        let name = format!("signal-{i}.log");
        let path = dir.path().join(&name);
        let output = std::process::Command::new(&args[0])
            .arg("child")
            .arg(&path)
            .arg(signal.to_string())
            .stderr(std::process::Stdio::piped())
            .output()
            .unwrap();

        // gather the whole chain, oldest backup first
        let mut text = String::new();
        for index in (0..100).rev() {
            let backup = dir.path().join(format!("Backup_{index}_{name}"));
            text.push_str(&std::fs::read_to_string(backup).unwrap_or_default());
        }
        text.push_str(&std::fs::read_to_string(&path).unwrap_or_default());

        let lines = text.lines().collect::<Vec<_>>();
        let in_order = lines
            .iter()
            .enumerate()
            .all(|(n, line)| line.ends_with(&format!(" - LINE {n:04}")));
        let success = output.status.success() && lines.len() == RECORDS && in_order;
        writeln!(
            captured_output,
            "Attempt #{i} (signal {signal}) = {}",
            if success { "ok" } else { "failed!" }
        )
        .unwrap();

        if !success {
            eprintln!("{captured_output}");
            eprintln!(
                "stderr of the failed attempt:\n{}",
                String::from_utf8_lossy(&output.stderr)
            );
            eprintln!("{} lines were written", lines.len());
            panic!("test failed");
        }
    }
}

#[cfg(not(unix))]
fn main() {}
