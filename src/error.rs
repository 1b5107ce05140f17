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

use std::fmt;
use std::path::Path;

/// An error raised while setting up a sink or flushing it.
///
/// Carries a short message, `key: value` context such as the file involved, and the underlying
/// causes.
pub struct Error {
    message: String,
    sources: Vec<anyhow::Error>,
    context: Vec<(&'static str, String)>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            write!(
                f,
                "{}",
                self.context
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
            write!(f, " }}")?;
        }

        if !self.sources.is_empty() {
            write!(f, ", sources: [")?;
            for (i, source) in self.sources.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{source}")?;
            }
            write!(f, "]")?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("message", &self.message);
            de.field("context", &self.context);
            de.field("sources", &self.sources);
            return de.finish();
        }

        writeln!(f, "{}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "   {k}: {v}")?;
            }
        }
        if !self.sources.is_empty() {
            writeln!(f)?;
            writeln!(f, "Sources:")?;
            for source in self.sources.iter() {
                writeln!(f, "   {source:#}")?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.sources.first().map(|v| v.as_ref())
    }
}

impl Error {
    /// Creates an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sources: vec![],
            context: vec![],
        }
    }

    /// The error message, without context or sources.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The value of context `key`, if it was attached.
    ///
    /// File system errors carry the file involved under `path`.
    pub fn context(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attaches `key: value` context.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Attaches the file the error is about as `path` context.
    pub(crate) fn with_path(self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().display();
        self.with_context("path", path)
    }

    /// Attaches an underlying cause.
    pub fn with_source(mut self, src: impl Into<anyhow::Error>) -> Self {
        self.sources.push(src.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_display_with_context_and_sources() {
        let err = Error::new("failed to rotate")
            .with_context("slot", 2)
            .with_source(io::Error::other("disk full"));
        assert_eq!(
            err.to_string(),
            "failed to rotate, context: { slot: 2 }, sources: [disk full]"
        );
        assert_eq!(err.message(), "failed to rotate");
        assert_eq!(err.context("slot"), Some("2"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_path_context() {
        let err = Error::new("failed to open log file").with_path(Path::new("logs/app.log"));
        assert_eq!(err.context("path"), Some("logs/app.log"));
        assert_eq!(err.context("dir"), None);
        assert_eq!(
            err.to_string(),
            "failed to open log file, context: { path: logs/app.log }"
        );
    }

    #[test]
    fn test_display_plain() {
        let err = Error::new("formatter failed");
        assert_eq!(err.to_string(), "formatter failed");
        assert!(std::error::Error::source(&err).is_none());
    }
}
