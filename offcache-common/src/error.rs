// Copyright 2026 foyer Project Authors
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

use std::{
    backtrace::Backtrace,
    fmt::{Debug, Display},
    sync::Arc,
};

/// ErrorKind is all kinds of Error of offcache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No buffer of the byte store can hold the requested range, even after compaction.
    NoSpace,
    /// A pointer to a freed or relocated range was dereferenced.
    ///
    /// Indicates a bug if it ever surfaces.
    InvalidPointer,
    /// The byte store bookkeeping is inconsistent, e.g. a range overflows its buffer.
    ///
    /// Indicates a bug if it ever surfaces.
    CorruptStore,
    /// A versioned write carries a version lower than the stored one.
    ///
    /// Not a bug. The caller decides whether to re-read and retry.
    StaleItem,
    /// An ordering criteria was applied to an attribute value that cannot be ordered.
    NotComparable,
    /// A query references an attribute that was never registered.
    UnknownAttribute,
    /// Remote store connection error.
    Connection,
    /// Serialization or deserialization error.
    Coding,
    /// Config error.
    Config,
    /// Closed.
    Closed,
    /// External error.
    External,
}

impl ErrorKind {
    /// Convert self into static str.
    pub fn into_static(self) -> &'static str {
        self.into()
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

impl From<ErrorKind> for &'static str {
    fn from(v: ErrorKind) -> &'static str {
        match v {
            ErrorKind::NoSpace => "No space",
            ErrorKind::InvalidPointer => "Invalid pointer",
            ErrorKind::CorruptStore => "Corrupt store",
            ErrorKind::StaleItem => "Stale item",
            ErrorKind::NotComparable => "Not comparable",
            ErrorKind::UnknownAttribute => "Unknown attribute",
            ErrorKind::Connection => "Connection error",
            ErrorKind::Coding => "Coding error",
            ErrorKind::Config => "Config error",
            ErrorKind::Closed => "Closed",
            ErrorKind::External => "External error",
        }
    }
}

/// Error is the error struct returned by all offcache functions.
///
/// ## Display
///
/// Error can be displayed in two ways:
///
/// - Via `Display`: like `err.to_string()` or `format!("{err}")`
///
/// Error will be printed in a single line:
///
/// ```shell
/// Stale item, context: { attempted: 1, current: 2 } => stale item, source: attempted version 1 is older than current version 2
/// ```
///
/// - Via `Debug`: like `format!("{err:?}")`
///
/// Error will be printed in multi lines with more details and backtraces (if captured).
///
/// - For conventional struct-style Debug representation, like `format!("{err:#?}")`.
pub struct Error {
    kind: ErrorKind,
    message: String,

    context: Vec<(&'static str, String)>,

    source: Option<Arc<anyhow::Error>>,
    backtrace: Option<Arc<Backtrace>>,
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // If alternate has been specified, we will print like Debug.
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("context", &self.context);
            de.field("source", &self.source);
            de.field("backtrace", &self.backtrace);
            return de.finish();
        }

        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        writeln!(f)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "  {}: {}", k, v)?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "Source:")?;
            writeln!(f, "  {source:#}")?;
        }

        if let Some(backtrace) = &self.backtrace {
            writeln!(f)?;
            writeln!(f, "Backtrace:")?;
            writeln!(f, "{backtrace}")?;
        }

        Ok(())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            let mut iter = self.context.iter().peekable();
            while let Some((k, v)) = iter.next() {
                write!(f, "{}: {}", k, v)?;
                if iter.peek().is_some() {
                    write!(f, ", ")?;
                }
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        if let Some(source) = &self.source {
            write!(f, ", source: {source}")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|v| v.as_ref().as_ref())
    }
}

/// Cloning an [`Error`] with large message and context can be expensive.
impl Clone for Error {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            context: self.context.clone(),
            source: self.source.clone(),
            backtrace: self.backtrace.clone(),
        }
    }
}

impl Error {
    /// Create a new error.
    ///
    /// If the error needs to carry a source error, please use `with_source` method.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Vec::new(),
            source: None,
            backtrace: Some(Arc::new(Backtrace::capture())),
        }
    }

    /// Add more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Set source for error.
    ///
    /// # Notes
    ///
    /// If the source has been set, we will raise a panic here.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "the source error has been set");
        self.source = Some(Arc::new(source.into()));
        self
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the error context.
    pub fn context(&self) -> &Vec<(&'static str, String)> {
        &self.context
    }

    /// Get the error backtrace.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace.as_deref()
    }

    /// Get the error source.
    pub fn source(&self) -> Option<&anyhow::Error> {
        self.source.as_deref()
    }

    /// Downcast the reference of the source error to a specific error type reference.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source.as_deref().and_then(|e| e.downcast_ref::<E>())
    }
}

/// Result type for offcache.
pub type Result<T> = std::result::Result<T, Error>;

/// Versions carried by a rejected versioned write.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("attempted version {attempted} is older than current version {current}")]
pub struct StaleItemError {
    /// The version of the rejected write.
    pub attempted: i32,
    /// The version currently stored for the key.
    pub current: i32,
}

/// Helper methods for Error.
impl Error {
    /// Helper for creating a [`ErrorKind::NoSpace`] error with context.
    pub fn no_space(buffers: usize, capacity: usize, required: usize) -> Self {
        Error::new(ErrorKind::NoSpace, "not enough space left in any buffer")
            .with_context("buffers", buffers)
            .with_context("capacity", capacity)
            .with_context("required", required)
    }

    /// Helper for creating a [`ErrorKind::InvalidPointer`] error with context.
    pub fn invalid_pointer(pointer: impl Debug) -> Self {
        Error::new(ErrorKind::InvalidPointer, "pointer references a freed or relocated range")
            .with_context("pointer", format!("{pointer:?}"))
    }

    /// Helper for creating a [`ErrorKind::CorruptStore`] error.
    pub fn corrupt_store(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::CorruptStore, message)
    }

    /// Helper for creating a [`ErrorKind::StaleItem`] error.
    ///
    /// The versions can be recovered with `err.downcast_ref::<StaleItemError>()`.
    pub fn stale_item(attempted: i32, current: i32) -> Self {
        Error::new(ErrorKind::StaleItem, "stale item")
            .with_context("attempted", attempted)
            .with_context("current", current)
            .with_source(StaleItemError { attempted, current })
    }

    /// Helper for creating a [`ErrorKind::NotComparable`] error.
    pub fn not_comparable(attribute: &str, value: impl Debug) -> Self {
        Error::new(ErrorKind::NotComparable, "attribute value does not support ordering")
            .with_context("attribute", attribute)
            .with_context("value", format!("{value:?}"))
    }

    /// Helper for creating a [`ErrorKind::UnknownAttribute`] error.
    pub fn unknown_attribute(attribute: &str) -> Self {
        Error::new(ErrorKind::UnknownAttribute, "attribute has no registered accessor")
            .with_context("attribute", attribute)
    }

    /// Helper for creating a [`ErrorKind::Connection`] error from a remote store client error.
    pub fn connection(source: impl Into<anyhow::Error>) -> Self {
        Error::new(ErrorKind::Connection, "remote store request failed").with_source(source)
    }

    /// Helper for creating a [`ErrorKind::Config`] error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Config, message)
    }

    /// Helper for creating an error from [`bincode::Error`].
    pub fn bincode_error(source: bincode::Error) -> Self {
        Error::new(ErrorKind::Coding, "coding error").with_source(source)
    }

    /// Returns the versions of a [`ErrorKind::StaleItem`] error.
    pub fn stale_versions(&self) -> Option<(i32, i32)> {
        self.downcast_ref::<StaleItemError>().map(|e| (e.attempted, e.current))
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Self::bincode_error(e)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn is_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn test_send_sync_static() {
        is_send_sync_static::<Error>();
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestError(String);

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "TestError: {}", self.0)
        }
    }

    impl std::error::Error for TestError {}

    #[test]
    fn test_error_display() {
        let err = Error::new(ErrorKind::Connection, "a connection error occurred")
            .with_source(TestError("broken pipe".to_string()))
            .with_context("k1", "v1")
            .with_context("k2", "v2");

        assert_eq!(
            "Connection error, context: { k1: v1, k2: v2 } => a connection error occurred, source: TestError: broken pipe",
            err.to_string()
        );
    }

    #[test]
    fn test_error_downcast() {
        let inner = TestError("Error or not error, that is a question.".to_string());
        let err = Error::new(ErrorKind::External, "").with_source(inner.clone());

        let downcasted = err.downcast_ref::<TestError>().unwrap();
        assert_eq!(downcasted, &inner);
    }

    #[test]
    fn test_stale_item_versions() {
        let err = Error::stale_item(1, 2);
        assert_eq!(err.kind(), ErrorKind::StaleItem);
        assert_eq!(err.stale_versions(), Some((1, 2)));
        assert_eq!(
            err.downcast_ref::<StaleItemError>(),
            Some(&StaleItemError { attempted: 1, current: 2 })
        );

        let err = Error::no_space(1, 100, 200);
        assert_eq!(err.stale_versions(), None);
    }

    #[test]
    fn test_error_format() {
        let e = Error::no_space(2, 1024, 4096).with_source(TestError("test error".into()));

        println!("========== BEGIN DISPLAY FORMAT ==========");
        println!("{e}");
        println!("========== END DISPLAY FORMAT ==========");

        println!();

        println!("========== BEGIN DEBUG FORMAT ==========");
        println!("{e:?}");
        println!("========== END DEBUG FORMAT ==========");
    }
}
