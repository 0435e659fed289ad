//! Ordered collection of errors produced by failing operations.

use std::fmt;

use crate::{Error, ErrorKind};

/// An ordered, append-only chain of errors.
///
/// Every failing handle operation produces exactly one [`Error`]; a caller
/// that wants to accumulate failures across several calls pushes them here.
/// Successful operations never touch the stack.
///
/// # Example
///
/// ```rust
/// use anyio_backend::{ErrorKind, ErrorStack, Handle};
///
/// let data = [0u8; 16];
/// let mut handle = Handle::memory_range(&data);
/// let mut stack = ErrorStack::new();
///
/// let mut buf = [0u8; 4];
/// assert!(stack.record(handle.read(&mut buf)).is_none());
/// assert_eq!(stack.len(), 1);
/// assert_eq!(stack.last().map(|e| e.kind()), Some(ErrorKind::NotOpen));
/// ```
#[derive(Debug, Default)]
pub struct ErrorStack {
    entries: Vec<Error>,
}

impl ErrorStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error. Earlier entries are kept.
    pub fn push(&mut self, error: Error) {
        self.entries.push(error);
    }

    /// Unwrap `result`, appending its error on failure.
    ///
    /// Returns `None` when the result was an error. On success the stack is
    /// left untouched.
    pub fn record<T>(&mut self, result: Result<T, Error>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.push(error);
                None
            }
        }
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no error has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently appended entry.
    pub fn last(&self) -> Option<&Error> {
        self.entries.last()
    }

    /// Iterate over entries in the order they were appended.
    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.entries.iter()
    }

    /// The kind tag of each entry, in order.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.entries.iter().map(Error::kind).collect()
    }

    /// Release every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Take ownership of the entries.
    pub fn into_vec(self) -> Vec<Error> {
        self.entries
    }

    /// Render the stack as a JSON array of `{kind, message, causes}` objects.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(serde::Serialize)]
        struct Entry {
            kind: ErrorKind,
            message: String,
            causes: Vec<String>,
        }

        let entries: Vec<Entry> = self
            .entries
            .iter()
            .map(|error| Entry {
                kind: error.kind(),
                message: error.to_string(),
                causes: error.causes().map(|cause| cause.to_string()).collect(),
            })
            .collect();
        serde_json::to_string(&entries)
    }
}

impl From<Error> for ErrorStack {
    fn from(error: Error) -> Self {
        Self {
            entries: vec![error],
        }
    }
}

impl Extend<Error> for ErrorStack {
    fn extend<I: IntoIterator<Item = Error>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl<'a> IntoIterator for &'a ErrorStack {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for ErrorStack {
    /// Backtrace-style rendering: one line per entry, causes indented below.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.entries.iter().enumerate() {
            writeln!(f, "#{index} [{}] {error}", error.kind())?;
            for cause in error.causes() {
                writeln!(f, "    caused by: {cause}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn missing_file() -> Error {
        Error::FileUnavailable {
            operation: "open",
            path: PathBuf::from("/missing.exe"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        }
    }

    #[test]
    fn record_success_leaves_stack_untouched() {
        let mut stack = ErrorStack::new();
        stack.push(Error::AlreadyOpen);

        let value = stack.record(Ok::<_, Error>(7));
        assert_eq!(value, Some(7));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn record_failure_appends_one_entry() {
        let mut stack = ErrorStack::new();
        let value: Option<u8> = stack.record(Err(Error::NotOpen { operation: "read" }));
        assert!(value.is_none());
        assert_eq!(stack.kinds(), vec![ErrorKind::NotOpen]);
    }

    #[test]
    fn push_keeps_order() {
        let mut stack = ErrorStack::new();
        stack.push(Error::NotOpen { operation: "seek" });
        stack.push(missing_file());
        assert_eq!(
            stack.kinds(),
            vec![ErrorKind::NotOpen, ErrorKind::ResourceUnavailable]
        );
        assert_eq!(stack.last().map(Error::kind), Some(ErrorKind::ResourceUnavailable));
    }

    #[test]
    fn clear_releases_everything() {
        let mut stack = ErrorStack::from(missing_file());
        assert!(!stack.is_empty());
        stack.clear();
        assert!(stack.is_empty());
    }

    #[test]
    fn extend_appends_in_order() {
        let mut stack = ErrorStack::from(Error::AlreadyOpen);
        stack.extend([Error::NotOpen { operation: "read" }, missing_file()]);
        assert_eq!(
            stack.kinds(),
            vec![
                ErrorKind::AlreadyOpen,
                ErrorKind::NotOpen,
                ErrorKind::ResourceUnavailable
            ]
        );
    }

    #[test]
    fn borrowed_iteration_matches_iter() {
        let mut stack = ErrorStack::new();
        stack.push(Error::NotOpen { operation: "seek" });
        stack.push(missing_file());

        let mut kinds = Vec::new();
        for error in &stack {
            kinds.push(error.kind());
        }
        assert_eq!(kinds, stack.kinds());
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn into_vec_hands_over_entries() {
        let mut stack = ErrorStack::new();
        stack.push(missing_file());
        stack.push(Error::AlreadyOpen);

        let errors = stack.into_vec();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], Error::FileUnavailable { .. }));
        assert!(matches!(errors[1], Error::AlreadyOpen));
    }

    #[test]
    fn display_includes_causes() {
        let stack = ErrorStack::from(missing_file());
        let rendered = stack.to_string();
        assert!(rendered.starts_with("#0 [resource unavailable] open failed for /missing.exe"));
        assert!(rendered.contains("caused by: no such file"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn to_json_lists_entries() {
        let stack = ErrorStack::from(missing_file());
        let json = stack.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["kind"], "ResourceUnavailable");
        assert_eq!(value[0]["causes"][0], "no such file");
    }
}
