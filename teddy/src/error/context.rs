//! Context chaining for engine errors
//!
//! Loading and rendering happen several layers away from the caller; these
//! helpers keep the template name and stage attached to whatever failed.

use super::Error;
use std::fmt;

/// Attach a context message to the error side of a result
pub trait ErrorContext<T> {
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Into<String>;

    /// Lazy variant, the message is only built on failure
    fn with_context<C, F>(self, f: F) -> Result<T, Error>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> ErrorContext<T> for Result<T, Error> {
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Into<String>,
    {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, Error>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Into<String>,
    {
        self.map_err(|e| Error::Io(e).with_context(context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, Error>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Io(e).with_context(f()))
    }
}

/// Flattened view over nested `WithContext` errors
pub struct ErrorChain<'a> {
    error: &'a Error,
    chain: Vec<String>,
}

impl<'a> ErrorChain<'a> {
    pub fn new(error: &'a Error) -> Self {
        let mut chain = Vec::new();
        let mut current = error;
        loop {
            chain.push(current.to_string());
            match current {
                Error::WithContext { source, .. } => current = source,
                _ => break,
            }
        }
        Self { error, chain }
    }

    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// Innermost error, with every context layer peeled off
    pub fn root_cause(&self) -> &Error {
        let mut current = self.error;
        while let Error::WithContext { source, .. } = current {
            current = source;
        }
        current
    }

    /// Single line form used by the engine's log output
    pub fn format_for_log(&self) -> String {
        self.chain.join(" -> ")
    }
}

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((head, causes)) = self.chain.split_first() else {
            return Ok(());
        };
        write!(f, "{}", head)?;
        if !causes.is_empty() {
            write!(f, "\n\nCaused by:")?;
            for (i, msg) in causes.iter().enumerate() {
                write!(f, "\n  {}. {}", i + 1, msg)?;
            }
        }
        Ok(())
    }
}

/// Turn a missing value into an engine error
pub trait OptionExt<T> {
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Into<String>;
}

impl<T> OptionExt<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Into<String>,
    {
        self.ok_or_else(|| Error::internal(context))
    }
}
