use thiserror::Error;

pub mod context;

pub type Result<T> = std::result::Result<T, Error>;

// Re-export context helpers
pub use context::{ErrorChain, ErrorContext, OptionExt};

/// Main error type for the Teddy engine
#[derive(Error, Debug)]
pub enum Error {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "config")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    // Error with context chain
    #[error("{message}")]
    WithContext {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn template_not_found(name: impl Into<String>) -> Self {
        Self::TemplateNotFound(name.into())
    }

    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    pub fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    // Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// True when the template source could not be obtained at all
    pub fn is_missing_template(&self) -> bool {
        match self {
            Error::TemplateNotFound(_) => true,
            Error::WithContext { source, .. } => source.is_missing_template(),
            _ => false,
        }
    }

    /// Get a stable error code for diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::TemplateNotFound(_) => "E_TEMPLATE_NOT_FOUND",
            Error::Template(_) => "E_TEMPLATE",
            Error::Parse { .. } => "E_PARSE",
            Error::Json(_) => "E_JSON",
            #[cfg(feature = "config")]
            Error::Toml(_) => "E_TOML",
            Error::Config(_) => "E_CONFIG",
            Error::InvalidInput(_) => "E_INVALID_INPUT",
            Error::Io(_) => "E_IO",
            Error::Internal(_) => "E_INTERNAL",
            Error::WithContext { source, .. } => source.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::template_not_found("index.html").error_code(),
            "E_TEMPLATE_NOT_FOUND"
        );
        assert_eq!(Error::parse(1, 4, "unexpected eof").error_code(), "E_PARSE");
        assert_eq!(Error::config("bad").error_code(), "E_CONFIG");
    }

    #[test]
    fn test_context_keeps_source_code() {
        let err = Error::template_not_found("partials/nav.html").with_context("rendering index.html");
        assert_eq!(err.to_string(), "rendering index.html");
        assert_eq!(err.error_code(), "E_TEMPLATE_NOT_FOUND");
        assert!(err.is_missing_template());
    }

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse(3, 17, "unterminated attribute value");
        assert_eq!(
            err.to_string(),
            "Parse error at 3:17: unterminated attribute value"
        );
    }
}
