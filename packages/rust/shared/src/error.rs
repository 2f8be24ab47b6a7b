//! Error types for stackpost.
//!
//! Each pipeline stage has its own error enum ([`QuestionError`],
//! [`CompletionError`]) so callers can tell which stage failed and why.
//! [`StackpostError`] is the umbrella type the pipeline returns.
//! App crates (cli) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::{SectionKind, Stage};

/// Failure while selecting a question from the Q&A search API.
#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    /// The configured tag list is empty.
    #[error("no tags configured to choose from")]
    NoTags,

    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with an error status or an error body.
    ///
    /// `error_id` is the Stack Exchange error code from the body, which can
    /// arrive alongside any HTTP status (including 200).
    #[error("search API error (HTTP {status}{}): {message}", error_id_suffix(.error_id))]
    Api {
        status: u16,
        error_id: Option<u16>,
        message: String,
    },

    /// The response body could not be decoded.
    #[error("invalid search API response: {0}")]
    Decode(String),

    /// The search returned zero items for the chosen tag.
    #[error("no questions found for tag '{tag}'")]
    NoQuestions { tag: String },
}

fn error_id_suffix(error_id: &Option<u16>) -> String {
    error_id.map(|id| format!(", error_id {id}")).unwrap_or_default()
}

/// Failure while requesting a completion for one post section.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// The API key is missing or was rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with a non-success status.
    #[error("completion API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("invalid completion response: {0}")]
    Decode(String),

    /// The response had no choices or only whitespace.
    #[error("empty completion for {section} section")]
    Empty { section: SectionKind },
}

/// Top-level error type for a stackpost run.
#[derive(Debug, thiserror::Error)]
pub enum StackpostError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Question selection failed.
    #[error("question selection failed: {0}")]
    Questions(#[from] QuestionError),

    /// Generating one of the post sections failed.
    #[error("generating {section} section failed: {source}")]
    Completion {
        section: SectionKind,
        #[source]
        source: CompletionError,
    },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StackpostError>;

impl StackpostError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the section that was being generated to a completion error.
    pub fn completion(section: SectionKind, source: CompletionError) -> Self {
        Self::Completion { section, source }
    }

    /// The pipeline stage this error aborted.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Config { .. } => Stage::Configure,
            Self::Questions(_) => Stage::SelectQuestion,
            Self::Completion { .. } => Stage::Generate,
            Self::Io { .. } => Stage::Write,
        }
    }
}
