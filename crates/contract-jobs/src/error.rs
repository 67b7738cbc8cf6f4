//! Job-level error taxonomy.

use std::fmt;
use std::path::PathBuf;

/// Which side of the compiler boundary failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// The compiler service itself could not do its job.
    Tooling,
    /// The compiler ran and rejected the source.
    Language,
    /// Linking a precompiled binary failed.
    Link,
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompileErrorKind::Tooling => "compiler",
            CompileErrorKind::Language => "language",
            CompileErrorKind::Link => "link",
        };
        f.write_str(s)
    }
}

/// Errors that abort a deploy or call job.
///
/// Compiler warnings are not errors; they travel in the job outcome.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("could not find contract {contract} in:{}", render_attempts(.attempted))]
    PathNotFound {
        contract: String,
        attempted: Vec<PathBuf>,
    },

    #[error("{kind} error for {path}: {message}")]
    Compile {
        kind: CompileErrorKind,
        path: String,
        message: String,
    },

    #[error("no compiled object matches instance {instance} (available: {})", .available.join(", "))]
    NoMatchingInstance {
        instance: String,
        available: Vec<String>,
    },

    #[error("abi mismatch calling {function} on {abi_source}: {message}")]
    AbiMismatch {
        abi_source: String,
        function: String,
        message: String,
    },

    #[error("chain broadcast failed: {0}")]
    ChainBroadcast(String),

    #[error("broken invariant: {0}")]
    BrokenInvariant(String),

    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid job: {0}")]
    InvalidJob(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl JobError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        JobError::Filesystem {
            path: path.into().display().to_string(),
            source,
        }
    }

    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::PathNotFound { .. } => "path_not_found",
            JobError::Compile { .. } => "compile_error",
            JobError::NoMatchingInstance { .. } => "no_matching_instance",
            JobError::AbiMismatch { .. } => "abi_mismatch",
            JobError::ChainBroadcast(_) => "chain_broadcast",
            JobError::BrokenInvariant(_) => "broken_invariant",
            JobError::Filesystem { .. } => "filesystem",
            JobError::InvalidJob(_) => "invalid_job",
            JobError::Config(_) => "config",
        }
    }

    /// Every job error aborts the job. Warnings travel in the outcome.
    pub fn is_fatal(&self) -> bool {
        true
    }
}

fn render_attempts(attempted: &[PathBuf]) -> String {
    const LABELS: [&str; 3] = ["primary path", "binary path", "tertiary path"];
    attempted
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let label = LABELS.get(i).copied().unwrap_or("path");
            format!("\n* {}: {}", label, path.display())
        })
        .collect()
}

/// Result type for job operations.
pub type Result<T> = std::result::Result<T, JobError>;
