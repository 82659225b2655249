use std::path::PathBuf;

use thiserror::Error;

/// Exit code for failures owned by the dispatcher itself.
pub const EXIT_INTERNAL: i32 = 2;
/// Exit code when the executable exists but cannot be run.
pub const EXIT_NOT_EXECUTABLE: i32 = 126;
/// Exit code when the executable cannot be found.
pub const EXIT_NOT_FOUND: i32 = 127;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with status {code}")]
    StepFailed { program: String, code: i32 },

    #[error("cannot remove '{}': {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("documentation subproject not found: {}", .0.display())]
    DelegateMissing(PathBuf),

    #[error("unknown task '{0}' (expected one of: test-code, test-coverage, doc, clean)")]
    UnknownTask(String),

    #[error("invalid assignment '{0}' (expected NAME=VALUE)")]
    InvalidAssignment(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Process exit status the dispatcher terminates with for this error.
    ///
    /// A failed step hands back the tool's own status verbatim. Spawn
    /// failures use the shell conventions (127 not found, 126 not runnable).
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::StepFailed { code, .. } => *code,
            Error::Spawn { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => EXIT_NOT_FOUND,
                std::io::ErrorKind::PermissionDenied => EXIT_NOT_EXECUTABLE,
                _ => EXIT_INTERNAL,
            },
            _ => EXIT_INTERNAL,
        }
    }

    /// Whether the failure came from the spawned tool, which has already
    /// reported it on its own output.
    pub fn is_tool_failure(&self) -> bool {
        matches!(self, Error::StepFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
