use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

use crate::{dlog_debug, dlog_trace, dlog_warn, Error, Result};

/// Run `program` to completion with inherited stdio.
///
/// The child's output goes straight to the terminal. A non-zero exit is
/// returned as [`Error::StepFailed`] carrying the child's own status.
pub fn run(program: &str, args: &[String], cwd: &Path, envs: &[(&str, &str)]) -> Result<()> {
    dlog_debug!(
        "process::run program={} args={:?} cwd={}",
        program,
        args,
        cwd.display()
    );
    if program.is_empty() {
        return Err(Error::Spawn {
            program: program.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "empty command"),
        });
    }

    let status = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .envs(envs.iter().copied())
        .status()
        .map_err(|source| {
            dlog_warn!("Failed to start '{}': {}", program, source);
            Error::Spawn {
                program: program.to_string(),
                source,
            }
        })?;

    dlog_trace!("'{}' finished: {:?}", program, status);
    if status.success() {
        return Ok(());
    }
    Err(Error::StepFailed {
        program: program.to_string(),
        code: status_code(status),
    })
}

/// Exit code for a finished child. Signal deaths map to 128 + signal.
pub fn status_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Split a binding value into program and leading arguments.
///
/// `python -m pytest` becomes `("python", ["-m", "pytest"])`. An empty
/// value yields an empty program, which fails at spawn time.
pub fn split_command(value: &str) -> (String, Vec<String>) {
    let mut words = value.split_whitespace().map(String::from);
    let program = words.next().unwrap_or_default();
    (program, words.collect())
}

/// Look up where `program` resolves on `PATH`, if anywhere.
pub fn locate(program: &str) -> Option<std::path::PathBuf> {
    which::which(program).ok()
}

pub fn shell_escape(s: &str) -> String {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\"'\"'"))
    }
}
