//! Task and step definitions.
//!
//! The task set is closed. Each task expands into a fixed, ordered list of
//! steps built from the resolved bindings and the project layout; nothing
//! here touches the filesystem or spawns anything.

use std::path::PathBuf;
use std::str::FromStr;

use crate::config::{Bindings, Config};
use crate::process::{shell_escape, split_command};
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    TestCode,
    TestCoverage,
    Doc,
    Clean,
}

impl Task {
    pub const ALL: [Task; 4] = [Task::TestCode, Task::TestCoverage, Task::Doc, Task::Clean];

    pub fn name(&self) -> &'static str {
        match self {
            Task::TestCode => "test-code",
            Task::TestCoverage => "test-coverage",
            Task::Doc => "doc",
            Task::Clean => "clean",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Task::TestCode => "Run the test suite against the package",
            Task::TestCoverage => "Run the test suite with an HTML coverage report",
            Task::Doc => "Build the HTML documentation",
            Task::Clean => "Remove coverage artifacts and built documentation",
        }
    }

    /// Phony tasks never name a file of the same name.
    pub fn is_phony(&self) -> bool {
        matches!(self, Task::Doc | Task::Clean)
    }

    /// Expand the task into its ordered steps.
    pub fn steps(&self, config: &Config, bindings: &Bindings) -> Vec<Step> {
        let package = config.package.clone();
        let (pytest, mut runner_args) = split_command(&bindings.pytest.value);
        let coverage_artifacts = Step::Remove {
            paths: vec![
                config.coverage.data_file.clone(),
                config.coverage.report_dir.clone(),
            ],
        };

        match self {
            Task::TestCode => {
                runner_args.extend([package, "--showlocals".to_string(), "-v".to_string()]);
                vec![Step::Run {
                    program: pytest,
                    args: runner_args,
                }]
            }
            Task::TestCoverage => {
                runner_args.extend([
                    package.clone(),
                    "--showlocals".to_string(),
                    "-v".to_string(),
                    format!("--cov={}", package),
                    format!(
                        "--cov-report=html:{}",
                        config.coverage.report_dir.display()
                    ),
                ]);
                vec![
                    coverage_artifacts,
                    Step::Run {
                        program: pytest,
                        args: runner_args,
                    },
                ]
            }
            Task::Doc => vec![Step::Delegate {
                dir: config.docs.dir.clone(),
                program: config.docs.dispatcher.clone(),
                target: "html".to_string(),
            }],
            Task::Clean => vec![
                coverage_artifacts,
                Step::Delegate {
                    dir: config.docs.dir.clone(),
                    program: config.docs.dispatcher.clone(),
                    target: "clean".to_string(),
                },
            ],
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Task {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Task::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::UnknownTask(s.to_string()))
    }
}

/// One unit of work inside a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Spawn `program` in the project root.
    Run { program: String, args: Vec<String> },
    /// Hand `target` to the subproject dispatcher, running inside `dir`.
    Delegate {
        dir: PathBuf,
        program: String,
        target: String,
    },
    /// Remove every path, skipping the ones that do not exist.
    Remove { paths: Vec<PathBuf> },
}

impl Step {
    /// Render the step as the shell command line it is equivalent to.
    pub fn command_line(&self) -> String {
        match self {
            Step::Run { program, args } => std::iter::once(program.as_str())
                .chain(args.iter().map(String::as_str))
                .map(shell_escape)
                .collect::<Vec<_>>()
                .join(" "),
            Step::Delegate {
                dir,
                program,
                target,
            } => format!(
                "cd {} && {} {}",
                shell_escape(&dir.display().to_string()),
                shell_escape(program),
                shell_escape(target)
            ),
            Step::Remove { paths } => std::iter::once("rm -rf".to_string())
                .chain(paths.iter().map(|p| shell_escape(&p.display().to_string())))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}
