//! The task dispatcher.
//!
//! Runs the steps of exactly one task, in order, stopping at the first
//! failure. There is no state carried between invocations.

use std::path::{Path, PathBuf};

use crate::cleanup;
use crate::config::{Bindings, Config, PYTEST, PYTHON};
use crate::process::{self, split_command};
use crate::task::{Step, Task};
use crate::{dlog, dlog_debug, dlog_error, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Print the steps instead of executing them.
    pub dry_run: bool,
    /// Echo each step to stderr before running it.
    pub echo: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            echo: true,
        }
    }
}

pub struct Dispatcher {
    root: PathBuf,
    config: Config,
    bindings: Bindings,
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(root: &Path, config: Config, bindings: Bindings, options: DispatchOptions) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            bindings,
            options,
        }
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// The steps `task` expands to under this dispatcher's configuration.
    pub fn plan(&self, task: Task) -> Vec<Step> {
        task.steps(&self.config, &self.bindings)
    }

    /// Run `task` to completion or first failure.
    pub fn run(&self, task: Task) -> Result<()> {
        dlog!("Running task {} in {}", task, self.root.display());
        let steps = self.plan(task);

        for (i, step) in steps.iter().enumerate() {
            dlog_debug!("[{}] step {}/{}: {}", task, i + 1, steps.len(), step.command_line());
            if self.options.echo || self.options.dry_run {
                eprintln!("{}", step.command_line());
            }
            if self.options.dry_run {
                continue;
            }
            if let Err(e) = self.run_step(step) {
                dlog_error!("[{}] step {} failed: {}", task, i + 1, e);
                return Err(e);
            }
        }

        dlog!("Task {} finished", task);
        Ok(())
    }

    fn run_step(&self, step: &Step) -> Result<()> {
        match step {
            Step::Run { program, args } => process::run(program, args, &self.root, &[]),
            Step::Delegate {
                dir,
                program,
                target,
            } => {
                let cwd = self.root.join(dir);
                if !cwd.is_dir() {
                    return Err(Error::DelegateMissing(cwd));
                }
                let (program, mut args) = split_command(program);
                args.push(target.clone());
                let envs = [
                    (PYTHON, self.bindings.python.value.as_str()),
                    (PYTEST, self.bindings.pytest.value.as_str()),
                ];
                process::run(&program, &args, &cwd, &envs)
            }
            Step::Remove { paths } => {
                let report = cleanup::remove_all(&self.root, paths)?;
                dlog_debug!(
                    "Removed {} path(s), {} already absent",
                    report.removed_count(),
                    report.absent_count()
                );
                Ok(())
            }
        }
    }
}
