//! devtask drives a Python package's development workflow: tests,
//! coverage, documentation and cleanup, each dispatched to external tools.

pub mod cleanup;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod log;
pub mod process;
pub mod task;

pub use config::{Assignment, Binding, BindingSource, Bindings, Config};
pub use dispatcher::{DispatchOptions, Dispatcher};
pub use error::{Error, Result};
pub use task::{Step, Task};

/// Split free-form invocation arguments into the task name and
/// `NAME=VALUE` binding overrides. Order does not matter.
pub fn parse_invocation(args: &[String]) -> Result<(Task, Vec<Assignment>)> {
    let mut task = None;
    let mut assignments = Vec::new();
    for arg in args {
        if Assignment::is_assignment(arg) {
            assignments.push(arg.parse()?);
            continue;
        }
        if task.is_some() {
            return Err(Error::Validation(format!(
                "only one task may run per invocation (extra: '{}')",
                arg
            )));
        }
        task = Some(arg.parse::<Task>()?);
    }
    let task = task.ok_or_else(|| Error::Validation("no task given".to_string()))?;
    Ok((task, assignments))
}
