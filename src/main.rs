use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use devtask::config::CONFIG_FILE;
use devtask::process::{locate, split_command};
use devtask::{
    dlog, dlog_error, parse_invocation, Assignment, Bindings, Config, DispatchOptions, Dispatcher,
    Result, Task,
};

/// devtask - run the development tasks of a Python package
#[derive(Parser, Debug)]
#[command(name = "devtask")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "TASKS:\n    test-code, test-coverage, doc, clean\n\n\
ENVIRONMENT:\n    PYTHON=<cmd>        Python interpreter (default: python3)\n    \
PYTEST=<cmd>        Test runner (default: pytest)\n    \
DEVTASK_DEBUG=1     Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Project root (default: current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Config file (default: <root>/devtask.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the steps without executing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Do not echo steps before running them
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Enable debug logging (writes to ~/.devtask/devtask.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Task to run, plus NAME=VALUE binding overrides
    #[arg(value_name = "TASK [NAME=VALUE]...")]
    pub args: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the available tasks
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how PYTHON and PYTEST resolve
    Bindings {
        /// Print as JSON
        #[arg(long)]
        json: bool,

        /// NAME=VALUE overrides to apply
        #[arg(value_name = "NAME=VALUE")]
        assignments: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    devtask::log::init(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            dlog_error!("devtask failed: {}", e);
            // The tool has already said why it failed.
            if !e.is_tool_failure() {
                eprintln!("devtask: {}", e);
            }
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = match &cli.directory {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| Config::default_path(&root));
    // Only the implicit devtask.toml may be absent.
    let explicit_config = cli.config.is_some();
    let load_config = || {
        if explicit_config {
            Config::load_required(&config_path)
        } else {
            Config::load(&config_path)
        }
    };

    match cli.command {
        Some(Command::List { json }) => run_list(json),
        Some(Command::Bindings { json, assignments }) => {
            let config = load_config()?;
            let assignments = assignments
                .iter()
                .map(|a| a.parse())
                .collect::<Result<Vec<Assignment>>>()?;
            run_bindings(&config, &assignments, json)
        }
        None => {
            let (task, assignments) = parse_invocation(&cli.args)?;
            dlog!(
                "Invocation: task={} root={} config={}",
                task,
                root.display(),
                config_path.display()
            );
            let config = load_config()?;
            let bindings = Bindings::from_env(&config, &assignments)?;
            let options = DispatchOptions {
                dry_run: cli.dry_run,
                echo: !cli.quiet,
            };
            Dispatcher::new(&root, config, bindings, options).run(task)
        }
    }
}

fn run_list(json: bool) -> Result<()> {
    if json {
        let tasks: Vec<_> = Task::ALL
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "phony": t.is_phony(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    for task in Task::ALL {
        let marker = if task.is_phony() { " (phony)" } else { "" };
        println!(
            "  {:<22}{}",
            format!("{}{}", task.name(), marker),
            task.description()
        );
    }
    Ok(())
}

fn run_bindings(config: &Config, assignments: &[Assignment], json: bool) -> Result<()> {
    let bindings = Bindings::from_env(config, assignments)?;

    if json {
        let entries: Vec<_> = bindings
            .iter()
            .map(|b| {
                let (program, _) = split_command(&b.value);
                serde_json::json!({
                    "name": b.name,
                    "value": b.value,
                    "source": b.source,
                    "path": locate(&program),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for b in bindings.iter() {
        let (program, _) = split_command(&b.value);
        let location = match locate(&program) {
            Some(path) => path.display().to_string(),
            None => "not found on PATH".to_string(),
        };
        println!("{} = {:?}  [{}]  {}", b.name, b.value, b.source, location);
    }
    println!();
    println!("Overrides: NAME=VALUE argument > environment > {} > default", CONFIG_FILE);
    Ok(())
}
