use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::cleanup::check_artifact_path;
use crate::{dlog_debug, Error, Result};

pub const CONFIG_FILE: &str = "devtask.toml";

pub const PYTHON: &str = "PYTHON";
pub const PYTEST: &str = "PYTEST";

const DEFAULT_PYTHON: &str = "python3";
const DEFAULT_PYTEST: &str = "pytest";

/// Project configuration read from `devtask.toml`.
///
/// Every field is optional in the file. The tool bindings stay `None`
/// unless the file sets them so that resolution can tell a configured
/// value apart from the built-in default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub python: Option<String>,
    pub pytest: Option<String>,
    /// Package directory under test, relative to the project root.
    pub package: String,
    pub coverage: CoverageConfig,
    pub docs: DocsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            python: None,
            pytest: None,
            package: "pyformlang".to_string(),
            coverage: CoverageConfig::default(),
            docs: DocsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    pub data_file: PathBuf,
    pub report_dir: PathBuf,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(".coverage"),
            report_dir: PathBuf::from("htmlcov"),
        }
    }
}

/// The documentation subproject and the dispatcher it ships with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    pub dir: PathBuf,
    pub dispatcher: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("doc"),
            dispatcher: "make".to_string(),
        }
    }
}

impl Config {
    pub fn default_path(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE)
    }

    /// Load the config at `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        dlog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            dlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::read(path)
    }

    /// Load a config file the user named explicitly. A missing file is an
    /// error here, not a reason to fall back to defaults.
    pub fn load_required(path: &Path) -> Result<Self> {
        dlog_debug!("Config::load_required path={}", path.display());
        if !path.exists() {
            return Err(Error::Validation(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Self::read(path)
    }

    fn read(path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        dlog_debug!(
            "Config loaded: package={}, docs={}, dispatcher={}",
            config.package,
            config.docs.dir.display(),
            config.docs.dispatcher
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.package.trim().is_empty() {
            return Err(Error::Validation("package cannot be empty".to_string()));
        }
        if self.docs.dispatcher.trim().is_empty() {
            return Err(Error::Validation(
                "docs.dispatcher cannot be empty".to_string(),
            ));
        }
        if self.docs.dir.as_os_str().is_empty() {
            return Err(Error::Validation("docs.dir cannot be empty".to_string()));
        }
        // Both paths are deleted by `clean`; they must stay below the root.
        check_artifact_path(&self.coverage.data_file)?;
        check_artifact_path(&self.coverage.report_dir)?;
        Ok(())
    }
}

/// Where a binding's value came from, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingSource {
    CommandLine,
    Environment,
    ConfigFile,
    Default,
}

impl std::fmt::Display for BindingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingSource::CommandLine => write!(f, "command line"),
            BindingSource::Environment => write!(f, "environment"),
            BindingSource::ConfigFile => write!(f, "config file"),
            BindingSource::Default => write!(f, "default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub name: &'static str,
    pub value: String,
    pub source: BindingSource,
}

/// A `NAME=VALUE` override given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub value: String,
}

impl FromStr for Assignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((name, value)) if !name.is_empty() => Ok(Self {
                name: name.to_string(),
                value: value.to_string(),
            }),
            _ => Err(Error::InvalidAssignment(s.to_string())),
        }
    }
}

impl Assignment {
    pub fn is_assignment(arg: &str) -> bool {
        arg.split_once('=').is_some_and(|(name, _)| !name.is_empty())
    }
}

/// The resolved tool bindings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bindings {
    pub python: Binding,
    pub pytest: Binding,
}

impl Bindings {
    /// Resolve both bindings. Precedence: command line, then `env`, then
    /// the config file, then the literal default. A supplied value always
    /// wins, even when empty; nothing checks that the executable exists.
    /// An environment value that is not valid UTF-8 is rejected rather
    /// than skipped.
    pub fn resolve<F>(config: &Config, env: F, assignments: &[Assignment]) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if let Some(bad) = assignments
            .iter()
            .find(|a| a.name != PYTHON && a.name != PYTEST)
        {
            return Err(Error::Validation(format!(
                "unknown binding '{}' (expected {} or {})",
                bad.name, PYTHON, PYTEST
            )));
        }

        let bindings = Self {
            python: resolve_one(PYTHON, &config.python, DEFAULT_PYTHON, &env, assignments)?,
            pytest: resolve_one(PYTEST, &config.pytest, DEFAULT_PYTEST, &env, assignments)?,
        };
        dlog_debug!(
            "Bindings resolved: {}={:?} ({}), {}={:?} ({})",
            PYTHON,
            bindings.python.value,
            bindings.python.source,
            PYTEST,
            bindings.pytest.value,
            bindings.pytest.source
        );
        Ok(bindings)
    }

    /// Resolve against the real process environment.
    pub fn from_env(config: &Config, assignments: &[Assignment]) -> Result<Self> {
        Self::resolve(config, |name| std::env::var_os(name), assignments)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        [&self.python, &self.pytest].into_iter()
    }
}

fn resolve_one<F>(
    name: &'static str,
    configured: &Option<String>,
    default: &str,
    env: &F,
    assignments: &[Assignment],
) -> Result<Binding>
where
    F: Fn(&str) -> Option<OsString>,
{
    // Last assignment wins, as with repeated make variables.
    if let Some(a) = assignments.iter().rev().find(|a| a.name == name) {
        return Ok(Binding {
            name,
            value: a.value.clone(),
            source: BindingSource::CommandLine,
        });
    }
    if let Some(raw) = env(name) {
        let value = raw
            .into_string()
            .map_err(|_| Error::Validation(format!("{} is not valid UTF-8", name)))?;
        return Ok(Binding {
            name,
            value,
            source: BindingSource::Environment,
        });
    }
    Ok(match configured {
        Some(value) => Binding {
            name,
            value: value.clone(),
            source: BindingSource::ConfigFile,
        },
        None => Binding {
            name,
            value: default.to_string(),
            source: BindingSource::Default,
        },
    })
}
