//! Launch strategies for the certification tool
//!
//! The tool can run two ways:
//! - Binary: the compiled tool from the repo checkout, run directly
//! - Image: the repo's wrapper script, which pulls and runs the tool image
//!
//! Each strategy only knows how to assemble a [`CommandLine`]. Running it,
//! capturing output and collecting artifacts is the dispatcher's job.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{HarnessConfig, LaunchStrategy};

mod binary;
mod image;

pub use binary::BinaryLauncher;
pub use image::ImageLauncher;

/// Disables zipping of the tool's artifacts
pub const ENV_OMIT_ARTIFACTS_ZIP_FILE: &str = "TNF_OMIT_ARTIFACTS_ZIP_FILE";

/// Enables the tool's data collector
pub const ENV_ENABLE_DATA_COLLECTION: &str = "TNF_ENABLE_DATA_COLLECTION";

/// Container engine used by the wrapper script
pub const ENV_CONTAINER_CLIENT: &str = "TNF_CONTAINER_CLIENT";

/// Tool log level, raised to debug when debug logs are on
pub const ENV_LOG_LEVEL: &str = "TNF_LOG_LEVEL";

/// Error type for launch operations
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error(
        "binary does not exist: {path}: {source}. \
         Please run `make build-certsuite-tool` in the certsuite repo"
    )]
    BinaryNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to set {name}: {reason}")]
    Environment { name: String, reason: String },

    #[error("failed to write to debug file {path}: {source}")]
    DebugLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run tc: {test_case}, err: {reason}, cmd: {command}")]
    TestCaseFailed {
        test_case: String,
        reason: String,
        command: String,
    },
}

/// One test case launch
#[derive(Debug, Clone, Copy)]
pub struct LaunchRequest<'a> {
    /// Test case identifier, passed to the tool as the label filter
    pub test_case: &'a str,
    /// Name used for the debug log and the per-test result folder
    pub report_name: &'a str,
    /// Where the tool writes its reports
    pub report_dir: &'a Path,
    /// Where the tool reads its config from
    pub config_dir: &'a Path,
}

/// A fully assembled process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    pub current_dir: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add a flag followed by its value
    pub fn flag(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    /// Set an environment variable for the child
    ///
    /// Rejects names and values the OS cannot carry.
    pub fn env(mut self, key: &str, value: impl Into<String>) -> Result<Self, LaunchError> {
        let value = value.into();
        if key.is_empty() || key.contains('=') || key.contains('\0') {
            return Err(LaunchError::Environment {
                name: key.to_string(),
                reason: "invalid variable name".to_string(),
            });
        }
        if value.contains('\0') {
            return Err(LaunchError::Environment {
                name: key.to_string(),
                reason: "value contains a NUL byte".to_string(),
            });
        }
        self.envs.retain(|(k, _)| k != key);
        self.envs.push((key.to_string(), value));
        Ok(self)
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Value of an environment variable set on this command
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.envs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Build the process command
    ///
    /// A relative program is resolved against `current_dir` only. The
    /// directory is made absolute first so a relative repo path is not
    /// applied a second time after the child changes into it.
    pub fn to_command(&self) -> tokio::process::Command {
        let dir = self.current_dir.as_deref().map(absolute_dir);

        let program = match &dir {
            Some(dir) if self.program.is_relative() => dir.join(&self.program),
            _ => self.program.clone(),
        };

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(&self.args);
        cmd.envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Absolute form of a directory, falling back to the input when it cannot be
/// resolved (the spawn then reports the missing path)
fn absolute_dir(dir: &Path) -> PathBuf {
    dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf())
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Trait for launch strategies
pub trait SuiteLauncher: Send + Sync {
    /// Assemble the invocation for one test case
    fn command(&self, request: &LaunchRequest<'_>) -> Result<CommandLine, LaunchError>;

    /// Strategy name for display
    fn name(&self) -> &'static str;
}

/// Get the launcher for the configured strategy
pub fn get_launcher(config: &HarnessConfig) -> Box<dyn SuiteLauncher> {
    match config.strategy() {
        LaunchStrategy::Binary => Box::new(BinaryLauncher::new(config)),
        LaunchStrategy::Image => Box::new(ImageLauncher::new(config)),
    }
}

/// Variables both strategies hand to the tool
fn with_common_env(cmd: CommandLine) -> Result<CommandLine, LaunchError> {
    cmd.env(ENV_OMIT_ARTIFACTS_ZIP_FILE, "true")?
        .env(ENV_ENABLE_DATA_COLLECTION, "true")
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
