//! Binary launch strategy
//!
//! Runs the compiled tool from the repo checkout.

use std::path::PathBuf;
use tracing::debug;

use super::{path_arg, with_common_env, CommandLine, LaunchError, LaunchRequest, SuiteLauncher};
use crate::config::{tnf_config_file, HarnessConfig};

/// Binary launch strategy
pub struct BinaryLauncher {
    binary: PathBuf,
}

impl BinaryLauncher {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            binary: config.binary_path(),
        }
    }
}

impl SuiteLauncher for BinaryLauncher {
    fn command(&self, request: &LaunchRequest<'_>) -> Result<CommandLine, LaunchError> {
        if let Err(source) = std::fs::metadata(&self.binary) {
            debug!(binary = %self.binary.display(), error = %source, "Tool binary missing");
            return Err(LaunchError::BinaryNotFound {
                path: self.binary.clone(),
                source,
            });
        }

        let cmd = CommandLine::new(&self.binary)
            .arg("run")
            .flag("--config-file", path_arg(&tnf_config_file(request.config_dir)))
            .flag("--output-dir", path_arg(request.report_dir))
            .flag("--label-filter", request.test_case);

        with_common_env(cmd)
    }

    fn name(&self) -> &'static str {
        "binary"
    }
}
