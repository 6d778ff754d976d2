//! Image launch strategy
//!
//! Runs the wrapper script from the repo checkout. The script pulls the tool
//! image and runs it with the selected container engine.

use std::path::PathBuf;
use tracing::debug;

use super::{
    path_arg, with_common_env, CommandLine, LaunchError, LaunchRequest, SuiteLauncher,
    ENV_CONTAINER_CLIENT,
};
use crate::config::HarnessConfig;

/// Image launch strategy
pub struct ImageLauncher {
    repo: PathBuf,
    script: String,
    container_engine: String,
    image_ref: String,
    docker_config_file: PathBuf,
    kubeconfig: Option<PathBuf>,
}

impl ImageLauncher {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            repo: config.tnf_repo_path.clone(),
            script: config.tnf_entry_point_script.clone(),
            container_engine: config.container_engine.clone(),
            image_ref: config.image_ref(),
            docker_config_file: config.docker_config_file(),
            kubeconfig: config.kubeconfig_path(),
        }
    }
}

impl SuiteLauncher for ImageLauncher {
    fn command(&self, request: &LaunchRequest<'_>) -> Result<CommandLine, LaunchError> {
        debug!(engine = %self.container_engine, "Selected container engine");

        if self.container_engine.is_empty() {
            return Err(LaunchError::Environment {
                name: ENV_CONTAINER_CLIENT.to_string(),
                reason: "no container engine configured".to_string(),
            });
        }

        let kubeconfig = self.kubeconfig.as_deref().ok_or_else(|| LaunchError::Environment {
            name: "KUBECONFIG".to_string(),
            reason: "no kubeconfig found; set `kubeconfig` in the harness config \
                     or export KUBECONFIG"
                .to_string(),
        })?;

        let cmd = CommandLine::new(format!("./{}", self.script))
            .current_dir(&self.repo)
            .flag("-k", path_arg(kubeconfig))
            .flag("-c", path_arg(&self.docker_config_file))
            .flag("-t", path_arg(request.config_dir))
            .flag("-o", path_arg(request.report_dir))
            .flag("-i", self.image_ref.as_str())
            .flag("-l", request.test_case)
            .env(ENV_CONTAINER_CLIENT, self.container_engine.as_str())?;

        with_common_env(cmd)
    }

    fn name(&self) -> &'static str {
        "image"
    }
}
