//! Harness configuration
//!
//! `HarnessConfig` describes where the certification tool lives and how to run
//! it. Build it programmatically, parse it from YAML, or both: YAML first, then
//! environment overrides on top.
//!
//! # Example
//!
//! ```
//! use certsuite_harness::config::{HarnessConfig, LaunchStrategy};
//!
//! let config = HarnessConfig::new("/opt/certsuite")
//!     .use_binary(true)
//!     .debug(true)
//!     .log_dir("/tmp/certsuite-logs");
//!
//! assert_eq!(config.strategy(), LaunchStrategy::Binary);
//! assert_eq!(config.binary_path().to_str(), Some("/opt/certsuite/certsuite"));
//!
//! let yaml = r#"
//! tnf_repo_path: /opt/certsuite
//! tnf_image_tag: v5.0.0
//! "#;
//! let config: HarnessConfig = yaml.parse().unwrap();
//! assert_eq!(config.image_ref(), "quay.io/testnetworkfunction/cnf-certification-test:v5.0.0");
//! ```

use serde::Deserialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file name the tool reads from the test config directory
pub const DEFAULT_TNF_CONFIG_FILE_NAME: &str = "tnf_config.yml";

/// Claim file name the tool writes into the report directory
pub const DEFAULT_CLAIM_FILE_NAME: &str = "claim.json";

/// JUnit report name the tool writes into the report directory
pub const DEFAULT_JUNIT_FILE_NAME: &str = "cnf-certification-tests_junit.xml";

const DEFAULT_ENTRY_POINT_BINARY: &str = "certsuite";
const DEFAULT_ENTRY_POINT_SCRIPT: &str = "run-tnf-container.sh";
const DEFAULT_CONTAINER_ENGINE: &str = "docker";
const DEFAULT_TNF_IMAGE: &str = "quay.io/testnetworkfunction/cnf-certification-test";
const DEFAULT_TNF_IMAGE_TAG: &str = "unstable";
const DEFAULT_LOG_DIR: &str = "debug-logs";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// How the certification tool is executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LaunchStrategy {
    /// Run the compiled tool from the repo directly
    Binary,
    /// Run the repo's wrapper script, which drives the container image
    #[default]
    Image,
}

/// Harness configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Checkout of the certification tool repository
    pub tnf_repo_path: PathBuf,

    /// Binary name, relative to the repo path
    pub tnf_entry_point_binary: String,

    /// Container wrapper script name, relative to the repo path
    pub tnf_entry_point_script: String,

    /// Run the local binary instead of the container image
    pub use_binary: bool,

    /// Container engine handed to the wrapper script (docker, podman)
    pub container_engine: String,

    /// Certification tool image
    pub tnf_image: String,

    /// Certification tool image tag
    pub tnf_image_tag: String,

    /// Directory holding the container registry auth `config`
    pub docker_config_dir: PathBuf,

    /// Kubeconfig for the image strategy; falls back to `KUBECONFIG`
    pub kubeconfig: Option<PathBuf>,

    /// Keep the tool's output in per-test log files
    pub debug_tnf: bool,

    /// Root of the per-test debug logs
    pub log_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let docker_config_dir = std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".docker"))
            .unwrap_or_else(|| PathBuf::from(".docker"));

        Self {
            tnf_repo_path: PathBuf::from("."),
            tnf_entry_point_binary: DEFAULT_ENTRY_POINT_BINARY.to_string(),
            tnf_entry_point_script: DEFAULT_ENTRY_POINT_SCRIPT.to_string(),
            use_binary: false,
            container_engine: DEFAULT_CONTAINER_ENGINE.to_string(),
            tnf_image: DEFAULT_TNF_IMAGE.to_string(),
            tnf_image_tag: DEFAULT_TNF_IMAGE_TAG.to_string(),
            docker_config_dir,
            kubeconfig: None,
            debug_tnf: false,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl HarnessConfig {
    /// Create a config for a tool checkout with default settings
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            tnf_repo_path: repo_path.into(),
            ..Self::default()
        }
    }

    /// Load a YAML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    ///
    /// Recognized keys: `TNF_REPO_PATH`, `TNF_ENTRY_POINT_BINARY`,
    /// `TNF_ENTRY_POINT_SCRIPT`, `USE_BINARY`, `CONTAINER_ENGINE`, `TNF_IMAGE`,
    /// `TNF_IMAGE_TAG`, `DOCKER_CONFIG_DIR`, `KUBECONFIG`, `DEBUG_TNF`,
    /// `TNF_LOG_DIR`. Empty values are ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("TNF_REPO_PATH") {
            self.tnf_repo_path = PathBuf::from(v);
        }
        if let Some(v) = get("TNF_ENTRY_POINT_BINARY") {
            self.tnf_entry_point_binary = v;
        }
        if let Some(v) = get("TNF_ENTRY_POINT_SCRIPT") {
            self.tnf_entry_point_script = v;
        }
        if let Some(v) = get("USE_BINARY") {
            self.use_binary = parse_bool("USE_BINARY", &v)?;
        }
        if let Some(v) = get("CONTAINER_ENGINE") {
            self.container_engine = v;
        }
        if let Some(v) = get("TNF_IMAGE") {
            self.tnf_image = v;
        }
        if let Some(v) = get("TNF_IMAGE_TAG") {
            self.tnf_image_tag = v;
        }
        if let Some(v) = get("DOCKER_CONFIG_DIR") {
            self.docker_config_dir = PathBuf::from(v);
        }
        if let Some(v) = get("KUBECONFIG") {
            self.kubeconfig = Some(PathBuf::from(v));
        }
        if let Some(v) = get("DEBUG_TNF") {
            self.debug_tnf = parse_bool("DEBUG_TNF", &v)?;
        }
        if let Some(v) = get("TNF_LOG_DIR") {
            self.log_dir = PathBuf::from(v);
        }

        Ok(self)
    }

    /// Select binary or image execution
    pub fn use_binary(mut self, use_binary: bool) -> Self {
        self.use_binary = use_binary;
        self
    }

    /// Set the binary name
    pub fn entry_point_binary(mut self, name: impl Into<String>) -> Self {
        self.tnf_entry_point_binary = name.into();
        self
    }

    /// Set the wrapper script name
    pub fn entry_point_script(mut self, name: impl Into<String>) -> Self {
        self.tnf_entry_point_script = name.into();
        self
    }

    /// Set the container engine
    pub fn container_engine(mut self, engine: impl Into<String>) -> Self {
        self.container_engine = engine.into();
        self
    }

    /// Set the image and tag
    pub fn image(mut self, image: impl Into<String>, tag: impl Into<String>) -> Self {
        self.tnf_image = image.into();
        self.tnf_image_tag = tag.into();
        self
    }

    /// Set the registry auth directory
    pub fn docker_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.docker_config_dir = dir.into();
        self
    }

    /// Set the kubeconfig path
    pub fn kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    /// Enable or disable debug logs
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug_tnf = debug;
        self
    }

    /// Set the debug log directory
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Execution strategy selected by `use_binary`
    pub fn strategy(&self) -> LaunchStrategy {
        if self.use_binary {
            LaunchStrategy::Binary
        } else {
            LaunchStrategy::Image
        }
    }

    /// Full path of the tool binary
    pub fn binary_path(&self) -> PathBuf {
        self.tnf_repo_path.join(&self.tnf_entry_point_binary)
    }

    /// Image reference in `image:tag` form
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.tnf_image, self.tnf_image_tag)
    }

    /// Registry auth file handed to the wrapper script
    pub fn docker_config_file(&self) -> PathBuf {
        self.docker_config_dir.join("config")
    }

    /// Kubeconfig from the config, else from `KUBECONFIG`
    pub fn kubeconfig_path(&self) -> Option<PathBuf> {
        self.kubeconfig.clone().or_else(|| {
            std::env::var_os("KUBECONFIG")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
    }

    /// Path of the debug log for one test run
    pub fn log_file_path(&self, suite: &str, report_name: &str) -> PathBuf {
        self.log_dir.join(suite).join(format!("{report_name}.log"))
    }

    /// Create (truncating) the debug log for one test run
    pub fn create_log_file(&self, suite: &str, report_name: &str) -> std::io::Result<File> {
        let path = self.log_file_path(suite, report_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        File::create(path)
    }
}

impl FromStr for HarnessConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_yaml::from_str(s)?)
    }
}

/// Location of the tool config file inside a test config directory
pub fn tnf_config_file(config_dir: &Path) -> PathBuf {
    config_dir.join(DEFAULT_TNF_CONFIG_FILE_NAME)
}

/// Location of the claim file inside a report directory
pub fn claim_file_path(report_dir: &Path) -> PathBuf {
    report_dir.join(DEFAULT_CLAIM_FILE_NAME)
}

/// Location of the JUnit report inside a report directory
pub fn junit_report_path(report_dir: &Path) -> PathBuf {
    report_dir.join(DEFAULT_JUNIT_FILE_NAME)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::new("/repo");

        assert_eq!(config.tnf_repo_path, PathBuf::from("/repo"));
        assert_eq!(config.tnf_entry_point_binary, "certsuite");
        assert_eq!(config.tnf_entry_point_script, "run-tnf-container.sh");
        assert_eq!(config.container_engine, "docker");
        assert_eq!(config.strategy(), LaunchStrategy::Image);
        assert!(!config.debug_tnf);
    }

    #[test]
    fn test_builder() {
        let config = HarnessConfig::new("/repo")
            .use_binary(true)
            .entry_point_binary("tnf")
            .container_engine("podman")
            .image("registry.local/tnf", "v1")
            .docker_config_dir("/auth")
            .kubeconfig("/kube/config")
            .debug(true)
            .log_dir("/logs");

        assert_eq!(config.strategy(), LaunchStrategy::Binary);
        assert_eq!(config.binary_path(), PathBuf::from("/repo/tnf"));
        assert_eq!(config.image_ref(), "registry.local/tnf:v1");
        assert_eq!(config.docker_config_file(), PathBuf::from("/auth/config"));
        assert_eq!(config.kubeconfig_path(), Some(PathBuf::from("/kube/config")));
        assert_eq!(
            config.log_file_path("lifecycle", "my_test"),
            PathBuf::from("/logs/lifecycle/my_test.log")
        );
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
tnf_repo_path: /home/user/certsuite
use_binary: true
container_engine: podman
debug_tnf: true
log_dir: /var/log/certsuite
"#;
        let config: HarnessConfig = yaml.parse().unwrap();

        assert_eq!(config.tnf_repo_path, PathBuf::from("/home/user/certsuite"));
        assert!(config.use_binary);
        assert_eq!(config.container_engine, "podman");
        assert!(config.debug_tnf);
        // Unset fields keep their defaults
        assert_eq!(config.tnf_image_tag, "unstable");
    }

    #[test]
    fn test_parse_yaml_invalid() {
        let result: Result<HarnessConfig, _> = "use_binary: [1, 2]".parse();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = HarnessConfig::load("/nonexistent/harness.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/harness.yaml"));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("harness.yaml");
        fs::write(&path, "tnf_repo_path: /opt/tnf\ntnf_image_tag: v4.2\n").unwrap();

        let config = HarnessConfig::load(&path).unwrap();
        assert_eq!(config.tnf_repo_path, PathBuf::from("/opt/tnf"));
        assert_eq!(config.tnf_image_tag, "v4.2");
    }

    #[test]
    fn test_overrides() {
        let config = HarnessConfig::new("/repo")
            .with_overrides_from(lookup(&[
                ("TNF_REPO_PATH", "/other"),
                ("USE_BINARY", "TRUE"),
                ("DEBUG_TNF", "yes"),
                ("CONTAINER_ENGINE", "podman"),
                ("TNF_IMAGE_TAG", "v9"),
                ("KUBECONFIG", "/kc"),
                ("TNF_LOG_DIR", ""),
            ]))
            .unwrap();

        assert_eq!(config.tnf_repo_path, PathBuf::from("/other"));
        assert!(config.use_binary);
        assert!(config.debug_tnf);
        assert_eq!(config.container_engine, "podman");
        assert_eq!(config.tnf_image_tag, "v9");
        assert_eq!(config.kubeconfig, Some(PathBuf::from("/kc")));
        // Empty values are ignored
        assert_eq!(config.log_dir, PathBuf::from("debug-logs"));
    }

    #[test]
    fn test_overrides_invalid_bool() {
        let err = HarnessConfig::new("/repo")
            .with_overrides_from(lookup(&[("DEBUG_TNF", "maybe")]))
            .unwrap_err();

        match err {
            ConfigError::InvalidValue { key, value } => {
                assert_eq!(key, "DEBUG_TNF");
                assert_eq!(value, "maybe");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_create_log_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = HarnessConfig::new("/repo").log_dir(dir.path());

        config.create_log_file("networking", "ping_test").unwrap();
        assert!(dir.path().join("networking/ping_test.log").exists());
    }

    #[test]
    fn test_report_paths() {
        let dir = Path::new("/reports");
        assert_eq!(claim_file_path(dir), PathBuf::from("/reports/claim.json"));
        assert_eq!(
            junit_report_path(dir),
            PathBuf::from("/reports/cnf-certification-tests_junit.xml")
        );
        assert_eq!(
            tnf_config_file(Path::new("/cfg")),
            PathBuf::from("/cfg/tnf_config.yml")
        );
    }
}
