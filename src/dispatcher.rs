//! Test case dispatcher
//!
//! Runs one certification test case end to end:
//! - Assemble the invocation for the configured strategy
//! - Optionally route the tool's output into a per-test debug log
//! - Run the tool to completion
//! - Collect the claim file, whatever the outcome
//!
//! # Example
//!
//! ```no_run
//! use certsuite_harness::{Dispatcher, HarnessConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HarnessConfig::load("harness.yaml")?.with_env_overrides()?;
//!
//!     Dispatcher::new(&config)
//!         .launch(
//!             "lifecycle-pod-high-availability",
//!             "one_deployment_replicas_are_more_than_1",
//!             Path::new("/tmp/reports"),
//!             Path::new("/tmp/config"),
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::io::Write;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::artifacts::{ArtifactCollector, ClaimFileCollector, CollectGuard};
use crate::config::HarnessConfig;
use crate::launcher::{get_launcher, LaunchError, LaunchRequest, SuiteLauncher, ENV_LOG_LEVEL};
use crate::runner::{self, ExecutionResult, OutputSink, RunnerError};
use crate::suite::test_suite_name;

/// Dispatches test cases to the certification tool
pub struct Dispatcher<'a> {
    config: &'a HarnessConfig,
    launcher: Box<dyn SuiteLauncher>,
    collector: Box<dyn ArtifactCollector>,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher for the configured strategy
    pub fn new(config: &'a HarnessConfig) -> Self {
        Self {
            config,
            launcher: get_launcher(config),
            collector: Box::new(ClaimFileCollector),
        }
    }

    /// Replace the launch strategy
    pub fn with_launcher(mut self, launcher: impl SuiteLauncher + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    /// Replace the post-run artifact collector
    pub fn with_collector(mut self, collector: impl ArtifactCollector + 'static) -> Self {
        self.collector = Box::new(collector);
        self
    }

    /// Name of the active launch strategy
    pub fn strategy(&self) -> &'static str {
        self.launcher.name()
    }

    /// Run one test case
    ///
    /// Setup failures (missing binary, bad environment, debug log I/O) return
    /// before the tool starts and skip artifact collection. Once the tool
    /// starts, the claim file is collected exactly once whether it passes or
    /// not.
    ///
    /// # Panics
    ///
    /// With debug logs enabled, panics if `test_case` names no known suite.
    #[instrument(skip(self, report_dir, config_dir), fields(strategy = self.launcher.name()))]
    pub async fn launch(
        &self,
        test_case: &str,
        report_name: &str,
        report_dir: &Path,
        config_dir: &Path,
    ) -> Result<ExecutionResult, LaunchError> {
        let request = LaunchRequest {
            test_case,
            report_name,
            report_dir,
            config_dir,
        };

        let mut cmd = self.launcher.command(&request)?;

        let sink = if self.config.debug_tnf {
            cmd = cmd.env(ENV_LOG_LEVEL, "debug")?;
            self.open_debug_log(test_case, report_name)?
        } else {
            OutputSink::Capture
        };

        info!(command = %cmd, "Launching test case");

        let outcome = {
            let _collect =
                CollectGuard::new(self.collector.as_ref(), test_case, report_name, report_dir);
            runner::run(&cmd, sink).await
        };

        let failure = |reason: String| LaunchError::TestCaseFailed {
            test_case: test_case.to_string(),
            reason,
            command: cmd.to_string(),
        };

        match outcome {
            Ok(result) if result.passed() => {
                info!("Test case run completed");
                Ok(result)
            }
            Ok(result) => {
                warn!(status = %result.status_text(), "Test case run failed");
                if !result.stderr.is_empty() {
                    debug!(stderr = %result.stderr, "Tool stderr");
                }
                Err(failure(result.status_text()))
            }
            Err(RunnerError::CommandNotFound(program)) => {
                Err(failure(format!("executable not found: {program}")))
            }
            Err(RunnerError::ExecutionFailed(reason)) => Err(failure(reason)),
        }
    }

    /// Open the per-test debug log and write its header line
    fn open_debug_log(&self, test_case: &str, report_name: &str) -> Result<OutputSink, LaunchError> {
        let suite = test_suite_name(test_case);
        let path = self.config.log_file_path(suite, report_name);
        let log_err = |source: std::io::Error| LaunchError::DebugLog {
            path: path.clone(),
            source,
        };

        let mut file = self
            .config
            .create_log_file(suite, report_name)
            .map_err(log_err)?;
        writeln!(file, "Running test: {report_name}").map_err(log_err)?;
        file.flush().map_err(log_err)?;
        let stderr = file.try_clone().map_err(log_err)?;

        debug!(path = %path.display(), "Redirecting tool output to debug log");
        Ok(OutputSink::Redirect(file, stderr))
    }
}

/// Run one test case with the configured strategy
pub async fn launch_tests(
    config: &HarnessConfig,
    test_case: &str,
    report_name: &str,
    report_dir: &Path,
    config_dir: &Path,
) -> Result<ExecutionResult, LaunchError> {
    Dispatcher::new(config)
        .launch(test_case, report_name, report_dir, config_dir)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::CommandLine;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Runs an inline shell script instead of the real tool
    struct ShellLauncher(&'static str);

    impl SuiteLauncher for ShellLauncher {
        fn command(&self, _request: &LaunchRequest<'_>) -> Result<CommandLine, LaunchError> {
            Ok(CommandLine::new("sh").arg("-c").arg(self.0))
        }

        fn name(&self) -> &'static str {
            "shell"
        }
    }

    #[derive(Clone, Default)]
    struct CountingCollector(Arc<AtomicUsize>);

    impl CountingCollector {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl ArtifactCollector for CountingCollector {
        fn collect(&self, _: &str, _: &str, _: &Path) -> std::io::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    const TC: &str = "networking-icmpv4-connectivity";

    #[tokio::test]
    async fn test_success_collects_once() {
        let config = HarnessConfig::new("/repo");
        let collector = CountingCollector::default();
        let dispatcher = Dispatcher::new(&config)
            .with_launcher(ShellLauncher("echo ok"))
            .with_collector(collector.clone());

        let result = dispatcher
            .launch(TC, "ping", Path::new("/reports"), Path::new("/cfg"))
            .await
            .unwrap();

        assert!(result.passed());
        assert!(result.stdout.contains("ok"));
        assert_eq!(collector.count(), 1);
    }

    #[tokio::test]
    async fn test_failure_wraps_error_and_still_collects() {
        let config = HarnessConfig::new("/repo");
        let collector = CountingCollector::default();
        let dispatcher = Dispatcher::new(&config)
            .with_launcher(ShellLauncher("exit 1"))
            .with_collector(collector.clone());

        let err = dispatcher
            .launch(TC, "ping", Path::new("/reports"), Path::new("/cfg"))
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains(TC));
        assert!(msg.contains("exit status 1"));
        assert!(msg.contains("cmd: sh -c exit 1"));
        assert_eq!(collector.count(), 1);
    }

    #[tokio::test]
    async fn test_setup_failure_skips_collection() {
        let repo = TempDir::new().unwrap();
        let config = HarnessConfig::new(repo.path()).use_binary(true);
        let collector = CountingCollector::default();
        let dispatcher = Dispatcher::new(&config).with_collector(collector.clone());

        let err = dispatcher
            .launch(TC, "ping", Path::new("/reports"), Path::new("/cfg"))
            .await
            .unwrap_err();

        assert!(matches!(err, LaunchError::BinaryNotFound { .. }));
        assert_eq!(collector.count(), 0);
    }

    #[tokio::test]
    async fn test_debug_log_written() {
        let logs = TempDir::new().unwrap();
        let config = HarnessConfig::new("/repo").debug(true).log_dir(logs.path());
        let dispatcher = Dispatcher::new(&config)
            .with_launcher(ShellLauncher("echo tool-output; echo level=$TNF_LOG_LEVEL >&2"))
            .with_collector(CountingCollector::default());

        let result = dispatcher
            .launch(TC, "ping_test", Path::new("/reports"), Path::new("/cfg"))
            .await
            .unwrap();
        assert!(result.stdout.is_empty());

        let content =
            std::fs::read_to_string(logs.path().join("networking/ping_test.log")).unwrap();
        assert!(content.starts_with("Running test: ping_test\n"));
        assert!(content.contains("tool-output"));
        assert!(content.contains("level=debug"));
    }

    #[tokio::test]
    async fn test_debug_log_unwritable() {
        let logs = TempDir::new().unwrap();
        // A file where the suite directory should go
        std::fs::write(logs.path().join("networking"), "").unwrap();
        let config = HarnessConfig::new("/repo").debug(true).log_dir(logs.path());
        let collector = CountingCollector::default();
        let dispatcher = Dispatcher::new(&config)
            .with_launcher(ShellLauncher("true"))
            .with_collector(collector.clone());

        let err = dispatcher
            .launch(TC, "ping", Path::new("/reports"), Path::new("/cfg"))
            .await
            .unwrap_err();

        assert!(matches!(err, LaunchError::DebugLog { .. }));
        assert_eq!(collector.count(), 0);
    }

    #[tokio::test]
    #[should_panic(expected = "unable to retrieve test suite name")]
    async fn test_debug_unknown_suite_panics() {
        let logs = TempDir::new().unwrap();
        let config = HarnessConfig::new("/repo").debug(true).log_dir(logs.path());
        let dispatcher = Dispatcher::new(&config).with_launcher(ShellLauncher("true"));

        let _ = dispatcher
            .launch("mystery-check", "x", Path::new("/reports"), Path::new("/cfg"))
            .await;
    }

    #[test]
    fn test_strategy_follows_config() {
        let config = HarnessConfig::new("/repo").use_binary(true);
        assert_eq!(Dispatcher::new(&config).strategy(), "binary");
    }
}
