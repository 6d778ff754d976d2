//! certsuite-harness - verification harness for the CNF certification suite
//!
//! Drives the certification tool against a cluster one test case at a time,
//! either as a local binary or through its container wrapper script, and
//! keeps each run's claim file for later inspection.
//!
//! # Example (Rust)
//!
//! ```no_run
//! use certsuite_harness::{launch_tests, HarnessConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     certsuite_harness::telemetry::init_logging();
//!
//!     let config = HarnessConfig::new("/opt/certsuite")
//!         .use_binary(true)
//!         .with_env_overrides()?;
//!
//!     launch_tests(
//!         &config,
//!         "lifecycle-pod-high-availability",
//!         "one_deployment_replicas_are_more_than_1",
//!         Path::new("/tmp/reports"),
//!         Path::new("/tmp/config"),
//!     )
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Run one test case
//! certsuite-harness launch --config harness.yaml \
//!     --test-case lifecycle-pod-high-availability \
//!     --report-dir /tmp/reports --config-dir /tmp/config
//!
//! # Show which suite a test case belongs to
//! certsuite-harness suite affiliated-certification-operator-is-certified
//! ```

pub mod artifacts;
pub mod config;
pub mod dispatcher;
pub mod launcher;
pub mod runner;
pub mod suite;
pub mod telemetry;

// Re-export commonly used types
pub use artifacts::{ArtifactCollector, ClaimFileCollector};
pub use config::{ConfigError, HarnessConfig, LaunchStrategy};
pub use dispatcher::{launch_tests, Dispatcher};
pub use launcher::{get_launcher, BinaryLauncher, CommandLine, ImageLauncher, LaunchError, SuiteLauncher};
pub use runner::ExecutionResult;
pub use suite::{report_file_name, test_suite_name, TestSuite, UnknownSuiteError};
