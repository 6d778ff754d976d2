//! Post-run artifact collection
//!
//! The tool writes its claim file into the shared report directory, so each
//! run overwrites the previous one. After every run the claim is copied into
//! a folder owned by that test case:
//!
//! ```text
//! <report_dir>/claim.json  ->  <report_dir>/<test_case>/<report_name>/claim.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{claim_file_path, DEFAULT_CLAIM_FILE_NAME};

/// Collects report artifacts after a run
pub trait ArtifactCollector: Send + Sync {
    fn collect(&self, test_case: &str, report_name: &str, report_dir: &Path) -> std::io::Result<()>;
}

/// Copies the claim file into the per-test-case folder
#[derive(Debug, Default, Clone, Copy)]
pub struct ClaimFileCollector;

impl ArtifactCollector for ClaimFileCollector {
    fn collect(&self, test_case: &str, report_name: &str, report_dir: &Path) -> std::io::Result<()> {
        let src = claim_file_path(report_dir);
        let dst_dir = test_case_result_dir(report_dir, test_case, report_name);
        fs::create_dir_all(&dst_dir)?;

        let dst = dst_dir.join(DEFAULT_CLAIM_FILE_NAME);
        fs::copy(&src, &dst)?;

        debug!(src = %src.display(), dst = %dst.display(), "Copied claim file");
        Ok(())
    }
}

/// Folder holding one test case's collected artifacts
pub fn test_case_result_dir(report_dir: &Path, test_case: &str, report_name: &str) -> PathBuf {
    report_dir.join(test_case).join(report_name)
}

/// Runs the collector when dropped
///
/// Armed right before the process starts, so collection happens however the
/// run ends, including an early return or panic on the way out.
pub(crate) struct CollectGuard<'a> {
    collector: &'a dyn ArtifactCollector,
    test_case: &'a str,
    report_name: &'a str,
    report_dir: &'a Path,
}

impl<'a> CollectGuard<'a> {
    pub(crate) fn new(
        collector: &'a dyn ArtifactCollector,
        test_case: &'a str,
        report_name: &'a str,
        report_dir: &'a Path,
    ) -> Self {
        Self {
            collector,
            test_case,
            report_name,
            report_dir,
        }
    }
}

impl Drop for CollectGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self
            .collector
            .collect(self.test_case, self.report_name, self.report_dir)
        {
            warn!(
                test_case = %self.test_case,
                report_dir = %self.report_dir.display(),
                error = %e,
                "Failed to collect artifacts"
            );
        }
    }
}
