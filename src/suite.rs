//! Test suite classification
//!
//! Every certification test case belongs to one logical suite. The suite is
//! recovered from the test case identifier by substring match against a fixed,
//! ordered list of suite names. The first match wins, so the order below is
//! the tie-break for identifiers that contain more than one suite name
//! (`affiliated-certification-operator-is-certified` is an affiliated
//! certification test, not an operator test).
//!
//! # Example
//!
//! ```
//! use certsuite_harness::suite::{test_suite_name, TestSuite};
//!
//! assert_eq!(test_suite_name("lifecycle-pod-high-availability"), "lifecycle");
//! assert_eq!(
//!     TestSuite::classify("networking-icmpv4-connectivity").unwrap(),
//!     TestSuite::Networking
//! );
//! ```

use std::fmt;

/// Logical grouping of certification test cases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestSuite {
    Networking,
    AffiliatedCertification,
    Lifecycle,
    PlatformAlteration,
    Observability,
    AccessControl,
    Performance,
    Manageability,
    Operator,
}

/// Suites in scan order
const SCAN_ORDER: [TestSuite; 9] = [
    TestSuite::Networking,
    TestSuite::AffiliatedCertification,
    TestSuite::Lifecycle,
    TestSuite::PlatformAlteration,
    TestSuite::Observability,
    TestSuite::AccessControl,
    TestSuite::Performance,
    TestSuite::Manageability,
    TestSuite::Operator,
];

/// Returned when a test case identifier names no known suite
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unable to retrieve test suite name from test case name {test_case}")]
pub struct UnknownSuiteError {
    pub test_case: String,
}

impl TestSuite {
    /// All suites, in the order they are matched
    pub fn all() -> &'static [TestSuite] {
        &SCAN_ORDER
    }

    /// Suite name as it appears inside test case identifiers
    pub fn as_str(&self) -> &'static str {
        match self {
            TestSuite::Networking => "networking",
            TestSuite::AffiliatedCertification => "affiliated-certification",
            TestSuite::Lifecycle => "lifecycle",
            TestSuite::PlatformAlteration => "platform-alteration",
            TestSuite::Observability => "observability",
            TestSuite::AccessControl => "access-control",
            TestSuite::Performance => "performance",
            TestSuite::Manageability => "manageability",
            TestSuite::Operator => "operator",
        }
    }

    /// Classify a test case identifier
    pub fn classify(test_case: &str) -> Result<TestSuite, UnknownSuiteError> {
        SCAN_ORDER
            .iter()
            .copied()
            .find(|suite| test_case.contains(suite.as_str()))
            .ok_or_else(|| UnknownSuiteError {
                test_case: test_case.to_string(),
            })
    }
}

impl fmt::Display for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suite name for a test case identifier
///
/// # Panics
///
/// Panics if the identifier contains no known suite name. Every test case the
/// harness launches is expected to be classifiable; one that is not is a bug
/// in the caller.
pub fn test_suite_name(test_case: &str) -> &'static str {
    match TestSuite::classify(test_case) {
        Ok(suite) => suite.as_str(),
        Err(e) => panic!("{e}"),
    }
}

/// Convert a human readable test description into a file name
///
/// Lowercases the text and collapses every run of non-alphanumeric characters
/// into a single `_`. Leading and trailing separators are dropped.
///
/// ```
/// use certsuite_harness::suite::report_file_name;
///
/// assert_eq!(
///     report_file_name("One deployment, replicas are more than 1 [negative]"),
///     "one_deployment_replicas_are_more_than_1_negative"
/// );
/// ```
pub fn report_file_name(description: &str) -> String {
    let mut out = String::with_capacity(description.len());
    let mut pending_sep = false;

    for c in description.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    out
}
