use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Normalized severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Blocker,
    Critical,
    Major,
    Minor,
    Info,
    Unknown,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Blocker,
        Severity::Critical,
        Severity::Major,
        Severity::Minor,
        Severity::Info,
        Severity::Unknown,
    ];

    /// Map an analyzer priority (1 = highest) to a severity. Never fails.
    pub fn from_priority(priority: i64) -> Self {
        match priority {
            1 => Severity::Blocker,
            2 => Severity::Critical,
            3 => Severity::Major,
            4 => Severity::Minor,
            5 => Severity::Info,
            _ => Severity::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Blocker => "BLOCKER",
            Severity::Critical => "CRITICAL",
            Severity::Major => "MAJOR",
            Severity::Minor => "MINOR",
            Severity::Info => "INFO",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single analyzer finding with file location and line range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// File path as reported by the analyzer
    pub file_path: String,
    /// Start line (1-indexed)
    pub line_start: u32,
    /// End line (inclusive)
    pub line_end: u32,
    /// Start column (1-indexed)
    pub column_start: u32,
    /// End column (inclusive)
    pub column_end: u32,
    /// Rule identifier, used as the grouping key when fixing
    pub rule: String,
    /// Ruleset or category of the rule
    pub category: String,
    /// Remediation guidance
    pub description: String,
    pub severity: Severity,
    /// Link to the rule documentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Violation {
    pub fn is_well_formed(&self) -> bool {
        self.line_start <= self.line_end
    }

    pub fn lines(&self) -> RangeInclusive<u32> {
        self.line_start..=self.line_end
    }
}

/// Outcome of one analyzer run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub tool_name: String,
    pub tool_version: String,
    /// Report generation time, passed through as reported
    pub timestamp: String,
    /// Violations in report order
    pub violations: Vec<Violation>,
    /// Tool-level configuration and processing errors
    pub errors: Vec<String>,
}

impl AnalysisResult {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violation counts per severity, most severe first, omitting zero counts
    pub fn severity_counts(&self) -> Vec<(Severity, usize)> {
        Severity::ALL
            .iter()
            .map(|s| (*s, self.violations.iter().filter(|v| v.severity == *s).count()))
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}
