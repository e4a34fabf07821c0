pub mod pmd;

use crate::error::ReportError;
use crate::types::AnalysisResult;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Analyzers whose reports can be normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Pmd,
}

impl ToolKind {
    pub const SUPPORTED: [ToolKind; 1] = [ToolKind::Pmd];

    /// Key used on the command line and in config
    pub fn key(&self) -> &'static str {
        match self {
            ToolKind::Pmd => "pmd",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ToolKind::Pmd => "PMD",
        }
    }
}

impl FromStr for ToolKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::SUPPORTED
            .into_iter()
            .find(|tool| tool.key() == wanted)
            .ok_or_else(|| ReportError::UnsupportedTool {
                tool: s.to_string(),
                supported: Self::SUPPORTED
                    .iter()
                    .map(|t| t.key())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Normalize a report in the tool's native format
pub fn parse_report(tool: ToolKind, content: &str) -> Result<AnalysisResult, ReportError> {
    match tool {
        ToolKind::Pmd => pmd::parse(content),
    }
}

/// Read and normalize a report file
pub async fn parse_report_file(tool: ToolKind, path: &Path) -> Result<AnalysisResult, ReportError> {
    debug!("Reading {} report from {}", tool.display_name(), path.display());
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ReportError::ReportNotFound {
            path: path.to_path_buf(),
            source,
        })?;
    parse_report(tool, &content)
}
