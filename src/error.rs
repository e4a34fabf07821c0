use std::path::PathBuf;
use thiserror::Error;

/// Failures turning an analyzer report into an `AnalysisResult`
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report file not found: {path}")]
    ReportNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid report format: {0}")]
    ReportMalformed(String),
    /// Well-formed document that does not match the expected schema.
    /// `field` names the missing key when the parser can tell.
    #[error("Report schema violation: {detail}")]
    ReportSchemaViolation {
        field: Option<String>,
        detail: String,
    },
    #[error("Unsupported tool: {tool}. Supported tools: {supported}")]
    UnsupportedTool { tool: String, supported: String },
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Failed to launch analyzer: {0}")]
    Launch(#[source] std::io::Error),
    #[error("Analyzer timed out after {0} seconds")]
    Timeout(u64),
    #[error("{tool} failed with {status} and wrote no report: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("Failed to remove stale report {path}: {source}")]
    StaleReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Failures of a single rewrite call; recovered per rule group
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Request to rewrite service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Rewrite service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid response from rewrite service: {0}")]
    InvalidResponse(String),
    #[error("Rewrite service returned an empty response")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum FixError {
    #[error("Failed to read {path}: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config override '{0}': expected key.path=value")]
    Override(String),
}
