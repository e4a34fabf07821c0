use crate::config::ToolConfig;
use crate::error::AnalyzerError;
use crate::report::{self, ToolKind};
use crate::types::AnalysisResult;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, trace};

/// Runs a static analyzer through a templated shell command and normalizes its report
pub struct Analyzer {
    tool: ToolKind,
    command: String,
    report_file: PathBuf,
    timeout_secs: u64,
}

impl Analyzer {
    pub fn new(tool: ToolKind, config: &ToolConfig) -> Self {
        Self {
            tool,
            command: config.command.clone(),
            report_file: PathBuf::from(&config.report_file),
            timeout_secs: config.timeout_secs,
        }
    }

    /// Analyze one file and return the normalized result
    pub async fn analyze(&self, input_file: &Path) -> Result<AnalysisResult, AnalyzerError> {
        // A leftover report from a previous run must not be mistaken for this one
        if self.report_file.exists() {
            debug!("Removing stale report {}", self.report_file.display());
            tokio::fs::remove_file(&self.report_file)
                .await
                .map_err(|source| AnalyzerError::StaleReport {
                    path: self.report_file.clone(),
                    source,
                })?;
        }

        let cmd = render_command(&self.command, input_file, &self.report_file);
        info!("Running {} on {}", self.tool.display_name(), input_file.display());
        debug!("Analyzer command: {}", cmd);

        #[cfg(windows)]
        let mut command = {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&cmd);
            c
        };
        #[cfg(not(windows))]
        let mut command = {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&cmd);
            c
        };
        command.kill_on_drop(true);

        let output = tokio::time::timeout(Duration::from_secs(self.timeout_secs), command.output())
            .await
            .map_err(|_| AnalyzerError::Timeout(self.timeout_secs))?
            .map_err(AnalyzerError::Launch)?;

        trace!("Analyzer stdout: {}", String::from_utf8_lossy(&output.stdout));
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr.is_empty() {
            debug!("Analyzer stderr: {}", stderr);
        }

        // PMD exits non-zero when it finds violations, so the status alone is not an error
        if !output.status.success() {
            if !self.report_file.exists() {
                return Err(AnalyzerError::Failed {
                    tool: self.tool.display_name().to_string(),
                    status: output.status.to_string(),
                    stderr,
                });
            }
            debug!(
                "{} exited with status {}",
                self.tool.display_name(),
                output.status
            );
        }

        Ok(report::parse_report_file(self.tool, &self.report_file).await?)
    }
}

/// Substitute `{input_file}` and `{report_file}` in a command template
fn render_command(template: &str, input_file: &Path, report_file: &Path) -> String {
    template
        .replace("{input_file}", &input_file.to_string_lossy())
        .replace("{report_file}", &report_file.to_string_lossy())
}
