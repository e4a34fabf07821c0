use super::prompt;
use crate::error::RewriteError;
use crate::rewrite::RewriteService;
use crate::types::{AnalysisResult, Violation};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

const FENCE: &str = "```";

#[derive(Debug, Clone)]
pub struct FixOptions {
    /// Language named in the instructions; also selects the fence tag to strip
    pub language: String,
    /// Record instructions and responses for every rule group
    pub trace: bool,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            language: "Java".into(),
            trace: false,
        }
    }
}

/// A rule group whose fix was not applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRule {
    pub rule: String,
    pub reason: String,
}

/// Instructions and outcome of one rewrite call
#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry {
    pub rule: String,
    pub violations: usize,
    pub impacted_lines: Vec<u32>,
    pub started_at: DateTime<Utc>,
    pub system: String,
    pub task: String,
    /// Raw response, before fence stripping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone)]
pub struct FixOutcome {
    /// Final text after every successful group was applied
    pub text: String,
    /// Rules whose rewrite was applied, in processing order
    pub applied: Vec<String>,
    pub skipped: Vec<SkippedRule>,
    /// Empty unless tracing is enabled
    pub trace: Vec<TraceEntry>,
}

impl FixOutcome {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Group violations by rule, keeping first-seen rule order and report order within a group
pub fn group_by_rule(violations: &[Violation]) -> IndexMap<&str, Vec<&Violation>> {
    let mut groups: IndexMap<&str, Vec<&Violation>> = IndexMap::new();
    for violation in violations {
        groups
            .entry(violation.rule.as_str())
            .or_default()
            .push(violation);
    }
    groups
}

/// Union of the inclusive line ranges of every violation in a group, bounded by the
/// line count of the analyzed file
pub fn impacted_lines(violations: &[&Violation], line_count: u32) -> BTreeSet<u32> {
    violations
        .iter()
        .flat_map(|v| {
            let lines = v.lines();
            *lines.start()..=(*lines.end()).min(line_count)
        })
        .collect()
}

/// Fence tokens to strip for a language, longest first
pub fn fence_tokens(language: &str) -> Vec<String> {
    let tag = language.trim().to_lowercase();
    if tag.is_empty() {
        vec![FENCE.to_string()]
    } else {
        vec![format!("{}{}", FENCE, tag), FENCE.to_string()]
    }
}

/// Remove every occurrence of the fence tokens. When the text opened with a fence,
/// the remainder of that opening line is dropped as well if it is empty or a bare tag.
pub fn strip_code_fences(text: &str, tokens: &[String]) -> String {
    let opens_with_fence = tokens
        .iter()
        .any(|t| text.trim_start().starts_with(t.as_str()));

    let mut stripped = text.to_string();
    for token in tokens {
        stripped = stripped.replace(token.as_str(), "");
    }

    if opens_with_fence {
        if let Some(pos) = stripped.find('\n') {
            let first = stripped[..pos].trim();
            if first.is_empty() || is_info_string(first) {
                stripped.drain(..=pos);
            }
        }
    }
    stripped
}

/// A bare fence language tag such as `Java` or `c++`
fn is_info_string(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '#' | '.' | '_'))
}

/// Applies fixes rule group by rule group, each step working on the output of the previous one
pub struct CorrectionEngine<S> {
    service: S,
    options: FixOptions,
    fences: Vec<String>,
}

impl<S: RewriteService> CorrectionEngine<S> {
    pub fn new(service: S, options: FixOptions) -> Self {
        let fences = fence_tokens(&options.language);
        Self {
            service,
            options,
            fences,
        }
    }

    /// Correct `source` for the violations in `analysis`.
    ///
    /// A failing group is logged and skipped; the text it would have replaced is kept
    /// and the remaining groups still run.
    pub async fn correct(&self, source: &str, analysis: &AnalysisResult) -> FixOutcome {
        let groups = group_by_rule(&analysis.violations);
        let mut outcome = FixOutcome {
            text: source.to_string(),
            applied: Vec::new(),
            skipped: Vec::new(),
            trace: Vec::new(),
        };
        if groups.is_empty() {
            info!("No violations to fix");
            return outcome;
        }

        info!(
            "Fixing {} violations across {} rules",
            analysis.violations.len(),
            groups.len()
        );
        let system = prompt::system_directive(&self.options.language);
        let total = groups.len();
        let line_count = u32::try_from(source.lines().count()).unwrap_or(u32::MAX);

        for (i, (rule, violations)) in groups.iter().enumerate() {
            // Groups are never empty; the last violation stands in for the whole group
            let Some(representative) = violations.last() else {
                continue;
            };
            let lines = impacted_lines(violations, line_count);
            info!(
                "[{}/{}] Fixing {} violation(s) for rule '{}'",
                i + 1,
                total,
                violations.len(),
                rule
            );
            debug!("Impacted lines for '{}': {:?}", rule, lines);

            let task = prompt::task_directive(
                &self.options.language,
                rule,
                representative,
                &lines,
                &outcome.text,
            );
            trace!("Task for '{}': {}", rule, task);

            let started_at = Utc::now();
            let start = Instant::now();
            let result = self.rewrite_group(&system, &task).await;
            let elapsed_secs = start.elapsed().as_secs_f64();

            let (response, error) = match result {
                Ok((raw, fixed)) => {
                    debug!("Rule '{}' fixed ({:.2}s)", rule, elapsed_secs);
                    outcome.text = fixed;
                    outcome.applied.push(rule.to_string());
                    (Some(raw), None)
                }
                Err(e) => {
                    warn!("Skipping rule '{}': {}", rule, e);
                    outcome.skipped.push(SkippedRule {
                        rule: rule.to_string(),
                        reason: e.to_string(),
                    });
                    (None, Some(e.to_string()))
                }
            };

            if self.options.trace {
                outcome.trace.push(TraceEntry {
                    rule: rule.to_string(),
                    violations: violations.len(),
                    impacted_lines: lines.into_iter().collect(),
                    started_at,
                    system: system.clone(),
                    task,
                    response,
                    error,
                    elapsed_secs,
                });
            }
        }

        outcome
    }

    /// Returns the raw response and the fence-stripped text
    async fn rewrite_group(&self, system: &str, task: &str) -> Result<(String, String), RewriteError> {
        let raw = self.service.rewrite(system, task).await?;
        let fixed = strip_code_fences(&raw, &self.fences);
        if fixed.trim().is_empty() {
            return Err(RewriteError::EmptyResponse);
        }
        Ok((raw, fixed))
    }
}
