use crate::fix::{FixOutcome, TraceEntry};
use crate::types::AnalysisResult;
use indexmap::IndexMap;

const ELAPSED_TIME_PRECISION: usize = 2;

/// Short summary: producer, timestamp, totals by severity and tool errors
pub fn format_summary(result: &AnalysisResult) -> String {
    let mut output = format!(
        "Analysis results from {} {}\nTimestamp: {}\nTotal violations found: {}\n",
        result.tool_name,
        result.tool_version,
        result.timestamp,
        result.violations.len()
    );
    let counts = result.severity_counts();
    if !counts.is_empty() {
        output.push_str("Violations by severity:\n");
        for (severity, count) in counts {
            output.push_str(&format!("  {}: {}\n", severity, count));
        }
    }
    if !result.errors.is_empty() {
        output.push_str(&format!("Tool errors ({}):\n", result.errors.len()));
        for error in &result.errors {
            output.push_str(&format!("  - {}\n", error));
        }
    }
    output.trim_end().to_string()
}

/// Markdown report of violations grouped by file, then by rule
pub fn format_analysis_markdown(result: &AnalysisResult) -> String {
    let mut output = format!(
        "# {} {} report\n\n**Timestamp:** {}\n\n",
        result.tool_name, result.tool_version, result.timestamp
    );
    if result.is_clean() {
        output.push_str("No violations found\n");
    }

    let mut by_file: IndexMap<&str, IndexMap<&str, Vec<_>>> = IndexMap::new();
    for v in &result.violations {
        by_file
            .entry(v.file_path.as_str())
            .or_default()
            .entry(v.rule.as_str())
            .or_default()
            .push(v);
    }

    for (file, rules) in by_file {
        output.push_str(&format!("## Violations in {}\n\n", file));
        for (rule, violations) in rules {
            output.push_str(&format!("### Rule: {}\n\n", rule));
            for v in &violations {
                output.push_str(&format!(
                    "- Lines {}-{} [{}]: {}\n",
                    v.line_start,
                    v.line_end,
                    v.severity,
                    v.description.trim()
                ));
            }
            if let Some(url) = violations.iter().find_map(|v| v.url.as_deref()) {
                output.push_str(&format!("\n**Docs:** {}\n", url));
            }
            output.push('\n');
        }
    }

    if !result.errors.is_empty() {
        output.push_str("## Tool errors\n\n");
        for error in &result.errors {
            output.push_str(&format!("- {}\n", error));
        }
    }
    output.trim_end().to_string()
}

/// One line per applied or skipped rule
pub fn format_fix_summary(outcome: &FixOutcome) -> String {
    let mut output = format!(
        "Rules fixed: {}, rules skipped: {}",
        outcome.applied.len(),
        outcome.skipped.len()
    );
    for rule in &outcome.applied {
        output.push_str(&format!("\n  fixed: {}", rule));
    }
    for skipped in &outcome.skipped {
        output.push_str(&format!("\n  skipped: {} ({})", skipped.rule, skipped.reason));
    }
    output
}

/// Format trace entries as Markdown with the instructions and response of every rule group
pub fn format_trace_markdown(traces: &[TraceEntry]) -> String {
    let mut output = String::new();
    for (i, trace) in traces.iter().enumerate() {
        output.push_str(&format!("# Rule {}: {}\n\n", i + 1, trace.rule));
        output.push_str(&format!(
            "**Violations:** {}\n\n**Impacted lines:** {:?}\n\n**Started:** {}\n\n**Elapsed:** {:.prec$}s\n\n",
            trace.violations,
            trace.impacted_lines,
            trace.started_at.to_rfc3339(),
            trace.elapsed_secs,
            prec = ELAPSED_TIME_PRECISION
        ));

        for (title, content) in [("System", &trace.system), ("Task", &trace.task)] {
            let backticks = get_fence_backticks(content);
            output.push_str(&format!(
                "## {}\n\n{}markdown\n{}\n{}\n\n",
                title,
                backticks,
                content.trim(),
                backticks
            ));
        }

        match (&trace.response, &trace.error) {
            (Some(response), _) => {
                let backticks = get_fence_backticks(response);
                output.push_str(&format!(
                    "## Response\n\n{}\n{}\n{}\n\n",
                    backticks,
                    response.trim(),
                    backticks
                ));
            }
            (None, Some(error)) => {
                output.push_str(&format!("## Error\n\n{}\n\n", error));
            }
            (None, None) => {}
        }
        output.push_str("---\n\n");
    }
    output
}

/// Get appropriate number of backticks for Markdown code fence
/// Returns at least 3 backticks, or more if content contains backtick sequences
fn get_fence_backticks(content: &str) -> String {
    const MIN_BACKTICKS: usize = 3;
    let max_backticks = content
        .as_bytes()
        .split(|&b| b != b'`')
        .filter(|s| !s.is_empty())
        .map(|s| s.len())
        .max()
        .unwrap_or(0);
    "`".repeat((max_backticks + 1).max(MIN_BACKTICKS))
}
