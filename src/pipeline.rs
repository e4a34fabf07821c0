use crate::analyzer::Analyzer;
use crate::cli::{CheckArgs, FixArgs, InitArgs};
use crate::config::Config;
use crate::fix::{self, CorrectionEngine, FixOptions, FixOutcome, TraceEntry};
use crate::render;
use crate::report::ToolKind;
use crate::rewrite::{OpenAiRewriter, RewriteService};
use crate::types::AnalysisResult;
use anyhow::{Context, bail};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Write the default config file
pub fn init(args: &InitArgs) -> anyhow::Result<()> {
    let path = Path::new(&args.config);
    if path.exists() && !args.r#override {
        bail!(
            "Config file {} already exists, use --override to replace it",
            args.config
        );
    }
    std::fs::write(path, Config::default().to_toml()?)
        .with_context(|| format!("Failed to write {}", args.config))?;
    info!("Config written to {}", args.config);
    Ok(())
}

/// Analyze a file and report its violations
pub async fn check(args: &CheckArgs) -> anyhow::Result<()> {
    let config = Config::load(&args.config, &args.config_overrides)?;
    let tool: ToolKind = args.tool.parse()?;
    let input = validate_input(&args.input)?;

    let analyzer = Analyzer::new(tool, config.analyzer.tool(tool));
    let analysis = analyzer.analyze(&input).await?;
    log_lines(&render::format_summary(&analysis));

    if let Some(output) = &args.output {
        write_output(output, &analysis)?;
    }
    Ok(())
}

/// Analyze, correct, persist and optionally verify a file.
///
/// Skipped rules are logged but do not make the run fail.
pub async fn fix(args: &FixArgs) -> anyhow::Result<()> {
    let config = Config::load(&args.config, &args.config_overrides)?;
    let tool: ToolKind = args.tool.parse()?;
    let input = validate_input(&args.input)?;
    let output = args
        .output
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| fix::default_output_path(&input));
    validate_output(&input, &output)?;
    debug!("Input: {}, output: {}", input.display(), output.display());

    let analyzer = Analyzer::new(tool, config.analyzer.tool(tool));
    let rewriter = OpenAiRewriter::new(&config.llm, &args.api_key)?;
    let options = FixOptions {
        language: config.fix.language.clone(),
        trace: args.trace.is_some(),
    };
    let engine = CorrectionEngine::new(rewriter, options);

    let run = FixRun {
        input: &input,
        output: &output,
        trace: args.trace.as_deref(),
        verify: config.fix.verify && !args.no_verify,
    };
    let report = run.execute(&analyzer, &engine).await?;
    if let Some(residual) = &report.residual {
        info!(
            "{} of {} violations remain, {} rules fixed",
            residual.violations.len(),
            report.analysis.violations.len(),
            report.outcome.applied.len()
        );
    }
    Ok(())
}

/// Paths and switches of one `fix` invocation
struct FixRun<'a> {
    input: &'a Path,
    output: &'a Path,
    trace: Option<&'a str>,
    verify: bool,
}

/// What a `fix` run produced
struct FixReport {
    analysis: AnalysisResult,
    outcome: FixOutcome,
    /// Analysis of the written output, when verification ran
    residual: Option<AnalysisResult>,
}

impl FixRun<'_> {
    async fn execute<S: RewriteService>(
        &self,
        analyzer: &Analyzer,
        engine: &CorrectionEngine<S>,
    ) -> anyhow::Result<FixReport> {
        info!("Checking {} for violations", self.input.display());
        let analysis = analyzer.analyze(self.input).await?;
        log_lines(&render::format_summary(&analysis));

        let outcome = fix::fix_file(engine, self.input, self.output, &analysis).await?;

        log_lines(&render::format_fix_summary(&outcome));
        if !outcome.is_complete() {
            let skipped: Vec<&str> = outcome.skipped.iter().map(|s| s.rule.as_str()).collect();
            warn!("Skipped rules: {}", skipped.join(", "));
        }

        if let Some(trace_path) = self.trace {
            write_trace(trace_path, &outcome.trace)?;
        }

        let residual = if self.verify {
            info!("Checking {} for remaining violations", self.output.display());
            let residual = analyzer.analyze(self.output).await?;
            log_lines(&render::format_summary(&residual));
            Some(residual)
        } else {
            None
        };

        Ok(FixReport {
            analysis,
            outcome,
            residual,
        })
    }
}

fn validate_input(input: &str) -> anyhow::Result<PathBuf> {
    let path = std::fs::canonicalize(input)
        .with_context(|| format!("Input file {} does not exist", input))?;
    if !path.is_file() {
        bail!("Input path {} is not a file", input);
    }
    Ok(path)
}

/// The corrected copy must never replace the file it was made from
fn validate_output(input: &Path, output: &Path) -> anyhow::Result<()> {
    if std::fs::canonicalize(output).is_ok_and(|p| p == input) {
        bail!(
            "Output path {} is the input file, choose another --output",
            output.display()
        );
    }
    Ok(())
}

fn log_lines(text: &str) {
    for line in text.lines() {
        info!("{}", line);
    }
}

fn write_output(path: &str, analysis: &AnalysisResult) -> anyhow::Result<()> {
    let content = if path.ends_with(".json") {
        serde_json::to_string_pretty(analysis)?
    } else if path.ends_with(".md") {
        render::format_analysis_markdown(analysis)
    } else {
        bail!("Output file must end with .md or .json");
    };

    std::fs::write(path, content).with_context(|| format!("Failed to write output file {}", path))?;
    info!("Results written to {}", path);
    Ok(())
}

/// Write trace data to file in JSON or Markdown format
fn write_trace(path: &str, traces: &[TraceEntry]) -> anyhow::Result<()> {
    let content = if path.ends_with(".json") {
        serde_json::to_string_pretty(traces)?
    } else if path.ends_with(".md") {
        render::format_trace_markdown(traces)
    } else {
        bail!("Trace file must end with .md or .json");
    };

    std::fs::write(path, content).with_context(|| format!("Failed to write trace file {}", path))?;
    info!("Trace written to {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolConfig;
    use crate::error::RewriteError;
    use crate::fix::engine::tests::ScriptedService;
    use crate::types::fixtures::{analysis, violation};

    const SOURCE: &str = "import java.util.List;\nimport java.util.Map;\nclass Foo {}\n";

    /// Workspace with `Foo.java` and an analyzer that copies a canned two-rule report
    #[cfg(unix)]
    fn workspace() -> (tempfile::TempDir, PathBuf, Analyzer) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Foo.java");
        std::fs::write(&input, SOURCE).unwrap();
        let canned = dir.path().join("canned.json");
        std::fs::write(
            &canned,
            r#"{"pmdVersion":"7.0.0","timestamp":"t","files":[{"filename":"Foo.java","violations":[
                {"beginline":1,"begincolumn":1,"endline":1,"endcolumn":22,"description":"Unused import","rule":"UnusedImports","ruleset":"Best Practices","priority":4},
                {"beginline":3,"begincolumn":1,"endline":3,"endcolumn":12,"description":"Missing comment","rule":"CommentRequired","ruleset":"Documentation","priority":3}]}]}"#,
        )
        .unwrap();
        let config = ToolConfig {
            command: format!("cp {} {{report_file}}; exit 4", canned.display()),
            report_file: dir.path().join("violations.json").to_string_lossy().into_owned(),
            timeout_secs: 10,
        };
        let analyzer = Analyzer::new(ToolKind::Pmd, &config);
        (dir, input, analyzer)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fix_run_persists_and_verifies() {
        let (dir, input, analyzer) = workspace();
        let output = dir.path().join("Foo.fixed.java");
        let trace = dir.path().join("trace.json");
        let service = ScriptedService::new(|_, current| Ok(format!("```java\n{}```", current)));
        let options = FixOptions {
            trace: true,
            ..FixOptions::default()
        };
        let engine = CorrectionEngine::new(service, options);

        let run = FixRun {
            input: &input,
            output: &output,
            trace: Some(trace.to_str().unwrap()),
            verify: true,
        };
        let report = run.execute(&analyzer, &engine).await.unwrap();

        assert_eq!(report.analysis.violations.len(), 2);
        assert_eq!(report.outcome.applied, vec!["UnusedImports", "CommentRequired"]);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), SOURCE);
        assert_eq!(report.residual.unwrap().violations.len(), 2);
        let traces: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&trace).unwrap()).unwrap();
        assert_eq!(traces.as_array().unwrap().len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fix_run_without_verification() {
        let (dir, input, analyzer) = workspace();
        let output = dir.path().join("Foo.fixed.java");
        let service = ScriptedService::new(|_, current| Ok(current.to_string()));
        let engine = CorrectionEngine::new(service, FixOptions::default());

        let run = FixRun {
            input: &input,
            output: &output,
            trace: None,
            verify: false,
        };
        let report = run.execute(&analyzer, &engine).await.unwrap();
        assert!(report.residual.is_none());
        assert!(output.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fix_run_succeeds_with_skipped_rules() {
        let (dir, input, analyzer) = workspace();
        let output = dir.path().join("Foo.fixed.java");
        let service = ScriptedService::new(|index, current| match index {
            0 => Err(RewriteError::EmptyResponse),
            _ => Ok(current.replace("class Foo", "/** Foo */\nclass Foo")),
        });
        let engine = CorrectionEngine::new(service, FixOptions::default());

        let run = FixRun {
            input: &input,
            output: &output,
            trace: None,
            verify: false,
        };
        let report = run.execute(&analyzer, &engine).await.unwrap();

        assert!(!report.outcome.is_complete());
        assert_eq!(report.outcome.skipped[0].rule, "UnusedImports");
        assert_eq!(report.outcome.applied, vec!["CommentRequired"]);
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("import java.util.List;"));
        assert!(written.contains("/** Foo */\nclass Foo {}"));
    }

    #[test]
    fn test_validate_output_rejects_input() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Foo.java");
        std::fs::write(&file, "class Foo {}").unwrap();
        let input = std::fs::canonicalize(&file).unwrap();

        assert!(validate_output(&input, &file).is_err());
        assert!(validate_output(&input, &dir.path().join("Foo.fixed.java")).is_ok());
    }

    #[test]
    fn test_validate_input() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Foo.java");
        std::fs::write(&file, "class Foo {}").unwrap();

        assert!(validate_input(file.to_str().unwrap()).is_ok());
        assert!(validate_input(dir.path().to_str().unwrap()).is_err());
        assert!(validate_input(dir.path().join("nope.java").to_str().unwrap()).is_err());
    }

    #[test]
    fn test_write_output_formats() {
        let dir = tempfile::tempdir().unwrap();
        let result = analysis(vec![violation("UnusedImports", 3, 3)]);

        let json_path = dir.path().join("report.json");
        write_output(json_path.to_str().unwrap(), &result).unwrap();
        let parsed: AnalysisResult =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed, result);

        let md_path = dir.path().join("report.md");
        write_output(md_path.to_str().unwrap(), &result).unwrap();
        assert!(std::fs::read_to_string(&md_path).unwrap().contains("### Rule: UnusedImports"));

        assert!(write_output(dir.path().join("report.txt").to_str().unwrap(), &result).is_err());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lintmend.toml");
        let args = InitArgs {
            config: path.to_string_lossy().into_owned(),
            r#override: false,
        };
        init(&args).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("pmd check"));
        assert!(init(&args).is_err());

        let args = InitArgs {
            r#override: true,
            ..args
        };
        assert!(init(&args).is_ok());
    }
}
