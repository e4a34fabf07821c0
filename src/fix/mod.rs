pub mod engine;
mod prompt;

pub use engine::{CorrectionEngine, FixOptions, FixOutcome, TraceEntry};

use crate::error::FixError;
use crate::rewrite::RewriteService;
use crate::types::AnalysisResult;
use std::path::{Path, PathBuf};
use tracing::info;

/// `dir/Foo.java` -> `dir/Foo.fixed.java`; `dir/Foo` -> `dir/Foo.fixed`
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}.fixed.{}", stem, ext.to_string_lossy()),
        None => format!("{}.fixed", stem),
    };
    input.with_file_name(name)
}

/// Read `input`, correct it and write the result to `output`.
///
/// The output is written even when some rule groups were skipped.
pub async fn fix_file<S: RewriteService>(
    engine: &CorrectionEngine<S>,
    input: &Path,
    output: &Path,
    analysis: &AnalysisResult,
) -> Result<FixOutcome, FixError> {
    let source = tokio::fs::read_to_string(input)
        .await
        .map_err(|source| FixError::ReadInput {
            path: input.to_path_buf(),
            source,
        })?;

    let outcome = engine.correct(&source, analysis).await;

    let persist_err = |source| FixError::Persist {
        path: output.to_path_buf(),
        source,
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(persist_err)?;
    }
    tokio::fs::write(output, &outcome.text)
        .await
        .map_err(persist_err)?;
    info!("Fixed file written to {}", output.display());

    Ok(outcome)
}
