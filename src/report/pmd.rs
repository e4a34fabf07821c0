//! PMD JSON report adapter (`pmd check -f json`).

use crate::error::ReportError;
use crate::types::{AnalysisResult, Severity, Violation};
use serde::Deserialize;
use serde_json::error::Category;
use tracing::{debug, warn};

const TOOL_NAME: &str = "PMD";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PmdReport {
    pmd_version: String,
    timestamp: String,
    files: Vec<PmdFile>,
    #[serde(default)]
    configuration_errors: Vec<PmdConfigurationError>,
    #[serde(default)]
    processing_errors: Vec<PmdProcessingError>,
}

#[derive(Deserialize)]
struct PmdFile {
    filename: String,
    violations: Vec<PmdViolation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PmdViolation {
    beginline: u32,
    begincolumn: u32,
    endline: u32,
    endcolumn: u32,
    description: String,
    rule: String,
    ruleset: String,
    priority: i64,
    #[serde(default)]
    external_info_url: Option<String>,
}

#[derive(Deserialize)]
struct PmdConfigurationError {
    rule: String,
    message: String,
}

/// PMD 6 emits plain strings, PMD 7 emits `{filename, message, ...}`
#[derive(Deserialize)]
#[serde(untagged)]
enum PmdProcessingError {
    Message(String),
    Detail { filename: String, message: String },
}

impl PmdProcessingError {
    fn render(self) -> String {
        match self {
            PmdProcessingError::Message(message) => message,
            PmdProcessingError::Detail { filename, message } => {
                format!("{}: {}", filename, message)
            }
        }
    }
}

pub fn parse(content: &str) -> Result<AnalysisResult, ReportError> {
    let report: PmdReport = serde_json::from_str(content).map_err(classify_error)?;

    let mut errors: Vec<String> = report
        .configuration_errors
        .into_iter()
        .map(|e| format!("Configuration Error - {}: {}", e.rule, e.message))
        .collect();
    errors.extend(report.processing_errors.into_iter().map(PmdProcessingError::render));

    let mut violations = Vec::new();
    for file in report.files {
        for v in file.violations {
            let violation = Violation {
                file_path: file.filename.clone(),
                line_start: v.beginline,
                line_end: v.endline,
                column_start: v.begincolumn,
                column_end: v.endcolumn,
                rule: v.rule,
                category: v.ruleset,
                description: v.description,
                severity: Severity::from_priority(v.priority),
                url: v.external_info_url,
            };
            if !violation.is_well_formed() {
                warn!(
                    "Skipping violation of rule '{}' in {}: end line {} before start line {}",
                    violation.rule, violation.file_path, violation.line_end, violation.line_start
                );
                continue;
            }
            violations.push(violation);
        }
    }
    debug!(
        "Parsed {} violations and {} errors from {} {}",
        violations.len(),
        errors.len(),
        TOOL_NAME,
        report.pmd_version
    );

    Ok(AnalysisResult {
        tool_name: TOOL_NAME.to_string(),
        tool_version: report.pmd_version,
        timestamp: report.timestamp,
        violations,
        errors,
    })
}

fn classify_error(err: serde_json::Error) -> ReportError {
    match err.classify() {
        Category::Data => {
            let detail = err.to_string();
            ReportError::ReportSchemaViolation {
                field: missing_field(&detail),
                detail,
            }
        }
        Category::Syntax | Category::Eof | Category::Io => {
            ReportError::ReportMalformed(err.to_string())
        }
    }
}

/// Extract `x` from serde's "missing field `x`" message
fn missing_field(message: &str) -> Option<String> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"{
  "formatVersion": 0,
  "pmdVersion": "7.0.0",
  "timestamp": "2024-03-01T10:00:00.000+01:00",
  "files": [
    {
      "filename": "src/Foo.java",
      "violations": [
        {
          "beginline": 3, "begincolumn": 1, "endline": 3, "endcolumn": 24,
          "description": "Unused import 'java.util.List'",
          "rule": "UnusedImports", "ruleset": "Best Practices", "priority": 4,
          "externalInfoUrl": "https://docs.pmd-code.org/latest/pmd_rules_java_bestpractices.html#unusedimports"
        },
        {
          "beginline": 10, "begincolumn": 5, "endline": 12, "endcolumn": 6,
          "description": "Avoid empty catch blocks",
          "rule": "EmptyCatchBlock", "ruleset": "Error Prone", "priority": 3
        }
      ]
    },
    {
      "filename": "src/Bar.java",
      "violations": [
        {
          "beginline": 1, "begincolumn": 1, "endline": 1, "endcolumn": 5,
          "description": "Custom priority",
          "rule": "Custom", "ruleset": "Custom", "priority": 9
        }
      ]
    }
  ],
  "configurationErrors": [ { "rule": "LoosePackageCoupling", "message": "No packages configured" } ],
  "processingErrors": [ "Error while parsing Baz.java" ]
}"#;

    #[test]
    fn test_parse_maps_all_violations_in_order() {
        let result = parse(REPORT).unwrap();
        assert_eq!(result.tool_name, "PMD");
        assert_eq!(result.tool_version, "7.0.0");
        assert_eq!(result.timestamp, "2024-03-01T10:00:00.000+01:00");
        assert_eq!(result.violations.len(), 3);

        let rules: Vec<_> = result.violations.iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(rules, vec!["UnusedImports", "EmptyCatchBlock", "Custom"]);

        let first = &result.violations[0];
        assert_eq!(first.file_path, "src/Foo.java");
        assert_eq!((first.line_start, first.line_end), (3, 3));
        assert_eq!((first.column_start, first.column_end), (1, 24));
        assert_eq!(first.category, "Best Practices");
        assert_eq!(first.severity, Severity::Minor);
        assert!(first.url.as_deref().unwrap().ends_with("#unusedimports"));

        assert_eq!(result.violations[1].severity, Severity::Major);
        assert_eq!(result.violations[1].url, None);
        assert_eq!(result.violations[2].file_path, "src/Bar.java");
        assert_eq!(result.violations[2].severity, Severity::Unknown);
    }

    #[test]
    fn test_parse_collects_tool_errors() {
        let result = parse(REPORT).unwrap();
        assert_eq!(
            result.errors,
            vec![
                "Configuration Error - LoosePackageCoupling: No packages configured".to_string(),
                "Error while parsing Baz.java".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_processing_error_objects() {
        let report = r#"{"pmdVersion":"7.1.0","timestamp":"t","files":[],
            "processingErrors":[{"filename":"Baz.java","message":"ParseException","detail":"..."}]}"#;
        let result = parse(report).unwrap();
        assert_eq!(result.errors, vec!["Baz.java: ParseException".to_string()]);
    }

    #[test]
    fn test_parse_clean_report() {
        let result = parse(r#"{"pmdVersion":"7.0.0","timestamp":"t","files":[]}"#).unwrap();
        assert!(result.is_clean());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = parse(r#"{"pmdVersion": "7.0.0", "files": ["#).unwrap_err();
        assert!(matches!(err, ReportError::ReportMalformed(_)));
        let err = parse("not json").unwrap_err();
        assert!(matches!(err, ReportError::ReportMalformed(_)));
    }

    #[test]
    fn test_parse_missing_top_level_field() {
        let err = parse(r#"{"timestamp":"t","files":[]}"#).unwrap_err();
        match err {
            ReportError::ReportSchemaViolation { field, .. } => {
                assert_eq!(field.as_deref(), Some("pmdVersion"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_missing_violation_field() {
        let report = r#"{"pmdVersion":"7.0.0","timestamp":"t","files":[{"filename":"A.java",
            "violations":[{"begincolumn":1,"endline":1,"endcolumn":2,"description":"d",
            "rule":"R","ruleset":"S","priority":1}]}]}"#;
        match parse(report).unwrap_err() {
            ReportError::ReportSchemaViolation { field, .. } => {
                assert_eq!(field.as_deref(), Some("beginline"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_skips_inverted_line_range() {
        let report = r#"{"pmdVersion":"7.0.0","timestamp":"t","files":[{"filename":"A.java",
            "violations":[
              {"beginline":8,"begincolumn":1,"endline":2,"endcolumn":2,"description":"d","rule":"Bad","ruleset":"S","priority":1},
              {"beginline":2,"begincolumn":1,"endline":8,"endcolumn":2,"description":"d","rule":"Good","ruleset":"S","priority":1}
            ]}]}"#;
        let result = parse(report).unwrap();
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].rule, "Good");
    }

    #[test]
    fn test_missing_field_extraction() {
        assert_eq!(
            missing_field("missing field `endline` at line 3 column 9").as_deref(),
            Some("endline")
        );
        assert_eq!(missing_field("invalid type: string, expected u32"), None);
    }
}
