//! JSON output format support.

use serde::Serialize;
use wfcheck_core::diagnostics::Diagnostic;
use wfcheck_core::{ActionMetadata, ResolveReport};

/// Root structure for JSON output.
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a> {
    /// Version of wfcheck that produced this output.
    pub version: &'static str,
    /// Resolved references, in the order they were given.
    pub actions: Vec<JsonAction<'a>>,
    /// Diagnostics for references that failed to resolve.
    pub diagnostics: Vec<JsonDiagnostic<'a>>,
}

/// One looked-up reference.
#[derive(Debug, Serialize)]
pub struct JsonAction<'a> {
    pub reference: &'a str,
    /// `null` when no metadata is available.
    pub metadata: Option<&'a ActionMetadata>,
}

/// A single diagnostic in JSON format.
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic<'a> {
    /// Always `error`; every diagnostic fails the run.
    pub level: &'static str,
    pub rule: &'a str,
    pub reference: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'a str>,
}

fn diagnostic_to_json(diag: &Diagnostic) -> JsonDiagnostic<'_> {
    JsonDiagnostic {
        level: "error",
        rule: &diag.rule,
        reference: &diag.reference,
        message: &diag.message,
        suggestion: diag.suggestion.as_deref(),
    }
}

/// Convert a resolve report to JSON output format.
pub fn report_to_json(report: &ResolveReport) -> JsonOutput<'_> {
    JsonOutput {
        version: env!("CARGO_PKG_VERSION"),
        actions: report
            .resolutions
            .iter()
            .map(|r| JsonAction {
                reference: &r.reference,
                metadata: r.metadata.as_deref(),
            })
            .collect(),
        diagnostics: report.diagnostics.iter().map(diagnostic_to_json).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wfcheck_core::Resolution;

    #[test]
    fn test_report_to_json() {
        let report = ResolveReport {
            resolutions: vec![
                Resolution {
                    reference: "./a".to_string(),
                    metadata: Some(Arc::new(
                        ActionMetadata::parse("name: A\noutputs:\n  x: {}\n").unwrap(),
                    )),
                },
                Resolution {
                    reference: "./b".to_string(),
                    metadata: None,
                },
            ],
            diagnostics: vec![Diagnostic::error("./b", "action::metadata", "boom".to_string())],
        };

        let value = serde_json::to_value(report_to_json(&report)).unwrap();
        assert_eq!(value["actions"][0]["metadata"]["name"], "A");
        assert_eq!(value["actions"][0]["metadata"]["outputs"][0], "x");
        assert!(value["actions"][1]["metadata"].is_null());
        assert_eq!(value["diagnostics"][0]["level"], "error");
        assert_eq!(value["diagnostics"][0]["reference"], "./b");
        assert!(value["diagnostics"][0].get("suggestion").is_none());
    }
}
