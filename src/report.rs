//! Report assembly for completed runs.
//!
//! A report is a snapshot of the parameters a run was started with, the full
//! result bundle and a condensed verdict, serialized as pretty-printed JSON.

use crate::model::{AnalysisParameters, ResultBundle};
use anyhow::{Context, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const REPORT_FILE_NAME: &str = "raman_analysis_report.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub winner: String,
    pub is_significant: bool,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub timestamp: String,
    pub parameters: AnalysisParameters,
    pub results: ResultBundle,
    pub summary: ReportSummary,
}

/// Structural transform of a finished run; `at` is the only varying input.
pub fn assemble(
    parameters: &AnalysisParameters,
    bundle: &ResultBundle,
    at: OffsetDateTime,
) -> AnalysisReport {
    AnalysisReport {
        timestamp: at.format(&Rfc3339).unwrap_or_else(|_| "now".into()),
        parameters: *parameters,
        results: bundle.clone(),
        summary: ReportSummary {
            winner: bundle.comparison.winner.clone(),
            is_significant: bundle.comparison.is_significant,
            p_value: bundle.comparison.p_value,
        },
    }
}

impl AnalysisReport {
    /// UTF-8 pretty-printed JSON, ready for a save collaborator.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let json = serde_json::to_vec_pretty(self).context("serialize analysis report")?;
        Ok(Bytes::from(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::results;
    use time::macros::datetime;

    #[test]
    fn assemble_is_deterministic_apart_from_timestamp() {
        let bundle = results::generate(&mut rand::thread_rng());
        let params = AnalysisParameters::default();
        let a = assemble(&params, &bundle, datetime!(2024-03-01 12:00 UTC));
        let b = assemble(&params, &bundle, datetime!(2024-03-02 08:30 UTC));
        assert_ne!(a.timestamp, b.timestamp);
        assert_eq!(a.parameters, b.parameters);
        assert_eq!(a.results, b.results);
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.timestamp, "2024-03-01T12:00:00Z");
    }

    #[test]
    fn serialized_layout_uses_camel_case_fields() {
        let bundle = results::generate(&mut rand::thread_rng());
        let report = assemble(
            &AnalysisParameters::default(),
            &bundle,
            datetime!(2024-03-01 12:00 UTC),
        );
        let bytes = report.to_bytes().unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.contains('\n'));

        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["summary"]["pValue"], 0.032);
        assert_eq!(v["summary"]["isSignificant"], true);
        assert_eq!(v["summary"]["winner"], "CNN + SHAP");
        assert_eq!(v["parameters"]["learningRate"], 0.001);
        assert_eq!(v["parameters"]["cvFolds"], 5);
        assert_eq!(v["results"]["vipResults"]["accuracy"], 0.847);
        assert_eq!(v["results"]["cnnResults"]["cvScores"].as_array().unwrap().len(), 5);
        assert_eq!(v["results"]["comparison"]["stability"]["vip"], 0.89);
    }
}
