//! Text summary builder for CLI output.
//!
//! Formats a completed report as human-readable lines for text mode.

use crate::metrics;
use crate::model::{MethodResult, UploadedDataset};
use crate::report::AnalysisReport;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

fn method_lines(lines: &mut Vec<String>, m: &MethodResult, stability: f64) {
    lines.push(format!("{}:", m.method));
    lines.push(format!(
        "  Accuracy {:.1}%  AUC {:.3}  Stability {:.2}",
        m.accuracy * 100.0,
        m.auc,
        stability
    ));
    if let Some(s) = metrics::compute_fold_stats(&m.cv_scores) {
        lines.push(format!(
            "  CV ({} folds): mean {:.3} min {:.3} max {:.3} sd {:.3}",
            m.cv_scores.len(),
            s.mean,
            s.min,
            s.max,
            s.stddev
        ));
    }
    let top: Vec<String> = m
        .top_features
        .iter()
        .map(|w| format!("{w} cm⁻¹"))
        .collect();
    lines.push(format!("  Top features: {}", top.join(", ")));
}

/// Build a text summary from a completed report.
pub(crate) fn build_text_summary(
    report: &AnalysisReport,
    dataset: Option<&UploadedDataset>,
) -> TextSummary {
    let mut lines = Vec::new();

    if let Some(ds) = dataset {
        lines.push(format!("Dataset: {} ({:.2} MB)", ds.name, ds.size_mb()));
    }
    let p = &report.parameters;
    lines.push(format!(
        "Parameters: components {} / CV folds {} / bootstrap {} / learning rate {} / epochs {}",
        p.components, p.cv_folds, p.bootstrap_iterations, p.learning_rate, p.epochs
    ));

    let results = &report.results;
    method_lines(
        &mut lines,
        &results.vip_results,
        results.comparison.stability.vip,
    );
    method_lines(
        &mut lines,
        &results.cnn_results,
        results.comparison.stability.cnn,
    );

    lines.push(format!(
        "Comparison: p = {:.3} ({})",
        report.summary.p_value,
        if report.summary.is_significant {
            "significant"
        } else {
            "not significant"
        }
    ));
    lines.push(format!("Winner: {}", report.summary.winner));

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnalysisParameters;
    use crate::report;

    #[test]
    fn summary_mentions_both_methods_and_verdict() {
        let bundle = crate::engine::results::generate(&mut rand::thread_rng());
        let r = report::assemble(
            &AnalysisParameters::default(),
            &bundle,
            time::OffsetDateTime::now_utc(),
        );
        let ds = UploadedDataset::new("sample.csv", 2 * 1024 * 1024);
        let summary = build_text_summary(&r, Some(&ds));
        let text = summary.lines.join("\n");
        assert!(text.contains("Dataset: sample.csv (2.00 MB)"));
        assert!(text.contains("PLS-DA + VIP:"));
        assert!(text.contains("CNN + SHAP:"));
        assert!(text.contains("Accuracy 92.3%"));
        assert!(text.contains("p = 0.032 (significant)"));
        assert!(text.contains("Winner: CNN + SHAP"));
    }
}
