//! Report export for a completed run.

use super::controller::RunController;
use crate::report::AnalysisReport;
use crate::storage;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Serialize `report`, hand the bytes to `save` and announce the saved path.
fn write_report(
    controller: &RunController,
    report: &AnalysisReport,
    save: impl FnOnce(&[u8]) -> Result<PathBuf>,
) -> Result<PathBuf> {
    let bytes = report.to_bytes()?;
    let path = save(&bytes)?;
    controller.emit_exported(path.clone());
    Ok(path)
}

/// Save under `output_dir` with the fixed report file name.
pub(crate) fn save_in_dir(
    controller: &RunController,
    report: &AnalysisReport,
    output_dir: &Path,
) -> Result<PathBuf> {
    write_report(controller, report, |bytes| {
        storage::save_report(output_dir, bytes)
    })
}

/// Save to an explicit file path (`--export-json`).
pub(crate) fn save_to_path(
    controller: &RunController,
    report: &AnalysisReport,
    path: &Path,
) -> Result<PathBuf> {
    write_report(controller, report, |bytes| {
        storage::export_json(path, bytes).map(|()| path.to_path_buf())
    })
}

/// Assemble the report and hand it to storage. Does nothing (beyond a log line)
/// when no analysis has completed.
pub(crate) fn export_report(controller: &RunController, output_dir: &Path) -> Option<PathBuf> {
    let report = controller.build_report()?;
    match save_in_dir(controller, &report, output_dir) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "report export failed");
            controller.notice(format!("Report export failed: {e:#}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisEvent, AnalysisParameters, Notice, UploadedDataset};
    use tokio::sync::mpsc;

    fn completed() -> (RunController, mpsc::UnboundedReceiver<AnalysisEvent>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut c = RunController::new(AnalysisParameters::default(), tx);
        c.select_dataset(UploadedDataset::new("a.csv", 10));
        c.start_run().unwrap();
        c.complete(crate::engine::results::generate(&mut rand::thread_rng()));
        while rx.try_recv().is_ok() {}
        (c, rx)
    }

    #[test]
    fn explicit_path_save_announces_download() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out.json");
        let (c, mut rx) = completed();
        let report = c.build_report().unwrap();

        let saved = save_to_path(&c, &report, &target).unwrap();
        assert_eq!(saved, target);
        assert!(target.exists());

        let mut downloaded = None;
        while let Ok(ev) = rx.try_recv() {
            if let AnalysisEvent::Notice(Notice::ReportDownloaded { path }) = ev {
                downloaded = Some(path);
            }
        }
        assert_eq!(downloaded, Some(target));
    }

    #[test]
    fn failed_export_reports_a_message() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the output directory should be.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let (c, mut rx) = completed();

        assert!(export_report(&c, &blocker).is_none());
        let mut messages = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            match ev {
                AnalysisEvent::Notice(Notice::Message(m)) => messages.push(m),
                AnalysisEvent::ReportExported { .. } => panic!("nothing was exported"),
                _ => {}
            }
        }
        assert!(messages.iter().any(|m| m.starts_with("Report export failed")));
    }
}
