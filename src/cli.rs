use crate::model::{
    AnalysisEvent, AnalysisParameters, Notice, ParamField, RunConfig, RunState, UploadedDataset,
};
use crate::orchestrator::{run_controller, save_in_dir, save_to_path, RunController, UiCommand};
use crate::report::AnalysisReport;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "raman-compare",
    version,
    about = "Compare PLS-DA + VIP and CNN + SHAP pipelines on a Raman spectroscopy dataset"
)]
pub struct Cli {
    /// Dataset file to analyse (only its name and size are read)
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Number of PLS components
    #[arg(long, default_value = "10")]
    pub components: String,

    /// Cross-validation fold count
    #[arg(long, default_value = "5")]
    pub cv_folds: String,

    /// Bootstrap iteration count
    #[arg(long, default_value = "100")]
    pub bootstrap: String,

    /// CNN learning rate
    #[arg(long, default_value = "0.001")]
    pub learning_rate: String,

    /// CNN training epochs
    #[arg(long, default_value = "100")]
    pub epochs: String,

    /// Delay between analysis stages
    #[arg(long, default_value = "1s")]
    pub stage_delay: humantime::Duration,

    /// Directory the report is saved to (defaults to the downloads folder)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Also write the report to this path
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Print the JSON report and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Run silently: suppress all output except errors
    #[arg(long)]
    pub silent: bool,

    /// Start the analysis as soon as the dashboard opens (requires --dataset)
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub run_on_launch: bool,
}

impl Cli {
    /// Raw parameter values as given on the command line, keyed by field.
    pub fn raw_parameters(&self) -> [(ParamField, &str); 5] {
        [
            (ParamField::Components, self.components.as_str()),
            (ParamField::CvFolds, self.cv_folds.as_str()),
            (ParamField::Bootstrap, self.bootstrap.as_str()),
            (ParamField::LearningRate, self.learning_rate.as_str()),
            (ParamField::Epochs, self.epochs.as_str()),
        ]
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            crate::logging::init_stderr("warn");
            return run_headless(args).await;
        }
    }

    crate::logging::init_stderr(if args.silent { "error" } else { "warn" });
    run_headless(args).await
}

/// Build a `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> RunConfig {
    RunConfig {
        stage_delay: Duration::from(args.stage_delay),
        output_dir: args
            .output_dir
            .clone()
            .unwrap_or_else(crate::storage::default_output_dir),
    }
}

/// Queue the CLI-provided dataset and parameters on a fresh controller.
pub(crate) fn queue_initial_commands(
    args: &Cli,
    cmd_tx: &mpsc::UnboundedSender<UiCommand>,
) -> Result<Option<UploadedDataset>> {
    for (field, raw) in args.raw_parameters() {
        let _ = cmd_tx.send(UiCommand::UpdateParameter {
            name: field.name().to_string(),
            raw: raw.to_string(),
        });
    }
    let dataset = args
        .dataset
        .as_deref()
        .map(UploadedDataset::from_path)
        .transpose()
        .context("load dataset")?;
    if let Some(ds) = dataset.clone() {
        let _ = cmd_tx.send(UiCommand::SelectDataset(ds));
    }
    Ok(dataset)
}

/// A headless run that reached Complete.
struct HeadlessRun {
    report: AnalysisReport,
    dataset: Option<UploadedDataset>,
}

/// Drive one analysis to completion, save the report where asked and pass
/// every user-facing notice to `on_notice`.
async fn execute_headless(args: &Cli, mut on_notice: impl FnMut(Notice)) -> Result<HeadlessRun> {
    let cfg = build_config(args);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AnalysisEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let mut controller = RunController::new(AnalysisParameters::default(), event_tx);

    queue_initial_commands(args, &cmd_tx)?;
    let _ = cmd_tx.send(UiCommand::StartRun);

    let consumer = async {
        while let Some(ev) = event_rx.recv().await {
            match ev {
                AnalysisEvent::Notice(notice) => {
                    let rejected = notice == Notice::NoDataset;
                    on_notice(notice);
                    if rejected {
                        break;
                    }
                }
                AnalysisEvent::RunCompleted { .. }
                | AnalysisEvent::RunCancelled
                | AnalysisEvent::RunFailed { .. } => break,
                _ => {}
            }
        }
        let _ = cmd_tx.send(UiCommand::Quit);
    };

    let (res, ()) = tokio::join!(run_controller(&cfg, &mut controller, cmd_rx), consumer);
    res?;

    if controller.dataset().is_none() {
        anyhow::bail!("no dataset selected; pass --dataset <PATH>");
    }
    anyhow::ensure!(
        controller.state() == &RunState::Complete,
        "analysis did not complete"
    );
    let report = controller
        .build_report()
        .context("assemble report")?;

    if let Some(p) = args.export_json.as_deref() {
        save_to_path(&controller, &report, p)?;
    }
    if args.output_dir.is_some() {
        save_in_dir(&controller, &report, &cfg.output_dir)?;
    }
    // Download notices arrive after the consumer stopped reading.
    while let Ok(ev) = event_rx.try_recv() {
        if let AnalysisEvent::Notice(notice) = ev {
            on_notice(notice);
        }
    }

    Ok(HeadlessRun {
        report,
        dataset: controller.dataset().cloned(),
    })
}

/// Run one analysis without the dashboard and print the outcome.
async fn run_headless(args: Cli) -> Result<()> {
    let (out_tx, out_handle) = if args.silent {
        (None, None)
    } else {
        let (tx, handle) = spawn_output_writer();
        (Some(tx), Some(handle))
    };

    let show_progress = args.text;
    let outcome = execute_headless(&args, |notice| {
        let Some(tx) = out_tx.as_ref() else {
            return;
        };
        let downloaded = matches!(notice, Notice::ReportDownloaded { .. });
        if show_progress || downloaded || notice.is_error() {
            let _ = tx.send(OutputLine::Stderr(notice.to_message()));
        }
    })
    .await
    .and_then(|run| {
        let Some(tx) = out_tx.as_ref() else {
            return Ok(());
        };
        if args.json {
            let bytes = run.report.to_bytes()?;
            let _ = tx.send(OutputLine::Stdout(String::from_utf8_lossy(&bytes).into_owned()));
        } else {
            let summary = crate::text_summary::build_text_summary(&run.report, run.dataset.as_ref());
            for line in summary.lines {
                let _ = tx.send(OutputLine::Stdout(line));
            }
        }
        Ok(())
    });

    drop(out_tx);
    if let Some(handle) = out_handle {
        let _ = handle.await;
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_into_default_parameters() {
        let args = Cli::parse_from(["raman-compare"]);
        let mut params = AnalysisParameters {
            components: 1,
            cv_folds: 1,
            bootstrap_iterations: 1,
            learning_rate: 1.0,
            epochs: 1,
        };
        for (field, raw) in args.raw_parameters() {
            params.set_raw(field, raw);
        }
        assert_eq!(params, AnalysisParameters::default());
        assert_eq!(build_config(&args).stage_delay, Duration::from_secs(1));
    }

    #[test]
    fn stage_delay_and_output_dir_reach_run_config() {
        let args = Cli::parse_from([
            "raman-compare",
            "--stage-delay",
            "250ms",
            "--output-dir",
            "/tmp/raman-out",
        ]);
        let cfg = build_config(&args);
        assert_eq!(cfg.stage_delay, Duration::from_millis(250));
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/raman-out"));
    }

    #[test]
    fn queued_commands_include_dataset_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();
        let args = Cli::parse_from([
            "raman-compare",
            "--dataset",
            path.to_str().unwrap(),
            "--epochs",
            "oops",
        ]);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let ds = queue_initial_commands(&args, &tx).unwrap().unwrap();
        assert_eq!(ds, UploadedDataset::new("sample.csv", 2048));

        let mut saw_epochs = false;
        let mut saw_dataset = false;
        while let Ok(cmd) = rx.try_recv() {
            match cmd {
                UiCommand::UpdateParameter { name, raw } if name == "epochs" => {
                    assert_eq!(raw, "oops");
                    saw_epochs = true;
                }
                UiCommand::SelectDataset(d) => saw_dataset = d == ds,
                _ => {}
            }
        }
        assert!(saw_epochs && saw_dataset);
    }

    #[test]
    fn missing_dataset_file_is_an_error() {
        let args = Cli::parse_from(["raman-compare", "--dataset", "/nonexistent/x.csv"]);
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(queue_initial_commands(&args, &tx).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn headless_json_writes_export_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("sample.csv");
        std::fs::write(&data, b"1,2,3").unwrap();
        let out = dir.path().join("report.json");
        let args = Cli::parse_from([
            "raman-compare",
            "--silent",
            "--json",
            "--dataset",
            data.to_str().unwrap(),
            "--export-json",
            out.to_str().unwrap(),
        ]);
        run_headless(args).await.unwrap();

        let v: serde_json::Value = serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(v["summary"]["winner"], "CNN + SHAP");
        assert_eq!(v["parameters"]["epochs"], 100);
    }

    #[tokio::test(start_paused = true)]
    async fn headless_without_dataset_fails() {
        let args = Cli::parse_from(["raman-compare", "--silent", "--json"]);
        let err = run_headless(args).await.unwrap_err();
        assert!(err.to_string().contains("no dataset"));
    }

    #[tokio::test(start_paused = true)]
    async fn text_run_reports_completion_and_download() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("sample.csv");
        std::fs::write(&data, b"1,2,3").unwrap();
        let out_dir = dir.path().join("reports");
        let args = Cli::parse_from([
            "raman-compare",
            "--text",
            "--dataset",
            data.to_str().unwrap(),
            "--output-dir",
            out_dir.to_str().unwrap(),
        ]);

        let mut seen = Vec::new();
        let run = execute_headless(&args, |n| seen.push(n)).await.unwrap();
        assert_eq!(run.dataset.map(|d| d.name), Some("sample.csv".to_string()));

        let stages = seen.iter().filter(|n| matches!(n, Notice::Stage { .. })).count();
        assert_eq!(stages, crate::engine::stages::STAGES.len());
        let complete_at = seen
            .iter()
            .position(|n| *n == Notice::AnalysisComplete)
            .expect("completion notice");
        let (download_at, saved) = seen
            .iter()
            .enumerate()
            .find_map(|(i, n)| match n {
                Notice::ReportDownloaded { path } => Some((i, path.clone())),
                _ => None,
            })
            .expect("download notice");
        assert!(complete_at < download_at);
        assert_eq!(saved, out_dir.join(crate::report::REPORT_FILE_NAME));
        assert!(saved.exists());
    }
}
