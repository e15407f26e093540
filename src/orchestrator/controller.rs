//! Run lifecycle controller.
//!
//! `RunController` owns the dataset, parameters, run state and results, and is
//! the only place they change. `run_controller` drives it from UI commands and
//! engine stage events, emitting events for presentation layers.

use crate::engine::{AnalysisEngine, EngineControl, RunOutcome};
use crate::model::{
    AnalysisEvent, AnalysisParameters, Notice, ParamField, ParamUpdate, ParameterError,
    ResultBundle, RunConfig, RunState, Stage, UploadedDataset,
};
use crate::report::{self, AnalysisReport};
use anyhow::Result;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers to drive the controller.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    SelectDataset(UploadedDataset),
    UpdateParameter { name: String, raw: String },
    StartRun,
    Cancel,
    ExportReport,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub(crate) enum StartRunError {
    #[error("no dataset selected")]
    NoDataset,
    #[error("an analysis is already running")]
    AlreadyRunning,
}

pub(crate) struct RunController {
    dataset: Option<UploadedDataset>,
    parameters: AnalysisParameters,
    state: RunState,
    // Parameters in effect when the current/last run started; reports use these.
    run_parameters: Option<AnalysisParameters>,
    results: Option<ResultBundle>,
    event_tx: UnboundedSender<AnalysisEvent>,
}

impl RunController {
    pub fn new(parameters: AnalysisParameters, event_tx: UnboundedSender<AnalysisEvent>) -> Self {
        Self {
            dataset: None,
            parameters,
            state: RunState::Idle,
            run_parameters: None,
            results: None,
            event_tx,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn dataset(&self) -> Option<&UploadedDataset> {
        self.dataset.as_ref()
    }

    #[cfg(test)]
    pub fn parameters(&self) -> &AnalysisParameters {
        &self.parameters
    }

    #[cfg(test)]
    pub fn results(&self) -> Option<&ResultBundle> {
        self.results.as_ref()
    }

    fn emit(&self, ev: AnalysisEvent) {
        let _ = self.event_tx.send(ev);
    }

    fn notify(&self, notice: Notice) {
        self.emit(AnalysisEvent::Notice(notice));
    }

    /// Replace the selected dataset. Never touches the run state.
    pub fn select_dataset(&mut self, dataset: UploadedDataset) {
        tracing::info!(name = %dataset.name, size = dataset.size_bytes, "dataset selected");
        self.notify(Notice::DatasetUploaded {
            name: dataset.name.clone(),
            size_bytes: dataset.size_bytes,
        });
        self.emit(AnalysisEvent::DatasetSelected {
            dataset: dataset.clone(),
        });
        self.dataset = Some(dataset);
    }

    pub fn update_parameter(&mut self, name: &str, raw: &str) -> Result<ParamUpdate, ParameterError> {
        let field: ParamField = name.parse()?;
        let outcome = self.parameters.set_raw(field, raw);
        if outcome == ParamUpdate::Defaulted {
            tracing::debug!(field = field.name(), raw, "unparseable value replaced by default");
        }
        self.emit(AnalysisEvent::ParametersChanged {
            parameters: self.parameters,
        });
        Ok(outcome)
    }

    /// Move to Running and snapshot the parameters the run will report.
    pub fn start_run(&mut self) -> Result<AnalysisParameters, StartRunError> {
        if self.state.is_running() {
            tracing::warn!("start requested while an analysis is running; ignored");
            return Err(StartRunError::AlreadyRunning);
        }
        if self.dataset.is_none() {
            self.notify(Notice::NoDataset);
            return Err(StartRunError::NoDataset);
        }
        self.results = None;
        self.run_parameters = Some(self.parameters);
        self.state = RunState::Running {
            progress: 0,
            message: "Starting analysis…".to_string(),
        };
        tracing::info!(parameters = ?self.parameters, "analysis started");
        self.emit(AnalysisEvent::RunStarted {
            parameters: self.parameters,
        });
        Ok(self.parameters)
    }

    pub fn advance(&mut self, stage: Stage) {
        if !self.state.is_running() {
            tracing::warn!(stage = stage.index, "stage update outside a run; ignored");
            return;
        }
        self.state = RunState::Running {
            progress: stage.progress,
            message: stage.label.to_string(),
        };
        self.emit(AnalysisEvent::StageReached { stage });
        self.notify(Notice::Stage {
            label: stage.label.to_string(),
        });
    }

    pub fn complete(&mut self, bundle: ResultBundle) {
        if !self.state.is_running() {
            tracing::warn!("results arrived outside a run; discarded");
            return;
        }
        let parameters = self.run_parameters.unwrap_or(self.parameters);
        self.results = Some(bundle.clone());
        self.state = RunState::Complete;
        tracing::info!("analysis complete");
        // Consumers may stop reading at `RunCompleted`; the notice goes first.
        self.notify(Notice::AnalysisComplete);
        self.emit(AnalysisEvent::RunCompleted {
            bundle: Box::new(bundle),
            parameters,
        });
    }

    /// Revert a running analysis to Idle without results.
    pub fn cancel(&mut self) {
        if !self.state.is_running() {
            return;
        }
        self.state = RunState::Idle;
        self.run_parameters = None;
        self.emit(AnalysisEvent::RunCancelled);
        self.notify(Notice::Message("Analysis cancelled".into()));
    }

    pub fn fail(&mut self, message: String) {
        tracing::error!(%message, "analysis failed");
        self.state = RunState::Idle;
        self.run_parameters = None;
        self.emit(AnalysisEvent::RunFailed {
            message: message.clone(),
        });
        self.notify(Notice::Message(message));
    }

    /// Snapshot the completed run as a report. `None` unless the run is Complete.
    pub fn build_report(&self) -> Option<AnalysisReport> {
        let (RunState::Complete, Some(bundle), Some(parameters)) =
            (&self.state, self.results.as_ref(), self.run_parameters.as_ref())
        else {
            tracing::warn!(state = ?self.state, "report requested without a completed analysis");
            return None;
        };
        Some(report::assemble(
            parameters,
            bundle,
            time::OffsetDateTime::now_utc(),
        ))
    }

    pub(crate) fn notice(&self, message: String) {
        self.notify(Notice::Message(message));
    }

    pub(crate) fn emit_exported(&self, path: std::path::PathBuf) {
        self.emit(AnalysisEvent::ReportExported { path: path.clone() });
        self.notify(Notice::ReportDownloaded { path });
    }
}

/// Internal handle for a running analysis task.
struct RunCtx {
    ctrl_tx: UnboundedSender<EngineControl>,
    handle: Option<tokio::task::JoinHandle<Result<RunOutcome>>>,
}

/// Spawn the staged sequence and return its control handle plus stage stream.
fn spawn_run(cfg: &RunConfig) -> (RunCtx, UnboundedReceiver<Stage>) {
    let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel::<EngineControl>();
    let (stage_tx, stage_rx) = mpsc::unbounded_channel::<Stage>();
    let engine = AnalysisEngine::new(cfg.stage_delay);
    let handle = tokio::spawn(async move { engine.run(stage_tx, ctrl_rx).await });
    (
        RunCtx {
            ctrl_tx,
            handle: Some(handle),
        },
        stage_rx,
    )
}

/// Drive `controller` from UI commands until `Quit` (or the command channel closes).
pub(crate) async fn run_controller(
    cfg: &RunConfig,
    controller: &mut RunController,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut run_ctx: Option<RunCtx> = None;
    let mut stage_rx: Option<UnboundedReceiver<Stage>> = None;
    let mut quit_pending = false;

    loop {
        tokio::select! {
            // After Quit (or a closed channel) only the run's completion is awaited.
            cmd = cmd_rx.recv(), if !quit_pending => {
                match cmd {
                    Some(UiCommand::SelectDataset(dataset)) => controller.select_dataset(dataset),
                    Some(UiCommand::UpdateParameter { name, raw }) => {
                        if let Err(e) = controller.update_parameter(&name, &raw) {
                            controller.notice(e.to_string());
                        }
                    }
                    Some(UiCommand::StartRun) => {
                        if controller.start_run().is_ok() {
                            let (ctx, rx) = spawn_run(cfg);
                            run_ctx = Some(ctx);
                            stage_rx = Some(rx);
                        }
                    }
                    Some(UiCommand::Cancel) => {
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Cancel);
                        }
                    }
                    Some(UiCommand::ExportReport) => {
                        super::post_process::export_report(controller, &cfg.output_dir);
                    }
                    Some(UiCommand::Quit) | None => {
                        // Quit waits for the staged sequence to stop so the final state is settled.
                        quit_pending = true;
                        match &run_ctx {
                            Some(ctx) => {
                                let _ = ctx.ctrl_tx.send(EngineControl::Cancel);
                            }
                            None => break,
                        }
                    }
                }
            }
            stage = async {
                match stage_rx.as_mut() {
                    Some(rx) => match rx.recv().await {
                        Some(stage) => stage,
                        None => futures::future::pending().await,
                    },
                    None => futures::future::pending().await,
                }
            } => {
                controller.advance(stage);
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            join_res = async {
                if let Some(ctx) = &mut run_ctx {
                    if let Some(h) = ctx.handle.as_mut() {
                        return h.await;
                    }
                }
                futures::future::pending().await
            } => {
                // Stages sent just before completion may still be queued.
                if let Some(mut rx) = stage_rx.take() {
                    while let Ok(stage) = rx.try_recv() {
                        controller.advance(stage);
                    }
                }
                run_ctx = None;
                match join_res {
                    Ok(Ok(RunOutcome::Completed(bundle))) => controller.complete(*bundle),
                    Ok(Ok(RunOutcome::Cancelled)) => controller.cancel(),
                    Ok(Err(e)) => controller.fail(format!("Analysis failed: {e:#}")),
                    Err(e) => controller.fail(format!("Analysis task failed: {e}")),
                }
                if quit_pending {
                    break;
                }
            }
        }
    }

    Ok(())
}
