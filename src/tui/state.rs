use crate::model::{
    AnalysisEvent, AnalysisParameters, ParamField, ResultBundle, RunState, UploadedDataset,
};

pub const TAB_TITLES: [&str; 4] = ["Overview", "Features", "Parameters", "Help"];

/// Text entry the dashboard is currently collecting, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    DatasetPath(String),
    EditParam { field: ParamField, buffer: String },
}

/// Read-only projection of controller events for rendering.
pub struct UiState {
    pub tab: usize,
    pub run_state: RunState,
    pub info: String,
    pub info_is_error: bool,
    pub dataset: Option<UploadedDataset>,
    pub parameters: AnalysisParameters,
    // Parameters the displayed results were produced with.
    pub result_parameters: Option<AnalysisParameters>,
    pub bundle: Option<ResultBundle>,
    pub param_selected: usize,
    pub input: InputMode,
    pub last_exported_path: Option<String>,
    pub log_path: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: 0,
            run_state: RunState::Idle,
            info: "Press 'o' to select a dataset, 'r' to run".into(),
            info_is_error: false,
            dataset: None,
            parameters: AnalysisParameters::default(),
            result_parameters: None,
            bundle: None,
            param_selected: 0,
            input: InputMode::Normal,
            last_exported_path: None,
            log_path: None,
        }
    }
}

impl UiState {
    pub fn progress(&self) -> u8 {
        match &self.run_state {
            RunState::Idle => 0,
            RunState::Running { progress, .. } => *progress,
            RunState::Complete => 100,
        }
    }

    pub fn selected_field(&self) -> ParamField {
        ParamField::ALL[self.param_selected.min(ParamField::ALL.len() - 1)]
    }

    pub fn select_next_param(&mut self) {
        self.param_selected = (self.param_selected + 1) % ParamField::ALL.len();
    }

    pub fn select_prev_param(&mut self) {
        self.param_selected = self
            .param_selected
            .checked_sub(1)
            .unwrap_or(ParamField::ALL.len() - 1);
    }

    pub fn set_info(&mut self, msg: String, is_error: bool) {
        self.info = msg;
        self.info_is_error = is_error;
    }
}

pub fn apply_event(state: &mut UiState, ev: AnalysisEvent) {
    match ev {
        AnalysisEvent::DatasetSelected { dataset } => state.dataset = Some(dataset),
        AnalysisEvent::ParametersChanged { parameters } => state.parameters = parameters,
        AnalysisEvent::RunStarted { .. } => {
            state.bundle = None;
            state.result_parameters = None;
            state.run_state = RunState::Running {
                progress: 0,
                message: "Starting analysis…".into(),
            };
        }
        AnalysisEvent::StageReached { stage } => {
            state.run_state = RunState::Running {
                progress: stage.progress,
                message: stage.label.to_string(),
            };
        }
        AnalysisEvent::RunCompleted { bundle, parameters } => {
            state.bundle = Some(*bundle);
            state.result_parameters = Some(parameters);
            state.run_state = RunState::Complete;
        }
        AnalysisEvent::RunCancelled | AnalysisEvent::RunFailed { .. } => {
            state.run_state = RunState::Idle;
        }
        AnalysisEvent::ReportExported { path } => {
            state.last_exported_path = Some(path.to_string_lossy().to_string());
        }
        AnalysisEvent::Notice(notice) => {
            let msg = match &notice {
                crate::model::Notice::ReportDownloaded { path } => format!(
                    "Report downloaded: {} (press 'y' to copy path)",
                    path.display()
                ),
                other => other.to_message(),
            };
            state.set_info(msg, notice.is_error());
        }
    }
}
