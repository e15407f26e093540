use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const VIP_METHOD: &str = "PLS-DA + VIP";
pub const CNN_METHOD: &str = "CNN + SHAP";

/// Threshold below which a p-value counts as significant.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub stage_delay: Duration,
    pub output_dir: PathBuf,
}

/// A dataset chosen by the user. Only name and size are known; content is never read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDataset {
    pub name: String,
    pub size_bytes: u64,
}

impl UploadedDataset {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
        }
    }

    /// Build a dataset handle from filesystem metadata without opening the file.
    pub fn from_path(path: &std::path::Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let meta = std::fs::metadata(path)
            .with_context(|| format!("read metadata for {}", path.display()))?;
        if !meta.is_file() {
            anyhow::bail!("{} is not a file", path.display());
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, meta.len()))
    }

    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Editable analysis parameters. The staged sequence does not consult them; they
/// are carried into the report as the configuration a run was started with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisParameters {
    pub components: i64,
    pub cv_folds: i64,
    pub bootstrap_iterations: i64,
    pub learning_rate: f64,
    pub epochs: i64,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            components: DEFAULT_COMPONENTS,
            cv_folds: DEFAULT_CV_FOLDS,
            bootstrap_iterations: DEFAULT_BOOTSTRAP,
            learning_rate: DEFAULT_LEARNING_RATE,
            epochs: DEFAULT_EPOCHS,
        }
    }
}

const DEFAULT_COMPONENTS: i64 = 10;
const DEFAULT_CV_FOLDS: i64 = 5;
const DEFAULT_BOOTSTRAP: i64 = 100;
const DEFAULT_LEARNING_RATE: f64 = 0.001;
const DEFAULT_EPOCHS: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamField {
    Components,
    CvFolds,
    Bootstrap,
    LearningRate,
    Epochs,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParameterError {
    #[error("unknown parameter `{0}`")]
    Unknown(String),
}

/// Outcome of applying a raw value to a parameter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamUpdate {
    Parsed,
    Defaulted,
}

impl ParamField {
    pub const ALL: [ParamField; 5] = [
        ParamField::Components,
        ParamField::CvFolds,
        ParamField::Bootstrap,
        ParamField::LearningRate,
        ParamField::Epochs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParamField::Components => "components",
            ParamField::CvFolds => "cv-folds",
            ParamField::Bootstrap => "bootstrap",
            ParamField::LearningRate => "learning-rate",
            ParamField::Epochs => "epochs",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParamField::Components => "PLS components",
            ParamField::CvFolds => "CV folds",
            ParamField::Bootstrap => "Bootstrap iterations",
            ParamField::LearningRate => "Learning rate",
            ParamField::Epochs => "Epochs",
        }
    }
}

impl FromStr for ParamField {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "components" | "nComponents" => Ok(ParamField::Components),
            "cv-folds" | "cvFolds" => Ok(ParamField::CvFolds),
            "bootstrap" | "bootstrapIterations" => Ok(ParamField::Bootstrap),
            "learning-rate" | "learningRate" => Ok(ParamField::LearningRate),
            "epochs" => Ok(ParamField::Epochs),
            other => Err(ParameterError::Unknown(other.to_string())),
        }
    }
}

/// Parse an integer the lenient way a numeric input box does: decimals are
/// truncated toward zero and no range is enforced. Only non-numeric input
/// (or a value outside `i64`) is rejected.
fn parse_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let t = raw.parse::<f64>().ok().filter(|f| f.is_finite())?.trunc();
    if t < i64::MIN as f64 || t >= i64::MAX as f64 {
        return None;
    }
    Some(t as i64)
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

impl AnalysisParameters {
    /// Apply a raw value to one field, substituting the field default when it does not parse.
    pub fn set_raw(&mut self, field: ParamField, raw: &str) -> ParamUpdate {
        let (slot, default) = match field {
            ParamField::LearningRate => {
                return match parse_float(raw) {
                    Some(v) => {
                        self.learning_rate = v;
                        ParamUpdate::Parsed
                    }
                    None => {
                        self.learning_rate = DEFAULT_LEARNING_RATE;
                        ParamUpdate::Defaulted
                    }
                };
            }
            ParamField::Components => (&mut self.components, DEFAULT_COMPONENTS),
            ParamField::CvFolds => (&mut self.cv_folds, DEFAULT_CV_FOLDS),
            ParamField::Bootstrap => (&mut self.bootstrap_iterations, DEFAULT_BOOTSTRAP),
            ParamField::Epochs => (&mut self.epochs, DEFAULT_EPOCHS),
        };
        match parse_int(raw) {
            Some(v) => {
                *slot = v;
                ParamUpdate::Parsed
            }
            None => {
                *slot = default;
                ParamUpdate::Defaulted
            }
        }
    }

    pub fn display_value(&self, field: ParamField) -> String {
        match field {
            ParamField::Components => self.components.to_string(),
            ParamField::CvFolds => self.cv_folds.to_string(),
            ParamField::Bootstrap => self.bootstrap_iterations.to_string(),
            ParamField::LearningRate => self.learning_rate.to_string(),
            ParamField::Epochs => self.epochs.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Idle,
    Running { progress: u8, message: String },
    Complete,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running { .. })
    }
}

/// One step of the staged analysis sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub index: usize,
    pub progress: u8,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodResult {
    pub method: String,
    pub accuracy: f64,
    pub auc: f64,
    pub cv_scores: Vec<f64>,
    pub feature_importance: Vec<f64>,
    pub top_features: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stability {
    pub vip: f64,
    pub cnn: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub p_value: f64,
    pub is_significant: bool,
    pub winner: String,
    pub stability: Stability,
}

impl ComparisonSummary {
    pub fn new(p_value: f64, winner: impl Into<String>, stability: Stability) -> Self {
        Self {
            p_value,
            is_significant: p_value < SIGNIFICANCE_LEVEL,
            winner: winner.into(),
            stability,
        }
    }
}

/// Both method results and their comparison, produced as one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultBundle {
    pub vip_results: MethodResult,
    pub cnn_results: MethodResult,
    pub comparison: ComparisonSummary,
}

#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    DatasetSelected {
        dataset: UploadedDataset,
    },
    ParametersChanged {
        parameters: AnalysisParameters,
    },
    RunStarted {
        parameters: AnalysisParameters,
    },
    StageReached {
        stage: Stage,
    },
    RunCompleted {
        // Boxed: the bundle carries two importance vectors.
        bundle: Box<ResultBundle>,
        parameters: AnalysisParameters,
    },
    RunCancelled,
    RunFailed {
        message: String,
    },
    ReportExported {
        path: PathBuf,
    },
    Notice(Notice),
}

/// Transient, fire-and-forget status messages for presentation layers.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    DatasetUploaded { name: String, size_bytes: u64 },
    Stage { label: String },
    AnalysisComplete,
    ReportDownloaded { path: PathBuf },
    NoDataset,
    Message(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::NoDataset)
    }

    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            Notice::DatasetUploaded { name, size_bytes } => format!(
                "File uploaded: {} ({:.2} MB)",
                name,
                *size_bytes as f64 / (1024.0 * 1024.0)
            ),
            Notice::Stage { label } => label.clone(),
            Notice::AnalysisComplete => "Analysis complete! Results are ready.".to_string(),
            Notice::ReportDownloaded { path } => format!("Report downloaded: {}", path.display()),
            Notice::NoDataset => "Please upload a dataset first".to_string(),
            Notice::Message(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let p = AnalysisParameters::default();
        assert_eq!(p.components, 10);
        assert_eq!(p.cv_folds, 5);
        assert_eq!(p.bootstrap_iterations, 100);
        assert_eq!(p.learning_rate, 0.001);
        assert_eq!(p.epochs, 100);
    }

    #[test]
    fn non_numeric_input_resets_every_field_to_default() {
        let mut p = AnalysisParameters {
            components: 3,
            cv_folds: 7,
            bootstrap_iterations: 500,
            learning_rate: 0.05,
            epochs: 20,
        };
        for field in ParamField::ALL {
            assert_eq!(p.set_raw(field, "abc"), ParamUpdate::Defaulted);
            // A second invalid value still lands on the default, not the prior value.
            assert_eq!(p.set_raw(field, ""), ParamUpdate::Defaulted);
        }
        assert_eq!(p, AnalysisParameters::default());
    }

    #[test]
    fn integer_fields_truncate_decimals() {
        let mut p = AnalysisParameters::default();
        assert_eq!(p.set_raw(ParamField::Components, " 12.9 "), ParamUpdate::Parsed);
        assert_eq!(p.components, 12);
        // Numeric input is stored as-is, without bound checks.
        assert_eq!(p.set_raw(ParamField::Epochs, "-4"), ParamUpdate::Parsed);
        assert_eq!(p.epochs, -4);
        assert_eq!(p.set_raw(ParamField::CvFolds, "-2.7"), ParamUpdate::Parsed);
        assert_eq!(p.cv_folds, -2);
        assert_eq!(p.set_raw(ParamField::Bootstrap, "1e40"), ParamUpdate::Defaulted);
        assert_eq!(p.bootstrap_iterations, 100);
    }

    #[test]
    fn learning_rate_rejects_non_finite() {
        let mut p = AnalysisParameters::default();
        p.set_raw(ParamField::LearningRate, "0.01");
        assert_eq!(p.learning_rate, 0.01);
        assert_eq!(
            p.set_raw(ParamField::LearningRate, "NaN"),
            ParamUpdate::Defaulted
        );
        assert_eq!(p.learning_rate, 0.001);
    }

    #[test]
    fn field_names_round_trip_and_unknown_is_rejected() {
        for field in ParamField::ALL {
            assert_eq!(field.name().parse::<ParamField>(), Ok(field));
        }
        assert_eq!("learningRate".parse::<ParamField>(), Ok(ParamField::LearningRate));
        assert_eq!(
            "gamma".parse::<ParamField>(),
            Err(ParameterError::Unknown("gamma".into()))
        );
    }

    #[test]
    fn significance_follows_threshold() {
        let s = Stability { vip: 0.9, cnn: 0.8 };
        assert!(ComparisonSummary::new(0.032, CNN_METHOD, s.clone()).is_significant);
        assert!(!ComparisonSummary::new(0.05, CNN_METHOD, s.clone()).is_significant);
        assert!(!ComparisonSummary::new(0.2, VIP_METHOD, s).is_significant);
    }
}
