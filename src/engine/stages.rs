use crate::model::Stage;

pub const STAGE_COUNT: usize = 7;

/// The fixed reporting sequence for an analysis run.
pub const STAGES: [Stage; STAGE_COUNT] = [
    Stage {
        index: 0,
        progress: 15,
        label: "Loading and preprocessing data…",
    },
    Stage {
        index: 1,
        progress: 30,
        label: "Running PLS-DA analysis…",
    },
    Stage {
        index: 2,
        progress: 45,
        label: "Computing VIP scores…",
    },
    Stage {
        index: 3,
        progress: 60,
        label: "Training CNN model…",
    },
    Stage {
        index: 4,
        progress: 75,
        label: "Calculating SHAP values…",
    },
    Stage {
        index: 5,
        progress: 90,
        label: "Statistical validation…",
    },
    Stage {
        index: 6,
        progress: 100,
        label: "Analysis complete!",
    },
];
