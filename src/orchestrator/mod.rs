//! Application-level orchestration.
//!
//! This module owns the analysis run lifecycle (dataset, parameters, staged
//! run, results) and report export. UI/CLI layers talk to it through
//! `UiCommand`s and observe it through `AnalysisEvent`s.

mod controller;
mod post_process;

pub(crate) use controller::{run_controller, RunController, UiCommand};
pub(crate) use post_process::{save_in_dir, save_to_path};
