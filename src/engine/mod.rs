pub mod results;
pub mod stages;

use crate::model::{ResultBundle, Stage};
use anyhow::Result;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum EngineControl {
    /// Stop at the next stage boundary without producing results
    Cancel,
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed(Box<ResultBundle>),
    Cancelled,
}

/// Drives the seven-stage sequence and materializes the result bundle.
///
/// Stages are paced by a fixed delay and do not depend on the dataset or the
/// analysis parameters.
pub struct AnalysisEngine {
    stage_delay: Duration,
}

impl AnalysisEngine {
    pub fn new(stage_delay: Duration) -> Self {
        Self { stage_delay }
    }

    pub async fn run(
        self,
        stage_tx: mpsc::UnboundedSender<Stage>,
        mut control_rx: mpsc::UnboundedReceiver<EngineControl>,
    ) -> Result<RunOutcome> {
        let mut control_open = true;

        for stage in stages::STAGES {
            if wait_or_cancel(self.stage_delay, &mut control_rx, &mut control_open).await {
                tracing::info!(stage = stage.index, "analysis cancelled");
                return Ok(RunOutcome::Cancelled);
            }
            tracing::debug!(progress = stage.progress, label = stage.label, "stage reached");
            let _ = stage_tx.send(stage);
        }

        let bundle = results::generate(&mut rand::thread_rng());
        Ok(RunOutcome::Completed(Box::new(bundle)))
    }
}

/// Sleep for `delay`, returning `true` if a cancel arrived first.
async fn wait_or_cancel(
    delay: Duration,
    control_rx: &mut mpsc::UnboundedReceiver<EngineControl>,
    control_open: &mut bool,
) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            msg = control_rx.recv(), if *control_open => match msg {
                Some(EngineControl::Cancel) => return true,
                // All control senders dropped; keep waiting out the delay.
                None => *control_open = false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn emits_all_stages_in_order_then_completes() {
        let (stage_tx, mut stage_rx) = mpsc::unbounded_channel();
        let (_ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();
        let engine = AnalysisEngine::new(Duration::from_secs(1));

        let started = tokio::time::Instant::now();
        let outcome = engine.run(stage_tx, ctrl_rx).await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(7) && elapsed < Duration::from_secs(8));

        let mut seen = Vec::new();
        while let Ok(s) = stage_rx.try_recv() {
            seen.push(s);
        }
        assert_eq!(seen, stages::STAGES.to_vec());
        assert!(matches!(outcome, RunOutcome::Completed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_control_channel_does_not_cancel() {
        let (stage_tx, _stage_rx) = mpsc::unbounded_channel();
        let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();
        drop(ctrl_tx);
        let outcome = AnalysisEngine::new(Duration::from_millis(10))
            .run(stage_tx, ctrl_rx)
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::Completed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_before_remaining_stages() {
        let (stage_tx, mut stage_rx) = mpsc::unbounded_channel();
        let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(AnalysisEngine::new(Duration::from_secs(1)).run(stage_tx, ctrl_rx));

        let first = stage_rx.recv().await.unwrap();
        assert_eq!(first.progress, 15);
        ctrl_tx.send(EngineControl::Cancel).unwrap();

        let outcome = handle.await.unwrap().unwrap();
        assert!(matches!(outcome, RunOutcome::Cancelled));
        assert!(stage_rx.recv().await.is_none());
    }
}
