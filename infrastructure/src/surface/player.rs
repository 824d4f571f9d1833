//! Scenario playback
//!
//! Applies each [`TimedStep`] at its offset: pane changes go to the
//! [`ScriptedSurface`] followed by a change notification, user actions go
//! straight to the engine.

use super::scenario::{Scenario, ScenarioStep, TimedStep};
use super::scripted::ScriptedSurface;
use polyquorum_application::{EngineError, EngineEvent, EngineHandle};
use polyquorum_domain::{MergeTimeout, Question};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, info};

/// Drives one scenario against a running engine
pub struct ScenarioPlayer {
    surface: Arc<ScriptedSurface>,
    handle: EngineHandle,
}

impl ScenarioPlayer {
    pub fn new(surface: Arc<ScriptedSurface>, handle: EngineHandle) -> Self {
        Self { surface, handle }
    }

    /// Play every step, then wait out the settle period
    pub async fn play(&self, scenario: &Scenario) -> Result<(), EngineError> {
        info!(
            "Playing scenario '{}' ({} steps)",
            scenario.name,
            scenario.steps.len()
        );

        let start = Instant::now();
        for step in &scenario.steps {
            sleep_until(start + Duration::from_millis(step.at_ms)).await;
            self.apply(step).await?;
        }

        debug!("Settling for {}s", scenario.settle_secs);
        sleep(Duration::from_secs(scenario.settle_secs)).await;
        Ok(())
    }

    async fn apply(&self, step: &TimedStep) -> Result<(), EngineError> {
        debug!("{}ms: {:?}", step.at_ms, step.step);

        match &step.step {
            ScenarioStep::Render { slot, text, busy } => {
                self.surface.render(*slot, text.clone(), *busy);
                self.handle.surface_changed(*slot).await
            }
            ScenarioStep::Hide { slot } => {
                self.surface.hide(*slot);
                self.handle.surface_changed(*slot).await
            }
            ScenarioStep::TypeText { text } => self.handle.type_text(text.clone()).await,
            ScenarioStep::Submit { question } => {
                let question = Question::try_new(question.clone())?;
                self.handle.type_text(question.content()).await?;
                self.handle.send(EngineEvent::Submit(question)).await
            }
            ScenarioStep::Merge => self.handle.merge().await,
            ScenarioStep::NewTopic => self.handle.new_topic().await,
            ScenarioStep::SetSink { slot } => self.handle.set_sink(*slot).await,
            ScenarioStep::SetAggregation { enabled } => {
                self.handle.set_aggregation(*enabled).await
            }
            ScenarioStep::SetAutoMerge { enabled } => self.handle.set_auto_merge(*enabled).await,
            ScenarioStep::SetTimeout { seconds } => {
                let timeout = MergeTimeout::from_seconds(*seconds)?;
                self.handle.set_timeout(timeout).await
            }
            ScenarioStep::ToggleSupersize { slot } => self.handle.toggle_supersize(*slot).await,
            ScenarioStep::ChangeProvider { slot, provider } => {
                self.handle.change_provider(*slot, provider.clone()).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyquorum_application::{EngineConfig, QuorumEngine};
    use polyquorum_domain::{MergeSettings, SlotId};
    use tokio_util::sync::CancellationToken;

    async fn run(
        config: EngineConfig,
        scenario: Scenario,
    ) -> (Arc<ScriptedSurface>, polyquorum_application::EngineReport) {
        let surface = Arc::new(ScriptedSurface::new());
        let (engine, handle) = QuorumEngine::new(config, surface.clone(), surface.clone());
        let task = tokio::spawn(engine.run(CancellationToken::new()));

        ScenarioPlayer::new(surface.clone(), handle.clone())
            .play(&scenario)
            .await
            .unwrap();
        handle.shutdown().await.unwrap();
        let report = task.await.unwrap();
        (surface, report)
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_merges_into_sink() {
        let (surface, report) = run(EngineConfig::default(), Scenario::demo()).await;

        assert_eq!(report.cycles, 1);
        assert_eq!(report.merges.len(), 1);
        let merge = &report.merges[0];
        assert_eq!(merge.sink, SlotId::BottomRight);
        assert!(merge.submitted);
        assert_eq!(merge.request.window_count(), 3);

        let synthesis = surface.submissions(SlotId::BottomRight);
        assert_eq!(synthesis.len(), 1);
        assert!(synthesis[0].contains("Original question:\nWhat is the capital of France?"));
        assert!(synthesis[0].contains("The capital of France is Paris."));
        assert!(synthesis[0].contains("seat of the French government"));
        assert_eq!(
            surface.submissions(SlotId::TopLeft),
            vec!["What is the capital of France?"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_merge_after_partial_quorum() {
        let config = EngineConfig::new(
            MergeSettings::default()
                .with_aggregation(true)
                .with_auto_merge(false)
                .with_timeout(MergeTimeout::Disabled),
        );
        let scenario = Scenario::from_toml_str(
            r#"
settle_secs = 2

[[steps]]
at_ms = 0
kind = "submit"
question = "Best sorting algorithm?"

[[steps]]
at_ms = 100
kind = "render"
slot = "topLeft"
text = "It depends"
busy = true

[[steps]]
at_ms = 400
kind = "render"
slot = "topLeft"
text = "It depends on the data."

[[steps]]
at_ms = 3000
kind = "merge"
"#,
        )
        .unwrap();

        let (surface, report) = run(config, scenario).await;

        assert_eq!(report.merges.len(), 1);
        assert_eq!(report.merges[0].request.window_count(), 1);
        let synthesis = surface.submissions(SlotId::BottomRight);
        assert_eq!(synthesis.len(), 1);
        assert!(synthesis[0].contains("It depends on the data."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_merge_without_aggregation() {
        let scenario = Scenario {
            name: "plain".to_string(),
            settle_secs: 3,
            steps: vec![
                TimedStep::new(
                    0,
                    ScenarioStep::Submit {
                        question: "Hello?".to_string(),
                    },
                ),
                TimedStep::new(
                    200,
                    ScenarioStep::Render {
                        slot: SlotId::BottomRight,
                        text: "Hi".to_string(),
                        busy: false,
                    },
                ),
            ],
        };

        let (surface, report) = run(EngineConfig::default(), scenario).await;

        assert!(report.merges.is_empty());
        assert_eq!(surface.submissions(SlotId::BottomRight), vec!["Hello?"]);
        assert_eq!(surface.submissions(SlotId::TopLeft), vec!["Hello?"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_timeout_step_errors() {
        let surface = Arc::new(ScriptedSurface::new());
        let (_engine, handle) =
            QuorumEngine::new(EngineConfig::default(), surface.clone(), surface.clone());
        let player = ScenarioPlayer::new(surface, handle);

        let step = TimedStep::new(0, ScenarioStep::SetTimeout { seconds: -5 });
        assert!(matches!(
            player.apply(&step).await,
            Err(EngineError::Domain(_))
        ));
    }
}
