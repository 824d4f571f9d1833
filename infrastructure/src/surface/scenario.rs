//! Scenario scripts
//!
//! A scenario is a TOML file describing what the four panes render and what
//! the user does, each step stamped with an offset from the start of the run.
//!
//! ```toml
//! name = "capital"
//! settle_secs = 5
//!
//! [[steps]]
//! at_ms = 0
//! kind = "submit"
//! question = "What is the capital of France?"
//!
//! [[steps]]
//! at_ms = 400
//! kind = "render"
//! slot = "topLeft"
//! text = "Paris"
//! busy = true
//! ```

use polyquorum_domain::{Provider, SlotId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Show text in a pane, optionally with the busy marker up
    Render {
        slot: SlotId,
        text: String,
        #[serde(default)]
        busy: bool,
    },
    /// Remove a pane's response element
    Hide { slot: SlotId },
    TypeText { text: String },
    Submit { question: String },
    Merge,
    NewTopic,
    SetSink { slot: SlotId },
    SetAggregation { enabled: bool },
    SetAutoMerge { enabled: bool },
    SetTimeout { seconds: i64 },
    ToggleSupersize { slot: SlotId },
    ChangeProvider { slot: SlotId, provider: Provider },
}

/// A step and when it happens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedStep {
    /// Milliseconds since the start of the run
    pub at_ms: u64,
    #[serde(flatten)]
    pub step: ScenarioStep,
}

impl TimedStep {
    pub fn new(at_ms: u64, step: ScenarioStep) -> Self {
        Self { at_ms, step }
    }
}

fn default_settle_secs() -> u64 {
    5
}

/// A complete scripted run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    /// Time to keep the engine running after the last step
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
    #[serde(default)]
    pub steps: Vec<TimedStep>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut scenario = Self::from_toml_str(&content)?;
        if scenario.name.is_empty()
            && let Some(stem) = path.file_stem()
        {
            scenario.name = stem.to_string_lossy().into_owned();
        }
        Ok(scenario)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ScenarioError> {
        let mut scenario: Scenario = toml::from_str(content)?;
        scenario.validate()?;
        scenario.steps.sort_by_key(|step| step.at_ms);
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        if self.steps.is_empty() {
            return Err(ScenarioError::Invalid("no steps".to_string()));
        }
        for step in &self.steps {
            match &step.step {
                ScenarioStep::Submit { question } if question.trim().is_empty() => {
                    return Err(ScenarioError::Invalid(format!(
                        "blank question at {}ms",
                        step.at_ms
                    )));
                }
                ScenarioStep::SetTimeout { seconds } if *seconds < -1 => {
                    return Err(ScenarioError::Invalid(format!(
                        "timeout {} at {}ms (use -1, 0 or a positive number)",
                        seconds, step.at_ms
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Replace the first submitted question with `question`, or submit it at
    /// the start if the script never asks one
    pub fn with_question(mut self, question: &str) -> Self {
        let existing = self.steps.iter_mut().find_map(|step| match &mut step.step {
            ScenarioStep::Submit { question } => Some(question),
            _ => None,
        });
        match existing {
            Some(q) => *q = question.to_string(),
            None => self.steps.insert(
                0,
                TimedStep::new(
                    0,
                    ScenarioStep::Submit {
                        question: question.to_string(),
                    },
                ),
            ),
        }
        self
    }

    /// The first question the script submits
    pub fn question(&self) -> Option<&str> {
        self.steps.iter().find_map(|step| match &step.step {
            ScenarioStep::Submit { question } => Some(question.as_str()),
            _ => None,
        })
    }

    /// Offset of the last step
    pub fn duration_ms(&self) -> u64 {
        self.steps.last().map(|step| step.at_ms).unwrap_or(0)
    }

    /// Built-in run: three sources answer, the bottom-right pane synthesizes.
    ///
    /// Top-left and bottom-left stream with the busy marker up; top-right
    /// renders its answer in two bursts with no marker.
    pub fn demo() -> Self {
        use ScenarioStep::*;

        let render = |slot, text: &str, busy| Render {
            slot,
            text: text.to_string(),
            busy,
        };

        Self {
            name: "demo".to_string(),
            settle_secs: 5,
            steps: vec![
                TimedStep::new(0, SetAggregation { enabled: true }),
                TimedStep::new(
                    0,
                    Submit {
                        question: "What is the capital of France?".to_string(),
                    },
                ),
                TimedStep::new(300, render(SlotId::TopLeft, "The capital", true)),
                TimedStep::new(500, render(SlotId::BottomLeft, "Paris is", true)),
                TimedStep::new(700, render(SlotId::TopRight, "Paris [1]", false)),
                TimedStep::new(
                    1200,
                    render(SlotId::TopLeft, "The capital of France is Paris.", true),
                ),
                TimedStep::new(
                    1400,
                    render(
                        SlotId::TopRight,
                        "Paris [1], seat of the French government since 987.",
                        false,
                    ),
                ),
                TimedStep::new(
                    1600,
                    render(SlotId::TopLeft, "The capital of France is Paris.", false),
                ),
                TimedStep::new(
                    2200,
                    render(
                        SlotId::BottomLeft,
                        "Paris is the capital and largest city of France.",
                        true,
                    ),
                ),
                TimedStep::new(
                    2600,
                    render(
                        SlotId::BottomLeft,
                        "Paris is the capital and largest city of France.",
                        false,
                    ),
                ),
            ],
        }
    }
}
