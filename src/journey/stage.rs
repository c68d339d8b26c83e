//! Stage state machine — the closed set of onboarding stages and the plan
//! that orders them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::JourneyError;

/// Words that count as approving a pending exception.
pub const APPROVAL_KEYWORDS: &[&str] = &["yes", "approve", "accept", "proceed"];

/// The stages a candidate journey moves through.
///
/// Progresses linearly under the standard plan: NotStarted →
/// FileUploadPending → BgcPending → IdCreationPending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    NotStarted,
    FileUploadPending,
    BgcPending,
    IdCreationPending,
}

impl Stage {
    /// Human-facing label shown on badges.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::FileUploadPending => "File Upload Pending",
            Self::BgcPending => "BGC Pending",
            Self::IdCreationPending => "ID Creation Pending",
        }
    }

    /// Parse either the snake_case code or the display label.
    pub fn parse(s: &str) -> Option<Self> {
        let all = [
            Self::NotStarted,
            Self::FileUploadPending,
            Self::BgcPending,
            Self::IdCreationPending,
        ];
        all.into_iter()
            .find(|stage| stage.to_string() == s || stage.label().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::FileUploadPending => "file_upload_pending",
            Self::BgcPending => "bgc_pending",
            Self::IdCreationPending => "id_creation_pending",
        };
        write!(f, "{s}")
    }
}

/// What makes a journey enter a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A delay elapses after the journey is opened.
    Elapsed(Duration),
    /// A transcript script for the journey played to the end.
    ScriptCompleted,
    /// User input contains one of the keywords (case-insensitive).
    Keywords(&'static [&'static str]),
}

/// The reason an advance was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cause {
    Elapsed,
    ScriptCompleted,
    Input(String),
}

impl Trigger {
    /// Whether `cause` satisfies this trigger.
    pub fn fires_on(&self, cause: &Cause) -> bool {
        match (self, cause) {
            (Self::Elapsed(_), Cause::Elapsed) => true,
            (Self::ScriptCompleted, Cause::ScriptCompleted) => true,
            (Self::Keywords(words), Cause::Input(text)) => contains_any(text, words),
            _ => false,
        }
    }
}

/// Case-insensitive substring match against a keyword set.
pub fn contains_any(text: &str, words: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    words.iter().any(|w| lowered.contains(&w.to_lowercase()))
}

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub stage: Stage,
    /// Progress percentage once the journey is at this stage.
    pub progress: u8,
    /// What moves a journey into this stage. `None` only for the first step.
    pub trigger: Option<Trigger>,
    /// Entering this stage resolves the journey's open exceptions.
    pub clears_exceptions: bool,
}

/// Ordered stage list with an implied transition table: each step can only
/// be entered from the step before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    steps: Vec<Step>,
}

impl StagePlan {
    /// Validate and build a plan.
    pub fn new(steps: Vec<Step>) -> Result<Self, JourneyError> {
        let Some(first) = steps.first() else {
            return Err(JourneyError::InvalidPlan("plan has no steps".into()));
        };
        if first.trigger.is_some() {
            return Err(JourneyError::InvalidPlan(format!(
                "first step {} cannot have a trigger",
                first.stage
            )));
        }
        for (i, step) in steps.iter().enumerate() {
            if step.progress > 100 {
                return Err(JourneyError::InvalidPlan(format!(
                    "progress {} of {} exceeds 100",
                    step.progress, step.stage
                )));
            }
            if steps[..i].iter().any(|s| s.stage == step.stage) {
                return Err(JourneyError::InvalidPlan(format!(
                    "stage {} appears twice",
                    step.stage
                )));
            }
            if i > 0 {
                if step.trigger.is_none() {
                    return Err(JourneyError::InvalidPlan(format!(
                        "step {} has no trigger",
                        step.stage
                    )));
                }
                if step.progress < steps[i - 1].progress {
                    return Err(JourneyError::InvalidPlan(format!(
                        "progress drops from {} to {} at {}",
                        steps[i - 1].progress, step.progress, step.stage
                    )));
                }
            }
        }
        Ok(Self { steps })
    }

    /// The standard onboarding plan.
    pub fn standard(document_upload_delay: Duration) -> Self {
        Self {
            steps: vec![
                Step {
                    stage: Stage::NotStarted,
                    progress: 0,
                    trigger: None,
                    clears_exceptions: false,
                },
                Step {
                    stage: Stage::FileUploadPending,
                    progress: 10,
                    trigger: Some(Trigger::ScriptCompleted),
                    clears_exceptions: false,
                },
                Step {
                    stage: Stage::BgcPending,
                    progress: 15,
                    trigger: Some(Trigger::Elapsed(document_upload_delay)),
                    clears_exceptions: false,
                },
                Step {
                    stage: Stage::IdCreationPending,
                    progress: 35,
                    trigger: Some(Trigger::Keywords(APPROVAL_KEYWORDS)),
                    clears_exceptions: true,
                },
            ],
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn first(&self) -> &Step {
        &self.steps[0]
    }

    pub fn step(&self, stage: Stage) -> Option<&Step> {
        self.steps.iter().find(|s| s.stage == stage)
    }

    /// The step that follows `stage`, if any.
    pub fn next(&self, stage: Stage) -> Option<&Step> {
        let idx = self.steps.iter().position(|s| s.stage == stage)?;
        self.steps.get(idx + 1)
    }

    /// Check if a transition from `from` to `to` is valid.
    pub fn can_transition(&self, from: Stage, to: Stage) -> bool {
        self.next(from).is_some_and(|s| s.stage == to)
    }

    /// Whether `stage` is the last step of the plan.
    pub fn is_terminal(&self, stage: Stage) -> bool {
        self.steps.last().is_some_and(|s| s.stage == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> StagePlan {
        StagePlan::standard(Duration::from_secs(20))
    }

    #[test]
    fn valid_transitions() {
        use Stage::*;
        let plan = plan();
        for (from, to) in [
            (NotStarted, FileUploadPending),
            (FileUploadPending, BgcPending),
            (BgcPending, IdCreationPending),
        ] {
            assert!(plan.can_transition(from, to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use Stage::*;
        let plan = plan();
        // Skip
        assert!(!plan.can_transition(NotStarted, BgcPending));
        // Backward
        assert!(!plan.can_transition(BgcPending, FileUploadPending));
        // Terminal
        assert!(!plan.can_transition(IdCreationPending, NotStarted));
        // Self
        assert!(!plan.can_transition(BgcPending, BgcPending));
    }

    #[test]
    fn terminal_is_last_step() {
        let plan = plan();
        assert!(plan.is_terminal(Stage::IdCreationPending));
        assert!(!plan.is_terminal(Stage::BgcPending));
        assert!(plan.next(Stage::IdCreationPending).is_none());
    }

    #[test]
    fn standard_progress_values() {
        let plan = plan();
        let progress: Vec<u8> = plan.steps().iter().map(|s| s.progress).collect();
        assert_eq!(progress, vec![0, 10, 15, 35]);
    }

    #[test]
    fn keyword_trigger_is_case_insensitive() {
        let trigger = Trigger::Keywords(APPROVAL_KEYWORDS);
        assert!(trigger.fires_on(&Cause::Input("Please APPROVE it".into())));
        assert!(trigger.fires_on(&Cause::Input("yes".into())));
        assert!(!trigger.fires_on(&Cause::Input("not now".into())));
        assert!(!trigger.fires_on(&Cause::Elapsed));
    }

    #[test]
    fn mixed_case_keywords_match() {
        let trigger = Trigger::Keywords(&["Approve", "GO AHEAD"]);
        assert!(trigger.fires_on(&Cause::Input("i approve".into())));
        assert!(trigger.fires_on(&Cause::Input("Go ahead then".into())));
        assert!(!trigger.fires_on(&Cause::Input("wait".into())));
    }

    #[test]
    fn elapsed_trigger_ignores_input() {
        let trigger = Trigger::Elapsed(Duration::from_secs(1));
        assert!(trigger.fires_on(&Cause::Elapsed));
        assert!(!trigger.fires_on(&Cause::Input("approve".into())));
        assert!(!trigger.fires_on(&Cause::ScriptCompleted));
    }

    #[test]
    fn display_matches_serde() {
        for stage in plan().steps().iter().map(|s| s.stage) {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(format!("\"{stage}\""), json);
        }
    }

    #[test]
    fn parse_accepts_code_and_label() {
        assert_eq!(Stage::parse("bgc_pending"), Some(Stage::BgcPending));
        assert_eq!(Stage::parse("BGC Pending"), Some(Stage::BgcPending));
        assert_eq!(Stage::parse("id creation pending"), Some(Stage::IdCreationPending));
        assert_eq!(Stage::parse("Day 30"), None);
    }

    #[test]
    fn rejects_empty_plan() {
        assert!(StagePlan::new(vec![]).is_err());
    }

    #[test]
    fn rejects_duplicate_stage() {
        let steps = vec![
            Step {
                stage: Stage::NotStarted,
                progress: 0,
                trigger: None,
                clears_exceptions: false,
            },
            Step {
                stage: Stage::NotStarted,
                progress: 5,
                trigger: Some(Trigger::ScriptCompleted),
                clears_exceptions: false,
            },
        ];
        assert!(StagePlan::new(steps).is_err());
    }

    #[test]
    fn rejects_decreasing_progress() {
        let steps = vec![
            Step {
                stage: Stage::BgcPending,
                progress: 15,
                trigger: None,
                clears_exceptions: false,
            },
            Step {
                stage: Stage::IdCreationPending,
                progress: 10,
                trigger: Some(Trigger::Keywords(APPROVAL_KEYWORDS)),
                clears_exceptions: true,
            },
        ];
        assert!(StagePlan::new(steps).is_err());
    }

    #[test]
    fn custom_two_step_plan() {
        let plan = StagePlan::new(vec![
            Step {
                stage: Stage::BgcPending,
                progress: 15,
                trigger: None,
                clears_exceptions: false,
            },
            Step {
                stage: Stage::IdCreationPending,
                progress: 35,
                trigger: Some(Trigger::Keywords(APPROVAL_KEYWORDS)),
                clears_exceptions: true,
            },
        ])
        .unwrap();
        assert_eq!(plan.first().stage, Stage::BgcPending);
        assert!(plan.is_terminal(Stage::IdCreationPending));
    }
}
