//! Candidate journeys and the stage sequencer that advances them.

pub mod model;
pub mod sequencer;
pub mod stage;

pub use model::{CandidateJourney, SEED_VERSION, seed_journeys};
pub use sequencer::{AdvanceOutcome, JourneyEvent, StageSequencer};
pub use stage::{APPROVAL_KEYWORDS, Cause, Stage, StagePlan, Step, Trigger};
