//! Candidate journey model and seed data.

use serde::{Deserialize, Serialize};

use super::stage::Stage;

/// Bump when the seed table changes; stale durable flags get wiped.
pub const SEED_VERSION: i64 = 1;

/// A simulated candidate's progress through onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateJourney {
    pub case_id: String,
    pub name: String,
    pub stage: Stage,
    /// 0–100.
    pub progress: u8,
    pub exception_count: u32,
}

impl CandidateJourney {
    pub fn new(
        case_id: impl Into<String>,
        name: impl Into<String>,
        stage: Stage,
        progress: u8,
        exception_count: u32,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            name: name.into(),
            stage,
            progress: progress.min(100),
            exception_count,
        }
    }

    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    /// Whether `text` mentions this candidate by first name (case-insensitive).
    pub fn is_mentioned_in(&self, text: &str) -> bool {
        let first = self.first_name().to_lowercase();
        !first.is_empty() && text.to_lowercase().contains(&first)
    }
}

/// The journeys every session starts from.
pub fn seed_journeys() -> Vec<CandidateJourney> {
    vec![
        CandidateJourney::new("CS0001", "Alex Morgan", Stage::NotStarted, 0, 0),
        CandidateJourney::new("CS0002", "Jordan Lee", Stage::BgcPending, 15, 1),
        CandidateJourney::new("CS0003", "Taylor Smith", Stage::FileUploadPending, 10, 0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_has_unique_cases() {
        let seeds = seed_journeys();
        let mut ids: Vec<_> = seeds.iter().map(|j| j.case_id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), seeds.len());
    }

    #[test]
    fn jordan_seed() {
        let jordan = seed_journeys()
            .into_iter()
            .find(|j| j.case_id == "CS0002")
            .unwrap();
        assert_eq!(jordan.stage, Stage::BgcPending);
        assert_eq!(jordan.progress, 15);
        assert_eq!(jordan.exception_count, 1);
    }

    #[test]
    fn mention_matches_first_name() {
        let alex = CandidateJourney::new("CS0001", "Alex Morgan", Stage::NotStarted, 0, 0);
        assert!(alex.is_mentioned_in("Start onboarding for ALEX please"));
        assert!(!alex.is_mentioned_in("what about morgan"));
        assert_eq!(alex.first_name(), "Alex");
    }

    #[test]
    fn progress_is_clamped() {
        let j = CandidateJourney::new("X", "X", Stage::NotStarted, 140, 0);
        assert_eq!(j.progress, 100);
    }

    #[test]
    fn serde_roundtrip() {
        let j = seed_journeys().remove(1);
        let json = serde_json::to_string(&j).unwrap();
        assert!(json.contains("\"stage\":\"bgc_pending\""));
        let parsed: CandidateJourney = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, j);
    }
}
