//! Keyword intent classification.
//!
//! Rules are checked in a fixed order and the first match wins. All
//! matching is case-insensitive substring matching.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::journey::{APPROVAL_KEYWORDS, CandidateJourney};

pub const START_KEYWORDS: &[&str] = &["start", "initiate", "begin"];
pub const BGC_KEYWORDS: &[&str] = &["bgc", "background", "check"];
pub const STATUS_KEYWORDS: &[&str] = &["status", "update", "progress"];
pub const DOCUMENT_KEYWORDS: &[&str] = &["document", "upload"];
pub const MODE_KEYWORDS: &[&str] = &["autonomous", "assist"];

/// How much the assistant may do on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserMode {
    #[default]
    Assist,
    Autonomous,
}

impl UserMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "assist" => Some(Self::Assist),
            "autonomous" => Some(Self::Autonomous),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assist => write!(f, "assist"),
            Self::Autonomous => write!(f, "autonomous"),
        }
    }
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Approve,
    Start,
    MentionsCandidate { case_id: String },
    BgcQuery,
    Status,
    Documents,
    SwitchMode(UserMode),
    Fallback,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Start => "start",
            Self::MentionsCandidate { .. } => "mentions_candidate",
            Self::BgcQuery => "bgc_query",
            Self::Status => "status",
            Self::Documents => "documents",
            Self::SwitchMode(_) => "switch_mode",
            Self::Fallback => "fallback",
        }
    }
}

fn keyword_regex(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)({alternation})")).expect("escaped keyword alternation is valid")
}

/// Ordered keyword rules.
pub struct IntentClassifier {
    approve: Regex,
    start: Regex,
    bgc: Regex,
    status: Regex,
    documents: Regex,
    mode: Regex,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self {
            approve: keyword_regex(APPROVAL_KEYWORDS),
            start: keyword_regex(START_KEYWORDS),
            bgc: keyword_regex(BGC_KEYWORDS),
            status: keyword_regex(STATUS_KEYWORDS),
            documents: keyword_regex(DOCUMENT_KEYWORDS),
            mode: keyword_regex(MODE_KEYWORDS),
        }
    }
}

impl IntentClassifier {
    /// Classify `input`. `candidates` are the journeys whose first names
    /// count as mentions.
    pub fn classify(&self, input: &str, candidates: &[CandidateJourney]) -> Intent {
        if self.approve.is_match(input) {
            return Intent::Approve;
        }
        if self.start.is_match(input) {
            return Intent::Start;
        }
        if let Some(j) = candidates.iter().find(|j| j.is_mentioned_in(input)) {
            return Intent::MentionsCandidate {
                case_id: j.case_id.clone(),
            };
        }
        if self.bgc.is_match(input) {
            return Intent::BgcQuery;
        }
        if self.status.is_match(input) {
            return Intent::Status;
        }
        if self.documents.is_match(input) {
            return Intent::Documents;
        }
        if self.mode.is_match(input) {
            let mode = if input.to_lowercase().contains("autonomous") {
                UserMode::Autonomous
            } else {
                UserMode::Assist
            };
            return Intent::SwitchMode(mode);
        }
        Intent::Fallback
    }
}
