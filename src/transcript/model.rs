//! Transcript types: activity records, scripts, and the events a playback
//! streams to subscribers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Status badge of one activity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Pending,
    InProgress,
    Completed,
    Error,
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// One line of an AI activity transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub action: String,
    pub details: String,
    pub agent: String,
    pub status: ActivityStatus,
    /// How long before "now" the record claims to have happened.
    #[serde(with = "offset_secs")]
    pub offset: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
}

impl ActivityRecord {
    pub fn new(
        action: impl Into<String>,
        details: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            details: details.into(),
            agent: agent.into(),
            status: ActivityStatus::Completed,
            offset: Duration::ZERO,
            ticket_id: None,
        }
    }

    pub fn with_status(mut self, status: ActivityStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_ticket(mut self, ticket_id: impl Into<String>) -> Self {
        self.ticket_id = Some(ticket_id.into());
        self
    }

    pub fn ago(mut self, offset: Duration) -> Self {
        self.offset = offset;
        self
    }
}

mod offset_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

/// A fixed, ordered list of records plus the placeholder lines shown while
/// the assistant is "thinking".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub name: String,
    pub records: Vec<ActivityRecord>,
    pub thinking: &'static [&'static str],
}

impl Script {
    /// Thinking line for the record at `index`.
    pub fn thinking_line(&self, index: usize) -> &'static str {
        if self.thinking.is_empty() {
            "Thinking..."
        } else {
            self.thinking[index % self.thinking.len()]
        }
    }
}

/// Events streamed while a script plays.
///
/// Every variant carries the generation of the playback that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEvent {
    Started {
        generation: u64,
        script: String,
        records: usize,
    },
    Thinking {
        generation: u64,
        index: usize,
        message: String,
    },
    RecordStarted {
        generation: u64,
        index: usize,
        agent: String,
    },
    ActionProgress {
        generation: u64,
        index: usize,
        revealed: String,
    },
    ActionComplete {
        generation: u64,
        index: usize,
    },
    DetailsProgress {
        generation: u64,
        index: usize,
        revealed: String,
    },
    RecordCompleted {
        generation: u64,
        index: usize,
        record: ActivityRecord,
    },
    Finished {
        generation: u64,
        script: String,
    },
    /// Playback was stopped; `generation` is the now-current one.
    Cleared {
        generation: u64,
    },
}

impl TranscriptEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Started { generation, .. }
            | Self::Thinking { generation, .. }
            | Self::RecordStarted { generation, .. }
            | Self::ActionProgress { generation, .. }
            | Self::ActionComplete { generation, .. }
            | Self::DetailsProgress { generation, .. }
            | Self::RecordCompleted { generation, .. }
            | Self::Finished { generation, .. }
            | Self::Cleared { generation } => *generation,
        }
    }
}

/// The record currently being revealed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamingRecord {
    pub index: usize,
    pub agent: String,
    pub action: String,
    pub details: String,
    pub action_complete: bool,
}

/// Snapshot of what a transcript view shows right now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranscriptState {
    pub generation: u64,
    pub script: Option<String>,
    pub completed: Vec<ActivityRecord>,
    pub thinking: Option<String>,
    pub streaming: Option<StreamingRecord>,
    pub finished: bool,
}

impl TranscriptState {
    pub fn is_playing(&self) -> bool {
        self.script.is_some() && !self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_offset_as_seconds() {
        let record = ActivityRecord::new("Querying", "details", "Data Query Agent")
            .with_ticket("QRY-1")
            .ago(Duration::from_secs(60));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["offset"], 60);
        assert_eq!(json["status"], "completed");
        assert_eq!(json["ticket_id"], "QRY-1");
    }

    #[test]
    fn event_tagging() {
        let event = TranscriptEvent::ActionComplete {
            generation: 3,
            index: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "action_complete");
        assert_eq!(event.generation(), 3);
    }

    #[test]
    fn thinking_line_cycles() {
        let script = Script {
            name: "t".into(),
            records: vec![],
            thinking: &["a", "b"],
        };
        assert_eq!(script.thinking_line(0), "a");
        assert_eq!(script.thinking_line(3), "b");
    }
}
