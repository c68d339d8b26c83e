//! Scripted AI activity transcripts.

pub mod model;
pub mod player;
pub mod scripts;

pub use model::{
    ActivityRecord, ActivityStatus, Script, StreamingRecord, TranscriptEvent, TranscriptState,
};
pub use player::{Playback, TranscriptPlayer};
