//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Timing of transcript playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    /// How long the "thinking" placeholder shows before a record streams.
    pub thinking: Duration,
    /// Delay between revealed characters of the action text.
    pub action_char: Duration,
    /// Pause between the finished action text and the first detail character.
    pub details_lead: Duration,
    /// Delay between revealed characters of the detail text.
    pub details_char: Duration,
    /// Pause after the details finish, before the record is marked complete.
    pub settle: Duration,
    /// Gap between a completed record and the next record's thinking phase.
    pub between_records: Duration,
    /// Pause before an assistant reply starts typing.
    pub reply_lead: Duration,
    /// Delay between typed characters of an assistant reply.
    pub reply_char: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            thinking: Duration::from_millis(2000),
            action_char: Duration::from_millis(50),
            details_lead: Duration::from_millis(300),
            details_char: Duration::from_millis(30),
            settle: Duration::from_millis(500),
            between_records: Duration::from_millis(2000),
            reply_lead: Duration::from_millis(500),
            reply_char: Duration::from_millis(30),
        }
    }
}

impl Pacing {
    /// Zero delays everywhere. Playback still yields between steps.
    pub fn instant() -> Self {
        Self {
            thinking: Duration::ZERO,
            action_char: Duration::ZERO,
            details_lead: Duration::ZERO,
            details_char: Duration::ZERO,
            settle: Duration::ZERO,
            between_records: Duration::ZERO,
            reply_lead: Duration::ZERO,
            reply_char: Duration::ZERO,
        }
    }

    /// Multiply every delay by `percent / 100`.
    pub fn scaled(&self, percent: u32) -> Self {
        let scale = |d: Duration| d * percent / 100;
        Self {
            thinking: scale(self.thinking),
            action_char: scale(self.action_char),
            details_lead: scale(self.details_lead),
            details_char: scale(self.details_char),
            settle: scale(self.settle),
            between_records: scale(self.between_records),
            reply_lead: scale(self.reply_lead),
            reply_char: scale(self.reply_char),
        }
    }
}

/// Simulator configuration.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Path of the durable flag database.
    pub db_path: PathBuf,
    /// Transcript playback timing.
    pub pacing: Pacing,
    /// Delay before a chat reply is delivered.
    pub reply_delay: Duration,
    /// Delay between a chat reply and the start of its transcript script.
    pub script_start_delay: Duration,
    /// Simulated network latency on login.
    pub login_delay: Duration,
    /// Time after opening a journey at "File Upload Pending" until the
    /// candidate's documents count as uploaded.
    pub document_upload_delay: Duration,
    /// Telemetry feed tick.
    pub telemetry_interval: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/onboard-assist.db"),
            pacing: Pacing::default(),
            reply_delay: Duration::from_millis(1500),
            script_start_delay: Duration::from_millis(2000),
            login_delay: Duration::from_millis(800),
            document_upload_delay: Duration::from_secs(20),
            telemetry_interval: Duration::from_secs(15),
        }
    }
}

impl SimConfig {
    /// Build from `ONBOARD_ASSIST_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup("ONBOARD_ASSIST_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(scale) = parse_var::<u32>(&lookup, "ONBOARD_ASSIST_PACING_MS_SCALE")? {
            config.pacing = config.pacing.scaled(scale);
            config.reply_delay = config.reply_delay * scale / 100;
            config.script_start_delay = config.script_start_delay * scale / 100;
            config.login_delay = config.login_delay * scale / 100;
        }

        if let Some(secs) = parse_var::<u64>(&lookup, "ONBOARD_ASSIST_DOC_UPLOAD_SECS")? {
            config.document_upload_delay = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_var::<u64>(&lookup, "ONBOARD_ASSIST_TELEMETRY_SECS")? {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "ONBOARD_ASSIST_TELEMETRY_SECS".to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
            config.telemetry_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Configuration with every delay zeroed (tests and scripted demos).
    pub fn instant() -> Self {
        Self {
            pacing: Pacing::instant(),
            reply_delay: Duration::ZERO,
            script_start_delay: Duration::ZERO,
            login_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
    }
}
