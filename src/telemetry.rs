//! Telemetry feed — randomized demo events and banner notifications.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::debug;
use uuid::Uuid;

/// Events kept in the feed.
pub const FEED_CAPACITY: usize = 20;
/// Events generated when the feed starts.
pub const INITIAL_EVENTS: usize = 5;
/// Chance that a notifiable event raises a notification.
pub const NOTIFICATION_PROBABILITY: f64 = 0.3;

const EMPLOYEES: &[&str] = &[
    "Alex Morgan",
    "Jordan Lee",
    "Taylor Smith",
    "Casey Johnson",
    "Morgan Davis",
    "Riley Parker",
    "Jamie Brooks",
    "Avery Collins",
    "Dylan Carter",
    "Harper Reed",
    "Cameron White",
    "Skylar Brown",
    "Sage Wilson",
    "Blake Martinez",
    "Drew Anderson",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryKind {
    BgvUpdate,
    ComplianceToggle,
    ExceptionCreated,
    ExceptionResolved,
    TaskCompleted,
    AgentAction,
}

impl TelemetryKind {
    pub const ALL: [Self; 6] = [
        Self::BgvUpdate,
        Self::ComplianceToggle,
        Self::ExceptionCreated,
        Self::ExceptionResolved,
        Self::TaskCompleted,
        Self::AgentAction,
    ];

    fn templates(&self) -> &'static [&'static str] {
        match self {
            Self::BgvUpdate => &[
                "BGV status updated from Pending → InProgress",
                "BGV status updated from InProgress → Clear",
                "BGV status updated from Pending → Clear",
                "BGV verification completed successfully",
            ],
            Self::ComplianceToggle => &[
                "NDA acknowledgment completed",
                "Code of Conduct policy acknowledged",
                "Safety policy acknowledgment received",
                "Data privacy policy accepted",
            ],
            Self::ExceptionCreated => &[
                "Document mismatch exception created",
                "Identity verification exception raised",
                "IT access delay exception flagged",
                "Compliance pending exception created",
            ],
            Self::ExceptionResolved => &[
                "Document mismatch resolved",
                "Identity verification completed",
                "IT access issue resolved",
                "Compliance requirement satisfied",
            ],
            Self::TaskCompleted => &[
                "Security awareness training completed",
                "Asset pickup completed",
                "Orientation session finished",
                "Badge creation completed",
                "Workspace assignment completed",
            ],
            Self::AgentAction => &[
                "DATA_COLLECTION_VALIDATION: Document verification initiated",
                "BGC_VENDOR_COORDINATION: Background check submitted",
                "IT_ACCESS: Email account provisioned",
                "HR_PAYROLL_SETUP: Employee record created",
                "TRAINING_ONBOARDING: Learning path assigned",
                "ENGAGEMENT_FEEDBACK: Welcome survey sent",
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryEvent {
    pub id: Uuid,
    pub kind: TelemetryKind,
    pub description: String,
    pub at: DateTime<Utc>,
    pub case_id: String,
    pub employee_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    pub at: DateTime<Utc>,
    pub read: bool,
    pub actionable: bool,
    pub case_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedUpdate {
    Event(TelemetryEvent),
    Notification(Notification),
}

/// Agent prefix of an `AGENT_NAME: ...` description.
fn agent_of(description: &str) -> String {
    match description.split_once(':') {
        Some((prefix, _))
            if !prefix.is_empty()
                && prefix.chars().all(|c| c.is_ascii_uppercase() || c == '_') =>
        {
            prefix.to_string()
        }
        _ => "SYSTEM".to_string(),
    }
}

/// The notification an event would raise, if its kind is notifiable.
pub fn notification_for(event: &TelemetryEvent) -> Option<Notification> {
    let (level, title, message, actionable) = match event.kind {
        TelemetryKind::ExceptionCreated => (
            NotificationLevel::Warning,
            "Exception Created",
            format!("{}: {}", event.employee_name, event.description),
            true,
        ),
        TelemetryKind::BgvUpdate if event.description.contains("Clear") => (
            NotificationLevel::Success,
            "BGV Completed",
            format!("{}: Background verification cleared", event.employee_name),
            false,
        ),
        TelemetryKind::ComplianceToggle => (
            NotificationLevel::Info,
            "Compliance Updated",
            format!("{}: {}", event.employee_name, event.description),
            false,
        ),
        _ => return None,
    };
    Some(Notification {
        id: Uuid::new_v4(),
        level,
        title: title.to_string(),
        message,
        at: event.at,
        read: false,
        actionable,
        case_id: event.case_id.clone(),
    })
}

/// Rolling feed of the newest events, newest first.
pub struct TelemetryFeed {
    rng: Mutex<StdRng>,
    events: RwLock<VecDeque<TelemetryEvent>>,
    updates: broadcast::Sender<FeedUpdate>,
}

impl TelemetryFeed {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic feed for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let (updates, _) = broadcast::channel(64);
        Self {
            rng: Mutex::new(rng),
            events: RwLock::new(VecDeque::with_capacity(FEED_CAPACITY + 1)),
            updates,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedUpdate> {
        self.updates.subscribe()
    }

    /// Up to `count` newest events.
    pub async fn recent(&self, count: usize) -> Vec<TelemetryEvent> {
        self.events.read().await.iter().take(count).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.events.write().await.clear();
    }

    /// Generate one random event, and maybe a notification for it.
    pub async fn tick(&self) -> TelemetryEvent {
        let (event, notify) = {
            let mut rng = self.rng.lock().await;
            let kind = TelemetryKind::ALL[rng.gen_range(0..TelemetryKind::ALL.len())];
            let templates = kind.templates();
            let description = templates[rng.gen_range(0..templates.len())].to_string();
            let employee = EMPLOYEES[rng.gen_range(0..EMPLOYEES.len())];
            let case_id = format!("CS{:04}", rng.gen_range(1..=100));
            let notify = rng.gen_bool(NOTIFICATION_PROBABILITY);

            let agent = (kind == TelemetryKind::AgentAction).then(|| agent_of(&description));
            let event = TelemetryEvent {
                id: Uuid::new_v4(),
                kind,
                description,
                at: Utc::now(),
                case_id,
                employee_name: employee.to_string(),
                agent,
                details: format!("Auto-generated event for {employee}"),
            };
            (event, notify)
        };

        {
            let mut events = self.events.write().await;
            events.push_front(event.clone());
            events.truncate(FEED_CAPACITY);
        }
        debug!(kind = ?event.kind, case = %event.case_id, "Telemetry event");
        let _ = self.updates.send(FeedUpdate::Event(event.clone()));

        if notify {
            if let Some(notification) = notification_for(&event) {
                let _ = self.updates.send(FeedUpdate::Notification(notification));
            }
        }
        event
    }
}

impl Default for TelemetryFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Seed the feed, then add one event per `interval` until aborted.
pub fn spawn_feed_task(
    feed: Arc<TelemetryFeed>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        for _ in 0..INITIAL_EVENTS {
            feed.tick().await;
        }
        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        loop {
            ticker.tick().await;
            feed.tick().await;
        }
    })
}
