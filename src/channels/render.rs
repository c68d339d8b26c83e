//! Text rendering of simulator state and events for line-based channels.

use std::fmt::Write as _;

use crate::chat::{ChatEvent, Role};
use crate::channels::{OutgoingResponse, StatusUpdate};
use crate::dashboard::DashboardView;
use crate::journey::JourneyEvent;
use crate::simulator::SimEvent;
use crate::telemetry::{FeedUpdate, NotificationLevel, TelemetryEvent};
use crate::transcript::TranscriptEvent;

/// What a channel should do with one simulator event.
#[derive(Debug, Clone)]
pub enum Output {
    Respond(OutgoingResponse),
    Status(StatusUpdate),
}

/// Map an event to channel output. Character-level reveal events, typing
/// progress and user echoes are dropped; a terminal only shows finished
/// lines.
pub fn event_output(event: &SimEvent) -> Option<Output> {
    match event {
        SimEvent::Chat(ChatEvent::Message { message, .. }) => match message.role {
            Role::Assistant => Some(Output::Respond(OutgoingResponse::text(format!(
                "🤖 {}",
                message.content
            )))),
            Role::User => None,
        },
        SimEvent::Chat(ChatEvent::Typing { .. }) => None,
        SimEvent::Transcript(TranscriptEvent::Thinking { message, .. }) => {
            Some(Output::Status(StatusUpdate::Thinking(message.clone())))
        }
        SimEvent::Transcript(TranscriptEvent::RecordCompleted { record, .. }) => {
            Some(Output::Status(StatusUpdate::Activity {
                agent: record.agent.clone(),
                action: record.action.clone(),
                ticket_id: record.ticket_id.clone(),
            }))
        }
        SimEvent::Transcript(TranscriptEvent::Finished { script, .. }) => Some(Output::Status(
            StatusUpdate::Status(format!("Transcript \"{script}\" finished")),
        )),
        SimEvent::Transcript(_) => None,
        SimEvent::Journey(JourneyEvent::Advanced {
            case_id,
            to,
            progress,
            ..
        }) => Some(Output::Status(StatusUpdate::StageChanged {
            case_id: case_id.clone(),
            stage: to.label().to_string(),
            progress: *progress,
        })),
        SimEvent::Journey(JourneyEvent::Reset) => Some(Output::Status(StatusUpdate::Status(
            "Journeys reset to their starting state".to_string(),
        ))),
        SimEvent::Feed(FeedUpdate::Notification(n)) => Some(Output::Status(StatusUpdate::Notice {
            level: level_label(n.level).to_string(),
            message: format!("{} ({})", n.title, n.message),
        })),
        SimEvent::Feed(FeedUpdate::Event(_)) => None,
    }
}

fn level_label(level: NotificationLevel) -> &'static str {
    match level {
        NotificationLevel::Info => "info",
        NotificationLevel::Warning => "warning",
        NotificationLevel::Error => "error",
        NotificationLevel::Success => "success",
    }
}

pub fn dashboard(view: &DashboardView) -> String {
    let c = &view.counters;
    let mut out = String::new();
    let _ = writeln!(out, "Upcoming joiners       {:>3}", c.upcoming_joiners);
    let _ = writeln!(out, "Pending documents      {:>3}", c.pending_documents);
    let _ = writeln!(out, "Pending BGC            {:>3}", c.pending_bgc);
    let _ = writeln!(out, "Pending ID creation    {:>3}", c.pending_id_creation);
    let _ = writeln!(out, "In progress            {:>3}", c.onboardings_in_progress);
    let _ = writeln!(out, "Open exceptions        {:>3}", c.open_exceptions);
    out.push('\n');
    for badge in &view.badges {
        let _ = write!(
            out,
            "{}  {:<14} {:<20} {:>3}%",
            badge.case_id, badge.name, badge.stage_label, badge.progress
        );
        if badge.exceptions > 0 {
            let _ = write!(out, "  ⚠ {}", badge.exceptions);
        }
        if badge.completed {
            out.push_str("  ✓");
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn feed(events: &[TelemetryEvent]) -> String {
    if events.is_empty() {
        return "No telemetry yet.".to_string();
    }
    events
        .iter()
        .map(|e| {
            format!(
                "{}  {}  {}",
                e.at.format("%H:%M:%S"),
                e.case_id,
                e.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chat::ChatMessage;
    use crate::journey::{Stage, seed_journeys};
    use crate::store::{FlagStore, Lifetime};
    use crate::transcript::ActivityRecord;

    #[tokio::test]
    async fn dashboard_lists_every_journey() {
        let store = Arc::new(FlagStore::in_memory());
        let flags = store.snapshot(Lifetime::Session).await;
        let text = dashboard(&crate::dashboard::project(&seed_journeys(), &flags));

        assert!(text.contains("Pending BGC              3"));
        assert!(text.contains("CS0002  Jordan Lee"));
        assert!(text.contains("BGC Pending"));
        assert!(text.contains("⚠ 1"));
    }

    #[test]
    fn assistant_messages_become_responses() {
        let event = SimEvent::Chat(ChatEvent::Message {
            case_id: "CS0001".into(),
            message: ChatMessage::assistant("Hello"),
        });
        match event_output(&event) {
            Some(Output::Respond(r)) => assert_eq!(r.content, "🤖 Hello"),
            other => panic!("unexpected: {other:?}"),
        }

        let echo = SimEvent::Chat(ChatEvent::Message {
            case_id: "CS0001".into(),
            message: ChatMessage::user("hi"),
        });
        assert!(event_output(&echo).is_none());
    }

    #[test]
    fn typing_progress_is_dropped() {
        let event = SimEvent::Chat(ChatEvent::Typing {
            case_id: "CS0002".into(),
            message_id: uuid::Uuid::new_v4(),
            revealed: "Gre".into(),
        });
        assert!(event_output(&event).is_none());
    }

    #[test]
    fn reveal_events_are_dropped() {
        let event = SimEvent::Transcript(TranscriptEvent::ActionProgress {
            generation: 1,
            index: 0,
            revealed: "Ch".into(),
        });
        assert!(event_output(&event).is_none());
    }

    #[test]
    fn completed_records_carry_ticket() {
        let event = SimEvent::Transcript(TranscriptEvent::RecordCompleted {
            generation: 1,
            index: 0,
            record: ActivityRecord::new("Ran checks", "All good", "BGC_AGENT")
                .with_ticket("BGC-SUM-2024-001"),
        });
        match event_output(&event) {
            Some(Output::Status(StatusUpdate::Activity { ticket_id, agent, .. })) => {
                assert_eq!(agent, "BGC_AGENT");
                assert_eq!(ticket_id.as_deref(), Some("BGC-SUM-2024-001"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn stage_change_uses_label() {
        let event = SimEvent::Journey(JourneyEvent::Advanced {
            case_id: "CS0002".into(),
            from: Stage::BgcPending,
            to: Stage::IdCreationPending,
            progress: 35,
        });
        match event_output(&event) {
            Some(Output::Status(StatusUpdate::StageChanged { stage, progress, .. })) => {
                assert_eq!(stage, "ID Creation Pending");
                assert_eq!(progress, 35);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_feed() {
        assert_eq!(feed(&[]), "No telemetry yet.");
    }
}
