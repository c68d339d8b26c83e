//! ChatEngine — turns chat input into scripted replies, transcript
//! playback, and journey advances.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SimConfig;
use crate::error::JourneyError;
use crate::journey::{AdvanceOutcome, CandidateJourney, Cause, Stage, StageSequencer};
use crate::store::{FlagStore, Lifetime, keys};
use crate::transcript::{Script, TranscriptPlayer, scripts};

use super::intent::{Intent, IntentClassifier, UserMode};
use super::replies;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// An assistant reply being typed. `revealed` grows one character at a
    /// time; the finished reply follows as a `Message` with the same id.
    Typing {
        case_id: String,
        message_id: Uuid,
        revealed: String,
    },
    Message {
        case_id: String,
        message: ChatMessage,
    },
}

/// What `send` did synchronously. Replies and scripts follow later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub intent: Intent,
    /// Set when the input was an approval.
    pub advance: Option<AdvanceOutcome>,
}

/// Transcript to play after a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ScriptPlan {
    Initiation(String),
    BgcReview(String),
    Monitoring(String),
}

impl ScriptPlan {
    fn case_id(&self) -> &str {
        match self {
            Self::Initiation(c) | Self::BgcReview(c) | Self::Monitoring(c) => c,
        }
    }

    fn script(&self, journey: &CandidateJourney) -> Script {
        match self {
            Self::Initiation(_) => scripts::alex_initiation(),
            Self::BgcReview(_) => scripts::jordan_bgc_review(),
            Self::Monitoring(_) => scripts::monitoring(journey),
        }
    }
}

/// Message history plus its broadcast channel. Cheap to clone into
/// follow-up tasks.
#[derive(Clone)]
struct Conversation {
    messages: Arc<RwLock<Vec<ChatMessage>>>,
    events: broadcast::Sender<ChatEvent>,
}

impl Conversation {
    async fn post(&self, case_id: &str, role: Role, content: String) {
        self.push(case_id, ChatMessage::new(role, content)).await;
    }

    async fn push(&self, case_id: &str, message: ChatMessage) {
        self.messages.write().await.push(message.clone());
        let _ = self.events.send(ChatEvent::Message {
            case_id: case_id.to_string(),
            message,
        });
    }

    /// Reveal an assistant reply character by character, then add it to
    /// the history. Nothing reaches the history if the task is aborted
    /// mid-reply.
    async fn type_out(&self, case_id: &str, content: String, typing: Typing) {
        let message = ChatMessage::assistant(content);
        tokio::time::sleep(typing.lead).await;

        let mut revealed = String::new();
        for ch in message.content.chars() {
            revealed.push(ch);
            let _ = self.events.send(ChatEvent::Typing {
                case_id: case_id.to_string(),
                message_id: message.id,
                revealed: revealed.clone(),
            });
            tokio::time::sleep(typing.per_char).await;
        }
        self.push(case_id, message).await;
    }
}

#[derive(Debug, Clone, Copy)]
struct Typing {
    lead: Duration,
    per_char: Duration,
}

/// Everything a follow-up task needs.
#[derive(Clone)]
struct FollowUp {
    sequencer: Arc<StageSequencer>,
    player: Arc<TranscriptPlayer>,
    conversation: Conversation,
    reply_delay: Duration,
    script_start_delay: Duration,
    typing: Typing,
}

impl FollowUp {
    async fn run(self, case_id: String, reply: Option<String>, plan: Option<ScriptPlan>) {
        tokio::time::sleep(self.reply_delay).await;
        if let Some(reply) = reply {
            self.conversation
                .type_out(&case_id, reply, self.typing)
                .await;
        }

        let Some(plan) = plan else { return };
        tokio::time::sleep(self.script_start_delay).await;

        let Some(journey) = self.sequencer.journey(plan.case_id()).await else {
            return;
        };
        let playback = self.player.play(plan.script(&journey)).await;
        if !playback.finished().await {
            debug!(case = %journey.case_id, "Playback did not finish, skipping follow-up");
            return;
        }

        match plan {
            ScriptPlan::Initiation(case) => {
                match self.sequencer.advance(&case, Cause::ScriptCompleted).await {
                    Ok(outcome) if outcome.is_advanced() => {
                        if let Err(e) = self.sequencer.open(&case).await {
                            warn!(case = %case, error = %e, "Failed to arm stage timer");
                        }
                    }
                    Ok(outcome) => debug!(case = %case, ?outcome, "Initiation did not advance"),
                    Err(e) => warn!(case = %case, error = %e, "Initiation advance failed"),
                }
                self.conversation
                    .type_out(&case, replies::initiation_complete(&journey), self.typing)
                    .await;
            }
            ScriptPlan::BgcReview(case) => {
                // Input sent during playback may have settled the exception.
                match self.sequencer.journey(&case).await {
                    Some(current) if current.stage == Stage::BgcPending => {
                        self.conversation
                            .type_out(&case, replies::bgc_summary(&current), self.typing)
                            .await;
                    }
                    _ => debug!(case = %case, "Review no longer pending, summary skipped"),
                }
            }
            ScriptPlan::Monitoring(_) => {}
        }
    }
}

pub struct ChatEngine {
    sequencer: Arc<StageSequencer>,
    player: Arc<TranscriptPlayer>,
    store: Arc<FlagStore>,
    classifier: IntentClassifier,
    focus: RwLock<Option<String>>,
    conversation: Conversation,
    followups: Mutex<Vec<JoinHandle<()>>>,
    reply_delay: Duration,
    script_start_delay: Duration,
    typing: Typing,
}

impl ChatEngine {
    pub fn new(
        config: &SimConfig,
        sequencer: Arc<StageSequencer>,
        player: Arc<TranscriptPlayer>,
        store: Arc<FlagStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(4096);
        Self {
            sequencer,
            player,
            store,
            classifier: IntentClassifier::default(),
            focus: RwLock::new(None),
            conversation: Conversation {
                messages: Arc::new(RwLock::new(Vec::new())),
                events,
            },
            followups: Mutex::new(Vec::new()),
            reply_delay: config.reply_delay,
            script_start_delay: config.script_start_delay,
            typing: Typing {
                lead: config.pacing.reply_lead,
                per_char: config.pacing.reply_char,
            },
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.conversation.events.subscribe()
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.conversation.messages.read().await.clone()
    }

    pub async fn focus(&self) -> Option<String> {
        self.focus.read().await.clone()
    }

    /// Durable assist/autonomous preference. Defaults to assist.
    pub async fn user_mode(&self) -> UserMode {
        self.store
            .get_text(keys::USER_MODE, Lifetime::Durable)
            .await
            .and_then(|m| UserMode::parse(&m))
            .unwrap_or_default()
    }

    /// Open the chat for a journey: fresh history, greeting, and the
    /// journey's stage timer.
    pub async fn open(&self, case_id: &str) -> Result<(), JourneyError> {
        let journey = self.journey(case_id).await?;
        self.cancel_followups().await;
        self.player.stop().await;

        *self.focus.write().await = Some(case_id.to_string());
        self.conversation.messages.write().await.clear();

        let mode = self.user_mode().await;
        self.conversation
            .post(case_id, Role::Assistant, replies::greeting(&journey, mode))
            .await;
        self.sequencer.open(case_id).await?;

        info!(case = %case_id, "Chat opened");
        Ok(())
    }

    /// Close the chat: cancel pending replies, stop playback and timers.
    pub async fn close(&self) {
        self.cancel_followups().await;
        self.player.stop().await;
        self.sequencer.close_all().await;
        if let Some(case) = self.focus.write().await.take() {
            info!(case = %case, "Chat closed");
        }
    }

    /// Handle one line of user input for the focused journey.
    pub async fn send(&self, input: &str) -> Result<SendOutcome, JourneyError> {
        let case_id = self.focus().await.ok_or(JourneyError::NoFocus)?;
        self.conversation
            .post(&case_id, Role::User, input.to_string())
            .await;

        let journeys = self.sequencer.journeys().await;
        let intent = self.classifier.classify(input, &journeys);
        let mode = self.user_mode().await;
        info!(case = %case_id, intent = intent.name(), "Chat input classified");

        let mut advance = None;
        let mut reply_case = case_id.clone();
        let (reply, plan) = match &intent {
            Intent::Approve => {
                let outcome = self
                    .sequencer
                    .advance(&case_id, Cause::Input(input.to_string()))
                    .await?;
                let journey = self.journey(&case_id).await?;
                let reply = match outcome {
                    AdvanceOutcome::Advanced { .. } => replies::approved(&journey, mode),
                    AdvanceOutcome::AlreadyApplied { .. } | AdvanceOutcome::Terminal { .. } => {
                        replies::already_approved(&journey)
                    }
                    AdvanceOutcome::NotTriggered { .. } => replies::nothing_to_approve(&journey),
                };
                advance = Some(outcome);
                (Some(reply), None)
            }
            Intent::Start => {
                let journey = self.journey(&case_id).await?;
                let plan = if journey.stage == Stage::NotStarted {
                    ScriptPlan::Initiation(case_id.clone())
                } else {
                    ScriptPlan::Monitoring(case_id.clone())
                };
                (Some(replies::start(&journey, mode)), Some(plan))
            }
            Intent::MentionsCandidate { case_id: mentioned } => {
                *self.focus.write().await = Some(mentioned.clone());
                reply_case = mentioned.clone();
                let journey = self.journey(mentioned).await?;
                match journey.stage {
                    Stage::NotStarted => (None, Some(ScriptPlan::Initiation(mentioned.clone()))),
                    Stage::BgcPending => (None, Some(ScriptPlan::BgcReview(mentioned.clone()))),
                    _ => (Some(replies::status(&journey, mode)), None),
                }
            }
            Intent::BgcQuery => {
                let journey = self.journey(&case_id).await?;
                (Some(replies::bgc_summary(&journey)), None)
            }
            Intent::Status => {
                let journey = self.journey(&case_id).await?;
                (Some(replies::status(&journey, mode)), None)
            }
            Intent::Documents => {
                let journey = self.journey(&case_id).await?;
                (Some(replies::documents(&journey, mode)), None)
            }
            Intent::SwitchMode(new_mode) => {
                self.store
                    .set(keys::USER_MODE, new_mode.to_string(), Lifetime::Durable)
                    .await;
                info!(mode = %new_mode, "User mode switched");
                (Some(replies::switch_mode(*new_mode)), None)
            }
            Intent::Fallback => {
                let journey = self.journey(&case_id).await?;
                (Some(replies::fallback(&journey, mode)), None)
            }
        };

        let followup = FollowUp {
            sequencer: Arc::clone(&self.sequencer),
            player: Arc::clone(&self.player),
            conversation: self.conversation.clone(),
            reply_delay: self.reply_delay,
            script_start_delay: self.script_start_delay,
            typing: self.typing,
        };
        let handle = tokio::spawn(followup.run(reply_case, reply, plan));
        let mut followups = self.followups.lock().await;
        followups.retain(|h| !h.is_finished());
        followups.push(handle);

        Ok(SendOutcome { intent, advance })
    }

    async fn journey(&self, case_id: &str) -> Result<CandidateJourney, JourneyError> {
        self.sequencer
            .journey(case_id)
            .await
            .ok_or_else(|| JourneyError::UnknownCase(case_id.to_string()))
    }

    async fn cancel_followups(&self) {
        for handle in self.followups.lock().await.drain(..) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::journey::StagePlan;

    fn engine() -> (ChatEngine, Arc<StageSequencer>, Arc<FlagStore>) {
        let config = SimConfig::default();
        let store = Arc::new(FlagStore::in_memory());
        let sequencer = Arc::new(StageSequencer::new(
            StagePlan::standard(config.document_upload_delay),
            store.clone(),
        ));
        let player = Arc::new(TranscriptPlayer::new(config.pacing.clone()));
        let engine = ChatEngine::new(&config, sequencer.clone(), player, store.clone());
        (engine, sequencer, store)
    }

    async fn last_assistant(engine: &ChatEngine) -> Option<String> {
        engine
            .messages()
            .await
            .into_iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content)
    }

    #[tokio::test]
    async fn send_without_open_chat_fails() {
        let (engine, _, _) = engine();
        assert!(matches!(
            engine.send("hello").await,
            Err(JourneyError::NoFocus)
        ));
    }

    #[tokio::test]
    async fn open_unknown_case_fails() {
        let (engine, _, _) = engine();
        assert!(matches!(
            engine.open("CS9999").await,
            Err(JourneyError::UnknownCase(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn open_posts_greeting() {
        let (engine, _, _) = engine();
        engine.open("CS0003").await.unwrap();
        let messages = engine.messages().await;
        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.contains("Taylor Smith"));
        assert!(messages[0].content.contains("File Upload Pending"));
    }

    #[tokio::test(start_paused = true)]
    async fn approval_reply_arrives_after_delay() {
        let (engine, sequencer, _) = engine();
        engine.open("CS0002").await.unwrap();

        let outcome = engine.send("Approve").await.unwrap();
        assert_eq!(outcome.intent, Intent::Approve);
        assert!(outcome.advance.unwrap().is_advanced());
        assert_eq!(sequencer.journey("CS0002").await.unwrap().progress, 35);

        // Only greeting + user line before the reply delay.
        assert_eq!(engine.messages().await.len(), 2);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(
            last_assistant(&engine)
                .await
                .unwrap()
                .contains("Tickets Created")
        );

        let again = engine.send("yes").await.unwrap();
        assert!(!again.advance.unwrap().is_advanced());
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(
            last_assistant(&engine)
                .await
                .unwrap()
                .contains("already been approved")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn approval_without_pending_exception() {
        let (engine, sequencer, _) = engine();
        engine.open("CS0003").await.unwrap();
        let outcome = engine.send("proceed").await.unwrap();
        assert!(matches!(
            outcome.advance,
            Some(AdvanceOutcome::NotTriggered { .. })
        ));
        assert_eq!(
            sequencer.journey("CS0003").await.unwrap().stage,
            Stage::FileUploadPending
        );
    }

    #[tokio::test(start_paused = true)]
    async fn mentioning_jordan_plays_review_then_asks() {
        let (engine, _, _) = engine();
        engine.open("CS0001").await.unwrap();

        let outcome = engine.send("What about Jordan?").await.unwrap();
        assert_eq!(
            outcome.intent,
            Intent::MentionsCandidate {
                case_id: "CS0002".into()
            }
        );
        assert_eq!(engine.focus().await.as_deref(), Some("CS0002"));

        tokio::time::sleep(Duration::from_secs(300)).await;
        let last = last_assistant(&engine).await.unwrap();
        assert!(last.ends_with("Do you want to approve this exception?"));
    }

    #[tokio::test(start_paused = true)]
    async fn approval_during_review_skips_summary() {
        let (engine, sequencer, _) = engine();
        engine.open("CS0001").await.unwrap();

        engine.send("what about jordan").await.unwrap();
        let outcome = engine.send("approve").await.unwrap();
        assert!(outcome.advance.unwrap().is_advanced());

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(
            sequencer.journey("CS0002").await.unwrap().stage,
            Stage::IdCreationPending
        );
        assert!(
            !engine
                .messages()
                .await
                .iter()
                .any(|m| m.content.ends_with("Do you want to approve this exception?"))
        );
        assert!(
            last_assistant(&engine)
                .await
                .unwrap()
                .contains("Tickets Created")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn replies_are_typed_before_posting() {
        let (engine, _, _) = engine();
        let mut events = engine.subscribe();
        engine.open("CS0003").await.unwrap();
        engine.send("hmm").await.unwrap();

        // Reply delay plus half the typing lead: nothing typed yet.
        tokio::time::sleep(Duration::from_millis(1750)).await;
        assert_eq!(engine.messages().await.len(), 2);

        tokio::time::sleep(Duration::from_secs(60)).await;
        let reply = engine.messages().await.pop().unwrap();
        assert_eq!(reply.role, Role::Assistant);

        let mut typed = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let ChatEvent::Typing {
                message_id,
                revealed,
                ..
            } = event
            {
                assert_eq!(message_id, reply.id);
                typed.push(revealed);
            }
        }
        assert_eq!(typed.len(), reply.content.chars().count());
        assert_eq!(typed.first().map(|t| t.chars().count()), Some(1));
        assert_eq!(typed.last(), Some(&reply.content));
    }

    #[tokio::test(start_paused = true)]
    async fn initiation_advances_after_script() {
        let (engine, sequencer, _) = engine();
        engine.open("CS0001").await.unwrap();
        engine.send("Start onboarding").await.unwrap();

        let mut done = false;
        for _ in 0..600 {
            tokio::time::sleep(Duration::from_secs(1)).await;
            if last_assistant(&engine)
                .await
                .is_some_and(|m| m.starts_with("✅ Process initiated"))
            {
                done = true;
                break;
            }
        }
        assert!(done);

        let alex = sequencer.journey("CS0001").await.unwrap();
        assert_eq!(alex.stage, Stage::FileUploadPending);
        assert_eq!(alex.progress, 10);

        // Document upload timer was armed by the advance.
        tokio::time::sleep(Duration::from_secs(21)).await;
        assert_eq!(
            sequencer.journey("CS0001").await.unwrap().stage,
            Stage::BgcPending
        );
    }

    #[tokio::test(start_paused = true)]
    async fn close_mid_script_skips_follow_up() {
        let (engine, sequencer, _) = engine();
        engine.open("CS0001").await.unwrap();
        engine.send("begin").await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        engine.close().await;
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(
            sequencer.journey("CS0001").await.unwrap().stage,
            Stage::NotStarted
        );
        assert!(
            !engine
                .messages()
                .await
                .iter()
                .any(|m| m.content.starts_with("✅ Process initiated"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn switch_mode_is_durable() {
        let (engine, _, store) = engine();
        engine.open("CS0003").await.unwrap();
        assert_eq!(engine.user_mode().await, UserMode::Assist);

        engine.send("switch to autonomous").await.unwrap();
        assert_eq!(engine.user_mode().await, UserMode::Autonomous);
        assert_eq!(
            store
                .get_text(keys::USER_MODE, Lifetime::Durable)
                .await
                .as_deref(),
            Some("autonomous")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn status_reports_real_stage() {
        let (engine, _, _) = engine();
        engine.open("CS0002").await.unwrap();
        engine.send("status please").await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        let last = last_assistant(&engine).await.unwrap();
        assert!(last.contains("BGC Pending"));
        assert!(last.contains("15% complete"));
    }

    #[tokio::test(start_paused = true)]
    async fn unmatched_input_gets_fallback() {
        let (engine, _, _) = engine();
        engine.open("CS0003").await.unwrap();
        let outcome = engine.send("hmm").await.unwrap();
        assert_eq!(outcome.intent, Intent::Fallback);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(
            last_assistant(&engine)
                .await
                .unwrap()
                .starts_with("I understand your query about Taylor Smith")
        );
    }
}
