//! Simulator — one session object wiring the store, sequencer, player,
//! chat, telemetry and router together.
//!
//! Session policy: simulation state lives in session flags, and session
//! flags are cleared on logout only. Login re-seeds journeys from whatever
//! flags exist (absent means seed values). Durable flags are only wiped by
//! the startup seed-version check.

use std::sync::Arc;

use secrecy::SecretString;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::info;

use crate::auth::{self, Session};
use crate::chat::{ChatEngine, ChatEvent, ChatMessage, SendOutcome, UserMode};
use crate::config::SimConfig;
use crate::dashboard::{self, DashboardView};
use crate::error::{AuthError, Result};
use crate::journey::{CandidateJourney, JourneyEvent, SEED_VERSION, StagePlan, StageSequencer};
use crate::router::{Route, View, ViewRouter};
use crate::store::{FlagStore, Lifetime, keys};
use crate::telemetry::{self, FeedUpdate, TelemetryEvent, TelemetryFeed};
use crate::transcript::{TranscriptEvent, TranscriptPlayer, TranscriptState};

/// Everything a front-end would render, as one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "event", rename_all = "snake_case")]
pub enum SimEvent {
    Chat(ChatEvent),
    Transcript(TranscriptEvent),
    Journey(JourneyEvent),
    Feed(FeedUpdate),
}

pub struct Simulator {
    config: SimConfig,
    store: Arc<FlagStore>,
    sequencer: Arc<StageSequencer>,
    player: Arc<TranscriptPlayer>,
    chat: ChatEngine,
    telemetry: Arc<TelemetryFeed>,
    telemetry_task: Mutex<Option<JoinHandle<()>>>,
    session: RwLock<Option<Session>>,
    router: RwLock<ViewRouter>,
}

impl Simulator {
    pub fn new(config: SimConfig, store: Arc<FlagStore>) -> Self {
        Self::with_telemetry(config, store, TelemetryFeed::new())
    }

    pub fn with_telemetry(config: SimConfig, store: Arc<FlagStore>, feed: TelemetryFeed) -> Self {
        let sequencer = Arc::new(StageSequencer::new(
            StagePlan::standard(config.document_upload_delay),
            Arc::clone(&store),
        ));
        let player = Arc::new(TranscriptPlayer::new(config.pacing.clone()));
        let chat = ChatEngine::new(
            &config,
            Arc::clone(&sequencer),
            Arc::clone(&player),
            Arc::clone(&store),
        );
        Self {
            config,
            store,
            sequencer,
            player,
            chat,
            telemetry: Arc::new(feed),
            telemetry_task: Mutex::new(None),
            session: RwLock::new(None),
            router: RwLock::new(ViewRouter::default()),
        }
    }

    /// First-load check. Wipes durable flags written against another seed
    /// version and restores a session whose login flag survived.
    pub async fn startup(&self) -> bool {
        let reset = self.store.reset_if_stale(SEED_VERSION).await;
        if let Some(email) = self.store.get_text(keys::AUTH_EMAIL, Lifetime::Session).await {
            info!(email = %email, "Restoring session");
            self.begin_session(Session { email }).await;
        }
        reset
    }

    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Route> {
        let session = auth::login(email, password, self.config.login_delay).await?;
        self.store
            .set(keys::AUTH_EMAIL, session.email.as_str(), Lifetime::Session)
            .await;
        self.begin_session(session).await;
        Ok(self.router.write().await.navigate(View::Dashboard, None, true))
    }

    async fn begin_session(&self, session: Session) {
        self.sequencer.load().await;
        *self.session.write().await = Some(session);

        let mut task = self.telemetry_task.lock().await;
        if task.is_none() {
            *task = Some(telemetry::spawn_feed_task(
                Arc::clone(&self.telemetry),
                self.config.telemetry_interval,
            ));
        }
    }

    /// End the session: stop everything in flight, clear session flags,
    /// and return journeys to seed values.
    pub async fn logout(&self) {
        self.chat.close().await;
        if let Some(task) = self.telemetry_task.lock().await.take() {
            task.abort();
        }
        self.telemetry.clear().await;
        self.store.clear_all(Lifetime::Session).await;
        self.sequencer.reset().await;
        self.router.write().await.reset();
        if let Some(session) = self.session.write().await.take() {
            info!(email = %session.email, "Logged out");
        }
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.read().await.is_some()
    }

    async fn require_login(&self) -> Result<()> {
        if self.is_logged_in().await {
            Ok(())
        } else {
            Err(AuthError::NotLoggedIn.into())
        }
    }

    /// Open the chat for a journey and show its detail view.
    pub async fn open_chat(&self, case_id: &str) -> Result<Route> {
        self.require_login().await?;
        self.chat.open(case_id).await?;
        Ok(self
            .router
            .write()
            .await
            .navigate(View::Journey, Some(case_id), true))
    }

    pub async fn close_chat(&self) {
        self.chat.close().await;
    }

    pub async fn send(&self, input: &str) -> Result<SendOutcome> {
        self.require_login().await?;
        Ok(self.chat.send(input).await?)
    }

    /// Counters and badges for the current state.
    pub async fn dashboard(&self) -> DashboardView {
        let journeys = self.sequencer.journeys().await;
        let flags = self.store.snapshot(Lifetime::Session).await;
        dashboard::project(&journeys, &flags)
    }

    /// Navigate to a view. Unknown journey ids fall back to the dashboard.
    pub async fn navigate(&self, view: View, id: Option<&str>) -> Route {
        let logged_in = self.is_logged_in().await;
        let id = match id {
            Some(case) if self.sequencer.journey(case).await.is_some() => Some(case),
            _ => None,
        };
        self.router.write().await.navigate(view, id, logged_in)
    }

    /// Navigate by path. `None` when the path matches no view.
    pub async fn navigate_path(&self, path: &str) -> Option<Route> {
        let (view, id) = Route::parse(path)?;
        Some(self.navigate(view, id.as_deref()).await)
    }

    pub async fn back(&self) -> Route {
        let logged_in = self.is_logged_in().await;
        self.router.write().await.back(logged_in)
    }

    pub async fn route(&self) -> Route {
        self.router.read().await.current().clone()
    }

    pub async fn user_mode(&self) -> UserMode {
        self.chat.user_mode().await
    }

    pub async fn journeys(&self) -> Vec<CandidateJourney> {
        self.sequencer.journeys().await
    }

    pub async fn journey(&self, case_id: &str) -> Option<CandidateJourney> {
        self.sequencer.journey(case_id).await
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.chat.messages().await
    }

    pub async fn transcript(&self) -> TranscriptState {
        self.player.state().await
    }

    pub async fn telemetry(&self, count: usize) -> Vec<TelemetryEvent> {
        self.telemetry.recent(count).await
    }

    /// Merge every component's events into one stream. Lagged receivers
    /// skip what they missed.
    pub fn subscribe(&self) -> impl Stream<Item = SimEvent> + Send + Unpin + 'static {
        let chat = BroadcastStream::new(self.chat.subscribe())
            .filter_map(|r| r.ok().map(SimEvent::Chat));
        let transcript = BroadcastStream::new(self.player.subscribe())
            .filter_map(|r| r.ok().map(SimEvent::Transcript));
        let journeys = BroadcastStream::new(self.sequencer.subscribe())
            .filter_map(|r| r.ok().map(SimEvent::Journey));
        let feed = BroadcastStream::new(self.telemetry.subscribe())
            .filter_map(|r| r.ok().map(SimEvent::Feed));
        chat.merge(transcript).merge(journeys).merge(feed)
    }
}
