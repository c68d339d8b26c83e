//! End-to-end scenarios driven through the public `Simulator` API.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use onboard_assist::chat::{ChatEvent, Intent, Role, UserMode};
use onboard_assist::config::SimConfig;
use onboard_assist::error::StorageError;
use onboard_assist::journey::{AdvanceOutcome, Stage};
use onboard_assist::router::Route;
use onboard_assist::simulator::{SimEvent, Simulator};
use onboard_assist::store::{FlagBackend, FlagStore, FlagValue, LibSqlBackend, MemoryBackend};
use onboard_assist::telemetry::TelemetryFeed;
use secrecy::SecretString;

const SPECIALIST: &str = "ospecialist@corespectrum.com";

fn password() -> SecretString {
    SecretString::from("Demo@1234".to_string())
}

fn simulator(store: FlagStore) -> Simulator {
    Simulator::with_telemetry(SimConfig::instant(), Arc::new(store), TelemetryFeed::seeded(42))
}

/// Backend whose every call fails.
struct BrokenBackend;

#[async_trait]
impl FlagBackend for BrokenBackend {
    fn name(&self) -> &str {
        "broken"
    }

    async fn get(&self, _key: &str) -> Result<Option<FlagValue>, StorageError> {
        Err(StorageError::Unavailable("disk on fire".into()))
    }

    async fn set(&self, _key: &str, _value: &FlagValue) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk on fire".into()))
    }

    async fn remove(&self, _key: &str) -> Result<bool, StorageError> {
        Err(StorageError::Unavailable("disk on fire".into()))
    }

    async fn clear(&self) -> Result<usize, StorageError> {
        Err(StorageError::Unavailable("disk on fire".into()))
    }

    async fn entries(&self) -> Result<BTreeMap<String, FlagValue>, StorageError> {
        Err(StorageError::Unavailable("disk on fire".into()))
    }
}

#[tokio::test(start_paused = true)]
async fn jordan_approval_moves_counters_exactly_once() {
    let sim = simulator(FlagStore::in_memory());
    sim.login(SPECIALIST, &password()).await.unwrap();

    let before = sim.dashboard().await.counters;
    assert_eq!(before.pending_bgc, 3);
    assert_eq!(before.pending_id_creation, 2);

    sim.open_chat("CS0002").await.unwrap();
    let first = sim.send("approve").await.unwrap();
    assert_eq!(first.intent, Intent::Approve);
    assert!(first.advance.unwrap().is_advanced());

    for input in ["yes", "accept", "approve"] {
        let again = sim.send(input).await.unwrap();
        assert!(matches!(
            again.advance,
            Some(AdvanceOutcome::Terminal { .. } | AdvanceOutcome::AlreadyApplied { .. })
        ));
    }

    let jordan = sim.journey("CS0002").await.unwrap();
    assert_eq!(jordan.stage, Stage::IdCreationPending);
    assert_eq!(jordan.progress, 35);
    assert_eq!(jordan.exception_count, 0);

    let after = sim.dashboard().await.counters;
    assert_eq!(after.pending_bgc, 2);
    assert_eq!(after.pending_id_creation, 3);

    sim.logout().await;
}

#[tokio::test(start_paused = true)]
async fn logout_resets_session_but_keeps_preferences() {
    let sim = simulator(FlagStore::in_memory());
    sim.login(SPECIALIST, &password()).await.unwrap();

    sim.open_chat("CS0002").await.unwrap();
    sim.send("approve").await.unwrap();
    let switched = sim.send("switch to autonomous").await.unwrap();
    assert_eq!(switched.intent, Intent::SwitchMode(UserMode::Autonomous));
    assert_eq!(sim.dashboard().await.counters.pending_bgc, 2);

    sim.logout().await;
    assert_eq!(sim.route().await, Route::Login);
    assert!(!sim.is_logged_in().await);

    sim.login(SPECIALIST, &password()).await.unwrap();
    let counters = sim.dashboard().await.counters;
    assert_eq!(counters.upcoming_joiners, 15);
    assert_eq!(counters.pending_documents, 5);
    assert_eq!(counters.pending_bgc, 3);
    assert_eq!(sim.journey("CS0002").await.unwrap().stage, Stage::BgcPending);
    assert_eq!(sim.user_mode().await, UserMode::Autonomous);

    sim.logout().await;
}

#[tokio::test(start_paused = true)]
async fn alex_initiation_reaches_file_upload() {
    let sim = simulator(FlagStore::in_memory());
    sim.login(SPECIALIST, &password()).await.unwrap();
    sim.open_chat("CS0001").await.unwrap();

    let outcome = sim.send("Start onboarding for Alex").await.unwrap();
    assert_eq!(outcome.intent, Intent::Start);

    let mut stage = Stage::NotStarted;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        stage = sim.journey("CS0001").await.unwrap().stage;
        if stage != Stage::NotStarted {
            break;
        }
    }
    assert_eq!(stage, Stage::FileUploadPending);
    assert_eq!(sim.journey("CS0001").await.unwrap().progress, 10);

    let transcript = sim.transcript().await;
    assert!(transcript.finished);
    assert_eq!(transcript.completed.len(), 6);

    sim.logout().await;
}

#[tokio::test(start_paused = true)]
async fn approving_mid_review_leaves_no_stale_prompt() {
    let sim = simulator(FlagStore::in_memory());
    sim.login(SPECIALIST, &password()).await.unwrap();
    sim.open_chat("CS0001").await.unwrap();

    sim.send("what about jordan").await.unwrap();
    sim.send("approve").await.unwrap();
    tokio::time::sleep(Duration::from_secs(600)).await;

    let assistant: Vec<String> = sim
        .messages()
        .await
        .into_iter()
        .filter(|m| m.role == Role::Assistant)
        .map(|m| m.content)
        .collect();
    assert!(
        !assistant
            .iter()
            .any(|m| m.contains("Do you want to approve this exception?"))
    );
    assert!(assistant.last().unwrap().contains("Tickets Created"));

    sim.logout().await;
}

#[tokio::test(start_paused = true)]
async fn event_stream_carries_greeting_and_stage_change() {
    let sim = simulator(FlagStore::in_memory());
    let mut events = sim.subscribe();
    sim.login(SPECIALIST, &password()).await.unwrap();

    sim.open_chat("CS0002").await.unwrap();
    sim.send("approve").await.unwrap();

    let mut saw_greeting = false;
    let mut saw_advance = false;
    while !(saw_greeting && saw_advance) {
        let event = tokio::time::timeout(Duration::from_secs(5), events.next())
            .await
            .expect("event before timeout")
            .expect("stream open");
        match event {
            SimEvent::Chat(ChatEvent::Message { message, .. })
                if message.role == Role::Assistant
                    && message.content.contains("Welcome to AI-Powered Onboarding") =>
            {
                saw_greeting = true;
            }
            SimEvent::Journey(_) => saw_advance = true,
            _ => {}
        }
    }

    sim.logout().await;
}

#[tokio::test(start_paused = true)]
async fn broken_storage_still_applies_once() {
    let store = FlagStore::new(Arc::new(BrokenBackend), Arc::new(BrokenBackend));
    let sim = simulator(store);

    // The seed version can never be read back, so every startup resets.
    assert!(sim.startup().await);
    sim.login(SPECIALIST, &password()).await.unwrap();
    sim.open_chat("CS0002").await.unwrap();

    assert!(sim.send("approve").await.unwrap().advance.unwrap().is_advanced());
    assert!(!sim.send("yes").await.unwrap().advance.unwrap().is_advanced());
    assert_eq!(
        sim.journey("CS0002").await.unwrap().stage,
        Stage::IdCreationPending
    );
    assert_eq!(sim.user_mode().await, UserMode::Assist);

    let counters = sim.dashboard().await.counters;
    assert_eq!(counters.pending_bgc, 2);
    assert_eq!(counters.pending_id_creation, 3);

    sim.logout().await;
}

#[tokio::test]
async fn preferences_survive_a_reopened_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flags.db");

    {
        let durable = LibSqlBackend::new_local(&path).await.unwrap();
        let store = FlagStore::new(Arc::new(MemoryBackend::new("session")), Arc::new(durable));
        let sim = simulator(store);
        sim.startup().await;
        sim.login(SPECIALIST, &password()).await.unwrap();
        sim.open_chat("CS0001").await.unwrap();
        sim.send("go autonomous").await.unwrap();
        sim.logout().await;
    }

    let durable = LibSqlBackend::new_local(&path).await.unwrap();
    let store = FlagStore::new(Arc::new(MemoryBackend::new("session")), Arc::new(durable));
    let sim = simulator(store);
    assert!(!sim.startup().await);
    assert_eq!(sim.user_mode().await, UserMode::Autonomous);
    assert!(!sim.is_logged_in().await);
}
