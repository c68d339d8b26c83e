//! TranscriptPlayer — replays a script with simulated streaming.
//!
//! Each `play` starts a new generation and aborts the previous task. Every
//! emit re-checks the generation under the state lock, so nothing from a
//! stopped or superseded playback reaches the state or subscribers once
//! `stop`/`play` has returned.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::Pacing;

use super::model::{Script, StreamingRecord, TranscriptEvent, TranscriptState};

/// Handle to one playback.
#[derive(Debug)]
pub struct Playback {
    generation: u64,
    done: oneshot::Receiver<()>,
}

impl Playback {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the playback to end. `true` when every record was revealed,
    /// `false` when it was stopped or superseded.
    pub async fn finished(self) -> bool {
        self.done.await.is_ok()
    }
}

pub struct TranscriptPlayer {
    pacing: Pacing,
    state: Arc<RwLock<TranscriptState>>,
    events: broadcast::Sender<TranscriptEvent>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TranscriptPlayer {
    pub fn new(pacing: Pacing) -> Self {
        let (events, _) = broadcast::channel(1024);
        Self {
            pacing,
            state: Arc::new(RwLock::new(TranscriptState::default())),
            events,
            task: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> TranscriptState {
        self.state.read().await.clone()
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Start playing `script` from its first record, replacing whatever was
    /// playing before.
    pub async fn play(&self, script: Script) -> Playback {
        let mut task = self.task.lock().await;

        let generation = {
            let mut state = self.state.write().await;
            let generation = state.generation + 1;
            *state = TranscriptState {
                generation,
                script: Some(script.name.clone()),
                ..TranscriptState::default()
            };
            generation
        };
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let (tx, rx) = oneshot::channel();
        let emitter = Emitter {
            generation,
            state: Arc::clone(&self.state),
            events: self.events.clone(),
        };
        let pacing = self.pacing.clone();
        let name = script.name.clone();

        *task = Some(tokio::spawn(async move {
            if run(script, pacing, emitter).await.is_some() {
                let _ = tx.send(());
            }
        }));

        info!(generation, script = %name, "Transcript playback started");
        Playback { generation, done: rx }
    }

    /// Cancel the running playback and clear partial state.
    pub async fn stop(&self) {
        let mut task = self.task.lock().await;

        let generation = {
            let mut state = self.state.write().await;
            let generation = state.generation + 1;
            *state = TranscriptState {
                generation,
                ..TranscriptState::default()
            };
            let _ = self.events.send(TranscriptEvent::Cleared { generation });
            generation
        };
        if let Some(handle) = task.take() {
            handle.abort();
        }

        info!(generation, "Transcript playback stopped");
    }
}

/// Applies state changes and sends events for one generation.
struct Emitter {
    generation: u64,
    state: Arc<RwLock<TranscriptState>>,
    events: broadcast::Sender<TranscriptEvent>,
}

impl Emitter {
    /// `None` when the generation is stale; the playback must end.
    async fn emit(
        &self,
        event: TranscriptEvent,
        apply: impl FnOnce(&mut TranscriptState),
    ) -> Option<()> {
        let mut state = self.state.write().await;
        if state.generation != self.generation {
            debug!(
                generation = self.generation,
                current = state.generation,
                "Dropping stale transcript emit"
            );
            return None;
        }
        apply(&mut state);
        let _ = self.events.send(event);
        Some(())
    }
}

async fn run(script: Script, pacing: Pacing, emitter: Emitter) -> Option<()> {
    use tokio::time::sleep;

    let generation = emitter.generation;
    let total = script.records.len();

    emitter
        .emit(
            TranscriptEvent::Started {
                generation,
                script: script.name.clone(),
                records: total,
            },
            |_| {},
        )
        .await?;

    for (index, record) in script.records.iter().enumerate() {
        let line = script.thinking_line(index);
        emitter
            .emit(
                TranscriptEvent::Thinking {
                    generation,
                    index,
                    message: line.to_string(),
                },
                |s| s.thinking = Some(line.to_string()),
            )
            .await?;
        sleep(pacing.thinking).await;

        emitter
            .emit(
                TranscriptEvent::RecordStarted {
                    generation,
                    index,
                    agent: record.agent.clone(),
                },
                |s| {
                    s.thinking = None;
                    s.streaming = Some(StreamingRecord {
                        index,
                        agent: record.agent.clone(),
                        ..StreamingRecord::default()
                    });
                },
            )
            .await?;

        let mut revealed = String::new();
        for ch in record.action.chars() {
            revealed.push(ch);
            let text = revealed.clone();
            emitter
                .emit(
                    TranscriptEvent::ActionProgress {
                        generation,
                        index,
                        revealed: revealed.clone(),
                    },
                    |s| {
                        if let Some(r) = s.streaming.as_mut() {
                            r.action = text;
                        }
                    },
                )
                .await?;
            sleep(pacing.action_char).await;
        }

        emitter
            .emit(TranscriptEvent::ActionComplete { generation, index }, |s| {
                if let Some(r) = s.streaming.as_mut() {
                    r.action_complete = true;
                }
            })
            .await?;
        sleep(pacing.details_lead).await;

        let mut revealed = String::new();
        for ch in record.details.chars() {
            revealed.push(ch);
            let text = revealed.clone();
            emitter
                .emit(
                    TranscriptEvent::DetailsProgress {
                        generation,
                        index,
                        revealed: revealed.clone(),
                    },
                    |s| {
                        if let Some(r) = s.streaming.as_mut() {
                            r.details = text;
                        }
                    },
                )
                .await?;
            sleep(pacing.details_char).await;
        }
        sleep(pacing.settle).await;

        emitter
            .emit(
                TranscriptEvent::RecordCompleted {
                    generation,
                    index,
                    record: record.clone(),
                },
                |s| {
                    s.streaming = None;
                    s.completed.push(record.clone());
                },
            )
            .await?;

        if index + 1 < total {
            sleep(pacing.between_records).await;
        }
    }

    emitter
        .emit(
            TranscriptEvent::Finished {
                generation,
                script: script.name.clone(),
            },
            |s| s.finished = true,
        )
        .await?;
    debug!(generation, script = %script.name, "Transcript playback finished");
    Some(())
}
