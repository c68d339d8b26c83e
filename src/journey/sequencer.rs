//! StageSequencer — owns the candidate journeys and moves them through the
//! stage plan, one guarded step at a time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::JourneyError;
use crate::store::{FlagStore, Lifetime, keys};

use super::model::{CandidateJourney, seed_journeys};
use super::stage::{Cause, Stage, StagePlan, Trigger};

/// What an advance request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Advanced { from: Stage, to: Stage, progress: u8 },
    /// The transition's apply-once marker was already set.
    AlreadyApplied { stage: Stage },
    /// The journey is at the last stage of the plan.
    Terminal { stage: Stage },
    /// The cause does not match the pending transition's trigger.
    NotTriggered { stage: Stage },
}

impl AdvanceOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

/// Broadcast whenever a journey changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JourneyEvent {
    Advanced {
        case_id: String,
        from: Stage,
        to: Stage,
        progress: u8,
    },
    Reset,
}

/// Moves candidate journeys through a [`StagePlan`].
///
/// State changes are written to session flags so a later `load()` (after a
/// re-login without logout) picks up where the session left off.
pub struct StageSequencer {
    plan: StagePlan,
    store: Arc<FlagStore>,
    journeys: RwLock<Vec<CandidateJourney>>,
    /// Serializes the check-and-set of apply-once markers.
    advance_lock: Mutex<()>,
    timers: Mutex<HashMap<String, JoinHandle<()>>>,
    events: broadcast::Sender<JourneyEvent>,
}

impl StageSequencer {
    pub fn new(plan: StagePlan, store: Arc<FlagStore>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            plan,
            store,
            journeys: RwLock::new(seed_journeys()),
            advance_lock: Mutex::new(()),
            timers: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JourneyEvent> {
        self.events.subscribe()
    }

    /// Rebuild journeys from session flags. Absent or unreadable flags fall
    /// back to the seed values.
    pub async fn load(&self) {
        let mut loaded = Vec::new();
        for seed in seed_journeys() {
            let case = seed.case_id.clone();
            let stage = match self
                .store
                .get_text(&keys::journey_stage(&case), Lifetime::Session)
                .await
            {
                Some(raw) => match Stage::parse(&raw) {
                    Some(stage) if self.plan.step(stage).is_some() => stage,
                    _ => {
                        warn!(case = %case, stage = %raw, "Ignoring unknown stored stage");
                        seed.stage
                    }
                },
                None => seed.stage,
            };
            let progress = self
                .store
                .get_int(&keys::journey_progress(&case), Lifetime::Session)
                .await
                .and_then(|p| u8::try_from(p).ok())
                .unwrap_or(seed.progress);
            let exceptions = self
                .store
                .get_int(&keys::journey_exceptions(&case), Lifetime::Session)
                .await
                .and_then(|e| u32::try_from(e).ok())
                .unwrap_or(seed.exception_count);

            loaded.push(CandidateJourney::new(
                case, seed.name, stage, progress, exceptions,
            ));
        }
        debug!(count = loaded.len(), "Journeys loaded");
        *self.journeys.write().await = loaded;
    }

    pub async fn journeys(&self) -> Vec<CandidateJourney> {
        self.journeys.read().await.clone()
    }

    pub async fn journey(&self, case_id: &str) -> Option<CandidateJourney> {
        self.journeys
            .read()
            .await
            .iter()
            .find(|j| j.case_id == case_id)
            .cloned()
    }

    /// First journey whose candidate is named in `text`.
    pub async fn find_mentioned(&self, text: &str) -> Option<CandidateJourney> {
        self.journeys
            .read()
            .await
            .iter()
            .find(|j| j.is_mentioned_in(text))
            .cloned()
    }

    /// Try to move `case_id` one step forward.
    pub async fn advance(
        &self,
        case_id: &str,
        cause: Cause,
    ) -> Result<AdvanceOutcome, JourneyError> {
        let _guard = self.advance_lock.lock().await;

        let current = self
            .journey(case_id)
            .await
            .ok_or_else(|| JourneyError::UnknownCase(case_id.to_string()))?;
        let from = current.stage;

        let Some(next) = self.plan.next(from).cloned() else {
            debug!(case = %case_id, stage = %from, "Advance at terminal stage ignored");
            return Ok(AdvanceOutcome::Terminal { stage: from });
        };

        let fires = next.trigger.as_ref().is_some_and(|t| t.fires_on(&cause));
        if !fires {
            return Ok(AdvanceOutcome::NotTriggered { stage: from });
        }

        let marker = keys::transition_applied(case_id, from);
        if self.store.get_bool(&marker, Lifetime::Session).await == Some(true) {
            info!(case = %case_id, from = %from, "Transition already applied");
            return Ok(AdvanceOutcome::AlreadyApplied { stage: from });
        }
        self.store.set(&marker, true, Lifetime::Session).await;

        let exceptions = if next.clears_exceptions {
            0
        } else {
            current.exception_count
        };

        {
            let mut journeys = self.journeys.write().await;
            if let Some(j) = journeys.iter_mut().find(|j| j.case_id == case_id) {
                j.stage = next.stage;
                j.progress = next.progress;
                j.exception_count = exceptions;
            }
        }

        self.store
            .set(&keys::journey_stage(case_id), next.stage.to_string(), Lifetime::Session)
            .await;
        self.store
            .set(&keys::journey_progress(case_id), next.progress, Lifetime::Session)
            .await;
        self.store
            .set(
                &keys::journey_exceptions(case_id),
                i64::from(exceptions),
                Lifetime::Session,
            )
            .await;
        if self.plan.is_terminal(next.stage) {
            self.store
                .set(&keys::journey_completed(case_id), true, Lifetime::Session)
                .await;
        }

        info!(case = %case_id, from = %from, to = %next.stage, progress = next.progress, "Journey advanced");
        let _ = self.events.send(JourneyEvent::Advanced {
            case_id: case_id.to_string(),
            from,
            to: next.stage,
            progress: next.progress,
        });

        Ok(AdvanceOutcome::Advanced {
            from,
            to: next.stage,
            progress: next.progress,
        })
    }

    /// Delay of the pending transition when it is time-triggered.
    async fn pending_delay(&self, case_id: &str) -> Option<Duration> {
        let stage = self.journey(case_id).await?.stage;
        match self.plan.next(stage)?.trigger.as_ref()? {
            Trigger::Elapsed(delay) => Some(*delay),
            _ => None,
        }
    }

    /// Open a journey: arm the elapsed-time timer for its pending
    /// transition, if that transition is time-triggered. Chained
    /// time-triggered steps keep firing until a non-timed step is reached.
    pub async fn open(self: &Arc<Self>, case_id: &str) -> Result<(), JourneyError> {
        if self.journey(case_id).await.is_none() {
            return Err(JourneyError::UnknownCase(case_id.to_string()));
        }

        let seq = Arc::clone(self);
        let case = case_id.to_string();
        let handle = tokio::spawn(async move {
            while let Some(delay) = seq.pending_delay(&case).await {
                debug!(case = %case, delay_ms = delay.as_millis() as u64, "Stage timer armed");
                tokio::time::sleep(delay).await;
                match seq.advance(&case, Cause::Elapsed).await {
                    Ok(outcome) if outcome.is_advanced() => continue,
                    Ok(_) => break,
                    Err(e) => {
                        warn!(case = %case, error = %e, "Stage timer advance failed");
                        break;
                    }
                }
            }
        });

        if let Some(previous) = self.timers.lock().await.insert(case_id.to_string(), handle) {
            previous.abort();
        }
        Ok(())
    }

    /// Cancel every armed timer.
    pub async fn close_all(&self) {
        let mut timers = self.timers.lock().await;
        for (case, handle) in timers.drain() {
            debug!(case = %case, "Stage timer cancelled");
            handle.abort();
        }
    }

    /// Cancel timers and return every journey to its seed values. Flags
    /// are not touched; the session policy owns clearing them.
    pub async fn reset(&self) {
        self.close_all().await;
        let _guard = self.advance_lock.lock().await;
        *self.journeys.write().await = seed_journeys();
        let _ = self.events.send(JourneyEvent::Reset);
        info!("Journeys reset to seed");
    }
}
