//! Dashboard projection — counters and badges derived from journeys and
//! session flags.
//!
//! `project` is pure: the same journeys and flag snapshot always produce
//! the same view, however often it is called.
//!
//! A transition counts when its apply-once marker is set, or when a seeded
//! journey's stage has moved past it. The second source keeps counters and
//! badges in step when session storage is unavailable.

use serde::Serialize;

use crate::journey::{CandidateJourney, Stage, seed_journeys};
use crate::store::{FlagSnapshot, keys};

/// Headline numbers on the specialist dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardCounters {
    pub upcoming_joiners: u32,
    pub pending_documents: u32,
    pub pending_bgc: u32,
    pub pending_id_creation: u32,
    pub onboardings_in_progress: u32,
    pub open_exceptions: u32,
}

impl DashboardCounters {
    /// Values on a fresh session, before any transition.
    pub const BASELINE: Self = Self {
        upcoming_joiners: 15,
        pending_documents: 5,
        pending_bgc: 3,
        pending_id_creation: 2,
        onboardings_in_progress: 12,
        open_exceptions: 0,
    };
}

#[derive(Debug, Default, Clone, Copy)]
struct Delta {
    upcoming: i64,
    documents: i64,
    bgc: i64,
    id_creation: i64,
    in_progress: i64,
}

/// Counter change for the transition leaving `from`.
fn delta_leaving(from: Stage) -> Delta {
    match from {
        Stage::NotStarted => Delta {
            upcoming: -1,
            documents: 1,
            in_progress: 1,
            ..Delta::default()
        },
        Stage::FileUploadPending => Delta {
            documents: -1,
            bgc: 1,
            ..Delta::default()
        },
        Stage::BgcPending => Delta {
            bgc: -1,
            id_creation: 1,
            ..Delta::default()
        },
        Stage::IdCreationPending => Delta::default(),
    }
}

const TRANSITION_SOURCES: [Stage; 3] = [
    Stage::NotStarted,
    Stage::FileUploadPending,
    Stage::BgcPending,
];

/// One journey's badge row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JourneyBadge {
    pub case_id: String,
    pub name: String,
    pub stage: Stage,
    pub stage_label: &'static str,
    pub progress: u8,
    pub exceptions: u32,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub counters: DashboardCounters,
    pub badges: Vec<JourneyBadge>,
}

fn flag_set(session: &FlagSnapshot, key: &str) -> bool {
    session.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

fn apply(base: u32, delta: i64) -> u32 {
    u32::try_from((i64::from(base) + delta).max(0)).unwrap_or(u32::MAX)
}

/// Whether `journey` has left `from` since its seed stage.
fn moved_past(seeds: &[CandidateJourney], journey: &CandidateJourney, from: Stage) -> bool {
    seeds
        .iter()
        .find(|s| s.case_id == journey.case_id)
        .is_some_and(|seed| seed.stage <= from && from < journey.stage)
}

/// Derive the dashboard from journeys and the session flag snapshot.
pub fn project(journeys: &[CandidateJourney], session: &FlagSnapshot) -> DashboardView {
    let seeds = seed_journeys();
    let mut total = Delta::default();
    for journey in journeys {
        for from in TRANSITION_SOURCES {
            if flag_set(session, &keys::transition_applied(&journey.case_id, from))
                || moved_past(&seeds, journey, from)
            {
                let d = delta_leaving(from);
                total.upcoming += d.upcoming;
                total.documents += d.documents;
                total.bgc += d.bgc;
                total.id_creation += d.id_creation;
                total.in_progress += d.in_progress;
            }
        }
    }

    let base = DashboardCounters::BASELINE;
    let counters = DashboardCounters {
        upcoming_joiners: apply(base.upcoming_joiners, total.upcoming),
        pending_documents: apply(base.pending_documents, total.documents),
        pending_bgc: apply(base.pending_bgc, total.bgc),
        pending_id_creation: apply(base.pending_id_creation, total.id_creation),
        onboardings_in_progress: apply(base.onboardings_in_progress, total.in_progress),
        open_exceptions: journeys.iter().map(|j| j.exception_count).sum(),
    };

    let badges = journeys
        .iter()
        .map(|j| JourneyBadge {
            case_id: j.case_id.clone(),
            name: j.name.clone(),
            stage: j.stage,
            stage_label: j.stage.label(),
            progress: j.progress,
            exceptions: j.exception_count,
            completed: flag_set(session, &keys::journey_completed(&j.case_id)),
        })
        .collect();

    DashboardView { counters, badges }
}
