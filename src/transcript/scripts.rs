//! Built-in transcript scripts.

use std::time::Duration;

use crate::journey::{CandidateJourney, Stage};

use super::model::{ActivityRecord, ActivityStatus, Script};

pub const ALEX_INITIATION: &str = "alex_initiation";
pub const JORDAN_BGC_REVIEW: &str = "jordan_bgc_review";
pub const MONITORING: &str = "monitoring";

const PLANNING_THOUGHTS: &[&str] = &[
    "🔍 Analyzing candidate data patterns and requirements...",
    "🧠 Cross-referencing systems and planning optimal workflow...",
    "⚡ Processing contextual information and generating strategy...",
    "📊 Evaluating dependencies and orchestrating task sequence...",
    "🎯 Reasoning through onboarding priorities and timeline...",
    "🔄 Synthesizing data inputs and formulating action plan...",
];

const BGC_THOUGHTS: &[&str] = &[
    "🔍 Parsing BGC report data and policy compliance...",
    "🧠 Evaluating risk factors and business impact...",
    "⚡ Cross-referencing approval guidelines and precedents...",
    "📊 Computing risk scores and recommendation confidence...",
    "🎯 Orchestrating system provisioning workflows...",
    "🔄 Coordinating multi-agent deployment sequence...",
];

fn mins(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

/// Onboarding kickoff for Alex Morgan. Completing it moves the journey to
/// "File Upload Pending".
pub fn alex_initiation() -> Script {
    Script {
        name: ALEX_INITIATION.into(),
        thinking: PLANNING_THOUGHTS,
        records: vec![
            ActivityRecord::new("Onboarding Planner Agent", "", "Onboarding Planner Agent")
                .with_ticket("OPA-AM-2024-000")
                .ago(mins(1)),
            ActivityRecord::new(
                "Querying candidate data",
                "Pulling Alex's data from Applicant Tracking System, Analyzing Alex Morgan's role \
                 specification and work location\n\nDetermining documentation requirements, BGC \
                 checks required for role.",
                "Data Query Agent",
            )
            .with_ticket("QRY-AM-2024-001")
            .ago(mins(1)),
            ActivityRecord::new(
                "🧠 Understanding immediate actions",
                "Identifying critical dependencies for January 5th start date, prioritizing task \
                 sequence, creating onboarding steps and defining timeline.",
                "Strategic Planner Agent",
            )
            .with_ticket("STR-AM-2024-002")
            .ago(mins(1)),
            ActivityRecord::new(
                "✍️ Preparing Welcome emails for onboarding",
                "Generating personalized welcome content, and communicating documentation and BGC \
                 requirements for Onboarding",
                "Content Generation Agent",
            )
            .with_ticket("CNT-AM-2024-003")
            .ago(Duration::from_secs(30)),
            ActivityRecord::new(
                "📤 Sending welcome communications",
                "Successfully dispatched welcome email package with instructions for document \
                 submission",
                "Communication Delivery Agent",
            )
            .with_ticket("SND-AM-2024-004")
            .ago(Duration::from_secs(30)),
            ActivityRecord::new(
                "👁️ Monitoring email delivery status",
                "Email delivered successfully",
                "Communication Delivery Agent",
            )
            .with_ticket("MON-AM-2024-005")
            .ago(Duration::from_secs(30)),
        ],
    }
}

/// BGC report review for Jordan Lee. Followed by the approval question.
pub fn jordan_bgc_review() -> Script {
    Script {
        name: JORDAN_BGC_REVIEW.into(),
        thinking: BGC_THOUGHTS,
        records: vec![
            ActivityRecord::new("Onboarding Planner Agent", "", "Onboarding Planner Agent")
                .with_ticket("OPA-JO-2024-000")
                .ago(mins(3)),
            ActivityRecord::new(
                "📊 Summarizing BGC report",
                "Analyzing background check findings, employment gaps, and risk assessment \
                 metrics from vendor report",
                "BGC Analysis Agent",
            )
            .with_ticket("BGC-SUM-2024-001")
            .ago(mins(3)),
            ActivityRecord::new(
                "🎯 Generating recommendations",
                "Processing company policy guidelines, risk thresholds, and business impact to \
                 formulate approval recommendation",
                "Risk Assessment Agent",
            )
            .with_ticket("REC-GEN-2024-002")
            .ago(mins(3)),
            ActivityRecord::new(
                "🚀 Launching AI agents for ID creation",
                "Deploying IdentityBot, PayrollAgent, and AssetProvisionBot for employee system \
                 setup and provisioning",
                "Orchestration Hub",
            )
            .with_ticket("BOT-LAUNCH-2024-003")
            .ago(mins(1)),
            ActivityRecord::new(
                "🎫 Tickets created for system setup",
                "Generated tracking tickets: EMP-ID-JL-2024, PAY-SETUP-JL-2024, \
                 IT-ASSETS-JL-2024 for monitoring progress",
                "Ticket Management System",
            )
            .with_ticket("TKT-CREATE-2024-004")
            .ago(mins(1)),
        ],
    }
}

/// Background monitoring for any journey, with one extra record for the
/// stages that have something to chase.
pub fn monitoring(journey: &CandidateJourney) -> Script {
    let mut records = vec![
        ActivityRecord::new(
            "Querying candidate data",
            format!("Retrieved comprehensive onboarding data for {}", journey.name),
            "Data Query Agent",
        ),
        ActivityRecord::new(
            "Understanding immediate actions",
            format!(
                "Analyzed current stage: {}. Identified next steps in workflow",
                journey.stage.label()
            ),
            "Strategic Planner Agent",
        ),
        ActivityRecord::new(
            "Document validation system check",
            "Verified document upload portal is operational and secure",
            "Security Validation Agent",
        ),
        ActivityRecord::new(
            "BGC vendor integration status",
            "Confirmed BGC vendor API connectivity and SLA compliance",
            "External Integration Agent",
        ),
        ActivityRecord::new(
            "Payroll system integration",
            "Pre-validating employee setup parameters for payroll system",
            "Payroll Integration Agent",
        ),
    ];

    if journey.exception_count > 0 {
        records.push(
            ActivityRecord::new(
                "Passport expiry validation",
                "⚠️ Exception detected: Passport expires in 4 months. Policy requires 6+ months validity",
                "Document Compliance Agent",
            )
            .with_status(ActivityStatus::Error),
        );
    }

    match journey.stage {
        Stage::BgcPending => records.push(ActivityRecord::new(
            "Summarizing BGC report",
            "BGC report processed. Employment gap of 1 month identified between employers",
            "BGC Processing Agent",
        )),
        Stage::FileUploadPending => records.push(ActivityRecord::new(
            "Document reminder automation",
            "Sending automated reminder to candidate for pending document submission",
            "Reminder Automation Agent",
        )),
        Stage::NotStarted | Stage::IdCreationPending => {}
    }

    Script {
        name: MONITORING.into(),
        records,
        thinking: PLANNING_THOUGHTS,
    }
}
