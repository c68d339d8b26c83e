//! Scripted assistant replies.

use uuid::Uuid;

use crate::journey::CandidateJourney;

use super::intent::UserMode;

/// Short pseudo-random ticket number, e.g. `ID-4F1A`.
pub fn ticket(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", id[..4].to_uppercase())
}

pub fn greeting(journey: &CandidateJourney, mode: UserMode) -> String {
    let mode_line = match mode {
        UserMode::Autonomous => "🚀 Autonomous (I can take independent actions)",
        UserMode::Assist => "🤝 Assist (I will work with your guidance)",
    };
    format!(
        "🎯 **Welcome to AI-Powered Onboarding!**\n\n\
         I'm here to streamline {name}'s onboarding journey with automation and real-time \
         assistance.\n\n\
         **Current Status:**\n\
         • Candidate: {name}\n\
         • Stage: {stage}\n\
         • Mode: {mode_line}\n\n\
         How would you like to proceed today?",
        name = journey.name,
        stage = journey.stage.label(),
    )
}

pub fn approved(journey: &CandidateJourney, mode: UserMode) -> String {
    let lead = match mode {
        UserMode::Autonomous => "Autonomously proceeding",
        UserMode::Assist => "I'm proceeding",
    };
    format!(
        "Thank you! {lead} with the next steps for {name}. Launching AI agents for ID creation, \
         payroll setup, and asset allocation processes. I'll keep you updated on the progress.\n\n\
         **Tickets Created:**\n\
         - ID Creation: {id}\n\
         - Payroll Setup: {pay}\n\
         - Asset Allocation: {ast}",
        name = journey.name,
        id = ticket("ID"),
        pay = ticket("PAY"),
        ast = ticket("AST"),
    )
}

pub fn already_approved(journey: &CandidateJourney) -> String {
    format!(
        "The BGC exception for {} has already been approved. ID creation is under way.",
        journey.name
    )
}

pub fn nothing_to_approve(journey: &CandidateJourney) -> String {
    format!(
        "There is nothing awaiting your approval for {} right now. Current stage: {}.",
        journey.name,
        journey.stage.label()
    )
}

pub fn start(journey: &CandidateJourney, mode: UserMode) -> String {
    let how = match mode {
        UserMode::Autonomous => "Autonomously executing",
        UserMode::Assist => "Initiating with your oversight",
    };
    format!(
        "Perfect! I'll start the onboarding process for {}. {how} the welcome email and \
         document collection process now.",
        journey.name
    )
}

pub fn initiation_complete(journey: &CandidateJourney) -> String {
    format!(
        "✅ Process initiated for {} • I'll monitor the progress and notify you of any updates.",
        journey.name
    )
}

pub fn bgc_summary(journey: &CandidateJourney) -> String {
    format!(
        "I've reviewed the BGC report for {}.\n\n\
         **Summary of BGC report:**\n\
         - Employment gap of 1 month between last 2 jobs at Company X and Company Y\n\
         - Employment period with employer1: 18 months\n\
         - Employment gap: 1 month\n\
         - Employment period with employer2: 24 months\n\
         - **Exception detected:** Passport expires in 4 months (Policy requires 6+ months)\n\n\
         **Risk Assessment:** Low risk - Employment gap within Silverline Manufacturing policy \
         (allows maximum gap of 3 months)\n\n\
         **Recommended actions:**\n\
         1. Approve BGC exception as it is low risk and business critical role\n\
         2. Request passport renewal before start date\n\
         3. Risk of denying: Delay in onboarding for critical position\n\n\
         Do you want to approve this exception?",
        journey.first_name()
    )
}

pub fn status(journey: &CandidateJourney, mode: UserMode) -> String {
    let oversight = match mode {
        UserMode::Autonomous => "Autonomous monitoring active",
        UserMode::Assist => "Manual oversight required",
    };
    format!(
        "**Current Status for {}:**\n\
         - Stage: {}\n\
         - Progress: {}% complete\n\
         - Open exceptions: {}\n\
         - {oversight}",
        journey.name,
        journey.stage.label(),
        journey.progress,
        journey.exception_count,
    )
}

pub fn documents(journey: &CandidateJourney, mode: UserMode) -> String {
    let how = match mode {
        UserMode::Autonomous => "autonomously processing",
        UserMode::Assist => "processing",
    };
    format!(
        "{} has uploaded their documents successfully. I'm now {how} them for verification. \
         The documents include passport, educational certificates, and previous employment \
         records. All appear to be in order.",
        journey.name
    )
}

pub fn switch_mode(mode: UserMode) -> String {
    let what = match mode {
        UserMode::Autonomous => "I will now take independent actions and provide updates.",
        UserMode::Assist => "I will now wait for your guidance before taking actions.",
    };
    format!(
        "Switching to {} mode. {what}",
        mode.to_string().to_uppercase()
    )
}

pub fn fallback(journey: &CandidateJourney, mode: UserMode) -> String {
    let mode = match mode {
        UserMode::Autonomous => "Autonomous",
        UserMode::Assist => "Assist",
    };
    format!(
        "I understand your query about {}. In {mode} mode, I can help you start onboarding, \
         check BGC status, review documents, get status updates, or switch between modes. \
         How would you like to proceed?",
        journey.name
    )
}
