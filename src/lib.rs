//! Onboard Assist: a scripted simulator of an AI-assisted employee
//! onboarding console.

pub mod auth;
pub mod channels;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod journey;
pub mod router;
pub mod simulator;
pub mod store;
pub mod telemetry;
pub mod transcript;
