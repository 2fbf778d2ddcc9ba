//! Deployment orchestration

pub mod detect;
pub mod executor;
pub mod fsm;
pub mod git;
pub mod queue;
pub mod runner;
pub mod service;
