//! Durable state: settings, projects, per-project deploy logs

pub mod deploy_log;
pub mod layout;
pub mod projects;
pub mod settings;
