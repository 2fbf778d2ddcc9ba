//! Project and deployment record models

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of deployment records retained per project
pub const HISTORY_LIMIT: usize = 10;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// Created but not yet deployable
    Inactive,

    /// Deployable and eligible for polling
    Ready,

    /// A deployment is currently executing
    Deploying,

    /// Last deployment failed; polling will not retry it
    Error,
}

/// Why a deployment was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Manual,
    Webhook,
    Polling,
}

/// Kind of managed service to restart after a successful deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Systemd,
    Pm2,
}

/// A configured source-repository-to-deployment-target binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project name (store key)
    pub name: String,

    /// Git remote URL; immutable after creation
    pub repo_url: String,

    /// Branch to deploy; immutable after creation
    pub branch: String,

    /// Local working tree the deploy script runs in
    pub deploy_path: PathBuf,

    /// Deploy script filename, relative to `deploy_path`
    pub deploy_script: String,

    /// Service manager used for the post-deploy restart, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_kind: Option<ServiceKind>,

    /// Name of the service to restart, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    /// Current status
    pub status: ProjectStatus,

    /// Whether the polling scheduler may auto-trigger this project
    #[serde(default = "default_true")]
    pub polling_enabled: bool,

    /// Commit hash of the last successful deployment
    #[serde(default)]
    pub last_commit: Option<String>,

    /// Timestamp of the last successful deployment
    #[serde(default)]
    pub last_deployment_at: Option<DateTime<Utc>>,

    /// Id of the in-flight deployment; present only while deploying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_deployment_id: Option<String>,

    /// Deployment records, most recent first, capped at [`HISTORY_LIMIT`]
    #[serde(default)]
    pub history: Vec<DeploymentRecord>,
}

fn default_true() -> bool {
    true
}

impl Project {
    /// Prepend a deployment record, dropping the oldest past the cap
    pub fn push_record(&mut self, record: DeploymentRecord) {
        self.history.insert(0, record);
        self.history.truncate(HISTORY_LIMIT);
    }
}

/// One execution of a project's deploy procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Unique id for this execution
    pub id: String,

    /// When the deployment was triggered
    pub triggered_at: DateTime<Utc>,

    /// What requested the deployment
    pub trigger: TriggerKind,

    /// Local commit hash after execution; may equal the prior commit
    #[serde(default)]
    pub commit: Option<String>,

    /// Whether the deploy script exited successfully
    pub succeeded: bool,

    /// Combined stdout+stderr captured from the deploy script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Error context for failed deployments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// An entry waiting in the deployment queue; never persisted
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub project_name: String,
    pub trigger: TriggerKind,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(project_name: impl Into<String>, trigger: TriggerKind) -> Self {
        Self {
            project_name: project_name.into(),
            trigger,
            enqueued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> DeploymentRecord {
        DeploymentRecord {
            id: id.to_string(),
            triggered_at: Utc::now(),
            trigger: TriggerKind::Manual,
            commit: Some("abc123".to_string()),
            succeeded: true,
            output: Some("ok".to_string()),
            error_message: None,
        }
    }

    fn project() -> Project {
        Project {
            name: "demo".to_string(),
            repo_url: "git@example.com:demo.git".to_string(),
            branch: "main".to_string(),
            deploy_path: PathBuf::from("/opt/demo"),
            deploy_script: "deploy.sh".to_string(),
            service_kind: None,
            service_name: None,
            status: ProjectStatus::Ready,
            polling_enabled: true,
            last_commit: None,
            last_deployment_at: None,
            current_deployment_id: None,
            history: Vec::new(),
        }
    }

    #[test]
    fn test_history_capped_most_recent_first() {
        let mut project = project();
        for i in 0..15 {
            project.push_record(record(&format!("dep-{}", i)));
        }

        assert_eq!(project.history.len(), HISTORY_LIMIT);
        assert_eq!(project.history[0].id, "dep-14");
        assert_eq!(project.history[9].id, "dep-5");
    }

    #[test]
    fn test_project_round_trips_all_fields() {
        let mut project = project();
        project.status = ProjectStatus::Error;
        project.service_kind = Some(ServiceKind::Systemd);
        project.service_name = Some("demo-service".to_string());
        project.last_commit = Some("a1a1a1".to_string());
        project.last_deployment_at = Some(Utc::now());
        project.current_deployment_id = Some("dep-1".to_string());
        project.push_record(record("dep-1"));

        let json = serde_json::to_string(&project).unwrap();
        let back: Project = serde_json::from_str(&json).unwrap();

        assert_eq!(back.name, project.name);
        assert_eq!(back.repo_url, project.repo_url);
        assert_eq!(back.branch, project.branch);
        assert_eq!(back.deploy_path, project.deploy_path);
        assert_eq!(back.deploy_script, project.deploy_script);
        assert_eq!(back.service_kind, Some(ServiceKind::Systemd));
        assert_eq!(back.service_name, project.service_name);
        assert_eq!(back.status, ProjectStatus::Error);
        assert_eq!(back.polling_enabled, project.polling_enabled);
        assert_eq!(back.last_commit, project.last_commit);
        assert_eq!(back.last_deployment_at, project.last_deployment_at);
        assert_eq!(back.current_deployment_id, project.current_deployment_id);
        assert_eq!(back.history.len(), 1);
        assert_eq!(back.history[0].id, "dep-1");
    }

    #[test]
    fn test_polling_enabled_defaults_true() {
        let json = r#"{
            "name": "demo",
            "repo_url": "git@example.com:demo.git",
            "branch": "main",
            "deploy_path": "/opt/demo",
            "deploy_script": "deploy.sh",
            "status": "ready"
        }"#;

        let project: Project = serde_json::from_str(json).unwrap();
        assert!(project.polling_enabled);
        assert!(project.history.is_empty());
        assert!(project.last_commit.is_none());
    }
}
