//! Deployment execution
//!
//! Runs one dequeued entry at a time: change detection, the deploy script,
//! the best-effort service restart, and all project store bookkeeping.
//! Every error inside a deployment becomes a failed record plus status
//! `error`; nothing escapes to abort the drain loop.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::deploy::detect::is_noop;
use crate::deploy::fsm::{self, StatusEvent};
use crate::deploy::queue::Execute;
use crate::deploy::runner::CommandRunner;
use crate::deploy::{git, service};
use crate::errors::AgentError;
use crate::models::project::{DeploymentRecord, Project, ProjectStatus, QueueEntry, TriggerKind};
use crate::storage::deploy_log::DeployLogs;
use crate::storage::projects::ProjectStore;

/// Result of the deploy procedure proper (steps 3-9)
enum Outcome {
    /// Polling trigger with no new commit; no script was run
    Skipped,

    /// The deploy script ran and exited 0
    Deployed { commit: String, output: String },
}

/// A failed deployment, with the script output retained when there is one
struct Failure {
    error: AgentError,
    output: Option<String>,
}

impl Failure {
    fn from(error: AgentError) -> Self {
        Self {
            error,
            output: None,
        }
    }
}

/// Executes dequeued deployment entries against the project store
pub struct DeploymentExecutor {
    store: Arc<ProjectStore>,
    runner: Arc<dyn CommandRunner>,
    logs: Arc<DeployLogs>,
}

impl DeploymentExecutor {
    pub fn new(
        store: Arc<ProjectStore>,
        runner: Arc<dyn CommandRunner>,
        logs: Arc<DeployLogs>,
    ) -> Self {
        Self {
            store,
            runner,
            logs,
        }
    }

    /// Steps 3-9 of the deploy procedure. Touches no shared state; the
    /// caller owns all store updates.
    async fn run_deployment(
        &self,
        project: &Project,
        trigger: TriggerKind,
    ) -> Result<Outcome, Failure> {
        let dir = project.deploy_path.as_path();

        let before = git::head_commit(self.runner.as_ref(), dir)
            .await
            .map_err(Failure::from)?;
        git::fetch_branch(self.runner.as_ref(), dir, &project.branch)
            .await
            .map_err(Failure::from)?;
        let after = git::remote_head(self.runner.as_ref(), dir, &project.branch)
            .await
            .map_err(Failure::from)?;

        if is_noop(trigger, &before, &after) {
            return Ok(Outcome::Skipped);
        }

        let script = project.deploy_path.join(&project.deploy_script);
        let script = script.to_string_lossy().into_owned();
        let result = self
            .runner
            .run("bash", &[script.as_str()], Some(dir))
            .await
            .map_err(|e| {
                Failure::from(AgentError::ScriptError(format!(
                    "Failed to start deploy script: {}",
                    e
                )))
            })?;

        if !result.success() {
            return Err(Failure {
                error: AgentError::ScriptError(format!(
                    "{} exited with code {}",
                    project.deploy_script, result.code
                )),
                output: Some(result.output),
            });
        }

        // Restart is decoupled from the deployment outcome: the code is
        // already deployed, a restart failure is only a warning
        if let (Some(kind), Some(name)) = (project.service_kind, project.service_name.as_deref()) {
            if let Err(e) = service::restart_service(self.runner.as_ref(), kind, name).await {
                warn!("Failed to restart service {}: {}", name, e);
            } else {
                info!("Restarted service {}", name);
            }
        }

        let commit = git::head_commit(self.runner.as_ref(), dir)
            .await
            .map_err(|e| Failure {
                error: e,
                output: Some(result.output.clone()),
            })?;

        Ok(Outcome::Deployed {
            commit,
            output: result.output,
        })
    }

    /// Resolve the post-deployment status through the transition table
    fn close_status(event: &StatusEvent) -> ProjectStatus {
        match fsm::transition(ProjectStatus::Deploying, event) {
            Ok(status) => status,
            Err(e) => {
                error!("Status bookkeeping error: {}", e);
                ProjectStatus::Error
            }
        }
    }

    async fn finish(
        &self,
        name: &str,
        status: ProjectStatus,
        record: Option<DeploymentRecord>,
        success: Option<(&str, DateTime<Utc>)>,
    ) {
        let result = self
            .store
            .update(name, |p| {
                if let Some((commit, at)) = success {
                    p.last_commit = Some(commit.to_string());
                    p.last_deployment_at = Some(at);
                }
                if let Some(record) = record {
                    p.push_record(record);
                }
                p.status = status;
                p.current_deployment_id = None;
            })
            .await;

        // Persistence failures here must not take down the drain loop
        if let Err(e) = result {
            error!("Failed to persist deployment result for {}: {}", name, e);
        }
    }
}

#[async_trait]
impl Execute for DeploymentExecutor {
    async fn execute(&self, entry: QueueEntry) {
        // Entries referencing a removed project are dropped, never executed
        let Some(project) = self.store.get(&entry.project_name).await else {
            debug!(
                "Dropping queued entry for unknown project {}",
                entry.project_name
            );
            return;
        };

        let previous_status = project.status;
        let begin = match fsm::transition(previous_status, &StatusEvent::Begin) {
            Ok(status) => status,
            Err(e) => {
                error!("Cannot start deployment for {}: {}", project.name, e);
                return;
            }
        };

        let deployment_id = Uuid::new_v4().to_string();
        info!(
            "Starting deployment {} for {} ({:?})",
            deployment_id, project.name, entry.trigger
        );

        if let Err(e) = self
            .store
            .update(&entry.project_name, |p| {
                p.status = begin;
                p.current_deployment_id = Some(deployment_id.clone());
            })
            .await
        {
            error!("Failed to mark {} as deploying: {}", project.name, e);
        }

        match self.run_deployment(&project, entry.trigger).await {
            Ok(Outcome::Skipped) => {
                debug!("No changes detected for {}, skipping", project.name);
                let status = Self::close_status(&StatusEvent::Skip {
                    previous: previous_status,
                });
                self.finish(&project.name, status, None, None).await;
            }
            Ok(Outcome::Deployed { commit, output }) => {
                let record = DeploymentRecord {
                    id: deployment_id.clone(),
                    triggered_at: entry.enqueued_at,
                    trigger: entry.trigger,
                    commit: Some(commit.clone()),
                    succeeded: true,
                    output: Some(output.clone()),
                    error_message: None,
                };
                let status = Self::close_status(&StatusEvent::Succeed);
                self.finish(
                    &project.name,
                    status,
                    Some(record),
                    Some((commit.as_str(), entry.enqueued_at)),
                )
                .await;

                if let Err(e) = self
                    .logs
                    .append(
                        &project.name,
                        &format!("Deployment {} SUCCESS:\n{}", deployment_id, output),
                    )
                    .await
                {
                    error!("Failed to write deploy log for {}: {}", project.name, e);
                }

                info!(
                    "Deployment {} completed successfully for {}",
                    deployment_id, project.name
                );
            }
            Err(failure) => {
                error!(
                    "Deployment {} failed for {}: {}",
                    deployment_id, project.name, failure.error
                );

                let message = failure.error.to_string();
                let record = DeploymentRecord {
                    id: deployment_id.clone(),
                    triggered_at: entry.enqueued_at,
                    trigger: entry.trigger,
                    // The failed run deployed nothing; keep the prior commit
                    commit: project.last_commit.clone(),
                    succeeded: false,
                    output: failure.output.clone(),
                    error_message: Some(message.clone()),
                };
                let status = Self::close_status(&StatusEvent::Fail);
                self.finish(&project.name, status, Some(record), None).await;

                let mut log_entry = format!("Deployment {} FAILED: {}", deployment_id, message);
                if let Some(output) = &failure.output {
                    log_entry.push('\n');
                    log_entry.push_str(output);
                }
                if let Err(e) = self.logs.append(&project.name, &log_entry).await {
                    error!("Failed to write deploy log for {}: {}", project.name, e);
                }
            }
        }
    }
}
