//! Deployment executor scenarios

mod common;

use std::sync::Arc;

use depagent::deploy::executor::DeploymentExecutor;
use depagent::deploy::queue::Execute;
use depagent::models::project::{ProjectStatus, QueueEntry, ServiceKind, TriggerKind};

use common::{sample_project, temp_fixtures, ScriptedRunner};

fn executor(
    store: &Arc<depagent::storage::projects::ProjectStore>,
    logs: &Arc<depagent::storage::deploy_log::DeployLogs>,
    runner: Arc<ScriptedRunner>,
) -> DeploymentExecutor {
    DeploymentExecutor::new(store.clone(), runner, logs.clone())
}

#[tokio::test]
async fn test_manual_trigger_success() {
    let (store, logs, _dir) = temp_fixtures().await;
    store.upsert(sample_project("demo")).await.unwrap();

    // Local and remote both at a1a1a1: manual triggers deploy anyway
    let runner = Arc::new(ScriptedRunner::new("a1a1a1", "a1a1a1"));
    let exec = executor(&store, &logs, runner.clone());

    exec.execute(QueueEntry::new("demo", TriggerKind::Manual)).await;

    assert!(runner.script_ran());
    let project = store.get("demo").await.unwrap();
    assert_eq!(project.status, ProjectStatus::Ready);
    assert_eq!(project.last_commit.as_deref(), Some("a1a1a1"));
    assert!(project.last_deployment_at.is_some());
    assert!(project.current_deployment_id.is_none());
    assert_eq!(project.history.len(), 1);

    let record = &project.history[0];
    assert!(record.succeeded);
    assert_eq!(record.trigger, TriggerKind::Manual);
    assert_eq!(record.commit.as_deref(), Some("a1a1a1"));
    assert!(record.output.as_deref().unwrap().contains("deployed"));
}

#[tokio::test]
async fn test_polling_noop_skips_script() {
    let (store, logs, _dir) = temp_fixtures().await;
    store.upsert(sample_project("demo")).await.unwrap();

    let runner = Arc::new(ScriptedRunner::new("a1a1a1", "a1a1a1"));
    let exec = executor(&store, &logs, runner.clone());

    exec.execute(QueueEntry::new("demo", TriggerKind::Polling)).await;

    assert!(!runner.script_ran());
    let project = store.get("demo").await.unwrap();
    assert_eq!(project.status, ProjectStatus::Ready);
    assert!(project.current_deployment_id.is_none());
    assert!(project.history.is_empty());
    assert!(project.last_commit.is_none());
}

#[tokio::test]
async fn test_polling_with_new_commit_runs_script() {
    let (store, logs, _dir) = temp_fixtures().await;
    store.upsert(sample_project("demo")).await.unwrap();

    let runner = Arc::new(ScriptedRunner::new("a1a1a1", "b2b2b2"));
    let exec = executor(&store, &logs, runner.clone());

    exec.execute(QueueEntry::new("demo", TriggerKind::Polling)).await;

    assert!(runner.script_ran());
    let project = store.get("demo").await.unwrap();
    assert_eq!(project.status, ProjectStatus::Ready);
    assert_eq!(project.last_commit.as_deref(), Some("b2b2b2"));
}

#[tokio::test]
async fn test_script_failure_records_error() {
    let (store, logs, _dir) = temp_fixtures().await;
    store.upsert(sample_project("demo")).await.unwrap();

    let mut runner = ScriptedRunner::new("a1a1a1", "b2b2b2");
    runner.script_exit = 2;
    runner.script_output = "npm ERR! build failed\n".to_string();
    let runner = Arc::new(runner);
    let exec = executor(&store, &logs, runner.clone());

    exec.execute(QueueEntry::new("demo", TriggerKind::Polling)).await;

    let project = store.get("demo").await.unwrap();
    assert_eq!(project.status, ProjectStatus::Error);
    // A failed deploy never advances the commit
    assert!(project.last_commit.is_none());
    assert!(project.current_deployment_id.is_none());

    let record = &project.history[0];
    assert!(!record.succeeded);
    assert_eq!(record.trigger, TriggerKind::Polling);
    assert!(record.error_message.as_deref().unwrap().contains("code 2"));
    assert!(record.output.as_deref().unwrap().contains("build failed"));
}

#[tokio::test]
async fn test_fetch_failure_records_error() {
    let (store, logs, _dir) = temp_fixtures().await;
    store.upsert(sample_project("demo")).await.unwrap();

    let mut runner = ScriptedRunner::new("a1a1a1", "b2b2b2");
    runner.fetch_exit = 128;
    let runner = Arc::new(runner);
    let exec = executor(&store, &logs, runner.clone());

    exec.execute(QueueEntry::new("demo", TriggerKind::Manual)).await;

    assert!(!runner.script_ran());
    let project = store.get("demo").await.unwrap();
    assert_eq!(project.status, ProjectStatus::Error);
    let record = &project.history[0];
    assert!(!record.succeeded);
    assert!(record
        .error_message
        .as_deref()
        .unwrap()
        .contains("git fetch"));
}

#[tokio::test]
async fn test_service_restart_failure_does_not_fail_deployment() {
    let (store, logs, _dir) = temp_fixtures().await;
    let mut project = sample_project("demo");
    project.service_kind = Some(ServiceKind::Systemd);
    project.service_name = Some("demo-service".to_string());
    store.upsert(project).await.unwrap();

    let mut runner = ScriptedRunner::new("a1a1a1", "b2b2b2");
    runner.restart_exit = 1;
    let runner = Arc::new(runner);
    let exec = executor(&store, &logs, runner.clone());

    exec.execute(QueueEntry::new("demo", TriggerKind::Manual)).await;

    // Restart was attempted
    assert!(runner.calls().iter().any(|c| c.contains("systemctl restart")));
    // But the deployment still succeeded
    let project = store.get("demo").await.unwrap();
    assert_eq!(project.status, ProjectStatus::Ready);
    assert!(project.history[0].succeeded);
}

#[tokio::test]
async fn test_manual_trigger_recovers_from_error_status() {
    let (store, logs, _dir) = temp_fixtures().await;
    let mut project = sample_project("demo");
    project.status = depagent::models::project::ProjectStatus::Error;
    store.upsert(project).await.unwrap();

    let runner = Arc::new(ScriptedRunner::new("a1a1a1", "b2b2b2"));
    let exec = executor(&store, &logs, runner.clone());

    exec.execute(QueueEntry::new("demo", TriggerKind::Manual)).await;

    let project = store.get("demo").await.unwrap();
    assert_eq!(project.status, ProjectStatus::Ready);
}

#[tokio::test]
async fn test_manual_trigger_runs_after_interrupted_deployment() {
    let (store, logs, dir) = temp_fixtures().await;
    let mut project = sample_project("demo");
    project.status = ProjectStatus::Deploying;
    project.current_deployment_id = Some("dep-stale".to_string());
    store.upsert(project).await.unwrap();

    // Restart: reload the store from disk, then retrigger manually
    let store = Arc::new(
        depagent::storage::projects::ProjectStore::load_or_default(dir.file("projects.json"))
            .await
            .unwrap(),
    );
    let runner = Arc::new(ScriptedRunner::new("a1a1a1", "b2b2b2"));
    let exec = executor(&store, &logs, runner.clone());

    exec.execute(QueueEntry::new("demo", TriggerKind::Manual)).await;

    assert!(runner.script_ran());
    let project = store.get("demo").await.unwrap();
    assert_eq!(project.status, ProjectStatus::Ready);
    assert_eq!(project.last_commit.as_deref(), Some("b2b2b2"));
}

#[tokio::test]
async fn test_unknown_project_entry_dropped() {
    let (store, logs, _dir) = temp_fixtures().await;

    let runner = Arc::new(ScriptedRunner::new("a1a1a1", "b2b2b2"));
    let exec = executor(&store, &logs, runner.clone());

    exec.execute(QueueEntry::new("ghost", TriggerKind::Manual)).await;

    // Nothing ran, nothing stored
    assert!(runner.calls().is_empty());
    assert!(store.get("ghost").await.is_none());
}

#[tokio::test]
async fn test_failure_isolated_from_next_project() {
    let (store, logs, _dir) = temp_fixtures().await;
    store.upsert(sample_project("alpha")).await.unwrap();
    store.upsert(sample_project("beta")).await.unwrap();

    let mut runner = ScriptedRunner::new("a1a1a1", "b2b2b2");
    runner.script_fail_path = Some("alpha".to_string());
    let runner = Arc::new(runner);
    let exec = executor(&store, &logs, runner.clone());

    exec.execute(QueueEntry::new("alpha", TriggerKind::Manual)).await;
    exec.execute(QueueEntry::new("beta", TriggerKind::Manual)).await;

    // alpha failed and stays failed; beta deployed as if alpha never ran
    let alpha = store.get("alpha").await.unwrap();
    assert_eq!(alpha.status, ProjectStatus::Error);
    assert!(alpha.last_commit.is_none());

    let beta = store.get("beta").await.unwrap();
    assert_eq!(beta.status, ProjectStatus::Ready);
    assert_eq!(beta.last_commit.as_deref(), Some("b2b2b2"));
    assert!(beta.history[0].succeeded);
}

#[tokio::test]
async fn test_history_capped_at_ten() {
    let (store, logs, _dir) = temp_fixtures().await;
    store.upsert(sample_project("demo")).await.unwrap();

    let runner = Arc::new(ScriptedRunner::new("a1a1a1", "b2b2b2"));
    let exec = executor(&store, &logs, runner.clone());

    for _ in 0..12 {
        exec.execute(QueueEntry::new("demo", TriggerKind::Manual)).await;
    }

    let project = store.get("demo").await.unwrap();
    assert_eq!(project.history.len(), 10);
    // Most recent first: every id unique
    let first = &project.history[0].id;
    assert!(project.history[1..].iter().all(|r| &r.id != first));
}

#[tokio::test]
async fn test_deploy_log_written() {
    let (store, logs, _dir) = temp_fixtures().await;
    store.upsert(sample_project("demo")).await.unwrap();

    let runner = Arc::new(ScriptedRunner::new("a1a1a1", "b2b2b2"));
    let exec = executor(&store, &logs, runner.clone());

    exec.execute(QueueEntry::new("demo", TriggerKind::Manual)).await;

    let lines = logs.tail("demo", 50, None).await.unwrap();
    assert!(lines.iter().any(|l| l.contains("SUCCESS")));
    assert!(lines.iter().any(|l| l.contains("deployed")));
}
