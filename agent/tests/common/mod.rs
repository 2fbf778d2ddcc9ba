//! Shared test fixtures: scripted command runner and temp-dir stores

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use depagent::deploy::runner::{CmdOutput, CommandRunner};
use depagent::errors::AgentError;
use depagent::filesys::dir::Dir;
use depagent::models::project::{Project, ProjectStatus};
use depagent::storage::deploy_log::DeployLogs;
use depagent::storage::projects::ProjectStore;

/// A scripted stand-in for the real shell runner.
///
/// Simulates a working tree at `local_head` with a remote at `remote_head`;
/// a successful deploy script moves the local head to the remote head, as a
/// real script's `git pull` would.
pub struct ScriptedRunner {
    pub local_head: Mutex<String>,
    pub remote_head: String,
    pub script_exit: i32,
    pub script_output: String,
    /// Fail the deploy script only when the cwd contains this substring
    pub script_fail_path: Option<String>,
    pub restart_exit: i32,
    pub fetch_exit: i32,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new(local_head: &str, remote_head: &str) -> Self {
        Self {
            local_head: Mutex::new(local_head.to_string()),
            remote_head: remote_head.to_string(),
            script_exit: 0,
            script_output: "deployed\n".to_string(),
            script_fail_path: None,
            restart_exit: 0,
            fetch_exit: 0,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn script_ran(&self) -> bool {
        self.calls().iter().any(|c| c.starts_with("bash"))
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<CmdOutput, AgentError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", program, args.join(" ")));

        let out = match (program, args) {
            ("git", ["rev-parse", "HEAD"]) => CmdOutput {
                code: 0,
                output: format!("{}\n", self.local_head.lock().unwrap()),
            },
            ("git", ["fetch", "origin", _]) => CmdOutput {
                code: self.fetch_exit,
                output: if self.fetch_exit == 0 {
                    String::new()
                } else {
                    "fatal: could not read from remote repository\n".to_string()
                },
            },
            ("git", ["rev-parse", remote]) if remote.starts_with("origin/") => CmdOutput {
                code: 0,
                output: format!("{}\n", self.remote_head),
            },
            ("bash", _) => {
                let path_fails = self.script_fail_path.as_deref().is_some_and(|needle| {
                    cwd.is_some_and(|c| c.to_string_lossy().contains(needle))
                });
                let code = if path_fails { 1 } else { self.script_exit };
                if code == 0 {
                    *self.local_head.lock().unwrap() = self.remote_head.clone();
                }
                CmdOutput {
                    code,
                    output: self.script_output.clone(),
                }
            }
            ("sudo", _) | ("pm2", _) => CmdOutput {
                code: self.restart_exit,
                output: String::new(),
            },
            _ => CmdOutput {
                code: 0,
                output: String::new(),
            },
        };

        Ok(out)
    }
}

/// Fresh store + deploy logs rooted in a unique temp directory
pub async fn temp_fixtures() -> (Arc<ProjectStore>, Arc<DeployLogs>, Dir) {
    let dir = Dir::create_temp_dir("depagent-test").await.unwrap();
    let store = ProjectStore::load_or_default(dir.file("projects.json"))
        .await
        .unwrap();
    let logs = DeployLogs::new(Dir::new(dir.path().join("logs")));
    (Arc::new(store), Arc::new(logs), dir)
}

pub fn sample_project(name: &str) -> Project {
    Project {
        name: name.to_string(),
        repo_url: format!("git@example.com:{}.git", name),
        branch: "main".to_string(),
        deploy_path: PathBuf::from(format!("/opt/{}", name)),
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
