//! Per-project deploy logs
//!
//! One append-only file per project under the logs directory, holding the
//! timestamped full output of every deployment.

use chrono::Utc;

use crate::errors::AgentError;
use crate::filesys::dir::Dir;
use crate::filesys::file::File;

/// Append-only per-project deployment logs
pub struct DeployLogs {
    dir: Dir,
}

impl DeployLogs {
    pub fn new(dir: Dir) -> Self {
        Self { dir }
    }

    fn log_file(&self, project_name: &str) -> File {
        self.dir.file(&format!("{}.log", project_name))
    }

    /// Append a timestamped entry to a project's log
    pub async fn append(&self, project_name: &str, text: &str) -> Result<(), AgentError> {
        let entry = format!("\n[{}] {}\n", Utc::now().to_rfc3339(), text);
        self.log_file(project_name).append_string(&entry).await
    }

    /// Read the last `lines` lines of a project's log, optionally filtered
    /// by a case-insensitive substring match
    pub async fn tail(
        &self,
        project_name: &str,
        lines: usize,
        search: Option<&str>,
    ) -> Result<Vec<String>, AgentError> {
        let file = self.log_file(project_name);
        if !file.exists().await {
            return Ok(Vec::new());
        }

        let contents = file.read_string().await?;
        let needle = search.map(|s| s.to_lowercase());

        let mut matched: Vec<&str> = contents
            .lines()
            .filter(|line| match &needle {
                Some(needle) => line.to_lowercase().contains(needle),
                None => true,
            })
            .collect();

        if matched.len() > lines {
            matched = matched.split_off(matched.len() - lines);
        }

        Ok(matched.into_iter().map(str::to_string).collect())
    }

    /// Delete a project's log file
    pub async fn remove(&self, project_name: &str) -> Result<(), AgentError> {
        self.log_file(project_name).delete().await
    }
}
