//! Project store
//!
//! Single source of truth for project state. Every mutation holds the one
//! writer lock and persists the full mapping to disk (atomic temp-file
//! rename) before returning, so a successful call survives a crash
//! immediately after it. Administrative calls and executor status updates
//! therefore can never interleave their persists.

use indexmap::IndexMap;
use tokio::sync::Mutex;
use tracing::warn;

use crate::errors::AgentError;
use crate::filesys::file::File;
use crate::models::project::{Project, ProjectStatus};

/// Durable, insertion-ordered mapping from project name to project state
pub struct ProjectStore {
    file: File,
    inner: Mutex<IndexMap<String, Project>>,
}

impl ProjectStore {
    /// Load the store, falling back to an empty mapping when the backing
    /// file is missing or corrupt. The fallback is persisted immediately.
    pub async fn load_or_default(file: File) -> Result<Self, AgentError> {
        let mut projects = if file.exists().await {
            match file.read_json::<IndexMap<String, Project>>().await {
                Ok(projects) => projects,
                Err(e) => {
                    warn!(
                        "Unable to read projects file ({}), starting empty: {}",
                        file.path().display(),
                        e
                    );
                    IndexMap::new()
                }
            }
        } else {
            IndexMap::new()
        };

        // A deployment cannot survive a restart. A project found still in
        // `deploying` was interrupted mid-run; move it to `error` so the next
        // manual or webhook trigger can start cleanly instead of being
        // rejected by the status table.
        for project in projects.values_mut() {
            if project.status == ProjectStatus::Deploying {
                warn!(
                    "Project {} was mid-deployment at last shutdown, marking as error",
                    project.name
                );
                project.status = ProjectStatus::Error;
                project.current_deployment_id = None;
            }
        }

        let store = Self {
            file,
            inner: Mutex::new(projects),
        };
        store.persist(&*store.inner.lock().await).await?;
        Ok(store)
    }

    async fn persist(&self, projects: &IndexMap<String, Project>) -> Result<(), AgentError> {
        self.file
            .write_json(projects)
            .await
            .map_err(|e| AgentError::StorageError(format!("Failed to persist projects: {}", e)))
    }

    /// Get a project by name
    pub async fn get(&self, name: &str) -> Option<Project> {
        self.inner.lock().await.get(name).cloned()
    }

    /// Insert or replace a project, keyed by its name
    pub async fn upsert(&self, project: Project) -> Result<(), AgentError> {
        let mut projects = self.inner.lock().await;
        projects.insert(project.name.clone(), project);
        self.persist(&projects).await
    }

    /// Apply a mutation to a named project and persist the result.
    ///
    /// Returns the updated project, or None when it does not exist. The
    /// read-modify-persist runs under the writer lock so concurrent callers
    /// cannot drop each other's changes.
    pub async fn update<F>(&self, name: &str, mutate: F) -> Result<Option<Project>, AgentError>
    where
        F: FnOnce(&mut Project),
    {
        let mut projects = self.inner.lock().await;
        let Some(project) = projects.get_mut(name) else {
            return Ok(None);
        };
        mutate(project);
        let updated = project.clone();
        self.persist(&projects).await?;
        Ok(Some(updated))
    }

    /// Remove a project. Returns false when it was not present.
    pub async fn delete(&self, name: &str) -> Result<bool, AgentError> {
        let mut projects = self.inner.lock().await;
        // shift_remove keeps the insertion order of the remaining projects
        let removed = projects.shift_remove(name).is_some();
        if removed {
            self.persist(&projects).await?;
        }
        Ok(removed)
    }

    /// Snapshot of the full mapping, in insertion order
    pub async fn list(&self) -> IndexMap<String, Project> {
        self.inner.lock().await.clone()
    }

    /// Number of configured projects
    pub async fn count(&self) -> usize {
        self.inner.lock().await.len()
    }
}
