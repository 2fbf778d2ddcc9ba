//! Git operations for change detection
//!
//! Every invocation is rooted at an explicit working directory; the agent
//! never changes its own process-wide current directory.

use std::path::Path;

use crate::deploy::runner::CommandRunner;
use crate::errors::AgentError;

/// Read the local HEAD commit hash of a working tree
pub async fn head_commit(runner: &dyn CommandRunner, dir: &Path) -> Result<String, AgentError> {
    let result = runner
        .run("git", &["rev-parse", "HEAD"], Some(dir))
        .await
        .map_err(|e| AgentError::FetchError(format!("Failed to run git rev-parse: {}", e)))?;

    if !result.success() {
        return Err(AgentError::FetchError(format!(
            "git rev-parse HEAD failed: {}",
            result.output.trim()
        )));
    }

    Ok(result.output.trim().to_string())
}

/// Fetch a branch from the origin remote
pub async fn fetch_branch(
    runner: &dyn CommandRunner,
    dir: &Path,
    branch: &str,
) -> Result<(), AgentError> {
    let result = runner
        .run("git", &["fetch", "origin", branch], Some(dir))
        .await
        .map_err(|e| AgentError::FetchError(format!("Failed to run git fetch: {}", e)))?;

    if !result.success() {
        return Err(AgentError::FetchError(format!(
            "git fetch origin {} failed: {}",
            branch,
            result.output.trim()
        )));
    }

    Ok(())
}

/// Read the fetched remote head commit hash for a branch
pub async fn remote_head(
    runner: &dyn CommandRunner,
    dir: &Path,
    branch: &str,
) -> Result<String, AgentError> {
    let remote_ref = format!("origin/{}", branch);
    let result = runner
        .run("git", &["rev-parse", &remote_ref], Some(dir))
        .await
        .map_err(|e| AgentError::FetchError(format!("Failed to run git rev-parse: {}", e)))?;

    if !result.success() {
        return Err(AgentError::FetchError(format!(
            "git rev-parse {} failed: {}",
            remote_ref,
            result.output.trim()
        )));
    }

    Ok(result.output.trim().to_string())
}
