//! Post-deploy service restart

use crate::deploy::runner::CommandRunner;
use crate::errors::AgentError;
use crate::models::project::ServiceKind;

/// Restart a managed service after a successful deployment.
///
/// Best-effort: the caller logs failures as warnings, a restart failure
/// never fails the deployment itself.
pub async fn restart_service(
    runner: &dyn CommandRunner,
    kind: ServiceKind,
    name: &str,
) -> Result<(), AgentError> {
    let result = match kind {
        ServiceKind::Systemd => {
            runner
                .run("sudo", &["systemctl", "restart", name], None)
                .await
        }
        ServiceKind::Pm2 => runner.run("pm2", &["restart", name], None).await,
    }
    .map_err(|e| AgentError::ServiceError(format!("Failed to run restart command: {}", e)))?;

    if !result.success() {
        return Err(AgentError::ServiceError(format!(
            "Restart of {} exited with code {}: {}",
            name,
            result.code,
            result.output.trim()
        )));
    }

    Ok(())
}
