//! Project status state machine
//!
//! Valid transitions:
//!   inactive|ready|error --Begin--> deploying
//!   deploying --Succeed--> ready
//!   deploying --Fail--> error
//!   deploying --Skip--> status held before the deployment began

use crate::models::project::ProjectStatus;

/// Status transition event
#[derive(Debug, Clone)]
pub enum StatusEvent {
    /// A queued entry was dequeued and execution is starting
    Begin,

    /// The deploy script exited successfully
    Succeed,

    /// Any step of the deployment failed
    Fail,

    /// Polling no-op: no new commit, no script run
    Skip { previous: ProjectStatus },
}

/// Apply an event to a status, rejecting any path not in the table
pub fn transition(status: ProjectStatus, event: &StatusEvent) -> Result<ProjectStatus, String> {
    let next = match (status, event) {
        (ProjectStatus::Inactive, StatusEvent::Begin) => ProjectStatus::Deploying,
        (ProjectStatus::Ready, StatusEvent::Begin) => ProjectStatus::Deploying,
        (ProjectStatus::Error, StatusEvent::Begin) => ProjectStatus::Deploying,

        (ProjectStatus::Deploying, StatusEvent::Succeed) => ProjectStatus::Ready,
        (ProjectStatus::Deploying, StatusEvent::Fail) => ProjectStatus::Error,
        (ProjectStatus::Deploying, StatusEvent::Skip { previous }) => *previous,

        (status, event) => {
            return Err(format!("Invalid transition: {:?} -> {:?}", status, event));
        }
    };

    Ok(next)
}
