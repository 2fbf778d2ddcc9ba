//! Change detection for polling-triggered deployments

use crate::models::project::TriggerKind;

/// Decide whether a deployment is a no-op.
///
/// Only polling triggers are skippable: a manual or webhook trigger is an
/// explicit request to deploy and always runs the script. Hashes come from
/// command output, so they are compared after trimming whitespace.
pub fn is_noop(trigger: TriggerKind, before: &str, after: &str) -> bool {
    trigger == TriggerKind::Polling && before.trim() == after.trim()
}
