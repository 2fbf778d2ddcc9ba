//! Webhook push-event verification

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::AgentError;

type HmacSha256 = Hmac<Sha256>;

/// Verify an inbound webhook signature.
///
/// The header carries `sha256=<hex-hmac>` computed over the exact raw
/// request body. Comparison is constant-time via the Mac verifier.
pub fn verify_signature(
    secret: &str,
    signature_header: &str,
    body: &[u8],
) -> Result<(), AgentError> {
    let hex_digest = signature_header
        .strip_prefix("sha256=")
        .ok_or_else(|| AgentError::AuthError("Malformed signature header".to_string()))?;

    let expected = hex::decode(hex_digest)
        .map_err(|_| AgentError::AuthError("Malformed signature digest".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AgentError::AuthError("Invalid webhook secret".to_string()))?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| AgentError::AuthError("Invalid signature".to_string()))
}

/// Whether a push-event ref targets the project's deployed branch
pub fn ref_matches_branch(git_ref: &str, branch: &str) -> bool {
    git_ref == format!("refs/heads/{}", branch)
}
