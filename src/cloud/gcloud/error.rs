// ABOUTME: Maps gcloud and kubectl failures onto CloudError.
// ABOUTME: Classification is by the status text the CLIs print on stderr.

use crate::cloud::CloudError;

/// Classify a failed invocation from its stderr.
pub(super) fn classify(stderr: &str) -> CloudError {
    let message = stderr.trim().to_string();
    let lower = message.to_ascii_lowercase();

    if lower.contains("not_found")
        || lower.contains("notfound")
        || lower.contains("not found")
        || lower.contains("code=404")
    {
        CloudError::NotFound(message)
    } else if lower.contains("already_exists")
        || lower.contains("alreadyexists")
        || lower.contains("already exists")
        || lower.contains("code=409")
    {
        CloudError::AlreadyExists(message)
    } else if lower.contains("permission_denied")
        || lower.contains("permission(s)")
        || lower.contains("code=400")
        || lower.contains("code=401")
        || lower.contains("code=403")
        || lower.contains("invalid_argument")
        || lower.contains("unauthenticated")
        || lower.contains("forbidden")
        || lower.contains("failed_precondition")
    {
        CloudError::Permanent(message)
    } else {
        CloudError::Transient(message)
    }
}
