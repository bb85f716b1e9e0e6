// ABOUTME: Error types for payload loading, invocation, and verification.
// ABOUTME: Separates "could not run" from "ran but produced the wrong result".

use std::path::PathBuf;

#[derive(Debug, Clone, thiserror::Error)]
pub enum InvokeError {
    /// The verification payload file is empty or whitespace only.
    #[error("payload file is empty: {}", .0.display())]
    EmptyPayloadFile(PathBuf),

    /// The verification payload file could not be read.
    #[error("failed to read payload file {}: {message}", .path.display())]
    PayloadUnreadable { path: PathBuf, message: String },

    /// Transport or service error while invoking (timeouts, throttling, cold start).
    #[error("failed to invoke {function_name}: {message}")]
    InvokeLambdaFailed {
        function_name: String,
        message: String,
    },

    /// The function ran but its response did not meet the expectation.
    #[error("verification of {function_name} failed: {reason}")]
    VerificationFailed {
        function_name: String,
        reason: String,
    },
}

impl InvokeError {
    /// Whether a caller-level retry may help. Only transport failures qualify;
    /// a failed verification means the new code is behaviourally wrong.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InvokeError::InvokeLambdaFailed { .. })
    }
}
