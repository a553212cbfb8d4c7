//! Sync error types.

/// Errors that can occur talking to the sync backend.
///
/// These never reach UI-facing callers; the coordinator logs them and
/// leaves the pending queue intact for the next attempt.
#[derive(Debug)]
pub enum SyncError {
    /// Sync is not configured
    NotConfigured,
    /// Request failed (connection, timeout, DNS)
    Http(String),
    /// Server answered with a non-success status
    Status(u16),
    /// Server answered `success: false`
    Rejected(String),
    /// Response body could not be decoded
    Decode(String),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::NotConfigured => {
                write!(f, "Sync not configured. Add server_url to config.")
            }
            SyncError::Http(e) => write!(f, "Request error: {}", e),
            SyncError::Status(code) => write!(f, "Server returned status {}", code),
            SyncError::Rejected(reason) => {
                if reason.is_empty() {
                    write!(f, "Server rejected the request")
                } else {
                    write!(f, "Server rejected the request: {}", reason)
                }
            }
            SyncError::Decode(e) => write!(f, "Failed to decode response: {}", e),
        }
    }
}

impl std::error::Error for SyncError {}
