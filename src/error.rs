/// Error types for Oracle node operations
///
/// Every failure surfaces as one `Error`; there are no retries anywhere in
/// this crate. Connect failures are classified into friendlier messages for
/// the handful of codes users actually hit.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Source options failed validation before any connection was attempted.
    #[error("invalid source options: {0}")]
    InvalidOptions(String),

    /// The Oracle Instant Client library could not be located or loaded.
    #[error("oracle client library unavailable: {0}")]
    ClientInit(String),

    /// Connection or pool construction failed.
    #[error("{0}")]
    Connect(String),

    /// The process-wide connection cache lock was poisoned by a panic.
    #[error("connection cache lock poisoned")]
    CacheLock,

    /// Any other driver-level failure (SQL execution, row fetch, commit).
    #[error(transparent)]
    Database(#[from] oracle::Error),
}

/// Maps a driver error message from pool construction onto a friendlier one.
///
/// The descriptor contains host/port/database only, never credentials, so it
/// is safe to include in messages.
pub(crate) fn classify_connect_error(text: &str, descriptor: &str, database: &str) -> Error {
    if text.contains("DPI-1047") || text.contains("Cannot locate") {
        return Error::ClientInit(
            "Oracle Instant Client library could not be loaded. \
             Check the installation or the configured client path."
                .to_string(),
        );
    }

    if text.contains("ORA-12170") || text.contains("ORA-12541") || text.contains("timeout") {
        return Error::Connect(format!(
            "could not reach database at {}: network error or database not reachable",
            descriptor
        ));
    }

    if text.contains("ORA-01017") {
        return Error::Connect(format!(
            "authentication failed for {}: invalid username or password",
            descriptor
        ));
    }

    if text.contains("ORA-12514") {
        return Error::Connect(format!(
            "database identifier '{}' is not registered with the listener",
            database
        ));
    }

    Error::Connect(format!("failed to connect to {}: {}", descriptor, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_authentication_error() {
        let err = classify_connect_error("ORA-01017: invalid credential", "(DESCRIPTION=...)", "ORCL");
        assert!(err.to_string().contains("authentication failed"));
    }

    #[test]
    fn test_classify_missing_service() {
        let err = classify_connect_error("ORA-12514: listener does not know", "(DESCRIPTION=...)", "ORCL");
        assert!(err.to_string().contains("ORCL"));
    }

    #[test]
    fn test_classify_missing_client_library() {
        let err = classify_connect_error("DPI-1047: Cannot locate a 64-bit Oracle Client", "(DESCRIPTION=...)", "ORCL");
        assert!(matches!(err, Error::ClientInit(_)));
    }
}
