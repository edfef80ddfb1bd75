//! Classification of listing failures
//!
//! The `svn` client reports failures on stderr as `svn: E<code>: <message>`.
//! The codes are the integration contract, so classification is a plain
//! substring search done once per failed call.

use std::fmt;

/// No such revision
pub const E_INVALID_REVISION: &str = "E160006";
/// Some targets don't exist
pub const E_PATH_NOT_FOUND: &str = "E200009";
/// Illegal repository URL
pub const E_INVALID_URL: &str = "E170000";
/// Unable to connect to a repository at URL
pub const E_UNABLE_TO_CONNECT: &str = "E170013";
/// Unknown host name
pub const E_UNKNOWN_HOST: &str = "E731001";
/// Connection failure
pub const E_CONNECTION_FAILURE: &str = "E175002";
/// Host unreachable
pub const E_HOST_UNREACHABLE: &str = "E730065";
/// Connection timed out
pub const E_CONNECTION_TIMEOUT: &str = "E175012";
/// The server unexpectedly closed the connection
pub const E_SERVER_CLOSED: &str = "E120108";

/// Kind of a failed listing call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    InvalidRevision,
    PathNotFound,
    InvalidUrl,
    /// Unknown host together with a failed connection setup.
    /// Fatal on the first call of a crawl, transient afterwards.
    HostLookupFailed,
    HostUnreachable,
    ConnectionFailure,
    ConnectionTimeout,
    ServerClosedConnection,
    Unknown,
}

impl FailureKind {
    /// Whether a call failing this way is worth repeating
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            FailureKind::HostLookupFailed
                | FailureKind::HostUnreachable
                | FailureKind::ConnectionFailure
                | FailureKind::ConnectionTimeout
                | FailureKind::ServerClosedConnection
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::InvalidRevision => "invalid revision",
            FailureKind::PathNotFound => "path not found",
            FailureKind::InvalidUrl => "invalid url",
            FailureKind::HostLookupFailed => "unknown host",
            FailureKind::HostUnreachable => "host unreachable",
            FailureKind::ConnectionFailure => "connection failure",
            FailureKind::ConnectionTimeout => "connection timed out",
            FailureKind::ServerClosedConnection => "server closed the connection",
            FailureKind::Unknown => "unknown error",
        };
        f.write_str(label)
    }
}

/// Classify the error stream of a failed listing call.
///
/// Fatal codes take precedence over transient ones when several are present.
pub fn classify(stderr: &str) -> FailureKind {
    let has = |code: &str| stderr.contains(code);

    if has(E_INVALID_REVISION) {
        FailureKind::InvalidRevision
    } else if has(E_PATH_NOT_FOUND) {
        FailureKind::PathNotFound
    } else if has(E_INVALID_URL) {
        FailureKind::InvalidUrl
    } else if has(E_UNKNOWN_HOST) && has(E_UNABLE_TO_CONNECT) {
        FailureKind::HostLookupFailed
    } else if has(E_UNKNOWN_HOST) || has(E_HOST_UNREACHABLE) {
        FailureKind::HostUnreachable
    } else if has(E_CONNECTION_TIMEOUT) {
        FailureKind::ConnectionTimeout
    } else if has(E_SERVER_CLOSED) {
        FailureKind::ServerClosedConnection
    } else if has(E_CONNECTION_FAILURE) || has(E_UNABLE_TO_CONNECT) {
        FailureKind::ConnectionFailure
    } else {
        FailureKind::Unknown
    }
}
