//! The façade's error taxonomy.

/// What went wrong with the most recent façade operation.
///
/// Surfaced through [`SimpleClient::last_error`](crate::SimpleClient::last_error)
/// rather than return values, mirroring the errno convention: inspect
/// it immediately after the call. A successful operation clears it.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable store connection: connecting failed, or an operation
    /// that needs the lock ran without one.
    #[error("no usable store connection")]
    NotConnected,

    /// `open()` was called while the client was already locked open.
    #[error("client is already locked open")]
    AlreadyLocked,

    /// The store completed the request but reported failure.
    #[error("store denied the request")]
    AccessDenied,

    /// The store rejected the group create-or-switch request.
    #[error("group switch failed")]
    GroupSwitchFailed,

    /// The store rejected the group removal request.
    #[error("group removal failed")]
    RemoveFailed,

    /// Subscription or reactor registration was refused.
    #[error("notification registration failed")]
    RegistrationFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            ErrorKind::NotConnected.to_string(),
            "no usable store connection"
        );
        assert_eq!(
            ErrorKind::AlreadyLocked.to_string(),
            "client is already locked open"
        );
        assert!(ErrorKind::GroupSwitchFailed.to_string().contains("group"));
    }
}
