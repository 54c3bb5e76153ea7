use crate::error::SyncError;

/// Lifecycle of a device session
///
/// `Uninitialized → CopyingIn → Loading → Ready → Finalizing → Closed`,
/// with `Failed` reachable from `CopyingIn`, `Loading` and `Finalizing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Created, `start` not yet called
    Uninitialized,
    /// Database is being copied off the device
    CopyingIn,
    /// Local copy is being parsed
    Loading,
    /// Database loaded; tracks visible, mutations allowed
    Ready,
    /// Database is being written back to the device
    Finalizing,
    Closed,
    /// Terminal failure, carrying the error reported to the user
    Failed(SyncError),
}

impl SessionState {
    /// Background work is still in flight
    pub fn is_pending(&self) -> bool {
        matches!(self, SessionState::CopyingIn | SessionState::Loading)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::CopyingIn => "copying-in",
            SessionState::Loading => "loading",
            SessionState::Ready => "ready",
            SessionState::Finalizing => "finalizing",
            SessionState::Closed => "closed",
            SessionState::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_and_terminal() {
        assert!(SessionState::CopyingIn.is_pending());
        assert!(SessionState::Loading.is_pending());
        assert!(!SessionState::Ready.is_pending());

        assert!(SessionState::Closed.is_terminal());
        assert!(SessionState::Failed(SyncError::LoadFailure("x".into())).is_terminal());
        assert!(!SessionState::Finalizing.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::CopyingIn.to_string(), "copying-in");
        assert_eq!(
            SessionState::Failed(SyncError::TransferFailure("x".into())).to_string(),
            "failed"
        );
    }
}
