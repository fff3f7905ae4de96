use thiserror::Error;

/// Errors returned by session control actions.
///
/// None of these are fatal: the session stays usable after any of them.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("microphone permission has not been resolved yet")]
    PermissionUnresolved,

    #[error("can't {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("another action is still in progress")]
    Busy,

    #[error("{engine} engine failed: {source:#}")]
    Engine {
        engine: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ClipError {
    pub fn engine(engine: &'static str, source: anyhow::Error) -> Self {
        Self::Engine { engine, source }
    }

    /// Whether this error should be shown to the user rather than only logged
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::Engine { .. })
    }
}

pub type ClipResult<T> = std::result::Result<T, ClipError>;
