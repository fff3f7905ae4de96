//! Microphone permission gate
//!
//! Platforms that require explicit consent are asked once per mount with a
//! rationale; the others are treated as granted without asking.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Permission identifier for audio capture
pub const RECORD_AUDIO: &str = "android.permission.RECORD_AUDIO";

/// Text shown alongside the consent prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rationale {
    pub title: String,
    pub message: String,
}

impl Rationale {
    pub fn for_app(app_name: &str) -> Self {
        Self {
            title: "Microphone Permission".to_string(),
            message: format!(
                "{} needs access to your microphone so you can record audio.",
                app_name
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
    NeverAskAgain,
}

/// What a provider answered
///
/// Older hosts answer with a plain flag, newer ones with a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionResponse {
    Flag(bool),
    Status(PermissionStatus),
}

impl PermissionResponse {
    pub fn is_granted(self) -> bool {
        matches!(
            self,
            Self::Flag(true) | Self::Status(PermissionStatus::Granted)
        )
    }
}

/// Resolution of the microphone permission for a mounted session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MicrophonePermission {
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl From<bool> for MicrophonePermission {
    fn from(granted: bool) -> Self {
        if granted {
            Self::Granted
        } else {
            Self::Denied
        }
    }
}

/// Host permission dialog
#[async_trait::async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Whether this platform asks the user at all
    fn requires_consent(&self) -> bool;

    async fn request(&self, permission: &str, rationale: &Rationale) -> Result<PermissionResponse>;
}

/// Platforms that grant microphone access without a prompt
pub struct ImplicitConsent;

#[async_trait::async_trait]
impl PermissionProvider for ImplicitConsent {
    fn requires_consent(&self) -> bool {
        false
    }

    async fn request(&self, _permission: &str, _rationale: &Rationale) -> Result<PermissionResponse> {
        Ok(PermissionResponse::Flag(true))
    }
}

/// Provider that always gives the same answer (CLI flag, tests)
pub struct FixedPermission {
    response: PermissionResponse,
}

impl FixedPermission {
    pub fn new(response: PermissionResponse) -> Self {
        Self { response }
    }

    pub fn granted() -> Self {
        Self::new(PermissionResponse::Status(PermissionStatus::Granted))
    }

    pub fn denied() -> Self {
        Self::new(PermissionResponse::Status(PermissionStatus::Denied))
    }
}

#[async_trait::async_trait]
impl PermissionProvider for FixedPermission {
    fn requires_consent(&self) -> bool {
        true
    }

    async fn request(&self, permission: &str, rationale: &Rationale) -> Result<PermissionResponse> {
        info!("Requesting {} ({})", permission, rationale.title);
        Ok(self.response)
    }
}

pub struct PermissionGate {
    provider: Arc<dyn PermissionProvider>,
    rationale: Rationale,
}

impl PermissionGate {
    pub fn new(provider: Arc<dyn PermissionProvider>, rationale: Rationale) -> Self {
        Self {
            provider,
            rationale,
        }
    }

    /// Ask for microphone access, resolving to whether it was granted
    pub async fn request_microphone(&self) -> Result<bool> {
        if !self.provider.requires_consent() {
            return Ok(true);
        }

        let response = self.provider.request(RECORD_AUDIO, &self.rationale).await?;
        info!("Permission result: {:?}", response);

        let granted = response.is_granted();
        if !granted {
            warn!("Microphone permission not granted");
        }
        Ok(granted)
    }
}
