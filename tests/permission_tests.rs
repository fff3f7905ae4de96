// Tests for the microphone permission gate

use anyhow::{bail, Result};
use clip_recorder::permission::RECORD_AUDIO;
use clip_recorder::{
    FixedPermission, ImplicitConsent, PermissionGate, PermissionProvider, PermissionResponse,
    PermissionStatus, Rationale,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Records what it was asked and answers with a fixed response
struct RecordingProvider {
    asked: AtomicUsize,
    response: PermissionResponse,
}

#[async_trait::async_trait]
impl PermissionProvider for RecordingProvider {
    fn requires_consent(&self) -> bool {
        true
    }

    async fn request(&self, permission: &str, rationale: &Rationale) -> Result<PermissionResponse> {
        assert_eq!(permission, RECORD_AUDIO);
        assert_eq!(rationale.title, "Microphone Permission");
        self.asked.fetch_add(1, Ordering::SeqCst);
        Ok(self.response)
    }
}

struct BrokenProvider;

#[async_trait::async_trait]
impl PermissionProvider for BrokenProvider {
    fn requires_consent(&self) -> bool {
        true
    }

    async fn request(&self, _permission: &str, _rationale: &Rationale) -> Result<PermissionResponse> {
        bail!("dialog could not be shown")
    }
}

fn gate(provider: Arc<dyn PermissionProvider>) -> PermissionGate {
    PermissionGate::new(provider, Rationale::for_app("AudioExample"))
}

#[test]
fn test_response_granted_forms() {
    assert!(PermissionResponse::Flag(true).is_granted());
    assert!(PermissionResponse::Status(PermissionStatus::Granted).is_granted());

    assert!(!PermissionResponse::Flag(false).is_granted());
    assert!(!PermissionResponse::Status(PermissionStatus::Denied).is_granted());
    assert!(!PermissionResponse::Status(PermissionStatus::NeverAskAgain).is_granted());
}

#[test]
fn test_rationale_names_the_app() {
    let rationale = Rationale::for_app("AudioExample");
    assert_eq!(
        rationale.message,
        "AudioExample needs access to your microphone so you can record audio."
    );
}

#[tokio::test]
async fn test_implicit_consent_is_granted() -> Result<()> {
    assert!(gate(Arc::new(ImplicitConsent)).request_microphone().await?);
    Ok(())
}

#[tokio::test]
async fn test_consent_platform_asks_once() -> Result<()> {
    for (response, expected) in [
        (PermissionResponse::Flag(true), true),
        (PermissionResponse::Status(PermissionStatus::Granted), true),
        (PermissionResponse::Status(PermissionStatus::Denied), false),
    ] {
        let provider = Arc::new(RecordingProvider {
            asked: AtomicUsize::new(0),
            response,
        });

        let granted = gate(provider.clone()).request_microphone().await?;

        assert_eq!(granted, expected, "{:?}", response);
        assert_eq!(provider.asked.load(Ordering::SeqCst), 1);
    }
    Ok(())
}

#[tokio::test]
async fn test_fixed_permission_answers() -> Result<()> {
    assert!(gate(Arc::new(FixedPermission::granted())).request_microphone().await?);
    assert!(!gate(Arc::new(FixedPermission::denied())).request_microphone().await?);
    Ok(())
}

#[tokio::test]
async fn test_provider_error_propagates() {
    assert!(gate(Arc::new(BrokenProvider)).request_microphone().await.is_err());
}
