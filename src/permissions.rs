use log::info;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tauri::{AppHandle, Emitter, State};

use crate::AppState;

pub const PERMISSION_ERROR_MESSAGE: &str = "Camera and microphone access are required for the AI \
    interview. Please enable them in your browser settings and try again.";

pub const SPEECH_UNSUPPORTED_MESSAGE: &str =
    "Your browser doesn't support speech recognition. Please use Chrome, Edge, or Safari.";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Microphone,
    Camera,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProbeOutcome {
    #[default]
    Unknown,
    Granted,
    Denied,
}

#[derive(Serialize, Clone, Debug)]
pub struct PermissionSummary {
    pub microphone: ProbeOutcome,
    pub camera: ProbeOutcome,
    pub speech_supported: Option<bool>,
    pub ready: bool,
    pub error_message: Option<String>,
}

/// Tracks what the webview reported back from its getUserMedia probes and
/// its SpeechRecognition capability check. Probes only establish permission;
/// the streams themselves are released immediately on the frontend.
#[derive(Default)]
pub struct PermissionGate {
    microphone: Mutex<ProbeOutcome>,
    camera: Mutex<ProbeOutcome>,
    speech_supported: Mutex<Option<bool>>,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_probe(&self, kind: MediaKind, outcome: ProbeOutcome) {
        info!("Permission probe: {:?} -> {:?}", kind, outcome);
        match kind {
            MediaKind::Microphone => *self.microphone.lock() = outcome,
            MediaKind::Camera => *self.camera.lock() = outcome,
        }
    }

    pub fn record_speech_support(&self, supported: bool) {
        *self.speech_supported.lock() = Some(supported);
    }

    pub fn speech_supported(&self) -> Option<bool> {
        *self.speech_supported.lock()
    }

    pub fn all_granted(&self) -> bool {
        *self.microphone.lock() == ProbeOutcome::Granted
            && *self.camera.lock() == ProbeOutcome::Granted
    }

    pub fn summary(&self) -> PermissionSummary {
        let microphone = *self.microphone.lock();
        let camera = *self.camera.lock();
        let speech_supported = self.speech_supported();
        let ready = self.all_granted() && speech_supported != Some(false);

        let error_message = if speech_supported == Some(false) {
            Some(SPEECH_UNSUPPORTED_MESSAGE.to_string())
        } else if microphone == ProbeOutcome::Denied || camera == ProbeOutcome::Denied {
            Some(PERMISSION_ERROR_MESSAGE.to_string())
        } else {
            None
        };

        PermissionSummary {
            microphone,
            camera,
            speech_supported,
            ready,
            error_message,
        }
    }
}

/// Gate check run before an interview may start. Unsupported speech wins
/// over missing grants since no amount of granting fixes it.
pub fn ensure_ready_to_start(gate: &PermissionGate) -> Result<(), String> {
    if gate.speech_supported() == Some(false) {
        return Err(SPEECH_UNSUPPORTED_MESSAGE.to_string());
    }
    if !gate.all_granted() {
        return Err(PERMISSION_ERROR_MESSAGE.to_string());
    }
    Ok(())
}

// Tauri commands for the permission flow

/// Ask the webview to probe microphone then camera. Results come back
/// asynchronously through `report_permission_probe`.
#[tauri::command]
pub fn request_permissions(app: AppHandle) -> Result<(), String> {
    info!("🎥 Requesting media permission probes");
    app.emit("permissions-request", json!({ "kinds": ["microphone", "camera"] }))
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn report_permission_probe(
    kind: MediaKind,
    outcome: ProbeOutcome,
    state: State<'_, AppState>,
) -> Result<PermissionSummary, String> {
    state.permissions.record_probe(kind, outcome);
    Ok(state.permissions.summary())
}

#[tauri::command]
pub fn report_speech_support(
    supported: bool,
    state: State<'_, AppState>,
) -> Result<(), String> {
    state.permissions.record_speech_support(supported);
    Ok(())
}

#[tauri::command]
pub fn get_permission_summary(state: State<'_, AppState>) -> Result<PermissionSummary, String> {
    Ok(state.permissions.summary())
}
