use log::{info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use tauri::{AppHandle, Emitter, State};

use crate::AppState;

/// Lifecycle of the self-view video element. The stream itself lives in the
/// webview; this mirrors its state so the rest of the app can react to it.
#[derive(Serialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase", tag = "status", content = "detail")]
pub enum CameraStatus {
    #[default]
    Idle,
    Starting,
    Live,
    Error(String),
}

#[derive(Default)]
pub struct CameraPreview {
    status: Mutex<CameraStatus>,
}

impl CameraPreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> CameraStatus {
        self.status.lock().clone()
    }

    pub fn set_status(&self, status: CameraStatus) {
        *self.status.lock() = status;
    }
}

// Tauri commands for the camera preview bridge

/// Ask the webview to attach a camera stream to the preview element.
#[tauri::command]
pub fn start_camera_preview(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    state.camera.set_status(CameraStatus::Starting);
    app.emit("camera-start", json!({})).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn camera_stream_ready(state: State<'_, AppState>) -> Result<(), String> {
    info!("📷 Camera preview live");
    state.camera.set_status(CameraStatus::Live);
    Ok(())
}

/// The preview is decorative; a broken camera never blocks the interview.
#[tauri::command]
pub fn camera_stream_error(message: String, state: State<'_, AppState>) -> Result<(), String> {
    warn!("Camera preview error: {}", message);
    state.camera.set_status(CameraStatus::Error(message));
    Ok(())
}

#[tauri::command]
pub fn stop_camera_preview(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    state.camera.set_status(CameraStatus::Idle);
    app.emit("camera-stop", json!({})).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_camera_status(state: State<'_, AppState>) -> Result<CameraStatus, String> {
    Ok(state.camera.status())
}
