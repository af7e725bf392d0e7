#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

pub mod api;
pub mod camera;
pub mod config;
pub mod feedback;
pub mod interview;
pub mod permissions;
pub mod routes;
pub mod session;
pub mod speech;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use parking_lot::Mutex;
use tauri::Manager;

use api::ApiClient;
use camera::CameraPreview;
use interview::InterviewController;
use permissions::PermissionGate;

/// Shared application state managed by Tauri. The speech services live in
/// their own module-level slots because they need an `AppHandle` and are
/// created during setup.
pub struct AppState {
    pub api: Arc<ApiClient>,
    pub permissions: PermissionGate,
    pub camera: CameraPreview,
    pub controller: Mutex<Option<Arc<InterviewController>>>,
}

impl AppState {
    pub fn new() -> Result<Self> {
        let base_url = config::api_base_url();
        info!("🌐 Interview API at {}", base_url);
        let api = ApiClient::new(base_url).context("building API client")?;
        Ok(Self {
            api: Arc::new(api),
            permissions: PermissionGate::new(),
            camera: CameraPreview::new(),
            controller: Mutex::new(None),
        })
    }
}

pub fn run() -> Result<()> {
    let state = AppState::new()?;

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .manage(state)
        .invoke_handler(tauri::generate_handler![
            // upload screen
            api::upload_resume_file,
            api::fetch_resume,
            // setup screen
            session::setup::get_setup_options,
            session::setup::default_interview_config,
            session::setup::toggle_question_type,
            session::setup::adjust_question_count,
            session::setup::generate_interview,
            // permission flow
            permissions::request_permissions,
            permissions::report_permission_probe,
            permissions::report_speech_support,
            permissions::get_permission_summary,
            // speech bridges
            speech::synthesis::notify_speech_finished,
            speech::synthesis::notify_speech_error,
            speech::synthesis::select_voice,
            speech::recognition::push_transcript,
            speech::recognition::get_transcript,
            // interview screen
            interview::controller::begin_interview,
            interview::controller::submit_response_now,
            interview::controller::leave_interview,
            interview::controller::get_interview_snapshot,
            interview::controller::get_clock_state,
            interview::controller::get_conversation_cache,
            // camera preview
            camera::start_camera_preview,
            camera::camera_stream_ready,
            camera::camera_stream_error,
            camera::stop_camera_preview,
            camera::get_camera_status,
            // navigation
            routes::resolve_navigation,
            // feedback screen
            feedback::load_feedback,
        ])
        .setup(|app| {
            info!("🚀 VocaPrep starting up");
            speech::synthesis::init_speech_output(app.handle().clone());
            speech::recognition::init_speech_input(app.handle().clone());
            Ok(())
        })
        .on_window_event(|window, event| {
            if matches!(
                event,
                tauri::WindowEvent::CloseRequested { .. } | tauri::WindowEvent::Destroyed
            ) {
                let state = window.state::<AppState>();
                let controller = state.controller.lock().take();
                if let Some(controller) = controller {
                    tauri::async_runtime::spawn(async move {
                        controller.shutdown().await;
                    });
                }
            }
        })
        .run(tauri::generate_context!())
        .context("running tauri application")?;

    Ok(())
}
