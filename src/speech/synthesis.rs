use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{info, warn};
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tauri::{AppHandle, Emitter};
use tokio::sync::oneshot;
use uuid::Uuid;

use super::SpeechOutput;

/// Utterance tuning shared with the webview bridge.
pub const SPEECH_RATE: f64 = 0.85;
pub const SPEECH_PITCH: f64 = 1.1;
pub const SPEECH_VOLUME: f64 = 1.0;

/// Ordered voice preference list; falls through to a feminine-name pattern
/// match, then any English voice, then the platform default.
const PREFERRED_VOICES: [&str; 9] = [
    "Google US English Female",
    "Microsoft Zira Desktop - English (United States)",
    "Samantha",
    "Victoria",
    "Karen",
    "Moira",
    "Tessa",
    "Ava",
    "Allison",
];

lazy_static! {
    static ref FEMININE_NAME: Regex =
        Regex::new(r"(?i)female|woman|zira|cortana|siri").expect("static voice pattern");
    static ref SPEECH_OUTPUT: Mutex<Option<Arc<WebviewSpeechOutput>>> = Mutex::new(None);
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VoiceInfo {
    pub name: String,
    pub lang: String,
    #[serde(default)]
    pub default: bool,
}

/// Best-effort voice selection over the voices the platform reports.
/// Returns `None` when the list is empty; never an error.
pub fn select_preferred_voice(voices: &[VoiceInfo]) -> Option<&VoiceInfo> {
    for name in PREFERRED_VOICES {
        if let Some(voice) = voices.iter().find(|v| v.name == name) {
            info!("Selected voice (exact match): {}", voice.name);
            return Some(voice);
        }
    }

    if let Some(voice) = voices
        .iter()
        .find(|v| FEMININE_NAME.is_match(&v.name) && v.lang.contains("en"))
    {
        info!("Selected voice (pattern match): {}", voice.name);
        return Some(voice);
    }

    voices
        .iter()
        .find(|v| v.lang.contains("en-US"))
        .or_else(|| voices.iter().find(|v| v.lang.contains("en")))
        .or_else(|| voices.first())
}

struct PendingUtterance {
    id: Uuid,
    done: oneshot::Sender<()>,
}

/// `SpeechOutput` implementation bridged to the webview's speechSynthesis.
/// `speak` emits a `speech-speak` event and resolves when the frontend
/// acknowledges playback end (or error) through `notify_speech_finished`.
pub struct WebviewSpeechOutput {
    app: AppHandle,
    pending: Mutex<Option<PendingUtterance>>,
    speaking: AtomicBool,
}

impl WebviewSpeechOutput {
    pub fn new(app: AppHandle) -> Self {
        Self {
            app,
            pending: Mutex::new(None),
            speaking: AtomicBool::new(false),
        }
    }

    /// Drop the pending utterance, resolving its speak future. Returns true
    /// if something was actually cancelled.
    fn drop_pending(&self) -> bool {
        // Dropping the sender resolves the awaiting receiver with an error,
        // which speak() treats as finished.
        self.pending.lock().take().is_some()
    }

    fn finish(&self, utterance_id: Uuid) {
        let mut pending = self.pending.lock();
        match pending.take() {
            Some(p) if p.id == utterance_id => {
                let _ = p.done.send(());
            }
            Some(other) => {
                // Stale ack from an already-cancelled utterance; keep the
                // live one in place.
                *pending = Some(other);
            }
            None => {}
        }
    }
}

#[async_trait]
impl SpeechOutput for WebviewSpeechOutput {
    async fn speak(&self, text: &str) -> Result<()> {
        self.drop_pending();

        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        *self.pending.lock() = Some(PendingUtterance { id, done: tx });
        self.speaking.store(true, Ordering::SeqCst);

        let emitted = self.app.emit(
            "speech-speak",
            json!({
                "utterance_id": id,
                "text": text,
                "rate": SPEECH_RATE,
                "pitch": SPEECH_PITCH,
                "volume": SPEECH_VOLUME,
            }),
        );
        if let Err(e) = emitted {
            // No webview to play it; behave as if the utterance finished.
            warn!("speech-speak emit failed: {}", e);
            self.drop_pending();
            self.speaking.store(false, Ordering::SeqCst);
            return Ok(());
        }

        // A cancelled utterance drops the sender; both outcomes mean the
        // device is no longer speaking.
        let _ = rx.await;
        self.speaking.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn cancel(&self) {
        if self.drop_pending() {
            let _ = self.app.emit("speech-cancel", json!({}));
        }
        self.speaking.store(false, Ordering::SeqCst);
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}

pub fn init_speech_output(app: AppHandle) {
    let mut slot = SPEECH_OUTPUT.lock();
    *slot = Some(Arc::new(WebviewSpeechOutput::new(app)));
    info!("Speech output service initialized");
}

pub fn speech_output() -> Option<Arc<WebviewSpeechOutput>> {
    SPEECH_OUTPUT.lock().clone()
}

// Tauri commands for the webview speech bridge

#[tauri::command]
pub fn notify_speech_finished(utterance_id: Uuid) -> Result<(), String> {
    let service = speech_output().ok_or("speech output not initialized")?;
    service.finish(utterance_id);
    Ok(())
}

/// Synthesis runtime errors are swallowed: the utterance is treated as
/// finished so the interview loop never hangs on a broken voice.
#[tauri::command]
pub fn notify_speech_error(utterance_id: Uuid, message: String) -> Result<(), String> {
    warn!("Speech synthesis error (treated as finished): {}", message);
    let service = speech_output().ok_or("speech output not initialized")?;
    service.finish(utterance_id);
    Ok(())
}

/// Pick a voice from the list reported by the webview.
#[tauri::command]
pub fn select_voice(voices: Vec<VoiceInfo>) -> Option<String> {
    select_preferred_voice(&voices).map(|v| v.name.clone())
}
