use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{info, warn};
use parking_lot::Mutex;
use serde_json::json;
use tauri::{AppHandle, Emitter};
use tokio::sync::watch;

use super::SpeechInput;

pub const RECOGNITION_LANGUAGE: &str = "en-US";

lazy_static! {
    static ref SPEECH_INPUT: Mutex<Option<Arc<WebviewSpeechInput>>> = Mutex::new(None);
}

/// Accumulates cumulative recognition updates for one answer turn.
///
/// The recognition engine reports the whole transcript so far on every
/// update; within a turn the text only grows. Shorter payloads (engine
/// restarts mid-turn) are ignored rather than allowed to erase words the
/// candidate already said.
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    text: String,
    revision: u64,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a cumulative update. Returns true when the stored text changed.
    pub fn apply_update(&mut self, update: &str) -> bool {
        let cleaned = Self::clean_text(update);
        if cleaned == self.text || cleaned.len() < self.text.len() {
            return false;
        }
        self.text = cleaned;
        self.revision += 1;
        true
    }

    pub fn clear(&mut self) {
        if !self.text.is_empty() {
            self.revision += 1;
        }
        self.text.clear();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    fn clean_text(text: &str) -> String {
        text.trim()
            .split_whitespace()
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

/// `SpeechInput` implementation bridged to the webview's SpeechRecognition.
/// Start/stop are emitted as events; the frontend streams cumulative
/// transcripts back through the `push_transcript` command.
pub struct WebviewSpeechInput {
    app: AppHandle,
    buffer: Mutex<TranscriptBuffer>,
    listening: AtomicBool,
    revision_tx: watch::Sender<u64>,
}

impl WebviewSpeechInput {
    pub fn new(app: AppHandle) -> Self {
        let (revision_tx, _) = watch::channel(0);
        Self {
            app,
            buffer: Mutex::new(TranscriptBuffer::new()),
            listening: AtomicBool::new(false),
            revision_tx,
        }
    }

    pub fn push(&self, update: &str) {
        let revision = {
            let mut buffer = self.buffer.lock();
            if !buffer.apply_update(update) {
                return;
            }
            buffer.revision()
        };
        let _ = self.revision_tx.send(revision);
    }
}

#[async_trait]
impl SpeechInput for WebviewSpeechInput {
    async fn start_listening(&self) -> Result<()> {
        if self.listening.swap(true, Ordering::SeqCst) {
            // Already running a continuous session.
            return Ok(());
        }
        info!("🎤 Starting speech recognition");
        if let Err(e) = self.app.emit(
            "recognition-start",
            json!({ "continuous": true, "language": RECOGNITION_LANGUAGE }),
        ) {
            self.listening.store(false, Ordering::SeqCst);
            warn!("recognition-start emit failed: {}", e);
        }
        Ok(())
    }

    async fn stop_listening(&self) {
        if !self.listening.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("🛑 Stopping speech recognition");
        let _ = self.app.emit("recognition-stop", json!({}));
    }

    fn reset_transcript(&self) {
        let revision = {
            let mut buffer = self.buffer.lock();
            buffer.clear();
            buffer.revision()
        };
        let _ = self.revision_tx.send(revision);
    }

    fn transcript(&self) -> String {
        self.buffer.lock().text().to_string()
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    fn updates(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }
}

pub fn init_speech_input(app: AppHandle) {
    let mut slot = SPEECH_INPUT.lock();
    *slot = Some(Arc::new(WebviewSpeechInput::new(app)));
    info!("Speech input service initialized");
}

pub fn speech_input() -> Option<Arc<WebviewSpeechInput>> {
    SPEECH_INPUT.lock().clone()
}

// Tauri commands for the webview recognition bridge

#[tauri::command]
pub fn push_transcript(transcript: String) -> Result<(), String> {
    let service = speech_input().ok_or("speech input not initialized")?;
    service.push(&transcript);
    Ok(())
}

#[tauri::command]
pub fn get_transcript() -> Result<String, String> {
    let service = speech_input().ok_or("speech input not initialized")?;
    Ok(service.transcript())
}
