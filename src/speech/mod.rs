pub mod recognition;
pub mod synthesis;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;

/// Text-to-speech seam. At most one active utterance: starting a new one
/// cancels the pending one. A synthesis runtime error resolves the speak
/// future as if playback finished, so the interview loop can never wedge on
/// a broken voice.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;
    /// Cancel any pending utterance. No-op when nothing is playing.
    async fn cancel(&self);
    fn is_speaking(&self) -> bool;
}

/// Speech-to-text seam over a continuous recognition session. The transcript
/// grows monotonically within a turn and is cleared with `reset_transcript`
/// when the next turn begins.
#[async_trait]
pub trait SpeechInput: Send + Sync {
    async fn start_listening(&self) -> Result<()>;
    /// Idempotent; stopping an inactive recognizer is a no-op.
    async fn stop_listening(&self);
    fn reset_transcript(&self);
    fn transcript(&self) -> String;
    fn is_listening(&self) -> bool;
    /// Revision channel bumped on every transcript change, used by the
    /// silence detector to restart its window.
    fn updates(&self) -> watch::Receiver<u64>;
}
