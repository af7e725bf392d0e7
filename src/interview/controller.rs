use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use tauri::{AppHandle, Emitter, State};
use tokio::sync::{watch, Notify};
use tokio::time::{sleep, Instant};

use crate::api::{InterviewBackend, TurnAdvance};
use crate::session::{ConversationItem, Question};
use crate::speech::{SpeechInput, SpeechOutput};
use crate::AppState;

use super::silence::{DetectorInputs, SilenceDetector};
use super::timer::{ClockState, SessionClock};

pub const WELCOME_MESSAGE: &str = "Welcome to your AI interview. I will ask you a series of \
    questions. Please speak clearly and take your time with each answer. Let's begin with the \
    first question.";

pub const COMPLETION_FALLBACK: &str =
    "Thank you for completing the interview. You will receive your feedback shortly.";

/// Gap between consecutive utterances (welcome to question, transition to
/// question, answer to follow-up).
pub const BETWEEN_UTTERANCE_PAUSE: Duration = Duration::from_secs(1);

/// Grace period between a question finishing playback and recognition
/// starting, so the tail of the utterance is not transcribed as the answer.
pub const SPEECH_TO_LISTEN_DELAY: Duration = Duration::from_millis(500);

/// Dwell on the completion screen before navigating to feedback.
pub const COMPLETION_NAVIGATE_DELAY: Duration = Duration::from_secs(4);

pub const SUBMIT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Consecutive submit failures tolerated before the interview is abandoned.
pub const MAX_SUBMIT_FAILURES: u32 = 3;

/// Lifecycle of one interview run. Exactly one phase is active at a time;
/// transitions flow forward only, except the Submitting to
/// ListeningForAnswer loop across turns.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InterviewPhase {
    AwaitingPermissions,
    Starting,
    QuestionSpeaking,
    ListeningForAnswer,
    Submitting,
    Completed,
    Failed,
}

#[derive(Serialize, Clone, Debug)]
pub struct InterviewProgress {
    pub question_index: u32,
    pub total_questions: u32,
    pub current_question: Question,
}

#[derive(Serialize, Clone, Debug)]
pub struct InterviewSnapshot {
    pub phase: InterviewPhase,
    pub progress: Option<InterviewProgress>,
    pub conversation: Vec<ConversationItem>,
}

/// Sink for UI-bound events, abstracted so tests can record instead of emit.
pub trait UiEvents: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

pub struct TauriUi {
    app: AppHandle,
}

impl TauriUi {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl UiEvents for TauriUi {
    fn emit(&self, event: &str, payload: Value) {
        if let Err(e) = self.app.emit(event, payload) {
            warn!("UI event '{}' emit failed: {}", event, e);
        }
    }
}

enum AnswerOutcome {
    Submit,
    Shutdown,
}

/// Drives a voice interview from start to feedback: plays questions, watches
/// the transcript for the silence cue, submits answers, and walks the server's
/// turn outcomes until completion.
pub struct InterviewController {
    interview_id: String,
    backend: Arc<dyn InterviewBackend>,
    speech_out: Arc<dyn SpeechOutput>,
    speech_in: Arc<dyn SpeechInput>,
    ui: Arc<dyn UiEvents>,
    phase_tx: watch::Sender<InterviewPhase>,
    clock: Mutex<SessionClock>,
    conversation: Mutex<Vec<ConversationItem>>,
    progress: Mutex<Option<InterviewProgress>>,
    /// Set when a submission has been claimed for the current turn; blocks
    /// the detector and the manual path from firing a second one.
    submission_pending: AtomicBool,
    stopped_tx: watch::Sender<bool>,
    manual_submit: Notify,
}

impl InterviewController {
    pub fn new(
        interview_id: String,
        backend: Arc<dyn InterviewBackend>,
        speech_out: Arc<dyn SpeechOutput>,
        speech_in: Arc<dyn SpeechInput>,
        ui: Arc<dyn UiEvents>,
    ) -> Arc<Self> {
        let (phase_tx, _) = watch::channel(InterviewPhase::AwaitingPermissions);
        let (stopped_tx, _) = watch::channel(false);
        Arc::new(Self {
            interview_id,
            backend,
            speech_out,
            speech_in,
            ui,
            phase_tx,
            clock: Mutex::new(SessionClock::new()),
            conversation: Mutex::new(Vec::new()),
            progress: Mutex::new(None),
            submission_pending: AtomicBool::new(false),
            stopped_tx,
            manual_submit: Notify::new(),
        })
    }

    pub fn phase(&self) -> InterviewPhase {
        *self.phase_tx.borrow()
    }

    pub fn phase_updates(&self) -> watch::Receiver<InterviewPhase> {
        self.phase_tx.subscribe()
    }

    pub fn snapshot(&self) -> InterviewSnapshot {
        InterviewSnapshot {
            phase: self.phase(),
            progress: self.progress.lock().clone(),
            conversation: self.conversation.lock().clone(),
        }
    }

    pub fn clock_state(&self) -> ClockState {
        self.clock.lock().snapshot(Instant::now())
    }

    pub fn conversation_cache(&self) -> Vec<ConversationItem> {
        self.conversation.lock().clone()
    }

    /// Submit-now button. Ignored while a submission is already in flight or
    /// the transcript is still empty.
    pub fn request_manual_submit(&self) {
        self.manual_submit.notify_one();
    }

    pub async fn run(self: Arc<Self>) {
        if let Err(e) = self.clone().drive().await {
            error!("❌ Interview {} failed: {:#}", self.interview_id, e);
            self.set_phase(InterviewPhase::Failed);
            self.ui
                .emit("interview-error", json!({ "message": e.to_string() }));
        }
    }

    /// Stop the loop and release the devices. Fires the completion marker in
    /// the background unless the interview already completed normally.
    pub async fn shutdown(&self) {
        if self.stopped_tx.send_replace(true) {
            return;
        }
        info!("🧹 Shutting down interview {}", self.interview_id);
        self.speech_in.stop_listening().await;
        self.speech_out.cancel().await;

        if self.phase() != InterviewPhase::Completed {
            let backend = Arc::clone(&self.backend);
            let interview_id = self.interview_id.clone();
            tokio::spawn(async move {
                if let Err(e) = backend.complete_voice(&interview_id).await {
                    warn!("complete-voice on shutdown failed: {}", e);
                }
            });
        }
    }

    fn is_stopped(&self) -> bool {
        *self.stopped_tx.borrow()
    }

    fn set_phase(&self, phase: InterviewPhase) {
        let _ = self.phase_tx.send(phase);
        self.ui.emit("interview-phase", json!({ "phase": phase }));
    }

    fn emit_progress(&self) {
        if let Some(progress) = self.progress.lock().clone() {
            self.ui.emit("interview-progress", json!(progress));
        }
    }

    /// Server conversation logs replace the cache wholesale; an empty list
    /// means the server sent none and the cache is kept.
    fn cache_conversation(&self, items: Vec<ConversationItem>) {
        if items.is_empty() {
            return;
        }
        *self.conversation.lock() = items.clone();
        self.ui
            .emit("conversation-update", json!({ "conversation": items }));
    }

    /// Open a fresh answer window: stamp the response clock, clear the
    /// submission claim, and wipe the previous turn's transcript.
    fn begin_answer_window(&self) {
        self.clock.lock().mark_response_start(Instant::now());
        self.submission_pending.store(false, Ordering::SeqCst);
        self.speech_in.reset_transcript();
    }

    fn try_begin_submission(&self) -> bool {
        if self.speech_in.transcript().trim().is_empty() {
            return false;
        }
        !self.submission_pending.swap(true, Ordering::SeqCst)
    }

    fn observe_silence(&self, detector: &mut SilenceDetector) {
        let transcript = self.speech_in.transcript();
        detector.observe(
            DetectorInputs {
                listening: self.speech_in.is_listening(),
                transcript: &transcript,
                submission_pending: self.submission_pending.load(Ordering::SeqCst),
            },
            Instant::now(),
        );
    }

    async fn drive(self: Arc<Self>) -> Result<()> {
        self.set_phase(InterviewPhase::Starting);
        let start = self
            .backend
            .start_voice(&self.interview_id)
            .await
            .context("starting voice interview")?;
        info!(
            "🎬 Interview {} started at question {}/{}",
            self.interview_id,
            start.question_index + 1,
            start.total_questions
        );

        *self.progress.lock() = Some(InterviewProgress {
            question_index: start.question_index,
            total_questions: start.total_questions,
            current_question: start.current_question.clone(),
        });
        self.emit_progress();
        self.clock.lock().start(Instant::now());

        self.set_phase(InterviewPhase::QuestionSpeaking);
        self.speech_out.speak(WELCOME_MESSAGE).await?;
        sleep(BETWEEN_UTTERANCE_PAUSE).await;
        self.speech_out
            .speak(&start.current_question.question_text)
            .await?;
        self.begin_answer_window();

        let mut consecutive_failures = 0u32;
        let mut resume_after_error = false;

        loop {
            if self.is_stopped() {
                return Ok(());
            }

            self.set_phase(InterviewPhase::ListeningForAnswer);
            if resume_after_error {
                // Failed submit: keep the transcript, restart recognition
                // after a beat, and let the silence window fire again.
                resume_after_error = false;
                sleep(SUBMIT_RETRY_DELAY).await;
            } else {
                sleep(SPEECH_TO_LISTEN_DELAY).await;
            }
            if self.is_stopped() {
                return Ok(());
            }
            self.speech_in.start_listening().await?;

            match self.await_submission().await {
                AnswerOutcome::Shutdown => return Ok(()),
                AnswerOutcome::Submit => {}
            }

            self.set_phase(InterviewPhase::Submitting);
            self.speech_in.stop_listening().await;
            let answer = self.speech_in.transcript();
            let response_time = self.clock.lock().response_seconds(Instant::now());
            info!(
                "📤 Submitting answer ({} words, {}s)",
                answer.split_whitespace().count(),
                response_time
            );

            let payload = match self
                .backend
                .submit_voice_response(&self.interview_id, &answer, response_time)
                .await
            {
                Ok(payload) => payload,
                Err(e) => {
                    consecutive_failures += 1;
                    warn!(
                        "Submit attempt {}/{} failed: {}",
                        consecutive_failures, MAX_SUBMIT_FAILURES, e
                    );
                    if consecutive_failures >= MAX_SUBMIT_FAILURES {
                        return Err(e).context("giving up after repeated submit failures");
                    }
                    self.submission_pending.store(false, Ordering::SeqCst);
                    resume_after_error = true;
                    continue;
                }
            };
            consecutive_failures = 0;
            self.cache_conversation(payload.conversation.clone());

            match payload.advance()? {
                TurnAdvance::FollowUp { question } => {
                    info!("🔁 Follow-up question");
                    self.set_phase(InterviewPhase::QuestionSpeaking);
                    sleep(BETWEEN_UTTERANCE_PAUSE).await;
                    self.speech_out.speak(&question).await?;
                    self.begin_answer_window();
                }
                TurnAdvance::NextQuestion {
                    question,
                    question_index,
                    transition_message,
                } => {
                    info!("➡️ Advancing to question index {}", question_index);
                    {
                        let mut progress = self.progress.lock();
                        if let Some(p) = progress.as_mut() {
                            p.question_index = question_index;
                            p.current_question = question.clone();
                        }
                    }
                    self.emit_progress();
                    self.set_phase(InterviewPhase::QuestionSpeaking);
                    sleep(BETWEEN_UTTERANCE_PAUSE).await;
                    if let Some(transition) = transition_message {
                        self.speech_out.speak(&transition).await?;
                        sleep(BETWEEN_UTTERANCE_PAUSE).await;
                    }
                    self.speech_out.speak(&question.question_text).await?;
                    self.begin_answer_window();
                }
                TurnAdvance::Completed { completion_message } => {
                    info!("🏁 Interview {} completed", self.interview_id);
                    self.set_phase(InterviewPhase::Completed);
                    sleep(BETWEEN_UTTERANCE_PAUSE).await;
                    let message =
                        completion_message.unwrap_or_else(|| COMPLETION_FALLBACK.to_string());
                    self.speech_out.speak(&message).await?;
                    sleep(COMPLETION_NAVIGATE_DELAY).await;
                    self.ui.emit(
                        "navigate",
                        json!({
                            "route": "/feedback",
                            "state": { "interview_id": self.interview_id },
                        }),
                    );
                    return Ok(());
                }
            }
        }
    }

    /// Wait for one of: the silence deadline, the submit-now button, or
    /// shutdown. Transcript updates restart the silence window.
    async fn await_submission(&self) -> AnswerOutcome {
        let mut stop_rx = self.stopped_tx.subscribe();
        if *stop_rx.borrow_and_update() {
            return AnswerOutcome::Shutdown;
        }

        let mut updates = self.speech_in.updates();
        let mut bridge_alive = true;
        let mut detector = SilenceDetector::new();
        self.observe_silence(&mut detector);

        loop {
            let deadline = detector.deadline();
            let silence_elapsed = async {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = stop_rx.changed() => return AnswerOutcome::Shutdown,
                _ = self.manual_submit.notified() => {
                    if self.try_begin_submission() {
                        info!("⏩ Manual submit");
                        return AnswerOutcome::Submit;
                    }
                }
                changed = updates.changed(), if bridge_alive => {
                    if changed.is_ok() {
                        self.observe_silence(&mut detector);
                    } else {
                        // Recognition bridge is gone; only manual submit or
                        // shutdown can end the turn now.
                        bridge_alive = false;
                        detector.disarm();
                    }
                }
                _ = silence_elapsed => {
                    if self.try_begin_submission() {
                        info!("⏱️ Silence window elapsed, submitting");
                        return AnswerOutcome::Submit;
                    }
                    detector.disarm();
                }
            }
        }
    }
}

// Tauri commands for the interview screen

#[tauri::command]
pub async fn begin_interview(
    interview_id: String,
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<(), String> {
    crate::permissions::ensure_ready_to_start(&state.permissions)?;

    let speech_out =
        crate::speech::synthesis::speech_output().ok_or("speech output not initialized")?;
    let speech_in =
        crate::speech::recognition::speech_input().ok_or("speech input not initialized")?;

    let previous = state.controller.lock().take();
    if let Some(previous) = previous {
        previous.shutdown().await;
    }

    let controller = InterviewController::new(
        interview_id,
        state.api.clone(),
        speech_out,
        speech_in,
        Arc::new(TauriUi::new(app)),
    );
    *state.controller.lock() = Some(controller.clone());
    tauri::async_runtime::spawn(controller.run());
    Ok(())
}

#[tauri::command]
pub fn submit_response_now(state: State<'_, AppState>) -> Result<(), String> {
    let controller = state.controller.lock().clone().ok_or("no active interview")?;
    controller.request_manual_submit();
    Ok(())
}

#[tauri::command]
pub async fn leave_interview(state: State<'_, AppState>) -> Result<(), String> {
    let controller = state.controller.lock().take();
    if let Some(controller) = controller {
        controller.shutdown().await;
    }
    Ok(())
}

#[tauri::command]
pub fn get_interview_snapshot(state: State<'_, AppState>) -> Result<InterviewSnapshot, String> {
    let controller = state.controller.lock().clone().ok_or("no active interview")?;
    Ok(controller.snapshot())
}

#[tauri::command]
pub fn get_clock_state(state: State<'_, AppState>) -> Result<ClockState, String> {
    let controller = state.controller.lock().clone().ok_or("no active interview")?;
    Ok(controller.clock_state())
}

#[tauri::command]
pub fn get_conversation_cache(
    state: State<'_, AppState>,
) -> Result<Vec<ConversationItem>, String> {
    let controller = state.controller.lock().clone().ok_or("no active interview")?;
    Ok(controller.conversation_cache())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, VoiceInterviewStart, VoiceTurnPayload};
    use crate::session::{ConversationItemType, DifficultyLevel, InterviewSession, QuestionType};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::task::yield_now;
    use tokio::time::advance;

    fn question(id: &str, text: &str) -> Question {
        Question {
            id: id.to_string(),
            question_text: text.to_string(),
            question_type: QuestionType::Technical,
            difficulty: DifficultyLevel::Mid,
            expected_answer_points: vec![],
            follow_up_questions: vec![],
        }
    }

    fn start_payload() -> VoiceInterviewStart {
        VoiceInterviewStart {
            current_question: question("q1", "Tell me about a project you led."),
            question_index: 0,
            total_questions: 2,
        }
    }

    fn completed_payload(message: Option<&str>) -> VoiceTurnPayload {
        VoiceTurnPayload {
            interview_completed: true,
            completion_message: message.map(|m| m.to_string()),
            ..VoiceTurnPayload::default()
        }
    }

    fn follow_up_payload(text: &str) -> VoiceTurnPayload {
        VoiceTurnPayload {
            has_follow_up: true,
            follow_up_question: Some(text.to_string()),
            ..VoiceTurnPayload::default()
        }
    }

    fn transport_error() -> ApiError {
        ApiError::Status {
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        }
    }

    struct MockSpeechOutput {
        utterances: Mutex<Vec<String>>,
    }

    impl MockSpeechOutput {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                utterances: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SpeechOutput for MockSpeechOutput {
        async fn speak(&self, text: &str) -> Result<()> {
            self.utterances.lock().push(text.to_string());
            Ok(())
        }

        async fn cancel(&self) {}

        fn is_speaking(&self) -> bool {
            false
        }
    }

    struct MockSpeechInput {
        buffer: Mutex<String>,
        listening: AtomicBool,
        revision_tx: watch::Sender<u64>,
    }

    impl MockSpeechInput {
        fn new() -> Arc<Self> {
            let (revision_tx, _) = watch::channel(0);
            Arc::new(Self {
                buffer: Mutex::new(String::new()),
                listening: AtomicBool::new(false),
                revision_tx,
            })
        }

        fn push(&self, text: &str) {
            *self.buffer.lock() = text.to_string();
            let next = *self.revision_tx.borrow() + 1;
            let _ = self.revision_tx.send(next);
        }
    }

    #[async_trait]
    impl SpeechInput for MockSpeechInput {
        async fn start_listening(&self) -> Result<()> {
            self.listening.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn stop_listening(&self) {
            self.listening.store(false, Ordering::SeqCst);
        }

        fn reset_transcript(&self) {
            self.buffer.lock().clear();
            let next = *self.revision_tx.borrow() + 1;
            let _ = self.revision_tx.send(next);
        }

        fn transcript(&self) -> String {
            self.buffer.lock().clone()
        }

        fn is_listening(&self) -> bool {
            self.listening.load(Ordering::SeqCst)
        }

        fn updates(&self) -> watch::Receiver<u64> {
            self.revision_tx.subscribe()
        }
    }

    struct ScriptedBackend {
        start: VoiceInterviewStart,
        turns: Mutex<VecDeque<Result<VoiceTurnPayload, ApiError>>>,
        submits: Mutex<Vec<(String, u64)>>,
    }

    impl ScriptedBackend {
        fn new(
            start: VoiceInterviewStart,
            turns: Vec<Result<VoiceTurnPayload, ApiError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                start,
                turns: Mutex::new(turns.into()),
                submits: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl InterviewBackend for ScriptedBackend {
        async fn start_voice(&self, _interview_id: &str) -> Result<VoiceInterviewStart, ApiError> {
            Ok(self.start.clone())
        }

        async fn submit_voice_response(
            &self,
            _interview_id: &str,
            response: &str,
            response_time: u64,
        ) -> Result<VoiceTurnPayload, ApiError> {
            self.submits
                .lock()
                .push((response.to_string(), response_time));
            self.turns
                .lock()
                .pop_front()
                .unwrap_or(Err(ApiError::UnexpectedTurnPayload))
        }

        async fn get_conversation(
            &self,
            _interview_id: &str,
        ) -> Result<Vec<ConversationItem>, ApiError> {
            Ok(vec![])
        }

        async fn get_interview(&self, _interview_id: &str) -> Result<InterviewSession, ApiError> {
            unimplemented!("not used by the controller")
        }

        async fn complete_voice(&self, _interview_id: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    struct RecordingUi {
        events: Mutex<Vec<(String, Value)>>,
    }

    impl RecordingUi {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
            })
        }

        fn names(&self) -> Vec<String> {
            self.events.lock().iter().map(|(n, _)| n.clone()).collect()
        }

        fn payload_of(&self, event: &str) -> Option<Value> {
            self.events
                .lock()
                .iter()
                .find(|(n, _)| n == event)
                .map(|(_, p)| p.clone())
        }
    }

    impl UiEvents for RecordingUi {
        fn emit(&self, event: &str, payload: Value) {
            self.events.lock().push((event.to_string(), payload));
        }
    }

    struct Harness {
        controller: Arc<InterviewController>,
        backend: Arc<ScriptedBackend>,
        output: Arc<MockSpeechOutput>,
        input: Arc<MockSpeechInput>,
        ui: Arc<RecordingUi>,
    }

    fn harness(turns: Vec<Result<VoiceTurnPayload, ApiError>>) -> Harness {
        let backend = ScriptedBackend::new(start_payload(), turns);
        let output = MockSpeechOutput::new();
        let input = MockSpeechInput::new();
        let ui = RecordingUi::new();
        let controller = InterviewController::new(
            "int-1".to_string(),
            backend.clone() as Arc<dyn InterviewBackend>,
            output.clone() as Arc<dyn SpeechOutput>,
            input.clone() as Arc<dyn SpeechInput>,
            ui.clone() as Arc<dyn UiEvents>,
        );
        Harness {
            controller,
            backend,
            output,
            input,
            ui,
        }
    }

    /// Drive the paused clock through startup: welcome utterance, the 1s
    /// pause, the question utterance, and the 500ms pre-listen delay.
    async fn run_until_listening(h: &Harness) -> tokio::task::JoinHandle<()> {
        let handle = tokio::spawn(h.controller.clone().run());
        yield_now().await;
        advance(BETWEEN_UTTERANCE_PAUSE).await;
        yield_now().await;
        advance(SPEECH_TO_LISTEN_DELAY).await;
        yield_now().await;
        assert!(h.input.is_listening());
        handle
    }

    #[tokio::test(start_paused = true)]
    async fn silence_window_submits_with_measured_response_time() {
        let h = harness(vec![Ok(completed_payload(None))]);
        let handle = run_until_listening(&h).await;

        // Virtual t = 1.5s; the answer window opened at t = 1s.
        h.input.push("I led the migration of our billing system");
        yield_now().await;
        advance(Duration::from_secs(4)).await;
        yield_now().await;

        let submits = h.backend.submits.lock().clone();
        assert_eq!(submits.len(), 1);
        assert_eq!(submits[0].0, "I led the migration of our billing system");
        // 0.5s pre-listen delay plus the 4s silence window, floored.
        assert_eq!(submits[0].1, 4);

        advance(BETWEEN_UTTERANCE_PAUSE).await;
        yield_now().await;
        advance(COMPLETION_NAVIGATE_DELAY).await;
        yield_now().await;
        handle.await.unwrap();
        assert_eq!(h.controller.phase(), InterviewPhase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn transcript_updates_restart_the_silence_window() {
        let h = harness(vec![Ok(completed_payload(None))]);
        let _handle = run_until_listening(&h).await;

        h.input.push("I led the migration");
        yield_now().await;
        advance(Duration::from_secs(3)).await;
        yield_now().await;
        h.input.push("I led the migration of our billing system");
        yield_now().await;

        // Only 3s since the last update: nothing submitted yet.
        advance(Duration::from_secs(3)).await;
        yield_now().await;
        assert!(h.backend.submits.lock().is_empty());

        advance(Duration::from_secs(1)).await;
        yield_now().await;
        assert_eq!(h.backend.submits.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn short_transcript_never_arms_the_detector() {
        let h = harness(vec![Ok(completed_payload(None))]);
        let _handle = run_until_listening(&h).await;

        h.input.push("two words");
        yield_now().await;
        advance(Duration::from_secs(30)).await;
        yield_now().await;
        assert!(h.backend.submits.lock().is_empty());
        assert_eq!(h.controller.phase(), InterviewPhase::ListeningForAnswer);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_and_silence_race_yields_exactly_one_submission() {
        let h = harness(vec![Ok(completed_payload(None))]);
        let _handle = run_until_listening(&h).await;

        h.input.push("a complete answer already");
        yield_now().await;
        h.controller.request_manual_submit();
        h.controller.request_manual_submit();
        yield_now().await;
        advance(Duration::from_secs(4)).await;
        yield_now().await;

        assert_eq!(h.backend.submits.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_with_empty_transcript_is_ignored() {
        let h = harness(vec![Ok(completed_payload(None))]);
        let _handle = run_until_listening(&h).await;

        h.controller.request_manual_submit();
        yield_now().await;
        assert!(h.backend.submits.lock().is_empty());
        assert_eq!(h.controller.phase(), InterviewPhase::ListeningForAnswer);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_without_message_speaks_fallback_and_navigates() {
        let h = harness(vec![Ok(completed_payload(None))]);
        let handle = run_until_listening(&h).await;

        h.input.push("my final answer here");
        yield_now().await;
        advance(Duration::from_secs(4)).await;
        yield_now().await;
        advance(BETWEEN_UTTERANCE_PAUSE).await;
        yield_now().await;

        let utterances = h.output.utterances.lock().clone();
        assert_eq!(utterances.last().unwrap(), COMPLETION_FALLBACK);
        assert!(!h.ui.names().iter().any(|n| n == "navigate"));

        advance(COMPLETION_NAVIGATE_DELAY).await;
        yield_now().await;
        handle.await.unwrap();

        let navigate = h.ui.payload_of("navigate").unwrap();
        assert_eq!(navigate["route"], "/feedback");
        assert_eq!(navigate["state"]["interview_id"], "int-1");
    }

    #[tokio::test(start_paused = true)]
    async fn follow_up_reopens_the_answer_window() {
        let h = harness(vec![
            Ok(follow_up_payload("What was the hardest part?")),
            Ok(completed_payload(Some("Well done, we are finished."))),
        ]);
        let _handle = run_until_listening(&h).await;

        h.input.push("I led the billing migration");
        yield_now().await;
        advance(Duration::from_secs(4)).await;
        yield_now().await;

        // Follow-up path: 1s pause, speak, then the 500ms pre-listen delay.
        advance(BETWEEN_UTTERANCE_PAUSE).await;
        yield_now().await;
        advance(SPEECH_TO_LISTEN_DELAY).await;
        yield_now().await;

        let utterances = h.output.utterances.lock().clone();
        assert_eq!(utterances.last().unwrap(), "What was the hardest part?");
        assert_eq!(h.controller.phase(), InterviewPhase::ListeningForAnswer);
        assert_eq!(h.input.transcript(), "");

        h.input.push("keeping both systems in sync");
        yield_now().await;
        advance(Duration::from_secs(4)).await;
        yield_now().await;

        let submits = h.backend.submits.lock().clone();
        assert_eq!(submits.len(), 2);
        assert_eq!(submits[1].0, "keeping both systems in sync");
    }

    #[tokio::test(start_paused = true)]
    async fn next_question_updates_progress_and_speaks_transition() {
        let next = VoiceTurnPayload {
            next_question: Some(question("q2", "Describe a production incident.")),
            question_index: Some(1),
            transition_message: Some("Great, let's move on.".to_string()),
            ..VoiceTurnPayload::default()
        };
        let h = harness(vec![Ok(next), Ok(completed_payload(None))]);
        let _handle = run_until_listening(&h).await;

        h.input.push("we sharded the database");
        yield_now().await;
        advance(Duration::from_secs(4)).await;
        yield_now().await;
        advance(BETWEEN_UTTERANCE_PAUSE).await;
        yield_now().await;
        advance(BETWEEN_UTTERANCE_PAUSE).await;
        yield_now().await;

        let utterances = h.output.utterances.lock().clone();
        assert_eq!(
            &utterances[utterances.len() - 2..],
            &[
                "Great, let's move on.".to_string(),
                "Describe a production incident.".to_string()
            ]
        );

        let snapshot = h.controller.snapshot();
        let progress = snapshot.progress.unwrap();
        assert_eq!(progress.question_index, 1);
        assert_eq!(progress.current_question.id, "q2");
    }

    /// Run one failed-submit recovery cycle: the 1s restart delay, then the
    /// silence window firing again over the retained transcript.
    async fn advance_through_retry() {
        advance(SUBMIT_RETRY_DELAY).await;
        yield_now().await;
        advance(Duration::from_secs(4)).await;
        yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_submit_restarts_listening_and_resubmits() {
        let h = harness(vec![
            Err(transport_error()),
            Ok(follow_up_payload("Could you give more detail?")),
        ]);
        let _handle = run_until_listening(&h).await;

        h.input.push("an answer worth submitting");
        yield_now().await;
        advance(Duration::from_secs(4)).await;
        yield_now().await;

        // Back in the listening phase with the transcript intact.
        assert_eq!(h.controller.phase(), InterviewPhase::ListeningForAnswer);
        assert_eq!(h.input.transcript(), "an answer worth submitting");

        advance_through_retry().await;

        let submits = h.backend.submits.lock().clone();
        assert_eq!(submits.len(), 2);
        assert_eq!(submits[0].0, submits[1].0);
        assert_ne!(h.controller.phase(), InterviewPhase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn three_submit_failures_abandon_the_interview() {
        let h = harness(vec![
            Err(transport_error()),
            Err(transport_error()),
            Err(transport_error()),
        ]);
        let handle = run_until_listening(&h).await;

        h.input.push("an answer worth submitting");
        yield_now().await;
        advance(Duration::from_secs(4)).await;
        yield_now().await;
        advance_through_retry().await;
        advance_through_retry().await;
        handle.await.unwrap();

        assert_eq!(h.backend.submits.lock().len(), 3);
        assert_eq!(h.controller.phase(), InterviewPhase::Failed);
        assert!(h.ui.names().iter().any(|n| n == "interview-error"));
    }

    #[tokio::test(start_paused = true)]
    async fn server_conversation_replaces_the_cache() {
        let mut payload = completed_payload(None);
        payload.conversation = vec![
            ConversationItem {
                item_type: ConversationItemType::AiQuestion,
                text: "Tell me about a project you led.".to_string(),
                timestamp: 1.0,
                question_id: Some("q1".to_string()),
            },
            ConversationItem {
                item_type: ConversationItemType::UserResponse,
                text: "I led the billing migration.".to_string(),
                timestamp: 2.0,
                question_id: Some("q1".to_string()),
            },
        ];
        let h = harness(vec![Ok(payload)]);
        let _handle = run_until_listening(&h).await;

        h.input.push("I led the billing migration");
        yield_now().await;
        advance(Duration::from_secs(4)).await;
        yield_now().await;

        let cached = h.controller.conversation_cache();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].item_type, ConversationItemType::AiQuestion);
        assert_eq!(cached[1].item_type, ConversationItemType::UserResponse);
        assert!(h.ui.names().iter().any(|n| n == "conversation-update"));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_listening_and_ends_the_loop() {
        let h = harness(vec![]);
        let handle = run_until_listening(&h).await;

        h.controller.shutdown().await;
        yield_now().await;
        handle.await.unwrap();

        assert!(!h.input.is_listening());
        assert!(h.backend.submits.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn welcome_then_question_are_spoken_in_order() {
        let h = harness(vec![]);
        let _handle = run_until_listening(&h).await;

        let utterances = h.output.utterances.lock().clone();
        assert_eq!(
            utterances,
            vec![
                WELCOME_MESSAGE.to_string(),
                "Tell me about a project you led.".to_string()
            ]
        );
        let progress = h.ui.payload_of("interview-progress").unwrap();
        assert_eq!(progress["total_questions"], 2);
    }
}
