use std::time::Duration;

use tokio::time::Instant;

/// Continuous quiet time after the last qualifying transcript update before
/// the answer auto-submits.
pub const SILENCE_WINDOW: Duration = Duration::from_secs(4);

/// Minimum words in the transcript before the detector may arm.
pub const MIN_TRANSCRIPT_WORDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Idle,
    Armed { deadline: Instant },
}

#[derive(Debug, Clone, Copy)]
pub struct DetectorInputs<'a> {
    pub listening: bool,
    pub transcript: &'a str,
    pub submission_pending: bool,
}

/// Debounce state machine deciding when the candidate has finished speaking.
///
/// Armed whenever {listening, transcript has at least MIN_TRANSCRIPT_WORDS
/// words, no submission in flight or completed}; every qualifying transcript
/// update restarts the window with a fresh deadline. Any disqualifying input
/// change drops back to idle. The caller fires the submit action when the
/// armed deadline elapses, then disarms.
#[derive(Debug)]
pub struct SilenceDetector {
    window: Duration,
    min_words: usize,
    state: DetectorState,
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SilenceDetector {
    pub fn new() -> Self {
        Self::with_window(SILENCE_WINDOW, MIN_TRANSCRIPT_WORDS)
    }

    pub fn with_window(window: Duration, min_words: usize) -> Self {
        Self {
            window,
            min_words,
            state: DetectorState::Idle,
        }
    }

    /// Re-evaluate on an input change. A qualifying update always restarts
    /// the window rather than keeping a stale deadline.
    pub fn observe(&mut self, inputs: DetectorInputs<'_>, now: Instant) -> DetectorState {
        let words = inputs.transcript.split_whitespace().count();
        let qualifies = inputs.listening && !inputs.submission_pending && words >= self.min_words;

        self.state = if qualifies {
            DetectorState::Armed {
                deadline: now + self.window,
            }
        } else {
            DetectorState::Idle
        };
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DetectorState::Armed { deadline } => Some(deadline),
            DetectorState::Idle => None,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, DetectorState::Armed { .. })
    }

    pub fn disarm(&mut self) {
        self.state = DetectorState::Idle;
    }
}
