pub mod setup;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const MIN_QUESTIONS: u32 = 3;
pub const MAX_QUESTIONS: u32 = 10;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Entry,
    Mid,
    Senior,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Technical,
    Behavioral,
    Experience,
    Situational,
}

/// Interview parameters chosen on the setup screen. Created once, passed to
/// question generation, immutable afterwards.
#[derive(Serialize, Deserialize, Clone, Debug, Validate)]
pub struct InterviewConfig {
    pub difficulty: DifficultyLevel,
    pub duration_minutes: u32,
    #[validate(custom = "validate_question_types")]
    pub question_types: Vec<QuestionType>,
    #[validate(range(min = 3, max = 10))]
    pub num_questions: u32,
}

fn validate_question_types(types: &Vec<QuestionType>) -> Result<(), ValidationError> {
    if types.is_empty() {
        return Err(ValidationError::new("question_types_empty"));
    }
    Ok(())
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            difficulty: DifficultyLevel::Mid,
            duration_minutes: 20,
            question_types: vec![QuestionType::Technical, QuestionType::Behavioral],
            num_questions: 5,
        }
    }
}

impl InterviewConfig {
    /// Toggle a question type on or off. Removing the last remaining type is
    /// a no-op so the set can never become empty.
    pub fn toggle_question_type(&mut self, question_type: QuestionType) {
        if let Some(pos) = self.question_types.iter().position(|t| *t == question_type) {
            if self.question_types.len() > 1 {
                self.question_types.remove(pos);
            }
        } else {
            self.question_types.push(question_type);
        }
    }

    /// Adjust the question count by a signed step, clamped to [3, 10].
    pub fn adjust_num_questions(&mut self, delta: i32) {
        let next = self.num_questions as i64 + delta as i64;
        self.num_questions = next.clamp(MIN_QUESTIONS as i64, MAX_QUESTIONS as i64) as u32;
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Resume {
    #[serde(alias = "_id")]
    pub id: String,
    pub filename: String,
    pub content: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    pub created_at: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Question {
    pub id: String,
    pub question_text: String,
    pub question_type: QuestionType,
    pub difficulty: DifficultyLevel,
    #[serde(default)]
    pub expected_answer_points: Vec<String>,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationItemType {
    AiQuestion,
    AiFollowUp,
    AiCompletion,
    AiRepeat,
    AiClarification,
    AiResponse,
    AiTransition,
    UserResponse,
}

impl ConversationItemType {
    pub fn is_ai(&self) -> bool {
        !matches!(self, ConversationItemType::UserResponse)
    }
}

/// One entry of the append-only interview transcript. The server is the
/// source of truth; the client caches the log verbatim for rendering.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConversationItem {
    #[serde(rename = "type")]
    pub item_type: ConversationItemType,
    pub text: String,
    /// Unix timestamp in seconds.
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ResponseAnalysis {
    pub completeness_score: f64,
    pub accuracy_score: f64,
    pub clarity_score: f64,
    #[serde(default)]
    pub missing_points: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub follow_up_needed: bool,
    #[serde(default)]
    pub suggested_follow_up: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct InterviewResponse {
    pub question_id: String,
    pub question_text: String,
    pub user_response: String,
    /// Seconds between the question finishing playback and submission.
    pub response_time: u64,
    pub timestamp: String,
    #[serde(default)]
    pub analysis: Option<ResponseAnalysis>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct InterviewSession {
    #[serde(alias = "_id")]
    pub id: String,
    pub resume_id: String,
    pub difficulty: DifficultyLevel,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub responses: Vec<InterviewResponse>,
    pub status: String,
    pub created_at: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}
