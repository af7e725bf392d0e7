use log::{error, info};
use serde::Serialize;
use tauri::State;
use validator::Validate;

use super::{DifficultyLevel, InterviewConfig, Question, QuestionType};
use crate::AppState;

#[derive(Serialize, Clone, Debug)]
pub struct ChoiceOption<T: Serialize> {
    pub value: T,
    pub label: &'static str,
    pub description: &'static str,
}

#[derive(Serialize, Clone, Debug)]
pub struct DurationOption {
    pub value: u32,
    pub label: &'static str,
}

#[derive(Serialize, Clone, Debug)]
pub struct SetupOptions {
    pub difficulties: Vec<ChoiceOption<DifficultyLevel>>,
    pub question_types: Vec<ChoiceOption<QuestionType>>,
    pub durations: Vec<DurationOption>,
}

pub fn setup_options() -> SetupOptions {
    SetupOptions {
        difficulties: vec![
            ChoiceOption {
                value: DifficultyLevel::Entry,
                label: "Entry Level",
                description: "Basic concepts and fundamentals",
            },
            ChoiceOption {
                value: DifficultyLevel::Mid,
                label: "Mid Level",
                description: "Practical application and problem solving",
            },
            ChoiceOption {
                value: DifficultyLevel::Senior,
                label: "Senior Level",
                description: "Architecture and leadership decisions",
            },
        ],
        question_types: vec![
            ChoiceOption {
                value: QuestionType::Technical,
                label: "Technical",
                description: "Skills and technical knowledge",
            },
            ChoiceOption {
                value: QuestionType::Behavioral,
                label: "Behavioral",
                description: "Soft skills and past experiences",
            },
            ChoiceOption {
                value: QuestionType::Experience,
                label: "Experience",
                description: "Work history and projects",
            },
            ChoiceOption {
                value: QuestionType::Situational,
                label: "Situational",
                description: "Hypothetical scenarios and judgment",
            },
        ],
        durations: vec![
            DurationOption { value: 15, label: "15 minutes" },
            DurationOption { value: 20, label: "20 minutes" },
            DurationOption { value: 30, label: "30 minutes" },
            DurationOption { value: 45, label: "45 minutes" },
        ],
    }
}

/// Navigation payload handed to the interview view once questions exist.
#[derive(Serialize, Clone, Debug)]
pub struct GeneratedInterview {
    pub interview_id: String,
    pub questions: Vec<Question>,
    pub config: InterviewConfig,
}

// Tauri commands for the setup screen

#[tauri::command]
pub fn get_setup_options() -> SetupOptions {
    setup_options()
}

#[tauri::command]
pub fn default_interview_config() -> InterviewConfig {
    InterviewConfig::default()
}

#[tauri::command]
pub fn toggle_question_type(
    mut config: InterviewConfig,
    question_type: QuestionType,
) -> InterviewConfig {
    config.toggle_question_type(question_type);
    config
}

#[tauri::command]
pub fn adjust_question_count(mut config: InterviewConfig, delta: i32) -> InterviewConfig {
    config.adjust_num_questions(delta);
    config
}

/// Validate the chosen configuration and ask the backend to generate the
/// question set for the uploaded resume.
#[tauri::command]
pub async fn generate_interview(
    resume_id: String,
    config: InterviewConfig,
    state: State<'_, AppState>,
) -> Result<GeneratedInterview, String> {
    config.validate().map_err(|e| {
        error!("Rejected interview config: {}", e);
        format!("Invalid interview configuration: {}", e)
    })?;

    info!(
        "🎯 Generating {} questions ({:?}) for resume {}",
        config.num_questions, config.difficulty, resume_id
    );

    let generated = state
        .api
        .generate_questions(&resume_id, &config)
        .await
        .map_err(|e| e.to_string())?;

    info!(
        "✅ Interview {} created with {} questions",
        generated.interview_id,
        generated.questions.len()
    );

    Ok(GeneratedInterview {
        interview_id: generated.interview_id,
        questions: generated.questions,
        config,
    })
}
