use std::path::Path;

use async_trait::async_trait;
use log::{info, warn};
use reqwest::{multipart, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tauri::State;
use thiserror::Error;

use crate::config;
use crate::session::{ConversationItem, InterviewConfig, InterviewSession, Question, Resume};
use crate::AppState;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("voice response carried no follow-up, next question, or completion")]
    UnexpectedTurnPayload,
    #[error("failed to read resume file: {0}")]
    ResumeFile(#[from] std::io::Error),
}

#[derive(Deserialize, Clone, Debug)]
pub struct GeneratedQuestions {
    pub interview_id: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct VoiceInterviewStart {
    pub current_question: Question,
    pub question_index: u32,
    pub total_questions: u32,
}

#[derive(Deserialize, Default, Clone, Debug)]
pub struct ConversationLog {
    #[serde(default)]
    pub conversation: Vec<ConversationItem>,
}

/// Raw payload of `POST /interview/{id}/voice-response`. Exactly one of the
/// three outcome groups is expected to be populated.
#[derive(Deserialize, Default, Clone, Debug)]
pub struct VoiceTurnPayload {
    #[serde(default)]
    pub has_follow_up: bool,
    #[serde(default)]
    pub follow_up_question: Option<String>,
    #[serde(default)]
    pub next_question: Option<Question>,
    #[serde(default)]
    pub question_index: Option<u32>,
    #[serde(default)]
    pub transition_message: Option<String>,
    #[serde(default)]
    pub interview_completed: bool,
    #[serde(default)]
    pub completion_message: Option<String>,
    #[serde(default)]
    pub conversation: Vec<ConversationItem>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TurnAdvance {
    FollowUp {
        question: String,
    },
    NextQuestion {
        question: Question,
        question_index: u32,
        transition_message: Option<String>,
    },
    Completed {
        completion_message: Option<String>,
    },
}

impl VoiceTurnPayload {
    /// Classify the server's turn outcome. Follow-up wins over next question,
    /// which wins over completion, mirroring the server's contract.
    pub fn advance(&self) -> Result<TurnAdvance, ApiError> {
        if self.has_follow_up {
            if let Some(question) = &self.follow_up_question {
                return Ok(TurnAdvance::FollowUp {
                    question: question.clone(),
                });
            }
        }
        if let Some(question) = &self.next_question {
            return Ok(TurnAdvance::NextQuestion {
                question: question.clone(),
                question_index: self.question_index.unwrap_or_default(),
                transition_message: self.transition_message.clone(),
            });
        }
        if self.interview_completed {
            return Ok(TurnAdvance::Completed {
                completion_message: self.completion_message.clone(),
            });
        }
        Err(ApiError::UnexpectedTurnPayload)
    }
}

#[derive(Serialize)]
struct VoiceResponseBody<'a> {
    response: &'a str,
    response_time: u64,
}

/// The voice-session slice of the remote API, abstracted so the turn
/// controller can run against a scripted double in tests.
#[async_trait]
pub trait InterviewBackend: Send + Sync {
    async fn start_voice(&self, interview_id: &str) -> Result<VoiceInterviewStart, ApiError>;
    async fn submit_voice_response(
        &self,
        interview_id: &str,
        response: &str,
        response_time: u64,
    ) -> Result<VoiceTurnPayload, ApiError>;
    async fn get_conversation(&self, interview_id: &str) -> Result<Vec<ConversationItem>, ApiError>;
    async fn get_interview(&self, interview_id: &str) -> Result<InterviewSession, ApiError>;
    async fn complete_voice(&self, interview_id: &str) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config::API_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(response)
    }

    pub async fn upload_resume(&self, file_path: &Path) -> Result<Resume, ApiError> {
        let bytes = tokio::fs::read(file_path).await?;
        let filename = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume.pdf".to_string());

        info!("📄 Uploading resume {} ({} bytes)", filename, bytes.len());

        let part = multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str("application/pdf")?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("/upload-resume"))
            .multipart(form)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn get_resume(&self, resume_id: &str) -> Result<Resume, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/resume/{}", resume_id)))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn generate_questions(
        &self,
        resume_id: &str,
        config: &InterviewConfig,
    ) -> Result<GeneratedQuestions, ApiError> {
        let response = self
            .http
            .post(self.url(&format!("/generate-questions/{}", resume_id)))
            .json(config)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[async_trait]
impl InterviewBackend for ApiClient {
    async fn start_voice(&self, interview_id: &str) -> Result<VoiceInterviewStart, ApiError> {
        info!("🎬 Starting voice interview: {}", interview_id);
        let response = self
            .http
            .post(self.url(&format!("/interview/{}/start-voice", interview_id)))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn submit_voice_response(
        &self,
        interview_id: &str,
        response_text: &str,
        response_time: u64,
    ) -> Result<VoiceTurnPayload, ApiError> {
        let body = VoiceResponseBody {
            response: response_text,
            response_time,
        };
        let response = self
            .http
            .post(self.url(&format!("/interview/{}/voice-response", interview_id)))
            .json(&body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn get_conversation(&self, interview_id: &str) -> Result<Vec<ConversationItem>, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/interview/{}/conversation", interview_id)))
            .send()
            .await?;
        let log: ConversationLog = Self::check(response).await?.json().await?;
        Ok(log.conversation)
    }

    async fn get_interview(&self, interview_id: &str) -> Result<InterviewSession, ApiError> {
        let response = self
            .http
            .get(self.url(&format!("/interview/{}", interview_id)))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Best-effort completion marker; used on cleanup paths where failures
    /// are logged and dropped.
    async fn complete_voice(&self, interview_id: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url(&format!("/interview/{}/complete-voice", interview_id)))
            .send()
            .await;
        match response {
            Ok(r) => {
                Self::check(r).await?;
                Ok(())
            }
            Err(e) => {
                warn!("complete-voice call failed: {}", e);
                Err(e.into())
            }
        }
    }
}

// Tauri commands for the upload screen

#[tauri::command]
pub async fn upload_resume_file(
    path: String,
    state: State<'_, AppState>,
) -> Result<Resume, String> {
    state
        .api
        .upload_resume(Path::new(&path))
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn fetch_resume(resume_id: String, state: State<'_, AppState>) -> Result<Resume, String> {
    state
        .api
        .get_resume(&resume_id)
        .await
        .map_err(|e| e.to_string())
}
