use log::info;
use serde::Serialize;
use tauri::State;

use crate::session::{ConversationItem, InterviewSession, ResponseAnalysis};
use crate::AppState;

/// Scores arrive from the analysis model and are not trusted to stay in
/// range; everything is clamped to the 0 to 10 scale before any math.
pub fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 10.0)
}

/// Width of a score bar, as a percentage of the full scale.
pub fn score_percent(score: f64) -> f64 {
    clamp_score(score) * 10.0
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Strong,
    Fair,
    Weak,
}

impl ScoreBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 8.0 {
            ScoreBand::Strong
        } else if score >= 6.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Weak
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ScoreBand::Strong => "#28a745",
            ScoreBand::Fair => "#ffc107",
            ScoreBand::Weak => "#dc3545",
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct QuestionFeedback {
    pub question_text: String,
    pub user_response: String,
    pub response_time: u64,
    pub score: f64,
    pub band: ScoreBand,
    pub strengths: Vec<String>,
    pub missing_points: Vec<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct FeedbackReport {
    pub interview_id: String,
    pub overall_score: f64,
    pub overall_band: ScoreBand,
    pub completeness_avg: f64,
    pub accuracy_avg: f64,
    pub clarity_avg: f64,
    pub questions: Vec<QuestionFeedback>,
    pub conversation: Vec<ConversationItem>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Mean of the three clamped sub-scores; a response the model never analyzed
/// counts as zero rather than being skipped.
fn response_score(analysis: Option<&ResponseAnalysis>) -> f64 {
    match analysis {
        Some(a) => {
            (clamp_score(a.completeness_score)
                + clamp_score(a.accuracy_score)
                + clamp_score(a.clarity_score))
                / 3.0
        }
        None => 0.0,
    }
}

pub fn build_report(session: &InterviewSession, conversation: Vec<ConversationItem>) -> FeedbackReport {
    let count = session.responses.len();

    let mut completeness = 0.0;
    let mut accuracy = 0.0;
    let mut clarity = 0.0;
    let mut overall = 0.0;
    let mut questions = Vec::with_capacity(count);

    for response in &session.responses {
        let analysis = response.analysis.as_ref();
        if let Some(a) = analysis {
            completeness += clamp_score(a.completeness_score);
            accuracy += clamp_score(a.accuracy_score);
            clarity += clamp_score(a.clarity_score);
        }
        let score = round1(response_score(analysis));
        overall += score;
        questions.push(QuestionFeedback {
            question_text: response.question_text.clone(),
            user_response: response.user_response.clone(),
            response_time: response.response_time,
            score,
            band: ScoreBand::for_score(score),
            strengths: analysis.map(|a| a.strengths.clone()).unwrap_or_default(),
            missing_points: analysis.map(|a| a.missing_points.clone()).unwrap_or_default(),
        });
    }

    let divisor = count.max(1) as f64;
    let overall_score = round1(overall / divisor);

    FeedbackReport {
        interview_id: session.id.clone(),
        overall_score,
        overall_band: ScoreBand::for_score(overall_score),
        completeness_avg: round1(completeness / divisor),
        accuracy_avg: round1(accuracy / divisor),
        clarity_avg: round1(clarity / divisor),
        questions,
        conversation,
    }
}

// Tauri command for the feedback screen

#[tauri::command]
pub async fn load_feedback(
    interview_id: String,
    state: State<'_, AppState>,
) -> Result<FeedbackReport, String> {
    use crate::api::InterviewBackend;

    info!("📊 Loading feedback for interview {}", interview_id);
    let (session, conversation) = futures::try_join!(
        state.api.get_interview(&interview_id),
        state.api.get_conversation(&interview_id),
    )
    .map_err(|e| e.to_string())?;

    Ok(build_report(&session, conversation))
}
