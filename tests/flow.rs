// End-to-end checks over the public library surface: the screen flow from
// upload to feedback, using the same types the commands exchange.

use vocaprep_lib::api::{TurnAdvance, VoiceTurnPayload};
use vocaprep_lib::feedback::{build_report, ScoreBand};
use vocaprep_lib::routes::{resolve, AppView, NavigationState, Resolution};
use vocaprep_lib::session::{
    DifficultyLevel, InterviewConfig, InterviewResponse, InterviewSession, QuestionType,
    ResponseAnalysis,
};

#[test]
fn screen_flow_unlocks_as_state_accumulates() {
    let mut state = NavigationState::default();

    // Fresh launch: only the entry screens are reachable.
    assert_eq!(resolve(AppView::Home, &state), Resolution::Proceed);
    assert_eq!(resolve(AppView::Upload, &state), Resolution::Proceed);
    assert_eq!(
        resolve(AppView::Setup, &state),
        Resolution::Redirect(AppView::Upload)
    );
    assert_eq!(
        resolve(AppView::Interview, &state),
        Resolution::Redirect(AppView::Setup)
    );
    assert_eq!(
        resolve(AppView::Feedback, &state),
        Resolution::Redirect(AppView::Home)
    );

    // Resume uploaded.
    state.resume_id = Some("resume-1".to_string());
    assert_eq!(resolve(AppView::Setup, &state), Resolution::Proceed);
    assert_eq!(
        resolve(AppView::Interview, &state),
        Resolution::Redirect(AppView::Setup)
    );

    // Questions generated.
    state.interview_id = Some("int-1".to_string());
    state.config = Some(InterviewConfig::default());
    assert_eq!(resolve(AppView::Interview, &state), Resolution::Proceed);
    assert_eq!(resolve(AppView::Feedback, &state), Resolution::Proceed);
}

#[test]
fn setup_config_survives_a_round_of_edits() {
    let mut config = InterviewConfig::default();
    config.toggle_question_type(QuestionType::Situational);
    config.toggle_question_type(QuestionType::Technical);
    config.adjust_num_questions(3);

    assert_eq!(config.num_questions, 8);
    assert!(config.question_types.contains(&QuestionType::Situational));
    assert!(!config.question_types.contains(&QuestionType::Technical));

    let json = serde_json::to_string(&config).unwrap();
    let parsed: InterviewConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.num_questions, 8);
    assert_eq!(parsed.question_types, config.question_types);
}

#[test]
fn turn_payloads_classify_like_the_server_contract() {
    let follow_up: VoiceTurnPayload = serde_json::from_str(
        r#"{"has_follow_up": true, "follow_up_question": "Why that approach?"}"#,
    )
    .unwrap();
    assert!(matches!(
        follow_up.advance().unwrap(),
        TurnAdvance::FollowUp { .. }
    ));

    let completed: VoiceTurnPayload =
        serde_json::from_str(r#"{"interview_completed": true, "completion_message": "Done!"}"#)
            .unwrap();
    assert_eq!(
        completed.advance().unwrap(),
        TurnAdvance::Completed {
            completion_message: Some("Done!".to_string())
        }
    );
}

#[test]
fn feedback_report_reflects_a_finished_session() {
    let session = InterviewSession {
        id: "int-1".to_string(),
        resume_id: "resume-1".to_string(),
        difficulty: DifficultyLevel::Mid,
        questions: vec![],
        responses: vec![InterviewResponse {
            question_id: "q1".to_string(),
            question_text: "Tell me about a project you led.".to_string(),
            user_response: "I led the billing migration.".to_string(),
            response_time: 24,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            analysis: Some(ResponseAnalysis {
                completeness_score: 8.0,
                accuracy_score: 9.0,
                clarity_score: 10.0,
                missing_points: vec![],
                strengths: vec!["specific outcome".to_string()],
                follow_up_needed: false,
                suggested_follow_up: String::new(),
            }),
        }],
        status: "completed".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
        started_at: None,
        completed_at: None,
    };

    let report = build_report(&session, vec![]);
    assert_eq!(report.interview_id, "int-1");
    assert_eq!(report.overall_score, 9.0);
    assert_eq!(report.overall_band, ScoreBand::Strong);
    assert_eq!(report.questions[0].response_time, 24);
}
