use serde::{Deserialize, Serialize};

use crate::session::{InterviewConfig, Question};

/// The five screens of the app, in flow order.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppView {
    Home,
    Upload,
    Setup,
    Interview,
    Feedback,
}

impl AppView {
    pub fn path(&self) -> &'static str {
        match self {
            AppView::Home => "/",
            AppView::Upload => "/upload",
            AppView::Setup => "/setup",
            AppView::Interview => "/interview",
            AppView::Feedback => "/feedback",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/" => Some(AppView::Home),
            "/upload" => Some(AppView::Upload),
            "/setup" => Some(AppView::Setup),
            "/interview" => Some(AppView::Interview),
            "/feedback" => Some(AppView::Feedback),
            _ => None,
        }
    }
}

/// State carried between screens, accumulated along the upload, setup,
/// interview, feedback flow.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NavigationState {
    #[serde(default)]
    pub resume_id: Option<String>,
    #[serde(default)]
    pub interview_id: Option<String>,
    #[serde(default)]
    pub config: Option<InterviewConfig>,
    #[serde(default)]
    pub questions: Option<Vec<Question>>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase", tag = "action", content = "target")]
pub enum Resolution {
    Proceed,
    Redirect(AppView),
}

/// Guard each screen against missing prerequisites: deep-linking into the
/// middle of the flow bounces back to the screen that produces the missing
/// state.
pub fn resolve(view: AppView, state: &NavigationState) -> Resolution {
    match view {
        AppView::Home | AppView::Upload => Resolution::Proceed,
        AppView::Setup => {
            if state.resume_id.is_some() {
                Resolution::Proceed
            } else {
                Resolution::Redirect(AppView::Upload)
            }
        }
        AppView::Interview => {
            if state.interview_id.is_some() && state.config.is_some() {
                Resolution::Proceed
            } else {
                Resolution::Redirect(AppView::Setup)
            }
        }
        AppView::Feedback => {
            if state.interview_id.is_some() {
                Resolution::Proceed
            } else {
                Resolution::Redirect(AppView::Home)
            }
        }
    }
}

#[tauri::command]
pub fn resolve_navigation(path: String, state: NavigationState) -> Result<Resolution, String> {
    let view = AppView::from_path(&path).ok_or_else(|| format!("unknown route: {}", path))?;
    Ok(resolve(view, &state))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(resume: bool, interview: bool, config: bool) -> NavigationState {
        NavigationState {
            resume_id: resume.then(|| "r1".to_string()),
            interview_id: interview.then(|| "int-1".to_string()),
            config: config.then(InterviewConfig::default),
            questions: None,
        }
    }

    #[test]
    fn paths_round_trip() {
        for view in [
            AppView::Home,
            AppView::Upload,
            AppView::Setup,
            AppView::Interview,
            AppView::Feedback,
        ] {
            assert_eq!(AppView::from_path(view.path()), Some(view));
        }
        assert_eq!(AppView::from_path("/nope"), None);
    }

    #[test]
    fn home_and_upload_are_always_reachable() {
        let empty = NavigationState::default();
        assert_eq!(resolve(AppView::Home, &empty), Resolution::Proceed);
        assert_eq!(resolve(AppView::Upload, &empty), Resolution::Proceed);
    }

    #[test]
    fn setup_requires_a_resume() {
        assert_eq!(
            resolve(AppView::Setup, &state_with(false, false, false)),
            Resolution::Redirect(AppView::Upload)
        );
        assert_eq!(
            resolve(AppView::Setup, &state_with(true, false, false)),
            Resolution::Proceed
        );
    }

    #[test]
    fn interview_requires_id_and_config() {
        assert_eq!(
            resolve(AppView::Interview, &state_with(true, true, false)),
            Resolution::Redirect(AppView::Setup)
        );
        assert_eq!(
            resolve(AppView::Interview, &state_with(true, false, true)),
            Resolution::Redirect(AppView::Setup)
        );
        assert_eq!(
            resolve(AppView::Interview, &state_with(true, true, true)),
            Resolution::Proceed
        );
    }

    #[test]
    fn feedback_requires_an_interview_id() {
        assert_eq!(
            resolve(AppView::Feedback, &state_with(false, false, false)),
            Resolution::Redirect(AppView::Home)
        );
        assert_eq!(
            resolve(AppView::Feedback, &state_with(false, true, false)),
            Resolution::Proceed
        );
    }
}
