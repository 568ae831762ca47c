use serde::Serialize;

/// Where the user goes once a call session is over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "kebab-case")]
pub enum Route {
    Home,
    Feedback {
        interview_id: String,
        feedback_id: String,
    },
}

impl Route {
    pub fn feedback(interview_id: &str, feedback_id: &str) -> Self {
        Route::Feedback {
            interview_id: interview_id.to_string(),
            feedback_id: feedback_id.to_string(),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Feedback { interview_id, .. } => format!("/interview/{interview_id}/feedback"),
        }
    }
}

/// The host's navigation surface.
pub trait Navigator: Send + Sync {
    fn go_to(&self, route: &Route);
}
