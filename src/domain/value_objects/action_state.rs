use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field name to the ordered messages raised against it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// What a form action hands back to the page that submitted it.
///
/// A fresh value is built for every call through [`ActionState::initial`]; there is
/// no shared default instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActionState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionState {
    pub fn initial() -> Self {
        Self::default()
    }

    pub fn with_errors(errors: FieldErrors, message: impl Into<String>) -> Self {
        Self {
            errors: Some(errors),
            message: Some(message.into()),
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            errors: None,
            message: Some(message.into()),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }
}

/// How a mutation finished.
///
/// `Redirect` ends the request by sending the client elsewhere and carries no state
/// for the form. Every other variant is handed back to the form for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Redirect(String),
    Completed(ActionState),
    ValidationFailed(ActionState),
    PersistenceFailed(ActionState),
}

impl ActionOutcome {
    pub fn state(&self) -> Option<&ActionState> {
        match self {
            ActionOutcome::Redirect(_) => None,
            ActionOutcome::Completed(state)
            | ActionOutcome::ValidationFailed(state)
            | ActionOutcome::PersistenceFailed(state) => Some(state),
        }
    }
}
