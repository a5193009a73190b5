use super::workflow::{FormState, ValidationErrors, WorkflowDefinition, WorkflowKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum WizardStatus {
    InProgress,
    Completed,
    Cancelled,
}

/// Result of an [`WizardSession::advance`] attempt.
#[derive(Debug, PartialEq, Clone)]
pub enum AdvanceOutcome {
    /// The current step's validator rejected the form; the step index is
    /// unchanged and the caller should surface the per-field errors.
    Rejected(ValidationErrors),
    /// Moved to the next step.
    Advanced,
    /// The last step validated; the caller must now run the completion
    /// handler (payment branch) instead of stepping past the end.
    ReadyToComplete,
}

/// Mutable state of one open wizard.
///
/// Step navigation is purely in-memory: validators run synchronously and no
/// I/O happens until completion. The `id` identifies this session so that a
/// remote response landing after [`WizardSession::cancel`] can be detected
/// and discarded instead of applied.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WizardSession {
    pub id: String,
    pub workflow: WorkflowKind,
    pub current_step: usize,
    pub form: FormState,
    pub status: WizardStatus,
}

impl WizardSession {
    pub fn new(workflow: WorkflowKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            workflow,
            current_step: 0,
            form: FormState::new(),
            status: WizardStatus::InProgress,
        }
    }

    pub fn set_field(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.form.insert(field.into(), value.into());
    }

    pub fn set_fields(&mut self, fields: FormState) {
        self.form.extend(fields);
    }

    /// Validates the current step and moves forward on success.
    ///
    /// On rejection the step index is left untouched; surfacing the errors is
    /// the only observable effect.
    pub fn advance(&mut self, definition: &WorkflowDefinition) -> AdvanceOutcome {
        debug_assert_eq!(self.workflow, definition.kind);

        let step = &definition.steps[self.current_step];
        let errors = step.validate(&self.form);
        if !errors.is_empty() {
            return AdvanceOutcome::Rejected(errors);
        }

        if self.current_step + 1 == definition.len() {
            AdvanceOutcome::ReadyToComplete
        } else {
            self.current_step += 1;
            AdvanceOutcome::Advanced
        }
    }

    /// Moving backward never re-validates.
    pub fn retreat(&mut self) {
        if self.current_step > 0 {
            self.current_step -= 1;
        }
    }

    pub fn cancel(&mut self) {
        self.status = WizardStatus::Cancelled;
        self.form.clear();
    }

    pub fn complete(&mut self) {
        self.status = WizardStatus::Completed;
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == WizardStatus::InProgress
    }
}
