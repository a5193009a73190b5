use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field values entered so far in a wizard.
pub type FormState = BTreeMap<String, String>;

/// Per-field error messages produced by a step validator. Empty means the
/// step accepts the current form state.
pub type ValidationErrors = BTreeMap<String, String>;

pub const MSG_REQUIRED: &str = "Champ obligatoire";
pub const MSG_INVALID_EMAIL: &str = "Adresse e-mail invalide";
pub const MSG_INVALID_NUMBER: &str = "Valeur numérique attendue";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    MembershipEnrollment,
    EventRegistration,
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowKind::MembershipEnrollment => write!(f, "membership_enrollment"),
            WorkflowKind::EventRegistration => write!(f, "event_registration"),
        }
    }
}

type Validator = Box<dyn Fn(&FormState) -> ValidationErrors + Send + Sync>;

/// One ordered step of a workflow.
///
/// Validators must be pure and total: no I/O, no panics. Step navigation is
/// guaranteed to stay local to the client, and that only holds as long as
/// validators keep to this contract.
pub struct StepDefinition {
    pub id: String,
    validator: Validator,
}

impl StepDefinition {
    pub fn new(
        id: impl Into<String>,
        validator: impl Fn(&FormState) -> ValidationErrors + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            validator: Box::new(validator),
        }
    }

    /// A step that only checks that the given fields are present and
    /// non-blank.
    pub fn required(id: impl Into<String>, fields: &[&str]) -> Self {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        Self::new(id, move |form| {
            let mut errors = ValidationErrors::new();
            for field in &fields {
                if is_blank(form, field) {
                    errors.insert(field.clone(), MSG_REQUIRED.to_string());
                }
            }
            errors
        })
    }

    pub fn validate(&self, form: &FormState) -> ValidationErrors {
        (self.validator)(form)
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Static, immutable description of a workflow: an ordered list of validated
/// steps. One definition exists per [`WorkflowKind`].
pub struct WorkflowDefinition {
    pub kind: WorkflowKind,
    pub steps: Vec<StepDefinition>,
}

impl WorkflowDefinition {
    pub fn for_kind(kind: WorkflowKind) -> Self {
        match kind {
            WorkflowKind::MembershipEnrollment => Self::membership_enrollment(),
            WorkflowKind::EventRegistration => Self::event_registration(),
        }
    }

    /// identity → contact → plan selection → review.
    pub fn membership_enrollment() -> Self {
        Self {
            kind: WorkflowKind::MembershipEnrollment,
            steps: vec![
                StepDefinition::new("identity", |form| {
                    let mut errors = required_fields(form, &["firstName", "lastName", "email"]);
                    if !errors.contains_key("email") && !looks_like_email(form, "email") {
                        errors.insert("email".into(), MSG_INVALID_EMAIL.into());
                    }
                    errors
                }),
                StepDefinition::required("contact", &["phone", "city"]),
                StepDefinition::required("plan", &["membershipPlan"]),
                StepDefinition::new("review", |_| ValidationErrors::new()),
            ],
        }
    }

    /// participant → event details → review.
    pub fn event_registration() -> Self {
        Self {
            kind: WorkflowKind::EventRegistration,
            steps: vec![
                StepDefinition::new("participant", |form| {
                    let mut errors = required_fields(form, &["firstName", "lastName", "email"]);
                    if !errors.contains_key("email") && !looks_like_email(form, "email") {
                        errors.insert("email".into(), MSG_INVALID_EMAIL.into());
                    }
                    errors
                }),
                StepDefinition::new("details", |form| {
                    let mut errors = required_fields(form, &["attendeeCount"]);
                    if !errors.contains_key("attendeeCount") && !parses_as_u32(form, "attendeeCount")
                    {
                        errors.insert("attendeeCount".into(), MSG_INVALID_NUMBER.into());
                    }
                    errors
                }),
                StepDefinition::new("review", |_| ValidationErrors::new()),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn is_blank(form: &FormState, field: &str) -> bool {
    form.get(field).map(|v| v.trim().is_empty()).unwrap_or(true)
}

fn required_fields(form: &FormState, fields: &[&str]) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for field in fields {
        if is_blank(form, field) {
            errors.insert(field.to_string(), MSG_REQUIRED.to_string());
        }
    }
    errors
}

fn looks_like_email(form: &FormState, field: &str) -> bool {
    form.get(field)
        .map(|v| {
            let v = v.trim();
            v.contains('@') && !v.starts_with('@') && !v.ends_with('@')
        })
        .unwrap_or(false)
}

fn parses_as_u32(form: &FormState, field: &str) -> bool {
    form.get(field)
        .map(|v| v.trim().parse::<u32>().is_ok())
        .unwrap_or(false)
}
