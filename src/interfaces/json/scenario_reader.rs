use crate::domain::auth::AuthSession;
use crate::domain::transaction::{Confirmation, PaymentMethod};
use crate::domain::workflow::WorkflowKind;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

/// A scripted end-to-end run of the engine: the wizard inputs plus the
/// behavior of every external collaborator.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub workflow: WorkflowKind,
    pub auth: AuthSession,
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
    pub payment: ScenarioPayment,
    #[serde(default)]
    pub bot_check_token: String,
    #[serde(default = "default_true")]
    pub secure_transport: bool,
    #[serde(default)]
    pub gateway: ScenarioGateway,
    #[serde(default)]
    pub api: ScenarioApi,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStep {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPayment {
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub currency: String,
    pub target_id: String,
    #[serde(default)]
    pub event_title: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub event_location: Option<String>,
    #[serde(default)]
    pub replace_pending: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioGateway {
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub initiation_error: Option<String>,
    #[serde(default)]
    pub confirmation: Option<Confirmation>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioApi {
    #[serde(default = "default_true")]
    pub commit_success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl Default for ScenarioApi {
    fn default() -> Self {
        Self {
            commit_success: true,
            message: None,
        }
    }
}

fn default_true() -> bool {
    true
}

pub struct ScenarioReader<R: Read> {
    source: R,
}

impl<R: Read> ScenarioReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn scenario(self) -> Result<Scenario> {
        Ok(serde_json::from_reader(self.source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_scenario_deserialization_with_defaults() {
        let data = r#"{
            "workflow": "event_registration",
            "auth": { "token": "tok", "subjectId": "m-1" },
            "steps": [
                { "fields": { "firstName": "Moana", "lastName": "Tehei", "email": "m@t.pf" } }
            ],
            "payment": {
                "method": "cash",
                "amount": "8000",
                "currency": "XPF",
                "targetId": "evt-3"
            },
            "botCheckToken": "captcha-ok"
        }"#;

        let scenario = ScenarioReader::new(data.as_bytes()).scenario().unwrap();
        assert_eq!(scenario.workflow, WorkflowKind::EventRegistration);
        assert_eq!(scenario.payment.amount, dec!(8000));
        assert_eq!(scenario.payment.method, PaymentMethod::Cash);
        assert!(scenario.secure_transport);
        assert!(scenario.api.commit_success);
        assert!(scenario.gateway.redirect_url.is_none());
    }

    #[test]
    fn test_malformed_scenario_is_an_error() {
        let data = r#"{ "workflow": "event_registration" }"#;
        assert!(ScenarioReader::new(data.as_bytes()).scenario().is_err());
    }
}
