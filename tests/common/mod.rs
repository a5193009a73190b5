use serde_json::{Value, json};
use std::io::Write;
use tempfile::NamedTempFile;

/// Filled-in steps for the event-registration workflow.
pub fn event_steps() -> Value {
    json!([
        { "fields": { "firstName": "Moana", "lastName": "Tehei", "email": "moana@example.pf" } },
        { "fields": { "attendeeCount": "2" } },
        { "fields": {} }
    ])
}

pub fn cash_scenario() -> Value {
    json!({
        "workflow": "event_registration",
        "auth": { "token": "tok-1", "subjectId": "m-42" },
        "steps": event_steps(),
        "payment": {
            "method": "cash",
            "amount": "8000",
            "currency": "XPF",
            "targetId": "evt-9"
        },
        "botCheckToken": "captcha-ok"
    })
}

pub fn gateway_scenario(redirect_url: &str) -> Value {
    json!({
        "workflow": "event_registration",
        "auth": { "token": "tok-1", "subjectId": "m-42" },
        "steps": event_steps(),
        "payment": {
            "method": "gateway",
            "amount": "5000",
            "currency": "XPF",
            "targetId": "evt-9",
            "eventTitle": "Congrès annuel"
        },
        "botCheckToken": "captcha-ok",
        "gateway": { "redirectUrl": redirect_url }
    })
}

pub fn resume_scenario(response_code: &str, order_number: &str) -> Value {
    json!({
        "workflow": "event_registration",
        "auth": { "token": "tok-1", "subjectId": "m-42" },
        "steps": [],
        "payment": {
            "method": "gateway",
            "amount": "5000",
            "currency": "XPF",
            "targetId": "evt-9"
        },
        "botCheckToken": "captcha-ok",
        "gateway": {
            "confirmation": {
                "responseCode": response_code,
                "orderNumber": order_number,
                "approvalCode": "APX-1",
                "amount": "5000",
                "currency": "XPF"
            }
        }
    })
}

pub fn write_scenario(scenario: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{scenario}").unwrap();
    file.flush().unwrap();
    file
}
