use praxis_audit::events::{AuditAction, AuditEvent};
use serde_json::json;
use uuid::Uuid;

#[test]
fn run_events_carry_hashed_subject_and_details() {
    let run_id = Uuid::new_v4();
    let event = AuditEvent::run(AuditAction::RunStatusChanged, run_id)
        .with_subject("ab12")
        .with_details(json!({ "from": "pending", "to": "completed" }));

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["action"], "run_status_changed");
    assert_eq!(value["resource_type"], "survey_run");
    assert_eq!(value["resource_id"], run_id.to_string());
    assert_eq!(value["subject"], "ab12");
    assert_eq!(value["details"]["to"], "completed");

    // Emitting without a subscriber installed is a no-op.
    event.emit();
}

#[test]
fn action_names_match_serialized_form() {
    for action in [
        AuditAction::SurveyImported,
        AuditAction::RunStarted,
        AuditAction::StepSubmitted,
        AuditAction::RunStatusChanged,
        AuditAction::AnalysisStored,
        AuditAction::AnalysisAbandoned,
    ] {
        assert_eq!(serde_json::to_value(action).unwrap(), action.as_str());
    }
}
