use jiff::civil::date;
use praxis_core::models::response::ResponseValue;
use praxis_core::models::survey::{QuestionType, Step, Survey};
use praxis_survey::answer::{Answer, Submission, validate_answer};
use praxis_survey::import::build_survey;
use serde_json::json;

fn survey() -> Survey {
    let doc = json!({
        "name": "Answers",
        "steps": [
            { "order": 1, "step_type": "dialog" },
            {
                "order": 2, "step_type": "question", "question_type": "text",
                "options": { "max_length": 5, "optional": false }
            },
            {
                "order": 3, "step_type": "question", "question_type": "number",
                "options": { "min": 0, "max": 120 }
            },
            {
                "order": 4, "step_type": "question", "question_type": "date",
                "options": { "min": "2000-01-01", "max": "today" }
            },
            {
                "order": 5, "step_type": "question", "question_type": "single_choice",
                "choices": [
                    { "label": "Yes", "value": "yes" },
                    { "label": "No", "value": "no" }
                ]
            },
            {
                "order": 6, "step_type": "question", "question_type": "multiple_choice",
                "options": { "max_choices": 2 },
                "choices": [
                    { "label": "Headache", "value": "headache" },
                    { "label": "Nausea", "value": "nausea" },
                    { "label": "Fatigue", "value": "fatigue" }
                ]
            },
            {
                "order": 7, "step_type": "question", "question_type": "text"
            }
        ]
    });
    build_survey(&doc, "p", jiff::Timestamp::UNIX_EPOCH).unwrap()
}

fn step(survey: &Survey, order: u32) -> &Step {
    survey.steps.iter().find(|s| s.order == order).unwrap()
}

fn today() -> jiff::civil::Date {
    date(2026, 3, 1)
}

fn recorded(answer: Answer) -> praxis_core::models::response::ResponseDraft {
    match answer {
        Answer::Recorded(draft) => draft,
        Answer::Acknowledged => panic!("expected a recorded answer"),
    }
}

#[test]
fn dialog_steps_are_acknowledged() {
    let s = survey();
    let answer = validate_answer(step(&s, 1), &Submission::default(), today()).unwrap();
    assert_eq!(answer, Answer::Acknowledged);
}

#[test]
fn skip_bypasses_value_checks() {
    let s = survey();
    let submission = Submission {
        value: Some(json!("this is far too long")),
        skipped: true,
    };
    let draft = recorded(validate_answer(step(&s, 2), &submission, today()).unwrap());
    assert!(draft.is_skipped);
    assert_eq!(draft.value, None);
    assert_eq!(draft.question_type, QuestionType::Text);
}

#[test]
fn required_text_rejects_blank_and_long_answers() {
    let s = survey();
    let text = step(&s, 2);

    let blank = validate_answer(text, &Submission::answer(json!("   ")), today()).unwrap_err();
    assert!(blank.contains("value"));

    let missing = validate_answer(text, &Submission::default(), today()).unwrap_err();
    assert!(missing.contains("value"));

    let long = validate_answer(text, &Submission::answer(json!("abcdef")), today()).unwrap_err();
    assert!(long.get("value").unwrap()[0].contains("5 characters"));

    let ok = recorded(validate_answer(text, &Submission::answer(json!("héllo")), today()).unwrap());
    assert_eq!(ok.value, Some(ResponseValue::Text("héllo".into())));
}

#[test]
fn optional_questions_accept_missing_values() {
    let s = survey();
    let draft = recorded(validate_answer(step(&s, 7), &Submission::default(), today()).unwrap());
    assert!(!draft.is_skipped);
    assert_eq!(draft.value, None);
}

#[test]
fn numbers_accept_numeric_strings_within_range() {
    let s = survey();
    let number = step(&s, 3);

    let draft = recorded(validate_answer(number, &Submission::answer(json!("42.5")), today()).unwrap());
    assert_eq!(draft.value, Some(ResponseValue::Number(42.5)));

    assert!(validate_answer(number, &Submission::answer(json!(121)), today()).is_err());
    assert!(validate_answer(number, &Submission::answer(json!("abc")), today()).is_err());
}

#[test]
fn dates_are_strict_and_bounded_by_today() {
    let s = survey();
    let date_step = step(&s, 4);

    let draft = recorded(
        validate_answer(date_step, &Submission::answer(json!("2026-03-01")), today()).unwrap(),
    );
    assert_eq!(draft.value, Some(ResponseValue::Date(date(2026, 3, 1))));

    for bad in ["2026-03-02", "1999-12-31", "2025-02-30", "2025-1-05", "05/01/2025"] {
        assert!(
            validate_answer(date_step, &Submission::answer(json!(bad)), today()).is_err(),
            "{bad} should be rejected"
        );
    }
}

#[test]
fn single_choice_must_reference_a_step_choice() {
    let s = survey();
    let choice_step = step(&s, 5);
    let yes = &choice_step.question().unwrap().choices()[0];

    let draft = recorded(
        validate_answer(
            choice_step,
            &Submission::answer(json!({ "id": yes.id.to_string(), "label": "Yes" })),
            today(),
        )
        .unwrap(),
    );
    assert_eq!(draft.choice_id, Some(yes.id));

    let foreign = uuid::Uuid::new_v4();
    let errors = validate_answer(
        choice_step,
        &Submission::answer(json!({ "id": foreign.to_string() })),
        today(),
    )
    .unwrap_err();
    assert_eq!(
        errors.get("value").unwrap(),
        [format!("Invalid choice ID: {foreign}")]
    );
}

#[test]
fn multiple_choice_checks_each_entry() {
    let s = survey();
    let multi = step(&s, 6);
    let choices = multi.question().unwrap().choices();
    let a = choices[0].id.to_string();
    let b = choices[1].id.to_string();
    let c = choices[2].id.to_string();

    let draft = recorded(
        validate_answer(multi, &Submission::answer(json!([{ "id": a }, { "id": b }])), today())
            .unwrap(),
    );
    match draft.value {
        Some(ResponseValue::Choices(selected)) => assert_eq!(selected.len(), 2),
        other => panic!("unexpected value {other:?}"),
    }
    assert_eq!(draft.choice_id, None);

    let invalid = validate_answer(
        multi,
        &Submission::answer(json!([{ "id": a }, { "id": "nope" }])),
        today(),
    )
    .unwrap_err();
    assert_eq!(invalid.get("value.1").unwrap(), ["Invalid choice ID at index 1."]);

    let duplicate = validate_answer(
        multi,
        &Submission::answer(json!([{ "id": a }, { "id": a }])),
        today(),
    )
    .unwrap_err();
    assert!(duplicate.contains("value.1"));

    let too_many = validate_answer(
        multi,
        &Submission::answer(json!([{ "id": a }, { "id": b }, { "id": c }])),
        today(),
    )
    .unwrap_err();
    assert!(too_many.contains("value"));
}

#[test]
fn multiple_choice_rejects_an_empty_selection() {
    let s = survey();
    let multi = step(&s, 6);

    let empty = validate_answer(multi, &Submission::answer(json!([])), today()).unwrap_err();
    assert_eq!(empty.get("value").unwrap(), ["Select at least one choice."]);

    // Null on an optional question is still an unanswered response.
    let draft =
        recorded(validate_answer(multi, &Submission::answer(json!(null)), today()).unwrap());
    assert_eq!(draft.value, None);
    assert!(!draft.is_skipped);
}

#[test]
fn submission_payload_is_closed() {
    let errors = Submission::from_json(&json!({ "value": 1, "skip": true })).unwrap_err();
    assert!(errors.contains("skip"));

    let errors = Submission::from_json(&json!({ "skipped": "yes" })).unwrap_err();
    assert!(errors.contains("skipped"));

    let submission = Submission::from_json(&json!({ "value": null, "skipped": true })).unwrap();
    assert_eq!(submission, Submission::skip());
}
