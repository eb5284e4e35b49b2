//! Answer validation for a single step submission.

use std::collections::HashSet;

use jiff::civil::Date;
use praxis_core::models::response::{ResponseDraft, ResponseValue, SelectedChoice};
use praxis_core::models::survey::{
    Choice, ChoiceOptions, DateOptions, NumberOptions, Question, Step, TextOptions,
    parse_iso_date,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ValidationErrors;

/// Hard ceiling on free-text answers, in characters.
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Hard ceiling on the number of selections in a multiple-choice answer.
pub const MAX_SELECTIONS: usize = 100;

/// A step submission payload: `{ "value"?: any, "skipped"?: bool }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub value: Option<Value>,
    pub skipped: bool,
}

impl Submission {
    pub fn answer(value: Value) -> Self {
        Self {
            value: Some(value),
            skipped: false,
        }
    }

    pub fn skip() -> Self {
        Self {
            value: None,
            skipped: true,
        }
    }

    /// Read a raw payload. The object is closed: keys other than `value` and
    /// `skipped` are rejected.
    pub fn from_json(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let empty = Map::new();
        let obj = match payload {
            Value::Object(obj) => obj,
            Value::Null => &empty,
            _ => {
                errors.add("payload", "The submission must be a mapping.");
                return Err(errors);
            }
        };

        for key in obj.keys() {
            if key != "value" && key != "skipped" {
                errors.add(key.as_str(), format!("unknown field `{key}`"));
            }
        }

        let skipped = match obj.get("skipped") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                errors.add("skipped", "skipped must be a boolean.");
                false
            }
        };

        errors.into_result()?;
        Ok(Self {
            value: obj.get("value").filter(|v| !v.is_null()).cloned(),
            skipped,
        })
    }
}

/// Outcome of a valid submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Dialog step. Nothing is stored.
    Acknowledged,
    Recorded(ResponseDraft),
}

impl Answer {
    pub fn draft(&self) -> Option<&ResponseDraft> {
        match self {
            Answer::Acknowledged => None,
            Answer::Recorded(draft) => Some(draft),
        }
    }
}

/// Validate `submission` against `step`.
///
/// `today` resolves the `today` date bound. Any error rejects the whole
/// submission.
pub fn validate_answer(
    step: &Step,
    submission: &Submission,
    today: Date,
) -> Result<Answer, ValidationErrors> {
    let Some(question) = step.question() else {
        return Ok(Answer::Acknowledged);
    };
    let question_type = question.question_type();

    if submission.skipped {
        return Ok(Answer::Recorded(ResponseDraft {
            question_type,
            value: None,
            choice_id: None,
            is_skipped: true,
        }));
    }

    let required = question.is_required();
    let mut errors = ValidationErrors::new();
    let mut choice_id = None;

    let value = match submission.value.as_ref().filter(|v| !v.is_null()) {
        None => {
            if required {
                errors.add("value", "This question requires an answer.");
            }
            None
        }
        Some(raw) => match question {
            Question::Text { options } => text_value(raw, options, required, &mut errors),
            Question::Number { options } | Question::Scale { options } => {
                number_value(raw, options, &mut errors)
            }
            Question::Date { options } => date_value(raw, options, today, &mut errors),
            Question::SingleChoice { choices, .. } => {
                let selected = single_choice_value(raw, choices, &mut errors);
                choice_id = selected.as_ref().map(|s| s.id);
                selected.map(ResponseValue::Choice)
            }
            Question::MultipleChoice { options, choices } => {
                multiple_choice_value(raw, options, choices, &mut errors)
            }
        },
    };

    errors.into_result()?;
    Ok(Answer::Recorded(ResponseDraft {
        question_type,
        value,
        choice_id,
        is_skipped: false,
    }))
}

fn text_value(
    raw: &Value,
    options: &TextOptions,
    required: bool,
    errors: &mut ValidationErrors,
) -> Option<ResponseValue> {
    let Some(text) = raw.as_str() else {
        errors.add("value", "The answer must be text.");
        return None;
    };
    if text.trim().is_empty() {
        if required {
            errors.add("value", "This question requires an answer.");
        }
        return None;
    }

    let limit = options
        .max_length
        .map(|n| (n as usize).min(MAX_TEXT_LENGTH))
        .unwrap_or(MAX_TEXT_LENGTH);
    if text.chars().count() > limit {
        errors.add(
            "value",
            format!("The answer may not be longer than {limit} characters."),
        );
        return None;
    }
    Some(ResponseValue::Text(text.to_string()))
}

fn number_value(
    raw: &Value,
    options: &NumberOptions,
    errors: &mut ValidationErrors,
) -> Option<ResponseValue> {
    let number = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite());

    let Some(number) = number else {
        errors.add("value", "The answer must be a number.");
        return None;
    };
    if let Some(min) = options.min
        && number < min
    {
        errors.add("value", format!("The answer must be at least {min}."));
        return None;
    }
    if let Some(max) = options.max
        && number > max
    {
        errors.add("value", format!("The answer may not be greater than {max}."));
        return None;
    }
    Some(ResponseValue::Number(number))
}

fn date_value(
    raw: &Value,
    options: &DateOptions,
    today: Date,
    errors: &mut ValidationErrors,
) -> Option<ResponseValue> {
    let Some(date) = raw.as_str().and_then(parse_iso_date) else {
        errors.add("value", "The answer must be a valid date in YYYY-MM-DD format.");
        return None;
    };
    if let Some(min) = options.min.map(|b| b.resolve(today))
        && date < min
    {
        errors.add("value", format!("The date must be on or after {min}."));
        return None;
    }
    if let Some(max) = options.max.map(|b| b.resolve(today))
        && date > max
    {
        errors.add("value", format!("The date must be on or before {max}."));
        return None;
    }
    Some(ResponseValue::Date(date))
}

fn single_choice_value(
    raw: &Value,
    choices: &[Choice],
    errors: &mut ValidationErrors,
) -> Option<SelectedChoice> {
    let Some(obj) = raw.as_object() else {
        errors.add("value", "Select one of the available choices.");
        return None;
    };
    match selected_choice(obj, choices) {
        Ok(selected) => Some(selected),
        Err(raw_id) => {
            errors.add("value", format!("Invalid choice ID: {raw_id}"));
            None
        }
    }
}

fn multiple_choice_value(
    raw: &Value,
    options: &ChoiceOptions,
    choices: &[Choice],
    errors: &mut ValidationErrors,
) -> Option<ResponseValue> {
    let Some(items) = raw.as_array() else {
        errors.add("value", "Select one or more of the available choices.");
        return None;
    };
    // Only an absent or null value counts as unanswered.
    if items.is_empty() {
        errors.add("value", "Select at least one choice.");
        return None;
    }
    if items.len() > MAX_SELECTIONS {
        errors.add(
            "value",
            format!("Select at most {MAX_SELECTIONS} choices."),
        );
        return None;
    }

    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut selected = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let field = format!("value.{i}");
        let parsed = item
            .as_object()
            .ok_or_else(String::new)
            .and_then(|obj| selected_choice(obj, choices));
        match parsed {
            Ok(choice) if !seen.insert(choice.id) => {
                errors.add(field, format!("Duplicate choice ID at index {i}."));
            }
            Ok(choice) => selected.push(choice),
            Err(_) => errors.add(field, format!("Invalid choice ID at index {i}.")),
        }
    }
    if !errors.is_empty() {
        return None;
    }

    let count = selected.len() as u32;
    if let Some(min) = options.min_choices
        && count < min
    {
        errors.add("value", format!("Select at least {min} choices."));
        return None;
    }
    if let Some(max) = options.max_choices
        && count > max
    {
        errors.add("value", format!("Select at most {max} choices."));
        return None;
    }
    Some(ResponseValue::Choices(selected))
}

/// Resolve `{ "id": ... }` against the step's choices. On failure returns the
/// offending id text for the error message.
fn selected_choice(obj: &Map<String, Value>, choices: &[Choice]) -> Result<SelectedChoice, String> {
    let raw_id = match obj.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    let id = Uuid::parse_str(raw_id.trim()).map_err(|_| raw_id.clone())?;
    if !choices.iter().any(|c| c.id == id) {
        return Err(raw_id);
    }
    Ok(SelectedChoice {
        id,
        label: obj.get("label").and_then(Value::as_str).map(str::to_string),
        value: obj.get("value").and_then(Value::as_str).map(str::to_string),
    })
}
