//! Survey document import.
//!
//! A document is checked in full before anything is built: every problem is
//! collected into one [`ValidationErrors`] map keyed by path (`name`,
//! `steps.1.order`, `steps.2.choices.0.next_step`, ...). Each object level is
//! closed, so unknown keys are errors rather than silently dropped.
//!
//! Choices reference their branch target by step **order**; import resolves
//! that order to the generated step id.

use std::collections::HashMap;
use std::path::Path;

use praxis_core::models::survey::{
    Choice, ChoiceOptions, DateBound, DateFormat, DateOptions, NumberOptions, Question,
    QuestionType, Step, StepKind, Survey, TextOptions,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{SurveyError, ValidationErrors};

const SURVEY_KEYS: &[&str] = &["name", "description", "version", "is_active", "steps"];
const STEP_KEYS: &[&str] = &[
    "order",
    "title",
    "content",
    "step_type",
    "question_type",
    "options",
    "choices",
];
const CHOICE_KEYS: &[&str] = &["label", "value", "order", "next_step", "optional_next_step"];

const CHOICE_OPTION_KEYS: &[&str] = &[
    "min_choices",
    "max_choices",
    "allow_other",
    "other_label",
    "optional",
];
const TEXT_OPTION_KEYS: &[&str] = &["placeholder", "max_length", "optional"];
const NUMBER_OPTION_KEYS: &[&str] = &["min", "max", "step", "optional"];
const DATE_OPTION_KEYS: &[&str] = &["min", "max", "format", "optional"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Yaml,
}

impl ImportFormat {
    /// Pick the format from a file extension (`.json`, `.yaml`, `.yml`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(ImportFormat::Json),
            "yaml" | "yml" => Some(ImportFormat::Yaml),
            _ => None,
        }
    }
}

/// Parse raw text into a JSON value. Syntax errors are reported under the
/// `document` key.
pub fn parse_document(text: &str, format: ImportFormat) -> Result<Value, SurveyError> {
    let parsed = match format {
        ImportFormat::Json => serde_json::from_str::<Value>(text).map_err(|e| e.to_string()),
        ImportFormat::Yaml => serde_yaml::from_str::<Value>(text).map_err(|e| e.to_string()),
    };
    parsed.map_err(|msg| ValidationErrors::single("document", msg).into())
}

/// Parse and validate a document in one call.
pub fn import_survey(
    text: &str,
    format: ImportFormat,
    practice_hash: &str,
    now: jiff::Timestamp,
) -> Result<Survey, SurveyError> {
    let document = parse_document(text, format)?;
    build_survey(&document, practice_hash, now)
}

/// Validate a parsed document and build a [`Survey`] with fresh ids.
///
/// Accepts either the bare survey object or one wrapped as
/// `{ "survey": { ... } }`.
pub fn build_survey(
    document: &Value,
    practice_hash: &str,
    now: jiff::Timestamp,
) -> Result<Survey, SurveyError> {
    let mut errors = ValidationErrors::new();

    let root = unwrap_root(document);
    let Some(obj) = root.as_object() else {
        errors.add("survey", "The survey must be a mapping.");
        return Err(errors.into());
    };
    reject_unknown(obj, SURVEY_KEYS, "survey", &mut errors);

    let name = match obj.get("name") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) => {
            errors.add("name", "Survey name cannot be empty.");
            String::new()
        }
        None | Some(Value::Null) => {
            errors.add("name", "Survey name is required.");
            String::new()
        }
        Some(_) => {
            errors.add("name", "Survey name must be a string.");
            String::new()
        }
    };
    let description = optional_string(obj, "description", "description", &mut errors);
    let version = match obj.get("version") {
        None | Some(Value::Null) => 1,
        Some(v) => match as_positive_u32(v, 1) {
            Some(n) => n,
            None => {
                errors.add("version", "version must be an integer >= 1.");
                1
            }
        },
    };
    let is_active = match obj.get("is_active") {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            errors.add("is_active", "is_active must be a boolean.");
            true
        }
    };

    let survey_id = Uuid::new_v4();
    let steps = match obj.get("steps") {
        None | Some(Value::Null) => {
            errors.add("steps", "At least one step is required.");
            Vec::new()
        }
        Some(Value::Array(items)) if items.is_empty() => {
            errors.add("steps", "Provide at least one step.");
            Vec::new()
        }
        Some(Value::Array(items)) => build_steps(items, survey_id, &mut errors),
        Some(_) => {
            errors.add("steps", "steps must be a list.");
            Vec::new()
        }
    };

    errors.into_result()?;

    Ok(Survey {
        id: survey_id,
        name,
        description,
        version,
        is_active,
        practice_hash: practice_hash.to_string(),
        steps,
        created_at: now,
    })
}

fn unwrap_root(document: &Value) -> &Value {
    match document.as_object() {
        Some(obj) if obj.len() == 1 => match obj.get("survey") {
            Some(inner @ Value::Object(_)) => inner,
            _ => document,
        },
        _ => document,
    }
}

fn build_steps(items: &[Value], survey_id: Uuid, errors: &mut ValidationErrors) -> Vec<Step> {
    let ids: Vec<Uuid> = items.iter().map(|_| Uuid::new_v4()).collect();

    // Orders first: branch targets may point forward.
    let mut orders = Vec::with_capacity(items.len());
    let mut by_order: HashMap<u32, Uuid> = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        let path = format!("steps.{i}.order");
        let order = match item.get("order") {
            None | Some(Value::Null) => {
                errors.add(&path, "Step order is required.");
                None
            }
            Some(v) => match as_positive_u32(v, 1) {
                Some(n) => Some(n),
                None => {
                    errors.add(&path, "Step order must be an integer >= 1.");
                    None
                }
            },
        };
        if let Some(order) = order {
            if by_order.contains_key(&order) {
                errors.add(&path, format!("Duplicate step order {order}."));
            } else {
                by_order.insert(order, ids[i]);
            }
        }
        orders.push(order);
    }

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            build_step(item, i, ids[i], survey_id, orders[i], &by_order, errors)
        })
        .collect()
}

fn build_step(
    value: &Value,
    index: usize,
    id: Uuid,
    survey_id: Uuid,
    order: Option<u32>,
    by_order: &HashMap<u32, Uuid>,
    errors: &mut ValidationErrors,
) -> Option<Step> {
    let path = format!("steps.{index}");
    let Some(obj) = value.as_object() else {
        errors.add(&path, "Each step must be a mapping.");
        return None;
    };
    reject_unknown(obj, STEP_KEYS, &path, errors);

    let title = optional_string(obj, "title", &format!("{path}.title"), errors);
    let content = optional_string(obj, "content", &format!("{path}.content"), errors);

    let kind = match obj.get("step_type") {
        Some(Value::String(s)) if s == "dialog" || s == "info" => {
            for key in ["question_type", "options", "choices"] {
                if is_present(obj.get(key)) {
                    errors.add(
                        format!("{path}.{key}"),
                        format!("{key} is not allowed on dialog steps."),
                    );
                }
            }
            Some(StepKind::Dialog)
        }
        Some(Value::String(s)) if s == "question" => {
            build_question(obj, &path, id, by_order, errors)
                .map(|question| StepKind::Question { question })
        }
        None | Some(Value::Null) => {
            errors.add(format!("{path}.step_type"), "step_type is required.");
            None
        }
        Some(_) => {
            errors.add(
                format!("{path}.step_type"),
                "step_type must be either dialog or question.",
            );
            None
        }
    };

    Some(Step {
        id,
        survey_id,
        order: order?,
        title,
        content,
        kind: kind?,
    })
}

fn build_question(
    obj: &Map<String, Value>,
    path: &str,
    step_id: Uuid,
    by_order: &HashMap<u32, Uuid>,
    errors: &mut ValidationErrors,
) -> Option<Question> {
    let type_path = format!("{path}.question_type");
    let question_type = match obj.get("question_type") {
        Some(Value::String(s)) => match parse_question_type(s) {
            Some(qt) => qt,
            None => {
                errors.add(&type_path, format!("Invalid question_type '{s}'."));
                return None;
            }
        },
        None | Some(Value::Null) => {
            errors.add(&type_path, "question_type is required for question steps.");
            return None;
        }
        Some(_) => {
            errors.add(&type_path, "question_type must be a string.");
            return None;
        }
    };

    let options_path = format!("{path}.options");
    let raw_options = obj.get("options");

    if !question_type.is_choice() && is_present(obj.get("choices")) {
        errors.add(
            format!("{path}.choices"),
            format!("choices are not allowed for {question_type} questions."),
        );
    }

    let question = match question_type {
        QuestionType::SingleChoice | QuestionType::MultipleChoice => {
            if let Some(Value::Object(map)) = raw_options
                && map.is_empty()
            {
                errors.add(&options_path, "options must not be empty when present.");
            }
            let options = choice_options(raw_options, &options_path, errors);
            let choices = build_choices(obj.get("choices"), path, step_id, by_order, errors);
            if question_type == QuestionType::SingleChoice {
                Question::SingleChoice { options, choices }
            } else {
                Question::MultipleChoice { options, choices }
            }
        }
        QuestionType::Text => Question::Text {
            options: text_options(raw_options, &options_path, errors),
        },
        QuestionType::Number => Question::Number {
            options: number_options(raw_options, &options_path, errors),
        },
        QuestionType::Scale => Question::Scale {
            options: number_options(raw_options, &options_path, errors),
        },
        QuestionType::Date => Question::Date {
            options: date_options(raw_options, &options_path, errors),
        },
    };
    Some(question)
}

fn parse_question_type(raw: &str) -> Option<QuestionType> {
    match raw {
        "single_choice" => Some(QuestionType::SingleChoice),
        "multiple_choice" => Some(QuestionType::MultipleChoice),
        "text" => Some(QuestionType::Text),
        "number" => Some(QuestionType::Number),
        "date" => Some(QuestionType::Date),
        "scale" => Some(QuestionType::Scale),
        _ => None,
    }
}

fn build_choices(
    value: Option<&Value>,
    step_path: &str,
    step_id: Uuid,
    by_order: &HashMap<u32, Uuid>,
    errors: &mut ValidationErrors,
) -> Vec<Choice> {
    let path = format!("{step_path}.choices");
    let items = match value {
        Some(Value::Array(items)) if !items.is_empty() => items,
        None | Some(Value::Null) | Some(Value::Array(_)) => {
            errors.add(&path, "Provide at least one choice.");
            return Vec::new();
        }
        Some(_) => {
            errors.add(&path, "choices must be a list.");
            return Vec::new();
        }
    };

    let mut choices = Vec::with_capacity(items.len());
    for (j, item) in items.iter().enumerate() {
        let choice_path = format!("{path}.{j}");
        let Some(obj) = item.as_object() else {
            errors.add(&choice_path, "Each choice must be a mapping.");
            continue;
        };
        reject_unknown(obj, CHOICE_KEYS, &choice_path, errors);

        let label = required_token(obj, "label", &choice_path, "Choice label", errors);
        let value = required_token(obj, "value", &choice_path, "Choice value", errors);
        let order = optional_u32(obj, "order", &choice_path, 1, errors);

        let optional_next_step = match (
            is_present(obj.get("next_step")),
            is_present(obj.get("optional_next_step")),
        ) {
            (true, true) => {
                errors.add(
                    format!("{choice_path}.next_step"),
                    "Use either next_step or optional_next_step, not both.",
                );
                None
            }
            (true, false) => resolve_target(obj, "next_step", &choice_path, by_order, errors),
            (false, true) => {
                resolve_target(obj, "optional_next_step", &choice_path, by_order, errors)
            }
            (false, false) => None,
        };

        choices.push(Choice {
            id: Uuid::new_v4(),
            step_id,
            label,
            value,
            order,
            optional_next_step,
        });
    }
    choices
}

fn resolve_target(
    obj: &Map<String, Value>,
    key: &str,
    choice_path: &str,
    by_order: &HashMap<u32, Uuid>,
    errors: &mut ValidationErrors,
) -> Option<Uuid> {
    let path = format!("{choice_path}.{key}");
    let order = optional_u32(obj, key, choice_path, 1, errors)?;
    match by_order.get(&order) {
        Some(id) => Some(*id),
        None => {
            errors.add(&path, format!("{key} {order} does not match any step order."));
            None
        }
    }
}

fn choice_options(
    value: Option<&Value>,
    path: &str,
    errors: &mut ValidationErrors,
) -> ChoiceOptions {
    let Some(map) = options_map(value, path, CHOICE_OPTION_KEYS, errors) else {
        return ChoiceOptions::default();
    };
    let options = ChoiceOptions {
        min_choices: optional_u32(map, "min_choices", path, 0, errors),
        max_choices: optional_u32(map, "max_choices", path, 1, errors),
        allow_other: optional_bool(map, "allow_other", path, errors),
        other_label: optional_string(map, "other_label", &format!("{path}.other_label"), errors),
        optional: optional_bool(map, "optional", path, errors),
    };
    if let (Some(min), Some(max)) = (options.min_choices, options.max_choices)
        && min > max
    {
        errors.add(
            format!("{path}.min_choices"),
            "min_choices must be less than or equal to max_choices.",
        );
    }
    options
}

fn text_options(value: Option<&Value>, path: &str, errors: &mut ValidationErrors) -> TextOptions {
    let Some(map) = options_map(value, path, TEXT_OPTION_KEYS, errors) else {
        return TextOptions::default();
    };
    TextOptions {
        placeholder: optional_string(map, "placeholder", &format!("{path}.placeholder"), errors),
        max_length: optional_u32(map, "max_length", path, 1, errors),
        optional: optional_bool(map, "optional", path, errors),
    }
}

fn number_options(
    value: Option<&Value>,
    path: &str,
    errors: &mut ValidationErrors,
) -> NumberOptions {
    let Some(map) = options_map(value, path, NUMBER_OPTION_KEYS, errors) else {
        return NumberOptions::default();
    };
    let options = NumberOptions {
        min: optional_f64(map, "min", path, errors),
        max: optional_f64(map, "max", path, errors),
        step: optional_f64(map, "step", path, errors),
        optional: optional_bool(map, "optional", path, errors),
    };
    if let (Some(min), Some(max)) = (options.min, options.max)
        && min > max
    {
        errors.add(
            format!("{path}.min"),
            "min must be less than or equal to max.",
        );
    }
    if let Some(step) = options.step
        && step <= 0.0
    {
        errors.add(format!("{path}.step"), "step must be greater than 0.");
    }
    options
}

fn date_options(value: Option<&Value>, path: &str, errors: &mut ValidationErrors) -> DateOptions {
    let Some(map) = options_map(value, path, DATE_OPTION_KEYS, errors) else {
        return DateOptions::default();
    };
    let options = DateOptions {
        min: optional_date_bound(map, "min", path, errors),
        max: optional_date_bound(map, "max", path, errors),
        format: match map.get("format") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s == "YYYY-MM-DD" => Some(DateFormat::IsoDate),
            Some(_) => {
                errors.add(format!("{path}.format"), "format must be 'YYYY-MM-DD'.");
                None
            }
        },
        optional: optional_bool(map, "optional", path, errors),
    };
    if let (Some(DateBound::On(min)), Some(DateBound::On(max))) = (options.min, options.max)
        && min > max
    {
        errors.add(
            format!("{path}.min"),
            "min must be on or before max.",
        );
    }
    options
}

/// The options object, if any, after rejecting keys outside `allowed`.
fn options_map<'a>(
    value: Option<&'a Value>,
    path: &str,
    allowed: &[&str],
    errors: &mut ValidationErrors,
) -> Option<&'a Map<String, Value>> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => {
            reject_unknown(map, allowed, path, errors);
            Some(map)
        }
        Some(_) => {
            errors.add(path, "options must be a mapping.");
            None
        }
    }
}

fn reject_unknown(
    obj: &Map<String, Value>,
    allowed: &[&str],
    path: &str,
    errors: &mut ValidationErrors,
) {
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            errors.add(path, format!("unknown field `{key}`"));
        }
    }
}

fn is_present(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null))
}

fn as_positive_u32(value: &Value, min: u32) -> Option<u32> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n >= min)
}

fn optional_string(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.add(path, format!("{key} must be a string."));
            None
        }
    }
}

fn required_token(
    obj: &Map<String, Value>,
    key: &str,
    parent: &str,
    what: &str,
    errors: &mut ValidationErrors,
) -> String {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) => {
            errors.add(format!("{parent}.{key}"), format!("{what} cannot be empty."));
            String::new()
        }
        None | Some(Value::Null) => {
            errors.add(format!("{parent}.{key}"), format!("{what} is required."));
            String::new()
        }
        Some(_) => {
            errors.add(format!("{parent}.{key}"), format!("{what} must be a string."));
            String::new()
        }
    }
}

fn optional_u32(
    obj: &Map<String, Value>,
    key: &str,
    parent: &str,
    min: u32,
    errors: &mut ValidationErrors,
) -> Option<u32> {
    let value = obj.get(key).filter(|v| !v.is_null())?;
    let parsed = as_positive_u32(value, min);
    if parsed.is_none() {
        errors.add(
            format!("{parent}.{key}"),
            format!("{key} must be an integer >= {min}."),
        );
    }
    parsed
}

fn optional_f64(
    obj: &Map<String, Value>,
    key: &str,
    parent: &str,
    errors: &mut ValidationErrors,
) -> Option<f64> {
    let value = obj.get(key).filter(|v| !v.is_null())?;
    let parsed = value.as_f64().filter(|n| n.is_finite());
    if parsed.is_none() {
        errors.add(format!("{parent}.{key}"), format!("{key} must be a number."));
    }
    parsed
}

fn optional_bool(
    obj: &Map<String, Value>,
    key: &str,
    parent: &str,
    errors: &mut ValidationErrors,
) -> Option<bool> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            errors.add(format!("{parent}.{key}"), format!("{key} must be a boolean."));
            None
        }
    }
}

fn optional_date_bound(
    obj: &Map<String, Value>,
    key: &str,
    parent: &str,
    errors: &mut ValidationErrors,
) -> Option<DateBound> {
    let path = format!("{parent}.{key}");
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => match DateBound::try_from(s.clone()) {
            Ok(bound) => Some(bound),
            Err(_) => {
                errors.add(
                    &path,
                    format!("{key} must be 'today' or a valid date in YYYY-MM-DD format."),
                );
                None
            }
        },
        Some(_) => {
            errors.add(
                &path,
                format!("{key} must be 'today' or a valid date in YYYY-MM-DD format."),
            );
            None
        }
    }
}
