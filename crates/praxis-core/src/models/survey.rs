use std::fmt;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// A versioned survey definition owned by one practice.
///
/// Steps are stored in import order; navigation always goes through
/// [`Survey::ordered_steps`], never the raw vector order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Survey {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub version: u32,
    pub is_active: bool,
    pub practice_hash: String,
    pub steps: Vec<Step>,
    pub created_at: jiff::Timestamp,
}

impl Survey {
    pub fn step(&self, id: Uuid) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Steps sorted ascending by `order`.
    pub fn ordered_steps(&self) -> Vec<&Step> {
        let mut steps: Vec<&Step> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.order);
        steps
    }

    pub fn first_step(&self) -> Option<&Step> {
        self.steps.iter().min_by_key(|s| s.order)
    }
}

/// One screen of a survey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub order: u32,
    pub title: Option<String>,
    pub content: Option<String>,
    pub kind: StepKind,
}

impl Step {
    pub fn question(&self) -> Option<&Question> {
        match &self.kind {
            StepKind::Dialog => None,
            StepKind::Question { question } => Some(question),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step_type", rename_all = "snake_case")]
pub enum StepKind {
    /// Informational screen. Acknowledged, never answered.
    Dialog,
    Question { question: Question },
}

/// A question, one variant per question type, each with its own options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "question_type", rename_all = "snake_case")]
pub enum Question {
    SingleChoice {
        options: ChoiceOptions,
        choices: Vec<Choice>,
    },
    MultipleChoice {
        options: ChoiceOptions,
        choices: Vec<Choice>,
    },
    Text {
        options: TextOptions,
    },
    Number {
        options: NumberOptions,
    },
    Scale {
        options: NumberOptions,
    },
    Date {
        options: DateOptions,
    },
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        match self {
            Question::SingleChoice { .. } => QuestionType::SingleChoice,
            Question::MultipleChoice { .. } => QuestionType::MultipleChoice,
            Question::Text { .. } => QuestionType::Text,
            Question::Number { .. } => QuestionType::Number,
            Question::Scale { .. } => QuestionType::Scale,
            Question::Date { .. } => QuestionType::Date,
        }
    }

    /// Choices of a choice question; empty for every other type.
    pub fn choices(&self) -> &[Choice] {
        match self {
            Question::SingleChoice { choices, .. } | Question::MultipleChoice { choices, .. } => {
                choices
            }
            _ => &[],
        }
    }

    pub fn choice(&self, id: Uuid) -> Option<&Choice> {
        self.choices().iter().find(|c| c.id == id)
    }

    /// A question is required only when its options say `optional: false`.
    /// An absent `optional` key leaves the answer free to be empty.
    pub fn is_required(&self) -> bool {
        let optional = match self {
            Question::SingleChoice { options, .. } | Question::MultipleChoice { options, .. } => {
                options.optional
            }
            Question::Text { options } => options.optional,
            Question::Number { options } | Question::Scale { options } => options.optional,
            Question::Date { options } => options.optional,
        };
        optional == Some(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    SingleChoice,
    Text,
    Number,
    Date,
    Scale,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::SingleChoice => "single_choice",
            QuestionType::Text => "text",
            QuestionType::Number => "number",
            QuestionType::Date => "date",
            QuestionType::Scale => "scale",
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionType::SingleChoice | QuestionType::MultipleChoice)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable option of a choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: Uuid,
    pub step_id: Uuid,
    pub label: String,
    pub value: String,
    pub order: Option<u32>,
    /// Overrides ordering-based navigation when this choice is selected.
    pub optional_next_step: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChoiceOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_choices: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_choices: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_other: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// Options shared by number and scale questions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NumberOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<DateBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<DateBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<DateFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    #[serde(rename = "YYYY-MM-DD")]
    IsoDate,
}

/// A date limit: either the literal `today` or a fixed calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DateBound {
    Today,
    On(Date),
}

impl DateBound {
    pub fn resolve(&self, today: Date) -> Date {
        match self {
            DateBound::Today => today,
            DateBound::On(date) => *date,
        }
    }
}

impl TryFrom<String> for DateBound {
    type Error = CoreError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        if raw == "today" {
            return Ok(DateBound::Today);
        }
        parse_iso_date(&raw)
            .map(DateBound::On)
            .ok_or(CoreError::InvalidDateBound(raw))
    }
}

impl From<DateBound> for String {
    fn from(bound: DateBound) -> String {
        match bound {
            DateBound::Today => "today".to_string(),
            DateBound::On(date) => date.to_string(),
        }
    }
}

/// Parse a strict `YYYY-MM-DD` calendar date.
///
/// Rejects other ISO 8601 spellings and impossible dates such as `2025-02-30`.
pub fn parse_iso_date(raw: &str) -> Option<Date> {
    let bytes = raw.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }
    raw.parse::<Date>().ok()
}
