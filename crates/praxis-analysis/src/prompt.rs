//! Clinical prompt assembly from a completed run.

use praxis_core::models::response::{Response, ResponseSet, ResponseValue, SelectedChoice};
use praxis_core::models::survey::{Step, Survey};

/// Render the survey and every answered question, in step order.
pub fn build_prompt(survey: &Survey, responses: &ResponseSet) -> String {
    let mut output = format!("# Survey: {}\n", survey.name);
    if let Some(description) = survey.description.as_deref().filter(|d| !d.trim().is_empty()) {
        output.push_str(&format!("{}\n", description.trim()));
    }
    output.push_str("\n## Patient responses\n");

    for step in survey.ordered_steps() {
        if step.question().is_none() {
            continue;
        }
        let Some(response) = responses.get(step.id) else {
            continue;
        };

        let title = step
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Step {}", step.order));
        output.push_str(&format!("\n### Question: {title}\n"));
        if let Some(content) = step.content.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            output.push_str(&format!("Context: {content}\n"));
        }
        output.push_str(&format!("Answer: {}\n", answer_text(step, response)));
    }
    output
}

/// Human-readable answer for one response.
pub fn answer_text(step: &Step, response: &Response) -> String {
    if response.is_skipped {
        return "(skipped)".to_string();
    }
    let Some(value) = &response.value else {
        return "(no answer)".to_string();
    };

    match value {
        ResponseValue::Text(text) => text.trim().to_string(),
        ResponseValue::Number(n) => n.to_string(),
        ResponseValue::Date(date) => date.to_string(),
        ResponseValue::Choice(selected) => {
            let linked = response
                .choice_id
                .and_then(|id| step.question()?.choice(id))
                .map(|c| c.label.clone());
            linked.unwrap_or_else(|| choice_label(step, selected))
        }
        ResponseValue::Choices(selected) => {
            let mut labels: Vec<String> = Vec::with_capacity(selected.len());
            for choice in selected {
                let label = choice_label(step, choice);
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
            if labels.is_empty() {
                "(no answer)".to_string()
            } else {
                labels.join(", ")
            }
        }
    }
}

fn choice_label(step: &Step, selected: &SelectedChoice) -> String {
    if let Some(choice) = step.question().and_then(|q| q.choice(selected.id)) {
        return choice.label.clone();
    }
    selected
        .label
        .clone()
        .or_else(|| selected.value.clone())
        .unwrap_or_else(|| selected.id.to_string())
}
