use std::collections::HashSet;

use super::types::{AnswerMap, Quiz, QuizKind, ResultMode, Survey, WarningItem};

/// Checks the authoring invariants of a formatted survey. Problems are reported, never fixed.
pub fn validate_survey(survey: &Survey) -> Vec<WarningItem> {
    let mut warnings = Vec::new();

    let mut seen = HashSet::new();
    for quiz in &survey.quizzes {
        if !seen.insert(quiz.id.as_str()) {
            warnings.push(WarningItem {
                code: "DUPLICATE_QUIZ_ID".to_string(),
                message: format!("Quiz id '{}' is used more than once.", quiz.id),
                details: serde_json::json!({ "quizId": quiz.id }),
            });
        }
        warnings.extend(dragger_warnings(quiz));
    }

    if survey.results.declared_selected_tags > survey.results.selected_tags.len() {
        warnings.push(WarningItem {
            code: "TOO_MANY_SELECTED_TAGS".to_string(),
            message: format!(
                "Survey selects {} tag categories, only the first {} are used.",
                survey.results.declared_selected_tags,
                survey.results.selected_tags.len()
            ),
            details: serde_json::json!({ "selectedTags": survey.results.selected_tags }),
        });
    }

    if !survey.tag_categories.is_empty() {
        for tag_id in survey.results.selected_tag_ids() {
            if !survey.tag_categories.iter().any(|c| c.id == tag_id) {
                warnings.push(WarningItem {
                    code: "UNKNOWN_TAG_CATEGORY".to_string(),
                    message: format!("Selected tag category '{tag_id}' is not defined."),
                    details: serde_json::json!({ "tagId": tag_id }),
                });
            }
        }
    }

    if survey.result_mode() == ResultMode::Score {
        for result in survey.results.list.iter().filter(|r| r.range.is_none()) {
            warnings.push(WarningItem {
                code: "MISSING_RANGE".to_string(),
                message: format!(
                    "Result '{}' has no score range and can never be matched by score.",
                    result.id
                ),
                details: serde_json::json!({ "resultId": result.id }),
            });
        }
    }

    warnings
}

fn dragger_warnings(quiz: &Quiz) -> Vec<WarningItem> {
    let QuizKind::Dragger {
        choices,
        left,
        right,
    } = &quiz.kind
    else {
        return Vec::new();
    };
    choices
        .iter()
        .filter(|card| card.answer != left.id && card.answer != right.id)
        .map(|card| WarningItem {
            code: "INVALID_DRAGGER_ANSWER".to_string(),
            message: format!(
                "Card '{}' in quiz '{}' answers '{}', which is neither side.",
                card.id, quiz.id, card.answer
            ),
            details: serde_json::json!({
              "quizId": quiz.id,
              "choiceId": card.id,
              "answer": card.answer,
              "sides": [left.id, right.id],
            }),
        })
        .collect()
}

/// Reports dragger answers recording more cards than the quiz presents.
pub fn check_answer_bounds(quizzes: &[Quiz], answers: &AnswerMap) -> Vec<WarningItem> {
    quizzes
        .iter()
        .filter_map(|quiz| {
            let QuizKind::Dragger { choices, .. } = &quiz.kind else {
                return None;
            };
            let answered = answers.get(&quiz.id).map_or(0, |a| a.values.len());
            if answered <= choices.len() {
                return None;
            }
            Some(WarningItem {
                code: "ANSWER_EXCEEDS_CHOICES".to_string(),
                message: format!(
                    "Answer for quiz '{}' records {} cards but only {} exist.",
                    quiz.id,
                    answered,
                    choices.len()
                ),
                details: serde_json::json!({ "quizId": quiz.id }),
            })
        })
        .collect()
}
