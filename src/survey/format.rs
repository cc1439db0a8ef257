use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::Error;
use crate::util::text::{clean_label, strip_html};

use super::types::{
    Answer, AnswerMap, AnswerValue, Choice, Component, DragCard, DragSide, Quiz, QuizKind,
    QuizMode, ResultMode, ScoreRange, Survey, SurveyResult, SurveyResults, TagCategory, TagMap,
    TaggedChoice,
};

const MAX_SELECTED_TAGS: usize = 2;

pub fn format_survey(raw: &str) -> Result<Survey, Error> {
    let root: Value = serde_json::from_str(raw)?;
    format_survey_value(&root)
}

pub fn format_survey_value(root: &Value) -> Result<Survey, Error> {
    let obj = root
        .as_object()
        .ok_or_else(|| Error::Format("Survey document must be a JSON object".to_string()))?;

    let id = str_field(obj, "id").unwrap_or_default();
    let title = text_field(obj, "title");

    let quizzes = collect_entries(obj.get("quizzes"))
        .into_iter()
        .filter_map(|(key, value)| format_quiz_entry(key, value))
        .collect::<Vec<Quiz>>();

    let results = format_results(obj.get("results"));
    let tag_categories = collect_entries(obj.get("tags"))
        .into_iter()
        .filter_map(|(key, value)| format_tag_category(key, value))
        .collect();

    debug!(
        survey = %id,
        quizzes = quizzes.len(),
        results = results.list.len(),
        "formatted survey document"
    );

    Ok(Survey {
        id,
        title,
        quizzes,
        results,
        tag_categories,
    })
}

/// Normalizes one stored quiz. Quizzes without an id or with an unknown mode are skipped.
pub fn format_quiz(value: &Value) -> Option<Quiz> {
    format_quiz_entry(None, value)
}

fn format_quiz_entry(key: Option<&str>, value: &Value) -> Option<Quiz> {
    let obj = value.as_object()?;
    let Some(id) = str_field(obj, "id").or_else(|| key.map(str::to_string)) else {
        warn!("skipping quiz without id");
        return None;
    };
    let raw_mode = obj.get("mode").and_then(Value::as_str).unwrap_or("");
    let Some(mode) = QuizMode::parse(raw_mode) else {
        warn!(quiz = %id, mode = raw_mode, "skipping quiz with unknown mode");
        return None;
    };
    let title = text_field(obj, "title");
    let choices = obj.get("choices");

    let kind = match mode {
        QuizMode::Page => QuizKind::Page,
        QuizMode::Selection => QuizKind::Selection {
            choices: collect_entries(choices)
                .into_iter()
                .filter_map(|(key, v)| format_choice(key, v))
                .collect(),
            max_selection: obj
                .get("maxSelection")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok()),
        },
        QuizMode::Sort => QuizKind::Sort {
            choices: collect_entries(choices)
                .into_iter()
                .filter_map(|(key, v)| format_choice(key, v))
                .collect(),
        },
        QuizMode::Fill => QuizKind::Fill {
            placeholder: str_field(obj, "placeholder"),
        },
        QuizMode::Slider => QuizKind::Slider {
            min: obj.get("min").and_then(number_value).unwrap_or(0.0),
            max: obj.get("max").and_then(number_value).unwrap_or(100.0),
        },
        QuizMode::OneInTwo => QuizKind::OneInTwo {
            choices: collect_entries(choices)
                .into_iter()
                .filter_map(|(key, v)| format_tagged_choice(key, v))
                .collect(),
        },
        QuizMode::Dragger => QuizKind::Dragger {
            choices: collect_entries(choices)
                .into_iter()
                .filter_map(|(key, v)| format_drag_card(key, v))
                .collect(),
            left: format_side(obj.get("left")),
            right: format_side(obj.get("right")),
        },
    };

    Some(Quiz { id, title, kind })
}

fn format_choice(key: Option<&str>, value: &Value) -> Option<Choice> {
    let obj = value.as_object()?;
    Some(Choice {
        id: str_field(obj, "id").or_else(|| key.map(str::to_string))?,
        title: text_field(obj, "title"),
    })
}

fn format_tagged_choice(key: Option<&str>, value: &Value) -> Option<TaggedChoice> {
    let obj = value.as_object()?;
    Some(TaggedChoice {
        id: str_field(obj, "id").or_else(|| key.map(str::to_string))?,
        title: text_field(obj, "title"),
        tags: format_tags(obj.get("tags")),
    })
}

fn format_drag_card(key: Option<&str>, value: &Value) -> Option<DragCard> {
    let obj = value.as_object()?;
    Some(DragCard {
        id: str_field(obj, "id").or_else(|| key.map(str::to_string))?,
        title: text_field(obj, "title"),
        answer: str_field(obj, "answer").unwrap_or_default(),
    })
}

fn format_side(value: Option<&Value>) -> DragSide {
    let obj = value.and_then(Value::as_object);
    DragSide {
        id: obj.and_then(|o| str_field(o, "id")).unwrap_or_default(),
        title: obj.map(|o| text_field(o, "title")).unwrap_or_default(),
    }
}

/// Tag category id to labels. A single string label is accepted in place of a list.
/// Labels are trimmed, and blank or non-string labels are dropped.
pub fn format_tags(value: Option<&Value>) -> TagMap {
    let Some(obj) = value.and_then(Value::as_object) else {
        return TagMap::new();
    };
    let mut tags = TagMap::new();
    for (tag_id, labels) in obj {
        let labels = match labels {
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(clean_label)
                .collect::<Vec<String>>(),
            Value::String(label) => clean_label(label).into_iter().collect(),
            _ => Vec::new(),
        };
        tags.insert(tag_id.clone(), labels);
    }
    tags
}

fn format_results(value: Option<&Value>) -> SurveyResults {
    let obj = value.and_then(Value::as_object);

    let mode = obj
        .and_then(|o| o.get("mode"))
        .and_then(Value::as_str)
        .and_then(|m| match m {
            "tag" => Some(ResultMode::Tag),
            "score" => Some(ResultMode::Score),
            other => {
                warn!(mode = other, "ignoring unknown results mode");
                None
            }
        });

    let list = collect_entries(obj.and_then(|o| o.get("list")))
        .into_iter()
        .filter_map(|(key, v)| format_result(key, v))
        .collect();

    let declared = obj
        .and_then(|o| o.get("selectedTags"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let declared_selected_tags = declared.len();
    if declared_selected_tags > MAX_SELECTED_TAGS {
        warn!(
            declared = declared_selected_tags,
            "survey selects more than {MAX_SELECTED_TAGS} tag categories, extra ones ignored"
        );
    }
    // Slots stay positional: a null or blank first entry leaves the first category unset.
    let slot = |index: usize| {
        declared
            .get(index)
            .and_then(Value::as_str)
            .and_then(clean_label)
    };
    let selected_tags = [slot(0), slot(1)];

    SurveyResults {
        mode,
        list,
        selected_tags,
        declared_selected_tags,
    }
}

fn format_result(key: Option<&str>, value: &Value) -> Option<SurveyResult> {
    let obj = value.as_object()?;
    let Some(id) = str_field(obj, "id").or_else(|| key.map(str::to_string)) else {
        warn!("skipping result without id");
        return None;
    };
    Some(SurveyResult {
        id,
        title: text_field(obj, "title"),
        tags: format_tags(obj.get("tags")),
        range: obj.get("range").and_then(format_range),
        components: obj
            .get("components")
            .map(format_components)
            .unwrap_or_default(),
    })
}

fn format_range(value: &Value) -> Option<ScoreRange> {
    let items = value.as_array()?;
    let min = items.first().and_then(number_value)?;
    let max = items.get(1).and_then(number_value)?;
    Some(ScoreRange { min, max })
}

/// Normalizes a result's display components into plain text and image references.
pub fn format_components(value: &Value) -> Vec<Component> {
    collect_entries(Some(value))
        .into_iter()
        .filter_map(|(_, v)| {
            let obj = v.as_object()?;
            let kind = str_field(obj, "type").unwrap_or_else(|| "text".to_string());
            let text = obj
                .get("text")
                .or_else(|| obj.get("content"))
                .and_then(Value::as_str)
                .map(strip_html)
                .filter(|t| !t.is_empty());
            let image = obj
                .get("image")
                .or_else(|| obj.get("src"))
                .and_then(Value::as_str)
                .and_then(clean_label);
            Some(Component { kind, text, image })
        })
        .collect()
}

fn format_tag_category(key: Option<&str>, value: &Value) -> Option<TagCategory> {
    let obj = value.as_object()?;
    let id = str_field(obj, "id").or_else(|| key.map(str::to_string))?;
    let labels = obj
        .get("tags")
        .or_else(|| obj.get("labels"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(clean_label)
                .collect::<Vec<String>>()
        })
        .unwrap_or_default();
    Some(TagCategory {
        id,
        title: text_field(obj, "title"),
        labels,
    })
}

pub fn format_answer(raw: &str) -> Result<Answer, Error> {
    let root: Value = serde_json::from_str(raw)?;
    format_answer_value(&root)
}

pub fn format_answer_value(root: &Value) -> Result<Answer, Error> {
    let obj = root
        .as_object()
        .ok_or_else(|| Error::Format("Answer document must be a JSON object".to_string()))?;
    Ok(Answer {
        id: str_field(obj, "id").unwrap_or_default(),
        answers: format_answer_map(obj.get("answers")),
        result_id: str_field(obj, "resultId"),
    })
}

pub fn format_answer_map(value: Option<&Value>) -> AnswerMap {
    let Some(obj) = value.and_then(Value::as_object) else {
        return AnswerMap::new();
    };
    obj.iter()
        .map(|(quiz_id, answer)| {
            let values = answer
                .get("values")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            (quiz_id.clone(), AnswerValue { values })
        })
        .collect()
}

/// Stored collections are either arrays or objects keyed by id; both keep their stored order.
fn collect_entries(value: Option<&Value>) -> Vec<(Option<&str>, &Value)> {
    match value {
        Some(Value::Array(items)) => items.iter().map(|v| (None, v)).collect(),
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (Some(k.as_str()), v)).collect(),
        _ => Vec::new(),
    }
}

fn str_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).and_then(clean_label)
}

fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .map(strip_html)
        .unwrap_or_default()
}

fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
