use tracing::warn;

use crate::survey::types::{ResultId, SurveyResult, TagCategory, TagMap};
use crate::util::hash::sha256_hex;

const RESULT_ID_LEN: usize = 16;

/// Stable id for a combination of `(tag_id, label)` pairs.
pub fn result_id_for(combination: &[(&str, &str)]) -> ResultId {
    let key = combination
        .iter()
        .map(|(tag_id, label)| format!("{tag_id}.{label}"))
        .collect::<Vec<String>>()
        .join("|");
    sha256_hex(key.as_bytes())[..RESULT_ID_LEN].to_string()
}

/// One result per combination of labels across the selected categories, in catalogue order.
/// Unset slots contribute nothing.
pub fn generate_tag_results(
    categories: &[TagCategory],
    selected_tag_ids: &[Option<String>],
) -> Vec<SurveyResult> {
    let selected = selected_tag_ids
        .iter()
        .take(2)
        .flatten()
        .filter_map(|tag_id| {
            let category = categories.iter().find(|c| &c.id == tag_id);
            if category.is_none() {
                warn!(tag_id = %tag_id, "selected tag category is not defined, skipping");
            }
            category
        })
        .filter(|c| !c.labels.is_empty())
        .collect::<Vec<&TagCategory>>();

    if selected.is_empty() {
        return Vec::new();
    }

    let mut combinations: Vec<Vec<(&str, &str)>> = vec![Vec::new()];
    for category in selected.iter().copied() {
        combinations = combinations
            .into_iter()
            .flat_map(|prefix| {
                category.labels.iter().map(move |label| {
                    let mut next = prefix.clone();
                    next.push((category.id.as_str(), label.as_str()));
                    next
                })
            })
            .collect();
    }

    combinations
        .into_iter()
        .map(|combination| {
            let title = combination
                .iter()
                .map(|(_, label)| *label)
                .collect::<Vec<&str>>()
                .join(" / ");
            let tags = combination
                .iter()
                .map(|(tag_id, label)| (tag_id.to_string(), vec![label.to_string()]))
                .collect::<TagMap>();
            SurveyResult {
                id: result_id_for(&combination),
                title,
                tags,
                range: None,
                components: Vec::new(),
            }
        })
        .collect()
}
