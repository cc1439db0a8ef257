use indexmap::IndexMap;
use serde::Serialize;

use crate::survey::types::{AnswerMap, Quiz, QuizKind};

/// How many times one tag label was attached to the respondent's choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagResult {
    pub number: usize,
    pub tag_id: String,
    pub tag: String,
}

/// The labels sharing the highest count within one tag category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagTier {
    pub tag_id: String,
    pub tags: Vec<String>,
}

/// Counts the tags of every chosen oneInTwo option, most frequent first.
///
/// Iteration follows stored order: quizzes, then each quiz's chosen choices, then tag
/// categories, then labels. The sort is stable, so equal counts keep that first-seen order.
/// A choice id repeated in `values` counts once.
pub fn tally_tags(quizzes: &[Quiz], answers: &AnswerMap) -> Vec<TagResult> {
    let mut counts: IndexMap<(String, String), usize> = IndexMap::new();

    for quiz in quizzes {
        let QuizKind::OneInTwo { choices } = &quiz.kind else {
            continue;
        };
        let Some(answer) = answers.get(&quiz.id) else {
            continue;
        };
        let chosen = choices
            .iter()
            .filter(|choice| answer.values.iter().any(|v| *v == choice.id));
        for choice in chosen {
            for (tag_id, labels) in &choice.tags {
                for label in labels.iter().filter(|l| !l.is_empty()) {
                    *counts.entry((tag_id.clone(), label.clone())).or_insert(0) += 1;
                }
            }
        }
    }

    let mut tally = counts
        .into_iter()
        .map(|((tag_id, tag), number)| TagResult { number, tag_id, tag })
        .collect::<Vec<_>>();
    tally.sort_by(|a, b| b.number.cmp(&a.number));
    tally
}

/// Keeps the records of `tag_id` whose count equals the first such record's count.
/// Expects `sorted` in the order produced by [`tally_tags`].
pub fn filter_tag_results(sorted: &[TagResult], tag_id: &str) -> Vec<TagResult> {
    let mut matching = sorted.iter().filter(|t| t.tag_id == tag_id);
    let Some(first) = matching.next() else {
        return Vec::new();
    };
    let top = first.number;
    std::iter::once(first)
        .chain(matching.filter(|t| t.number == top))
        .cloned()
        .collect()
}

pub fn top_tier(sorted: &[TagResult], tag_id: &str) -> Option<TagTier> {
    let tier = filter_tag_results(sorted, tag_id);
    if tier.is_empty() {
        return None;
    }
    Some(TagTier {
        tag_id: tag_id.to_string(),
        tags: tier.into_iter().map(|t| t.tag).collect(),
    })
}
