use serde::Serialize;
use tracing::debug;

use crate::survey::types::{
    AnswerMap, Quiz, ResultId, ResultMode, ScoreRange, Survey, SurveyResult,
};

use super::pick::{pick_one, RandomPick};
use super::score::{compute_score, Score};
use super::tags::{tally_tags, top_tier, TagTier};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub mode: ResultMode,
    pub result_id: Option<ResultId>,
    pub score: Score,
    /// Top tiers of the selected tag categories, in selection order.
    pub tiers: Vec<TagTier>,
}

fn intersects(result: &SurveyResult, tier: &TagTier) -> bool {
    result
        .tags
        .get(&tier.tag_id)
        .is_some_and(|labels| labels.iter().any(|l| tier.tags.contains(l)))
}

/// Narrows `results` to those sharing a top-tier tag with the first selected category,
/// then, when more than one remains, with the second. An empty return means nothing
/// could be narrowed and the caller should pick among every result.
pub fn get_final_results<'a>(
    results: &'a [SurveyResult],
    first: Option<&TagTier>,
    second: Option<&TagTier>,
) -> Vec<&'a SurveyResult> {
    let Some(first) = first.filter(|t| !t.tags.is_empty()) else {
        return Vec::new();
    };
    let stage_one = results
        .iter()
        .filter(|r| intersects(r, first))
        .collect::<Vec<&SurveyResult>>();

    let second = second.filter(|t| !t.tags.is_empty());
    if stage_one.len() > 1 {
        if let Some(second) = second {
            let stage_two = stage_one
                .iter()
                .copied()
                .filter(|r| intersects(r, second))
                .collect::<Vec<&SurveyResult>>();
            if !stage_two.is_empty() {
                return stage_two;
            }
        }
    }
    stage_one
}

/// Resolves a tag-mode outcome. `None` only when `results` is empty.
///
/// `selected_tag_ids` is positional: an unset first slot narrows nothing even when the
/// second one is set.
pub fn resolve_result<P>(
    quizzes: &[Quiz],
    answers: &AnswerMap,
    results: &[SurveyResult],
    selected_tag_ids: &[Option<String>],
    picker: &mut P,
) -> Option<ResultId>
where
    P: RandomPick + ?Sized,
{
    let tiers = selected_tiers(quizzes, answers, selected_tag_ids);
    pick_tagged(results, &tiers, picker)
}

fn selected_tiers(
    quizzes: &[Quiz],
    answers: &AnswerMap,
    selected_tag_ids: &[Option<String>],
) -> Vec<Option<TagTier>> {
    let sorted = tally_tags(quizzes, answers);
    selected_tag_ids
        .iter()
        .take(2)
        .map(|slot| slot.as_deref().and_then(|tag_id| top_tier(&sorted, tag_id)))
        .collect()
}

fn pick_tagged<P>(
    results: &[SurveyResult],
    tiers: &[Option<TagTier>],
    picker: &mut P,
) -> Option<ResultId>
where
    P: RandomPick + ?Sized,
{
    let first = tiers.first().and_then(Option::as_ref);
    let second = tiers.get(1).and_then(Option::as_ref);
    let narrowed = get_final_results(results, first, second);
    let candidates = if narrowed.is_empty() {
        debug!(results = results.len(), "no tag match, picking among all results");
        results.iter().collect::<Vec<&SurveyResult>>()
    } else {
        debug!(candidates = narrowed.len(), "picking among tag-matched results");
        narrowed
    };
    pick_one(&candidates, picker).map(|r| r.id.clone())
}

/// Zero-floor bands match `score < max`; every other band is `(min, max]`.
/// A score equal to the max of a zero-floor band therefore matches neither it nor
/// a following `(max, ..]` band.
pub fn band_matches(range: &ScoreRange, score: usize) -> bool {
    let score = score as f64;
    if range.min == 0.0 {
        score < range.max
    } else {
        score > range.min && score <= range.max
    }
}

/// First result in stored order whose band contains `score`.
pub fn select_by_score(results: &[SurveyResult], score: usize) -> Option<&SurveyResult> {
    results
        .iter()
        .find(|r| r.range.as_ref().is_some_and(|range| band_matches(range, score)))
}

pub fn resolve_by_score(
    quizzes: &[Quiz],
    answers: &AnswerMap,
    results: &[SurveyResult],
) -> Option<ResultId> {
    let score = compute_score(quizzes, answers);
    select_by_score(results, score.score).map(|r| r.id.clone())
}

/// Resolves the outcome for a finished respondent according to the survey's result mode.
pub fn resolve_for_survey<P>(survey: &Survey, answers: &AnswerMap, picker: &mut P) -> Resolution
where
    P: RandomPick + ?Sized,
{
    let mode = survey.result_mode();
    let score = compute_score(&survey.quizzes, answers);
    let results = &survey.results.list;

    let (result_id, tiers) = match mode {
        ResultMode::Tag => {
            let tiers = selected_tiers(&survey.quizzes, answers, &survey.results.selected_tags);
            let result_id = pick_tagged(results, &tiers, picker);
            (result_id, tiers.into_iter().flatten().collect())
        }
        ResultMode::Score => (
            select_by_score(results, score.score).map(|r| r.id.clone()),
            Vec::new(),
        ),
    };

    debug!(
        survey = %survey.id,
        mode = mode.as_str(),
        result = ?result_id,
        score = score.score,
        total = score.total,
        "resolved survey outcome"
    );

    Resolution {
        mode,
        result_id,
        score,
        tiers,
    }
}

#[cfg(test)]
mod tests {
    use super::{band_matches, get_final_results, resolve_result, select_by_score};
    use crate::survey::format::{format_answer_map, format_survey};
    use crate::survey::types::{ScoreRange, SurveyResult, TagMap};
    use crate::engine::tags::TagTier;

    fn result(id: &str, tags: &[(&str, &str)]) -> SurveyResult {
        SurveyResult {
            id: id.to_string(),
            title: id.to_uppercase(),
            tags: tags
                .iter()
                .map(|(tag_id, label)| (tag_id.to_string(), vec![label.to_string()]))
                .collect::<TagMap>(),
            range: None,
            components: vec![],
        }
    }

    fn banded(id: &str, min: f64, max: f64) -> SurveyResult {
        SurveyResult {
            range: Some(ScoreRange { min, max }),
            ..result(id, &[])
        }
    }

    fn tier(tag_id: &str, tags: &[&str]) -> TagTier {
        TagTier {
            tag_id: tag_id.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn ids(results: Vec<&SurveyResult>) -> Vec<&str> {
        results.into_iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn second_category_narrows_a_multi_candidate_first_stage() {
        let results = vec![
            result("r1", &[("cat1", "x")]),
            result("r2", &[("cat1", "x"), ("cat2", "y")]),
            result("r3", &[("cat1", "x"), ("cat2", "z")]),
        ];
        let first = tier("cat1", &["x"]);
        let second = tier("cat2", &["y"]);
        assert_eq!(ids(get_final_results(&results, Some(&first), None)), vec!["r1", "r2", "r3"]);
        assert_eq!(ids(get_final_results(&results, Some(&first), Some(&second))), vec!["r2"]);
    }

    #[test]
    fn single_first_stage_candidate_skips_second_category() {
        let results = vec![
            result("r1", &[("cat1", "x")]),
            result("r2", &[("cat1", "w"), ("cat2", "y")]),
        ];
        let first = tier("cat1", &["x"]);
        let second = tier("cat2", &["y"]);
        assert_eq!(ids(get_final_results(&results, Some(&first), Some(&second))), vec!["r1"]);
    }

    #[test]
    fn empty_second_stage_falls_back_to_first_stage() {
        let results = vec![
            result("r1", &[("cat1", "x")]),
            result("r2", &[("cat1", "x")]),
        ];
        let first = tier("cat1", &["x"]);
        let second = tier("cat2", &["y"]);
        assert_eq!(ids(get_final_results(&results, Some(&first), Some(&second))), vec!["r1", "r2"]);
    }

    #[test]
    fn missing_first_tier_narrows_nothing() {
        let results = vec![result("r1", &[("cat1", "x")])];
        let second = tier("cat2", &["y"]);
        assert!(get_final_results(&results, None, Some(&second)).is_empty());
        assert!(get_final_results(&results, Some(&tier("cat1", &[])), None).is_empty());
        assert!(get_final_results(&[], Some(&tier("cat1", &["x"])), None).is_empty());
    }

    #[test]
    fn zero_floor_band_excludes_its_max() {
        let low = ScoreRange { min: 0.0, max: 50.0 };
        let high = ScoreRange { min: 50.0, max: 100.0 };
        assert!(band_matches(&low, 0));
        assert!(band_matches(&low, 49));
        assert!(!band_matches(&low, 50));
        assert!(!band_matches(&high, 50));
        assert!(band_matches(&high, 51));
        assert!(band_matches(&high, 100));
        assert!(!band_matches(&high, 101));

        let results = vec![banded("low", 0.0, 50.0), banded("high", 50.0, 100.0)];
        assert!(select_by_score(&results, 50).is_none());
        assert_eq!(select_by_score(&results, 10).map(|r| r.id.as_str()), Some("low"));
    }

    #[test]
    fn no_matching_tag_picks_among_all_results() {
        let survey = format_survey(
            r#"{"quizzes":[{"id":"q1","mode":"oneInTwo","choices":[
                 {"id":"a","tags":{"cat1":["x"]}},{"id":"b","tags":{"cat1":["y"]}}]}],
               "results":{"selectedTags":["cat1"],"list":{
                 "r1":{"tags":{"cat1":["z"]}},"r2":{"tags":{"cat1":["w"]}}}}}"#,
        )
        .expect("format survey");
        let value = serde_json::json!({"q1": {"values": ["a"]}});
        let answers = format_answer_map(Some(&value));
        let mut seen = Vec::new();
        let mut last = |n: usize| {
            seen.push(n);
            n - 1
        };
        let picked = resolve_result(
            &survey.quizzes,
            &answers,
            &survey.results.list,
            &survey.results.selected_tags,
            &mut last,
        );
        assert_eq!(picked.as_deref(), Some("r2"));
        assert_eq!(seen, vec![2]);
    }

    #[test]
    fn unset_first_selected_tag_picks_among_all_results() {
        for selected in [r#"[null,"cat2"]"#, r#"["","cat2"]"#] {
            let raw = format!(
                r#"{{"quizzes":[{{"id":"q1","mode":"oneInTwo","choices":[
                     {{"id":"a","tags":{{"cat2":["y"]}}}},{{"id":"b","tags":{{"cat2":["x"]}}}}]}}],
                   "results":{{"selectedTags":{selected},"list":{{
                     "r1":{{"tags":{{"cat2":["x"]}}}},"r2":{{"tags":{{"cat2":["y"]}}}}}}}}}}"#
            );
            let survey = format_survey(&raw).expect("format survey");
            let value = serde_json::json!({"q1": {"values": ["a"]}});
            let answers = format_answer_map(Some(&value));
            let mut seen = Vec::new();
            let mut first = |n: usize| {
                seen.push(n);
                0
            };
            let picked = resolve_result(
                &survey.quizzes,
                &answers,
                &survey.results.list,
                &survey.results.selected_tags,
                &mut first,
            );
            assert_eq!(picked.as_deref(), Some("r1"));
            assert_eq!(seen, vec![survey.results.list.len()]);
        }
    }

    #[test]
    fn no_results_resolves_to_none() {
        let mut first = |_n: usize| 0;
        assert_eq!(resolve_result(&[], &Default::default(), &[], &[], &mut first), None);
    }
}
