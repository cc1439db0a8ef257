use serde::Serialize;

use crate::survey::types::{AnswerMap, Quiz, QuizKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub score: usize,
    pub total: usize,
}

impl Score {
    /// `None` when no cards were presented.
    pub fn ratio(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.score as f64 / self.total as f64)
        }
    }
}

/// Tallies dragger quizzes: `total` counts presented cards, `score` counts the card ids
/// recorded in each answer. Correctness of the recorded drags is not re-checked.
pub fn compute_score(quizzes: &[Quiz], answers: &AnswerMap) -> Score {
    quizzes
        .iter()
        .filter_map(|quiz| match &quiz.kind {
            QuizKind::Dragger { choices, .. } => Some((quiz, choices.len())),
            _ => None,
        })
        .fold(Score::default(), |acc, (quiz, cards)| Score {
            score: acc.score + answers.get(&quiz.id).map_or(0, |a| a.values.len()),
            total: acc.total + cards,
        })
}

/// Whole-number percentage for display, `"—"` when there is nothing to divide by.
pub fn format_percent(score: &Score) -> String {
    match score.ratio() {
        Some(ratio) => format!("{:.0}%", ratio * 100.0),
        None => "—".to_string(),
    }
}
