use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type QuizId = String;
pub type ResultId = String;
pub type AnswerMap = HashMap<QuizId, AnswerValue>;

/// Tag category id to tag labels, kept in stored key order.
pub type TagMap = IndexMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuizMode {
    Page,
    Selection,
    Sort,
    Fill,
    Slider,
    OneInTwo,
    Dragger,
}

impl QuizMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "page" => Some(Self::Page),
            "selection" => Some(Self::Selection),
            "sort" => Some(Self::Sort),
            "fill" => Some(Self::Fill),
            "slider" => Some(Self::Slider),
            "oneInTwo" => Some(Self::OneInTwo),
            "dragger" => Some(Self::Dragger),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Selection => "selection",
            Self::Sort => "sort",
            Self::Fill => "fill",
            Self::Slider => "slider",
            Self::OneInTwo => "oneInTwo",
            Self::Dragger => "dragger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedChoice {
    pub id: String,
    pub title: String,
    pub tags: TagMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragCard {
    pub id: String,
    pub title: String,
    /// Id of the side (`left.id` or `right.id`) this card belongs to.
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragSide {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum QuizKind {
    Page,
    Selection {
        choices: Vec<Choice>,
        max_selection: Option<u32>,
    },
    Sort {
        choices: Vec<Choice>,
    },
    Fill {
        placeholder: Option<String>,
    },
    Slider {
        min: f64,
        max: f64,
    },
    OneInTwo {
        choices: Vec<TaggedChoice>,
    },
    Dragger {
        choices: Vec<DragCard>,
        left: DragSide,
        right: DragSide,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    #[serde(flatten)]
    pub kind: QuizKind,
}

impl Quiz {
    pub fn mode(&self) -> QuizMode {
        match self.kind {
            QuizKind::Page => QuizMode::Page,
            QuizKind::Selection { .. } => QuizMode::Selection,
            QuizKind::Sort { .. } => QuizMode::Sort,
            QuizKind::Fill { .. } => QuizMode::Fill,
            QuizKind::Slider { .. } => QuizMode::Slider,
            QuizKind::OneInTwo { .. } => QuizMode::OneInTwo,
            QuizKind::Dragger { .. } => QuizMode::Dragger,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerValue {
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: String,
    #[serde(default)]
    pub answers: AnswerMap,
    #[serde(default)]
    pub result_id: Option<ResultId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResult {
    pub id: ResultId,
    pub title: String,
    pub tags: TagMap,
    pub range: Option<ScoreRange>,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultMode {
    Tag,
    Score,
}

impl ResultMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Score => "score",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResults {
    pub mode: Option<ResultMode>,
    pub list: Vec<SurveyResult>,
    /// First and second tag category slots. A null or blank stored slot stays `None`
    /// so the second category never moves into the first position.
    pub selected_tags: [Option<String>; 2],
    /// Number of entries in the stored `selectedTags` array before truncation.
    #[serde(skip)]
    pub declared_selected_tags: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCategory {
    pub id: String,
    pub title: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: String,
    pub title: String,
    pub quizzes: Vec<Quiz>,
    pub results: SurveyResults,
    pub tag_categories: Vec<TagCategory>,
}

impl SurveyResults {
    /// The set selected tag category ids, first slot first.
    pub fn selected_tag_ids(&self) -> impl Iterator<Item = &str> {
        self.selected_tags.iter().flatten().map(String::as_str)
    }
}

impl Survey {
    pub fn result_mode(&self) -> ResultMode {
        if let Some(mode) = self.results.mode {
            return mode;
        }
        let has_one_in_two = self
            .quizzes
            .iter()
            .any(|q| q.mode() == QuizMode::OneInTwo);
        if has_one_in_two && self.results.selected_tag_ids().next().is_some() {
            ResultMode::Tag
        } else {
            ResultMode::Score
        }
    }

    pub fn find_result(&self, result_id: &str) -> Option<&SurveyResult> {
        self.results.list.iter().find(|r| r.id == result_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningItem {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}
