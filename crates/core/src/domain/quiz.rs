use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::answers::{FACE_KEY, TONE_KEY, UNDERTONE_KEY};
use crate::domain::product::Handle;

pub const DEFAULT_RESULTS_TITLE: &str = "Your best shade matches";

/// The whole quiz document: questions, matching rules and combos.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizConfig {
    pub questions: Vec<Question>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub combos: Vec<Combo>,
    #[serde(default = "default_results_title")]
    pub results_title: String,
}

fn default_results_title() -> String {
    DEFAULT_RESULTS_TITLE.to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default, rename = "type")]
    pub selection: SelectionType,
    #[serde(default)]
    pub options: Vec<QuizOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stops: Vec<String>,
}

/// Closed set of step layouts. Unknown layout names render as `Default`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    ImageGrid,
    Slider,
    ToneFaces,
    Undertone,
    #[default]
    #[serde(other)]
    Default,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionType {
    Multi,
    #[default]
    #[serde(other)]
    Single,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuizOption {
    pub value: ScalarValue,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<usize>,
}

impl QuizOption {
    /// Options without an explicit group belong to the first tone group.
    pub fn group_index(&self) -> usize {
        self.group.unwrap_or(0)
    }
}

/// Single-condition fallback rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub question_id: String,
    pub value: ScalarValue,
    #[serde(default)]
    pub recommend: Vec<Handle>,
}

/// Multi-condition rule; every `when` entry must hold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    #[serde(default)]
    pub when: IndexMap<String, ScalarValue>,
    #[serde(default)]
    pub recommend: Vec<Handle>,
}

/// A JSON scalar as written in the quiz document.
///
/// Values keep their original JSON type so the admin round-trip does not
/// rewrite numbers into strings. Matching always goes through
/// [`ScalarValue::as_key`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl ScalarValue {
    /// Canonical comparison form. Whole floats compare as integers, so
    /// `1.0` and `"1"` are equal.
    pub fn as_key(&self) -> String {
        match self {
            Self::Number(value) if !value.is_i64() && !value.is_u64() => value
                .as_f64()
                .filter(|float| float.is_finite() && float.fract() == 0.0 && float.abs() < 9.0e15)
                .map(|float| format!("{}", float as i64))
                .unwrap_or_else(|| value.to_string()),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Number(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    pub code: &'static str,
    pub message: String,
}

impl LintIssue {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl QuizConfig {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Advisory consistency checks. None of these stop the quiz from
    /// running; they flag rules and combos that can never match.
    pub fn lint(&self) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for question in &self.questions {
            if !seen.insert(question.id.as_str()) {
                issues.push(LintIssue::new(
                    "duplicate_question_id",
                    format!("question id `{}` is used more than once", question.id),
                ));
            }
            if question.options.is_empty() {
                issues.push(LintIssue::new(
                    "question_without_options",
                    format!("question `{}` has no options", question.id),
                ));
            }
            if question.layout == Layout::ToneFaces {
                if question.stops.is_empty() {
                    issues.push(LintIssue::new(
                        "tone_faces_without_stops",
                        format!("tone-faces question `{}` has no stops", question.id),
                    ));
                }
                for option in &question.options {
                    if option.group_index() >= question.stops.len().max(1) {
                        issues.push(LintIssue::new(
                            "face_group_out_of_range",
                            format!(
                                "face `{}` in question `{}` points at group {} but only {} stops exist",
                                option.value,
                                question.id,
                                option.group_index(),
                                question.stops.len()
                            ),
                        ));
                    }
                }
            }
        }

        for (index, rule) in self.rules.iter().enumerate() {
            if !self.answer_keys().any(|key| key == rule.question_id) {
                issues.push(LintIssue::new(
                    "rule_unknown_question",
                    format!("rule #{index} targets unknown question `{}`", rule.question_id),
                ));
            }
            if rule.recommend.is_empty() {
                issues.push(LintIssue::new(
                    "rule_without_recommendations",
                    format!("rule #{index} recommends nothing"),
                ));
            }
        }

        for (index, combo) in self.combos.iter().enumerate() {
            for key in combo.when.keys() {
                if !self.answer_keys().any(|known| known == key.as_str()) {
                    issues.push(LintIssue::new(
                        "combo_unknown_key",
                        format!("combo #{index} expects unknown answer key `{key}`"),
                    ));
                }
            }
            if combo.when.is_empty() {
                issues.push(LintIssue::new(
                    "combo_matches_everything",
                    format!("combo #{index} has no conditions and suppresses every rule"),
                ));
            }
        }

        issues
    }

    /// Every key the wizard can write into an answer map for this quiz.
    fn answer_keys(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().flat_map(|question| -> Vec<&str> {
            match question.layout {
                Layout::ToneFaces => vec![TONE_KEY, FACE_KEY],
                Layout::Undertone => vec![UNDERTONE_KEY],
                _ => vec![question.id.as_str()],
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> QuizConfig {
        serde_json::from_str(raw).expect("quiz document should parse")
    }

    #[test]
    fn optional_sections_take_defaults() {
        let config = parse(r#"{"questions": []}"#);

        assert!(config.rules.is_empty());
        assert!(config.combos.is_empty());
        assert_eq!(config.results_title, DEFAULT_RESULTS_TITLE);
    }

    #[test]
    fn unknown_layout_falls_back_to_default() {
        let config = parse(
            r#"{"questions": [{"id": "q1", "title": "Skin", "layout": "carousel", "options": []}]}"#,
        );

        assert_eq!(config.questions[0].layout, Layout::Default);
        assert_eq!(config.questions[0].selection, SelectionType::Single);
    }

    #[test]
    fn unknown_selection_type_falls_back_to_single() {
        let config = parse(
            r#"{"questions": [
                {"id": "q1", "type": "ranked", "layout": "image-grid"},
                {"id": "q2", "type": "multi", "layout": "undertone"}
            ]}"#,
        );

        assert_eq!(config.questions[0].selection, SelectionType::Single);
        assert_eq!(config.questions[0].layout, Layout::ImageGrid);
        assert_eq!(config.questions[1].selection, SelectionType::Multi);
        assert_eq!(config.questions[1].layout, Layout::Undertone);
        let written = serde_json::to_value(&config.questions[0]).expect("serialize");
        assert_eq!(written["type"], "single");
        assert_eq!(written["layout"], "image-grid");
    }

    #[test]
    fn whole_floats_compare_as_integers() {
        let config = parse(
            r#"{
                "questions": [{"id": "size", "options": [{"value": 2.5}]}],
                "rules": [{"questionId": "size", "value": 1.0, "recommend": ["serum"]}]
            }"#,
        );

        assert_eq!(config.rules[0].value.as_key(), "1");
        assert_eq!(config.questions[0].options[0].value.as_key(), "2.5");
        let written = serde_json::to_value(&config.rules[0]).expect("serialize");
        assert_eq!(written["value"], serde_json::json!(1.0));
    }

    #[test]
    fn numeric_and_text_values_share_a_key() {
        let config = parse(
            r#"{
                "questions": [{"id": "age", "options": [{"value": 30, "label": "30s"}]}],
                "rules": [{"questionId": "age", "value": "30", "recommend": ["serum"]}]
            }"#,
        );

        assert_eq!(config.questions[0].options[0].value.as_key(), "30");
        assert_eq!(config.rules[0].value.as_key(), "30");
        assert!(matches!(config.questions[0].options[0].value, ScalarValue::Number(_)));
    }

    #[test]
    fn serialization_keeps_numeric_values() {
        let config = parse(
            r#"{"questions": [{"id": "age", "options": [{"value": 30, "label": "30s"}]}]}"#,
        );

        let written = serde_json::to_value(&config).expect("serialize");
        assert_eq!(written["questions"][0]["options"][0]["value"], serde_json::json!(30));
        assert_eq!(written["resultsTitle"], DEFAULT_RESULTS_TITLE);
    }

    #[test]
    fn combo_conditions_keep_document_order() {
        let config = parse(
            r#"{"questions": [], "combos": [{"when": {"undertone": "warm", "tone": "tone_light"}, "recommend": ["a"]}]}"#,
        );

        let keys: Vec<_> = config.combos[0].when.keys().cloned().collect();
        assert_eq!(keys, vec!["undertone".to_string(), "tone".to_string()]);
    }

    #[test]
    fn lint_reports_unreachable_rules_and_combos() {
        let config = parse(
            r#"{
                "questions": [
                    {"id": "shade", "layout": "tone-faces", "stops": ["Light"],
                     "options": [{"value": "f1", "group": 0}, {"value": "f9", "group": 3}]},
                    {"id": "shade", "options": []}
                ],
                "rules": [{"questionId": "finish", "value": "matte", "recommend": []}],
                "combos": [{"when": {"tone": "tone_light", "mood": "x"}, "recommend": ["a"]}]
            }"#,
        );

        let codes: Vec<_> = config.lint().into_iter().map(|issue| issue.code).collect();

        assert!(codes.contains(&"duplicate_question_id"));
        assert!(codes.contains(&"question_without_options"));
        assert!(codes.contains(&"face_group_out_of_range"));
        assert!(codes.contains(&"rule_unknown_question"));
        assert!(codes.contains(&"rule_without_recommendations"));
        assert!(codes.contains(&"combo_unknown_key"));
        assert!(!codes.contains(&"tone_faces_without_stops"));
    }

    #[test]
    fn lint_accepts_synthetic_keys() {
        let config = parse(
            r#"{
                "questions": [
                    {"id": "tonefaces", "layout": "tone-faces", "stops": ["Light", "Deep"],
                     "options": [{"value": "f1", "group": 0}, {"value": "f2", "group": 1}]},
                    {"id": "undertone-step", "layout": "undertone", "options": [{"value": "warm"}]}
                ],
                "rules": [{"questionId": "undertone", "value": "warm", "recommend": ["b"]}],
                "combos": [{"when": {"tone": "tone_light", "face": "f1"}, "recommend": ["a"]}]
            }"#,
        );

        assert_eq!(config.lint(), Vec::new());
    }
}
