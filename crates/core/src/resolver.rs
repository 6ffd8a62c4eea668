//! Answer-to-recommendation matching.
//!
//! Resolution runs in two explicit phases. Combos (AND over their `when`
//! conditions) are evaluated first and every matching combo contributes.
//! Single-condition rules are consulted only when no combo matched at all,
//! even if the matching combos recommend nothing.

use serde::Serialize;

use crate::domain::answers::AnswerMap;
use crate::domain::product::HandleSet;
use crate::domain::quiz::{Combo, QuizConfig, Rule};

/// Which tier produced the handles, with config indices of the matches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum ResolutionTier {
    Combos { matched: Vec<usize> },
    Rules { matched: Vec<usize> },
    NoMatch,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub handles: HandleSet,
    pub tier: ResolutionTier,
}

pub fn resolve(answers: &AnswerMap, config: &QuizConfig) -> HandleSet {
    resolve_traced(answers, config).handles
}

pub fn resolve_traced(answers: &AnswerMap, config: &QuizConfig) -> Resolution {
    let mut handles = HandleSet::new();

    let combos = matching_combos(answers, &config.combos);
    if !combos.is_empty() {
        for index in &combos {
            handles.extend(config.combos[*index].recommend.iter().cloned());
        }
        return Resolution { handles, tier: ResolutionTier::Combos { matched: combos } };
    }

    let rules = matching_rules(answers, &config.rules);
    for index in &rules {
        handles.extend(config.rules[*index].recommend.iter().cloned());
    }

    let tier = if rules.is_empty() {
        ResolutionTier::NoMatch
    } else {
        ResolutionTier::Rules { matched: rules }
    };
    Resolution { handles, tier }
}

pub fn combo_matches(answers: &AnswerMap, combo: &Combo) -> bool {
    combo.when.iter().all(|(key, expected)| answers.matches(key, &expected.as_key()))
}

pub fn rule_matches(answers: &AnswerMap, rule: &Rule) -> bool {
    answers.matches(&rule.question_id, &rule.value.as_key())
}

fn matching_combos(answers: &AnswerMap, combos: &[Combo]) -> Vec<usize> {
    combos
        .iter()
        .enumerate()
        .filter(|(_, combo)| combo_matches(answers, combo))
        .map(|(index, _)| index)
        .collect()
}

fn matching_rules(answers: &AnswerMap, rules: &[Rule]) -> Vec<usize> {
    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule_matches(answers, rule))
        .map(|(index, _)| index)
        .collect()
}
