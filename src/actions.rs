//! Partition grammar actions into global and span-linked rules

use crate::error::GroundingError;
use crate::spans::{SpanKind, SpanVocabulary};
use serde::Serialize;
use std::collections::HashMap;

/// One production rule of the instance's action inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductionRule {
    pub rule: String,
    pub lhs: String,
    pub rhs: String,
    pub is_global: bool,
}

impl ProductionRule {
    pub fn parse(rule: &str) -> Result<Self, GroundingError> {
        let (lhs, rhs) = rule
            .split_once(" -> ")
            .ok_or_else(|| GroundingError::MalformedAction(rule.to_string()))?;

        Ok(Self {
            rule: rule.to_string(),
            lhs: lhs.to_string(),
            rhs: rhs.to_string(),
            is_global: SpanKind::of_key(rhs).is_none(),
        })
    }
}

/// Action inventory with the action -> linking-score row index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkedActions {
    pub actions: Vec<ProductionRule>,
    /// Linked rule -> row of `linking_scores`
    pub linked_rule2idx: HashMap<String, usize>,
    /// Rows ordered by span index
    pub linking_scores: Vec<Vec<f32>>,
}

impl LinkedActions {
    pub fn num_linked(&self) -> usize {
        self.linked_rule2idx.len()
    }

    pub fn linking_score(&self, rule: &str) -> Option<&[f32]> {
        self.linked_rule2idx
            .get(rule)
            .and_then(|&idx| self.linking_scores.get(idx))
            .map(|row| row.as_slice())
    }
}

/// Classify every action and resolve linked ones against the vocabulary.
///
/// A linked action whose span is missing means the grammar was built from
/// a different vocabulary; this is fatal.
pub fn link_actions(
    rules: &[String],
    vocab: &SpanVocabulary,
) -> Result<LinkedActions, GroundingError> {
    let mut actions = Vec::with_capacity(rules.len());
    let mut linked_rule2idx = HashMap::new();

    for rule in rules {
        let action = ProductionRule::parse(rule)?;
        if !action.is_global {
            let idx = vocab
                .index_of(&action.rhs)
                .ok_or_else(|| GroundingError::UnlinkedAction {
                    action: action.rule.clone(),
                    span: action.rhs.clone(),
                })?;
            linked_rule2idx.insert(action.rule.clone(), idx);
        }
        actions.push(action);
    }

    Ok(LinkedActions {
        actions,
        linked_rule2idx,
        linking_scores: vocab.linking_scores(),
    })
}
