//! Aggregate per-passage mentions into per-entity mention structures

use crate::error::GroundingError;
use crate::types::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Value a mention type normalizes to, with its canonical empty value
pub trait NormalizedValue: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    fn empty() -> Self;
}

/// Entity mentions carry no normalized value
impl NormalizedValue for () {
    fn empty() -> Self {}
}

impl NormalizedValue for f64 {
    fn empty() -> Self {
        -1.0
    }
}

impl NormalizedValue for DateValue {
    fn empty() -> Self {
        DateValue {
            day: -1,
            month: -1,
            year: -1,
        }
    }
}

/// Mentions of one entity, one non-empty slot list per passage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityMentions {
    pub passages: Vec<Vec<MentionSlot>>,
}

impl EntityMentions {
    /// Entity with no mention in any passage
    pub fn placeholder(passage_count: usize) -> Self {
        Self {
            passages: vec![vec![None]; passage_count],
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.passages.iter().all(|slots| slots.iter().all(Option::is_none))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedMentions<V> {
    pub entities: Vec<EntityMentions>,
    /// One value per entity, `None` when normalization was not requested
    pub normalized: Option<Vec<V>>,
    /// Number of supplied clusters (0 even when a placeholder was synthesized)
    pub num_entities: usize,
}

/// Groups one mention type (entity, number or date) by coreference cluster
pub struct MentionAggregator<'a, V> {
    kind: &'static str,
    mentions: &'a [Vec<Mention>],
    clusters: &'a [Vec<MentionRef>],
    passage_lengths: &'a [usize],
    normalization: Option<&'a HashMap<String, V>>,
}

impl<'a, V: NormalizedValue> MentionAggregator<'a, V> {
    /// `passage_lengths` holds the token count of each passage, in passage order
    pub fn new(
        kind: &'static str,
        mentions: &'a [Vec<Mention>],
        clusters: &'a [Vec<MentionRef>],
        passage_lengths: &'a [usize],
    ) -> Self {
        Self {
            kind,
            mentions,
            clusters,
            passage_lengths,
            normalization: None,
        }
    }

    /// Request normalized values, looked up by mention text
    pub fn normalize_with(mut self, dict: &'a HashMap<String, V>) -> Self {
        self.normalization = Some(dict);
        self
    }

    pub fn aggregate(&self) -> Result<AggregatedMentions<V>, GroundingError> {
        let passage_count = self.passage_lengths.len();

        if self.clusters.is_empty() {
            debug!("no {} clusters, using placeholder entity", self.kind);
            return Ok(AggregatedMentions {
                entities: vec![EntityMentions::placeholder(passage_count)],
                normalized: self.normalization.map(|_| vec![V::empty()]),
                num_entities: 0,
            });
        }

        let mut entities = Vec::with_capacity(self.clusters.len());
        let mut normalized = self.normalization.map(|_| Vec::with_capacity(self.clusters.len()));

        for (entity_idx, cluster) in self.clusters.iter().enumerate() {
            let mut passages: Vec<Vec<MentionSlot>> = vec![Vec::new(); passage_count];
            let mut value: Option<V> = None;

            for &(passage_idx, mention_idx) in cluster {
                let mention = self.resolve(entity_idx, passage_idx, mention_idx)?;
                passages[passage_idx].push(Some(self.span_of(mention, passage_idx)?));

                if let Some(dict) = self.normalization {
                    let found = dict.get(&mention.text).ok_or_else(|| {
                        GroundingError::MissingNormalization {
                            entity: entity_idx,
                            mention: mention.text.clone(),
                        }
                    })?;
                    if let Some(expected) = &value {
                        if expected != found {
                            return Err(GroundingError::NormalizationMismatch {
                                entity: entity_idx,
                                mention: mention.text.clone(),
                                expected: format!("{:?}", expected),
                                found: format!("{:?}", found),
                            });
                        }
                    } else {
                        value = Some(found.clone());
                    }
                }
            }

            for slots in passages.iter_mut().filter(|slots| slots.is_empty()) {
                slots.push(None);
            }
            entities.push(EntityMentions { passages });

            if let Some(values) = normalized.as_mut() {
                let value = value.ok_or_else(|| {
                    GroundingError::malformed(format!(
                        "{} entity {} has no mentions",
                        self.kind, entity_idx
                    ))
                })?;
                values.push(value);
            }
        }

        debug!(
            "aggregated {} {} entities over {} passages",
            entities.len(),
            self.kind,
            passage_count
        );

        Ok(AggregatedMentions {
            num_entities: entities.len(),
            entities,
            normalized,
        })
    }

    fn resolve(
        &self,
        entity_idx: usize,
        passage_idx: usize,
        mention_idx: usize,
    ) -> Result<&'a Mention, GroundingError> {
        if passage_idx >= self.passage_lengths.len() {
            return Err(GroundingError::malformed(format!(
                "{} entity {} refers to passage {} of {}",
                self.kind,
                entity_idx,
                passage_idx,
                self.passage_lengths.len()
            )));
        }
        self.mentions
            .get(passage_idx)
            .and_then(|mens| mens.get(mention_idx))
            .ok_or_else(|| {
                GroundingError::malformed(format!(
                    "{} entity {} refers to missing mention {} in passage {}",
                    self.kind, entity_idx, mention_idx, passage_idx
                ))
            })
    }

    fn span_of(&self, mention: &Mention, passage_idx: usize) -> Result<TokenSpan, GroundingError> {
        let passage_len = self.passage_lengths[passage_idx];
        TokenSpan::from_exclusive(mention.start, mention.end)
            .filter(|_| mention.end <= passage_len)
            .ok_or_else(|| {
                GroundingError::malformed(format!(
                    "{} mention '{}' [{}, {}) outside passage {} of {} tokens",
                    self.kind, mention.text, mention.start, mention.end, passage_idx, passage_len
                ))
            })
    }
}
