//! Typed answer groundings for training supervision

use crate::error::GroundingError;
use crate::executor::indicator;
use crate::types::*;
use serde::Serialize;
use serde_json::Value;

/// STRING-type gold grounding as given in the raw record
#[derive(Debug, Clone, PartialEq)]
pub enum StringGrounding {
    /// Answer string could not be located in any passage
    NoAnswer,
    /// `(passage_idx, (start, end_exclusive))` occurrences of the answer
    Spans(Vec<(usize, (usize, usize))>),
}

/// Gold grounding, one variant per answer type
#[derive(Debug, Clone, PartialEq)]
pub enum GoldGrounding {
    Boolean(f32),
    String(StringGrounding),
    /// Indicator over entity clusters, -1 padding allowed
    Entity(Vec<f32>),
    Number(Vec<f32>),
    Date(Vec<f32>),
}

impl GoldGrounding {
    pub fn answer_type(&self) -> AnswerType {
        match self {
            GoldGrounding::Boolean(_) => AnswerType::Boolean,
            GoldGrounding::String(_) => AnswerType::String,
            GoldGrounding::Entity(_) => AnswerType::Entity,
            GoldGrounding::Number(_) => AnswerType::Number,
            GoldGrounding::Date(_) => AnswerType::Date,
        }
    }

    /// Decode the raw JSON grounding according to its declared type
    pub fn from_raw(answer_type: AnswerType, raw: &Value) -> Result<Self, GroundingError> {
        let grounding = match answer_type {
            AnswerType::Boolean => {
                let value = match raw {
                    Value::Bool(b) => indicator(*b),
                    Value::Number(n) => n.as_f64().unwrap_or_default() as f32,
                    other => {
                        return Err(GroundingError::malformed(format!(
                            "BOOL grounding should be a boolean or number, got {}",
                            other
                        )))
                    }
                };
                GoldGrounding::Boolean(value)
            }
            AnswerType::String => match raw {
                Value::String(s) if s == NO_ANS_GROUNDING => {
                    GoldGrounding::String(StringGrounding::NoAnswer)
                }
                other => GoldGrounding::String(StringGrounding::Spans(
                    serde_json::from_value(other.clone())?,
                )),
            },
            AnswerType::Entity => GoldGrounding::Entity(serde_json::from_value(raw.clone())?),
            AnswerType::Number => GoldGrounding::Number(serde_json::from_value(raw.clone())?),
            AnswerType::Date => GoldGrounding::Date(serde_json::from_value(raw.clone())?),
        };

        Ok(grounding)
    }
}

/// One grounding per answer type; only the gold type's entry is non-empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerGroundings {
    /// Single-element vector
    pub boolean: Vec<f32>,
    /// Per passage, answer spans (placeholder when none)
    pub string: Vec<Vec<MentionSlot>>,
    pub entity: Vec<f32>,
    pub number: Vec<f32>,
    pub date: Vec<f32>,
}

/// Borrowed view of one type's grounding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroundingEntry<'a> {
    Vector(&'a [f32]),
    Spans(&'a [Vec<MentionSlot>]),
}

impl AnswerGroundings {
    pub fn entry(&self, answer_type: AnswerType) -> GroundingEntry<'_> {
        match answer_type {
            AnswerType::Boolean => GroundingEntry::Vector(&self.boolean),
            AnswerType::String => GroundingEntry::Spans(&self.string),
            AnswerType::Entity => GroundingEntry::Vector(&self.entity),
            AnswerType::Number => GroundingEntry::Vector(&self.number),
            AnswerType::Date => GroundingEntry::Vector(&self.date),
        }
    }
}

pub struct AnswerGroundingBuilder<'a> {
    passage_lengths: &'a [usize],
    counts: EntityCounts,
}

impl<'a> AnswerGroundingBuilder<'a> {
    pub fn new(passage_lengths: &'a [usize], counts: EntityCounts) -> Self {
        Self {
            passage_lengths,
            counts,
        }
    }

    /// Canonical empty grounding for every type
    pub fn empty(&self) -> AnswerGroundings {
        AnswerGroundings {
            boolean: vec![0.0],
            string: vec![vec![None]; self.passage_lengths.len()],
            entity: vec![0.0; self.counts.entity],
            number: vec![0.0; self.counts.number],
            date: vec![0.0; self.counts.date],
        }
    }

    /// Empty groundings with the gold entry injected.
    ///
    /// Returns `Ok(None)` when the instance must be skipped (STRING answer
    /// that was not found in the passages).
    pub fn build(&self, gold: &GoldGrounding) -> Result<Option<AnswerGroundings>, GroundingError> {
        let mut groundings = self.empty();

        match gold {
            GoldGrounding::Boolean(value) => groundings.boolean = vec![*value],
            GoldGrounding::String(StringGrounding::NoAnswer) => return Ok(None),
            GoldGrounding::String(StringGrounding::Spans(spans)) => {
                groundings.string = self.string_spans(spans)?;
            }
            GoldGrounding::Entity(v) => groundings.entity = v.clone(),
            GoldGrounding::Number(v) => groundings.number = v.clone(),
            GoldGrounding::Date(v) => groundings.date = v.clone(),
        }

        Ok(Some(groundings))
    }

    fn string_spans(
        &self,
        raw: &[(usize, (usize, usize))],
    ) -> Result<Vec<Vec<MentionSlot>>, GroundingError> {
        let mut per_passage: Vec<Vec<MentionSlot>> = vec![Vec::new(); self.passage_lengths.len()];

        for &(passage_idx, (start, end)) in raw {
            let passage_len = *self.passage_lengths.get(passage_idx).ok_or_else(|| {
                GroundingError::malformed(format!(
                    "STRING grounding refers to passage {} of {}",
                    passage_idx,
                    self.passage_lengths.len()
                ))
            })?;
            let span = TokenSpan::from_exclusive(start, end)
                .filter(|_| end <= passage_len)
                .ok_or_else(|| {
                    GroundingError::malformed(format!(
                        "STRING grounding [{}, {}) outside passage {} of {} tokens",
                        start, end, passage_idx, passage_len
                    ))
                })?;
            per_passage[passage_idx].push(Some(span));
        }

        for slots in per_passage.iter_mut().filter(|slots| slots.is_empty()) {
            slots.push(None);
        }

        Ok(per_passage)
    }
}
