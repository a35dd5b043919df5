//! Question span vocabulary and linking scores

use crate::error::GroundingError;
use crate::types::*;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpanKind {
    /// Single question token (`QSTR:`)
    Token,
    /// Grounded question entity mention (`QENT:`)
    Entity,
}

impl SpanKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            SpanKind::Token => QSTR_PREFIX,
            SpanKind::Entity => QENT_PREFIX,
        }
    }

    /// Kind of a production right-hand side, `None` for global symbols
    pub fn of_key(key: &str) -> Option<SpanKind> {
        if key.starts_with(QSTR_PREFIX) {
            Some(SpanKind::Token)
        } else if key.starts_with(QENT_PREFIX) {
            Some(SpanKind::Entity)
        } else {
            None
        }
    }
}

/// One entry of the span vocabulary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionSpan {
    pub key: String,
    pub kind: SpanKind,
    /// 1.0 at every question position covered by the span, 0.0 elsewhere
    pub linking_score: Vec<f32>,
    /// Question-token boundary used for span-embedding lookups
    pub bounds: TokenSpan,
}

/// Finalized, ordered, deduplicated span vocabulary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanVocabulary {
    spans: Vec<QuestionSpan>,
    index: HashMap<String, usize>,
}

impl SpanVocabulary {
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&QuestionSpan> {
        self.spans.get(idx)
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionSpan> {
        self.spans.iter()
    }

    /// Span keys in vocabulary order; this is what the grammar is built from
    pub fn keys(&self) -> Vec<String> {
        self.spans.iter().map(|s| s.key.clone()).collect()
    }

    /// Linking-score matrix, one row per span in vocabulary order
    pub fn linking_scores(&self) -> Vec<Vec<f32>> {
        self.spans.iter().map(|s| s.linking_score.clone()).collect()
    }

    pub fn bounds(&self) -> Vec<TokenSpan> {
        self.spans.iter().map(|s| s.bounds).collect()
    }
}

/// Accumulates spans over one question and hands out a single snapshot.
///
/// Insertion order is the vocabulary order; the first span with a given key
/// wins and later duplicates are dropped.
pub struct SpanVocabularyBuilder<'a> {
    tokens: &'a [String],
    spans: Vec<QuestionSpan>,
    index: HashMap<String, usize>,
}

impl<'a> SpanVocabularyBuilder<'a> {
    pub fn new(tokens: &'a [String]) -> Self {
        Self {
            tokens,
            spans: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add one `QSTR:` span per distinct token value, ordered by first
    /// occurrence. Each span scores every position holding that value.
    pub fn with_token_spans(mut self) -> Self {
        let tokens = self.tokens;
        let mut positions: Vec<(&str, Vec<usize>)> = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for (pos, token) in tokens.iter().enumerate() {
            match seen.get(token.as_str()) {
                Some(&slot) => positions[slot].1.push(pos),
                None => {
                    seen.insert(token.as_str(), positions.len());
                    positions.push((token.as_str(), vec![pos]));
                }
            }
        }

        let question_len = tokens.len();
        for (token, occurrences) in positions {
            let mut linking_score = vec![0.0; question_len];
            for &pos in &occurrences {
                linking_score[pos] = 1.0;
            }
            let first = occurrences[0];
            self.push(QuestionSpan {
                key: format!("{}{}", QSTR_PREFIX, token),
                kind: SpanKind::Token,
                linking_score,
                bounds: TokenSpan::new(first, first),
            });
        }

        self
    }

    /// Add one `QENT:` span per grounded question mention.
    ///
    /// `groundings` is index-aligned with `mentions`; mentions grounded to
    /// [`UNGROUNDED`] are ignored, as are keys already in the vocabulary.
    pub fn with_entity_mentions(
        mut self,
        mentions: &[Mention],
        groundings: &[i64],
    ) -> Result<Self, GroundingError> {
        if mentions.len() != groundings.len() {
            return Err(GroundingError::malformed(format!(
                "{} question mentions but {} groundings",
                mentions.len(),
                groundings.len()
            )));
        }

        let question_len = self.tokens.len();
        for (mention, &grounding) in mentions.iter().zip(groundings) {
            if grounding == UNGROUNDED {
                continue;
            }

            let bounds = TokenSpan::from_exclusive(mention.start, mention.end)
                .filter(|_| mention.end <= question_len)
                .ok_or_else(|| {
                    GroundingError::malformed(format!(
                        "question mention '{}' [{}, {}) outside question of {} tokens",
                        mention.text, mention.start, mention.end, question_len
                    ))
                })?;

            let key = format!(
                "{}{}",
                QENT_PREFIX,
                self.tokens[mention.start..mention.end].join(SPAN_DELIM)
            );
            if self.index.contains_key(&key) {
                continue;
            }

            let mut linking_score = vec![0.0; question_len];
            for score in &mut linking_score[mention.start..mention.end] {
                *score = 1.0;
            }
            self.push(QuestionSpan {
                key,
                kind: SpanKind::Entity,
                linking_score,
                bounds,
            });
        }

        Ok(self)
    }

    pub fn build(self) -> SpanVocabulary {
        SpanVocabulary {
            spans: self.spans,
            index: self.index,
        }
    }

    fn push(&mut self, span: QuestionSpan) {
        if self.index.contains_key(&span.key) {
            return;
        }
        self.index.insert(span.key.clone(), self.spans.len());
        self.spans.push(span);
    }
}

/// Token spans followed by grounded entity-mention spans
pub fn extract_spans(
    tokens: &[String],
    mentions: &[Mention],
    groundings: &[i64],
) -> Result<SpanVocabulary, GroundingError> {
    Ok(SpanVocabularyBuilder::new(tokens)
        .with_token_spans()
        .with_entity_mentions(mentions, groundings)?
        .build())
}
