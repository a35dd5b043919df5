//! Core type definitions for instance grounding

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::actions::LinkedActions;
use crate::grammar::ActionGrammar;
use crate::grounding::AnswerGroundings;
use crate::mentions::AggregatedMentions;
use crate::spans::SpanVocabulary;

/// Prefix of single question-token spans
pub const QSTR_PREFIX: &str = "QSTR:";
/// Prefix of multi-token question entity-mention spans
pub const QENT_PREFIX: &str = "QENT:";
/// Reserved delimiter joining the tokens of a span key
pub const SPAN_DELIM: &str = "***";
/// Question-mention grounding value for mentions with no passage entity
pub const UNGROUNDED: i64 = -1;
/// STRING-type gold grounding meaning "the answer string was not found"
pub const NO_ANS_GROUNDING: &str = "NO_ANS_GROUNDING";

/// Inclusive token range `[start, end]` inside one token sequence
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Convert a half-open `[start, end_exclusive)` annotation range.
    /// Returns `None` for empty ranges.
    pub fn from_exclusive(start: usize, end_exclusive: usize) -> Option<Self> {
        if end_exclusive <= start {
            return None;
        }
        Some(Self::new(start, end_exclusive - 1))
    }
}

/// A mention slot: either a real span or "no mention in this passage".
///
/// Tensor code that needs the legacy `(-1, -1)` padding can call
/// [`padded_bounds`]; nothing else should see the sentinel.
pub type MentionSlot = Option<TokenSpan>;

/// Padded `(start, end)` pair for a mention slot, `(-1, -1)` when absent
pub fn padded_bounds(slot: &MentionSlot) -> (i64, i64) {
    match slot {
        Some(span) => (span.start as i64, span.end as i64),
        None => (-1, -1),
    }
}

/// Raw mention annotation: `(text, start, end_exclusive, label)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub label: String,
}

impl Mention {
    pub fn new(
        text: impl Into<String>,
        start: usize,
        end: usize,
        label: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            label: label.into(),
        }
    }
}

/// A tokenized passage, addressed by its position in the instance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Passage {
    pub id: String,
    pub tokens: Vec<String>,
}

/// The fixed set of answer types
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum AnswerType {
    #[serde(rename = "BOOL")]
    Boolean,
    #[serde(rename = "STRING")]
    String,
    #[serde(rename = "ENTITY")]
    Entity,
    #[serde(rename = "NUM")]
    Number,
    #[serde(rename = "DATE")]
    Date,
}

impl AnswerType {
    pub const ALL: [AnswerType; 5] = [
        AnswerType::Boolean,
        AnswerType::String,
        AnswerType::Entity,
        AnswerType::Number,
        AnswerType::Date,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            AnswerType::Boolean => "BOOL",
            AnswerType::String => "STRING",
            AnswerType::Entity => "ENTITY",
            AnswerType::Number => "NUM",
            AnswerType::Date => "DATE",
        }
    }
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for AnswerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnswerType::ALL
            .into_iter()
            .find(|t| t.tag() == s.trim())
            .ok_or_else(|| format!("unknown answer type '{}'", s))
    }
}

/// Normalized date; -1 marks an unknown field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValue {
    pub day: i32,
    pub month: i32,
    pub year: i32,
}

/// Mention reference inside a coreference cluster: `(passage_idx, mention_idx)`
pub type MentionRef = (usize, usize);

/// One raw example, as found on a line of the input file
#[derive(Debug, Clone, Deserialize)]
pub struct RawExample {
    /// Space-delimited, pre-tokenized question
    pub question: String,
    pub q_ent_ner: Vec<Mention>,
    /// `(passage_id, space-delimited passage text)`
    pub contexts: Vec<(String, String)>,

    pub context_ent_ner: Vec<Vec<Mention>>,
    pub context_num_ner: Vec<Vec<Mention>>,
    pub context_date_ner: Vec<Vec<Mention>>,

    // Mention -> cluster index, per passage
    pub context_entmens2entidx: Vec<Vec<i64>>,
    pub context_nummens2entidx: Vec<Vec<i64>>,
    pub context_datemens2entidx: Vec<Vec<i64>>,

    // Cluster -> mentions
    pub context_eqent2entmens: Vec<Vec<MentionRef>>,
    pub context_eqent2nummens: Vec<Vec<MentionRef>>,
    pub context_eqent2datemens: Vec<Vec<MentionRef>>,

    pub nums_normalized: HashMap<String, f64>,
    pub dates_normalized: HashMap<String, DateValue>,

    /// Cluster index per question mention, [`UNGROUNDED`] when ungrounded
    pub q_entmens2entidx: Vec<i64>,

    #[serde(default)]
    pub ans_type: Option<String>,
    #[serde(default)]
    pub ans_grounding: Option<serde_json::Value>,
}

/// Number of coreference clusters per mention type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub entity: usize,
    pub number: usize,
    pub date: usize,
}

/// Gold supervision: one grounding per answer type plus the gold tag
#[derive(Debug, Clone, PartialEq)]
pub struct Supervision {
    pub gold_type: AnswerType,
    pub groundings: AnswerGroundings,
}

/// Final model-ready record. Read-only once assembled.
#[derive(Debug, Clone)]
pub struct Instance {
    pub question: Vec<String>,
    pub passages: Vec<Passage>,

    pub entity_mentions: AggregatedMentions<()>,
    pub number_mentions: AggregatedMentions<f64>,
    pub date_mentions: AggregatedMentions<DateValue>,
    pub counts: EntityCounts,

    pub grammar: Arc<dyn ActionGrammar>,
    pub spans: SpanVocabulary,
    pub actions: LinkedActions,

    pub supervision: Option<Supervision>,
}

impl Instance {
    /// Per-span boundary pairs, index-aligned with the linking-score matrix
    pub fn span_bounds(&self) -> Vec<TokenSpan> {
        self.spans.bounds()
    }
}
