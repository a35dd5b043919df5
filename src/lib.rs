//! semqa-grounding - instance grounding for multi-passage semantic parsing
//!
//! Turns raw question-answering examples into model-ready instances:
//! - Question span vocabulary with linking scores
//! - Grammar actions linked to those spans
//! - Coreference-consistent entity/number/date mention structures
//! - Typed answer groundings for training

pub mod types;
pub mod error;
pub mod spans;
pub mod grammar;
pub mod actions;
pub mod mentions;
pub mod grounding;
pub mod executor;
pub mod instance;
pub mod reader;
pub mod config;

pub use types::*;
pub use error::GroundingError;
pub use spans::{extract_spans, QuestionSpan, SpanKind, SpanVocabulary, SpanVocabularyBuilder};
pub use grammar::{ActionGrammar, SampleGrammar};
pub use actions::{link_actions, LinkedActions, ProductionRule};
pub use mentions::{AggregatedMentions, EntityMentions, MentionAggregator, NormalizedValue};
pub use grounding::{
    AnswerGroundingBuilder, AnswerGroundings, GoldGrounding, GroundingEntry, StringGrounding,
};
pub use instance::{InstanceAssembler, SharedAssembler};
pub use reader::{DatasetReader, ReadSummary};
pub use config::ReaderConfig;
