//! InstanceAssembler: raw example -> model-ready instance

use crate::actions::link_actions;
use crate::config::ReaderConfig;
use crate::error::GroundingError;
use crate::grammar::ActionGrammar;
use crate::grounding::{AnswerGroundingBuilder, GoldGrounding};
use crate::mentions::MentionAggregator;
use crate::spans::extract_spans;
use crate::types::*;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

/// Builds instances for one grammar (thread-safe via Arc)
#[derive(Debug)]
pub struct InstanceAssembler {
    grammar: Arc<dyn ActionGrammar>,
    config: ReaderConfig,
}

pub type SharedAssembler = Arc<InstanceAssembler>;

impl InstanceAssembler {
    pub fn new(grammar: Arc<dyn ActionGrammar>, config: ReaderConfig) -> SharedAssembler {
        Arc::new(Self { grammar, config })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Parse one JSON line and assemble it
    pub fn line_to_instance(&self, line: &str) -> Result<Option<Instance>> {
        let raw: RawExample = serde_json::from_str(line).context("Malformed example record")?;
        self.text_to_instance(raw)
    }

    /// Main entry point. `Ok(None)` means the example is skipped.
    pub fn text_to_instance(&self, raw: RawExample) -> Result<Option<Instance>> {
        // Step 0: Gate on the gold answer type
        let gold_type = match raw.ans_type.as_deref() {
            Some(tag) => match tag.parse::<AnswerType>() {
                Ok(t) if self.config.accepts(t) => Some(t),
                _ => {
                    debug!("Skipping example: answer type '{}' not accepted", tag);
                    return Ok(None);
                }
            },
            None if self.config.require_supervision => {
                debug!("Skipping example without answer type");
                return Ok(None);
            }
            None => None,
        };

        // Step 1: Tokenize
        let question = tokenize(&raw.question);
        let passages: Vec<Passage> = raw
            .contexts
            .iter()
            .map(|(id, text)| Passage {
                id: id.clone(),
                tokens: tokenize(text),
            })
            .collect();
        let passage_lengths: Vec<usize> = passages.iter().map(|p| p.tokens.len()).collect();

        // Step 2: Question span vocabulary
        let spans = extract_spans(&question, &raw.q_ent_ner, &raw.q_entmens2entidx)
            .context("Failed to extract question spans")?;

        // Step 3: Action inventory from the grammar, linked against the spans
        let span_keys = spans.keys();
        let rules = self
            .grammar
            .all_possible_actions(&span_keys)
            .with_context(|| format!("Grammar '{}' failed", self.grammar.name()))?;
        let actions = link_actions(&rules, &spans)?;

        // Step 4: Mentions per type
        let entity_mentions = MentionAggregator::<()>::new(
            "entity",
            &raw.context_ent_ner,
            &raw.context_eqent2entmens,
            &passage_lengths,
        )
        .aggregate()?;
        let number_mentions = MentionAggregator::new(
            "number",
            &raw.context_num_ner,
            &raw.context_eqent2nummens,
            &passage_lengths,
        )
        .normalize_with(&raw.nums_normalized)
        .aggregate()?;
        let date_mentions = MentionAggregator::new(
            "date",
            &raw.context_date_ner,
            &raw.context_eqent2datemens,
            &passage_lengths,
        )
        .normalize_with(&raw.dates_normalized)
        .aggregate()?;

        let counts = EntityCounts {
            entity: entity_mentions.num_entities,
            number: number_mentions.num_entities,
            date: date_mentions.num_entities,
        };

        // Step 5: Answer grounding
        let supervision = match gold_type {
            Some(gold_type) => {
                let raw_grounding = raw.ans_grounding.as_ref().ok_or_else(|| {
                    GroundingError::malformed(format!(
                        "answer type {} without grounding",
                        gold_type
                    ))
                })?;
                let gold = GoldGrounding::from_raw(gold_type, raw_grounding)?;
                match AnswerGroundingBuilder::new(&passage_lengths, counts).build(&gold)? {
                    Some(groundings) => Some(Supervision {
                        gold_type,
                        groundings,
                    }),
                    None => {
                        debug!("Skipping example: {} answer has no grounding", gold_type);
                        return Ok(None);
                    }
                }
            }
            None => None,
        };

        debug!(
            "Assembled instance: {} question tokens, {} passages, {} spans, {} actions ({} linked)",
            question.len(),
            passages.len(),
            spans.len(),
            actions.actions.len(),
            actions.num_linked()
        );

        Ok(Some(Instance {
            question,
            passages,
            entity_mentions,
            number_mentions,
            date_mentions,
            counts,
            grammar: Arc::clone(&self.grammar),
            spans,
            actions,
            supervision,
        }))
    }
}

/// Whitespace tokenization matching the annotation offsets (single spaces)
pub fn tokenize(text: &str) -> Vec<String> {
    text.trim().split(' ').map(str::to_string).collect()
}
