//! Reader configuration

use crate::types::AnswerType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Env var holding a comma-separated list of accepted answer type tags
pub const ANSWER_TYPES_ENV: &str = "SEMQA_ANSWER_TYPES";
/// Env var holding the number of examples assembled concurrently
pub const WORKERS_ENV: &str = "SEMQA_WORKERS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Gold answer types kept; examples with any other gold type are skipped
    pub accepted_answer_types: Vec<AnswerType>,
    /// Examples assembled concurrently by the streaming reader
    pub workers: usize,
    /// Skip examples that carry no gold answer type; `false` keeps them as
    /// unsupervised instances
    pub require_supervision: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            accepted_answer_types: vec![AnswerType::Boolean],
            workers: 4,
            require_supervision: true,
        }
    }
}

impl ReaderConfig {
    /// Defaults overlaid with `SEMQA_ANSWER_TYPES` and `SEMQA_WORKERS`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(types) = std::env::var(ANSWER_TYPES_ENV) {
            config.accepted_answer_types = parse_answer_types(&types)
                .with_context(|| format!("invalid {}", ANSWER_TYPES_ENV))?;
        }

        if let Ok(workers) = std::env::var(WORKERS_ENV) {
            config.workers = workers
                .trim()
                .parse()
                .with_context(|| format!("invalid {}: '{}'", WORKERS_ENV, workers))?;
        }

        Ok(config)
    }

    pub fn accepts(&self, answer_type: AnswerType) -> bool {
        self.accepted_answer_types.contains(&answer_type)
    }
}

/// Parse `"BOOL,STRING"` style lists; empty items are ignored
pub fn parse_answer_types(list: &str) -> Result<Vec<AnswerType>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<AnswerType>().map_err(anyhow::Error::msg))
        .collect()
}
