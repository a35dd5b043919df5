//! Grammar/World collaborators that enumerate production rules

use crate::executor::{ValueKind, PRIMITIVES};
use crate::spans::SpanKind;
use anyhow::Result;
use std::fmt;

/// Trait for pluggable grammars.
///
/// Given the ordered span keys of one instance, returns every action
/// (global and span-linked) derivable in that instance's grammar. Actions
/// are `LHS -> RHS` strings; linked actions carry a span key as RHS.
pub trait ActionGrammar: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn all_possible_actions(&self, span_keys: &[String]) -> Result<Vec<String>>;
}

/// Start symbol shared by all grammars here
pub const START_SYMBOL: &str = "@start@";

/// Reference grammar over the executor primitives.
///
/// Global rules come from the primitive signatures; every span key becomes a
/// terminal of the `qstr` or `qent` type.
#[derive(Debug, Clone, Default)]
pub struct SampleGrammar;

impl SampleGrammar {
    pub fn new() -> Self {
        Self
    }

    fn global_actions(&self) -> Vec<String> {
        let mut actions = vec![format!("{} -> {}", START_SYMBOL, ValueKind::Bool.symbol())];

        for prim in PRIMITIVES {
            let ret = prim.returns.symbol();
            if prim.args.is_empty() {
                push_unique(&mut actions, format!("{} -> {}", ret, prim.name));
                continue;
            }

            let arg_symbols: Vec<&str> = prim.args.iter().map(|a| a.symbol()).collect();
            let signature = format!("<{},{}>", arg_symbols.join(","), ret);
            push_unique(
                &mut actions,
                format!("{} -> [{}, {}]", ret, signature, arg_symbols.join(", ")),
            );
            push_unique(&mut actions, format!("{} -> {}", signature, prim.name));
        }

        actions
    }
}

impl ActionGrammar for SampleGrammar {
    fn name(&self) -> &'static str {
        "sample_hotpot"
    }

    fn all_possible_actions(&self, span_keys: &[String]) -> Result<Vec<String>> {
        let mut actions = self.global_actions();

        for key in span_keys {
            let lhs = match SpanKind::of_key(key) {
                Some(SpanKind::Token) => ValueKind::QuesSpan.symbol(),
                Some(SpanKind::Entity) => ValueKind::QuesEntity.symbol(),
                None => anyhow::bail!("span key '{}' has no span prefix", key),
            };
            push_unique(&mut actions, format!("{} -> {}", lhs, key));
        }

        Ok(actions)
    }
}

fn push_unique(actions: &mut Vec<String>, action: String) {
    if !actions.contains(&action) {
        actions.push(action);
    }
}
