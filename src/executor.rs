//! Executor primitive library used to evaluate parsed programs

use serde::Serialize;
use thiserror::Error;

/// Kind of a primitive argument or result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueKind {
    Number,
    Bool,
    /// `QSTR:` question span
    QuesSpan,
    /// `QENT:` question entity span
    QuesEntity,
}

impl ValueKind {
    /// Grammar type symbol for this kind
    pub fn symbol(&self) -> &'static str {
        match self {
            ValueKind::Number => "number",
            ValueKind::Bool => "bool",
            ValueKind::QuesSpan => "qstr",
            ValueKind::QuesEntity => "qent",
        }
    }
}

/// Runtime argument to a primitive
#[derive(Debug, Clone, PartialEq)]
pub enum Arg<'a> {
    Number(f32),
    Span(&'a str),
}

/// Static signature of one primitive
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Primitive {
    pub name: &'static str,
    pub args: &'static [ValueKind],
    pub returns: ValueKind,
}

pub const PRIMITIVES: &[Primitive] = &[
    Primitive {
        name: "number_threshold",
        args: &[ValueKind::Number],
        returns: ValueKind::Bool,
    },
    Primitive {
        name: "number_greater",
        args: &[ValueKind::Number, ValueKind::Number],
        returns: ValueKind::Bool,
    },
    Primitive {
        name: "scalar_mult",
        args: &[ValueKind::Number],
        returns: ValueKind::Number,
    },
    Primitive {
        name: "multiply",
        args: &[ValueKind::Number, ValueKind::Number],
        returns: ValueKind::Number,
    },
    Primitive {
        name: "ground_num",
        args: &[],
        returns: ValueKind::Number,
    },
    Primitive {
        name: "ques_bool",
        args: &[ValueKind::QuesSpan],
        returns: ValueKind::Bool,
    },
    Primitive {
        name: "ques_ent_bool",
        args: &[ValueKind::QuesEntity],
        returns: ValueKind::Bool,
    },
    Primitive {
        name: "two_ques_bool",
        args: &[ValueKind::QuesSpan, ValueKind::QuesSpan],
        returns: ValueKind::Bool,
    },
];

#[derive(Debug, Error, PartialEq)]
pub enum ExecutionError {
    #[error("unknown primitive '{0}'")]
    UnknownPrimitive(String),
    #[error("primitive '{name}' takes {expected} arguments, got {found}")]
    Arity {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("primitive '{name}' argument {position} should be {expected:?}")]
    ArgKind {
        name: &'static str,
        position: usize,
        expected: ValueKind,
    },
}

/// Prefix length stripped by `two_ques_bool` (length of `QSTR:`)
const SPAN_PREFIX_LEN: usize = 5;

pub fn lookup(name: &str) -> Option<&'static Primitive> {
    PRIMITIVES.iter().find(|p| p.name == name)
}

/// Apply a primitive by name. Every primitive returns one scalar.
pub fn apply(name: &str, args: &[Arg<'_>]) -> Result<f32, ExecutionError> {
    let prim = lookup(name).ok_or_else(|| ExecutionError::UnknownPrimitive(name.to_string()))?;
    if args.len() != prim.args.len() {
        return Err(ExecutionError::Arity {
            name: prim.name,
            expected: prim.args.len(),
            found: args.len(),
        });
    }

    let kind_error = |i: usize| ExecutionError::ArgKind {
        name: prim.name,
        position: i,
        expected: prim.args[i],
    };
    let number = |i: usize| match args[i] {
        Arg::Number(x) => Ok(x),
        Arg::Span(_) => Err(kind_error(i)),
    };
    let span = |i: usize| match args[i] {
        Arg::Span(s) => Ok(s),
        Arg::Number(_) => Err(kind_error(i)),
    };

    let value = match prim.name {
        "number_threshold" => indicator(number(0)? > 10.0),
        "number_greater" => indicator(number(0)? > number(1)?),
        "scalar_mult" => 5.0 * number(0)?,
        "multiply" => number(0)? * number(1)?,
        "ground_num" => 10.0,
        "ques_bool" | "ques_ent_bool" => indicator(span(0)?.chars().count() > 5),
        "two_ques_bool" => {
            let a = strip_prefix(span(0)?);
            let b = strip_prefix(span(1)?);
            indicator(a.chars().count() > b.chars().count())
        }
        other => return Err(ExecutionError::UnknownPrimitive(other.to_string())),
    };

    Ok(value)
}

pub(crate) fn indicator(cond: bool) -> f32 {
    if cond {
        1.0
    } else {
        0.0
    }
}

fn strip_prefix(s: &str) -> &str {
    s.char_indices()
        .nth(SPAN_PREFIX_LEN)
        .map(|(i, _)| &s[i..])
        .unwrap_or("")
}
