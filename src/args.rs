//! Turns raw command tokens into typed values, or a [`Rejection`] naming what was wrong.

use crate::{
    dice::{self, Dice},
    error::Rejection,
};
use anyhow::{anyhow, Result};

/// Upper bound for [`ArgKind::RepeatCount`], keeps a single command from flooding the channel.
pub const MAX_REPEAT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Base-10 signed integer.
    Integer,
    /// One token, verbatim.
    FreeText,
    /// All remaining tokens.  Only valid as the last rule.
    VariadicText,
    /// `NdN`.
    DiceNotation,
    /// Positive integer up to [`MAX_REPEAT`].
    RepeatCount,
    /// User mention (`<@id>`, `<@!id>`) or bare user id.
    Member,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Integer(i64),
    Text(String),
    Texts(Vec<String>),
    Dice(Dice),
    Count(u32),
    Member(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgRule {
    pub name: &'static str,
    pub kind: ArgKind,
    pub required: bool,
    pub default: Option<ArgValue>,
}

impl ArgRule {
    pub fn required(name: &'static str, kind: ArgKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &'static str, kind: ArgKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
        }
    }

    pub fn with_default(mut self, value: ArgValue) -> Self {
        self.default = Some(value);
        self
    }
}

/// Validated arguments, positionally matching the command's rules.  Optional arguments without a
/// default that were not supplied are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Option<ArgValue>>);

/// Validate `tokens` against `rules` in order.  Surplus tokens are ignored.
pub fn validate(rules: &[ArgRule], tokens: &[String]) -> Result<Args, Rejection> {
    let mut values = Vec::with_capacity(rules.len());
    let mut remaining = tokens.iter();

    for rule in rules {
        if rule.kind == ArgKind::VariadicText {
            let texts: Vec<String> = remaining.by_ref().cloned().collect();
            if texts.is_empty() && rule.required {
                return Err(Rejection::MissingArgument { name: rule.name });
            }
            values.push(Some(ArgValue::Texts(texts)));
            continue;
        }

        let value = match remaining.next() {
            Some(token) => Some(parse(rule, token)?),
            None if rule.required => return Err(Rejection::MissingArgument { name: rule.name }),
            None => rule.default.clone(),
        };
        values.push(value);
    }

    Ok(Args(values))
}

fn parse(rule: &ArgRule, token: &str) -> Result<ArgValue, Rejection> {
    match rule.kind {
        ArgKind::Integer => integer(rule, token).map(ArgValue::Integer),
        ArgKind::FreeText => Ok(ArgValue::Text(token.to_owned())),
        ArgKind::VariadicText => Ok(ArgValue::Texts(vec![token.to_owned()])),
        ArgKind::DiceNotation => dice::parse(token).map(ArgValue::Dice),
        ArgKind::RepeatCount => repeat_count(rule, token).map(ArgValue::Count),
        ArgKind::Member => member(token)
            .map(ArgValue::Member)
            .ok_or_else(|| Rejection::InvalidArgument {
                name: rule.name,
                value: token.to_owned(),
            }),
    }
}

fn integer(rule: &ArgRule, token: &str) -> Result<i64, Rejection> {
    token.parse().map_err(|_| Rejection::InvalidArgument {
        name: rule.name,
        value: token.to_owned(),
    })
}

fn repeat_count(rule: &ArgRule, token: &str) -> Result<u32, Rejection> {
    let too_few = || Rejection::invalid_format("Number of repeats must be positive!");
    let too_many =
        || Rejection::invalid_format(format!("Number of repeats must be at most {MAX_REPEAT}!"));

    let n = match integer(rule, token) {
        Ok(n) => n,
        // A number too large for `i64` is still a number, just out of range.
        Err(rejection) => {
            let (negative, digits) = match token.strip_prefix('-') {
                Some(digits) => (true, digits),
                None => (false, token),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(rejection);
            }
            return Err(if negative { too_few() } else { too_many() });
        }
    };

    if n <= 0 {
        return Err(too_few());
    }
    if n > i64::from(MAX_REPEAT) {
        return Err(too_many());
    }
    Ok(n as u32)
}

fn member(token: &str) -> Option<u64> {
    let id = match token.strip_prefix("<@") {
        Some(rest) => {
            let rest = rest.strip_suffix('>')?;
            rest.strip_prefix('!').unwrap_or(rest)
        }
        None => token,
    };
    id.parse().ok().filter(|id| *id != 0)
}

// Accessors fail only if a command reads its arguments differently from how it declared them.
impl Args {
    fn get(&self, index: usize) -> Option<&ArgValue> {
        self.0.get(index).and_then(Option::as_ref)
    }

    pub fn integer(&self, index: usize) -> Result<i64> {
        match self.get(index) {
            Some(ArgValue::Integer(n)) => Ok(*n),
            other => Err(anyhow!("argument {index} is not an integer: {other:?}")),
        }
    }

    pub fn opt_text(&self, index: usize) -> Result<Option<&str>> {
        match self.get(index) {
            Some(ArgValue::Text(s)) => Ok(Some(s.as_str())),
            None => Ok(None),
            other => Err(anyhow!("argument {index} is not text: {other:?}")),
        }
    }

    pub fn text(&self, index: usize) -> Result<&str> {
        self.opt_text(index)?
            .ok_or(anyhow!("argument {index} is missing"))
    }

    pub fn texts(&self, index: usize) -> Result<&[String]> {
        match self.get(index) {
            Some(ArgValue::Texts(v)) => Ok(v.as_slice()),
            other => Err(anyhow!("argument {index} is not variadic text: {other:?}")),
        }
    }

    pub fn dice(&self, index: usize) -> Result<Dice> {
        match self.get(index) {
            Some(ArgValue::Dice(d)) => Ok(*d),
            other => Err(anyhow!("argument {index} is not dice notation: {other:?}")),
        }
    }

    pub fn count(&self, index: usize) -> Result<u32> {
        match self.get(index) {
            Some(ArgValue::Count(n)) => Ok(*n),
            other => Err(anyhow!("argument {index} is not a repeat count: {other:?}")),
        }
    }

    pub fn opt_member(&self, index: usize) -> Result<Option<u64>> {
        match self.get(index) {
            Some(ArgValue::Member(id)) => Ok(Some(*id)),
            None => Ok(None),
            other => Err(anyhow!("argument {index} is not a member: {other:?}")),
        }
    }
}
