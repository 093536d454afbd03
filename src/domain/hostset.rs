// Copyright (c) 2025 - Cowboy AI, Inc.
//! Host-Set Expressions
//!
//! Compact notation naming many equipment at once, as written in inventory
//! files:
//!
//! ```text
//! set     := pattern ("," pattern)*
//! pattern := (literal | group)+
//! group   := "[" range ("," range)* "]"
//! range   := num ("-" num ("/" step)?)?
//! ```
//!
//! Several groups in one pattern expand as a cartesian product. A lower bound
//! written with a leading zero fixes the padding width of the whole range.
//! An expression never expands to more than [`MAX_HOSTS`] names.
//!
//! # Examples
//!
//! ```rust
//! use monsync::domain::HostSet;
//!
//! let set = HostSet::parse("gecn[01-03],geadm1").unwrap();
//! assert_eq!(set.names(), ["gecn01", "gecn02", "gecn03", "geadm1"]);
//! ```

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit1},
    combinator::{all_consuming, map, opt},
    multi::{many1, separated_list1},
    sequence::{delimited, pair, preceded},
    IResult,
};
use std::collections::HashSet;
use thiserror::Error;

/// Upper bound on the names one expression expands to
pub const MAX_HOSTS: usize = 65_536;

/// Host-set expression error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostSetError {
    #[error("host-set expression is empty")]
    Empty,

    #[error("invalid host-set expression {expression:?} at {remaining:?}")]
    Syntax { expression: String, remaining: String },

    #[error("reversed range [{start}-{end}] in host-set expression {expression:?}")]
    ReversedRange {
        expression: String,
        start: u64,
        end: u64,
    },

    #[error("zero step in host-set expression {0:?}")]
    ZeroStep(String),

    #[error("number {number} out of range in host-set expression {expression:?}")]
    Number { expression: String, number: String },

    #[error("host-set expression {0:?} expands to more than {MAX_HOSTS} names")]
    TooLarge(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Group(Vec<RangeBounds<'a>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RangeBounds<'a> {
    start: &'a str,
    end: Option<&'a str>,
    step: Option<&'a str>,
}

fn is_literal_char(c: char) -> bool {
    !matches!(c, ',' | '[' | ']') && !c.is_whitespace()
}

fn literal(input: &str) -> IResult<&str, Segment<'_>> {
    map(take_while1(is_literal_char), Segment::Literal)(input)
}

fn range(input: &str) -> IResult<&str, RangeBounds<'_>> {
    map(
        pair(
            digit1,
            opt(pair(
                preceded(char('-'), digit1),
                opt(preceded(char('/'), digit1)),
            )),
        ),
        |(start, bounds)| match bounds {
            Some((end, step)) => RangeBounds {
                start,
                end: Some(end),
                step,
            },
            None => RangeBounds {
                start,
                end: None,
                step: None,
            },
        },
    )(input)
}

fn group(input: &str) -> IResult<&str, Segment<'_>> {
    map(
        delimited(char('['), separated_list1(char(','), range), char(']')),
        Segment::Group,
    )(input)
}

fn pattern(input: &str) -> IResult<&str, Vec<Segment<'_>>> {
    many1(alt((literal, group)))(input)
}

fn set(input: &str) -> IResult<&str, Vec<Vec<Segment<'_>>>> {
    all_consuming(separated_list1(char(','), pattern))(input)
}

/// Deterministic, duplicate-free list of names expanded from an expression
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostSet {
    names: Vec<String>,
}

impl HostSet {
    /// Parse and expand a host-set expression
    pub fn parse(expression: &str) -> Result<Self, HostSetError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(HostSetError::Empty);
        }

        let (_, patterns) = set(trimmed).map_err(|err| {
            let remaining = match err {
                nom::Err::Error(e) | nom::Err::Failure(e) => e.input.to_string(),
                nom::Err::Incomplete(_) => String::new(),
            };
            HostSetError::Syntax {
                expression: trimmed.to_string(),
                remaining,
            }
        })?;

        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for segments in &patterns {
            for name in expand_pattern(trimmed, segments)? {
                if seen.insert(name.clone()) {
                    names.push(name);
                }
            }
            if names.len() > MAX_HOSTS {
                return Err(HostSetError::TooLarge(trimmed.to_string()));
            }
        }

        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.names.iter()
    }
}

impl IntoIterator for HostSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

fn expand_pattern(expression: &str, segments: &[Segment<'_>]) -> Result<Vec<String>, HostSetError> {
    let mut prefixes = vec![String::new()];
    for segment in segments {
        match segment {
            Segment::Literal(text) => {
                for prefix in &mut prefixes {
                    prefix.push_str(text);
                }
            }
            Segment::Group(ranges) => {
                let values = expand_group(expression, ranges)?;
                if prefixes.len().saturating_mul(values.len()) > MAX_HOSTS {
                    return Err(HostSetError::TooLarge(expression.to_string()));
                }
                prefixes = prefixes
                    .iter()
                    .flat_map(|prefix| values.iter().map(move |value| format!("{prefix}{value}")))
                    .collect();
            }
        }
    }
    Ok(prefixes)
}

fn expand_group(expression: &str, ranges: &[RangeBounds<'_>]) -> Result<Vec<String>, HostSetError> {
    let mut values = Vec::new();
    for bounds in ranges {
        let width = if bounds.start.len() > 1 && bounds.start.starts_with('0') {
            bounds.start.len()
        } else {
            0
        };
        let start = parse_number(expression, bounds.start)?;
        let end = match bounds.end {
            Some(end) => parse_number(expression, end)?,
            None => start,
        };
        let step = match bounds.step {
            Some(step) => parse_number(expression, step)?,
            None => 1,
        };

        if end < start {
            return Err(HostSetError::ReversedRange {
                expression: expression.to_string(),
                start,
                end,
            });
        }
        if step == 0 {
            return Err(HostSetError::ZeroStep(expression.to_string()));
        }
        let count = (end - start) / step + 1;
        if count > (MAX_HOSTS - values.len()) as u64 {
            return Err(HostSetError::TooLarge(expression.to_string()));
        }

        let mut current = start;
        while current <= end {
            values.push(format!("{current:0width$}"));
            current = match current.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
    }
    Ok(values)
}

fn parse_number(expression: &str, digits: &str) -> Result<u64, HostSetError> {
    digits.parse().map_err(|_| HostSetError::Number {
        expression: expression.to_string(),
        number: digits.to_string(),
    })
}
