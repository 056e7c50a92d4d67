//! Parser for the Flux subset the in-memory store evaluates.
//!
//! ```text
//! from(bucket: "<name>")
//!   |> range(start: <time>[, stop: <time>])
//!   [|> filter(fn: (r) => r._measurement == "<key>")]
//! ```
//!
//! `<time>` is a duration literal relative to now (`-1h`, `-1h30m`, `2d`), `now()`,
//! an RFC3339 timestamp, or an integer of Unix seconds.

use chrono::{DateTime, TimeDelta, Utc};

use super::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TimeExpr {
    Now,
    Relative(TimeDelta),
    Absolute(DateTime<Utc>),
}

impl TimeExpr {
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, StoreError> {
        match self {
            TimeExpr::Now => Ok(now),
            TimeExpr::Absolute(t) => Ok(*t),
            TimeExpr::Relative(delta) => now
                .checked_add_signed(*delta)
                .ok_or_else(|| StoreError::ParseError(format!("Duration {} out of range", delta))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FluxQuery {
    pub bucket: String,
    pub start: TimeExpr,
    pub stop: Option<TimeExpr>,
    pub measurement: Option<String>,
}

pub(crate) fn parse(query: &str) -> Result<FluxQuery, StoreError> {
    let stages = split_top_level(query, "|>")?;
    let mut stages = stages.into_iter();

    let (name, args) = parse_call(stages.next().unwrap_or_default())?;
    if name != "from" {
        return Err(StoreError::UnsupportedQuery(format!("Query must start with from(), found {}()", name)));
    }
    let bucket = match named_args(args)?.as_slice() {
        [("bucket", value)] => parse_string_literal(value)?,
        _ => return Err(StoreError::ParseError("from() takes exactly one bucket argument".into())),
    };

    let (name, args) = parse_call(stages.next().unwrap_or_default())?;
    if name != "range" {
        return Err(StoreError::UnsupportedQuery(format!("Expected range() after from(), found {}()", name)));
    }
    let (start, stop) = parse_range_args(args)?;

    let measurement = match stages.next() {
        Some(stage) => {
            let (name, args) = parse_call(stage)?;
            if name != "filter" {
                return Err(StoreError::UnsupportedQuery(format!("Unsupported stage {}()", name)));
            }
            Some(parse_measurement_filter(args)?)
        }
        None => None,
    };

    if let Some(extra) = stages.next() {
        return Err(StoreError::UnsupportedQuery(format!("Unexpected stage: {}", extra.trim())));
    }

    Ok(FluxQuery { bucket, start, stop, measurement })
}

fn parse_range_args(args: &str) -> Result<(TimeExpr, Option<TimeExpr>), StoreError> {
    let mut start = None;
    let mut stop = None;
    for (key, value) in named_args(args)? {
        match key {
            "start" if start.is_none() => start = Some(parse_time_expr(value)?),
            "stop" if stop.is_none() => stop = Some(parse_time_expr(value)?),
            _ => return Err(StoreError::ParseError(format!("Unexpected range() argument: {}", key))),
        }
    }
    let start = start.ok_or_else(|| StoreError::ParseError("range() requires start".into()))?;
    Ok((start, stop))
}

/// Accepts only `fn: (r) => r._measurement == "<key>"`.
fn parse_measurement_filter(args: &str) -> Result<String, StoreError> {
    let function = match named_args(args)?.as_slice() {
        [("fn", function)] => *function,
        _ => return Err(StoreError::ParseError("filter() takes exactly one fn argument".into())),
    };

    let (params, body) = function
        .split_once("=>")
        .ok_or_else(|| StoreError::ParseError("filter fn must be a lambda".into()))?;
    let param = params
        .trim()
        .strip_prefix('(')
        .and_then(|p| p.strip_suffix(')'))
        .map(str::trim)
        .filter(|p| is_identifier(p))
        .ok_or_else(|| StoreError::ParseError(format!("Invalid lambda parameters: {}", params.trim())))?;

    let (lhs, rhs) = body
        .split_once("==")
        .ok_or_else(|| StoreError::UnsupportedQuery(format!("Unsupported predicate: {}", body.trim())))?;
    if lhs.trim() != format!("{}._measurement", param) {
        return Err(StoreError::UnsupportedQuery(format!("Unsupported predicate column: {}", lhs.trim())));
    }
    parse_string_literal(rhs)
}

fn parse_time_expr(raw: &str) -> Result<TimeExpr, StoreError> {
    let s = raw.trim();
    if s == "now()" {
        return Ok(TimeExpr::Now);
    }
    if let Some(delta) = parse_duration(s)? {
        return Ok(TimeExpr::Relative(delta));
    }
    if let Ok(secs) = s.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0)
            .map(TimeExpr::Absolute)
            .ok_or_else(|| StoreError::ParseError(format!("Unix time out of range: {}", s)));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|t| TimeExpr::Absolute(t.with_timezone(&Utc)))
        .map_err(|e| StoreError::ParseError(format!("Invalid time expression {:?}: {}", s, e)))
}

/// Parses a Flux duration literal such as `-1h30m`.
///
/// `Ok(None)` when the text is not shaped like a duration at all (no unit
/// letters), so the caller can try other forms.
fn parse_duration(s: &str) -> Result<Option<TimeDelta>, StoreError> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if body.is_empty()
        || !body.starts_with(|c: char| c.is_ascii_digit())
        || !body.chars().any(char::is_alphabetic)
        || !body.chars().all(|c| c.is_ascii_digit() || c.is_alphabetic())
    {
        return Ok(None);
    }

    let invalid = || StoreError::ParseError(format!("Invalid duration literal: {}", s));
    let mut total_ns: i64 = 0;
    let mut rest = body;
    while !rest.is_empty() {
        let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let unit_end = rest[digits_end..]
            .find(|c: char| c.is_ascii_digit())
            .map_or(rest.len(), |i| digits_end + i);
        if digits_end == 0 || unit_end == digits_end {
            return Err(invalid());
        }

        let number: i64 = rest[..digits_end].parse().map_err(|_| invalid())?;
        let unit_ns: i64 = match &rest[digits_end..unit_end] {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 60 * 60 * 1_000_000_000,
            "d" => 24 * 60 * 60 * 1_000_000_000,
            "w" => 7 * 24 * 60 * 60 * 1_000_000_000,
            "mo" => 30 * 24 * 60 * 60 * 1_000_000_000, // Approximate month = 30 days
            "y" => 365 * 24 * 60 * 60 * 1_000_000_000, // Approximate year = 365 days
            unit => return Err(StoreError::ParseError(format!("Unsupported duration unit: {}", unit))),
        };
        total_ns = number
            .checked_mul(unit_ns)
            .and_then(|ns| total_ns.checked_add(ns))
            .ok_or_else(|| StoreError::ParseError(format!("Duration overflowed i64 nanoseconds: {}", s)))?;
        rest = &rest[unit_end..];
    }

    let total_ns = if negative { -total_ns } else { total_ns };
    Ok(Some(TimeDelta::nanoseconds(total_ns)))
}

/// Decodes a double-quoted Flux string literal. Interpolation (`${`) is not
/// evaluated and is rejected.
pub(crate) fn parse_string_literal(raw: &str) -> Result<String, StoreError> {
    let s = raw.trim();
    let inner = s
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| StoreError::ParseError(format!("Expected string literal, found {}", s)))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some('$') => out.push('$'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                other => {
                    return Err(StoreError::ParseError(format!(
                        "Invalid escape sequence \\{} in {}",
                        other.map(String::from).unwrap_or_default(),
                        s
                    )));
                }
            },
            '"' => return Err(StoreError::ParseError(format!("Unescaped quote in {}", s))),
            '$' if chars.peek() == Some(&'{') => {
                return Err(StoreError::UnsupportedQuery(format!("String interpolation in {}", s)));
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Splits `name(args)` into its name and the text between the parentheses.
fn parse_call(stage: &str) -> Result<(&str, &str), StoreError> {
    let stage = stage.trim();
    let open = stage
        .find('(')
        .ok_or_else(|| StoreError::ParseError(format!("Expected a function call, found {:?}", stage)))?;
    let name = stage[..open].trim();
    let args = stage[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| StoreError::ParseError(format!("Unterminated call: {}", stage)))?;
    if !is_identifier(name) {
        return Err(StoreError::ParseError(format!("Invalid function name: {:?}", name)));
    }
    Ok((name, args))
}

/// Splits `key: value, key: value` at top-level commas.
fn named_args(args: &str) -> Result<Vec<(&str, &str)>, StoreError> {
    if args.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(args, ",")?
        .into_iter()
        .map(|arg| {
            let (key, value) = arg
                .split_once(':')
                .ok_or_else(|| StoreError::ParseError(format!("Expected named argument, found {:?}", arg.trim())))?;
            let key = key.trim();
            if !is_identifier(key) {
                return Err(StoreError::ParseError(format!("Invalid argument name: {:?}", key)));
            }
            Ok((key, value.trim()))
        })
        .collect()
}

/// Splits on `sep` outside string literals and parentheses.
fn split_top_level<'a>(s: &'a str, sep: &str) -> Result<Vec<&'a str>, StoreError> {
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut last = 0;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(StoreError::ParseError("Unbalanced parentheses".into()));
                }
            }
            _ if depth == 0 && i >= last && s[i..].starts_with(sep) => {
                parts.push(&s[last..i]);
                last = i + sep.len();
            }
            _ => {}
        }
    }

    if in_string {
        return Err(StoreError::ParseError("Unterminated string literal".into()));
    }
    if depth != 0 {
        return Err(StoreError::ParseError("Unbalanced parentheses".into()));
    }
    parts.push(&s[last..]);
    Ok(parts)
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
