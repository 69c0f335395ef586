//! Parsers for the mixed encodings found in uploaded cells.
//!
//! None of these panic; malformed input comes back as an error value (or a
//! `recovered` flag) for the caller to turn into a diagnostic or a filter miss.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::row::value_text;

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid regex")
});

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Result of splitting a list cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParse {
    /// Trimmed tokens, empty ones included
    pub items: Vec<String>,
}

impl ListParse {
    /// True if any token is empty after trimming (`"a,,b"`, `"a, "`, `""`).
    pub fn has_empty(&self) -> bool {
        self.items.iter().any(|i| i.is_empty())
    }

    /// Tokens with empties dropped.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|s| s.as_str()).filter(|s| !s.is_empty())
    }
}

/// Splits a comma-separated cell, or takes the elements of a JSON array cell.
pub fn parse_list(value: &Value) -> ListParse {
    let items = match value {
        Value::Array(items) => items.iter().map(|v| value_text(v).trim().to_string()).collect(),
        other => value_text(other)
            .split(',')
            .map(|s| s.trim().to_string())
            .collect(),
    };
    ListParse { items }
}

/// Strict numeric parse: the whole trimmed cell must be a finite number.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Strict integer parse; `"2.5"` and `"abc"` are rejected, `5.0` is accepted.
pub fn parse_integer(value: &Value) -> Option<i64> {
    parse_number(value)
        .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
        .map(|f| f as i64)
}

/// Lenient numeric parse of a leading number (`"5 days"` is 5).
pub fn parse_leading_number(text: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(text)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .filter(|f| f.is_finite())
}

/// A set of phase numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PhaseSet {
    /// Inclusive range; `start > end` holds no phases
    Range { start: u32, end: u32 },
    /// Explicit phases
    List { phases: Vec<u32> },
}

impl PhaseSet {
    pub fn contains(&self, phase: i64) -> bool {
        match self {
            PhaseSet::Range { start, end } => phase >= *start as i64 && phase <= *end as i64,
            PhaseSet::List { phases } => phases.iter().any(|p| *p as i64 == phase),
        }
    }

    /// True if `[start, end]` shares at least one phase with this set.
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        if start > end {
            return false;
        }
        match self {
            PhaseSet::Range { start: s, end: e } => {
                s <= e && start <= *e as i64 && end >= *s as i64
            }
            PhaseSet::List { phases } => phases
                .iter()
                .any(|p| (*p as i64) >= start && (*p as i64) <= end),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            PhaseSet::Range { start, end } => start > end,
            PhaseSet::List { phases } => phases.is_empty(),
        }
    }
}

/// A parsed phase cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseParse {
    pub set: PhaseSet,
    /// True when the value was salvaged from malformed input (`"[2-4]"`, `"1,2,"`)
    pub recovered: bool,
}

impl PhaseParse {
    fn clean(set: PhaseSet) -> Self {
        Self {
            set,
            recovered: false,
        }
    }
}

/// Why a phase cell could not be read.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseError {
    #[error("phase list contains a non-numeric value")]
    NotNumeric,
    #[error("phase numbers must be at least 1")]
    NonPositive,
    #[error("no phase numbers found")]
    Unparseable,
}

/// Parses a phase cell: JSON array, `a-b` range, comma list, or digits salvaged
/// from anything else.
pub fn parse_phases(value: &Value) -> Result<PhaseParse, PhaseError> {
    match value {
        Value::Array(items) => phases_from_json(items).map(PhaseParse::clean),
        Value::Number(_) => match parse_integer(value) {
            Some(n) if n >= 1 && n <= u32::MAX as i64 => {
                Ok(PhaseParse::clean(PhaseSet::List {
                    phases: vec![n as u32],
                }))
            }
            Some(_) => Err(PhaseError::NonPositive),
            None => Err(PhaseError::NotNumeric),
        },
        other => parse_phase_text(value_text(other).trim()),
    }
}

fn parse_phase_text(text: &str) -> Result<PhaseParse, PhaseError> {
    if text.is_empty() {
        return Err(PhaseError::Unparseable);
    }
    if text.len() >= 2 && text.starts_with('[') && text.ends_with(']') {
        return match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => phases_from_json(&items).map(PhaseParse::clean),
            _ => {
                let inner = &text[1..text.len() - 1];
                parse_unbracketed(inner).map(|p| PhaseParse {
                    set: p.set,
                    recovered: true,
                })
            }
        };
    }
    parse_unbracketed(text)
}

fn parse_unbracketed(text: &str) -> Result<PhaseParse, PhaseError> {
    let text = text.trim();
    if let Some((a, b)) = text.split_once('-') {
        if let (Ok(start), Ok(end)) = (a.trim().parse::<u32>(), b.trim().parse::<u32>()) {
            if start == 0 || end == 0 {
                return Err(PhaseError::NonPositive);
            }
            return Ok(PhaseParse::clean(PhaseSet::Range { start, end }));
        }
    } else {
        let tokens: Result<Vec<i64>, _> = text.split(',').map(|t| t.trim().parse::<i64>()).collect();
        if let Ok(numbers) = tokens {
            if numbers.iter().any(|n| *n < 1 || *n > u32::MAX as i64) {
                return Err(PhaseError::NonPositive);
            }
            return Ok(PhaseParse::clean(PhaseSet::List {
                phases: numbers.into_iter().map(|n| n as u32).collect(),
            }));
        }
    }
    scan_digits(text)
}

fn scan_digits(text: &str) -> Result<PhaseParse, PhaseError> {
    let phases: Vec<u32> = DIGITS
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u32>().ok())
        .filter(|n| *n >= 1)
        .collect();
    if phases.is_empty() {
        return Err(PhaseError::Unparseable);
    }
    Ok(PhaseParse {
        set: PhaseSet::List { phases },
        recovered: true,
    })
}

fn phases_from_json(items: &[Value]) -> Result<PhaseSet, PhaseError> {
    let mut phases = Vec::with_capacity(items.len());
    for item in items {
        match parse_integer(item) {
            Some(n) if n >= 1 && n <= u32::MAX as i64 => phases.push(n as u32),
            Some(_) => return Err(PhaseError::NonPositive),
            None => {
                return Err(if parse_number(item).is_some_and(|f| f < 1.0) {
                    PhaseError::NonPositive
                } else {
                    PhaseError::NotNumeric
                })
            }
        }
    }
    Ok(PhaseSet::List { phases })
}

/// Why an AvailableSlots cell was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    #[error("must be valid JSON array")]
    NotJsonArray,
    #[error("must contain positive integers")]
    NonPositive,
}

/// Parses a JSON array of positive integers.
pub fn parse_slot_array(value: &Value) -> Result<Vec<u32>, SlotError> {
    let parsed;
    let items = match value {
        Value::Array(items) => items,
        Value::String(s) => {
            parsed = serde_json::from_str::<Value>(s.trim()).map_err(|_| SlotError::NotJsonArray)?;
            match &parsed {
                Value::Array(items) => items,
                _ => return Err(SlotError::NotJsonArray),
            }
        }
        _ => return Err(SlotError::NotJsonArray),
    };
    items
        .iter()
        .map(|item| match item {
            Value::Number(_) => parse_integer(item)
                .filter(|n| *n >= 1 && *n <= u32::MAX as i64)
                .map(|n| n as u32)
                .ok_or(SlotError::NonPositive),
            _ => Err(SlotError::NonPositive),
        })
        .collect()
}

/// Content of an AttributesJSON cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Attributes {
    Object(Map<String, Value>),
    FreeText(String),
}

impl Attributes {
    /// Looks up an attribute by key, ignoring ASCII case and spaces.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let wanted = compact(key);
        match self {
            Attributes::Object(map) => map
                .iter()
                .find(|(k, _)| compact(k) == wanted)
                .map(|(_, v)| v),
            Attributes::FreeText(_) => None,
        }
    }
}

fn compact(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Parses an attributes cell. Anything that is not a JSON object is free text.
pub fn parse_attributes(value: &Value) -> Attributes {
    match value {
        Value::Object(map) => Attributes::Object(map.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s.trim()) {
            Ok(Value::Object(map)) => Attributes::Object(map),
            _ => Attributes::FreeText(s.clone()),
        },
        other => Attributes::FreeText(value_text(other)),
    }
}
