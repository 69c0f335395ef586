//! Natural-language text filter.
//!
//! A query is compiled once into an ordered list of clauses, most specific
//! first. The first clause decides each row. When that clause cannot apply to
//! a row (unresolved column, absent value, non-numeric operand), or the query
//! has no clause at all, the row is kept if the query text appears in any of
//! its values.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

use crate::parsers::{parse_attributes, parse_leading_number, parse_phases, parse_slot_array};
use crate::row::{value_text, EntityType, Row};
use crate::schema::{field_spec, FieldKind};

use super::field_resolver::find_matching_field;

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static LASTS_AND_RUNS_IN: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"tasks?\s+that\s+last\s+(\d+)\s+phases?\s+and\s+run\s+in\s+phase\s+(\d+)")
});
static CATEGORY_LONGER: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(\w+)\s+tasks?\s+(?:longer|more|greater)\s+than\s+(\d+)\s+(?:phases?|duration)")
});
static RANGE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"^(.+?)\s+(?:is|are|in)\s+(\d+)\s+to\s+(\d+)"));
static IN_PHASE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?:tasks?\s+)?in\s+phase\s+(\d+)|(?:^|\s)phase\s+(\d+)"));
static GREATER: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"^(.+?)\s*(greater\s+than|more\s+than|longer\s+than|>=|≥|>)\s*(-?\d+(?:\.\d+)?)")
});
static LESS: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"^(.+?)\s*(less\s+than|fewer\s+than|shorter\s+than|<=|≤|<)\s*(-?\d+(?:\.\d+)?)")
});
static EQUALS: LazyLock<Regex> = LazyLock::new(|| regex(r"^(.+?)\s+(?:equals|is)\s+(.+)$"));
static CONTAINS: LazyLock<Regex> =
    LazyLock::new(|| regex(r"^(.+?)\s+(?:contains?|includes?|has)\s+(.+)$"));
static CONCURRENCY: LazyLock<Regex> =
    LazyLock::new(|| regex(r"concurrenc(?:y|ies)\s*([≥>=]+)\s*(\d+)"));
static GENERIC: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(\w+)\s*(>=|<=|===|==|=|>|<|≥|≤)\s*([\w.\-]+)"));
static ANYWHERE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"^(?:contains?|includes?|has)\s+(.+)$"));

static NOISE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"^(?:.*\b(?:tasks?|workers?|clients?)\s+(?:with|whose|where)\s+|(?:show|find|list|get)\s+(?:me\s+)?(?:all\s+)?)")
});
static TASK_PREFIX: LazyLock<Regex> = LazyLock::new(|| regex(r"^.*\btask\s+"));
static NOISE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| regex(r"\s+(?:is|are)$"));

const CUES: &[&str] = &[
    ">", "<", "=", "≥", "≤", "greater", "less", "fewer", "shorter", "longer", "more", "equals",
    "contain", "include", "has ", " is ", " are ", " to ", "phase", "concurren",
];

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
}

impl CmpOp {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(CmpOp::Gt),
            ">=" | "≥" => Some(CmpOp::Ge),
            "<" => Some(CmpOp::Lt),
            "<=" | "≤" => Some(CmpOp::Le),
            "=" | "==" | "===" => Some(CmpOp::Eq),
            _ => None,
        }
    }

    fn apply(self, left: f64, right: f64) -> bool {
        match self {
            CmpOp::Gt => left > right,
            CmpOp::Ge => left >= right,
            CmpOp::Lt => left < right,
            CmpOp::Le => left <= right,
            CmpOp::Eq => left == right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    LastsAndRunsIn { duration: f64, phase: i64 },
    CategoryLonger { category: String, duration: f64 },
    Range { field: String, start: i64, end: i64 },
    InPhase { phase: i64 },
    Compare { field: String, op: CmpOp, value: f64 },
    Equals { field: String, value: String },
    Contains { field: String, value: String },
    Concurrency { op: CmpOp, value: f64 },
    Generic { field: String, op: CmpOp, value: String },
    Anywhere { value: String },
}

/// A compiled text filter query.
#[derive(Debug, Clone)]
pub struct TextQuery {
    needle: String,
    clauses: Vec<Clause>,
}

impl TextQuery {
    /// Compiles a query. Never fails; unrecognized text just yields no clauses.
    pub fn parse(query: &str) -> Self {
        let needle = query.trim().to_lowercase();
        let clauses = if CUES.iter().any(|cue| needle.contains(cue)) {
            compile_clauses(&needle)
        } else {
            Vec::new()
        };
        Self { needle, clauses }
    }

    /// True when the query has no text; such a query keeps every row.
    pub fn is_blank(&self) -> bool {
        self.needle.is_empty()
    }

    /// Number of structured clauses recognized in the query.
    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Decides whether `row` passes this query.
    pub fn matches(&self, row: &Row, entity: EntityType) -> bool {
        if self.is_blank() {
            return true;
        }
        self.clauses
            .first()
            .and_then(|clause| evaluate(clause, row, entity))
            .unwrap_or_else(|| record_contains(row, &self.needle))
    }

    /// Returns the rows that pass, in input order.
    pub fn filter(&self, rows: &[Row], entity: EntityType) -> Vec<Row> {
        rows.iter()
            .filter(|row| self.matches(row, entity))
            .cloned()
            .collect()
    }
}

/// Filters `rows` with a natural-language query.
pub fn apply_text_filter(query: &str, rows: &[Row], entity: EntityType) -> Vec<Row> {
    let compiled = TextQuery::parse(query);
    let kept = compiled.filter(rows, entity);
    debug!(
        query,
        entity = %entity,
        clauses = compiled.clause_count(),
        kept = kept.len(),
        total = rows.len(),
        "Text filter applied"
    );
    kept
}

fn compile_clauses(q: &str) -> Vec<Clause> {
    let mut clauses = Vec::new();

    if let Some(c) = LASTS_AND_RUNS_IN.captures(q) {
        if let (Some(duration), Some(phase)) = (number(&c, 1), integer(&c, 2)) {
            clauses.push(Clause::LastsAndRunsIn { duration, phase });
        }
    }
    if let Some(c) = CATEGORY_LONGER.captures(q) {
        if let Some(duration) = number(&c, 2) {
            clauses.push(Clause::CategoryLonger {
                category: c[1].to_string(),
                duration,
            });
        }
    }
    if let Some(c) = RANGE.captures(q) {
        if let (Some(start), Some(end)) = (integer(&c, 2), integer(&c, 3)) {
            clauses.push(Clause::Range {
                field: c[1].trim().to_string(),
                start,
                end,
            });
        }
    }
    if let Some(c) = IN_PHASE.captures(q) {
        if let Some(phase) = integer(&c, 1).or_else(|| integer(&c, 2)) {
            clauses.push(Clause::InPhase { phase });
        }
    }
    for (pattern, strict, inclusive) in [(&GREATER, CmpOp::Gt, CmpOp::Ge), (&LESS, CmpOp::Lt, CmpOp::Le)]
    {
        if let Some(c) = pattern.captures(q) {
            if let Some(value) = number(&c, 3) {
                let op = if matches!(&c[2], ">=" | "≥" | "<=" | "≤") {
                    inclusive
                } else {
                    strict
                };
                clauses.push(Clause::Compare {
                    field: c[1].trim().to_string(),
                    op,
                    value,
                });
            }
        }
    }
    if let Some(c) = EQUALS.captures(q) {
        clauses.push(Clause::Equals {
            field: c[1].trim().to_string(),
            value: unquote(&c[2]),
        });
    }
    if let Some(c) = CONTAINS.captures(q) {
        clauses.push(Clause::Contains {
            field: c[1].trim().to_string(),
            value: unquote(&c[2]),
        });
    }
    if let Some(c) = CONCURRENCY.captures(q) {
        if let Some(value) = number(&c, 2) {
            let op = match &c[1] {
                ">" => CmpOp::Gt,
                "=" | "==" | "===" => CmpOp::Eq,
                _ => CmpOp::Ge,
            };
            clauses.push(Clause::Concurrency { op, value });
        }
    }
    if let Some(c) = GENERIC.captures(q) {
        if let Some(op) = CmpOp::from_symbol(&c[2]) {
            clauses.push(Clause::Generic {
                field: c[1].to_string(),
                op,
                value: c[3].to_string(),
            });
        }
    }
    if let Some(c) = ANYWHERE.captures(q) {
        clauses.push(Clause::Anywhere {
            value: unquote(&c[1]),
        });
    }

    clauses
}

fn number(c: &Captures<'_>, group: usize) -> Option<f64> {
    c.get(group).and_then(|m| m.as_str().parse::<f64>().ok())
}

fn integer(c: &Captures<'_>, group: usize) -> Option<i64> {
    c.get(group).and_then(|m| m.as_str().parse::<i64>().ok())
}

fn unquote(s: &str) -> String {
    s.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string()
}

/// Returns `Some(decision)` when the clause applies to the row, `None` otherwise.
fn evaluate(clause: &Clause, row: &Row, entity: EntityType) -> Option<bool> {
    match clause {
        Clause::LastsAndRunsIn { duration, phase } => {
            let actual = numeric(row.get("Duration")?)?;
            let phases = parse_phases(row.get("PreferredPhases")?).ok()?;
            Some(actual == *duration && phases.set.contains(*phase))
        }
        Clause::CategoryLonger { category, duration } => {
            let actual_category = row.non_blank("Category")?;
            let actual = numeric(row.get("Duration")?)?;
            Some(actual_category.eq_ignore_ascii_case(category) && actual > *duration)
        }
        Clause::Range { field, start, end } => {
            let (value, _) = lookup(field, row, entity)?;
            let phases = parse_phases(&value).ok()?;
            Some(phases.set.overlaps(*start, *end))
        }
        Clause::InPhase { phase } => {
            let phases = parse_phases(row.get("PreferredPhases")?).ok()?;
            Some(phases.set.contains(*phase))
        }
        Clause::Compare { field, op, value } => {
            let (actual, _) = lookup(field, row, entity)?;
            Some(op.apply(numeric(&actual)?, *value))
        }
        Clause::Equals { field, value } => {
            let (actual, _) = lookup(field, row, entity)?;
            Some(value_text(&actual).trim().to_lowercase() == *value)
        }
        Clause::Contains { field, value } => {
            let (actual, kind) = lookup(field, row, entity)?;
            Some(contains(&actual, kind, value))
        }
        Clause::Concurrency { op, value } => {
            let actual = numeric(row.get("MaxConcurrent")?)?;
            Some(op.apply(actual, *value))
        }
        Clause::Generic { field, op, value } => {
            let (actual, _) = lookup(field, row, entity)?;
            match (numeric(&actual), value.parse::<f64>().ok()) {
                (Some(left), Some(right)) => Some(op.apply(left, right)),
                _ if *op == CmpOp::Eq => Some(value_text(&actual).trim().to_lowercase() == *value),
                _ => None,
            }
        }
        Clause::Anywhere { value } => Some(record_contains(row, value)),
    }
}

/// Finds the value a phrase refers to: a row column, or failing that a key of
/// the row's attributes object.
fn lookup(phrase: &str, row: &Row, entity: EntityType) -> Option<(Value, Option<FieldKind>)> {
    if let Some(field) = resolve_field(phrase, row, entity) {
        let value = row.get(&field)?.clone();
        return Some((value, field_spec(entity, &field).map(|f| f.kind)));
    }
    let attributes = parse_attributes(row.get("AttributesJSON")?);
    let value = attributes
        .get(phrase)
        .or_else(|| attributes.get(&strip_noise(phrase)))?;
    (!value.is_null()).then(|| (value.clone(), None))
}

fn resolve_field(phrase: &str, row: &Row, entity: EntityType) -> Option<String> {
    find_matching_field(phrase, row, entity).or_else(|| {
        let stripped = strip_noise(phrase);
        (stripped != phrase)
            .then(|| find_matching_field(&stripped, row, entity))
            .flatten()
    })
}

fn strip_noise(phrase: &str) -> String {
    let stripped = NOISE_PREFIX.replace(phrase, "");
    let stripped = if stripped.contains("task ") {
        TASK_PREFIX.replace(&stripped, "").into_owned()
    } else {
        stripped.into_owned()
    };
    NOISE_SUFFIX.replace(stripped.trim(), "").trim().to_string()
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        other => parse_leading_number(&value_text(other)),
    }
}

fn contains(actual: &Value, kind: Option<FieldKind>, needle: &str) -> bool {
    let member = needle.parse::<i64>().ok();
    match (kind, member) {
        (Some(FieldKind::PhaseSet), Some(n)) => {
            if let Ok(parsed) = parse_phases(actual) {
                return parsed.set.contains(n);
            }
        }
        (Some(FieldKind::IntArray), Some(n)) => {
            if let Ok(slots) = parse_slot_array(actual) {
                return slots.iter().any(|s| *s as i64 == n);
            }
        }
        (Some(FieldKind::List), None) if needle.contains(" and ") => {
            let text = value_text(actual).to_lowercase();
            return needle
                .split(" and ")
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .all(|part| text.contains(part));
        }
        _ => {}
    }
    value_text(actual).to_lowercase().contains(needle)
}

fn record_contains(row: &Row, needle: &str) -> bool {
    row.iter()
        .any(|(_, value)| !value.is_null() && value_text(value).to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(id: &str, duration: serde_json::Value, phases: &str) -> Row {
        Row::from_pairs([
            ("TaskID", json!(id)),
            ("TaskName", json!(format!("Task {}", id))),
            ("Category", json!("ETL")),
            ("Duration", duration),
            ("PreferredPhases", json!(phases)),
            ("MaxConcurrent", json!(2)),
        ])
    }

    fn ids(rows: &[Row]) -> Vec<String> {
        rows.iter().filter_map(|r| r.text("TaskID")).collect()
    }

    #[test]
    fn test_greater_than() {
        let rows = vec![task("T1", json!(2), "1-2"), task("T2", json!(5), "1-2")];
        let kept = apply_text_filter("duration greater than 3", &rows, EntityType::Task);
        assert_eq!(ids(&kept), ["T2"]);
        let kept = apply_text_filter("tasks with duration ≥ 2", &rows, EntityType::Task);
        assert_eq!(ids(&kept), ["T1", "T2"]);
    }

    #[test]
    fn test_less_than() {
        let rows = vec![task("T1", json!("2"), "1-2"), task("T2", json!("5"), "1-2")];
        let kept = apply_text_filter("duration less than 3", &rows, EntityType::Task);
        assert_eq!(ids(&kept), ["T1"]);
    }

    #[test]
    fn test_in_phase_uses_phase_parser() {
        let rows = vec![
            task("T1", json!(1), "[2-4]"),
            task("T2", json!(1), "[1,2]"),
            task("T3", json!(1), "1 - 3"),
        ];
        let kept = apply_text_filter("tasks in phase 3", &rows, EntityType::Task);
        assert_eq!(ids(&kept), ["T1", "T3"]);
    }

    #[test]
    fn test_lasts_and_runs_in() {
        let rows = vec![task("T1", json!(2), "1-3"), task("T2", json!(1), "1-3")];
        let kept = apply_text_filter(
            "tasks that last 2 phases and run in phase 3",
            &rows,
            EntityType::Task,
        );
        assert_eq!(ids(&kept), ["T1"]);
    }

    #[test]
    fn test_composite_with_missing_duration_uses_baseline() {
        let rows = vec![Row::from_pairs([
            ("TaskID", json!("T1")),
            ("PreferredPhases", json!("1-3")),
        ])];
        let query = "tasks that last 2 phases and run in phase 3";
        assert!(apply_text_filter(query, &rows, EntityType::Task).is_empty());

        let mut noted = rows[0].clone();
        noted.set("Note", query);
        assert_eq!(apply_text_filter(query, &[noted], EntityType::Task).len(), 1);
    }

    #[test]
    fn test_compare_on_absent_field_uses_baseline() {
        let rows = vec![
            Row::from_pairs([("ClientID", "C1"), ("ClientName", "Acme")]),
            Row::from_pairs([
                ("ClientID", "C2"),
                ("ClientName", "Note: priority level greater than 3"),
            ]),
        ];
        let query = "priority level greater than 3";
        let kept = apply_text_filter(query, &rows, EntityType::Client);
        let baseline: Vec<Row> = rows
            .iter()
            .filter(|row| record_contains(row, query))
            .cloned()
            .collect();
        assert_eq!(kept, baseline);
        assert_eq!(kept[0].text("ClientID").as_deref(), Some("C2"));
    }

    #[test]
    fn test_category_longer_than() {
        let mut design = task("T2", json!(3), "1");
        design.set("Category", "Design");
        let rows = vec![task("T1", json!(3), "1"), design];
        let kept = apply_text_filter("design tasks longer than 1 phase", &rows, EntityType::Task);
        assert_eq!(ids(&kept), ["T2"]);
    }

    #[test]
    fn test_range_overlap() {
        let rows = vec![task("T1", json!(1), "1 - 2"), task("T2", json!(1), "[4,5]")];
        let kept = apply_text_filter("preferred phases is 2 to 3", &rows, EntityType::Task);
        assert_eq!(ids(&kept), ["T1"]);
    }

    #[test]
    fn test_equals_and_contains() {
        let rows = vec![task("T1", json!(1), "1"), task("T2", json!(1), "1")];
        let kept = apply_text_filter("task name is task t2", &rows, EntityType::Task);
        assert_eq!(ids(&kept), ["T2"]);
        let kept = apply_text_filter("category equals etl", &rows, EntityType::Task);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_phase_membership_on_contains() {
        let rows = vec![task("T1", json!(1), "[12]"), task("T2", json!(1), "1-3")];
        let kept = apply_text_filter("preferred phases include 2", &rows, EntityType::Task);
        assert_eq!(ids(&kept), ["T2"]);
    }

    #[test]
    fn test_concurrency() {
        let mut busy = task("T2", json!(1), "1");
        busy.set("MaxConcurrent", 4);
        let rows = vec![task("T1", json!(1), "1"), busy];
        let kept = apply_text_filter("show tasks with concurrency ≥ 3", &rows, EntityType::Task);
        assert_eq!(ids(&kept), ["T2"]);
    }

    #[test]
    fn test_skills_include() {
        let rows = vec![
            Row::from_pairs([("WorkerID", "W1"), ("Skills", "coding,ml")]),
            Row::from_pairs([("WorkerID", "W2"), ("Skills", "design,testing")]),
        ];
        let kept = apply_text_filter("skills include coding", &rows, EntityType::Worker);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text("WorkerID").as_deref(), Some("W1"));
        let kept = apply_text_filter("skills contain coding and ml", &rows, EntityType::Worker);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_attribute_fallback() {
        let rows = vec![
            Row::from_pairs([
                ("ClientID", "C1"),
                ("AttributesJSON", "{\"location\":\"New York\",\"budget\":150000}"),
            ]),
            Row::from_pairs([
                ("ClientID", "C2"),
                ("AttributesJSON", "{\"location\":\"Boston\",\"budget\":90000}"),
            ]),
        ];
        let kept = apply_text_filter("location is New York", &rows, EntityType::Client);
        assert_eq!(kept.len(), 1);
        let kept = apply_text_filter("budget greater than 100000", &rows, EntityType::Client);
        assert_eq!(kept[0].text("ClientID").as_deref(), Some("C1"));
    }

    #[test]
    fn test_substring_baseline() {
        let rows = vec![
            Row::from_pairs([("ClientID", "C1"), ("ClientName", "VIP Client Corp")]),
            Row::from_pairs([("ClientID", "C2"), ("ClientName", "Regular")]),
        ];
        let kept = apply_text_filter("vip client", &rows, EntityType::Client);
        assert_eq!(kept.len(), 1);
        // unresolved field falls through to the baseline
        let kept = apply_text_filter("colour is red", &rows, EntityType::Client);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_blank_query_keeps_everything() {
        let rows = vec![Row::new(), Row::from_pairs([("A", 1)])];
        assert_eq!(apply_text_filter("  ", &rows, EntityType::Task).len(), 2);
    }

    #[test]
    fn test_structured_result_is_authoritative() {
        // row text contains the query words but the comparison says no
        let rows = vec![Row::from_pairs([("Duration", json!(1)), ("Note", json!("duration greater than 3"))])];
        assert!(apply_text_filter("duration greater than 3", &rows, EntityType::Task).is_empty());
    }

    #[test]
    fn test_injection_strings_do_not_panic() {
        let rows = vec![task("T1", json!(1), "1")];
        for q in ["\"); DROP TABLE", "((((", "> < = ≥", "is to phase", "concurrency >="] {
            let kept = apply_text_filter(q, &rows, EntityType::Task);
            assert!(kept.len() <= 1);
        }
    }
}
