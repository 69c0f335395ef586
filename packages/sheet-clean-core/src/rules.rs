//! Business rules and the exported rules bundle.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static NEXT_RULE: AtomicU64 = AtomicU64::new(1);

pub const EXPORT_VERSION: &str = "1.0.0";
pub const EXPORT_SOURCE: &str = "SheetClean - Manual Rule Builder";

/// A scheduling rule. `data` is shaped by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Rule {
    /// Creates a rule with a fresh id and both timestamps set to now.
    pub fn new(kind: impl Into<String>, description: impl Into<String>, data: Value) -> Self {
        let now = Utc::now();
        let seq = NEXT_RULE.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("rule-{}-{}", now.timestamp_millis(), seq),
            kind: kind.into(),
            description: description.into(),
            data,
            confidence: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Outcome of [`validate_rule_structure`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCheck {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Builds the `data` payload for a rule of `kind` from loose form options.
///
/// Known kinds keep only the fields they use; other kinds keep every option.
/// The payload always carries a `type` entry.
pub fn build_rule_data(kind: &str, options: &Map<String, Value>) -> Value {
    let keep: &[&str] = match kind {
        "coRun" => &["tasks"],
        "loadLimit" => &["group", "maxSlotsPerPhase"],
        "validation" => &["field", "min", "max"],
        _ => &[],
    };
    let mut data = Map::new();
    data.insert("type".to_string(), Value::String(kind.to_string()));
    if keep.is_empty() {
        for (k, v) in options {
            if k != "type" {
                data.insert(k.clone(), v.clone());
            }
        }
    } else {
        for key in keep {
            data.insert(
                key.to_string(),
                options.get(*key).cloned().unwrap_or(Value::Null),
            );
        }
    }
    Value::Object(data)
}

/// Creates a rule whose data is built by [`build_rule_data`].
pub fn build_rule(kind: &str, description: &str, options: &Map<String, Value>) -> Rule {
    Rule::new(kind, description, build_rule_data(kind, options))
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

fn numeric(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Number(_)) => true,
        Some(Value::String(s)) => {
            let t = s.trim();
            t.is_empty() || t.parse::<f64>().is_ok()
        }
        Some(Value::Bool(_)) => true,
        _ => false,
    }
}

/// Checks that a rule has the fields its kind needs.
pub fn validate_rule_structure(rule: &Rule) -> RuleCheck {
    let mut errors = Vec::new();

    if rule.id.is_empty() {
        errors.push("Rule ID is required".to_string());
    }
    if rule.kind.is_empty() {
        errors.push("Rule type is required".to_string());
    }
    if rule.description.is_empty() {
        errors.push("Rule description is required".to_string());
    }
    let empty = Map::new();
    let data = match &rule.data {
        Value::Object(map) => map,
        Value::Array(_) => &empty,
        _ => {
            errors.push("Rule data must be an object".to_string());
            &empty
        }
    };

    let require = |errors: &mut Vec<String>, key: &str, message: &str| {
        if !truthy(data.get(key)) {
            errors.push(message.to_string());
        }
    };
    match rule.kind.as_str() {
        "coRun" => {
            if !matches!(data.get("tasks"), Some(Value::Array(_))) {
                errors.push("Co-run rules must have a tasks array".to_string());
            }
        }
        "loadLimit" => {
            require(&mut errors, "group", "Load limit rules must specify a group");
            let slots = data.get("maxSlotsPerPhase");
            if !truthy(slots) || !numeric(slots) {
                errors.push("Load limit rules must specify maxSlotsPerPhase as a number".to_string());
            }
        }
        "slotRestriction" => {
            require(&mut errors, "clientGroup", "Slot restriction rules must specify clientGroup");
            require(&mut errors, "workerGroup", "Slot restriction rules must specify workerGroup");
        }
        "phaseWindow" => {
            require(&mut errors, "taskId", "Phase window rules must specify taskId");
            if !truthy(data.get("startPhase")) || !truthy(data.get("endPhase")) {
                errors.push("Phase window rules must specify startPhase and endPhase".to_string());
            }
        }
        "patternMatch" => {
            require(&mut errors, "field", "Pattern match rules must specify field");
            require(&mut errors, "pattern", "Pattern match rules must specify pattern");
        }
        "precedence" => require(&mut errors, "ruleName", "Precedence rules must specify ruleName"),
        _ => {}
    }

    RuleCheck {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Row counts of the data sets exported alongside the rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCounts {
    pub clients_count: usize,
    pub workers_count: usize,
    pub tasks_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub total_rules: usize,
    pub rule_types: Vec<String>,
    pub export_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<EntityCounts>,
}

/// The `rules.json` bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesExport {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub rules: Vec<Rule>,
    pub metadata: ExportMetadata,
}

impl RulesExport {
    /// Bundles `rules`, stamping missing timestamps with the export time.
    pub fn new(rules: &[Rule], counts: Option<EntityCounts>) -> Self {
        let now = Utc::now();
        let mut rule_types: Vec<String> = Vec::new();
        for rule in rules {
            if !rule_types.contains(&rule.kind) {
                rule_types.push(rule.kind.clone());
            }
        }
        let rules = rules
            .iter()
            .cloned()
            .map(|mut r| {
                r.created_at.get_or_insert(now);
                r.updated_at.get_or_insert(now);
                r
            })
            .collect::<Vec<_>>();

        Self {
            version: EXPORT_VERSION.to_string(),
            export_date: now,
            metadata: ExportMetadata {
                total_rules: rules.len(),
                rule_types,
                export_source: EXPORT_SOURCE.to_string(),
                counts,
            },
            rules,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
