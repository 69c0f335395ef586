//! CLI for validating and filtering client, worker and task sheets.
//!
//! Rows are read from JSON files (an array of objects). Results go to stdout
//! as JSON; logs go to stderr.

mod cli;

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;

use cli::{Cli, Commands};
use sheet_clean_core::config::CleanConfig;
use sheet_clean_core::expression::{clean_generated_expression, test_expression};
use sheet_clean_core::filter::{apply_text_filter, presets};
use sheet_clean_core::row::{rows_from_json, EntityType, Row};
use sheet_clean_core::rules::{validate_rule_structure, Rule, RulesExport};
use sheet_clean_core::schema::fields;
use sheet_clean_core::validation::{group_by_row, run_validations_with, validate_single_field_with};
use sheet_clean_core::FilterError;

fn load_config(path: Option<&Path>) -> Result<CleanConfig> {
    let mut config = match path {
        Some(path) => CleanConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => CleanConfig::default(),
    };
    config.apply_env_overrides()?;
    Ok(config)
}

fn load_rows(path: &Path) -> Result<Vec<Row>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    rows_from_json(&text).with_context(|| format!("Failed to decode rows in {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parses a CLI value as JSON, falling back to a plain string.
fn cell_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn report_filter_error(err: FilterError) -> ExitCode {
    eprintln!("{}", err.message);
    if let Some(details) = err.details {
        eprintln!("{}", details);
    }
    ExitCode::FAILURE
}

fn filter_rows(
    entity: EntityType,
    rows: &[Row],
    query: Option<String>,
    expression: Option<String>,
    config: &CleanConfig,
) -> Result<Vec<Row>, FilterError> {
    match expression {
        Some(expression) => {
            let cleaned = clean_generated_expression(&expression, config)?;
            let compiled = test_expression(&cleaned, rows, config)?;
            Ok(compiled.filter(rows))
        }
        None => {
            let query = sheet_clean_core::collaborator::validate_query(
                query.as_deref().unwrap_or_default(),
                config,
            )?;
            Ok(apply_text_filter(&query, rows, entity))
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate {
            entity,
            input,
            grouped,
        } => {
            let rows = load_rows(&input)?;
            let diagnostics = run_validations_with(entity, &rows, &config);
            tracing::info!(
                entity = %entity,
                rows = rows.len(),
                diagnostics = diagnostics.len(),
                "Validation finished"
            );
            if grouped {
                print_json(&group_by_row(&diagnostics))?;
            } else {
                print_json(&diagnostics)?;
            }
            Ok(if diagnostics.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
        Commands::Field {
            entity,
            field,
            value,
            row,
        } => {
            let row: Row = serde_json::from_str(&row).context("--row must be a JSON object")?;
            match validate_single_field_with(entity, &field, &cell_value(&value), &row, &config) {
                Some(message) => {
                    println!("{}", message);
                    Ok(ExitCode::from(2))
                }
                None => {
                    println!("ok");
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
        Commands::Filter {
            entity,
            input,
            query,
            expression,
        } => {
            let rows = load_rows(&input)?;
            match filter_rows(entity, &rows, query, expression, &config) {
                Ok(kept) => {
                    tracing::info!(kept = kept.len(), total = rows.len(), "Filter applied");
                    print_json(&kept)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => Ok(report_filter_error(err)),
            }
        }
        Commands::Presets { entity } => {
            for preset in presets(entity) {
                println!("{:<24} {}", preset.label, preset.query);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Schema { entity } => {
            print_json(&fields(entity))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Rules { input } => {
            let text = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let rules: Vec<Rule> = serde_json::from_str(&text)
                .with_context(|| format!("Failed to decode rules in {}", input.display()))?;
            let mut invalid = 0;
            for rule in &rules {
                let check = validate_rule_structure(rule);
                for error in &check.errors {
                    eprintln!("{}: {}", rule.id, error);
                }
                if !check.is_valid {
                    invalid += 1;
                }
            }
            if invalid > 0 {
                eprintln!("{} of {} rules are invalid", invalid, rules.len());
                return Ok(ExitCode::from(2));
            }
            print_json(&RulesExport::new(&rules, None))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
