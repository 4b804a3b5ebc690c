//! Load promotion steps and health-check criteria from JSON files, validating
//! the wire shape against embedded JSON Schemas before deserializing.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::core::alias::validate_steps;
use crate::core::types::{Criteria, PromotionResult, State, Step};

pub const PROMOTION_STEPS_SCHEMA: &str = include_str!("../../schemas/promotion_steps.schema.json");
pub const HEALTH_CHECKS_SCHEMA: &str = include_str!("../../schemas/health_checks.schema.json");

/// Load and validate promotion steps (schema + alias rules).
pub fn load_steps(path: &Path) -> Result<Vec<Step>> {
    let steps: Vec<Step> = load_validated(path, PROMOTION_STEPS_SCHEMA, "promotion steps")?;
    let errors = validate_steps(&steps);
    if !errors.is_empty() {
        return Err(anyhow!(
            "invalid promotion steps in {}: {}",
            path.display(),
            errors.join("; ")
        ));
    }
    debug!(path = %path.display(), steps = steps.len(), "loaded promotion steps");
    Ok(steps)
}

/// Load and validate health-check criteria.
pub fn load_criteria(path: &Path) -> Result<Vec<Criteria>> {
    let criteria: Vec<Criteria> = load_validated(path, HEALTH_CHECKS_SCHEMA, "health checks")?;
    debug!(path = %path.display(), checks = criteria.len(), "loaded health checks");
    Ok(criteria)
}

/// Load a shared-state JSON object (e.g. from a previous invocation).
pub fn load_state(path: &Path) -> Result<State> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read state {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse state {}", path.display()))
}

/// Load the result of a previous promotion invocation to resume from.
pub fn load_result(path: &Path) -> Result<PromotionResult> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read result {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse result {}", path.display()))
}

fn load_validated<T: DeserializeOwned>(path: &Path, schema: &str, what: &str) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {what} {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse {what} {}", path.display()))?;
    validate_schema(schema, &value, what)?;
    serde_json::from_value(value).with_context(|| format!("deserialize {what} {}", path.display()))
}

fn validate_schema(schema: &str, value: &Value, what: &str) -> Result<()> {
    let schema_value: Value = serde_json::from_str(schema).context("parse embedded schema")?;
    let compiled =
        validator_for(&schema_value).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(value) {
        let messages = compiled
            .iter_errors(value)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "{what} schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}
