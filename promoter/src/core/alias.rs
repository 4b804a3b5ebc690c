//! Step alias rules.
//!
//! Steps without an explicit alias are addressed as `step-<index>`. Explicit
//! aliases matching the reserved `^(step|task)-\d+$` pattern are rejected so
//! they can never collide with synthesized ones.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::Step;

static RESERVED_ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(step|task)-\d+$").unwrap());

/// Whether `alias` is reserved for engine-synthesized aliases.
pub fn is_reserved_alias(alias: &str) -> bool {
    RESERVED_ALIAS_RE.is_match(alias)
}

/// Alias assigned to a step at `index` (0-based) that has none.
pub fn synthesized_alias(index: usize) -> String {
    format!("step-{index}")
}

/// Alias under which the step at `index` runs and publishes its output.
pub fn resolve_alias(step: &Step, index: usize) -> String {
    match step.alias.as_deref() {
        Some(alias) if !alias.is_empty() => alias.to_string(),
        _ => synthesized_alias(index),
    }
}

/// Validate a promotion step list before execution.
///
/// Returns a list of stable error messages (empty on success), in step order.
pub fn validate_steps(steps: &[Step]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, step) in steps.iter().enumerate() {
        if step.kind.trim().is_empty() {
            errors.push(format!("step {index} has an empty kind"));
        }

        if let Some(alias) = step.alias.as_deref().filter(|a| is_reserved_alias(a)) {
            errors.push(format!(
                "step {index} alias '{alias}' matches the reserved pattern {}",
                RESERVED_ALIAS_RE.as_str()
            ));
            continue;
        }

        let alias = resolve_alias(step, index);
        if !seen.insert(alias.clone()) {
            errors.push(format!("step {index} alias '{alias}' is not unique"));
        }
    }

    errors
}
