//! Diagnostics for the `promoter` binary.
//!
//! Traces go to stderr so the JSON result on stdout stays machine-readable.
//! Directives come from `PROMOTER_LOG`, then `RUST_LOG`.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable consulted before `RUST_LOG`.
pub const ENV_VAR: &str = "PROMOTER_LOG";

/// Used when neither variable holds a usable directive.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Build the filter from a directive string. Blank or malformed directives
/// fall back to [`DEFAULT_DIRECTIVE`] rather than silencing everything.
pub fn filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// First non-empty value among `PROMOTER_LOG` and `RUST_LOG`.
fn env_directives() -> Option<String> {
    [ENV_VAR, EnvFilter::DEFAULT_ENV]
        .into_iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Install the global subscriber: compact lines on stderr.
///
/// ```bash
/// PROMOTER_LOG=promoter::promote=debug promoter promote --steps steps.json --project p --stage s
/// ```
pub fn init() -> Result<()> {
    tracing_subscriber::registry()
        .with(filter(env_directives().as_deref()))
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init()
        .map_err(|err| anyhow!("install tracing subscriber: {err}"))
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn defaults_to_warnings() {
        assert_eq!(filter(None).max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn explicit_directives_are_used() {
        let filter = filter(Some("warn,promoter::health=trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn blank_or_malformed_directives_fall_back() {
        assert_eq!(filter(Some("  ")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(
            filter(Some("promoter=loudest")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }
}
