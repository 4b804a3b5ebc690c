//! Command-line front end for the promotion engine.
//!
//! Runs promotion steps or health checks from JSON files using the built-in
//! runners, prints the structured result on stdout and maps it to an exit
//! code (see [`promoter::exit_codes`]).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use promoter::cancel::Cancellation;
use promoter::core::health_state::HealthState;
use promoter::core::types::{PromotionContext, PromotionStatus};
use promoter::directive::{Collaborators, Registry};
use promoter::engine::{Engine, SimpleEngine};
use promoter::exit_codes;
use promoter::io::config::{EngineConfig, load_config};
use promoter::io::steps_file::{load_criteria, load_result, load_state, load_steps};
use promoter::logging;

#[derive(Parser)]
#[command(
    name = "promoter",
    version,
    about = "Run promotion steps and health checks"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a promotion steps file against the schema and alias rules.
    Validate {
        #[arg(long)]
        steps: PathBuf,
    },
    /// Run promotion steps and print the promotion result.
    Promote {
        #[arg(long)]
        steps: PathBuf,
        #[arg(long)]
        project: String,
        #[arg(long)]
        stage: String,
        /// Promotion name; defaults to `<stage>.local`.
        #[arg(long)]
        promotion: Option<String>,
        /// Shared state to start from.
        #[arg(long, conflicts_with = "resume")]
        state: Option<PathBuf>,
        /// Result of a previous invocation to resume from.
        #[arg(long)]
        resume: Option<PathBuf>,
        /// Engine configuration (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Cancel the run after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Run health checks and print the aggregated verdict.
    CheckHealth {
        #[arg(long)]
        criteria: PathBuf,
        #[arg(long)]
        project: String,
        #[arg(long)]
        stage: String,
        /// Cancel the run after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("{err:#}");
    }
    let code = match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Validate { steps } => cmd_validate(&steps),
        Command::Promote {
            steps,
            project,
            stage,
            promotion,
            state,
            resume,
            config,
            timeout_secs,
        } => {
            let steps = load_steps(&steps)?;
            let config = match config {
                Some(path) => load_config(&path)?,
                None => EngineConfig::default(),
            };
            let promotion = promotion.unwrap_or_else(|| format!("{stage}.local"));
            let mut promo = PromotionContext::new(project, stage, promotion);
            if let Some(path) = state {
                promo.state = load_state(&path)?;
            }
            if let Some(path) = resume {
                promo = promo.resume_from(&load_result(&path)?);
            }
            let engine = engine(&config);
            block_on(timeout_secs, |cancel| async move {
                let result = engine.promote(&cancel, promo, &steps).await;
                print_json(&result)?;
                Ok(promotion_exit_code(result.status))
            })
        }
        Command::CheckHealth {
            criteria,
            project,
            stage,
            timeout_secs,
        } => {
            let criteria = load_criteria(&criteria)?;
            let engine = engine(&EngineConfig::default());
            block_on(timeout_secs, |cancel| async move {
                let health = engine
                    .check_health(&cancel, &project, &stage, &criteria)
                    .await;
                print_json(&health)?;
                Ok(health_exit_code(health.status))
            })
        }
    }
}

fn cmd_validate(path: &Path) -> Result<i32> {
    let steps = load_steps(path)?;
    println!("ok: {} steps", steps.len());
    Ok(exit_codes::OK)
}

fn engine(config: &EngineConfig) -> SimpleEngine {
    SimpleEngine::new(
        Arc::new(Registry::with_builtins()),
        Collaborators::default(),
        config,
    )
}

/// Drive `task` on a fresh runtime. Ctrl-C and the optional timeout cancel
/// the run cooperatively.
fn block_on<F, Fut>(timeout_secs: Option<u64>, task: F) -> Result<i32>
where
    F: FnOnce(Cancellation) -> Fut,
    Fut: std::future::Future<Output = Result<i32>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    runtime.block_on(async {
        let cancel = Cancellation::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });
        if let Some(secs) = timeout_secs {
            cancel.cancel_after(Duration::from_secs(secs));
        }
        task(cancel).await
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize result")?;
    println!("{payload}");
    Ok(())
}

fn promotion_exit_code(status: PromotionStatus) -> i32 {
    match status {
        PromotionStatus::Succeeded => exit_codes::OK,
        PromotionStatus::Failed | PromotionStatus::Errored => exit_codes::FAILED,
        PromotionStatus::Running => exit_codes::PENDING,
    }
}

fn health_exit_code(status: HealthState) -> i32 {
    match status {
        HealthState::Healthy => exit_codes::OK,
        HealthState::Unhealthy => exit_codes::FAILED,
        HealthState::Progressing | HealthState::Unknown => exit_codes::PENDING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_promote() {
        let cli = Cli::parse_from([
            "promoter",
            "promote",
            "--steps",
            "steps.json",
            "--project",
            "payments",
            "--stage",
            "prod",
            "--timeout-secs",
            "30",
        ]);
        match cli.command {
            Command::Promote {
                project,
                stage,
                promotion,
                timeout_secs,
                ..
            } => {
                assert_eq!(project, "payments");
                assert_eq!(stage, "prod");
                assert_eq!(promotion, None);
                assert_eq!(timeout_secs, Some(30));
            }
            _ => panic!("expected promote"),
        }
    }

    #[test]
    fn state_and_resume_conflict() {
        let parsed = Cli::try_parse_from([
            "promoter",
            "promote",
            "--steps",
            "s.json",
            "--project",
            "p",
            "--stage",
            "s",
            "--state",
            "state.json",
            "--resume",
            "result.json",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn exit_codes_follow_status() {
        assert_eq!(promotion_exit_code(PromotionStatus::Succeeded), exit_codes::OK);
        assert_eq!(promotion_exit_code(PromotionStatus::Errored), exit_codes::FAILED);
        assert_eq!(promotion_exit_code(PromotionStatus::Running), exit_codes::PENDING);
        assert_eq!(health_exit_code(HealthState::Unknown), exit_codes::PENDING);
        assert_eq!(health_exit_code(HealthState::Unhealthy), exit_codes::FAILED);
    }
}
