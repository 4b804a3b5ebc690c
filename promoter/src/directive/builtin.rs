//! Built-in runners.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::cancel::Cancellation;
use crate::core::types::{PromotionStepResult, State};
use crate::directive::{PromotionStepContext, PromotionStepRunner, Registry, Runner};

pub const COMPOSE_OUTPUT: &str = "compose-output";

pub(crate) fn register_builtins(registry: &mut Registry) {
    registry.register(COMPOSE_OUTPUT, Runner::promotion_step(ComposeOutput));
}

/// Publishes its configuration as output.
///
/// Later steps read the composed values from shared state under this step's
/// alias. Needs no privileged collaborators.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeOutput;

#[async_trait]
impl PromotionStepRunner for ComposeOutput {
    async fn run_promotion_step(
        &self,
        _cancel: &Cancellation,
        ctx: &PromotionStepContext,
    ) -> Result<PromotionStepResult> {
        debug!(alias = %ctx.alias, keys = ctx.config.as_map().len(), "composing output");
        let output = State::from(ctx.config.deep_copy());
        Ok(PromotionStepResult::succeeded().with_output(output))
    }
}
