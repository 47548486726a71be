use anyhow::Result;

use super::StepContext;

pub fn ready_to_start(ctx: StepContext<'_>) -> Result<bool> {
    ctx.prompter.confirm("ready to start?", false)
}
