use crate::{
    args::{ArgKind, ArgRule, Args},
    context::{CommandContext, Reply},
    registry::{CommandHandler, CommandSpec},
};
use anyhow::{anyhow, Result};

/// Adds two numbers together.
pub struct Add;

pub fn spec() -> CommandSpec {
    CommandSpec::new("add", Add)
        .usage("add <left> <right> - add two numbers together")
        .arg(ArgRule::required("left", ArgKind::Integer))
        .arg(ArgRule::required("right", ArgKind::Integer))
}

#[serenity::async_trait]
impl CommandHandler for Add {
    async fn call(&self, _ctx: &CommandContext, args: Args) -> Result<Vec<Reply>> {
        let left = args.integer(0)?;
        let right = args.integer(1)?;
        let sum = left
            .checked_add(right)
            .ok_or(anyhow!("{} + {} overflows", left, right))?;
        Ok(vec![Reply::text(sum.to_string())])
    }
}
