use crate::{
    args::{ArgKind, ArgRule, Args},
    context::{CommandContext, Reply},
    registry::{CommandHandler, CommandSpec},
};
use anyhow::Result;

/// Rolls dice in `NdN` format.
pub struct Roll;

pub fn spec() -> CommandSpec {
    CommandSpec::new("roll", Roll)
        .alias("dice")
        .usage("roll <NdN> - roll N dice with N sides, e.g. 2d6")
        .arg(ArgRule::required("dice", ArgKind::DiceNotation))
}

#[serenity::async_trait]
impl CommandHandler for Roll {
    async fn call(&self, ctx: &CommandContext, args: Args) -> Result<Vec<Reply>> {
        let dice = args.dice(0)?;
        let roll = dice.roll(ctx.random.as_ref());
        Ok(vec![Reply::text(format!("🎲 {}: {}", dice, roll.render()))])
    }
}
