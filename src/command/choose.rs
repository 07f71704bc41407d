use crate::{
    args::{ArgKind, ArgRule, Args},
    context::{CommandContext, Reply},
    registry::{CommandHandler, CommandSpec},
};
use anyhow::{anyhow, Result};

/// Chooses between multiple choices, for when you wanna settle the score some other way.
pub struct Choose;

pub fn spec() -> CommandSpec {
    CommandSpec::new("choose", Choose)
        .alias("pick")
        .usage("choose <choice>... - pick one of the given choices at random")
        .arg(ArgRule::required("choices", ArgKind::VariadicText))
}

#[serenity::async_trait]
impl CommandHandler for Choose {
    async fn call(&self, ctx: &CommandContext, args: Args) -> Result<Vec<Reply>> {
        let choices = args.texts(0)?;
        if choices.is_empty() {
            return Err(anyhow!("choose called without choices"));
        }
        let choice = &choices[ctx.random.pick(choices.len())];
        Ok(vec![Reply::text(format!("🎯 **{}**", choice))])
    }
}
