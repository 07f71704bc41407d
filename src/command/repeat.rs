use crate::{
    args::{ArgKind, ArgRule, ArgValue, Args},
    context::{CommandContext, Reply},
    registry::{CommandHandler, CommandSpec},
};
use anyhow::Result;

/// Repeats a message multiple times.
pub struct Repeat;

pub fn spec() -> CommandSpec {
    CommandSpec::new("repeat", Repeat)
        .usage("repeat <times> [content] - repeat a message up to 10 times")
        .arg(ArgRule::required("times", ArgKind::RepeatCount))
        .arg(
            ArgRule::optional("content", ArgKind::FreeText)
                .with_default(ArgValue::Text("repeating...".to_owned())),
        )
}

#[serenity::async_trait]
impl CommandHandler for Repeat {
    async fn call(&self, _ctx: &CommandContext, args: Args) -> Result<Vec<Reply>> {
        let times = args.count(0)?;
        let content = args.text(1)?;
        Ok((0..times).map(|_| Reply::text(content)).collect())
    }
}
