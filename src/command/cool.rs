use crate::{
    args::{ArgKind, ArgRule, Args},
    context::{CommandContext, Reply},
    error::BotError,
    registry::{CommandHandler, CommandSpec},
};
use anyhow::Result;

/// Says if a user is cool.  In reality only the bot is.
pub struct Cool;

/// `cool bot`
pub struct CoolBot;

pub fn spec() -> Result<CommandSpec, BotError> {
    CommandSpec::new("cool", Cool)
        .usage("cool <name> - say if someone is cool")
        .arg(ArgRule::optional("name", ArgKind::FreeText))
        .subcommand(CommandSpec::new("bot", CoolBot).usage("cool bot - is the bot cool?"))
}

#[serenity::async_trait]
impl CommandHandler for Cool {
    /// Only reached when no subcommand matched.
    async fn call(&self, _ctx: &CommandContext, args: Args) -> Result<Vec<Reply>> {
        let name = args.opt_text(0)?.unwrap_or("that");
        Ok(vec![Reply::text(format!("No, {} is not cool", name))])
    }
}

#[serenity::async_trait]
impl CommandHandler for CoolBot {
    async fn call(&self, _ctx: &CommandContext, _args: Args) -> Result<Vec<Reply>> {
        Ok(vec![Reply::text("Yes, the bot is cool.")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{args::validate, command::testing};

    #[tokio::test]
    async fn nobody_else_is_cool() {
        let spec = spec().unwrap();
        let args = validate(&spec.rules, &[]).unwrap();
        let replies = Cool.call(&testing::context(), args).await.unwrap();
        assert_eq!(testing::text(&replies), "No, that is not cool");
    }
}
