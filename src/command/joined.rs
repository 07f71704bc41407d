use crate::{
    args::{ArgKind, ArgRule, Args},
    context::{CommandContext, Reply},
    registry::{CommandHandler, CommandSpec},
};
use anyhow::Result;

/// Says when a member joined.  Without a mention, asks about the caller.
pub struct Joined;

pub fn spec() -> CommandSpec {
    CommandSpec::new("joined", Joined)
        .usage("joined [@member] - show when a member (default: you) joined this server")
        .arg(ArgRule::optional("member", ArgKind::Member))
}

#[serenity::async_trait]
impl CommandHandler for Joined {
    async fn call(&self, ctx: &CommandContext, args: Args) -> Result<Vec<Reply>> {
        let user_id = args.opt_member(0)?.unwrap_or(ctx.caller.id);
        let Some(guild_id) = ctx.origin.guild_id() else {
            return Ok(vec![Reply::text("This command only works in a server.")]);
        };

        let reply = match ctx.gateway.member(guild_id, user_id).await? {
            None => "That user is not a member of this server.".to_owned(),
            // Discord renders `<t:...>` in each reader's own timezone.
            Some(member) => match member.joined_at {
                Some(ts) => format!("{} joined <t:{}>", member.name, ts),
                None => format!("{} joined at an unknown time", member.name),
            },
        };
        Ok(vec![Reply::text(reply)])
    }
}
