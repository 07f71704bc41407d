use crate::{
    args::Args,
    context::{CommandContext, Reply},
    registry::{CommandHandler, CommandSpec, Registry},
};
use anyhow::Result;

pub struct Help;

pub fn spec() -> CommandSpec {
    CommandSpec::new("help", Help).usage("help - show this help message")
}

fn usage_lines(registry: &Registry, prefix: &str, out: &mut String) {
    for spec in registry.iter() {
        if let Some(usage) = spec.usage {
            out.push_str(prefix);
            out.push_str(usage);
            if !spec.aliases.is_empty() {
                out.push_str(&format!(" (aliases: {})", spec.aliases.join(", ")));
            }
            out.push('\n');
        }
        if let Some(subcommands) = &spec.subcommands {
            usage_lines(subcommands, prefix, out);
        }
    }
}

#[serenity::async_trait]
impl CommandHandler for Help {
    async fn call(&self, ctx: &CommandContext, _args: Args) -> Result<Vec<Reply>> {
        let mut reply = String::new();
        reply.push_str("```\n");
        reply.push_str("Commands:\n");
        usage_lines(&ctx.registry, &ctx.prefix, &mut reply);
        reply.push_str("```\n");
        Ok(vec![Reply::Text(reply)])
    }
}
