//! Command name/alias resolution.

use crate::{
    args::{ArgRule, Args},
    context::{CommandContext, Reply},
    error::BotError,
};
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[serenity::async_trait]
pub trait CommandHandler: Sync + Send {
    /// Run the command.  Arguments have already been validated against the command's rules.
    async fn call(&self, ctx: &CommandContext, args: Args) -> Result<Vec<Reply>>;
}

/// A command definition.  Immutable once registered.
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: Vec<&'static str>,
    /// Help line without prefix, e.g. `roll <NdN> - roll dice`.
    pub usage: Option<&'static str>,
    pub rules: Vec<ArgRule>,
    pub handler: Arc<dyn CommandHandler>,
    /// Present for command groups.  A group's own handler runs when no subcommand matches.
    pub subcommands: Option<Registry>,
}

impl CommandSpec {
    pub fn new(name: &'static str, handler: impl CommandHandler + 'static) -> Self {
        Self {
            name,
            aliases: Vec::new(),
            usage: None,
            rules: Vec::new(),
            handler: Arc::new(handler),
            subcommands: None,
        }
    }

    pub fn alias(mut self, alias: &'static str) -> Self {
        self.aliases.push(alias);
        self
    }

    pub fn usage(mut self, usage: &'static str) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn arg(mut self, rule: ArgRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Turn this command into a group (if it isn't one already) and add `sub` to it.
    pub fn subcommand(mut self, sub: CommandSpec) -> Result<Self, BotError> {
        self.subcommands
            .get_or_insert_with(Registry::new)
            .register(sub)?;
        Ok(self)
    }

    pub fn is_group(&self) -> bool {
        self.subcommands.is_some()
    }

    fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

/// A command resolved from the leading tokens of a message.
pub struct Resolved<'r> {
    pub spec: &'r CommandSpec,
    /// Space separated path, e.g. `cool bot` for a subcommand.
    pub qualified_name: String,
    /// Number of leading tokens naming the command; the rest are its arguments.
    pub consumed: usize,
}

#[derive(Default)]
pub struct Registry {
    specs: Vec<CommandSpec>,
    index: HashMap<&'static str, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails if the name or any alias is already taken, including by the command itself.
    pub fn register(&mut self, spec: CommandSpec) -> Result<(), BotError> {
        let mut seen = HashSet::new();
        for key in spec.keys() {
            if self.index.contains_key(key) || !seen.insert(key) {
                return Err(BotError::DuplicateCommand(key.to_owned()));
            }
        }

        let slot = self.specs.len();
        for key in spec.keys() {
            self.index.insert(key, slot);
        }
        self.specs.push(spec);
        Ok(())
    }

    /// Case-sensitive exact match on name or alias.
    pub fn lookup(&self, name: &str) -> Result<&CommandSpec, BotError> {
        self.index
            .get(name)
            .map(|slot| &self.specs[*slot])
            .ok_or_else(|| BotError::CommandNotFound(name.to_owned()))
    }

    /// Resolve `tokens[0]`, descending into groups while the next token names a subcommand.
    pub fn resolve(&self, tokens: &[String]) -> Result<Resolved<'_>, BotError> {
        let first = tokens
            .first()
            .ok_or_else(|| BotError::CommandNotFound(String::new()))?;
        let mut spec = self.lookup(first)?;
        let mut qualified_name = spec.name.to_owned();
        let mut consumed = 1;

        while let (Some(subs), Some(token)) = (&spec.subcommands, tokens.get(consumed)) {
            let Ok(sub) = subs.lookup(token) else {
                break;
            };
            spec = sub;
            qualified_name.push(' ');
            qualified_name.push_str(sub.name);
            consumed += 1;
        }

        Ok(Resolved {
            spec,
            qualified_name,
            consumed,
        })
    }

    /// Commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(&'static str);

    #[serenity::async_trait]
    impl CommandHandler for Echo {
        async fn call(&self, _ctx: &CommandContext, _args: Args) -> Result<Vec<Reply>> {
            Ok(vec![Reply::text(self.0)])
        }
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Registry {
        let mut registry = Registry::new();
        registry
            .register(CommandSpec::new("roll", Echo("roll")).alias("dice"))
            .unwrap();
        registry
            .register(
                CommandSpec::new("cool", Echo("cool"))
                    .subcommand(CommandSpec::new("bot", Echo("cool bot")))
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn lookup_by_name_and_alias() {
        let registry = sample();
        assert_eq!(registry.lookup("roll").unwrap().name, "roll");
        assert_eq!(registry.lookup("dice").unwrap().name, "roll");
        assert!(matches!(
            registry.lookup("Roll"),
            Err(BotError::CommandNotFound(name)) if name == "Roll"
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn rejects_duplicate_names_and_aliases() {
        let mut registry = sample();
        assert!(matches!(
            registry.register(CommandSpec::new("dice", Echo("x"))),
            Err(BotError::DuplicateCommand(key)) if key == "dice"
        ));
        assert!(matches!(
            registry.register(CommandSpec::new("fresh", Echo("x")).alias("roll")),
            Err(BotError::DuplicateCommand(key)) if key == "roll"
        ));
        assert!(matches!(
            registry.register(CommandSpec::new("same", Echo("x")).alias("same")),
            Err(BotError::DuplicateCommand(_))
        ));
        // Failed registrations leave nothing behind.
        assert!(registry.lookup("fresh").is_err());
        assert!(registry.lookup("same").is_err());

        assert!(CommandSpec::new("g", Echo("g"))
            .subcommand(CommandSpec::new("a", Echo("a")))
            .unwrap()
            .subcommand(CommandSpec::new("a", Echo("a")))
            .is_err());
    }

    #[test]
    fn resolves_groups() {
        let registry = sample();

        let r = registry.resolve(&tokens(&["cool", "bot", "extra"])).unwrap();
        assert_eq!(r.qualified_name, "cool bot");
        assert_eq!(r.consumed, 2);

        let r = registry.resolve(&tokens(&["cool", "alice"])).unwrap();
        assert_eq!(r.qualified_name, "cool");
        assert_eq!(r.consumed, 1);
        assert!(r.spec.is_group());

        let r = registry.resolve(&tokens(&["dice", "2d6"])).unwrap();
        assert_eq!(r.qualified_name, "roll");

        assert!(registry.resolve(&[]).is_err());
        assert!(registry.resolve(&tokens(&["bot"])).is_err());
    }
}
