use crate::{error::BotError, registry::Registry};

mod add;
mod choose;
mod cool;
mod help;
mod info;
mod joined;
mod ping;
mod repeat;
mod roll;
mod time;

/// Every built-in command, in help order.
pub fn registry() -> Result<Registry, BotError> {
    let mut registry = Registry::new();
    for spec in [
        help::spec(),
        add::spec(),
        roll::spec(),
        choose::spec(),
        repeat::spec(),
        joined::spec(),
        cool::spec()?,
        time::spec(),
        ping::spec(),
        info::spec(),
    ] {
        registry.register(spec)?;
    }
    Ok(registry)
}
