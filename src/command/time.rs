use crate::{
    args::Args,
    context::{CommandContext, Reply},
    registry::{CommandHandler, CommandSpec},
};
use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, Utc};

/// Korea Standard Time, UTC+9 without daylight saving.
const KST_OFFSET_SECONDS: i32 = 9 * 3600;

/// Shows the current time in Korea.
pub struct Time;

pub fn spec() -> CommandSpec {
    CommandSpec::new("time", Time).usage("time - show the current time in Korea")
}

fn render(now: DateTime<Utc>) -> Result<String> {
    let kst = FixedOffset::east_opt(KST_OFFSET_SECONDS).ok_or(anyhow!("invalid KST offset"))?;
    Ok(format!(
        "🕐 Current time in Korea: **{} KST**",
        now.with_timezone(&kst).format("%Y-%m-%d %H:%M:%S")
    ))
}

#[serenity::async_trait]
impl CommandHandler for Time {
    async fn call(&self, _ctx: &CommandContext, _args: Args) -> Result<Vec<Reply>> {
        Ok(vec![Reply::text(render(Utc::now())?)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn converts_to_kst() {
        let now = Utc.with_ymd_and_hms(2023, 12, 31, 20, 30, 5).unwrap();
        assert_eq!(
            render(now).unwrap(),
            "🕐 Current time in Korea: **2024-01-01 05:30:05 KST**"
        );
    }
}
