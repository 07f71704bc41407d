//! Dice notation, e.g. `2d6` for two six-sided dice.

use crate::{error::Rejection, transport::RandomSource};

/// Upper bound on the number of dice in one roll.
pub const MAX_ROLLS: u32 = 100;

pub const FORMAT_HINT: &str = "Format has to be in NdN!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dice {
    pub rolls: u32,
    /// At most `u64::MAX`.  Larger values are out of range, like `101d6`.
    pub sides: u64,
}

/// Outcome of rolling [`Dice`]: one value per die, in roll order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRoll {
    pub values: Vec<u64>,
}

/// Parse `<rolls>d<sides>`.
///
/// Both segments must be plain decimal numbers without sign or leading zero.  Out of range
/// values are reported the same way as malformed input.
pub fn parse(input: &str) -> Result<Dice, Rejection> {
    // Checked before any numeric parsing so `-1d6` never reaches the integer parser.
    if input.starts_with('-') {
        return Err(Rejection::invalid_format(FORMAT_HINT));
    }

    let mut segments = input.split('d');
    let (Some(rolls), Some(sides), None) = (segments.next(), segments.next(), segments.next())
    else {
        return Err(Rejection::invalid_format(FORMAT_HINT));
    };

    let rolls = segment(rolls)?;
    let sides = segment(sides)?;

    if rolls == 0 || rolls > u64::from(MAX_ROLLS) || sides == 0 {
        return Err(Rejection::invalid_format(FORMAT_HINT));
    }

    Ok(Dice {
        rolls: rolls as u32,
        sides,
    })
}

fn segment(s: &str) -> Result<u64, Rejection> {
    if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Rejection::invalid_format(FORMAT_HINT));
    }
    s.parse()
        .map_err(|_| Rejection::invalid_format(FORMAT_HINT))
}

impl Dice {
    pub fn roll(&self, random: &dyn RandomSource) -> DiceRoll {
        let values = (0..self.rolls)
            .map(|_| random.roll_die(self.sides))
            .collect();
        DiceRoll { values }
    }
}

impl std::fmt::Display for Dice {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}d{}", self.rolls, self.sides)
    }
}

impl DiceRoll {
    pub fn total(&self) -> u128 {
        self.values.iter().map(|v| u128::from(*v)).sum()
    }

    /// Comma separated values followed by their sum, e.g. `4, 4 (total: 8)`.
    pub fn render(&self) -> String {
        let values = self
            .values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} (total: {})", values, self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Fixed, ThreadRandom};

    fn rejected(input: &str) -> bool {
        matches!(parse(input), Err(Rejection::InvalidFormat { .. }))
    }

    #[test]
    fn parses_valid_notation() {
        assert_eq!(parse("2d6"), Ok(Dice { rolls: 2, sides: 6 }));
        assert_eq!(parse("1d1"), Ok(Dice { rolls: 1, sides: 1 }));
        assert_eq!(
            parse("100d20"),
            Ok(Dice {
                rolls: 100,
                sides: 20
            })
        );
    }

    #[test]
    fn rejects_malformed_notation() {
        for input in [
            "", "d", "2d", "d6", "2x6", "2d6d6", "invalid", "2 d6", "+2d6", "2d-6", "02d6",
            "2d06", "0d6", "2d0", "1.5d6", "dd", "2D6",
        ] {
            assert!(rejected(input), "`{input}` should be rejected");
        }
    }

    #[test]
    fn rejects_negative_before_parsing() {
        assert_eq!(parse("-1d6"), Err(Rejection::invalid_format(FORMAT_HINT)));
        assert!(rejected("-0d0"));
        assert!(rejected("-"));
    }

    #[test]
    fn rejects_too_many_rolls() {
        assert!(rejected("101d6"));
        assert!(!rejected("100d6"));
    }

    #[test]
    fn sides_go_up_to_u64_max() {
        assert_eq!(
            parse("1d18446744073709551615"),
            Ok(Dice {
                rolls: 1,
                sides: u64::MAX
            })
        );
        assert!(rejected("1d18446744073709551616"));
        assert!(rejected("1d99999999999999999999"));
    }

    #[test]
    fn roll_produces_one_value_per_die_within_range() {
        let random = ThreadRandom;
        for (rolls, sides) in [(1, 1), (3, 6), (100, 20), (7, 1_000_000)] {
            let dice = parse(&format!("{rolls}d{sides}")).unwrap();
            let roll = dice.roll(&random);
            assert_eq!(roll.values.len(), rolls as usize);
            assert!(roll.values.iter().all(|v| (1..=sides).contains(v)));
        }
    }

    #[test]
    fn render_with_fixed_source() {
        let dice = parse("2d6").unwrap();
        let roll = dice.roll(&Fixed(4));
        assert_eq!(roll.values, vec![4, 4]);
        assert_eq!(roll.total(), 8);
        assert_eq!(roll.render(), "4, 4 (total: 8)");
        assert_eq!(dice.to_string(), "2d6");
    }
}
