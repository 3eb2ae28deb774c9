//! Initiative dice.
//!
//! Initiative is a single die roll plus a flat bonus. The random source is
//! always supplied by the caller so that tests can seed it.

use rand::Rng;
use std::fmt;

/// Standard tabletop die types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    /// Roll this die once, returning a value in `1..=sides`.
    pub fn roll_with_rng<R: Rng>(&self, rng: &mut R) -> u32 {
        rng.gen_range(1..=self.sides())
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// A single initiative roll, kept apart from its bonus for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitiativeRoll {
    pub die: DieType,
    pub natural: u32,
    pub bonus: i32,
}

impl InitiativeRoll {
    /// Roll plus bonus, saturating at the `i32` bounds.
    pub fn total(&self) -> i32 {
        (self.natural as i32).saturating_add(self.bonus)
    }
}

impl fmt::Display for InitiativeRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bonus {
            0 => write!(f, "{} [{}] = {}", self.die, self.natural, self.total()),
            b if b > 0 => write!(f, "{}+{} [{}] = {}", self.die, b, self.natural, self.total()),
            b => write!(
                f,
                "{}-{} [{}] = {}",
                self.die,
                b.unsigned_abs(),
                self.natural,
                self.total()
            ),
        }
    }
}

/// Roll initiative: one die plus `bonus`.
pub fn roll_initiative<R: Rng>(rng: &mut R, die: DieType, bonus: i32) -> InitiativeRoll {
    InitiativeRoll {
        die,
        natural: die.roll_with_rng(rng),
        bonus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_die_display() {
        assert_eq!(DieType::D10.sides(), 10);
        assert_eq!(DieType::D20.to_string(), "d20");
    }

    #[test]
    fn test_total_saturates() {
        let high = InitiativeRoll {
            die: DieType::D10,
            natural: 10,
            bonus: i32::MAX,
        };
        assert_eq!(high.total(), i32::MAX);

        let low = InitiativeRoll {
            die: DieType::D10,
            natural: 1,
            bonus: i32::MIN,
        };
        assert_eq!(low.total(), i32::MIN + 1);
    }

    #[test]
    fn test_initiative_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for bonus in -2..=7 {
            for _ in 0..100 {
                let roll = roll_initiative(&mut rng, DieType::D10, bonus);
                assert!((1..=10).contains(&roll.natural));
                assert_eq!(roll.total(), roll.natural as i32 + bonus);
            }
        }
    }

    #[test]
    fn test_roll_display() {
        let roll = InitiativeRoll {
            die: DieType::D10,
            natural: 4,
            bonus: 3,
        };
        assert_eq!(roll.to_string(), "d10+3 [4] = 7");

        let roll = InitiativeRoll {
            die: DieType::D10,
            natural: 4,
            bonus: -1,
        };
        assert_eq!(roll.to_string(), "d10-1 [4] = 3");
    }
}
