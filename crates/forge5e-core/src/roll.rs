//! Ability score rolling (4d6, drop the lowest).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const METHOD_4D6_DROP_LOWEST: &str = "4d6-drop-lowest";

/// One ability roll: four dice, the dropped die, and the kept total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityRoll {
    /// The four d6 results, ascending.
    pub dice: [u8; 4],
    /// Index into `dice` of the dropped die.
    pub dropped_index: usize,
    /// Sum of the three kept dice.
    pub total: i32,
}

/// Six rolls plus their totals sorted from highest to lowest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilitySet {
    pub method: String,
    pub seed: Option<u64>,
    pub rolls: Vec<AbilityRoll>,
    pub scores: Vec<i32>,
}

/// Roll a full set of six ability scores.
///
/// The same `seed` always produces the same set; `None` seeds from the OS.
pub fn roll_ability_set(seed: Option<u64>) -> AbilitySet {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let rolls: Vec<AbilityRoll> = (0..6).map(|_| roll_4d6_drop_lowest(&mut rng)).collect();
    let mut scores: Vec<i32> = rolls.iter().map(|r| r.total).collect();
    scores.sort_unstable_by(|a, b| b.cmp(a));

    AbilitySet {
        method: METHOD_4D6_DROP_LOWEST.to_owned(),
        seed,
        rolls,
        scores,
    }
}

fn roll_4d6_drop_lowest(rng: &mut impl Rng) -> AbilityRoll {
    let mut dice = [0u8; 4];
    for die in &mut dice {
        *die = rng.random_range(1..=6);
    }
    dice.sort_unstable();
    // Ascending order puts the lowest die first.
    let total = dice[1..].iter().map(|&d| i32::from(d)).sum();
    AbilityRoll {
        dice,
        dropped_index: 0,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_rolls_are_reproducible() {
        assert_eq!(roll_ability_set(Some(42)), roll_ability_set(Some(42)));
    }

    #[test]
    fn scores_sorted_descending_and_in_range() {
        let set = roll_ability_set(Some(7));
        assert_eq!(set.method, "4d6-drop-lowest");
        assert_eq!(set.seed, Some(7));
        assert_eq!(set.rolls.len(), 6);
        assert_eq!(set.scores.len(), 6);
        assert!(set.scores.windows(2).all(|w| w[0] >= w[1]));
        assert!(set.scores.iter().all(|s| (3..=18).contains(s)));
    }

    #[test]
    fn each_roll_drops_its_lowest_die() {
        let set = roll_ability_set(None);
        for roll in &set.rolls {
            assert!(roll.dice.windows(2).all(|w| w[0] <= w[1]));
            assert!(roll.dice.iter().all(|d| (1..=6).contains(d)));
            assert_eq!(roll.dropped_index, 0);
            let kept: i32 = roll.dice[1..].iter().map(|&d| i32::from(d)).sum();
            assert_eq!(roll.total, kept);
        }
    }

    #[test]
    fn scores_are_roll_totals() {
        let set = roll_ability_set(Some(1234));
        let mut totals: Vec<i32> = set.rolls.iter().map(|r| r.total).collect();
        totals.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(totals, set.scores);
    }
}
