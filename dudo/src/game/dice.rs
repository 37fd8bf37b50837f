//! Dice generation and accusation scoring.
//!
//! Everything in this module is a pure function over hands of dice;
//! the session actor decides what to do with the results.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single die face, 1..=6.
pub type Die = u8;

/// Die value 1 acts as a wildcard toward any claimed value other
/// than itself.
pub const JOKER: Die = 1;

/// Paso is only defined for full 5-dice hands.
pub const PASO_HAND_SIZE: usize = 5;

/// Kind of accusation a player can raise against another.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccusationKind {
    /// The claimed count of a value exists at least that many times.
    Standard,
    /// The claimed count of a value exists exactly that many times.
    Exact,
    /// The accused player's hand does not actually satisfy paso.
    Paso,
}

impl fmt::Display for AccusationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Standard => "standard",
            Self::Exact => "exact",
            Self::Paso => "paso",
        };
        write!(f, "{repr}")
    }
}

/// Outcome of scoring an accusation against the round's hidden hands.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Resolution {
    /// Whether the accusation was proven right.
    pub correct: bool,
    /// Matching dice across all hands, jokers included. Zero for paso.
    pub actual_count: usize,
    /// How many of those matches were jokers counting as wildcards.
    pub joker_count: usize,
}

/// Rolls `count` independent uniform dice. Fresh randomness per call;
/// each active player gets one roll per round, sized to their
/// remaining-die count.
pub fn roll_hand(count: usize) -> Vec<Die> {
    let mut rng = rand::rng();
    (0..count).map(|_| rng.random_range(1..=6)).collect()
}

/// Checks the fixed paso pattern: exactly 4 distinct values, or
/// exactly 2 distinct values where one of them occurs 4 times.
/// Hands that aren't 5 dice are never paso.
pub fn is_paso(hand: &[Die]) -> bool {
    if hand.len() != PASO_HAND_SIZE {
        return false;
    }

    let mut counts = [0usize; 7];
    for &die in hand {
        counts[die as usize] += 1;
    }
    let distinct = counts.iter().filter(|&&c| c > 0).count();

    match distinct {
        4 => true,
        2 => counts.contains(&4),
        _ => false,
    }
}

/// Scores an accusation against the given hands.
///
/// For `Standard` and `Exact`, occurrences of `value` are counted
/// across every hand in `hands`, with jokers matching any value other
/// than [`JOKER`] itself. `Standard` is correct when the actual count
/// reaches the claim, `Exact` only on an exact hit.
///
/// For `Paso`, `value` and `claimed` are ignored and only
/// `accused_hand` is examined: the accusation (that the hand is not
/// really paso) is correct when [`is_paso`] fails.
pub fn resolve_accusation<'a, I>(
    kind: AccusationKind,
    value: Die,
    claimed: usize,
    hands: I,
    accused_hand: &[Die],
) -> Resolution
where
    I: IntoIterator<Item = &'a [Die]>,
{
    if kind == AccusationKind::Paso {
        return Resolution {
            correct: !is_paso(accused_hand),
            actual_count: 0,
            joker_count: 0,
        };
    }

    let mut matches = 0;
    let mut jokers = 0;
    for hand in hands {
        for &die in hand {
            if die == value {
                matches += 1;
            } else if die == JOKER {
                jokers += 1;
            }
        }
    }
    let actual = matches + jokers;

    let correct = match kind {
        AccusationKind::Standard => actual >= claimed,
        AccusationKind::Exact => actual == claimed,
        AccusationKind::Paso => unreachable!(),
    };

    Resolution {
        correct,
        actual_count: actual,
        joker_count: jokers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_hand_size_and_range() {
        for count in 0..=5 {
            let hand = roll_hand(count);
            assert_eq!(hand.len(), count);
            assert!(hand.iter().all(|&d| (1..=6).contains(&d)));
        }
    }

    #[test]
    fn test_paso_four_distinct() {
        assert!(is_paso(&[1, 2, 3, 4, 4]));
        assert!(is_paso(&[6, 5, 3, 2, 2]));
    }

    #[test]
    fn test_paso_four_of_a_kind_plus_one() {
        assert!(is_paso(&[2, 2, 2, 2, 5]));
        assert!(is_paso(&[5, 1, 5, 5, 5]));
    }

    #[test]
    fn test_paso_rejects_other_distributions() {
        // 1 distinct
        assert!(!is_paso(&[3, 3, 3, 3, 3]));
        // 2 distinct, 3+2 split
        assert!(!is_paso(&[1, 1, 1, 2, 2]));
        // 3 distinct
        assert!(!is_paso(&[1, 1, 2, 2, 3]));
        // 5 distinct
        assert!(!is_paso(&[1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_paso_requires_five_dice() {
        assert!(!is_paso(&[1, 2, 3, 4]));
        assert!(!is_paso(&[1, 2, 3, 4, 5, 6]));
        assert!(!is_paso(&[]));
    }

    #[test]
    fn test_standard_counts_jokers_as_wildcards() {
        let hand = [1, 3, 3, 5];
        let resolution =
            resolve_accusation(AccusationKind::Standard, 3, 3, [hand.as_slice()], &[]);
        assert!(resolution.correct);
        assert_eq!(resolution.actual_count, 3);
        assert_eq!(resolution.joker_count, 1);
    }

    #[test]
    fn test_standard_counts_across_hands() {
        let (a, b, c) = ([2, 2, 4], [1, 2], [6, 6]);
        let hands = [a.as_slice(), b.as_slice(), c.as_slice()];
        let resolution = resolve_accusation(AccusationKind::Standard, 2, 5, hands, &[]);
        // 3 twos + 1 joker = 4 < 5
        assert!(!resolution.correct);
        assert_eq!(resolution.actual_count, 4);
        assert_eq!(resolution.joker_count, 1);
    }

    #[test]
    fn test_joker_only_matches_itself_when_claimed() {
        let (a, b) = ([1, 1, 2, 3], [4, 5]);
        let hands = [a.as_slice(), b.as_slice()];
        let resolution = resolve_accusation(AccusationKind::Standard, 1, 2, hands, &[]);
        assert!(resolution.correct);
        assert_eq!(resolution.actual_count, 2);
        assert_eq!(resolution.joker_count, 0);
    }

    #[test]
    fn test_exact_requires_exact_hit() {
        let (a, b) = ([3, 3, 1], [5, 6]);
        let hands = [a.as_slice(), b.as_slice()];
        // 2 threes + 1 joker = 3
        let exact = resolve_accusation(AccusationKind::Exact, 3, 3, hands, &[]);
        assert!(exact.correct);
        let over = resolve_accusation(AccusationKind::Exact, 3, 2, hands, &[]);
        assert!(!over.correct);
        assert_eq!(over.actual_count, 3);
    }

    #[test]
    fn test_paso_accusation_correct_when_hand_is_not_paso() {
        let none: [&[Die]; 0] = [];
        let caught = resolve_accusation(AccusationKind::Paso, 0, 0, none, &[1, 1, 2, 2, 3]);
        assert!(caught.correct);

        let stands = resolve_accusation(AccusationKind::Paso, 0, 0, none, &[1, 2, 3, 4, 4]);
        assert!(!stands.correct);
    }

    #[test]
    fn test_accusation_kind_display() {
        assert_eq!(AccusationKind::Standard.to_string(), "standard");
        assert_eq!(AccusationKind::Exact.to_string(), "exact");
        assert_eq!(AccusationKind::Paso.to_string(), "paso");
    }
}
