//! Fight validity filter
//!
//! An attempt takes part in progression tracking only when every metric the
//! comparison depends on is known. Unknown values exclude the attempt; they
//! are never read as zero.

use crate::models::Attempt;

/// Whether an attempt is eligible for progression tracking
///
/// Requires a known, non-zero difficulty, a known kill flag, known boss and
/// fight percentages, a computable duration, and no echo buff. A missing echo
/// flag is accepted; a known-true one is not, since buffed numbers are not
/// comparable.
pub fn is_valid_attempt(attempt: &Attempt) -> bool {
    matches!(attempt.difficulty, Some(d) if d != 0)
        && attempt.duration_ms().is_some()
        && attempt.kill.is_some()
        && attempt.boss_percentage.is_some()
        && attempt.fight_percentage.is_some()
        && attempt.has_echo != Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Attempt {
        Attempt {
            id: 1,
            zone_id: 1077,
            zone_name: "Abyssos: The Fifth Circle (Savage)".to_string(),
            boss_id: 83,
            difficulty: Some(101),
            start_time: 0,
            end_time: 60_000,
            kill: Some(false),
            fight_percentage: Some(4500),
            boss_percentage: Some(4500),
            last_phase: Some(1),
            has_echo: Some(false),
            standard_composition: Some(true),
        }
    }

    #[test]
    fn test_complete_attempt_is_valid() {
        assert!(is_valid_attempt(&valid()));
    }

    #[test]
    fn test_unknown_or_zero_difficulty() {
        assert!(!is_valid_attempt(&Attempt { difficulty: None, ..valid() }));
        assert!(!is_valid_attempt(&Attempt { difficulty: Some(0), ..valid() }));
    }

    #[test]
    fn test_unknown_metrics_exclude() {
        assert!(!is_valid_attempt(&Attempt { kill: None, ..valid() }));
        assert!(!is_valid_attempt(&Attempt { boss_percentage: None, ..valid() }));
        assert!(!is_valid_attempt(&Attempt { fight_percentage: None, ..valid() }));
    }

    #[test]
    fn test_inverted_or_overflowing_offsets_exclude() {
        assert!(!is_valid_attempt(&Attempt {
            start_time: 500_000,
            end_time: 100_000,
            ..valid()
        }));
        assert!(!is_valid_attempt(&Attempt {
            start_time: i64::MIN,
            end_time: i64::MAX,
            ..valid()
        }));
        // Zero-length attempts are still measurable
        assert!(is_valid_attempt(&Attempt {
            start_time: 1_000,
            end_time: 1_000,
            ..valid()
        }));
    }

    #[test]
    fn test_echo() {
        assert!(!is_valid_attempt(&Attempt { has_echo: Some(true), ..valid() }));
        assert!(is_valid_attempt(&Attempt { has_echo: None, ..valid() }));
    }

    #[test]
    fn test_optional_phase_and_comp_do_not_matter() {
        assert!(is_valid_attempt(&Attempt {
            last_phase: None,
            standard_composition: None,
            ..valid()
        }));
    }
}
