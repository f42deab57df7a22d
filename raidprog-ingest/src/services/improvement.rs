//! Improvement policy
//!
//! Decides whether a newly observed best attempt supersedes the stored one.
//! Lower fight percentage means more progress. A kill beats any non-kill and
//! among kills the shorter duration wins. This is the only rule under which
//! stored progression is overwritten.

use crate::models::{BestAttemptSummary, CharacterProgression};

/// The metrics the improvement policy compares
pub trait ProgressMetrics {
    fn is_kill(&self) -> bool;
    fn duration_ms(&self) -> i64;
    fn fight_percentage(&self) -> i64;
}

impl ProgressMetrics for BestAttemptSummary {
    fn is_kill(&self) -> bool {
        self.is_kill
    }
    fn duration_ms(&self) -> i64 {
        self.duration_ms
    }
    fn fight_percentage(&self) -> i64 {
        self.fight_percentage
    }
}

impl ProgressMetrics for CharacterProgression {
    fn is_kill(&self) -> bool {
        self.is_kill
    }
    fn duration_ms(&self) -> i64 {
        self.duration_ms
    }
    fn fight_percentage(&self) -> i64 {
        self.fight_percentage
    }
}

/// Whether `candidate` supersedes `previous`
///
/// | previous | candidate | improvement when |
/// |----------|-----------|------------------|
/// | none     | any       | always |
/// | no kill  | kill      | always |
/// | kill     | kill      | candidate duration strictly shorter |
/// | no kill  | no kill   | candidate percentage strictly lower |
/// | kill     | no kill   | never |
pub fn is_improvement<P, C>(previous: Option<&P>, candidate: &C) -> bool
where
    P: ProgressMetrics + ?Sized,
    C: ProgressMetrics + ?Sized,
{
    let Some(previous) = previous else {
        return true;
    };

    match (previous.is_kill(), candidate.is_kill()) {
        (false, true) => true,
        (true, true) => candidate.duration_ms() < previous.duration_ms(),
        (false, false) => candidate.fight_percentage() < previous.fight_percentage(),
        (true, false) => false,
    }
}
