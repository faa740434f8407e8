//! crates/program_core/src/policy.rs
//!
//! The skip-eligibility policy consulted by the day-access gate.

use crate::domain::{AnswerProfile, DayNumber};

/// Decides whether a user may bypass the previous-day video requirement.
pub trait SkipPolicy: Send + Sync {
    fn can_skip_to_day(&self, profile: Option<&AnswerProfile>, day_number: DayNumber) -> bool;
}

/// Never grants a skip. This is the production default until a real rule is agreed on.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSkipPolicy;

impl SkipPolicy for NoSkipPolicy {
    fn can_skip_to_day(&self, _profile: Option<&AnswerProfile>, _day_number: DayNumber) -> bool {
        false
    }
}

impl<F> SkipPolicy for F
where
    F: Fn(Option<&AnswerProfile>, DayNumber) -> bool + Send + Sync,
{
    fn can_skip_to_day(&self, profile: Option<&AnswerProfile>, day_number: DayNumber) -> bool {
        self(profile, day_number)
    }
}
