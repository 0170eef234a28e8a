// Eligibility filtering

use crate::domain::{LearnerProfile, Program};

/// Check whether a learner qualifies for a program.
///
/// The track must match exactly and the learner's grade average must reach
/// the program minimum.
pub fn is_eligible(profile: &LearnerProfile, program: &Program) -> bool {
    program.required_track == profile.track
        && profile.grade_average.value() >= program.minimum_average.value()
}

/// Return the programs a learner qualifies for.
///
/// Results are ordered by descending minimum average. The sort is stable, so
/// programs with equal minimums keep their catalog order. An empty result is
/// a valid outcome, not an error.
pub fn eligible_programs<'a>(profile: &LearnerProfile, catalog: &'a [Program]) -> Vec<&'a Program> {
    let mut eligible: Vec<&Program> = catalog
        .iter()
        .filter(|program| is_eligible(profile, program))
        .collect();

    eligible.sort_by(|a, b| {
        b.minimum_average
            .value()
            .total_cmp(&a.minimum_average.value())
    });

    eligible
}
