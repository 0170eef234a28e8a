// Confidence scoring for eligible (learner, program) pairs

use serde::{Deserialize, Serialize};

use crate::domain::{ConfidenceScore, LearnerProfile, Program};

/// Confidence for a learner exactly at the program minimum.
pub const BASE_CONFIDENCE: f64 = 60.0;

/// Confidence points per grade point above the minimum.
pub const BUFFER_WEIGHT: f64 = 2.0;

/// Upper bound of generated confidence.
pub const CONFIDENCE_CEILING: f64 = 95.0;

/// Score and justification for one eligible pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Confidence score in `[60, 95]`
    pub score: ConfidenceScore,
    /// Justification stored verbatim as the recommendation reasoning
    pub reasoning: String,
}

/// Compute the confidence score for an eligible pair.
///
/// `min(95, 60 + (grade_average - minimum_average) * 2)`. Callers must only
/// pass pairs accepted by [`crate::is_eligible`].
pub fn confidence(profile: &LearnerProfile, program: &Program) -> ConfidenceScore {
    let buffer = profile.grade_average.value() - program.minimum_average.value();
    debug_assert!(buffer >= 0.0, "scored an ineligible pair");

    let raw = BASE_CONFIDENCE + buffer * BUFFER_WEIGHT;
    // Grade averages are bounded to [75, 100], so raw never drops below 10.
    ConfidenceScore::saturating(raw.min(CONFIDENCE_CEILING))
}

/// Render the justification for an eligible pair.
pub fn reasoning(profile: &LearnerProfile, program: &Program) -> String {
    format!(
        "Student meets requirements with GWA of {} (required: {}) and matching strand ({}).",
        profile.grade_average, program.minimum_average, profile.track
    )
}

/// Score an eligible pair.
pub fn score(profile: &LearnerProfile, program: &Program) -> Assessment {
    Assessment {
        score: confidence(profile, program),
        reasoning: reasoning(profile, program),
    }
}
